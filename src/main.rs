//! smcdiag - SMC state machine to PlantUML converter
//!
//! Reads an SMC `.fsm` description, builds the nested state tree and writes a
//! PlantUML state diagram next to it, optionally running plantuml on the
//! result.

use clap::{ArgAction, CommandFactory, Parser};
use colored::Colorize;
use smcdiag_core::{export_document, parse_reader, CoreError, ParseReport};
use smcdiag_render::error::EXIT_USAGE;
use smcdiag_render::{
    extra_args, output_path_for, write_atomic, Config, GeneratedHeader, PlantUml, RenderError,
};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "smcdiag")]
#[command(about = "Parses SMC description files and generates PlantUML files")]
#[command(after_help = "Requirements: plantuml for --generate-picture (https://plantuml.com/download)")]
#[command(version)]
struct Cli {
    /// Path to the fsm file
    #[arg(short = 'f', long = "fsm-file", visible_alias = "fsmFile")]
    fsm_file: Option<PathBuf>,

    /// Output path (defaults to the input path with a .plantuml extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the diagram to stdout instead of writing a file
    #[arg(long, conflicts_with_all = ["output", "generate_picture"])]
    stdout: bool,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Show all elements, same as -e -g -t
    #[arg(short = 'a', long)]
    show_all: bool,

    /// Show entry and exit actions
    #[arg(short = 'e', long)]
    show_entry_exit_actions: bool,

    /// Show guard conditions
    #[arg(short = 'g', long)]
    show_guards: bool,

    /// Show transition actions
    #[arg(short = 't', long)]
    show_transition_actions: bool,

    /// Run plantuml to generate a picture
    #[arg(short = 'p', long)]
    generate_picture: bool,

    /// Extra flags passed to plantuml without dashes, e.g. "tsvg teps"
    #[arg(short = 'x', long)]
    extra_parameter: Option<String>,

    /// YAML config file (also read from SMCDIAG_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fail if any input line was not recognised
    #[arg(long)]
    strict: bool,

    /// Add a generated-file comment block to the diagram
    #[arg(long)]
    header: bool,

    /// Also write the parsed state tree as JSON to this path
    #[arg(long, value_name = "PATH")]
    dump_json: Option<PathBuf>,
}

fn main() {
    // clap exits with 2 on bad arguments, which is taken by environment errors.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { EXIT_USAGE } else { 0 });
        }
    };

    // Initialize logging
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let Some(input) = cli.fsm_file.clone() else {
        let _ = Cli::command().print_help();
        std::process::exit(EXIT_USAGE);
    };

    if let Err(e) = run(&cli, &input) {
        eprintln!("{}: {}", "Error".red(), e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: &Cli, input: &Path) -> Result<(), RenderError> {
    let mut config = Config::load(cli.config.as_deref())?;
    apply_flags(&mut config, cli);

    tracing::info!("File = {}", input.display());
    if let Some(extra) = &config.renderer.extra_args {
        tracing::info!("plantuml parameters = {}", extra);
    }

    // The renderer is checked before any parsing happens.
    let renderer = if cli.generate_picture {
        let plantuml = PlantUml::locate(&config.renderer)?;
        if config.renderer.check_dot {
            plantuml.check_dot()?;
        }
        Some(plantuml)
    } else {
        None
    };

    let report = parse_reader(BufReader::new(File::open(input)?))?;
    log_report(&report, cli.strict);
    let report = if cli.strict {
        report.into_strict()?
    } else {
        report
    };

    if let Some(path) = &cli.dump_json {
        let json = report.document.to_json().map_err(CoreError::from)?;
        write_atomic(path, &json)?;
        tracing::info!("State tree written to {}", path.display());
    }

    let mut options = config.export.export_options();
    if config.export.header {
        let header = GeneratedHeader::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
            .with_invocation(std::env::args().collect::<Vec<_>>().join(" "))
            .with_source(input);
        options = options.with_preamble(header.lines());
    }
    let diagram = export_document(&report.document, &options);

    if cli.stdout {
        println!("{}", diagram);
        return Ok(());
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| output_path_for(input));
    write_atomic(&output, &diagram)?;
    eprintln!("{} {}", "Output file generated at".green(), output.display());

    if let Some(plantuml) = renderer {
        let extra = config
            .renderer
            .extra_args
            .as_deref()
            .map(extra_args)
            .unwrap_or_default();
        plantuml.render(&output, &extra)?;
    }

    Ok(())
}

/// Command-line flags override config file and environment values.
fn apply_flags(config: &mut Config, cli: &Cli) {
    if cli.show_all {
        config.export.show_all();
    }
    if cli.show_entry_exit_actions {
        config.export.show_entry_exit_actions = true;
    }
    if cli.show_guards {
        config.export.show_guards = true;
    }
    if cli.show_transition_actions {
        config.export.show_transition_actions = true;
    }
    if cli.header {
        config.export.header = true;
    }
    if let Some(extra) = &cli.extra_parameter {
        config.renderer.extra_args = Some(extra.clone());
    }
}

fn log_report(report: &ParseReport, strict: bool) {
    let doc = &report.document;
    tracing::info!(
        "Parsed {} line(s): {} state(s), {} transition(s)",
        report.lines,
        doc.len(),
        doc.transition_count()
    );

    if doc.header.initial.is_none() {
        tracing::warn!("no Initial header found, the diagram has no states");
    }

    if report.ignored_count() > 0 {
        tracing::info!("{} line(s) ignored", report.ignored_count());
        if strict {
            for line in &report.ignored {
                tracing::warn!(
                    line = line.line_no,
                    reason = ?line.reason,
                    "ignored: {}",
                    line.text.trim()
                );
            }
        }
    }
}
