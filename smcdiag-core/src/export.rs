//! PlantUML state diagram exporter.
//!
//! Each state becomes a `state Name { ... }` block. Children are rendered
//! inside their parent's block before the parent's own lines:
//!
//! ```text
//! state Locked {
//!    state Idle {
//!       Idle : tick
//!    }
//!
//!    [*] --> Idle
//!    Locked : entry / lockDoor()
//!    Locked --> Unlocked : coin[hasCredit] / thankYou
//! }
//!
//! ```
//!
//! Export is a read-only traversal; the same document and options always
//! produce the same text.

use crate::model::{Document, State, StateId, Transition};

/// Default indent unit, one per nesting level.
pub const DEFAULT_INDENT: &str = "   ";

/// Opening marker of a PlantUML document.
pub const START_MARKER: &str = "@startuml";

/// Closing marker of a PlantUML document.
pub const END_MARKER: &str = "@enduml";

/// Which optional annotations are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visibility {
    /// `Name : entry / fn()` and `Name : exit / fn()` lines.
    pub entry_exit_actions: bool,
    /// `[guard guard]` after the event.
    pub guards: bool,
    /// `/ action action` after the event.
    pub transition_actions: bool,
}

impl Visibility {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            entry_exit_actions: true,
            guards: true,
            transition_actions: true,
        }
    }

    pub fn is_all(&self) -> bool {
        *self == Self::all()
    }
}

/// Options controlling the exported text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub visibility: Visibility,
    /// Indent unit repeated once per depth level.
    pub indent: String,
    /// Comment lines emitted right after the start marker, without the
    /// leading `'`.
    pub preamble: Vec<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            visibility: Visibility::default(),
            indent: DEFAULT_INDENT.to_string(),
            preamble: Vec::new(),
        }
    }
}

impl ExportOptions {
    pub fn new(visibility: Visibility) -> Self {
        Self {
            visibility,
            ..Default::default()
        }
    }

    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    pub fn with_preamble(mut self, preamble: Vec<String>) -> Self {
        self.preamble = preamble;
        self
    }
}

/// Renders the state blocks of a document without start/end markers.
pub fn export_states(doc: &Document, options: &ExportOptions) -> String {
    let mut exporter = Exporter {
        doc,
        options,
        out: String::new(),
    };
    exporter.walk();
    exporter.out
}

/// Renders a complete PlantUML document.
///
/// The text ends with the end marker and no trailing newline.
pub fn export_document(doc: &Document, options: &ExportOptions) -> String {
    let mut out = String::new();
    out.push_str(START_MARKER);
    out.push('\n');
    for line in &options.preamble {
        out.push_str("' ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&export_states(doc, options));
    out.push_str(END_MARKER);
    out
}

struct Exporter<'a> {
    doc: &'a Document,
    options: &'a ExportOptions,
    out: String,
}

/// Work item of the traversal. A state is opened on `Enter`, its children
/// are rendered, then its own lines and closing brace follow on `Leave`.
enum Frame {
    Enter(StateId, usize),
    Leave(StateId, usize),
}

impl Exporter<'_> {
    /// Depth-first walk with an explicit stack; nesting depth is bounded only
    /// by memory.
    fn walk(&mut self) {
        let doc = self.doc;
        let mut stack: Vec<Frame> = doc
            .roots()
            .iter()
            .rev()
            .map(|&root| Frame::Enter(root, 0))
            .collect();

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(id, depth) => {
                    let state = doc.state(id);
                    tracing::debug!("exporting state {}", state.name);
                    self.line(depth, &format!("state {} {{", state.name));
                    stack.push(Frame::Leave(id, depth));
                    stack.extend(
                        state
                            .children
                            .iter()
                            .rev()
                            .map(|&child| Frame::Enter(child, depth + 1)),
                    );
                }
                Frame::Leave(id, depth) => self.close_state(doc.state(id), depth),
            }
        }
    }

    fn close_state(&mut self, state: &State, depth: usize) {
        if let Some(default) = &state.default_transition {
            self.default_line(state, default, depth + 1);
        }

        if self.options.visibility.entry_exit_actions {
            self.action_lines(state, depth + 1);
        }

        for transition in &state.transitions {
            let text = self.transition_line(state, transition);
            self.line(depth + 1, &text);
        }

        self.line(depth, "}");
        self.out.push('\n');
    }

    /// `[*] --> Next` for a targeted default. Without a target there is no
    /// arrow; only the actions are shown, when transition actions are visible.
    fn default_line(&mut self, state: &State, default: &Transition, depth: usize) {
        let show_actions = self.options.visibility.transition_actions;
        match &default.next_state {
            Some(next) => self.line(depth, &format!("[*] --> {}", next)),
            None if show_actions && !default.actions.is_empty() => {
                let text = format!("{} : / {}", state.name, default.actions.join(" "));
                self.line(depth, &text);
            }
            None => {}
        }
    }

    fn action_lines(&mut self, state: &State, depth: usize) {
        for entry in &state.entry_actions {
            self.line(depth, &format!("{} : entry / {}()", state.name, entry));
        }
        for exit in &state.exit_actions {
            self.line(depth, &format!("{} : exit / {}()", state.name, exit));
        }
    }

    fn transition_line(&self, state: &State, transition: &Transition) -> String {
        let visibility = self.options.visibility;
        let mut text = match &transition.next_state {
            Some(next) => format!("{} --> {} : {}", state.name, next, transition.event),
            None => format!("{} : {}", state.name, transition.event),
        };
        if visibility.guards && !transition.guards.is_empty() {
            text.push('[');
            text.push_str(&transition.guards.join(" "));
            text.push(']');
        }
        if visibility.transition_actions && !transition.actions.is_empty() {
            text.push_str(" / ");
            text.push_str(&transition.actions.join(" "));
        }
        text
    }

    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(&self.options.indent);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }
}
