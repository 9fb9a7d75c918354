//! State tree builder.
//!
//! Drives the scanner over the input one line at a time and applies the
//! recognised items to a [`Document`]. The builder owns all parse state: the
//! block mode flags, the header values and the current-state cursor that
//! receives actions and transitions.
//!
//! Parsing is permissive. A line that matches nothing, or whose items cannot
//! be applied (for example a nested declaration naming an unknown parent), is
//! dropped and reported as [`LineOutcome::Ignored`]. Callers that want a
//! stricter contract can turn a report with ignored lines into an error with
//! [`ParseReport::into_strict`].

use crate::error::CoreError;
use crate::model::{Document, StateId, Transition};
use crate::scanner::{scan_line, Header, LineItem, ScanMode, TransitionLine};
use std::collections::HashMap;
use std::io::BufRead;

/// Why a line had no effect on the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No grammar rule matched.
    Unrecognised,
    /// `name : parent` where no state called `parent` exists yet.
    UnknownParent { name: String, parent: String },
    /// `( name )` seen before any `Initial` header.
    RootBeforeInitial { name: String },
    /// `( name )` where `name` differs from the `Initial` header.
    RootNameMismatch { name: String, initial: String },
    /// An action or transition with no state to attach it to.
    NoCurrentState,
}

/// What happened to a single input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Blank,
    Comment,
    Consumed,
    Ignored(IgnoreReason),
}

impl LineOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, LineOutcome::Ignored(_))
    }
}

/// A dropped line, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredLine {
    /// 1-based line number.
    pub line_no: usize,
    pub text: String,
    pub reason: IgnoreReason,
}

/// Output of a complete parse.
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    pub document: Document,
    pub ignored: Vec<IgnoredLine>,
    /// Number of lines read.
    pub lines: usize,
}

impl ParseReport {
    pub fn ignored_count(&self) -> usize {
        self.ignored.len()
    }

    /// Fails if any line was ignored.
    pub fn into_strict(self) -> Result<Self, CoreError> {
        match self.ignored.first() {
            None => Ok(self),
            Some(first) => Err(CoreError::IgnoredLines {
                count: self.ignored.len(),
                first_line: first.line_no,
            }),
        }
    }
}

/// Incremental builder for a [`Document`].
#[derive(Debug, Default)]
pub struct Builder {
    document: Document,
    mode: ScanMode,
    current: Option<StateId>,
    line_no: usize,
    ignored: Vec<IgnoredLine>,
    /// Every state created so far, by name.
    names: HashMap<String, Vec<StateId>>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The state that receives actions and transitions.
    pub fn current_state(&self) -> Option<StateId> {
        self.current
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Processes the next input line.
    pub fn feed_line(&mut self, line: &str) -> LineOutcome {
        self.line_no += 1;

        if line.trim().is_empty() {
            return LineOutcome::Blank;
        }

        let scanned = scan_line(line, self.mode);
        self.mode = scanned.mode;

        if scanned.is_comment() {
            tracing::trace!(line = self.line_no, "skip comment");
            return LineOutcome::Comment;
        }

        let mut applied = false;
        let mut rejection = None;
        for item in scanned.items {
            match self.apply(item) {
                Ok(()) => applied = true,
                Err(reason) => {
                    rejection.get_or_insert(reason);
                }
            }
        }

        if applied {
            return LineOutcome::Consumed;
        }

        let reason = rejection.unwrap_or(IgnoreReason::Unrecognised);
        match &reason {
            IgnoreReason::RootBeforeInitial { name } => {
                tracing::warn!(
                    line = self.line_no,
                    "root marker '( {} )' appears before the Initial header, ignoring",
                    name
                );
            }
            _ => {
                tracing::debug!(line = self.line_no, ?reason, "ignoring line: {}", line.trim());
            }
        }
        self.ignored.push(IgnoredLine {
            line_no: self.line_no,
            text: line.to_string(),
            reason: reason.clone(),
        });
        LineOutcome::Ignored(reason)
    }

    /// Consumes the builder and returns the finished report.
    pub fn finish(self) -> ParseReport {
        if self.mode.in_action_block || self.mode.in_event_block {
            tracing::debug!(mode = ?self.mode, "input ended inside an open block");
        }
        ParseReport {
            document: self.document,
            ignored: self.ignored,
            lines: self.line_no,
        }
    }

    fn apply(&mut self, item: LineItem) -> Result<(), IgnoreReason> {
        match item {
            LineItem::Comment
            | LineItem::ActionBlockOpen
            | LineItem::ActionBlockClose
            | LineItem::EventBlockOpen
            | LineItem::EventBlockClose => Ok(()),
            LineItem::Header(header) => {
                self.apply_header(header);
                Ok(())
            }
            LineItem::RootMarker(name) => self.apply_root(name),
            LineItem::StateDecl { name, parent } => {
                let Some(parent_id) = self.resolve(&parent) else {
                    return Err(IgnoreReason::UnknownParent { name, parent });
                };
                tracing::debug!("state {} found under {}", name, parent);
                let id = self.document.add_child(parent_id, name.clone());
                self.register(name, id);
                Ok(())
            }
            LineItem::Entry(name) => {
                let id = self.current.ok_or(IgnoreReason::NoCurrentState)?;
                self.document.state_mut(id).entry_actions.push(name);
                Ok(())
            }
            LineItem::Exit(name) => {
                let id = self.current.ok_or(IgnoreReason::NoCurrentState)?;
                self.document.state_mut(id).exit_actions.push(name);
                Ok(())
            }
            LineItem::Default {
                next_state,
                actions,
            } => {
                let id = self.current.ok_or(IgnoreReason::NoCurrentState)?;
                let transition = Transition {
                    next_state,
                    actions,
                    ..Default::default()
                };
                tracing::trace!(?transition, "default transition");
                self.document.state_mut(id).default_transition = Some(transition);
                Ok(())
            }
            LineItem::Transition(line) => {
                let id = self.current.ok_or(IgnoreReason::NoCurrentState)?;
                self.document
                    .state_mut(id)
                    .transitions
                    .push(transition_from(line));
                Ok(())
            }
        }
    }

    fn apply_header(&mut self, header: Header) {
        let header_values = &mut self.document.header;
        match header {
            Header::FsmName(v) => {
                tracing::info!("FSMName = {}", v);
                header_values.fsm_name = Some(v);
            }
            Header::Context(v) => {
                tracing::info!("Context = {}", v);
                header_values.context = Some(v);
            }
            Header::Initial(v) => {
                tracing::info!("Initial = {}", v);
                header_values.initial = Some(v);
            }
            Header::Version(v) => {
                tracing::info!("Version = {}", v);
                header_values.version = Some(v);
            }
        }
    }

    fn apply_root(&mut self, name: String) -> Result<(), IgnoreReason> {
        match &self.document.header.initial {
            None => Err(IgnoreReason::RootBeforeInitial { name }),
            Some(initial) if *initial != name => Err(IgnoreReason::RootNameMismatch {
                name,
                initial: initial.clone(),
            }),
            Some(_) => {
                tracing::debug!("top-level state {} found", name);
                let id = self.document.add_root(name.clone());
                self.register(name, id);
                Ok(())
            }
        }
    }

    /// Makes `id` the current state and indexes it by name.
    fn register(&mut self, name: String, id: StateId) {
        self.names.entry(name).or_default().push(id);
        self.current = Some(id);
    }

    /// Finds a state by name with the same result as
    /// [`Document::find_by_name`]. Only duplicated names need the pre-order
    /// scan.
    fn resolve(&self, name: &str) -> Option<StateId> {
        match self.names.get(name)?.as_slice() {
            [only] => Some(*only),
            _ => self.document.find_by_name(name),
        }
    }
}

fn transition_from(line: TransitionLine) -> Transition {
    Transition {
        event: line.event,
        next_state: line.next_state,
        guards: line.guards,
        sent_events: line.sent_events,
        actions: line.actions,
    }
}

/// Parses a complete machine description held in memory.
pub fn parse_str(text: &str) -> ParseReport {
    let mut builder = Builder::new();
    for line in text.lines() {
        builder.feed_line(line);
    }
    builder.finish()
}

/// Parses a machine description from a reader.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<ParseReport, CoreError> {
    let mut builder = Builder::new();
    for line in reader.lines() {
        builder.feed_line(&line?);
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TURNSTILE: &str = "\
FSMName Turnstile
Context TurnstileContext
Initial Locked
Version 2.0 beta

( Locked )
[
    entry lockDoor
    exit  unlockDoor
    Default Idle { resetCounter }
]
{
    coin Unlocked { hasCredit } { paid } { thankYou }
    push * {} {} { alarm }
}

Idle : Locked
{
    tick * {} {} {}
}
";

    #[test]
    fn test_headers() {
        let report = parse_str(TURNSTILE);
        let header = &report.document.header;
        assert_eq!(header.fsm_name.as_deref(), Some("Turnstile"));
        assert_eq!(header.context.as_deref(), Some("TurnstileContext"));
        assert_eq!(header.initial.as_deref(), Some("Locked"));
        assert_eq!(header.version.as_deref(), Some("2.0 beta"));
    }

    #[test]
    fn test_tree_shape() {
        let report = parse_str(TURNSTILE);
        let doc = &report.document;

        assert_eq!(doc.roots().len(), 1);
        let locked = doc.roots()[0];
        assert_eq!(doc.state(locked).name, "Locked");
        assert_eq!(doc.children(locked).len(), 1);

        let idle = doc.children(locked)[0];
        assert_eq!(doc.state(idle).name, "Idle");
        assert_eq!(doc.state(idle).transitions.len(), 1);
        assert!(doc.state(idle).transitions[0].is_internal());
    }

    #[test]
    fn test_actions_and_transitions_attach_to_current_state() {
        let report = parse_str(TURNSTILE);
        let doc = &report.document;
        let locked = doc.state(doc.roots()[0]);

        assert_eq!(locked.entry_actions, vec!["lockDoor"]);
        assert_eq!(locked.exit_actions, vec!["unlockDoor"]);

        let default = locked.default_transition.as_ref().unwrap();
        assert_eq!(default.next_state.as_deref(), Some("Idle"));
        assert_eq!(default.actions, vec!["resetCounter()"]);

        assert_eq!(locked.transitions.len(), 2);
        let coin = &locked.transitions[0];
        assert_eq!(coin.event, "coin");
        assert_eq!(coin.next_state.as_deref(), Some("Unlocked"));
        assert_eq!(coin.guards, vec!["hasCredit"]);
        assert_eq!(coin.sent_events, vec!["paid"]);
        assert_eq!(coin.actions, vec!["thankYou"]);

        let push = &locked.transitions[1];
        assert!(push.is_internal());
        assert_eq!(push.actions, vec!["alarm"]);
    }

    #[test]
    fn test_no_ignored_lines_in_well_formed_input() {
        let report = parse_str(TURNSTILE);
        assert_eq!(report.ignored_count(), 0);
        assert_eq!(report.lines, TURNSTILE.lines().count());
        assert!(report.into_strict().is_ok());
    }

    #[test]
    fn test_first_line_is_processed() {
        let report = parse_str("Initial A\n( A )\n");
        assert_eq!(report.document.roots().len(), 1);
    }

    #[test]
    fn test_unknown_parent_is_ignored() {
        let mut builder = Builder::new();
        builder.feed_line("Initial A");
        builder.feed_line("( A )");
        let outcome = builder.feed_line("Orphan : Nowhere");
        assert_eq!(
            outcome,
            LineOutcome::Ignored(IgnoreReason::UnknownParent {
                name: "Orphan".into(),
                parent: "Nowhere".into()
            })
        );
        assert_eq!(builder.feed_line("B : A"), LineOutcome::Consumed);

        let report = builder.finish();
        assert_eq!(report.document.len(), 2);
        assert!(report.document.find_by_name("Orphan").is_none());
        assert_eq!(report.ignored_count(), 1);
        assert_eq!(report.ignored[0].line_no, 3);
    }

    #[test]
    fn test_root_before_initial_is_rejected() {
        let mut builder = Builder::new();
        let outcome = builder.feed_line("( A )");
        assert_eq!(
            outcome,
            LineOutcome::Ignored(IgnoreReason::RootBeforeInitial { name: "A".into() })
        );
        assert!(builder.document().is_empty());
        assert!(builder.current_state().is_none());
    }

    #[test]
    fn test_root_must_match_initial() {
        let mut builder = Builder::new();
        builder.feed_line("Initial A");
        let outcome = builder.feed_line("( B )");
        assert!(matches!(
            outcome,
            LineOutcome::Ignored(IgnoreReason::RootNameMismatch { .. })
        ));
    }

    #[test]
    fn test_multiple_roots() {
        let report = parse_str("Initial A\n( A )\n( A )\n");
        assert_eq!(report.document.roots().len(), 2);
    }

    #[test]
    fn test_actions_without_state_are_ignored() {
        let mut builder = Builder::new();
        builder.feed_line("[");
        let outcome = builder.feed_line("entry foo");
        assert_eq!(outcome, LineOutcome::Ignored(IgnoreReason::NoCurrentState));
    }

    #[test]
    fn test_default_last_write_wins() {
        let report = parse_str("Initial A\n( A )\n[\nDefault X {}\nDefault Y { a }\n]\n");
        let a = report.document.state(report.document.roots()[0]);
        let default = a.default_transition.as_ref().unwrap();
        assert_eq!(default.next_state.as_deref(), Some("Y"));
        assert_eq!(default.actions, vec!["a()"]);
    }

    #[test]
    fn test_comment_inside_event_block() {
        let mut builder = Builder::new();
        builder.feed_line("Initial A");
        builder.feed_line("( A )");
        builder.feed_line("{");
        assert_eq!(
            builder.feed_line("// start Running {} {} {}"),
            LineOutcome::Comment
        );
        let report = builder.finish();
        assert!(report.document.state(report.document.roots()[0]).transitions.is_empty());
    }

    #[test]
    fn test_blank_lines_are_not_ignored() {
        let mut builder = Builder::new();
        assert_eq!(builder.feed_line("   "), LineOutcome::Blank);
        assert_eq!(builder.finish().ignored_count(), 0);
    }

    #[test]
    fn test_strict_mode() {
        let report = parse_str("Initial A\n( A )\ngarbage here\n");
        assert_eq!(report.ignored_count(), 1);
        let err = report.into_strict().unwrap_err();
        assert!(matches!(
            err,
            CoreError::IgnoredLines {
                count: 1,
                first_line: 3
            }
        ));
    }

    #[test]
    fn test_parse_reader() {
        let report = parse_reader(std::io::Cursor::new(TURNSTILE)).unwrap();
        assert_eq!(report.document, parse_str(TURNSTILE).document);
    }

    #[test]
    fn test_duplicate_parent_resolves_in_preorder() {
        // The second `X` is declared later but comes first in pre-order.
        let input = "\
Initial R
( R )
A : R
B : R
X : B
X : A
Leaf : X
";
        let report = parse_str(input);
        let doc = &report.document;
        let leaf = doc.find_by_name("Leaf").unwrap();
        assert_eq!(doc.path(leaf), vec!["R", "A", "X", "Leaf"]);
    }

    #[test]
    fn test_long_declaration_chain() {
        const DEPTH: usize = 20_000;

        let mut input = String::from("Initial S0\n( S0 )\n");
        for i in 1..DEPTH {
            input.push_str(&format!("S{} : S{}\n", i, i - 1));
        }

        let report = parse_str(&input);
        assert_eq!(report.ignored_count(), 0);
        assert_eq!(report.document.len(), DEPTH);

        let last = report.document.find_by_name(&format!("S{}", DEPTH - 1));
        assert_eq!(report.document.depth(last.unwrap()), DEPTH - 1);
    }
}
