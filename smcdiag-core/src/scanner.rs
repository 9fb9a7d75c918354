//! Line scanner for the SMC state machine grammar.
//!
//! The grammar is line oriented:
//!
//! ```text
//! // comment
//! FSMName   Turnstile
//! Context   TurnstileContext
//! Initial   Locked
//! Version   1.2 beta
//!
//! ( Locked )
//! [
//!     entry lockDoor
//!     exit  unlockDoor
//!     Default Idle { resetCounter }
//! ]
//! {
//!     coin  Unlocked { hasCredit } {} { thankYou }
//!     push  *        {}            {} { alarm }
//! }
//!
//! Idle : Locked
//! ```
//!
//! A line may produce several items (a header keyword and a block opener can
//! share a line), except comments, which short-circuit everything else. The
//! scanner never looks at the state tree: whether a root marker names the
//! declared initial state or a nested declaration names a known parent is
//! decided by the builder.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*//").unwrap());

static FSM_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*FSMName\s+(\w+)").unwrap());
static CONTEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*Context\s+(\w+)").unwrap());
static INITIAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*Initial\s+(\w+)").unwrap());
static VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*Version\s+(.*)").unwrap());

static ROOT_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\(\s*(\w+)\s*\)").unwrap());
static STATE_DECL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\w+)\s*:\s*(\w+)").unwrap());

static ACTION_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\[").unwrap());
static ACTION_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\]").unwrap());
static ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*entry\s+(\w+)").unwrap());
static EXIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*exit\s+(\w+)").unwrap());
static DEFAULT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*Default\s+(?:(\w+)\s+)?\{([\w\s]*)\}").unwrap());

static EVENT_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\{").unwrap());
static EVENT_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\}").unwrap());
static SELF_TRANSITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\w*)\s+\*\s+\{([\w\s]*)\}\s+\{([\w\s]*)\}\s+\{([\w\s]*)\}").unwrap()
});
static TARGETED_TRANSITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\w*)\s+(\w+)\s+\{([\w\s]*)\}\s+\{([\w\s]*)\}\s+\{([\w\s]*)\}").unwrap()
});

/// Block flags carried from one line to the next.
///
/// The two flags are independent; nothing in the grammar stops an event
/// block from being opened while an action block is still open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanMode {
    /// Inside a `[` ... `]` block.
    pub in_action_block: bool,
    /// Inside a `{` ... `}` block.
    pub in_event_block: bool,
}

/// A header keyword line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    FsmName(String),
    Context(String),
    Initial(String),
    Version(String),
}

/// Tokens captured from a transition line inside an event block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionLine {
    /// Triggering event; empty for malformed lines.
    pub event: String,
    /// Target state, `None` for `*`.
    pub next_state: Option<String>,
    pub guards: Vec<String>,
    pub sent_events: Vec<String>,
    pub actions: Vec<String>,
}

/// One recognised line form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineItem {
    Comment,
    Header(Header),
    /// `( Name )`, recognised regardless of the `Initial` header.
    RootMarker(String),
    /// `Child : Parent`; the parent is not checked here.
    StateDecl { name: String, parent: String },
    ActionBlockOpen,
    ActionBlockClose,
    Entry(String),
    Exit(String),
    /// `Default [Next] { fn fn }`; actions are already in call form.
    Default {
        next_state: Option<String>,
        actions: Vec<String>,
    },
    EventBlockOpen,
    EventBlockClose,
    Transition(TransitionLine),
}

/// Result of scanning one line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedLine {
    /// Items in the order the rules were evaluated.
    pub items: Vec<LineItem>,
    /// Mode to use for the next line.
    pub mode: ScanMode,
}

impl ScannedLine {
    /// Returns true if the line is a comment.
    pub fn is_comment(&self) -> bool {
        matches!(self.items.first(), Some(LineItem::Comment))
    }

    /// Returns true if no rule matched.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Classifies one line of input.
pub fn scan_line(line: &str, mode: ScanMode) -> ScannedLine {
    if COMMENT.is_match(line) {
        return ScannedLine {
            items: vec![LineItem::Comment],
            mode,
        };
    }

    let mut items = Vec::new();
    let mut mode = mode;

    if let Some(header) = scan_header(line) {
        items.push(LineItem::Header(header));
    }

    if let Some(caps) = ROOT_MARKER.captures(line) {
        items.push(LineItem::RootMarker(caps[1].to_string()));
    }

    if let Some(caps) = STATE_DECL.captures(line) {
        items.push(LineItem::StateDecl {
            name: caps[1].to_string(),
            parent: caps[2].to_string(),
        });
    }

    if !mode.in_action_block && ACTION_OPEN.is_match(line) {
        mode.in_action_block = true;
        items.push(LineItem::ActionBlockOpen);
    }

    if mode.in_action_block {
        if let Some(caps) = ENTRY.captures(line) {
            items.push(LineItem::Entry(caps[1].to_string()));
        }
        if let Some(caps) = EXIT.captures(line) {
            items.push(LineItem::Exit(caps[1].to_string()));
        }
        if let Some(caps) = DEFAULT.captures(line) {
            items.push(LineItem::Default {
                next_state: caps.get(1).map(|m| m.as_str().to_string()),
                actions: split_tokens(&caps[2])
                    .into_iter()
                    .map(|name| format!("{}()", name))
                    .collect(),
            });
        }
        if ACTION_CLOSE.is_match(line) {
            mode.in_action_block = false;
            items.push(LineItem::ActionBlockClose);
        }
    }

    if !mode.in_event_block && EVENT_OPEN.is_match(line) {
        mode.in_event_block = true;
        items.push(LineItem::EventBlockOpen);
    }

    if mode.in_event_block {
        if EVENT_CLOSE.is_match(line) {
            mode.in_event_block = false;
            items.push(LineItem::EventBlockClose);
        }

        // The targeted pattern is a superset of the self pattern, so order matters.
        if let Some(caps) = SELF_TRANSITION.captures(line) {
            items.push(LineItem::Transition(TransitionLine {
                event: caps[1].to_string(),
                next_state: None,
                guards: split_tokens(&caps[2]),
                sent_events: split_tokens(&caps[3]),
                actions: split_tokens(&caps[4]),
            }));
        } else if let Some(caps) = TARGETED_TRANSITION.captures(line) {
            items.push(LineItem::Transition(targeted(&caps)));
        }
    }

    tracing::trace!(?items, ?mode, "scanned line");

    ScannedLine { items, mode }
}

fn scan_header(line: &str) -> Option<Header> {
    if let Some(caps) = FSM_NAME.captures(line) {
        return Some(Header::FsmName(caps[1].to_string()));
    }
    if let Some(caps) = CONTEXT.captures(line) {
        return Some(Header::Context(caps[1].to_string()));
    }
    if let Some(caps) = INITIAL.captures(line) {
        return Some(Header::Initial(caps[1].to_string()));
    }
    VERSION
        .captures(line)
        .map(|caps| Header::Version(caps[1].trim_end().to_string()))
}

fn targeted(caps: &Captures<'_>) -> TransitionLine {
    TransitionLine {
        event: caps[1].to_string(),
        next_state: Some(caps[2].to_string()),
        guards: split_tokens(&caps[3]),
        sent_events: split_tokens(&caps[4]),
        actions: split_tokens(&caps[5]),
    }
}

fn split_tokens(group: &str) -> Vec<String> {
    group.split_whitespace().map(str::to_string).collect()
}
