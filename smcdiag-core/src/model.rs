//! Document model: a forest of states stored in an arena.
//!
//! States are addressed by [`StateId`], an index into the arena that stays
//! valid for the lifetime of the document. States are only ever appended and
//! never re-parented, so the forest cannot contain cycles.

use serde::Serialize;

/// Stable index of a state inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StateId(pub usize);

/// Enclosing state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Parent {
    /// Top-level state created by a root marker.
    Root,
    State(StateId),
}

/// A transition out of (or inside) a state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transition {
    /// Triggering event.
    pub event: String,

    /// Target state; `None` for an internal transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_state: Option<String>,

    /// Guard tokens, implicitly joined by AND.
    pub guards: Vec<String>,

    /// Events emitted when the transition fires.
    pub sent_events: Vec<String>,

    /// Action tokens.
    pub actions: Vec<String>,
}

impl Transition {
    /// Creates a transition to `next_state`.
    pub fn new(event: impl Into<String>, next_state: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            next_state: Some(next_state.into()),
            ..Default::default()
        }
    }

    /// Creates an internal transition that does not leave the state.
    pub fn internal(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            ..Default::default()
        }
    }

    pub fn with_guards(mut self, guards: Vec<String>) -> Self {
        self.guards = guards;
        self
    }

    pub fn with_actions(mut self, actions: Vec<String>) -> Self {
        self.actions = actions;
        self
    }

    /// Returns true if the transition has no target state.
    pub fn is_internal(&self) -> bool {
        self.next_state.is_none()
    }
}

/// A state node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct State {
    /// State name, unique among siblings.
    pub name: String,

    pub parent: Parent,

    /// Entry actions in declaration order.
    pub entry_actions: Vec<String>,

    /// Exit actions in declaration order.
    pub exit_actions: Vec<String>,

    /// Initial sub-state transition; the last `Default` line wins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_transition: Option<Transition>,

    /// Event transitions in declaration order.
    pub transitions: Vec<Transition>,

    /// Nested states in declaration order.
    pub children: Vec<StateId>,
}

impl State {
    pub fn new(name: impl Into<String>, parent: Parent) -> Self {
        Self {
            name: name.into(),
            parent,
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
            default_transition: None,
            transitions: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.parent, Parent::Root)
    }
}

/// Header values of a machine description. `None` means the header was
/// never seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MachineHeader {
    pub fsm_name: Option<String>,
    pub context: Option<String>,
    pub initial: Option<String>,
    pub version: Option<String>,
}

/// A parsed machine description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Header values.
    pub header: MachineHeader,

    /// Top-level states in the order their root markers appeared.
    roots: Vec<StateId>,

    /// Arena of all states.
    states: Vec<State>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new top-level state.
    pub fn add_root(&mut self, name: impl Into<String>) -> StateId {
        let id = StateId(self.states.len());
        self.states.push(State::new(name, Parent::Root));
        self.roots.push(id);
        id
    }

    /// Appends a new child under `parent`.
    pub fn add_child(&mut self, parent: StateId, name: impl Into<String>) -> StateId {
        let id = StateId(self.states.len());
        self.states.push(State::new(name, Parent::State(parent)));
        self.states[parent.0].children.push(id);
        id
    }

    /// Returns a state by ID.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this document.
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.0]
    }

    /// Returns a mutable state by ID.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this document.
    pub fn state_mut(&mut self, id: StateId) -> &mut State {
        &mut self.states[id.0]
    }

    pub fn roots(&self) -> &[StateId] {
        &self.roots
    }

    pub fn children(&self, id: StateId) -> &[StateId] {
        &self.state(id).children
    }

    /// Number of states in the document.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Finds the first state named `name`, searching depth-first with a parent
    /// visited before its children and roots in declaration order.
    pub fn find_by_name(&self, name: &str) -> Option<StateId> {
        self.iter().find(|(_, state)| state.name == name).map(|(id, _)| id)
    }

    /// Number of ancestors of `id`; roots have depth 0.
    pub fn depth(&self, id: StateId) -> usize {
        let mut depth = 0;
        let mut current = self.state(id).parent;
        while let Parent::State(parent) = current {
            depth += 1;
            current = self.state(parent).parent;
        }
        depth
    }

    /// Names from the root down to `id`.
    pub fn path(&self, id: StateId) -> Vec<&str> {
        let mut path = vec![self.state(id).name.as_str()];
        let mut current = self.state(id).parent;
        while let Parent::State(parent) = current {
            path.push(self.state(parent).name.as_str());
            current = self.state(parent).parent;
        }
        path.reverse();
        path
    }

    /// Iterates over all states in depth-first pre-order.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            doc: self,
            stack: self.roots.iter().rev().copied().collect(),
        }
    }

    /// Total number of event transitions across all states.
    pub fn transition_count(&self) -> usize {
        self.states.iter().map(|s| s.transitions.len()).sum()
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Depth-first pre-order iterator over a [`Document`].
pub struct PreOrder<'a> {
    doc: &'a Document,
    stack: Vec<StateId>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (StateId, &'a State);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let state = self.doc.state(id);
        self.stack.extend(state.children.iter().rev().copied());
        Some((id, state))
    }
}
