//! Property-based tests for the builder and exporter.
//!
//! Machine descriptions are generated from random trees, rendered to text in
//! the SMC grammar and fed through the full pipeline.

use proptest::prelude::*;
use proptest::sample::Index;
use smcdiag_core::{export_states, parse_str, Document, ExportOptions, Parent, Visibility};

#[derive(Debug, Clone)]
struct GenTransition {
    event: String,
    target: Option<Index>,
    guards: Vec<String>,
    actions: Vec<String>,
}

#[derive(Debug, Clone)]
struct GenState {
    parent: Index,
    entries: Vec<String>,
    exits: Vec<String>,
    transitions: Vec<GenTransition>,
}

prop_compose! {
    fn arbitrary_transition()(
        event in "[a-z]{1,6}",
        target in proptest::option::of(any::<Index>()),
        guards in prop::collection::vec("[a-z]{1,5}", 0..3),
        actions in prop::collection::vec("[a-z]{1,5}", 0..3),
    ) -> GenTransition {
        GenTransition {
            event: format!("ev_{}", event),
            target,
            guards: guards.into_iter().map(|g| format!("g_{}", g)).collect(),
            actions: actions.into_iter().map(|a| format!("do_{}", a)).collect(),
        }
    }
}

prop_compose! {
    fn arbitrary_state()(
        parent in any::<Index>(),
        entries in prop::collection::vec("[a-z]{1,5}", 0..3),
        exits in prop::collection::vec("[a-z]{1,5}", 0..3),
        transitions in prop::collection::vec(arbitrary_transition(), 0..4),
    ) -> GenState {
        GenState {
            parent,
            entries: entries.into_iter().map(|e| format!("on_{}", e)).collect(),
            exits: exits.into_iter().map(|e| format!("off_{}", e)).collect(),
            transitions,
        }
    }
}

fn arbitrary_machine() -> impl Strategy<Value = Vec<GenState>> {
    prop::collection::vec(arbitrary_state(), 1..10)
}

/// Renders generated states as SMC text. State `i` is named `S{i}` and its
/// parent is always an earlier state, so every declaration resolves.
fn render(states: &[GenState]) -> String {
    let mut text = String::from("FSMName Generated\nInitial S0\n\n");
    for (i, state) in states.iter().enumerate() {
        if i == 0 {
            text.push_str("( S0 )\n");
        } else {
            text.push_str(&format!("S{} : S{}\n", i, state.parent.index(i)));
        }

        text.push_str("[\n");
        for entry in &state.entries {
            text.push_str(&format!("    entry {}\n", entry));
        }
        for exit in &state.exits {
            text.push_str(&format!("    exit {}\n", exit));
        }
        text.push_str("]\n{\n");
        for t in &state.transitions {
            let target = match &t.target {
                Some(index) => format!("S{}", index.index(states.len())),
                None => "*".to_string(),
            };
            text.push_str(&format!(
                "    {} {} {{ {} }} {{}} {{ {} }}\n",
                t.event,
                target,
                t.guards.join(" "),
                t.actions.join(" ")
            ));
        }
        text.push_str("}\n\n");
    }
    text
}

fn action_count(doc: &Document) -> usize {
    doc.iter()
        .map(|(_, s)| s.entry_actions.len() + s.exit_actions.len())
        .sum()
}

proptest! {
    #[test]
    fn builder_is_deterministic(states in arbitrary_machine()) {
        let text = render(&states);
        let first = parse_str(&text);
        let second = parse_str(&text);

        prop_assert_eq!(&first.document, &second.document);
        prop_assert_eq!(first.document.len(), states.len());
        prop_assert_eq!(first.ignored_count(), 0);
    }

    #[test]
    fn export_is_idempotent(states in arbitrary_machine(), all in any::<bool>()) {
        let doc = parse_str(&render(&states)).document;
        let visibility = if all { Visibility::all() } else { Visibility::none() };
        let options = ExportOptions::new(visibility);

        let first = export_states(&doc, &options);
        let second = export_states(&doc, &options);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn nesting_has_single_parent_and_no_cycles(states in arbitrary_machine()) {
        let doc = parse_str(&render(&states)).document;

        for (id, state) in doc.iter() {
            match state.parent {
                Parent::Root => prop_assert!(doc.roots().contains(&id)),
                Parent::State(parent) => {
                    let occurrences = doc.children(parent).iter().filter(|&&c| c == id).count();
                    prop_assert_eq!(occurrences, 1);

                    // Walking up reaches a root without passing through the state itself.
                    let mut steps = 0;
                    let mut current = state.parent;
                    while let Parent::State(up) = current {
                        prop_assert_ne!(up, id);
                        steps += 1;
                        prop_assert!(steps <= doc.len());
                        current = doc.state(up).parent;
                    }
                }
            }
        }
        prop_assert_eq!(doc.iter().count(), doc.len());
    }

    #[test]
    fn visibility_flags_are_independent(states in arbitrary_machine()) {
        let doc = parse_str(&render(&states)).document;

        let guards_only = export_states(&doc, &ExportOptions::new(Visibility {
            guards: true,
            ..Visibility::none()
        }));
        prop_assert!(!guards_only.contains(" : entry / "));
        prop_assert!(!guards_only.contains(" : exit / "));
        prop_assert!(!guards_only.contains(" / "));

        let actions_only = export_states(&doc, &ExportOptions::new(Visibility {
            transition_actions: true,
            ..Visibility::none()
        }));
        prop_assert!(!actions_only.contains("[g_"));
        prop_assert!(!actions_only.contains(" : entry / "));

        let entry_exit_only = export_states(&doc, &ExportOptions::new(Visibility {
            entry_exit_actions: true,
            ..Visibility::none()
        }));
        prop_assert!(!entry_exit_only.contains("[g_"));
        prop_assert!(!entry_exit_only.contains("do_"));

        let none = export_states(&doc, &ExportOptions::new(Visibility::none()));
        prop_assert_eq!(
            entry_exit_only.lines().count(),
            none.lines().count() + action_count(&doc)
        );
    }

    #[test]
    fn all_equals_each_flag_enabled(states in arbitrary_machine()) {
        let doc = parse_str(&render(&states)).document;

        let mut each = Visibility::none();
        each.entry_exit_actions = true;
        each.guards = true;
        each.transition_actions = true;

        prop_assert!(each.is_all());
        prop_assert_eq!(
            export_states(&doc, &ExportOptions::new(Visibility::all())),
            export_states(&doc, &ExportOptions::new(each))
        );
    }
}
