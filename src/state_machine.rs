//! Whole-machine checks for Amazon States Language documents.
//!
//! Per-node constraints cannot see across nodes. This pass walks the document
//! once more and checks what spans several of them: that transitions name
//! existing states, that every state is reachable, that every machine can
//! terminate and that state names are unique. It also checks the syntax of
//! the path-valued fields the rule file leaves untyped.
//!
//! Any object with an object-valued `States` field is a machine, wherever it
//! appears, so `Parallel` branches and `Map` iterators are checked as machines
//! of their own. Transitions resolve against the innermost enclosing machine.

use crate::node::{Node, ValueType};
use crate::path;
use crate::problem::{ProblemKind, Problems};
use serde_json::Value;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

const PAYLOAD_BUILDER_FIELDS: &[&str] = &["Parameters", "ResultSelector"];
const PATH_FIELDS: &[(&str, bool)] = &[("InputPath", true), ("OutputPath", true), ("ItemsPath", false)];
const CHOICE_OPERATORS: &[&str] = &["And", "Or", "Not"];
const TRANSITION_FIELDS: &[&str] = &["Next", "Default"];
const ERROR_HANDLER_FIELDS: &[&str] = &["Retry", "Catch"];
const TERMINAL_TYPES: &[&str] = &["Succeed", "Fail"];
const STATES_ALL: &str = "States.ALL";

/// Runs the machine-level checks over `document`, whose top-level path is
/// `root`.
pub(crate) fn check(document: &Value, root: &str, problems: &mut Problems) {
    let mut checker = Checker {
        machines: Vec::new(),
        state_names: HashMap::new(),
    };

    checker.check(&Node::new(document), root, problems);
}

/// One machine being walked: its `States` object and the state names
/// something transitions to.
struct Machine<'a> {
    states: Node<'a>,
    incoming: Vec<&'a str>,
}

struct Checker<'a> {
    machines: Vec<Machine<'a>>,
    /// Every state name seen so far, anywhere in the document, with the
    /// `States` object that first defined it.
    state_names: HashMap<String, String>,
}

impl<'a> Checker<'a> {
    fn check(&mut self, node: &Node<'a>, path: &str, problems: &mut Problems) {
        if !node.is(ValueType::Object) {
            return;
        }

        let states = node.get("States").filter(|s| s.is(ValueType::Object));
        if let Some(states) = &states {
            self.enter_machine(node, states, path, problems);
        }

        for field in TRANSITION_FIELDS {
            self.add_transition(node, path, field, problems);
        }

        for field in ERROR_HANDLER_FIELDS {
            if let Some(handlers) = node.get(field) {
                check_states_all(&handlers, &format!("{}.{}", path, field), problems);
            }
        }

        for (name, value) in node.fields() {
            if value.is(ValueType::Array) {
                for (i, element) in value.elements().enumerate() {
                    self.check(&element, &format!("{}.{}[{}]", path, name, i), problems);
                }
            } else {
                self.check(&value, &format!("{}.{}", path, name), problems);
            }
        }

        if states.is_some() {
            let machine = self
                .machines
                .pop()
                .expect("unreachable: machine stack underflow");

            for name in machine.states.keys() {
                if !machine.incoming.contains(&name) {
                    problems.report(
                        ProblemKind::UnreachableState,
                        vec![path.to_owned(), name.to_owned()],
                    );
                }
            }
        }
    }

    fn enter_machine(
        &mut self,
        node: &Node<'a>,
        states: &Node<'a>,
        path: &str,
        problems: &mut Problems,
    ) {
        let mut incoming = Vec::new();
        if let Some(start) = node.get("StartAt").filter(|s| s.is(ValueType::String)) {
            let start = start.to_str();
            incoming.push(start);

            if !states.has_field(start) {
                problems.report(
                    ProblemKind::MissingStartTarget,
                    vec![start.to_owned(), path.to_owned()],
                );
            }
        }

        self.machines.push(Machine {
            states: states.clone(),
            incoming,
        });

        let states_path = format!("{}.States", path);
        for (name, state) in states.fields() {
            if state.is(ValueType::Object) {
                probe_state(&state, &format!("{}.{}", states_path, name), problems);
            }

            match self.state_names.entry(name.to_owned()) {
                Entry::Occupied(first) => problems.report(
                    ProblemKind::DuplicateStateName,
                    vec![name.to_owned(), states_path.clone(), first.get().clone()],
                ),
                Entry::Vacant(slot) => {
                    slot.insert(states_path.clone());
                }
            }
        }

        let terminal = states.fields().any(|(_, state)| {
            let terminal_type = state
                .get("Type")
                .filter(|t| t.is(ValueType::String))
                .map_or(false, |t| TERMINAL_TYPES.contains(&t.to_str()));
            terminal_type || state.has_field("End")
        });
        if !terminal {
            problems.report(ProblemKind::NoTerminalState, vec![path.to_owned()]);
        }
    }

    fn add_transition(&mut self, node: &Node<'a>, path: &str, field: &str, problems: &mut Problems) {
        let target = match node.get(field).filter(|t| t.is(ValueType::String)) {
            Some(target) => target.to_str(),
            None => return,
        };

        if let Some(machine) = self.machines.last_mut() {
            if machine.states.has_field(target) {
                machine.incoming.push(target);
            } else {
                problems.report(
                    ProblemKind::NoSuchState,
                    vec![target.to_owned(), path.to_owned(), field.to_owned()],
                );
            }
        }
    }
}

/// Syntax checks on the fields of one state.
fn probe_state(state: &Node, path: &str, problems: &mut Problems) {
    for &(field, nullable) in PATH_FIELDS {
        let value = match state.get(field) {
            Some(value) => value,
            None => continue,
        };

        if value.is_null() {
            if !nullable {
                problems.report(ProblemKind::NullField, vec![field.to_owned(), path.to_owned()]);
            }
        } else if !is_payload_path(&value) {
            problems.report(
                ProblemKind::InvalidPathField,
                vec![field.to_owned(), path.to_owned()],
            );
        }
    }

    for field in PAYLOAD_BUILDER_FIELDS {
        if let Some(template) = state.get(field) {
            probe_payload_builder(&template, field, path, problems);
        }
    }

    let is_choice = state
        .get("Type")
        .filter(|t| t.is(ValueType::String))
        .map_or(false, |t| t.to_str() == "Choice");
    if is_choice {
        if let Some(choices) = state.get("Choices") {
            probe_choice(&choices, &format!("{}.Choices", path), problems);
        }
    }
}

/// Every `*.$` key in a payload template must hold a path or an intrinsic
/// function call.
fn probe_payload_builder(node: &Node, builder: &str, path: &str, problems: &mut Problems) {
    if node.is(ValueType::Object) {
        for (key, value) in node.fields() {
            if key.ends_with(".$") {
                if !is_intrinsic_invocation(&value) && !is_payload_path(&value) {
                    problems.report(
                        ProblemKind::InvalidPayloadPath,
                        vec![key.to_owned(), builder.to_owned(), path.to_owned()],
                    );
                }
            } else {
                probe_payload_builder(&value, builder, &format!("{}.{}", path, key), problems);
            }
        }
    } else if node.is(ValueType::Array) {
        for (i, element) in node.elements().enumerate() {
            probe_payload_builder(&element, builder, &format!("{}[{}]", path, i), problems);
        }
    }
}

fn probe_choice(node: &Node, path: &str, problems: &mut Problems) {
    if node.is(ValueType::Object) {
        if let Some(variable) = node.get("Variable") {
            if !is_payload_path(&variable) {
                problems.report(ProblemKind::InvalidChoiceVariable, vec![path.to_owned()]);
            }
        }

        for operator in CHOICE_OPERATORS {
            if let Some(nested) = node.get(operator) {
                probe_choice(&nested, &format!("{}.{}", path, operator), problems);
            }
        }
    } else if node.is(ValueType::Array) {
        for (i, element) in node.elements().enumerate() {
            probe_choice(&element, &format!("{}[{}]", path, i), problems);
        }
    }
}

/// A `States.ALL` retrier or catcher must come last and name no other error.
/// Reported once per array.
fn check_states_all(handlers: &Node, path: &str, problems: &mut Problems) {
    if !handlers.is(ValueType::Array) {
        return;
    }

    let last = handlers.len().saturating_sub(1);
    for (i, handler) in handlers.elements().enumerate() {
        let errors = match handler.get("ErrorEquals").filter(|e| e.is(ValueType::Array)) {
            Some(errors) => errors,
            None => continue,
        };

        let catches_all = errors
            .elements()
            .any(|e| e.is(ValueType::String) && e.to_str() == STATES_ALL);

        if catches_all && (i != last || errors.len() != 1) {
            problems.report(
                ProblemKind::StatesAllNotLast,
                vec![path.to_owned(), i.to_string()],
            );
            return;
        }
    }
}

fn is_payload_path(value: &Node) -> bool {
    value.is(ValueType::String) && path::is_payload_path(value.to_str())
}

fn is_intrinsic_invocation(value: &Node) -> bool {
    value.is(ValueType::String) && path::is_intrinsic_invocation(value.to_str())
}
