use crate::node::{Node, ValueType};
use crate::problem::{ProblemKind, Problems};
use crate::schema::RuleSet;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use tracing::trace;

/// Checks `document` against every constraint `rules` assigns to it and to
/// its descendants.
///
/// Nodes are visited breadth-first from an explicit queue, so document depth
/// never turns into stack depth.
pub(crate) fn validate(rules: &RuleSet, document: &Value, problems: &mut Problems) {
    let mut vm = Vm {
        rules,
        queue: VecDeque::new(),
    };

    vm.queue.push_back(Work {
        node: Node::new(document),
        path: rules.root().to_owned(),
        roles: vec![rules.root().to_owned()],
    });

    while let Some(work) = vm.queue.pop_front() {
        vm.eval(work, problems);
    }
}

struct Work<'a> {
    node: Node<'a>,
    path: String,
    roles: Vec<String>,
}

struct Vm<'a> {
    rules: &'a RuleSet,
    queue: VecDeque<Work<'a>>,
}

impl<'a> Vm<'a> {
    fn eval(&mut self, work: Work<'a>, problems: &mut Problems) {
        let Work {
            node,
            path,
            mut roles,
        } = work;

        self.rules.finder().find_more_roles(&node, &mut roles);
        trace!(%path, ?roles, "visiting");

        let mut checked = HashSet::new();
        for role in &roles {
            if !checked.insert(role) {
                continue;
            }

            for constraint in self.rules.constraints(role) {
                if constraint.applies(&roles) {
                    constraint.check(&node, &path, problems);
                }
            }
        }

        if !node.is(ValueType::Object) {
            return;
        }

        for (name, value) in node.fields() {
            if !self.rules.allowed().is_allowed(&roles, name) {
                problems.report(
                    ProblemKind::FieldNotAllowed,
                    vec![name.to_owned(), path.clone()],
                );
            }

            let child_roles = self.rules.finder().find_child_roles(&roles, name);
            if !child_roles.is_empty() {
                self.queue.push_back(Work {
                    node: value.clone(),
                    path: format!("{}.{}", path, name),
                    roles: child_roles,
                });
            }

            let grandchild_roles = self.rules.finder().find_grandchild_roles(&roles, name);
            if grandchild_roles.is_empty() || self.rules.allowed().is_any(&grandchild_roles) {
                continue;
            }

            if value.is(ValueType::Object) {
                for (key, member) in value.fields() {
                    self.queue.push_back(Work {
                        node: member,
                        path: format!("{}.{}.{}", path, name, key),
                        roles: grandchild_roles.clone(),
                    });
                }
            } else if value.is(ValueType::Array) {
                for (i, element) in value.elements().enumerate() {
                    self.queue.push_back(Work {
                        node: element,
                        path: format!("{}.{}[{}]", path, name, i),
                        roles: grandchild_roles.clone(),
                    });
                }
            }
        }
    }
}
