//! The tables a compiled rule file populates.
//!
//! [`RoleFinder`](struct.RoleFinder.html) answers "which roles does this node
//! play?", [`RoleConstraints`](struct.RoleConstraints.html) "what must a node
//! playing this role satisfy?", and [`AllowedFields`](struct.AllowedFields.html)
//! "which field names may it carry?". All three are filled once, while a rule
//! file compiles, and only read afterwards.

use crate::constraint::Constraint;
use crate::deduce::Literal;
use crate::node::Node;
use std::collections::{HashMap, HashSet};

/// Role inference rules.
#[derive(Debug, Clone, Default)]
pub struct RoleFinder {
    is_a: HashMap<String, Vec<String>>,
    field_presence: HashMap<String, Vec<(String, String)>>,
    field_value: HashMap<String, Vec<(String, Literal, String)>>,
    child: HashMap<String, Vec<(String, String)>>,
    grandchild: HashMap<String, Vec<(String, String)>>,
}

impl RoleFinder {
    /// Every `role` is also a `new_role`.
    pub fn add_is_a(&mut self, role: &str, new_role: &str) {
        self.is_a
            .entry(role.to_owned())
            .or_default()
            .push(new_role.to_owned());
    }

    /// A `role` carrying `field` is also a `new_role`.
    pub fn add_field_presence_role(&mut self, role: &str, field: &str, new_role: &str) {
        self.field_presence
            .entry(role.to_owned())
            .or_default()
            .push((field.to_owned(), new_role.to_owned()));
    }

    /// A `role` whose `field` equals `value` is also a `new_role`.
    pub fn add_field_value_role(&mut self, role: &str, field: &str, value: Literal, new_role: &str) {
        self.field_value
            .entry(role.to_owned())
            .or_default()
            .push((field.to_owned(), value, new_role.to_owned()));
    }

    /// The value of `field` in a `role` node plays `child_role`.
    pub fn add_child_role(&mut self, role: &str, field: &str, child_role: &str) {
        self.child
            .entry(role.to_owned())
            .or_default()
            .push((field.to_owned(), child_role.to_owned()));
    }

    /// Each member or element of `field` in a `role` node plays `child_role`.
    pub fn add_grandchild_role(&mut self, role: &str, field: &str, child_role: &str) {
        self.grandchild
            .entry(role.to_owned())
            .or_default()
            .push((field.to_owned(), child_role.to_owned()));
    }

    /// Closes `roles` under the inference rules, for a node whose own content
    /// is `node`.
    ///
    /// Is-a rules apply first, then field-presence rules, then field-value
    /// rules. Each family walks the list as it grows, so a rule's output feeds
    /// later rules of the same family, and expands each distinct role once.
    pub fn find_more_roles(&self, node: &Node, roles: &mut Vec<String>) {
        expand(roles, |role| self.is_a.get(role).cloned().unwrap_or_default());

        expand(roles, |role| {
            self.field_presence
                .get(role)
                .map(|rules| {
                    rules
                        .iter()
                        .filter(|(field, _)| node.has_field(field))
                        .map(|(_, new_role)| new_role.clone())
                        .collect()
                })
                .unwrap_or_default()
        });

        expand(roles, |role| {
            self.field_value
                .get(role)
                .map(|rules| {
                    rules
                        .iter()
                        .filter(|(field, value, _)| {
                            node.get(field).map_or(false, |v| value.matches(&v))
                        })
                        .map(|(_, _, new_role)| new_role.clone())
                        .collect()
                })
                .unwrap_or_default()
        });
    }

    /// Roles for the value of `field` in a node playing `roles`.
    pub fn find_child_roles(&self, roles: &[String], field: &str) -> Vec<String> {
        lookup(&self.child, roles, field)
    }

    /// Roles for each member or element of `field` in a node playing `roles`.
    pub fn find_grandchild_roles(&self, roles: &[String], field: &str) -> Vec<String> {
        lookup(&self.grandchild, roles, field)
    }
}

fn expand<F>(roles: &mut Vec<String>, mut more: F)
where
    F: FnMut(&str) -> Vec<String>,
{
    let mut expanded = HashSet::new();
    let mut i = 0;

    while i < roles.len() {
        if expanded.insert(roles[i].clone()) {
            let found = more(&roles[i]);
            roles.extend(found);
        }
        i += 1;
    }
}

fn lookup(table: &HashMap<String, Vec<(String, String)>>, roles: &[String], field: &str) -> Vec<String> {
    let mut found = Vec::new();
    for role in roles {
        if let Some(entries) = table.get(role) {
            for (name, child_role) in entries {
                if name == field && !found.contains(child_role) {
                    found.push(child_role.clone());
                }
            }
        }
    }
    found
}

/// Constraints by role.
#[derive(Debug, Clone, Default)]
pub struct RoleConstraints {
    constraints: HashMap<String, Vec<Constraint>>,
}

impl RoleConstraints {
    pub fn add(&mut self, role: &str, constraint: Constraint) {
        self.constraints
            .entry(role.to_owned())
            .or_default()
            .push(constraint);
    }

    pub fn get(&self, role: &str) -> &[Constraint] {
        self.constraints
            .get(role)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Field names permitted per role.
#[derive(Debug, Clone, Default)]
pub struct AllowedFields {
    allowed: HashMap<String, HashSet<String>>,
    any: HashSet<String>,
}

impl AllowedFields {
    pub fn set_allowed(&mut self, role: &str, field: &str) {
        self.allowed
            .entry(role.to_owned())
            .or_default()
            .insert(field.to_owned());
    }

    /// Nodes playing `role` may carry any field at all.
    pub fn set_any(&mut self, role: &str) {
        self.any.insert(role.to_owned());
    }

    /// May a node playing `roles` carry `field`?
    pub fn is_allowed(&self, roles: &[String], field: &str) -> bool {
        self.is_any(roles)
            || roles.iter().any(|role| {
                self.allowed
                    .get(role)
                    .map_or(false, |fields| fields.contains(field))
            })
    }

    /// Does any of `roles` allow every field?
    pub fn is_any(&self, roles: &[String]) -> bool {
        roles.iter().any(|role| self.any.contains(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn is_a_chains_close() {
        let mut finder = RoleFinder::default();
        finder.add_is_a("A", "B");
        finder.add_is_a("B", "C");

        let value = json!({});
        let mut found = roles(&["A"]);
        finder.find_more_roles(&Node::new(&value), &mut found);
        assert_eq!(found, roles(&["A", "B", "C"]));
    }

    #[test]
    fn closure_ignores_rule_order() {
        let mut finder = RoleFinder::default();
        finder.add_is_a("B", "C");
        finder.add_is_a("A", "B");

        let value = json!({});
        let mut found = roles(&["A"]);
        finder.find_more_roles(&Node::new(&value), &mut found);
        assert_eq!(found, roles(&["A", "B", "C"]));

        let value = json!({"parts": ["x"], "kind": "kit"});
        let kit = || Literal::String("kit".to_owned());

        let mut forward = RoleFinder::default();
        forward.add_is_a("Item", "Record");
        forward.add_field_presence_role("Record", "parts", "Bundle");
        forward.add_field_value_role("Bundle", "kind", kit(), "Kit");

        let mut backward = RoleFinder::default();
        backward.add_field_value_role("Bundle", "kind", kit(), "Kit");
        backward.add_field_presence_role("Record", "parts", "Bundle");
        backward.add_is_a("Item", "Record");

        let mut mixed = RoleFinder::default();
        mixed.add_field_presence_role("Record", "parts", "Bundle");
        mixed.add_is_a("Item", "Record");
        mixed.add_field_value_role("Bundle", "kind", kit(), "Kit");

        for finder in &[forward, backward, mixed] {
            let mut found = roles(&["Item"]);
            finder.find_more_roles(&Node::new(&value), &mut found);
            assert_eq!(found, roles(&["Item", "Record", "Bundle", "Kit"]));
        }
    }

    #[test]
    fn cycles_terminate() {
        let mut finder = RoleFinder::default();
        finder.add_is_a("A", "B");
        finder.add_is_a("B", "A");

        let value = json!({});
        let mut found = roles(&["A"]);
        finder.find_more_roles(&Node::new(&value), &mut found);
        assert_eq!(found, roles(&["A", "B", "A"]));
    }

    #[test]
    fn field_presence_and_value_roles() {
        let mut finder = RoleFinder::default();
        finder.add_field_presence_role("State", "Next", "Transitioning State");
        finder.add_field_value_role("State", "Type", Literal::String("Pass".to_owned()), "Pass State");
        finder.add_field_value_role("State", "End", Literal::Bool(true), "Terminal State");
        finder.add_field_value_role("State", "Limit", Literal::Integer(3), "Limited State");

        let value = json!({"Type": "Pass", "Next": "X", "End": false, "Limit": 3.0});
        let mut found = roles(&["State"]);
        finder.find_more_roles(&Node::new(&value), &mut found);
        assert_eq!(
            found,
            roles(&["State", "Transitioning State", "Pass State", "Limited State"])
        );

        let value = json!({"Type": "Fail", "End": true});
        let mut found = roles(&["State"]);
        finder.find_more_roles(&Node::new(&value), &mut found);
        assert_eq!(found, roles(&["State", "Terminal State"]));

        let value = json!("Pass");
        let mut found = roles(&["State"]);
        finder.find_more_roles(&Node::new(&value), &mut found);
        assert_eq!(found, roles(&["State"]));
    }

    #[test]
    fn presence_roles_see_is_a_output() {
        let mut finder = RoleFinder::default();
        finder.add_is_a("A", "B");
        finder.add_field_presence_role("B", "x", "C");
        finder.add_field_presence_role("C", "y", "D");

        let value = json!({"x": 1, "y": 2});
        let mut found = roles(&["A"]);
        finder.find_more_roles(&Node::new(&value), &mut found);
        assert_eq!(found, roles(&["A", "B", "C", "D"]));
    }

    #[test]
    fn child_and_grandchild_roles() {
        let mut finder = RoleFinder::default();
        finder.add_child_role("Map State", "Iterator", "State Machine");
        finder.add_grandchild_role("State Machine", "States", "State");
        finder.add_grandchild_role("Root", "States", "State");

        assert_eq!(
            finder.find_child_roles(&roles(&["State", "Map State"]), "Iterator"),
            roles(&["State Machine"])
        );
        assert!(finder.find_child_roles(&roles(&["State"]), "Iterator").is_empty());
        assert_eq!(
            finder.find_grandchild_roles(&roles(&["State Machine", "Root"]), "States"),
            roles(&["State"])
        );
    }

    #[test]
    fn role_constraints() {
        use crate::constraint::ConstraintKind;

        let mut constraints = RoleConstraints::default();
        constraints.add("A", Constraint::new(ConstraintKind::NonEmptyArray("x".to_owned())));
        assert_eq!(constraints.get("A").len(), 1);
        assert!(constraints.get("B").is_empty());
    }

    #[test]
    fn allowed_fields() {
        let mut allowed = AllowedFields::default();
        allowed.set_allowed("A", "x");
        allowed.set_allowed("B", "y");

        assert!(allowed.is_allowed(&roles(&["A"]), "x"));
        assert!(allowed.is_allowed(&roles(&["A", "B"]), "y"));
        assert!(!allowed.is_allowed(&roles(&["A"]), "y"));
        assert!(!allowed.is_allowed(&roles(&["C"]), "x"));
        assert!(!allowed.is_any(&roles(&["A"])));

        allowed.set_any("C");
        assert!(allowed.is_allowed(&roles(&["C"]), "anything"));
        assert!(allowed.is_any(&roles(&["A", "C"])));
    }
}
