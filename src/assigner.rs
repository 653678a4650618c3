//! Turns parsed sentences into registry entries.

use crate::constraint::{Constraint, ConstraintKind, Range, ValueCheck};
use crate::deduce::deduce_value;
use crate::errors::RuleError;
use crate::grammar::{
    ChildRole, ConstraintSentence, FieldNames, Modal, Predicate, Relation, RoleCondition,
    RoleDefinition,
};
use crate::node::ValueType;
use crate::registry::{AllowedFields, RoleConstraints, RoleFinder};
use tracing::trace;

/// The registries a rule file fills in.
#[derive(Debug, Clone, Default)]
pub struct Assigner {
    pub finder: RoleFinder,
    pub constraints: RoleConstraints,
    pub allowed: AllowedFields,
}

impl Assigner {
    /// Records a role definition. Returns the role it introduces.
    pub fn assign_role(&mut self, definition: RoleDefinition) -> String {
        let RoleDefinition {
            role,
            condition,
            new_role,
        } = definition;

        match condition {
            RoleCondition::FieldValue { field, value } => {
                self.finder
                    .add_field_value_role(&role, &field, deduce_value(&value), &new_role)
            }
            RoleCondition::FieldPresence { field } => {
                self.finder.add_field_presence_role(&role, &field, &new_role)
            }
            RoleCondition::Always => self.finder.add_is_a(&role, &new_role),
        }

        trace!(%role, %new_role, "role defined");
        new_role
    }

    pub fn assign_only_one_of(&mut self, role: &str, fields: Vec<String>) {
        self.constraints
            .add(role, Constraint::new(ConstraintKind::OnlyOneOf(fields)));
    }

    /// Records a constraint sentence found on `line`. Returns the roles it
    /// introduces, if any.
    pub fn assign_constraints(
        &mut self,
        sentence: ConstraintSentence,
        line: usize,
    ) -> Result<Vec<String>, RuleError> {
        let ConstraintSentence {
            role,
            excluded,
            modal,
            value_type,
            fields,
            predicate,
            child,
        } = sentence;

        let names = fields.names();
        let mut kinds = Vec::new();

        for field in &names {
            match &predicate {
                Some(Predicate::Relation { relation, target }) => {
                    kinds.push(relation_constraint(field, *relation, target, line)?);
                }
                Some(Predicate::OneOf(values)) => kinds.push(ConstraintKind::FieldValue {
                    field: field.clone(),
                    check: ValueCheck::Enum(values.iter().map(|v| deduce_value(v)).collect()),
                }),
                None => {}
            }

            if let Some(token) = &value_type {
                kinds.extend(type_constraints(field, token));
            }

            self.allowed.set_allowed(&role, field);
        }

        match modal {
            Modal::Must => kinds.push(ConstraintKind::HasField(names.clone())),
            Modal::MustNot => {
                for field in &names {
                    kinds.push(ConstraintKind::DoesNotHaveField(field.clone()));
                }
            }
            Modal::May => {}
        }

        for kind in kinds {
            let mut constraint = Constraint::new(kind);
            constraint.exclude(excluded.clone());
            trace!(%role, ?constraint, "constraint added");
            self.constraints.add(&role, constraint);
        }

        let mut new_roles = Vec::new();
        match (child, &fields) {
            (Some(ChildRole::Value(child_role)), _) => {
                for field in &names {
                    self.finder.add_child_role(&role, field, &child_role);
                }
                new_roles.push(child_role);
            }
            (Some(ChildRole::Each(child_role)), _) => {
                for field in &names {
                    self.finder.add_grandchild_role(&role, field, &child_role);
                }
                new_roles.push(child_role);
            }
            (None, FieldNames::Single(field)) => {
                let untyped = match value_type.as_deref() {
                    None | Some("object") | Some("array") => true,
                    Some(_) => false,
                };

                // Contents of an untyped field are not checked.
                if untyped && modal != Modal::MustNot {
                    self.finder.add_grandchild_role(&role, field, field);
                    self.allowed.set_any(field);
                }
            }
            (None, FieldNames::OneOf(_)) => {}
        }

        Ok(new_roles)
    }
}

fn relation_constraint(
    field: &str,
    relation: Relation,
    target: &str,
    line: usize,
) -> Result<ConstraintKind, RuleError> {
    let bound = deduce_value(target)
        .as_f64()
        .ok_or_else(|| RuleError::NonNumericTarget {
            line,
            target: target.to_owned(),
        })?;
    let bound = Some(bound);

    let range = match relation {
        Relation::EqualTo => Range {
            equal: bound,
            ..Range::default()
        },
        Relation::GreaterThan => Range {
            floor: bound,
            ..Range::default()
        },
        Relation::LessThan => Range {
            ceiling: bound,
            ..Range::default()
        },
        Relation::GreaterThanOrEqualTo => Range {
            min: bound,
            ..Range::default()
        },
        Relation::LessThanOrEqualTo => Range {
            max: bound,
            ..Range::default()
        },
    };

    Ok(ConstraintKind::FieldValue {
        field: field.to_owned(),
        check: ValueCheck::Range(range),
    })
}

/// Expands a hyphenated type token such as `nullable-positive-integer-array`
/// into the constraints it stands for.
fn type_constraints(field: &str, token: &str) -> Vec<ConstraintKind> {
    let parts: Vec<&str> = token.split('-').collect();
    let is_nullable = parts.contains(&"nullable");

    let mut base: Vec<&str> = parts
        .iter()
        .copied()
        .filter(|p| *p != "nullable" && *p != "nonempty")
        .collect();
    let is_array = base.len() > 1 && base.last() == Some(&"array");
    if is_array {
        base.pop();
    }

    let mut kinds = Vec::new();
    if parts.contains(&"nonempty") {
        kinds.push(ConstraintKind::NonEmptyArray(field.to_owned()));
    }

    for part in base {
        let bounds = match part {
            "positive" => Range {
                floor: Some(0.0),
                ..Range::default()
            },
            "nonnegative" => Range {
                min: Some(0.0),
                ..Range::default()
            },
            "negative" => Range {
                ceiling: Some(0.0),
                ..Range::default()
            },
            _ => {
                if let Some(value_type) = ValueType::from_name(part) {
                    kinds.push(ConstraintKind::FieldType {
                        field: field.to_owned(),
                        value_type,
                        is_array,
                        is_nullable,
                    });
                }
                continue;
            }
        };

        kinds.push(ConstraintKind::FieldValue {
            field: field.to_owned(),
            check: ValueCheck::Range(bounds),
        });
    }

    kinds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deduce::Literal;
    use pretty_assertions::assert_eq;

    fn sentence(modal: Modal, value_type: Option<&str>, fields: FieldNames) -> ConstraintSentence {
        ConstraintSentence {
            role: "R".to_owned(),
            excluded: vec![],
            modal,
            value_type: value_type.map(str::to_owned),
            fields,
            predicate: None,
            child: None,
        }
    }

    fn kinds(assigner: &Assigner, role: &str) -> Vec<ConstraintKind> {
        assigner
            .constraints
            .get(role)
            .iter()
            .map(|c| c.kind().clone())
            .collect()
    }

    fn single(name: &str) -> FieldNames {
        FieldNames::Single(name.to_owned())
    }

    #[test]
    fn type_tokens() {
        assert_eq!(
            type_constraints("f", "nullable-positive-integer-array"),
            vec![
                ConstraintKind::FieldValue {
                    field: "f".to_owned(),
                    check: ValueCheck::Range(Range {
                        floor: Some(0.0),
                        ..Range::default()
                    }),
                },
                ConstraintKind::FieldType {
                    field: "f".to_owned(),
                    value_type: ValueType::Integer,
                    is_array: true,
                    is_nullable: true,
                },
            ]
        );

        assert_eq!(
            type_constraints("f", "nonempty-string-array"),
            vec![
                ConstraintKind::NonEmptyArray("f".to_owned()),
                ConstraintKind::FieldType {
                    field: "f".to_owned(),
                    value_type: ValueType::String,
                    is_array: true,
                    is_nullable: false,
                },
            ]
        );

        assert_eq!(
            type_constraints("f", "nullable-array"),
            vec![ConstraintKind::FieldType {
                field: "f".to_owned(),
                value_type: ValueType::Array,
                is_array: false,
                is_nullable: true,
            }]
        );
    }

    #[test]
    fn must_and_must_not() {
        let mut assigner = Assigner::default();
        assigner
            .assign_constraints(sentence(Modal::Must, Some("string"), single("a")), 1)
            .unwrap();
        assigner
            .assign_constraints(
                sentence(
                    Modal::MustNot,
                    None,
                    FieldNames::OneOf(vec!["b".to_owned(), "c".to_owned()]),
                ),
                2,
            )
            .unwrap();

        assert_eq!(
            kinds(&assigner, "R"),
            vec![
                ConstraintKind::FieldType {
                    field: "a".to_owned(),
                    value_type: ValueType::String,
                    is_array: false,
                    is_nullable: false,
                },
                ConstraintKind::HasField(vec!["a".to_owned()]),
                ConstraintKind::DoesNotHaveField("b".to_owned()),
                ConstraintKind::DoesNotHaveField("c".to_owned()),
            ]
        );

        let roles = vec!["R".to_owned()];
        assert!(assigner.allowed.is_allowed(&roles, "a"));
        assert!(assigner.allowed.is_allowed(&roles, "c"));
        assert!(!assigner.allowed.is_allowed(&roles, "d"));
    }

    #[test]
    fn predicates() {
        let mut assigner = Assigner::default();
        let mut with_enum = sentence(Modal::May, None, single("Type"));
        with_enum.predicate = Some(Predicate::OneOf(vec!["Pass".to_owned(), "3".to_owned()]));
        assigner.assign_constraints(with_enum, 1).unwrap();

        let mut with_relation = sentence(Modal::May, None, single("n"));
        with_relation.predicate = Some(Predicate::Relation {
            relation: Relation::LessThanOrEqualTo,
            target: "99999999".to_owned(),
        });
        assigner.assign_constraints(with_relation, 2).unwrap();

        assert_eq!(
            kinds(&assigner, "R"),
            vec![
                ConstraintKind::FieldValue {
                    field: "Type".to_owned(),
                    check: ValueCheck::Enum(vec![
                        Literal::String("Pass".to_owned()),
                        Literal::Integer(3)
                    ]),
                },
                ConstraintKind::FieldValue {
                    field: "n".to_owned(),
                    check: ValueCheck::Range(Range {
                        max: Some(99_999_999.0),
                        ..Range::default()
                    }),
                },
            ]
        );
    }

    #[test]
    fn non_numeric_target() {
        let mut assigner = Assigner::default();
        let mut bad = sentence(Modal::May, None, single("n"));
        bad.predicate = Some(Predicate::Relation {
            relation: Relation::LessThan,
            target: "\"ten\"".to_owned(),
        });

        assert_eq!(
            assigner.assign_constraints(bad, 7),
            Err(RuleError::NonNumericTarget {
                line: 7,
                target: "\"ten\"".to_owned()
            })
        );
    }

    #[test]
    fn exclusions_attach_to_every_constraint() {
        let mut assigner = Assigner::default();
        let mut excluded = sentence(Modal::Must, Some("string"), single("Next"));
        excluded.excluded = vec!["Terminal State".to_owned()];
        assigner.assign_constraints(excluded, 1).unwrap();

        let terminal = vec!["R".to_owned(), "Terminal State".to_owned()];
        for constraint in assigner.constraints.get("R") {
            assert!(!constraint.applies(&terminal));
            assert!(constraint.applies(&["R".to_owned()]));
        }
    }

    #[test]
    fn child_roles() {
        let mut assigner = Assigner::default();
        let mut each = sentence(Modal::Must, Some("object"), single("States"));
        each.child = Some(ChildRole::Each("State".to_owned()));
        assert_eq!(
            assigner.assign_constraints(each, 1).unwrap(),
            vec!["State".to_owned()]
        );

        let mut value = sentence(Modal::May, Some("object"), single("Iterator"));
        value.child = Some(ChildRole::Value("State Machine".to_owned()));
        assigner.assign_constraints(value, 2).unwrap();

        let roles = vec!["R".to_owned()];
        assert_eq!(
            assigner.finder.find_grandchild_roles(&roles, "States"),
            vec!["State".to_owned()]
        );
        assert_eq!(
            assigner.finder.find_child_roles(&roles, "Iterator"),
            vec!["State Machine".to_owned()]
        );
    }

    #[test]
    fn untyped_fields_accept_anything() {
        let mut assigner = Assigner::default();
        assigner
            .assign_constraints(sentence(Modal::May, Some("object"), single("Parameters")), 1)
            .unwrap();
        assigner
            .assign_constraints(sentence(Modal::May, Some("string"), single("Comment")), 2)
            .unwrap();

        let roles = vec!["R".to_owned()];
        let grandchild = assigner.finder.find_grandchild_roles(&roles, "Parameters");
        assert_eq!(grandchild, vec!["Parameters".to_owned()]);
        assert!(assigner.allowed.is_any(&grandchild));
        assert!(assigner
            .finder
            .find_grandchild_roles(&roles, "Comment")
            .is_empty());
    }

    #[test]
    fn role_definitions() {
        let mut assigner = Assigner::default();
        let new_role = assigner.assign_role(RoleDefinition {
            role: "State".to_owned(),
            condition: RoleCondition::FieldValue {
                field: "End".to_owned(),
                value: "true".to_owned(),
            },
            new_role: "Terminal State".to_owned(),
        });
        assert_eq!(new_role, "Terminal State");

        let value = serde_json::json!({"End": true});
        let mut roles = vec!["State".to_owned()];
        assigner
            .finder
            .find_more_roles(&crate::node::Node::new(&value), &mut roles);
        assert_eq!(roles, vec!["State".to_owned(), "Terminal State".to_owned()]);
    }
}
