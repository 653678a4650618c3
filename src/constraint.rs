//! Per-node constraints compiled from rule sentences.

use crate::deduce::Literal;
use crate::node::{Node, ValueType};
use crate::problem::{name_list, ProblemKind, Problems};

/// What a [`Constraint`](struct.Constraint.html) checks.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    /// At least one of the named fields is present.
    HasField(Vec<String>),
    DoesNotHaveField(String),
    FieldType {
        field: String,
        value_type: ValueType,
        /// The field holds an array and each element is checked instead.
        is_array: bool,
        is_nullable: bool,
    },
    FieldValue {
        field: String,
        check: ValueCheck,
    },
    /// At most one of the named fields is present.
    OnlyOneOf(Vec<String>),
    /// The field, when it is an array, has at least one element.
    NonEmptyArray(String),
}

/// Restrictions on a field's value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueCheck {
    /// The value equals one of the literals.
    Enum(Vec<Literal>),
    /// Numeric bounds. Non-numeric values pass; their type is some other
    /// constraint's business.
    Range(Range),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Range {
    pub equal: Option<f64>,
    /// Exclusive lower bound.
    pub floor: Option<f64>,
    /// Inclusive lower bound.
    pub min: Option<f64>,
    /// Exclusive upper bound.
    pub ceiling: Option<f64>,
    /// Inclusive upper bound.
    pub max: Option<f64>,
}

/// A check bound to a role, skipped for nodes which also carry an excluded
/// role.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    kind: ConstraintKind,
    exclusions: Vec<Vec<String>>,
}

impl Constraint {
    pub fn new(kind: ConstraintKind) -> Constraint {
        Constraint {
            kind,
            exclusions: Vec::new(),
        }
    }

    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    /// Adds an exclusion condition: the constraint does not apply to nodes
    /// carrying any of `roles`.
    pub fn exclude(&mut self, roles: Vec<String>) {
        if !roles.is_empty() {
            self.exclusions.push(roles);
        }
    }

    /// Does the constraint apply to a node carrying `roles`?
    pub fn applies(&self, roles: &[String]) -> bool {
        !self
            .exclusions
            .iter()
            .any(|excluded| excluded.iter().any(|role| roles.contains(role)))
    }

    /// Checks `node`, found at `path`, reporting each violation.
    pub(crate) fn check(&self, node: &Node, path: &str, problems: &mut Problems) {
        match &self.kind {
            ConstraintKind::HasField(names) => {
                if !node.is(ValueType::Object) || names.iter().any(|n| node.has_field(n)) {
                    return;
                }

                if names.len() == 1 {
                    problems.report(
                        ProblemKind::HasFieldSingle,
                        vec![path.to_owned(), names[0].clone()],
                    );
                } else {
                    problems.report(
                        ProblemKind::HasFieldMultiple,
                        vec![path.to_owned(), name_list(names)],
                    );
                }
            }

            ConstraintKind::DoesNotHaveField(name) => {
                if node.has_field(name) {
                    problems.report(
                        ProblemKind::DoesNotHaveField,
                        vec![path.to_owned(), name.clone()],
                    );
                }
            }

            ConstraintKind::FieldType {
                field,
                value_type,
                is_array,
                is_nullable,
            } => {
                let value = match node.get(field) {
                    Some(value) => value,
                    None => return,
                };
                let path = format!("{}.{}", path, field);

                if value.is_null() {
                    if !is_nullable {
                        problems.report(ProblemKind::FieldTypeNull, vec![path]);
                    }
                    return;
                }

                if !is_array {
                    check_type(&value, *value_type, &path, problems);
                } else if value.is(ValueType::Array) {
                    for (i, element) in value.elements().enumerate() {
                        check_type(&element, *value_type, &format!("{}[{}]", path, i), problems);
                    }
                } else {
                    problems.report(
                        ProblemKind::FieldType,
                        vec![path, value.describe_types(), "an Array".to_owned()],
                    );
                }
            }

            ConstraintKind::FieldValue { field, check } => {
                if let Some(value) = node.get(field) {
                    check_value(&value, check, path, field, problems);
                }
            }

            ConstraintKind::OnlyOneOf(names) => {
                if !node.is(ValueType::Object) {
                    return;
                }

                if names.iter().filter(|n| node.has_field(n)).count() > 1 {
                    problems.report(
                        ProblemKind::OnlyOneOf,
                        vec![path.to_owned(), name_list(names)],
                    );
                }
            }

            ConstraintKind::NonEmptyArray(name) => {
                if let Some(value) = node.get(name) {
                    if value.is(ValueType::Array) && value.len() == 0 {
                        problems.report(
                            ProblemKind::NonEmptyArray,
                            vec![path.to_owned(), name.clone()],
                        );
                    }
                }
            }
        }
    }
}

fn check_type(value: &Node, expected: ValueType, path: &str, problems: &mut Problems) {
    if !value.is(expected) {
        problems.report(
            ProblemKind::FieldType,
            vec![path.to_owned(), value.describe_types(), expected.to_string()],
        );
    }
}

fn check_value(value: &Node, check: &ValueCheck, path: &str, field: &str, problems: &mut Problems) {
    let mut report = |kind: ProblemKind, expected: String| {
        problems.report(
            kind,
            vec![
                path.to_owned(),
                field.to_owned(),
                value.value().to_string(),
                expected,
            ],
        );
    };

    match check {
        ValueCheck::Enum(allowed) => {
            if !allowed.iter().any(|literal| literal.matches(value)) {
                let rendered: Vec<String> = allowed.iter().map(Literal::to_string).collect();
                report(
                    ProblemKind::FieldValueEnum,
                    format!("[{}]", rendered.join(", ")),
                );
            }
        }

        ValueCheck::Range(range) => {
            if !value.is(ValueType::Numeric) {
                return;
            }
            let n = value.to_f64();

            if let Some(bound) = range.equal {
                if n != bound {
                    report(ProblemKind::FieldValueEqual, bound.to_string());
                }
            }
            if let Some(bound) = range.floor {
                if n <= bound {
                    report(ProblemKind::FieldValueFloor, bound.to_string());
                }
            }
            if let Some(bound) = range.min {
                if n < bound {
                    report(ProblemKind::FieldValueMin, bound.to_string());
                }
            }
            if let Some(bound) = range.ceiling {
                if n >= bound {
                    report(ProblemKind::FieldValueCeiling, bound.to_string());
                }
            }
            if let Some(bound) = range.max {
                if n > bound {
                    report(ProblemKind::FieldValueMax, bound.to_string());
                }
            }
        }
    }
}
