//! The sentence grammar of rule files.
//!
//! Most sentence patterns mention role names, and rule files introduce new
//! roles as they go, so a [`Grammar`](struct.Grammar.html) is built from the
//! set of roles known so far and rebuilt whenever that set grows. Building is
//! a pure function of the role list.
//!
//! Four sentence forms are recognized:
//!
//! ```text
//! A State MUST have a string field named "Type" whose value MUST be one of "Pass" or "Fail".
//! A Wait State MUST have only one of "Seconds" and "SecondsPath".
//! A State whose "Type" field's value is "Pass" is a "Pass State".
//! Each of a Pass State and a Task State MAY have an object field named "Parameters".
//! ```
//!
//! plus the root declaration, which must open every rule file:
//!
//! ```text
//! This document specifies a JSON object called a "State Machine".
//! ```

use crate::node::ValueType;
use crate::oxford::{self, ListOptions};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ROOT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"This\s+document\s+specifies\s+a\s+JSON\s+object\s+called\s+an?\s+"([^"]+)"\."#)
        .expect("unreachable: root grammar is invalid")
});

static ROLE_DEF_TAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"is\s+an?\s+"[^"]*"\.\s*$"#).expect("unreachable: role grammar is invalid")
});

static TYPES: Lazy<String> = Lazy::new(type_pattern);

const NUMERIC_TYPES: &[&str] = &["float", "integer", "numeric"];
const NUMERIC_MODIFIERS: &[&str] = &["positive", "negative", "nonnegative"];

const MODAL: &str = r"(?P<modal>MUST NOT|MUST|MAY)";
const RELATIONS: &str = "greater than or equal to|less than or equal to|equal to|greater than|less than";
const QUOTED: &str = r#""[^"]*""#;
const QUOTED_NONEMPTY: &str = r#""[^"]+""#;
const CHILD_ROLE: &str = r#";\s+((its\s+(?P<child_value>value))|(each\s+(?P<child_each>field|element)))\s+is\s+an?\s+"(?P<child_role>[^"]+)""#;

/// Whether a constraint sentence requires, permits or forbids its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    Must,
    May,
    MustNot,
}

/// The field or fields a constraint sentence is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldNames {
    /// `field named "X"`
    Single(String),
    /// `field named one of "X", "Y", or "Z"`
    OneOf(Vec<String>),
}

impl FieldNames {
    pub fn names(&self) -> Vec<String> {
        match self {
            FieldNames::Single(name) => vec![name.clone()],
            FieldNames::OneOf(names) => names.clone(),
        }
    }
}

/// Numeric relations in `whose value MUST be <relation> <target>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    EqualTo,
    GreaterThan,
    LessThan,
    GreaterThanOrEqualTo,
    LessThanOrEqualTo,
}

impl Relation {
    fn parse(text: &str) -> Option<Relation> {
        match text {
            "equal to" => Some(Relation::EqualTo),
            "greater than" => Some(Relation::GreaterThan),
            "less than" => Some(Relation::LessThan),
            "greater than or equal to" => Some(Relation::GreaterThanOrEqualTo),
            "less than or equal to" => Some(Relation::LessThanOrEqualTo),
            _ => None,
        }
    }
}

/// The `whose value MUST be ...` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Relation { relation: Relation, target: String },
    /// The quoted values, quotes removed.
    OneOf(Vec<String>),
}

/// The trailing `; its value is a "R"` / `; each field is a "R"` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildRole {
    /// The field's value gets the role.
    Value(String),
    /// Each member or element of the field's value gets the role.
    Each(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSentence {
    pub role: String,
    /// Roles from a `which is not a R2, a R3, or a R4` clause.
    pub excluded: Vec<String>,
    pub modal: Modal,
    /// The hyphenated type token, e.g. `nullable-positive-integer-array`.
    pub value_type: Option<String>,
    pub fields: FieldNames,
    pub predicate: Option<Predicate>,
    pub child: Option<ChildRole>,
}

/// When a role definition applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleCondition {
    /// `A R is a "S".`
    Always,
    /// `A R whose "F" field's value is V is a "S".` The value is the raw
    /// literal token.
    FieldValue { field: String, value: String },
    /// `A R with a "F" field is a "S".`
    FieldPresence { field: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinition {
    pub role: String,
    pub condition: RoleCondition,
    pub new_role: String,
}

/// One parsed rule-file line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sentence {
    Constraint(ConstraintSentence),
    OnlyOneOf { role: String, fields: Vec<String> },
    /// `Each of a R1, a R2, and a R3 <trailer>`: stands for one sentence per
    /// listed role.
    EachOf { roles: Vec<String>, trailer: String },
    RoleDef(RoleDefinition),
}

/// The root role named by a root declaration line, if `line` is one.
pub fn root_role(line: &str) -> Option<String> {
    ROOT.captures(line).map(|c| c[1].to_owned())
}

/// Compiled sentence patterns for one set of known roles.
#[derive(Debug, Clone)]
pub struct Grammar {
    constraint_start: Regex,
    constraint: Regex,
    only_one_start: Regex,
    only_one: Regex,
    role_def: Regex,
    each_of: Regex,
    role_item: Regex,
}

impl Grammar {
    /// Builds the patterns for `roles`.
    pub fn new(roles: &[String]) -> Result<Grammar, regex::Error> {
        let roles = role_alternation(roles);

        let conditional = format!(
            r"which\s+is\s+not\s+{}\s+",
            oxford::list_pattern(
                &roles,
                ListOptions {
                    article: true,
                    capture: Some("excluded"),
                    ..ListOptions::default()
                },
            )
        );
        let constraint_start = format!(
            r"^An?\s+(?P<role>{})\s+({})?{}\s+have\s+an?\s+",
            roles, conditional, MODAL
        );

        let relational = format!(
            r"((?P<relation>{})\s+)(?P<target>{}|\S+)",
            RELATIONS, QUOTED
        );
        let enumeration = format!(
            r"one\s+of\s+{}",
            oxford::list_pattern(
                QUOTED,
                ListOptions {
                    capture: Some("strings"),
                    ..ListOptions::default()
                },
            )
        );
        let predicate = format!("({}|{})", relational, enumeration);
        let field_list = format!(
            r"one\s+of\s+{}",
            oxford::list_pattern(
                QUOTED_NONEMPTY,
                ListOptions {
                    capture: Some("field_list"),
                    ..ListOptions::default()
                },
            )
        );
        let constraint = format!(
            r#"{}((?P<type>{})\s+)?field\s+named\s+(("(?P<field_name>[^"]+)")|({}))(\s+whose\s+value\s+MUST\s+be\s+{})?({})?\.\s*$"#,
            constraint_start,
            *TYPES,
            field_list,
            predicate,
            CHILD_ROLE
        );

        let only_one_start = format!(r"^An?\s+(?P<role>{})\s+MUST\s+have\s+only\s+", roles);
        let only_one = format!(
            r"{}one\s+of\s+{}\.\s*$",
            only_one_start,
            oxford::list_pattern(
                QUOTED_NONEMPTY,
                ListOptions {
                    capture: Some("field_list"),
                    connector: "and",
                    ..ListOptions::default()
                },
            )
        );

        let value_match = r#"whose\s+"(?P<field_to_match>[^"]+)"\s+field's\s+value\s+is\s+(?P<value_to_match>("[^"]*")|([^"\s]\S*))\s+"#;
        let with_a_match = r#"with\s+an?\s+"(?P<with_a_field>[^"]+)"\s+field\s+"#;
        let role_def = format!(
            r#"^An?\s+(?P<role>{})\s+(({})|({}))?is\s+an?\s+"(?P<new_role>[^"]+)"\.\s*$"#,
            roles, value_match, with_a_match
        );

        let each_of = format!(
            r"^Each\s+of\s+{}\s+(?P<trailer>.*)$",
            oxford::list_pattern(
                &roles,
                ListOptions {
                    article: true,
                    capture: Some("each_of"),
                    connector: "and",
                },
            )
        );

        Ok(Grammar {
            constraint_start: Regex::new(&constraint_start)?,
            constraint: Regex::new(&constraint)?,
            only_one_start: Regex::new(&only_one_start)?,
            only_one: Regex::new(&only_one)?,
            role_def: Regex::new(&role_def)?,
            each_of: Regex::new(&each_of)?,
            role_item: Regex::new(&oxford::role_item_pattern(&roles))?,
        })
    }

    /// Parses one line. `None` means the line is not a sentence this grammar
    /// knows, including lines which start like one of the forms but do not
    /// finish like it.
    pub fn parse(&self, line: &str) -> Option<Sentence> {
        if self.constraint_start.is_match(line) {
            return self
                .constraint
                .captures(line)
                .and_then(|c| self.constraint_sentence(&c))
                .map(Sentence::Constraint);
        }

        if self.only_one_start.is_match(line) {
            return self.only_one.captures(line).map(|c| Sentence::OnlyOneOf {
                role: c["role"].to_owned(),
                fields: oxford::break_string_list(&c["field_list"]),
            });
        }

        if let Some(c) = self.each_of.captures(line) {
            return Some(Sentence::EachOf {
                roles: oxford::break_role_list(&self.role_item, &c["each_of"]),
                trailer: c["trailer"].to_owned(),
            });
        }

        if ROLE_DEF_TAIL.is_match(line) {
            return self.role_def.captures(line).map(|c| {
                let condition = if let Some(field) = group(&c, "field_to_match") {
                    RoleCondition::FieldValue {
                        field: field.to_owned(),
                        value: c["value_to_match"].to_owned(),
                    }
                } else if let Some(field) = group(&c, "with_a_field") {
                    RoleCondition::FieldPresence {
                        field: field.to_owned(),
                    }
                } else {
                    RoleCondition::Always
                };

                Sentence::RoleDef(RoleDefinition {
                    role: c["role"].to_owned(),
                    condition,
                    new_role: c["new_role"].to_owned(),
                })
            });
        }

        None
    }

    fn constraint_sentence(&self, c: &Captures) -> Option<ConstraintSentence> {
        let modal = match &c["modal"] {
            "MUST" => Modal::Must,
            "MAY" => Modal::May,
            _ => Modal::MustNot,
        };

        let fields = match group(c, "field_name") {
            Some(name) => FieldNames::Single(name.to_owned()),
            None => FieldNames::OneOf(oxford::break_string_list(group(c, "field_list")?)),
        };

        let predicate = if let Some(relation) = group(c, "relation") {
            Some(Predicate::Relation {
                relation: Relation::parse(relation)?,
                target: c["target"].to_owned(),
            })
        } else if let Some(strings) = group(c, "strings") {
            Some(Predicate::OneOf(oxford::break_string_list(strings)))
        } else {
            None
        };

        let child = match (group(c, "child_value"), group(c, "child_role")) {
            (Some(_), Some(role)) => Some(ChildRole::Value(role.to_owned())),
            (None, Some(role)) => Some(ChildRole::Each(role.to_owned())),
            _ => None,
        };

        let excluded = group(c, "excluded")
            .map(|list| oxford::break_role_list(&self.role_item, list))
            .unwrap_or_default();

        Some(ConstraintSentence {
            role: c["role"].to_owned(),
            excluded,
            modal,
            value_type: group(c, "type").map(str::to_owned),
            fields,
            predicate,
            child,
        })
    }
}

/// The role alternation used inside every pattern: escaped, longest first so
/// that a role which prefixes another never shadows it.
fn role_alternation(roles: &[String]) -> String {
    let mut sorted: Vec<&String> = roles.iter().collect();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    sorted.dedup();
    sorted
        .iter()
        .map(|r| regex::escape(r))
        .collect::<Vec<_>>()
        .join("|")
}

/// A named group, treating an empty match like an absent one.
fn group<'t>(c: &Captures<'t>, name: &str) -> Option<&'t str> {
    c.name(name).map(|m| m.as_str()).filter(|s| !s.is_empty())
}

fn type_pattern() -> String {
    let mut types: Vec<String> = ValueType::ALL.iter().map(|t| t.name().to_owned()).collect();

    for numeric in NUMERIC_TYPES {
        for modifier in NUMERIC_MODIFIERS {
            types.push(format!("{}-{}", modifier, numeric));
        }
    }

    let arrays: Vec<String> = types.iter().map(|t| format!("{}-array", t)).collect();
    let nonempty_arrays: Vec<String> = arrays.iter().map(|t| format!("nonempty-{}", t)).collect();
    types.extend(arrays);
    types.extend(nonempty_arrays);

    let nullable: Vec<String> = types.iter().map(|t| format!("nullable-{}", t)).collect();
    types.extend(nullable);

    types.join("|")
}
