//! Reported problems and the catalog that renders them.
//!
//! Checks never build message strings themselves. They report a
//! [`ProblemKind`](enum.ProblemKind.html) together with positional arguments,
//! and a [`Catalog`](struct.Catalog.html) turns that pair into the text a user
//! sees. The default catalog is English; a different one can be loaded from
//! JSON and handed to the validator through its
//! [`Config`](../validator/struct.Config.html).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Every kind of problem validation can report.
///
/// The variant names double as the keys of a JSON catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemKind {
    /// `(path, field)`
    HasFieldSingle,
    /// `(path, fields)`
    HasFieldMultiple,
    /// `(path, field)`
    DoesNotHaveField,
    /// `(path)`
    FieldTypeNull,
    /// `(path, actual types, expected)`
    FieldType,
    /// `(path, field, value, allowed values)`
    FieldValueEnum,
    /// `(path, field, value, bound)`
    FieldValueEqual,
    /// `(path, field, value, bound)`
    FieldValueFloor,
    /// `(path, field, value, bound)`
    FieldValueMin,
    /// `(path, field, value, bound)`
    FieldValueCeiling,
    /// `(path, field, value, bound)`
    FieldValueMax,
    /// `(path, fields)`
    OnlyOneOf,
    /// `(path, field)`
    NonEmptyArray,
    /// `(field, path)`
    FieldNotAllowed,
    /// `(target, path)`
    MissingStartTarget,
    /// `(name, path, first definition)`
    DuplicateStateName,
    /// `(target, path, field)`
    NoSuchState,
    /// `(path, state name)`
    UnreachableState,
    /// `(path)`
    NoTerminalState,
    /// `(field, path)`
    NullField,
    /// `(field, path)`
    InvalidPathField,
    /// `(key, builder field, path)`
    InvalidPayloadPath,
    /// `(path)`
    InvalidChoiceVariable,
    /// `(path, index)`
    StatesAllNotLast,
}

impl ProblemKind {
    pub const ALL: [ProblemKind; 24] = [
        ProblemKind::HasFieldSingle,
        ProblemKind::HasFieldMultiple,
        ProblemKind::DoesNotHaveField,
        ProblemKind::FieldTypeNull,
        ProblemKind::FieldType,
        ProblemKind::FieldValueEnum,
        ProblemKind::FieldValueEqual,
        ProblemKind::FieldValueFloor,
        ProblemKind::FieldValueMin,
        ProblemKind::FieldValueCeiling,
        ProblemKind::FieldValueMax,
        ProblemKind::OnlyOneOf,
        ProblemKind::NonEmptyArray,
        ProblemKind::FieldNotAllowed,
        ProblemKind::MissingStartTarget,
        ProblemKind::DuplicateStateName,
        ProblemKind::NoSuchState,
        ProblemKind::UnreachableState,
        ProblemKind::NoTerminalState,
        ProblemKind::NullField,
        ProblemKind::InvalidPathField,
        ProblemKind::InvalidPayloadPath,
        ProblemKind::InvalidChoiceVariable,
        ProblemKind::StatesAllNotLast,
    ];

    fn english(self) -> &'static str {
        match self {
            ProblemKind::HasFieldSingle => "{0} does not have required field \"{1}\".",
            ProblemKind::HasFieldMultiple => "{0} does not have required field from {1}.",
            ProblemKind::DoesNotHaveField => "{0} has forbidden field \"{1}\".",
            ProblemKind::FieldTypeNull => "{0} should be non-null.",
            ProblemKind::FieldType => "{0} is of type {1}, should be {2}.",
            ProblemKind::FieldValueEnum => "{0}.{1} is {2}, should be one of {3}.",
            ProblemKind::FieldValueEqual => "{0}.{1} is {2}, should be equal to {3}.",
            ProblemKind::FieldValueFloor => "{0}.{1} is {2}, should be greater than {3}.",
            ProblemKind::FieldValueMin => "{0}.{1} is {2}, should be at least {3}.",
            ProblemKind::FieldValueCeiling => "{0}.{1} is {2}, should be less than {3}.",
            ProblemKind::FieldValueMax => "{0}.{1} is {2}, should be at most {3}.",
            ProblemKind::OnlyOneOf => "{0} may have only one of {1}.",
            ProblemKind::NonEmptyArray => "{0}.{1} is an empty array.",
            ProblemKind::FieldNotAllowed => "Field \"{0}\" not allowed in {1}.",
            ProblemKind::MissingStartTarget => {
                "StartAt value \"{0}\" not found in States field at {1}."
            }
            ProblemKind::DuplicateStateName => {
                "State \"{0}\", defined at {1}, is also defined at {2}."
            }
            ProblemKind::NoSuchState => "No state found named \"{0}\", referenced at {1}.{2}.",
            ProblemKind::UnreachableState => "No transition found to state {0}.States.{1}.",
            ProblemKind::NoTerminalState => "No terminal state found in machine at {0}.States.",
            ProblemKind::NullField => "Field \"{0}\" defined at {1} should be non-null.",
            ProblemKind::InvalidPathField => "Field \"{0}\" defined at {1} is not a JSONPath.",
            ProblemKind::InvalidPayloadPath => {
                "Field \"{0}\" of {1} at {2} is not a JSONPath or intrinsic function expression."
            }
            ProblemKind::InvalidChoiceVariable => {
                "{0}.Variable is not a JSONPath or intrinsic function expression."
            }
            ProblemKind::StatesAllNotLast => {
                "{0}[{1}]: States.ALL can only appear in the last element, and by itself."
            }
        }
    }
}

/// One rendered validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    kind: ProblemKind,
    args: Vec<String>,
    message: String,
}

impl Problem {
    pub fn kind(&self) -> ProblemKind {
        self.kind
    }

    /// The positional arguments the message was rendered from.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Message templates keyed by problem kind.
///
/// Templates refer to arguments by position: `{0}`, `{1}`, and so on. A
/// placeholder with no matching argument is left as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    templates: HashMap<ProblemKind, String>,
}

impl Catalog {
    /// Loads a catalog from a JSON object mapping kind names to templates.
    ///
    /// Kinds the object does not mention keep their English template. Unknown
    /// kind names are an error.
    pub fn from_json(json: &str) -> Result<Catalog, serde_json::Error> {
        let overrides: HashMap<ProblemKind, String> = serde_json::from_str(json)?;

        let mut catalog = Catalog::default();
        catalog.templates.extend(overrides);
        Ok(catalog)
    }

    pub fn template(&self, kind: ProblemKind) -> &str {
        self.templates
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.english())
    }

    pub fn render(&self, kind: ProblemKind, args: &[String]) -> String {
        let template = self.template(kind);
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let placeholder = after.find('}').and_then(|close| {
                after[..close]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| args.get(i))
                    .map(|arg| (arg, close))
            });

            match placeholder {
                Some((arg, close)) => {
                    out.push_str(arg);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog {
            templates: ProblemKind::ALL
                .iter()
                .map(|&kind| (kind, kind.english().to_owned()))
                .collect(),
        }
    }
}

/// Renders a list of names the way messages show them: `["A", "B"]`.
pub(crate) fn name_list(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("\"{}\"", n)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Accumulates the problems of one validation.
pub(crate) struct Problems<'c> {
    catalog: &'c Catalog,
    problems: Vec<Problem>,
}

impl<'c> Problems<'c> {
    pub fn new(catalog: &'c Catalog) -> Problems<'c> {
        Problems {
            catalog,
            problems: Vec::new(),
        }
    }

    pub fn report(&mut self, kind: ProblemKind, args: Vec<String>) {
        let message = self.catalog.render(kind, &args);
        self.problems.push(Problem {
            kind,
            args,
            message,
        });
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn into_vec(self) -> Vec<Problem> {
        self.problems
    }
}
