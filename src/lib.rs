//! `statelint` validates JSON documents against rule files written in
//! constrained English, and ships with the rule file for the [Amazon States
//! Language][asl], the JSON dialect AWS Step Functions state machines are
//! written in.
//!
//! A rule file reads like the prose of a language specification:
//!
//! ```text
//! This document specifies a JSON object called a "State Machine".
//! A State Machine MUST have an object field named "States"; each field is a "State".
//! A State MUST have a string field named "Type" whose value MUST be one of "Pass", "Succeed", or "Fail".
//! ```
//!
//! Each sentence gives nodes of the document *roles*, or constrains the nodes
//! that play a role. Compiling a rule file yields a
//! [`RuleSet`](schema/struct.RuleSet.html), which can validate any number of
//! documents.
//!
//! # Validating a state machine
//!
//! ```
//! use serde_json::json;
//! use statelint::{ProblemKind, RuleSet, Validator};
//! use failure::Error;
//!
//! fn main() -> Result<(), Error> {
//!     // The bundled rule file for the Amazon States Language.
//!     let rules = RuleSet::state_machine()?;
//!     let validator = Validator::new();
//!
//!     let ok = json!({
//!         "StartAt": "Hello",
//!         "States": {
//!             "Hello": {"Type": "Pass", "Result": "Hello", "Next": "World"},
//!             "World": {"Type": "Succeed"}
//!         }
//!     });
//!     assert!(validator.validate(&rules, &ok).is_empty());
//!
//!     let bad = json!({
//!         "StartAt": "Hello",
//!         "States": {
//!             "Hello": {"Type": "Pass", "Next": "Nowhere", "End": true}
//!         }
//!     });
//!
//!     // Problems are ordinary values, each with a kind, the arguments it was
//!     // reported with and a rendered message.
//!     let problems = validator.validate(&rules, &bad);
//!     let kinds: Vec<ProblemKind> = problems.iter().map(|p| p.kind()).collect();
//!     assert_eq!(kinds, vec![ProblemKind::DoesNotHaveField, ProblemKind::NoSuchState]);
//!     assert_eq!(
//!         problems[1].message(),
//!         "No state found named \"Nowhere\", referenced at State Machine.States.Hello.Next."
//!     );
//!
//!     Ok(())
//! }
//! ```
//!
//! # Other vocabularies
//!
//! The engine knows nothing about state machines beyond the bundled rule file
//! and the structural checks in the second pass. Compile a rule file of your
//! own with [`RuleSet::compile`](schema/struct.RuleSet.html#method.compile),
//! and turn the state-machine checks off with
//! [`Config::structural_checks`](validator/struct.Config.html#method.structural_checks).
//!
//! [asl]: https://states-language.net/spec.html

mod assigner;
mod constraint;
mod deduce;
mod grammar;
mod oxford;
mod registry;
mod state_machine;
mod vm;

pub mod errors;
pub mod node;
pub mod path;
pub mod problem;
pub mod schema;
pub mod validator;

pub use crate::errors::RuleError;
pub use crate::problem::{Catalog, Problem, ProblemKind};
pub use crate::schema::RuleSet;
pub use crate::validator::{Config, Validator};

use serde_json::Value;

/// Validates `document` against `rules` with the default configuration and
/// returns the rendered problem messages. An empty list means the document is
/// valid.
pub fn validate(document: &Value, rules: &RuleSet) -> Vec<String> {
    Validator::new()
        .validate(rules, document)
        .into_iter()
        .map(|problem| problem.to_string())
        .collect()
}
