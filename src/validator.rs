//! Validate documents against compiled rule sets.
//!
//! Validation runs in two passes. The first checks every node against the
//! constraints of the roles it plays; the second checks the properties of a
//! state machine that span nodes, such as reachability and unique state
//! names.
//!
//! See the docs for [`Validator`](struct.Validator.html) for more.

use crate::problem::{Catalog, Problem, Problems};
use crate::schema::RuleSet;
use crate::{state_machine, vm};
use serde_json::Value;
use tracing::debug;

/// Validates documents against rule sets.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct Validator {
    config: Config,
}

impl Validator {
    /// Constructs a new validator using the default configuration.
    pub fn new() -> Self {
        Self::new_with_config(Config::default())
    }

    /// Constructs a new validator using a configuration.
    pub fn new_with_config(config: Config) -> Self {
        Self { config }
    }

    /// Validate a document against a rule set.
    ///
    /// Problems are not Rust errors. A list of problems is the _successful_
    /// result of running `validate`, and an empty list means the document is
    /// valid. Problems from the per-node pass come first, in breadth-first
    /// document order, followed by those of the structural pass.
    pub fn validate(&self, rules: &RuleSet, document: &Value) -> Vec<Problem> {
        let mut problems = Problems::new(&self.config.catalog);

        vm::validate(rules, document, &mut problems);
        if self.config.structural_checks {
            state_machine::check(document, rules.root(), &mut problems);
        }

        debug!(root = rules.root(), problems = problems.len(), "document validated");
        problems.into_vec()
    }
}

/// Configuration for how validation should proceed.
#[derive(Debug, PartialEq, Clone)]
pub struct Config {
    catalog: Catalog,
    structural_checks: bool,
}

impl Config {
    /// Create a new, default `Config`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the catalog problem messages are rendered with. The default is
    /// the built-in English catalog.
    pub fn catalog(&mut self, catalog: Catalog) -> &mut Self {
        self.catalog = catalog;
        self
    }

    /// Sets whether the state-machine checks run after the per-node checks.
    /// The default is to run them.
    ///
    /// These checks look for `States`, `StartAt`, `Next` and the other fields
    /// of the Amazon States Language wherever they appear. Turn them off when
    /// validating documents of some other vocabulary.
    pub fn structural_checks(&mut self, structural_checks: bool) -> &mut Self {
        self.structural_checks = structural_checks;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: Catalog::default(),
            structural_checks: true,
        }
    }
}
