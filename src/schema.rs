//! Compiled rule files.
//!
//! A rule file describes a family of JSON documents in constrained English,
//! one sentence per line:
//!
//! ```text
//! This document specifies a JSON object called a "Config".
//! A Config MUST have a string field named "name".
//! A Config MAY have a positive-integer field named "retries".
//! A Config whose "mode" field's value is "batch" is a "Batch Config".
//! A Batch Config MUST have a nonempty-string-array field named "inputs".
//! ```
//!
//! [`RuleSet::compile`](struct.RuleSet.html#method.compile) turns such a file
//! into the tables a [`Validator`](../validator/struct.Validator.html) checks
//! documents against. The rule file for the Amazon States Language ships with
//! this crate; see [`RuleSet::state_machine`](struct.RuleSet.html#method.state_machine).

use crate::assigner::Assigner;
use crate::constraint::Constraint;
use crate::errors::RuleError;
use crate::grammar::{self, Grammar, Sentence};
use crate::registry::{AllowedFields, RoleFinder};
use tracing::{debug, trace};

const STATE_MACHINE_RULES: &str = include_str!("../data/StateMachine.j2119");

/// An immutable, compiled rule file.
///
/// A `RuleSet` is only read during validation, so one instance can serve any
/// number of validations, including concurrent ones.
#[derive(Debug, Clone)]
pub struct RuleSet {
    root: String,
    rules: Assigner,
}

impl RuleSet {
    /// Compiles rule-file text.
    ///
    /// Blank lines are ignored. The first non-blank line must be the root
    /// declaration, and every later line must be one complete sentence.
    pub fn compile(text: &str) -> Result<RuleSet, RuleError> {
        let mut parser: Option<Parser> = None;
        let mut lines = 0;

        for (i, line) in text.lines().enumerate() {
            let number = i + 1;
            if line.trim().is_empty() {
                continue;
            }
            lines += 1;

            if let Some(root) = grammar::root_role(line) {
                if parser.is_some() {
                    return Err(RuleError::DuplicateRoot { line: number });
                }
                parser = Some(Parser::new(root)?);
                continue;
            }

            match parser.as_mut() {
                Some(parser) => parser.proc_line(line, number)?,
                None => return Err(RuleError::MissingRoot { line: number }),
            }
        }

        let parser = parser.ok_or(RuleError::MissingRoot { line: 0 })?;
        debug!(
            root = %parser.root,
            roles = parser.roles.len(),
            lines,
            "rule set compiled"
        );

        Ok(RuleSet {
            root: parser.root,
            rules: parser.assigner,
        })
    }

    /// Compiles the bundled Amazon States Language rule file.
    pub fn state_machine() -> Result<RuleSet, RuleError> {
        RuleSet::compile(STATE_MACHINE_RULES)
    }

    /// The role every document's top-level value plays. It doubles as the
    /// first segment of every problem path.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub(crate) fn finder(&self) -> &RoleFinder {
        &self.rules.finder
    }

    pub(crate) fn constraints(&self, role: &str) -> &[Constraint] {
        self.rules.constraints.get(role)
    }

    pub(crate) fn allowed(&self) -> &AllowedFields {
        &self.rules.allowed
    }
}

struct Parser {
    root: String,
    roles: Vec<String>,
    grammar: Grammar,
    assigner: Assigner,
}

impl Parser {
    fn new(root: String) -> Result<Parser, RuleError> {
        let roles = vec![root.clone()];
        let grammar = Grammar::new(&roles)?;

        Ok(Parser {
            root,
            roles,
            grammar,
            assigner: Assigner::default(),
        })
    }

    fn proc_line(&mut self, line: &str, number: usize) -> Result<(), RuleError> {
        trace!(line = number, text = line, "compiling");

        match self.grammar.parse(line) {
            Some(Sentence::Constraint(sentence)) => {
                for role in self.assigner.assign_constraints(sentence, number)? {
                    self.add_role(role)?;
                }
            }
            Some(Sentence::OnlyOneOf { role, fields }) => {
                self.assigner.assign_only_one_of(&role, fields);
            }
            Some(Sentence::EachOf { roles, trailer }) => {
                for role in roles {
                    self.proc_line(&format!("A {} {}", role, trailer), number)?;
                }
            }
            Some(Sentence::RoleDef(definition)) => {
                let role = self.assigner.assign_role(definition);
                self.add_role(role)?;
            }
            None => {
                return Err(RuleError::UnrecognizedLine {
                    line: number,
                    text: line.to_owned(),
                })
            }
        }

        Ok(())
    }

    fn add_role(&mut self, role: String) -> Result<(), RuleError> {
        if self.roles.contains(&role) {
            return Ok(());
        }

        trace!(%role, "new role");
        self.roles.push(role);
        self.grammar = Grammar::new(&self.roles)?;
        Ok(())
    }
}
