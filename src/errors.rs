//! An error type for rule files that fail to compile.

use failure::Fail;

/// Why a rule file could not be compiled into a
/// [`RuleSet`](../schema/struct.RuleSet.html).
///
/// Line numbers are 1-based. Problems found in *documents* are not errors;
/// they are the successful output of validation (see
/// [`Problem`](../problem/struct.Problem.html)).
#[derive(Debug, Fail, PartialEq, Clone, Eq, Hash)]
pub enum RuleError {
    /// A sentence appeared before the root declaration, or the file has no
    /// root declaration at all (reported as line 0).
    ///
    /// Every rule file must open with a line of the form `This document
    /// specifies a JSON object called a "Root Role".`
    #[fail(display = "line {}: rule file does not start with a root declaration", line)]
    MissingRoot { line: usize },

    /// A second root declaration appeared.
    #[fail(display = "line {}: only one root declaration is allowed", line)]
    DuplicateRoot { line: usize },

    /// A line matched no sentence form.
    ///
    /// This includes lines that begin like a sentence form but do not finish
    /// like it, and sentences that mention a role nothing has introduced yet.
    #[fail(display = "line {}: unrecognized rule: {}", line, text)]
    UnrecognizedLine { line: usize, text: String },

    /// A relational predicate compared against something that is not a
    /// number, e.g. `whose value MUST be less than "ten"`.
    #[fail(display = "line {}: relation target is not a number: {}", line, target)]
    NonNumericTarget { line: usize, target: String },

    /// The sentence patterns built from the known roles did not compile.
    #[fail(display = "sentence grammar failed to compile: {}", message)]
    Grammar { message: String },
}

impl From<regex::Error> for RuleError {
    fn from(err: regex::Error) -> RuleError {
        RuleError::Grammar {
            message: err.to_string(),
        }
    }
}
