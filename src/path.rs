//! JSONPath grammars.
//!
//! Two dialects are recognized. A general *path* allows wildcards, recursive
//! descent, slices and index lists. A *reference path* is the strict subset
//! the States Language uses to point at a single node: every step is a dotted
//! or bracketed name, optionally followed by one non-negative index.
//!
//! Names follow the Unicode identifier rules: the first character is a letter
//! or letter-number, later characters may also be combining marks, decimal
//! digits or connector punctuation.

use once_cell::sync::Lazy;
use regex::Regex;

const INITIAL_NAME_CLASSES: &[&str] = &["Lu", "Ll", "Lt", "Lm", "Lo", "Nl"];
const FOLLOWING_NAME_CLASSES: &[&str] = &[
    "Lu", "Ll", "Lt", "Lm", "Lo", "Nl", "Mn", "Mc", "Nd", "Pc",
];

const DOT_SEPARATOR: &str = r"\.\.?";
const REFERENCE_INDEX: &str = r"\[[0-9]+\]";
const NUMERIC_INDEX: &str = r"\[[0-9]+(, *[0-9]+)*\]";
const STAR_INDEX: &str = r"\[\*\]";
const SLICE_INDEX: &str = r"\[(-?[0-9]+)?:(-?[0-9]+)?\]";

static PATH: Lazy<Regex> = Lazy::new(|| {
    let name = name_pattern();
    let dot_step = format!(r"{}(({})|(\*))", DOT_SEPARATOR, name);
    let bracket_step = format!(r"\['{}'\]", name);
    let index = format!("(({})|({})|({}))", NUMERIC_INDEX, STAR_INDEX, SLICE_INDEX);
    let step = format!(
        "(({})|({})|({}))({})?",
        dot_step, bracket_step, index, index
    );

    Regex::new(&format!(r"^\$({})*$", step)).expect("unreachable: path grammar is invalid")
});

static REFERENCE_PATH: Lazy<Regex> = Lazy::new(|| {
    let name = name_pattern();
    let dot_step = format!("{}{}", DOT_SEPARATOR, name);
    let bracket_step = format!(r"\['{}'\]", name);
    let step = format!("(({})|({}))({})?", dot_step, bracket_step, REFERENCE_INDEX);

    Regex::new(&format!(r"^\$({})*$", step))
        .expect("unreachable: reference path grammar is invalid")
});

static INTRINSIC_INVOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^States\.(JsonToString|Format|StringToJson|Array)\(.+\)$")
        .expect("unreachable: intrinsic grammar is invalid")
});

fn classes_pattern(classes: &[&str]) -> String {
    let inner: String = classes.iter().map(|c| format!(r"\p{{{}}}", c)).collect();
    format!("[{}]", inner)
}

fn name_pattern() -> String {
    format!(
        "{}{}*",
        classes_pattern(INITIAL_NAME_CLASSES),
        classes_pattern(FOLLOWING_NAME_CLASSES)
    )
}

/// Is `path` a syntactically valid JSONPath?
pub fn is_path(path: &str) -> bool {
    PATH.is_match(path)
}

/// Is `path` a syntactically valid reference path?
pub fn is_reference_path(path: &str) -> bool {
    REFERENCE_PATH.is_match(path)
}

/// Is `value` a call to one of the `States.*` intrinsic functions?
pub fn is_intrinsic_invocation(value: &str) -> bool {
    INTRINSIC_INVOCATION.is_match(value)
}

/// Checks a path as it may appear in a payload template or an input/output
/// filter.
///
/// A leading `$$` addresses the context object; after dropping one `$` the
/// rest is checked as a general path. Anything else must be a reference path.
pub fn is_payload_path(value: &str) -> bool {
    if value.starts_with("$$") {
        is_path(&value[1..])
    } else {
        is_reference_path(value)
    }
}
