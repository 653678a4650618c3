//! Literal tokens in rule sentences.

use crate::node::{Node, ValueType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^"(.*)"$"#).expect("unreachable: literal grammar is invalid"));
static INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]+$").expect("unreachable: literal grammar is invalid"));
static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]+\.[0-9]+$").expect("unreachable: literal grammar is invalid"));

/// A typed value written literally in a rule file.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Bool(bool),
    Null,
    Integer(i64),
    Float(f64),
}

impl Literal {
    /// The numeric value of this literal, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Literal::Integer(i) => Some(i as f64),
            Literal::Float(f) => Some(f),
            _ => None,
        }
    }

    /// Does `node` hold this value? Numbers compare by value, so `3` matches
    /// both `3` and `3.0`.
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Literal::String(s) => node.is(ValueType::String) && node.to_str() == s.as_str(),
            Literal::Bool(b) => node.is(ValueType::Bool) && node.to_bool() == *b,
            Literal::Null => node.is_null(),
            Literal::Integer(_) | Literal::Float(_) => {
                node.is(ValueType::Numeric) && Some(node.to_f64()) == self.as_f64()
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "\"{}\"", s),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Null => f.write_str("null"),
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Float(x) if x.fract() == 0.0 => write!(f, "{}.0", x),
            Literal::Float(x) => write!(f, "{}", x),
        }
    }
}

/// Turns a literal token into a typed value.
///
/// Quoted tokens lose their quotes and stay strings; `true`, `false` and
/// `null` are what they look like; digit strings become integers, and digit
/// strings with a fractional part become floats. Anything else is kept as a
/// bare string.
pub fn deduce_value(token: &str) -> Literal {
    if let Some(captures) = QUOTED.captures(token) {
        return Literal::String(captures[1].to_owned());
    }

    match token {
        "true" => return Literal::Bool(true),
        "false" => return Literal::Bool(false),
        "null" => return Literal::Null,
        _ => {}
    }

    if INTEGER.is_match(token) {
        if let Ok(i) = token.parse::<i64>() {
            return Literal::Integer(i);
        }
        if let Ok(f) = token.parse::<f64>() {
            return Literal::Float(f);
        }
    }

    if DECIMAL.is_match(token) {
        if let Ok(f) = token.parse::<f64>() {
            return Literal::Float(f);
        }
    }

    Literal::String(token.to_owned())
}
