//! Typed views over decoded JSON values.
//!
//! A [`Node`](struct.Node.html) classifies the value it wraps once, at
//! construction, into a set of [`ValueType`](enum.ValueType.html)s. That set
//! is the only legal basis for interpreting the value: every `to_*` accessor
//! asserts membership first, and asking for an interpretation the node does
//! not have is a bug in the caller, not a validation problem.
//!
//! The validator only needs the type set and a few structural accessors. The
//! rest of the typed accessors serve callers reading a document that has
//! already validated clean, where the rules guarantee the shape.

use crate::path;
use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

static URI_SCHEME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("unreachable: URI grammar is invalid")
});

/// The semantic types a node can carry.
///
/// A node may carry several at once: every number is `Numeric` and `Float`,
/// integral ones are also `Integer`; a string may additionally be a
/// `JSONPath`, a `ReferencePath`, a `Timestamp` and a `URI`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueType {
    Object,
    Array,
    String,
    Integer,
    Float,
    Bool,
    Numeric,
    JsonPath,
    ReferencePath,
    Timestamp,
    Uri,
}

impl ValueType {
    /// The base type tokens a rule file may name, in the order the grammar
    /// offers them.
    pub const ALL: [ValueType; 11] = [
        ValueType::Object,
        ValueType::Array,
        ValueType::String,
        ValueType::Integer,
        ValueType::Float,
        ValueType::Bool,
        ValueType::Numeric,
        ValueType::JsonPath,
        ValueType::ReferencePath,
        ValueType::Timestamp,
        ValueType::Uri,
    ];

    /// The token used for this type in rule files and problem messages.
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Object => "object",
            ValueType::Array => "array",
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Bool => "boolean",
            ValueType::Numeric => "numeric",
            ValueType::JsonPath => "JSONPath",
            ValueType::ReferencePath => "referencePath",
            ValueType::Timestamp => "timestamp",
            ValueType::Uri => "URI",
        }
    }

    /// Inverse of [`name`](#method.name).
    pub fn from_name(name: &str) -> Option<ValueType> {
        ValueType::ALL.iter().copied().find(|t| t.name() == name)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An immutable, classified view of one JSON value.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    value: &'a Value,
    types: BTreeSet<ValueType>,
}

impl<'a> Node<'a> {
    pub fn new(value: &'a Value) -> Node<'a> {
        Node {
            value,
            types: classify(value),
        }
    }

    /// The wrapped value.
    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn types(&self) -> &BTreeSet<ValueType> {
        &self.types
    }

    pub fn is(&self, value_type: ValueType) -> bool {
        self.types.contains(&value_type)
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Renders the type set the way problem messages show it, e.g.
    /// `[string, JSONPath, referencePath]`.
    pub fn describe_types(&self) -> String {
        let names: Vec<&str> = self.types.iter().map(|t| t.name()).collect();
        format!("[{}]", names.join(", "))
    }

    pub fn to_str(&self) -> &'a str {
        self.require(ValueType::String);
        self.value
            .as_str()
            .expect("unreachable: string node without a string value")
    }

    pub fn to_f64(&self) -> f64 {
        self.require(ValueType::Numeric);
        self.value
            .as_f64()
            .expect("unreachable: numeric node without a numeric value")
    }

    /// The integral value of a number, including integral floats like `3.0`.
    pub fn to_i64(&self) -> i64 {
        self.require(ValueType::Integer);
        match self.value.as_i64() {
            Some(i) => i,
            None => self.to_f64() as i64,
        }
    }

    pub fn to_bool(&self) -> bool {
        self.require(ValueType::Bool);
        self.value
            .as_bool()
            .expect("unreachable: boolean node without a boolean value")
    }

    /// The instant an RFC 3339 string denotes, keeping its offset.
    pub fn to_timestamp(&self) -> DateTime<FixedOffset> {
        self.require(ValueType::Timestamp);
        DateTime::parse_from_rfc3339(self.to_str())
            .expect("unreachable: timestamp node that does not parse")
    }

    /// Does this node have a field named `name`? Always false for
    /// non-objects.
    pub fn has_field(&self, name: &str) -> bool {
        self.value
            .as_object()
            .map(|obj| obj.contains_key(name))
            .unwrap_or(false)
    }

    /// The value of field `name`. The node must be an object carrying that
    /// field.
    pub fn field(&self, name: &str) -> Node<'a> {
        self.require(ValueType::Object);
        match self.value.get(name) {
            Some(value) => Node::new(value),
            None => panic!("unreachable: node has no field named {:?}", name),
        }
    }

    /// The field of `name`, if this node is an object which has it.
    pub fn get(&self, name: &str) -> Option<Node<'a>> {
        self.value
            .as_object()
            .and_then(|obj| obj.get(name))
            .map(Node::new)
    }

    /// Field names in document order. The node must be an object.
    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.require(ValueType::Object);
        self.value
            .as_object()
            .expect("unreachable: object node without an object value")
            .keys()
            .map(String::as_str)
    }

    /// Field name/value pairs in document order. The node must be an object.
    pub fn fields(&self) -> impl Iterator<Item = (&'a str, Node<'a>)> {
        self.require(ValueType::Object);
        self.value
            .as_object()
            .expect("unreachable: object node without an object value")
            .iter()
            .map(|(k, v)| (k.as_str(), Node::new(v)))
    }

    /// Array elements in order. The node must be an array.
    pub fn elements(&self) -> impl Iterator<Item = Node<'a>> {
        self.require(ValueType::Array);
        self.value
            .as_array()
            .expect("unreachable: array node without an array value")
            .iter()
            .map(Node::new)
    }

    pub fn len(&self) -> usize {
        match self.value {
            Value::Array(elements) => elements.len(),
            Value::Object(fields) => fields.len(),
            _ => panic!("unreachable: length of a node that is not a container"),
        }
    }

    fn require(&self, value_type: ValueType) {
        assert!(
            self.is(value_type),
            "unreachable: node typed {} read as {}",
            self.describe_types(),
            value_type
        );
    }
}

fn classify(value: &Value) -> BTreeSet<ValueType> {
    let mut types = BTreeSet::new();

    match value {
        Value::Object(_) => {
            types.insert(ValueType::Object);
        }
        Value::Array(_) => {
            types.insert(ValueType::Array);
        }
        Value::String(s) => {
            types.insert(ValueType::String);
            if path::is_path(s) {
                types.insert(ValueType::JsonPath);
            }
            if path::is_reference_path(s) {
                types.insert(ValueType::ReferencePath);
            }
            if DateTime::parse_from_rfc3339(s).is_ok() {
                types.insert(ValueType::Timestamp);
            }
            if URI_SCHEME.is_match(s) {
                types.insert(ValueType::Uri);
            }
        }
        Value::Number(n) => {
            types.insert(ValueType::Numeric);
            types.insert(ValueType::Float);
            let integral = n.is_i64()
                || n.is_u64()
                || n.as_f64().map(|f| f.fract() == 0.0).unwrap_or(false);
            if integral {
                types.insert(ValueType::Integer);
            }
        }
        Value::Bool(_) => {
            types.insert(ValueType::Bool);
        }
        Value::Null => {}
    }

    types
}
