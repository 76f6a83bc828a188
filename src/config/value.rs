//! Instance parameter values.
//!
//! Parameters are arbitrary YAML-shaped data. They are kept as a tagged
//! union so required-parameter checks never depend on a concrete type;
//! providers convert the parameters they declare with the `as_*` helpers.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_yaml::Value;
use std::fmt;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<ParamValue>),
    Map(ParamMap),
}

impl ParamValue {
    /// Convert a parsed YAML node. `context` names the node in error messages.
    pub fn from_yaml(value: &Value, context: &str) -> Result<Self, String> {
        match value {
            Value::Null => Ok(ParamValue::Null),
            Value::Bool(b) => Ok(ParamValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(ParamValue::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(ParamValue::Float(f))
                } else {
                    Err(format!("{}: unsupported number {}", context, n))
                }
            }
            Value::String(s) => Ok(ParamValue::String(s.clone())),
            Value::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| ParamValue::from_yaml(item, &format!("{}[{}]", context, i)))
                .collect::<Result<Vec<_>, _>>()
                .map(ParamValue::List),
            Value::Mapping(_) => ParamMap::from_yaml(value, context).map(ParamValue::Map),
            Value::Tagged(tagged) => ParamValue::from_yaml(&tagged.value, context),
        }
    }

    /// Integer view. Strings holding a decimal or `0x` hex literal are accepted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(i) => Some(*i),
            ParamValue::String(s) => parse_integer(s.trim()),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_i64().and_then(|i| u64::try_from(i).ok())
    }

    /// Boolean view. Integers 0 and 1 are accepted.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            ParamValue::Integer(0) => Some(false),
            ParamValue::Integer(1) => Some(true),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ParamValue]> {
        match self {
            ParamValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Short type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Null => "null",
            ParamValue::Bool(_) => "bool",
            ParamValue::Integer(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::String(_) => "string",
            ParamValue::List(_) => "list",
            ParamValue::Map(_) => "mapping",
        }
    }
}

fn parse_integer(s: &str) -> Option<i64> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => write!(f, "null"),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Integer(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::String(s) => write!(f, "{}", s),
            ParamValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            ParamValue::Map(map) => write!(f, "{}", map),
        }
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParamValue::Null => serializer.serialize_unit(),
            ParamValue::Bool(b) => serializer.serialize_bool(*b),
            ParamValue::Integer(i) => serializer.serialize_i64(*i),
            ParamValue::Float(x) => serializer.serialize_f64(*x),
            ParamValue::String(s) => serializer.serialize_str(s),
            ParamValue::List(items) => items.serialize(serializer),
            ParamValue::Map(map) => map.serialize(serializer),
        }
    }
}

/// Ordered parameter mapping. Keys keep their declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamMap {
    entries: Vec<(String, ParamValue)>,
}

impl ParamMap {
    pub fn new() -> Self {
        ParamMap::default()
    }

    /// Convert a YAML mapping. Scalar keys are stringified; null is an empty map.
    pub fn from_yaml(value: &Value, context: &str) -> Result<Self, String> {
        let mapping = match value {
            Value::Null => return Ok(ParamMap::new()),
            Value::Mapping(mapping) => mapping,
            Value::Tagged(tagged) => return ParamMap::from_yaml(&tagged.value, context),
            other => {
                return Err(format!(
                    "{}: expected a mapping, found {}",
                    context,
                    yaml_type_name(other)
                ))
            }
        };

        let mut map = ParamMap::new();
        for (key, item) in mapping {
            let key = yaml_key(key).ok_or_else(|| format!("{}: keys must be scalars", context))?;
            if map.contains_key(&key) {
                return Err(format!("{}: duplicate key '{}'", context, key));
            }
            let value = ParamValue::from_yaml(item, &format!("{}.{}", context, key))?;
            map.insert(key, value);
        }
        Ok(map)
    }

    /// Insert or replace, keeping the original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, ParamValue)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        let mut map = ParamMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl fmt::Display for ParamMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", k, v)?;
        }
        write!(f, "}}")
    }
}

impl Serialize for ParamMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Stringify a scalar YAML key.
pub(crate) fn yaml_key(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn yaml_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
