// used for persistence
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

// used for the untyped (JSON) entry point and the wire form
use serde::{Deserialize, Serialize};

// used to print out readable forms of a value
use std::fmt;

use crate::error::{EavError, Result};

/// A scalar attribute value. Composite values have no representation here,
/// which is what keeps every stored attribute a valid scalar kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

// ------------- Kinds --------------
// Persisted next to each value so that a read restores the exact kind.
pub const NULL: i64 = 0;
pub const BOOLEAN: i64 = 1;
pub const INTEGER: i64 = 2;
pub const FLOAT: i64 = 3;
pub const STRING: i64 = 4;

impl Value {
    pub fn kind(&self) -> i64 {
        match self {
            Value::Null => NULL,
            Value::Boolean(_) => BOOLEAN,
            Value::Integer(_) => INTEGER,
            Value::Float(_) => FLOAT,
            Value::String(_) => STRING,
        }
    }
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
        }
    }
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
    /// Strict identity: same kind and same value. Floats compare bit for bit,
    /// so `0.0` and `-0.0` differ and `NaN` matches itself.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
    /// Rebuilds a value from its stored kind and what the engine handed back.
    pub fn restore(kind: i64, stored: Value) -> Result<Value> {
        match (kind, stored) {
            (NULL, Value::Null) => Ok(Value::Null),
            (BOOLEAN, Value::Integer(i)) => Ok(Value::Boolean(i != 0)),
            (BOOLEAN, Value::Boolean(b)) => Ok(Value::Boolean(b)),
            (INTEGER, Value::Integer(i)) => Ok(Value::Integer(i)),
            (FLOAT, Value::Float(f)) => Ok(Value::Float(f)),
            (FLOAT, Value::Integer(i)) => Ok(Value::Float(i as f64)),
            (STRING, Value::String(s)) => Ok(Value::String(s)),
            (kind, stored) => Err(EavError::DataCorruption {
                message: format!(
                    "stored {} value does not match kind {}",
                    stored.kind_name(),
                    kind
                ),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

// ------------- Conversions --------------
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}
impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}
impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Self {
        o.map_or(Value::Null, Into::into)
    }
}

// Untyped input is where an invalid kind can still show up.
impl TryFrom<serde_json::Value> for Value {
    type Error = EavError;
    fn try_from(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Boolean(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Integer(i)),
                None => n
                    .as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| EavError::Type(format!("Invalid attribute type: number {}", n))),
            },
            serde_json::Value::String(s) => Ok(Value::String(s)),
            serde_json::Value::Array(_) => {
                Err(EavError::Type("Invalid attribute type: array".into()))
            }
            serde_json::Value::Object(_) => {
                Err(EavError::Type("Invalid attribute type: object".into()))
            }
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::from(rusqlite::types::Null),
            Value::Boolean(b) => ToSqlOutput::from(*b),
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Float(x) => ToSqlOutput::from(*x),
            Value::String(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}
impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Value::Null),
            ValueRef::Integer(i) => Ok(Value::Integer(i)),
            ValueRef::Real(x) => Ok(Value::Float(x)),
            ValueRef::Text(_) => value.as_str().map(|s| Value::String(s.to_owned())),
            ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
        }
    }
}
