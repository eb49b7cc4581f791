/// Value Module
///
/// Dynamically typed SQL values and the bind types used when handing them to
/// a driver. `ParamType` replaces the driver's integer bind-type constants.
use serde::Serialize;
use std::fmt;

/// A single SQL value, either a bound parameter or a fetched column.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts a JSON value. Arrays and objects are kept as their JSON text.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map(Value::Real).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Text(other.to_string()),
        }
    }

    /// Integer conversion with loose string semantics: leading numeric text is
    /// parsed, anything unparseable becomes 0.
    fn to_integer(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Bool(b) => *b as i64,
            Value::Integer(i) => *i,
            Value::Real(f) => f.trunc() as i64,
            Value::Text(s) => parse_leading_integer(s),
            Value::Blob(b) => parse_leading_integer(&String::from_utf8_lossy(b)),
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Real(f) => *f != 0.0,
            Value::Text(s) => !(s.is_empty() || s == "0"),
            Value::Blob(b) => !b.is_empty(),
        }
    }
}

fn parse_leading_integer(text: &str) -> i64 {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return i;
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return f.trunc() as i64;
    }
    let end = trimmed
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    trimmed[..end].parse().unwrap_or(0)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(true) => write!(f, "1"),
            Value::Bool(false) => Ok(()),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "{}", s),
            Value::Blob(b) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Blob(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

/// The type a parameter is bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Bool,
    Int,
    Null,
    Str,
    Lob,
}

impl ParamType {
    /// Best-effort bind type for a value.
    ///
    /// Booleans, integers and nulls map to their own type; everything else,
    /// floats and blobs included, is bound as a string.
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Bool(_) => ParamType::Bool,
            Value::Integer(_) => ParamType::Int,
            Value::Null => ParamType::Null,
            _ => ParamType::Str,
        }
    }

    /// Converts `value` into the representation this bind type sends to the
    /// driver. SQL NULL stays NULL for every type.
    pub fn coerce(self, value: Value) -> Value {
        if value.is_null() {
            return Value::Null;
        }
        match self {
            ParamType::Null => Value::Null,
            ParamType::Bool => Value::Bool(value.truthy()),
            ParamType::Int => Value::Integer(value.to_integer()),
            ParamType::Str => match value {
                Value::Text(s) => Value::Text(s),
                // Bytes go out unchanged; a string bind carries arbitrary octets
                Value::Blob(b) => Value::Blob(b),
                other => Value::Text(other.to_string()),
            },
            ParamType::Lob => match value {
                Value::Blob(b) => Value::Blob(b),
                Value::Text(s) => Value::Blob(s.into_bytes()),
                other => Value::Blob(other.to_string().into_bytes()),
            },
        }
    }
}
