/// Parameter Module
///
/// Parameter collections for ad-hoc calls and statement execution, the
/// placeholder addressing used by drivers, and the shared slots behind
/// bind-by-reference.
use crate::core::db::value::{ParamType, Value};
use std::sync::{Arc, Mutex};

/// Where a bound value goes: a 1-based position or a named placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Index(usize),
    Name(String),
}

impl Placeholder {
    /// Named placeholders are stored with their sigil; a bare `id` becomes `:id`.
    pub fn named(name: &str) -> Self {
        if name.starts_with([':', '@', '$']) {
            Placeholder::Name(name.to_string())
        } else {
            Placeholder::Name(format!(":{}", name))
        }
    }
}

impl From<usize> for Placeholder {
    fn from(index: usize) -> Self {
        Placeholder::Index(index)
    }
}

/// Negative positions map to 0, which no driver accepts.
impl From<i32> for Placeholder {
    fn from(index: i32) -> Self {
        Placeholder::Index(usize::try_from(index).unwrap_or(0))
    }
}

impl From<&str> for Placeholder {
    fn from(name: &str) -> Self {
        Placeholder::named(name)
    }
}

impl From<String> for Placeholder {
    fn from(name: String) -> Self {
        Placeholder::named(&name)
    }
}

/// One resolved binding handed to the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub placeholder: Placeholder,
    pub value: Value,
    pub ty: ParamType,
    /// Maximum length for string and blob values
    pub length: Option<usize>,
}

impl Binding {
    /// Binding whose type is inferred from the value.
    pub fn inferred(placeholder: Placeholder, value: Value) -> Self {
        let ty = ParamType::infer(&value);
        Binding {
            placeholder,
            value,
            ty,
            length: None,
        }
    }

    /// The value converted to the bind type and cut to `length`.
    pub fn resolved_value(&self) -> Value {
        match (self.ty.coerce(self.value.clone()), self.length) {
            (Value::Text(s), Some(max)) => Value::Text(s.chars().take(max).collect()),
            (Value::Blob(mut b), Some(max)) => {
                b.truncate(max);
                Value::Blob(b)
            }
            (other, _) => other,
        }
    }
}

/// Parameters for a query, an execute call or a statement execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    Positional(Vec<Value>),
    Named(Vec<(String, Value)>),
}

impl Default for Params {
    fn default() -> Self {
        Params::Positional(Vec::new())
    }
}

impl Params {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(pairs) => pairs.len(),
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Params::Named(_))
    }

    /// Builds parameters from loosely typed JSON.
    ///
    /// An array whose first element is an object is a list of named
    /// bindings (all objects are merged in order); any other array is
    /// positional. A bare object is named, `null` is empty and any other
    /// scalar becomes a single positional value.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Params::default(),
            serde_json::Value::Array(items) => {
                if matches!(items.first(), Some(serde_json::Value::Object(_))) {
                    let pairs = items
                        .into_iter()
                        .flat_map(|item| match item {
                            serde_json::Value::Object(map) => map.into_iter().collect::<Vec<_>>(),
                            _ => Vec::new(),
                        })
                        .map(|(name, value)| (name, Value::from_json(value)))
                        .collect();
                    Params::Named(pairs)
                } else {
                    Params::Positional(items.into_iter().map(Value::from_json).collect())
                }
            }
            serde_json::Value::Object(map) => Params::Named(
                map.into_iter()
                    .map(|(name, value)| (name, Value::from_json(value)))
                    .collect(),
            ),
            scalar => Params::Positional(vec![Value::from_json(scalar)]),
        }
    }

    /// Resolves the parameters into bindings with inferred types.
    pub fn into_bindings(self) -> Vec<Binding> {
        match self {
            Params::Positional(values) => values
                .into_iter()
                .enumerate()
                .map(|(i, value)| Binding::inferred(Placeholder::Index(i + 1), value))
                .collect(),
            Params::Named(pairs) => pairs
                .into_iter()
                .map(|(name, value)| Binding::inferred(Placeholder::named(&name), value))
                .collect(),
        }
    }
}

impl From<()> for Params {
    fn from(_: ()) -> Self {
        Params::default()
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::Positional(values)
    }
}

impl From<Vec<(String, Value)>> for Params {
    fn from(pairs: Vec<(String, Value)>) -> Self {
        Params::Named(pairs)
    }
}

impl From<Vec<(&str, Value)>> for Params {
    fn from(pairs: Vec<(&str, Value)>) -> Self {
        Params::Named(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

impl From<serde_json::Value> for Params {
    fn from(json: serde_json::Value) -> Self {
        Params::from_json(json)
    }
}

/// A single scalar is a one-element positional list.
macro_rules! impl_scalar_params {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Params {
                fn from(value: $t) -> Self {
                    Params::Positional(vec![Value::from(value)])
                }
            }
        )*
    };
}

impl_scalar_params!(Value, bool, i32, i64, u32, f64, &str, String);

/// Positional parameters: `params![5, "name"]`.
#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::default()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Params::Positional(vec![$($crate::Value::from($value)),+])
    };
}

/// Named parameters: `named_params! { "id" => 5, ":name" => "x" }`.
#[macro_export]
macro_rules! named_params {
    ($($name:expr => $value:expr),* $(,)?) => {
        $crate::Params::Named(vec![$((String::from($name), $crate::Value::from($value))),*])
    };
}

/// A shared parameter cell for bind-by-reference.
///
/// Cloning a slot shares the cell. The accessor reads the current value when
/// the statement executes, not when it is bound.
#[derive(Debug, Clone, Default)]
pub struct ParamSlot(Arc<Mutex<Value>>);

impl ParamSlot {
    pub fn new(value: impl Into<Value>) -> Self {
        ParamSlot(Arc::new(Mutex::new(value.into())))
    }

    pub fn set(&self, value: impl Into<Value>) {
        let mut guard = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = value.into();
    }

    pub fn get(&self) -> Value {
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
