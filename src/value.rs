use serde::Serialize;
use std::fmt;

/// A single test argument. Arrays are opaque elements of the enclosing tuple.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Array(Vec<Value>),
}

/// The ordered arguments for one invocation of a test method.
pub type ArgumentTuple = Vec<Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueType {
    Object,
    Bool,
    Char,
    I32,
    I64,
    F32,
    F64,
    String,
    Array,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Object => "Value",
            ValueType::Bool => "bool",
            ValueType::Char => "char",
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::String => "String",
            ValueType::Array => "Vec<Value>",
        }
    }

    /// `Object` accepts every type; all other types only accept themselves.
    pub fn is_assignable_from(&self, other: ValueType) -> bool {
        *self == ValueType::Object || *self == other
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueType::Bool),
            Value::Char(_) => Some(ValueType::Char),
            Value::I32(_) => Some(ValueType::I32),
            Value::I64(_) => Some(ValueType::I64),
            Value::F32(_) => Some(ValueType::F32),
            Value::F64(_) => Some(ValueType::F64),
            Value::Str(_) => Some(ValueType::String),
            Value::Array(_) => Some(ValueType::Array),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Run-time type name. Arrays report `Vec<T>` for their common element
    /// type, or `Vec<Value>` when empty or mixed.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Array(items) => {
                let mut element: Option<String> = None;
                for item in items.iter().filter(|item| !item.is_null()) {
                    let name = item.type_name();
                    match &element {
                        None => element = Some(name),
                        Some(existing) if *existing == name => {}
                        Some(_) => return "Vec<Value>".to_string(),
                    }
                }
                format!("Vec<{}>", element.as_deref().unwrap_or("Value"))
            }
            other => other
                .value_type()
                .map(|t| t.name().to_string())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{}", c),
            Value::I32(n) => write!(f, "{}", n),
            Value::I64(n) => write!(f, "{}", n),
            Value::F32(n) => write!(f, "{}", n),
            Value::F64(n) => write!(f, "{}", n),
            Value::Str(s) => f.write_str(s),
            Value::Array(_) => f.write_str(&self.type_name()),
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    char => Char,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => Str,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(items: [T; N]) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

/// Rust types with a corresponding [`ValueType`], used by the generic type
/// assertions. [`Value`] itself maps to `Object`.
pub trait Typed {
    const VALUE_TYPE: ValueType;
}

macro_rules! impl_typed {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Typed for $ty {
                const VALUE_TYPE: ValueType = ValueType::$variant;
            }
        )*
    };
}

impl_typed! {
    Value => Object,
    bool => Bool,
    char => Char,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => String,
}

/// Builds an [`ArgumentTuple`] from anything convertible into [`Value`].
#[macro_export]
macro_rules! values {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}
