use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// A single value inside an effective-settings document.
///
/// This is the statically typed form of an arbitrary JSON value. Every
/// traversal in [`crate::path`] matches on it exhaustively, so there is no
/// runtime guessing about whether a node can be descended into: only
/// [`SettingValue::Object`] can.
///
/// Objects use `IndexMap` so key order survives a round trip through the
/// cache, which keeps rendered output and equality checks predictable.
///
/// # Example
///
/// ```
/// use settings_core::SettingValue;
///
/// let theme: SettingValue = "dark".into();
/// assert_eq!(theme.as_str(), Some("dark"));
///
/// let levels: SettingValue = vec![1, 2, 3].into();
/// assert!(levels.as_array().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// An explicit `null`, distinct from an absent key.
    Null,
    Bool(bool),
    Integer(i64),
    /// Any JSON number that is not an `i64`. `OrderedFloat` gives `Eq`, so
    /// whole documents can be compared.
    Float(OrderedFloat<f64>),
    String(String),
    /// Arrays are leaves for dot-paths: `set` replaces them, it never
    /// descends into them.
    Array(Vec<SettingValue>),
    /// A section; the only node a dot-path can walk through.
    Object(IndexMap<String, SettingValue>),
}

impl SettingValue {
    /// A fresh section with no keys, as created for missing intermediates.
    pub fn empty_object() -> Self {
        Self::Object(IndexMap::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true if the value can be descended into by a dot-path.
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(flag) => Some(flag),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float(n) => Some(n.into_inner()),
            Self::Integer(n) => Some(n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[SettingValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the keys of a section.
    pub fn as_object(&self) -> Option<&IndexMap<String, SettingValue>> {
        match self {
            Self::Object(section) => Some(section),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, SettingValue>> {
        match self {
            Self::Object(section) => Some(section),
            _ => None,
        }
    }

    /// Short name of the variant, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Parses a value from a command-line style literal.
    ///
    /// Valid JSON is taken as-is (`true`, `42`, `{"a":1}`); anything else is
    /// treated as a bare string, so `dark` and `"dark"` both yield a string.
    pub fn from_literal(literal: &str) -> Self {
        serde_json::from_str(literal).unwrap_or_else(|_| Self::String(literal.to_string()))
    }
}

macro_rules! setting_value_from {
    ($($source:ty => |$v:ident| $build:expr),+ $(,)?) => {
        $(
            impl From<$source> for SettingValue {
                fn from($v: $source) -> Self {
                    $build
                }
            }
        )+
    };
}

setting_value_from! {
    bool => |flag| Self::Bool(flag),
    i32 => |n| Self::Integer(i64::from(n)),
    i64 => |n| Self::Integer(n),
    f64 => |n| Self::Float(OrderedFloat(n)),
    String => |text| Self::String(text),
    &str => |text| Self::String(text.to_owned()),
    IndexMap<String, SettingValue> => |section| Self::Object(section),
}

/// A list setting, e.g. `vec!["email", "sms"]`.
impl<T: Into<SettingValue>> From<Vec<T>> for SettingValue {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}
