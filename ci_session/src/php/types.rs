use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use super::errors::PhpError;

/// A value in PHP's serialization format.
///
/// Only the types that can appear in a CodeIgniter session without object
/// support are represented. Accessors return [`PhpError::TypeMismatch`]
/// instead of coercing the way PHP would.
#[derive(Debug, Clone, PartialEq)]
pub enum PhpValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(PhpArray),
}

impl PhpValue {
    /// Name of the PHP type, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PhpValue::Null => "null",
            PhpValue::Bool(_) => "bool",
            PhpValue::Int(_) => "int",
            PhpValue::Float(_) => "float",
            PhpValue::String(_) => "string",
            PhpValue::Array(_) => "array",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PhpValue::Null)
    }

    pub fn as_str(&self) -> Result<&str, PhpError> {
        match self {
            PhpValue::String(s) => Ok(s),
            other => Err(PhpError::mismatch("string", other)),
        }
    }

    pub fn as_int(&self) -> Result<i64, PhpError> {
        match self {
            PhpValue::Int(n) => Ok(*n),
            other => Err(PhpError::mismatch("int", other)),
        }
    }

    pub fn as_bool(&self) -> Result<bool, PhpError> {
        match self {
            PhpValue::Bool(b) => Ok(*b),
            other => Err(PhpError::mismatch("bool", other)),
        }
    }

    pub fn as_float(&self) -> Result<f64, PhpError> {
        match self {
            PhpValue::Float(f) => Ok(*f),
            other => Err(PhpError::mismatch("float", other)),
        }
    }

    pub fn as_array(&self) -> Result<&PhpArray, PhpError> {
        match self {
            PhpValue::Array(a) => Ok(a),
            other => Err(PhpError::mismatch("array", other)),
        }
    }

    pub fn into_string(self) -> Result<String, PhpError> {
        match self {
            PhpValue::String(s) => Ok(s),
            other => Err(PhpError::mismatch("string", &other)),
        }
    }

    pub fn into_array(self) -> Result<PhpArray, PhpError> {
        match self {
            PhpValue::Array(a) => Ok(a),
            other => Err(PhpError::mismatch("array", &other)),
        }
    }
}

impl From<&str> for PhpValue {
    fn from(value: &str) -> Self {
        PhpValue::String(value.to_string())
    }
}

impl From<String> for PhpValue {
    fn from(value: String) -> Self {
        PhpValue::String(value)
    }
}

impl From<i64> for PhpValue {
    fn from(value: i64) -> Self {
        PhpValue::Int(value)
    }
}

impl From<i32> for PhpValue {
    fn from(value: i32) -> Self {
        PhpValue::Int(value.into())
    }
}

impl From<bool> for PhpValue {
    fn from(value: bool) -> Self {
        PhpValue::Bool(value)
    }
}

impl From<f64> for PhpValue {
    fn from(value: f64) -> Self {
        PhpValue::Float(value)
    }
}

impl From<PhpArray> for PhpValue {
    fn from(value: PhpArray) -> Self {
        PhpValue::Array(value)
    }
}

impl<T: Into<PhpValue>> From<Option<T>> for PhpValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PhpValue::Null, Into::into)
    }
}

impl fmt::Display for PhpValue {
    /// Renders the value the way PHP's string cast would for scalars.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhpValue::Null => Ok(()),
            PhpValue::Bool(true) => f.write_str("1"),
            PhpValue::Bool(false) => Ok(()),
            PhpValue::Int(n) => write!(f, "{n}"),
            PhpValue::Float(x) => write!(f, "{x}"),
            PhpValue::String(s) => f.write_str(s),
            PhpValue::Array(_) => f.write_str("Array"),
        }
    }
}

impl Serialize for PhpValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PhpValue::Null => serializer.serialize_unit(),
            PhpValue::Bool(b) => serializer.serialize_bool(*b),
            PhpValue::Int(n) => serializer.serialize_i64(*n),
            PhpValue::Float(x) => serializer.serialize_f64(*x),
            PhpValue::String(s) => serializer.serialize_str(s),
            PhpValue::Array(a) => a.serialize(serializer),
        }
    }
}

/// Key of a PHP array entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PhpKey {
    Int(i64),
    Str(String),
}

impl PhpKey {
    fn matches_str(&self, key: &str) -> bool {
        matches!(self, PhpKey::Str(s) if s == key)
    }
}

impl From<&str> for PhpKey {
    fn from(value: &str) -> Self {
        PhpKey::Str(value.to_string())
    }
}

impl From<String> for PhpKey {
    fn from(value: String) -> Self {
        PhpKey::Str(value)
    }
}

impl From<i64> for PhpKey {
    fn from(value: i64) -> Self {
        PhpKey::Int(value)
    }
}

impl From<i32> for PhpKey {
    fn from(value: i32) -> Self {
        PhpKey::Int(value.into())
    }
}

impl fmt::Display for PhpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhpKey::Int(n) => write!(f, "{n}"),
            PhpKey::Str(s) => f.write_str(s),
        }
    }
}

/// An ordered PHP array.
///
/// PHP arrays keep insertion order, and the serialized form lists entries in
/// that order, so entries live in a `Vec` rather than a hash map. Overwriting
/// an existing key keeps its position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhpArray {
    entries: Vec<(PhpKey, PhpValue)>,
}

impl PhpArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &PhpKey) -> Option<&PhpValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Lookup by string key without allocating a [`PhpKey`].
    pub fn get_str(&self, key: &str) -> Option<&PhpValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.matches_str(key))
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &PhpKey) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or overwrites an entry, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<PhpKey>,
        value: impl Into<PhpValue>,
    ) -> Option<PhpValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &PhpKey) -> Option<PhpValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PhpKey, &PhpValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// True when keys are exactly `0..len` in order, i.e. a PHP list.
    pub fn is_list(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(i, (k, _))| *k == PhpKey::Int(i as i64))
    }
}

impl<K: Into<PhpKey>, V: Into<PhpValue>> FromIterator<(K, V)> for PhpArray {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut array = PhpArray::new();
        for (k, v) in iter {
            array.insert(k, v);
        }
        array
    }
}

impl IntoIterator for PhpArray {
    type Item = (PhpKey, PhpValue);
    type IntoIter = std::vec::IntoIter<(PhpKey, PhpValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for PhpArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_list() {
            let mut seq = serializer.serialize_seq(Some(self.len()))?;
            for (_, v) in self.iter() {
                seq.serialize_element(v)?;
            }
            seq.end()
        } else {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (k, v) in self.iter() {
                map.serialize_entry(&k.to_string(), v)?;
            }
            map.end()
        }
    }
}
