use crate::interpreter::value::core::Value;

/// A key in a [`Mapping`].
///
/// Keys are restricted to the three hashable scalar kinds. Keys declared with
/// the `name: value` literal syntax are symbols and print as symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapKey {
    /// A symbol key, e.g. `:name`.
    Symbol(String),
    /// A text key, e.g. `"name"`.
    Text(String),
    /// An integer key.
    Integer(i64),
}

impl MapKey {
    /// Converts the key back into a plain [`Value`], e.g. for iteration.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Symbol(name) => Value::Symbol(name.clone()),
            Self::Text(text) => Value::Text(text.clone()),
            Self::Integer(n) => Value::Integer(*n),
        }
    }
}

impl std::fmt::Display for MapKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Symbol(name) => write!(f, ":{name}"),
            Self::Text(text) => write!(f, "\"{text}\""),
            Self::Integer(n) => write!(f, "{n}"),
        }
    }
}

/// An insertion-ordered collection of unique key/value pairs.
///
/// Re-inserting an existing key replaces its value in place, keeping the
/// key's original position. Lookup is a linear scan, which is the right
/// trade-off for the short literals teaching snippets build.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: Vec<(MapKey, Value)>,
}

impl Mapping {
    /// Creates an empty mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the mapping holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &MapKey) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Inserts `value` under `key`, replacing in place when the key already
    /// exists.
    pub fn insert(&mut self, key: MapKey, value: Value) {
        for entry in &mut self.entries {
            if entry.0 == key {
                entry.1 = value;
                return;
            }
        }
        self.entries.push((key, value));
    }

    /// Returns `true` when `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &MapKey) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Returns `true` when any entry stores a value equal to `value`.
    #[must_use]
    pub fn contains_value(&self, value: &Value) -> bool {
        self.entries.iter().any(|(_, v)| v == value)
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(MapKey, Value)> {
        self.entries.iter()
    }

    /// Returns a new mapping holding `self`'s entries updated with `other`'s;
    /// on key collisions `other` wins, keeping the original position.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut result = self.clone();
        for (key, value) in &other.entries {
            result.insert(key.clone(), value.clone());
        }
        result
    }
}

impl PartialEq for Mapping {
    /// Structural equality, insensitive to insertion order.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|v| v == value))
    }
}
