//! Immutable attribute sets used for variant matching

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Immutable, ordered key/value attribute bag.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeContainer {
    entries: Arc<BTreeMap<String, String>>,
}

impl AttributeContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with `key` set to `value`
    pub fn with(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = (*self.entries).clone();
        entries.insert(key.into(), value.into());
        Self {
            entries: Arc::new(entries),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Immutable snapshot of this container
    pub fn as_immutable(&self) -> Self {
        self.clone()
    }

    /// Every attribute requested here that `candidate` also declares must have the same value.
    /// Attributes the candidate does not declare are compatible.
    pub fn is_compatible_with(&self, candidate: &AttributeContainer) -> bool {
        self.entries
            .iter()
            .all(|(key, value)| candidate.get(key).map_or(true, |v| v == value))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeContainer {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: Arc::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for AttributeContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        write!(f, "}}")
    }
}
