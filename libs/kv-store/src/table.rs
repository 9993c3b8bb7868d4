use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    MAX_NAME_LEN,
};

pub(crate) type Name = String<MAX_NAME_LEN>;

/// Validates a namespace or key and copies it into a bounded string.
pub(crate) fn name(raw: &str) -> Result<Name> {
    if raw.is_empty() || raw.len() > MAX_NAME_LEN {
        return Err(Error::InvalidName);
    }
    let mut name = Name::new();
    name.push_str(raw).map_err(|()| Error::InvalidName)?;
    Ok(name)
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub(crate) struct Entry<const VALUE_SIZE: usize> {
    namespace: Name,
    key: Name,
    value: Vec<u8, VALUE_SIZE>,
}

/// Flat list of all entries of all namespaces.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub(crate) struct Table<const ENTRIES: usize, const VALUE_SIZE: usize> {
    entries: Vec<Entry<VALUE_SIZE>, ENTRIES>,
}

impl<const ENTRIES: usize, const VALUE_SIZE: usize> Default for Table<ENTRIES, VALUE_SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const ENTRIES: usize, const VALUE_SIZE: usize> Table<ENTRIES, VALUE_SIZE> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn position(&self, namespace: &str, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.namespace == namespace && entry.key == key)
    }

    pub fn get(&self, namespace: &str, key: &str) -> Option<&[u8]> {
        self.position(namespace, key)
            .map(|i| &self.entries[i].value[..])
    }

    /// Inserts or replaces a value. On error the previous value is kept.
    pub fn insert(&mut self, namespace: &Name, key: &str, value: &[u8]) -> Result<()> {
        let value = Vec::from_slice(value).map_err(|()| Error::ValueTooLarge)?;
        if let Some(i) = self.position(namespace, key) {
            self.entries[i].value = value;
            return Ok(());
        }
        let entry = Entry {
            namespace: namespace.clone(),
            key: name(key)?,
            value,
        };
        self.entries.push(entry).map_err(|_| Error::Full)
    }

    pub fn remove(&mut self, namespace: &str, key: &str) -> bool {
        match self.position(namespace, key) {
            Some(i) => {
                self.entries.swap_remove(i);
                true
            }
            None => false,
        }
    }

    /// Removes every key of a namespace, returns how many were removed.
    pub fn clear_namespace(&mut self, namespace: &str) -> usize {
        let mut removed = 0;
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].namespace == namespace {
                self.entries.swap_remove(i);
                removed += 1;
            } else {
                i += 1;
            }
        }
        removed
    }
}
