// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named configuration entries and their keyed collection.

use crate::domain::{ConfigError, Result};
use serde::de::{Deserialize, Deserializer, Error as _};

/// A configuration entry identified by a required, unique name.
pub trait NamedEntry {
    /// The entry name, used as the collection key.
    fn name(&self) -> &str;
}

/// An ordered collection of [`NamedEntry`] values keyed by name.
///
/// Iteration follows insertion order. Names are unique: adding a second entry
/// with an existing name fails and leaves the collection unchanged. Removing
/// a name that is not present is a no-op.
///
/// # Examples
///
/// ```
/// use graphcfg::domain::{NamedEntryCollection, TypeReferenceEntry};
///
/// # fn main() -> graphcfg::domain::Result<()> {
/// let mut providers: NamedEntryCollection<TypeReferenceEntry<dyn std::fmt::Debug>> =
///     NamedEntryCollection::new();
/// providers.add(TypeReferenceEntry::new("disk", "storage.DiskStore"))?;
///
/// assert!(providers.add(TypeReferenceEntry::new("disk", "storage.Other")).is_err());
/// assert_eq!(providers.get_by_name("disk").unwrap().type_reference(), "storage.DiskStore");
/// assert!(providers.get_by_name("cloud").is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct NamedEntryCollection<E> {
    entries: Vec<E>,
}

impl<E> NamedEntryCollection<E> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the collection holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry at `index`, in insertion order.
    pub fn get(&self, index: usize) -> Option<&E> {
        self.entries.get(index)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.entries.iter()
    }
}

impl<E: NamedEntry> NamedEntryCollection<E> {
    /// Builds a collection from entries, rejecting duplicates.
    pub fn from_entries<I: IntoIterator<Item = E>>(entries: I) -> Result<Self> {
        let mut collection = Self::new();
        for entry in entries {
            collection.add(entry)?;
        }
        Ok(collection)
    }

    /// Returns the entry named `name`, or `None` if there is none.
    pub fn get_by_name(&self, name: &str) -> Option<&E> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Mutable variant of [`get_by_name`](Self::get_by_name).
    pub fn get_by_name_mut(&mut self, name: &str) -> Option<&mut E> {
        self.entries.iter_mut().find(|e| e.name() == name)
    }

    /// Returns `true` if an entry named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get_by_name(name).is_some()
    }

    /// Appends an entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidArgument`] if the entry name is empty and
    /// [`ConfigError::DuplicateKey`] if the name is already taken.
    pub fn add(&mut self, entry: E) -> Result<()> {
        if entry.name().is_empty() {
            return Err(ConfigError::invalid_argument(
                "entry",
                "entry name must not be empty",
            ));
        }
        if self.contains(entry.name()) {
            return Err(ConfigError::DuplicateKey {
                key: entry.name().to_string(),
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Removes the entry named `name`. Returns `false` if there was none.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.entries.iter().position(|e| e.name() == name) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Entry names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(NamedEntry::name)
    }
}

impl<E> Default for NamedEntryCollection<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, E> IntoIterator for &'a NamedEntryCollection<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<'de, E> Deserialize<'de> for NamedEntryCollection<E>
where
    E: NamedEntry + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let entries = Vec::<E>::deserialize(deserializer)?;
        Self::from_entries(entries).map_err(D::Error::custom)
    }
}
