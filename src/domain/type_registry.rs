// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of described types.
//!
//! The registry stands in for a platform type loader: type references in
//! configuration and element names in markup are resolved against it. It is
//! populated once at startup and then shared, usually behind an `Arc`.

use crate::domain::{ConfigError, Result, TypeDescriptor};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// A name-keyed set of [`TypeDescriptor`]s.
///
/// # Examples
///
/// ```
/// use graphcfg::domain::{TypeDescriptor, TypeRegistry, Visibility};
///
/// # fn main() -> graphcfg::domain::Result<()> {
/// let mut registry = TypeRegistry::new();
/// registry.register(
///     TypeDescriptor::builder::<String>("std.String")
///         .constructor(Visibility::Public, String::new)
///         .build(),
/// )?;
///
/// assert!(registry.get("std.String").is_some());
/// assert!(registry.descriptor_of::<String>().is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    by_name: HashMap<String, Arc<TypeDescriptor>>,
    by_id: HashMap<TypeId, Arc<TypeDescriptor>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateKey`] if a descriptor with the same full
    /// name is already registered.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<Arc<TypeDescriptor>> {
        if self.by_name.contains_key(descriptor.full_name()) {
            return Err(ConfigError::DuplicateKey {
                key: descriptor.full_name().to_string(),
            });
        }

        let descriptor = Arc::new(descriptor);
        tracing::debug!(
            "Registered type '{}' ({})",
            descriptor.full_name(),
            descriptor.rust_type_name()
        );
        self.by_name
            .insert(descriptor.full_name().to_string(), Arc::clone(&descriptor));
        self.by_id
            .entry(descriptor.type_id())
            .or_insert_with(|| Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with(mut self, descriptor: TypeDescriptor) -> Result<Self> {
        self.register(descriptor)?;
        Ok(self)
    }

    /// Looks up a descriptor by its full name.
    pub fn get(&self, full_name: &str) -> Option<Arc<TypeDescriptor>> {
        self.by_name.get(full_name).cloned()
    }

    /// Looks up the first descriptor registered for a Rust type.
    pub fn get_by_id(&self, type_id: TypeId) -> Option<Arc<TypeDescriptor>> {
        self.by_id.get(&type_id).cloned()
    }

    /// Looks up the first descriptor registered for `T`.
    pub fn descriptor_of<T: Any>(&self) -> Option<Arc<TypeDescriptor>> {
        self.get_by_id(TypeId::of::<T>())
    }

    /// Resolves a markup element name.
    ///
    /// With a namespace the full name `namespace.local` must be registered.
    /// Without one, `local` is tried as a full name and then as a short name,
    /// which must be unambiguous.
    pub fn resolve_markup(&self, namespace: Option<&str>, local: &str) -> Option<Arc<TypeDescriptor>> {
        match namespace {
            Some(namespace) => self.get(&format!("{}.{}", namespace, local)),
            None => self.get(local).or_else(|| {
                let mut matches = self.by_name.values().filter(|d| d.short_name() == local);
                match (matches.next(), matches.next()) {
                    (Some(only), None) => Some(Arc::clone(only)),
                    _ => None,
                }
            }),
        }
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterates over all descriptors in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeDescriptor>> {
        self.by_name.values()
    }
}
