// SPDX-License-Identifier: MIT OR Apache-2.0

//! Object graph reader trait definition.
//!
//! A [`GraphReader`] is the deserialization engine: it turns a markup document
//! into a constructed object graph, consulting its registry and introspection
//! policy along the way.

use crate::domain::{Object, Result, TypeDescriptor};
use std::any::Any;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// The root of a deserialized object graph together with its descriptor.
pub struct LoadedGraph {
    /// The constructed root object.
    pub root: Object,
    /// Descriptor of the root object's type.
    pub descriptor: Arc<TypeDescriptor>,
}

impl LoadedGraph {
    /// Takes the root as a `T`.
    ///
    /// On mismatch, returns the full name of the type actually loaded.
    pub fn into_typed<T: Any>(self) -> std::result::Result<(Box<T>, Arc<TypeDescriptor>), String> {
        let LoadedGraph { root, descriptor } = self;
        match root.downcast::<T>() {
            Ok(typed) => Ok((typed, descriptor)),
            Err(_) => Err(descriptor.full_name().to_string()),
        }
    }
}

impl fmt::Debug for LoadedGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedGraph")
            .field("root", &self.descriptor.full_name())
            .finish()
    }
}

/// A deserialization engine for settings documents.
///
/// Errors from parsing, type mapping and constructors are returned as-is;
/// callers must not rewrap them as configuration errors.
pub trait GraphReader: Send + Sync {
    /// Name of the engine, for logging.
    fn name(&self) -> &str;

    /// File extensions handled by the engine, without the leading dot.
    fn supported_extensions(&self) -> &[&str];

    /// Builds an object graph from markup text.
    fn read_str(&self, content: &str) -> Result<LoadedGraph>;

    /// Builds an object graph from a file.
    ///
    /// The file is opened and released within the call, whether or not
    /// parsing succeeds.
    fn read_file(&self, path: &Path) -> Result<LoadedGraph>;
}
