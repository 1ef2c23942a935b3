// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core types and logic.
//!
//! This module contains the runtime type model that stands in for reflection,
//! the named configuration entries and sections, and the error type. It
//! performs no I/O and defines the fundamental concepts used throughout the
//! library.

pub mod errors;
pub mod listener;
pub mod named_entry;
pub mod provider_section;
pub mod settings_section;
pub mod type_descriptor;
pub mod type_reference;
pub mod type_registry;
pub mod value;

// Re-export commonly used types
pub use errors::{ConfigError, Result};
pub use listener::LoadListener;
pub use named_entry::{NamedEntry, NamedEntryCollection};
pub use provider_section::ProviderSection;
pub use settings_section::SettingsFileSection;
pub use type_descriptor::{
    ConstructorInfo, MethodInfo, PropertyInfo, TypeBuilder, TypeDescriptor, Visibility,
};
pub use type_reference::{ProviderEntry, TypeReferenceEntry};
pub use type_registry::TypeRegistry;
pub use value::{Object, Value};
