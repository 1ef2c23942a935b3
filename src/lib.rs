// SPDX-License-Identifier: MIT OR Apache-2.0

//! A hexagonal architecture crate for loading typed settings object graphs.
//!
//! Applications describe their settings as markup documents. A named
//! configuration section points at the document, a markup engine turns it into
//! a fully constructed object graph, and a lazy loader caches the result for
//! the rest of the process. Sections may also list named providers, each a
//! reference to a concrete type that is instantiated on demand and handed out
//! as a trait object.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: Core types (`TypeDescriptor`, `TypeRegistry`, named entries,
//!   type references, provider sections, errors)
//! - **Ports**: Trait definitions that define interfaces (`SectionLookup`,
//!   `GraphReader`, `SchemaContext`)
//! - **Adapters**: Implementations for specific section stores, the XML markup
//!   engine and its introspection policies
//! - **Service**: The lazy settings loader and the path-based `load_settings`
//!
//! # Features
//!
//! - **Runtime type model**: types register constructors, properties, methods and
//!   capabilities explicitly, with a visibility on each member
//! - **Relaxed introspection**: settings types may keep their constructors and
//!   setters private and still be populated from markup
//! - **Lazy loading**: settings are read at most once, even under concurrent access,
//!   and a failed load stays failed
//! - **Post-load notification**: settings types can act once their graph is complete
//!
//! # Feature Flags
//!
//! - `yaml`: Enable the YAML section store (default)
//! - `env`: Enable the environment variable section store (default)
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust
//! use graphcfg::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct AppSettings {
//!     retries: u32,
//! }
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let types = TypeRegistry::new().with(
//!     TypeDescriptor::builder::<AppSettings>("myapp.AppSettings")
//!         .constructor(Visibility::Private, AppSettings::default)
//!         .setter("RetryCount", Visibility::Private, |s: &mut AppSettings, v: u32| {
//!             s.retries = v
//!         })
//!         .build(),
//! )?;
//!
//! let reader = XmlGraphReader::relaxed(Arc::new(types));
//! let graph = reader.read_str(
//!     r#"<AppSettings xmlns="clr-namespace:myapp" RetryCount="3" />"#,
//! )?;
//! let (settings, _) = graph.into_typed::<AppSettings>().map_err(ConfigError::configuration)?;
//! assert_eq!(settings.retries, 3);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::domain::{
        ConfigError, LoadListener, NamedEntry, NamedEntryCollection, ProviderEntry,
        ProviderSection, Result, SettingsFileSection, TypeDescriptor, TypeReferenceEntry,
        TypeRegistry, Value, Visibility,
    };
    pub use crate::ports::{
        ConfigSection, GraphReader, LoadedGraph, SchemaContext, SectionLookup, SettingsSection,
    };
    pub use crate::service::{load_settings, BaseDirectory, LoadState, SettingsLoader};

    pub use crate::adapters::{
        DefaultSchemaContext, MemorySectionSource, RelaxedSchemaContext, XmlGraphReader,
    };

    // Re-export adapters based on feature flags
    #[cfg(feature = "env")]
    pub use crate::adapters::EnvSectionSource;
    #[cfg(feature = "yaml")]
    pub use crate::adapters::{YamlSection, YamlSectionSource};
}
