// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing implementations of the ports.
//!
//! This module contains the introspection policies, the XML markup engine and
//! the section stores. Each adapter implements one of the traits defined in
//! the ports layer.

pub mod default_schema;
#[cfg(feature = "env")]
pub mod env_sections;
pub mod memory_sections;
pub mod relaxed_schema;
pub mod xml_graph;
#[cfg(feature = "yaml")]
pub mod yaml_sections;

// Re-export adapters based on feature flags
pub use default_schema::DefaultSchemaContext;
#[cfg(feature = "env")]
pub use env_sections::EnvSectionSource;
pub use memory_sections::MemorySectionSource;
pub use relaxed_schema::{RelaxedSchemaContext, COLLECTION_INVOKER_METHOD};
pub use xml_graph::XmlGraphReader;
#[cfg(feature = "yaml")]
pub use yaml_sections::{YamlSection, YamlSectionSource};
