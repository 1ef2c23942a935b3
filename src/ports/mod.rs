// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the trait definitions (ports) that define the interfaces
//! between the loader and its collaborators: the host's named-section store, the
//! markup engine, and the introspection policy the engine consults. These traits
//! are implemented by adapters in the adapters layer.

pub mod reader;
pub mod schema;
pub mod section;

// Re-export commonly used types
pub use reader::{GraphReader, LoadedGraph};
pub use schema::{MemberDescriptor, SchemaContext};
pub use section::{ConfigSection, SectionLookup, SettingsSection};
