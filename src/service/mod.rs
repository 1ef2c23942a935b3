// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer containing the settings loading entry points.
//!
//! [`SettingsLoader`] resolves a named section through a section store and
//! lazily loads the settings file it points at. [`load_settings`] loads a
//! settings file from an explicit path.

pub mod base_dir;
pub mod settings_loader;

// Re-export commonly used types
pub use base_dir::BaseDirectory;
pub use settings_loader::{load_settings, LoadState, SettingsLoader, SettingsLoaderBuilder};
