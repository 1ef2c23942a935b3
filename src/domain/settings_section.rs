// SPDX-License-Identifier: MIT OR Apache-2.0

//! The section type that points a loader at a settings file.

use crate::domain::{ConfigError, Result};
use crate::ports::{ConfigSection, SettingsSection};
use std::any::Any;

/// A named section whose only content is the path of a settings markup file.
///
/// # Examples
///
/// ```
/// use graphcfg::domain::SettingsFileSection;
/// use graphcfg::ports::{ConfigSection, SettingsSection};
///
/// # fn main() -> graphcfg::domain::Result<()> {
/// let section = SettingsFileSection::new("app-settings", "settings.cfg.xml")?;
/// let settings = section.as_settings_section().unwrap();
/// assert_eq!(settings.settings_path(), "settings.cfg.xml");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsFileSection {
    name: String,
    settings_path: String,
}

impl SettingsFileSection {
    /// Creates a section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidArgument`] if either argument is empty.
    pub fn new(name: impl Into<String>, settings_path: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::invalid_argument(
                "name",
                "section name must not be empty",
            ));
        }
        let mut section = Self {
            name,
            settings_path: String::new(),
        };
        section.set_settings_path(settings_path)?;
        Ok(section)
    }

    /// Replaces the settings path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidArgument`] if `settings_path` is empty.
    pub fn set_settings_path(&mut self, settings_path: impl Into<String>) -> Result<()> {
        let settings_path = settings_path.into();
        if settings_path.trim().is_empty() {
            return Err(ConfigError::invalid_argument(
                "settings_path",
                "settings path must not be empty",
            ));
        }
        self.settings_path = settings_path;
        Ok(())
    }
}

impl SettingsSection for SettingsFileSection {
    fn settings_path(&self) -> &str {
        &self.settings_path
    }
}

impl ConfigSection for SettingsFileSection {
    fn section_name(&self) -> &str {
        &self.name
    }

    fn as_settings_section(&self) -> Option<&dyn SettingsSection> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
