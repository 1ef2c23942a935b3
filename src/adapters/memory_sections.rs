// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process section store.
//!
//! This adapter holds sections built in code. It is the simplest
//! [`SectionLookup`] and the one used when an application assembles its
//! configuration itself or in tests.

use crate::domain::{Result, SettingsFileSection};
use crate::ports::{ConfigSection, SectionLookup};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Section store backed by an in-memory map.
///
/// # Examples
///
/// ```rust
/// use graphcfg::adapters::MemorySectionSource;
/// use graphcfg::ports::SectionLookup;
///
/// # fn main() -> graphcfg::domain::Result<()> {
/// let sections = MemorySectionSource::new().with_settings_path("app-settings", "settings.cfg.xml")?;
///
/// let section = sections.section("app-settings")?.unwrap();
/// let path = section.as_settings_section().map(|s| s.settings_path().to_string());
/// assert_eq!(path.as_deref(), Some("settings.cfg.xml"));
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MemorySectionSource {
    sections: RwLock<HashMap<String, Arc<dyn ConfigSection>>>,
}

impl MemorySectionSource {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `section` under its own name and returns the store.
    pub fn with_section(self, section: impl ConfigSection + 'static) -> Self {
        self.insert(Arc::new(section));
        self
    }

    /// Adds a [`SettingsFileSection`] and returns the store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidArgument`](crate::domain::ConfigError::InvalidArgument)
    /// if either argument is empty.
    pub fn with_settings_path(
        self,
        name: impl Into<String>,
        settings_path: impl Into<String>,
    ) -> Result<Self> {
        let section = SettingsFileSection::new(name, settings_path)?;
        Ok(self.with_section(section))
    }

    /// Adds or replaces a section, returning the one it replaced.
    pub fn insert(&self, section: Arc<dyn ConfigSection>) -> Option<Arc<dyn ConfigSection>> {
        let name = section.section_name().to_string();
        tracing::debug!("Registering in-memory section '{}'", name);
        self.sections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, section)
    }

    /// Removes a section, returning it if it existed.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn ConfigSection>> {
        self.sections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }
}

impl std::fmt::Debug for MemorySectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sections = self.sections.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = sections.keys().collect();
        names.sort();
        f.debug_struct("MemorySectionSource")
            .field("sections", &names)
            .finish()
    }
}

impl SectionLookup for MemorySectionSource {
    fn name(&self) -> &str {
        "memory"
    }

    fn section(&self, name: &str) -> Result<Option<Arc<dyn ConfigSection>>> {
        Ok(self
            .sections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned())
    }

    fn section_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<_> = self
            .sections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConfigError, ProviderSection, TypeReferenceEntry};

    trait Plugin {}

    #[test]
    fn test_settings_sections() {
        let sections = MemorySectionSource::new()
            .with_settings_path("b", "b.xml")
            .unwrap()
            .with_settings_path("a", "a.xml")
            .unwrap();

        assert_eq!(sections.section_names().unwrap(), vec!["a", "b"]);
        let section = sections.section("a").unwrap().unwrap();
        assert_eq!(
            section.as_settings_section().unwrap().settings_path(),
            "a.xml"
        );
        assert!(sections.section("c").unwrap().is_none());
    }

    #[test]
    fn test_rejects_empty_settings_path() {
        let err = MemorySectionSource::new()
            .with_settings_path("a", "")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidArgument { .. }));
    }

    #[test]
    fn test_non_settings_section() {
        let sections = MemorySectionSource::new()
            .with_section(ProviderSection::<dyn Plugin, TypeReferenceEntry<dyn Plugin>>::new("plugins"));

        let section = sections.section("plugins").unwrap().unwrap();
        assert!(section.as_settings_section().is_none());
    }

    #[test]
    fn test_insert_replaces_and_remove() {
        let sections = MemorySectionSource::new();
        let first = Arc::new(SettingsFileSection::new("a", "1.xml").unwrap());
        let second = Arc::new(SettingsFileSection::new("a", "2.xml").unwrap());

        assert!(sections.insert(first).is_none());
        assert!(sections.insert(second).is_some());
        assert_eq!(
            sections
                .section("a")
                .unwrap()
                .unwrap()
                .as_settings_section()
                .unwrap()
                .settings_path(),
            "2.xml"
        );

        assert!(sections.remove("a").is_some());
        assert!(sections.remove("a").is_none());
        assert_eq!(sections.name(), "memory");
    }
}
