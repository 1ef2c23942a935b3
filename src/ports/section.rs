// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named configuration section traits.
//!
//! The host application owns its configuration store. The loader only needs
//! to ask it for a section by name and check whether that section points at a
//! settings file. These traits are that interface.

use crate::domain::Result;
use std::any::Any;
use std::sync::Arc;

/// A section that locates a settings file.
pub trait SettingsSection {
    /// Path of the settings markup file, possibly relative to the
    /// application's base directory.
    fn settings_path(&self) -> &str;
}

/// A named section held by the host configuration store.
///
/// Capabilities are discovered at runtime: a section that locates a settings
/// file returns itself from [`as_settings_section`](Self::as_settings_section).
///
/// # Examples
///
/// ```rust
/// use graphcfg::ports::ConfigSection;
/// use std::any::Any;
///
/// struct LegacySection;
///
/// impl ConfigSection for LegacySection {
///     fn section_name(&self) -> &str {
///         "legacy"
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
///
/// assert!(LegacySection.as_settings_section().is_none());
/// ```
pub trait ConfigSection: Send + Sync {
    /// The section name.
    fn section_name(&self) -> &str;

    /// Returns the settings-file capability, if the section has it.
    fn as_settings_section(&self) -> Option<&dyn SettingsSection> {
        None
    }

    /// Access to the concrete section type.
    fn as_any(&self) -> &dyn Any;
}

/// A host store that resolves section names to sections.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a loader may resolve its section
/// from any thread.
pub trait SectionLookup: Send + Sync {
    /// Name of this store, for logging and error messages.
    fn name(&self) -> &str;

    /// Returns the section named `name`.
    ///
    /// * `Ok(Some(section))` - the section exists
    /// * `Ok(None)` - no section has that name
    /// * `Err(ConfigError)` - the store could not be read
    fn section(&self, name: &str) -> Result<Option<Arc<dyn ConfigSection>>>;

    /// Names of all sections in the store.
    fn section_names(&self) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct PathSection {
        name: String,
        path: String,
    }

    impl SettingsSection for PathSection {
        fn settings_path(&self) -> &str {
            &self.path
        }
    }

    impl ConfigSection for PathSection {
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

    struct TestLookup {
        sections: HashMap<String, Arc<dyn ConfigSection>>,
    }

    impl SectionLookup for TestLookup {
        fn name(&self) -> &str {
            "test"
        }

        fn section(&self, name: &str) -> Result<Option<Arc<dyn ConfigSection>>> {
            Ok(self.sections.get(name).cloned())
        }

        fn section_names(&self) -> Result<Vec<String>> {
            Ok(self.sections.keys().cloned().collect())
        }
    }

    #[test]
    fn test_settings_capability() {
        let section = PathSection {
            name: "app".to_string(),
            path: "app.xml".to_string(),
        };
        let settings = section.as_settings_section().unwrap();
        assert_eq!(settings.settings_path(), "app.xml");
        assert!(section.as_any().downcast_ref::<PathSection>().is_some());
    }

    #[test]
    fn test_lookup() {
        let mut sections: HashMap<String, Arc<dyn ConfigSection>> = HashMap::new();
        sections.insert(
            "app".to_string(),
            Arc::new(PathSection {
                name: "app".to_string(),
                path: "app.xml".to_string(),
            }),
        );
        let lookup = TestLookup { sections };

        assert!(lookup.section("app").unwrap().is_some());
        assert!(lookup.section("other").unwrap().is_none());
        assert_eq!(lookup.section_names().unwrap(), vec!["app".to_string()]);
    }

    #[test]
    fn test_lookup_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn SectionLookup>();
        assert_send_sync::<dyn ConfigSection>();
    }
}
