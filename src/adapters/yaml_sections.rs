// SPDX-License-Identifier: MIT OR Apache-2.0

//! YAML section store adapter.
//!
//! This module provides a [`SectionLookup`] backed by a host YAML file whose
//! top-level keys are section names:
//!
//! ```yaml
//! app-settings:
//!   settings_path: settings.cfg.xml
//!
//! storage:
//!   providers:
//!     - name: disk
//!       type: storage.DiskStore
//!     - name: memory
//!       type: storage.MemoryStore
//! ```
//!
//! A mapping holding `settings_path` is a [`SettingsFileSection`]. Any other
//! section is returned as a [`YamlSection`] and can be read as a
//! [`ProviderSection`] with
//! [`provider_section`](YamlSectionSource::provider_section).

use crate::domain::{
    ConfigError, NamedEntry, NamedEntryCollection, ProviderEntry, ProviderSection, Result,
    SettingsFileSection,
};
use crate::ports::{ConfigSection, SectionLookup};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::any::Any;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Maximum allowed file size for YAML section files (10MB)
/// This prevents denial of service attacks via extremely large files
const MAX_YAML_FILE_SIZE: u64 = 10 * 1024 * 1024;

const SOURCE_NAME: &str = "yaml-sections";
const SETTINGS_PATH_KEY: &str = "settings_path";

/// A section read from YAML that does not point at a settings file.
#[derive(Debug, Clone)]
pub struct YamlSection {
    name: String,
    value: Value,
}

impl YamlSection {
    /// The raw YAML body of the section.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl ConfigSection for YamlSection {
    fn section_name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Deserialize)]
#[serde(bound = "E: NamedEntry + Deserialize<'de>")]
struct ProvidersBody<E> {
    #[serde(default = "NamedEntryCollection::new")]
    providers: NamedEntryCollection<E>,
}

/// Section store backed by a YAML file.
///
/// # Examples
///
/// ```rust
/// use graphcfg::adapters::YamlSectionSource;
/// use graphcfg::ports::SectionLookup;
///
/// let yaml = "app-settings:\n  settings_path: settings.cfg.xml\n";
/// let sections = YamlSectionSource::from_str(yaml).unwrap();
///
/// let section = sections.section("app-settings").unwrap().unwrap();
/// assert_eq!(
///     section.as_settings_section().unwrap().settings_path(),
///     "settings.cfg.xml"
/// );
/// ```
#[derive(Debug)]
pub struct YamlSectionSource {
    /// Path to the YAML file, when loaded from disk
    file_path: Option<PathBuf>,
    /// Top-level mapping of section names to section bodies
    sections: RwLock<Mapping>,
}

impl YamlSectionSource {
    /// Loads sections from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SourceError`] if the file cannot be read, is
    /// larger than 10MB, or is not a YAML mapping.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();

        // Canonicalize path to prevent directory traversal attacks
        let canonical_path = file_path.canonicalize().map_err(|e| ConfigError::SourceError {
            source_name: SOURCE_NAME.to_string(),
            message: format!(
                "Invalid or inaccessible path: {}",
                file_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("<unknown>")
            ),
            source: Some(Box::new(e)),
        })?;

        let sections = Self::read(&canonical_path)?;
        tracing::debug!(
            "Loaded {} section(s) from {}",
            sections.len(),
            canonical_path.display()
        );

        Ok(Self {
            file_path: Some(canonical_path),
            sections: RwLock::new(sections),
        })
    }

    /// Parses sections from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SourceError`] if the text is not a YAML mapping.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        Ok(Self {
            file_path: None,
            sections: RwLock::new(Self::parse(content)?),
        })
    }

    /// Loads `sections.yaml` from the OS-appropriate configuration directory.
    ///
    /// # Arguments
    ///
    /// * `app_name` - The application name (e.g., "myapp")
    /// * `qualifier` - The organization/qualifier (e.g., "com.example")
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use graphcfg::adapters::YamlSectionSource;
    ///
    /// let sections = YamlSectionSource::from_default_location("myapp", "com.example").unwrap();
    /// ```
    pub fn from_default_location(app_name: &str, qualifier: &str) -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from(qualifier, "", app_name).ok_or_else(|| ConfigError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: "Failed to determine project directories".to_string(),
                source: None,
            })?;

        Self::from_file(proj_dirs.config_dir().join("sections.yaml"))
    }

    /// Returns the path to the YAML file, if the sections came from one.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Re-reads the YAML file.
    ///
    /// Sections already handed out are unaffected. Sources built from text
    /// have nothing to reload.
    pub fn reload(&self) -> Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        let sections = Self::read(path)?;
        *self.sections.write().unwrap_or_else(PoisonError::into_inner) = sections;
        tracing::debug!("Reloaded sections from {}", path.display());
        Ok(())
    }

    /// Reads the section `name` as a provider section.
    ///
    /// The section body must hold a `providers` sequence of `{ name, type }`
    /// entries, or entries of whatever shape `E` deserializes from.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Configuration`] if the section is missing or
    /// malformed, and [`ConfigError::DuplicateKey`]-derived messages when two
    /// providers share a name.
    pub fn provider_section<B, E>(&self, name: &str) -> Result<ProviderSection<B, E>>
    where
        B: ?Sized + 'static,
        E: ProviderEntry<B> + DeserializeOwned,
    {
        let body = self.body(name)?.ok_or_else(|| missing_section(name))?;
        let parsed: ProvidersBody<E> = serde_yaml::from_value(body).map_err(|e| {
            ConfigError::configuration(format!(
                "The configuration section '{}' is invalid: {}",
                name, e
            ))
        })?;
        Ok(ProviderSection::with_providers(name, parsed.providers))
    }

    fn body(&self, name: &str) -> Result<Option<Value>> {
        Ok(self
            .sections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned())
    }

    fn read(path: &Path) -> Result<Mapping> {
        // Check file size before reading to prevent DoS via large files
        let metadata = fs::metadata(path).map_err(|e| ConfigError::SourceError {
            source_name: SOURCE_NAME.to_string(),
            message: format!("Failed to read file metadata: {}", path.display()),
            source: Some(Box::new(e)),
        })?;

        if metadata.len() > MAX_YAML_FILE_SIZE {
            return Err(ConfigError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: format!(
                    "Section file too large: {} bytes (max {} bytes)",
                    metadata.len(),
                    MAX_YAML_FILE_SIZE
                ),
                source: None,
            });
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::SourceError {
            source_name: SOURCE_NAME.to_string(),
            message: format!("Failed to read section file: {}", path.display()),
            source: Some(Box::new(e)),
        })?;

        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Mapping> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| ConfigError::SourceError {
            source_name: SOURCE_NAME.to_string(),
            message: format!("Failed to parse YAML: {}", e),
            source: Some(Box::new(e)),
        })?;

        match value {
            Value::Mapping(mapping) => Ok(mapping),
            Value::Null => Ok(Mapping::new()),
            _ => Err(ConfigError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: "Top level of a section file must be a mapping".to_string(),
                source: None,
            }),
        }
    }
}

fn missing_section(name: &str) -> ConfigError {
    ConfigError::configuration(format!(
        "No configuration section has been defined having name '{}'.",
        name
    ))
}

impl SectionLookup for YamlSectionSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn section(&self, name: &str) -> Result<Option<Arc<dyn ConfigSection>>> {
        let Some(body) = self.body(name)? else {
            return Ok(None);
        };

        let settings_path = body
            .as_mapping()
            .and_then(|m| m.get(SETTINGS_PATH_KEY));
        let section: Arc<dyn ConfigSection> = match settings_path {
            Some(Value::String(path)) if path.trim().is_empty() => {
                return Err(ConfigError::configuration(format!(
                    "The '{}' of configuration section '{}' must not be empty.",
                    SETTINGS_PATH_KEY, name
                )))
            }
            Some(Value::String(path)) => Arc::new(SettingsFileSection::new(name, path.as_str())?),
            Some(_) => {
                return Err(ConfigError::configuration(format!(
                    "The '{}' of configuration section '{}' must be a string.",
                    SETTINGS_PATH_KEY, name
                )))
            }
            None => Arc::new(YamlSection {
                name: name.to_string(),
                value: body,
            }),
        };
        Ok(Some(section))
    }

    fn section_names(&self) -> Result<Vec<String>> {
        Ok(self
            .sections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TypeReferenceEntry;
    use std::io::Write;
    use tempfile::NamedTempFile;

    trait Store {}

    const SECTIONS: &str = r#"
app-settings:
  settings_path: settings.cfg.xml

storage:
  providers:
    - name: disk
      type: storage.DiskStore
    - name: memory
      type: storage.MemoryStore
"#;

    #[test]
    fn test_settings_section() {
        let sections = YamlSectionSource::from_str(SECTIONS).unwrap();
        let section = sections.section("app-settings").unwrap().unwrap();
        assert_eq!(section.section_name(), "app-settings");
        assert_eq!(
            section.as_settings_section().unwrap().settings_path(),
            "settings.cfg.xml"
        );
    }

    #[test]
    fn test_other_sections_are_raw() {
        let sections = YamlSectionSource::from_str(SECTIONS).unwrap();
        let section = sections.section("storage").unwrap().unwrap();
        assert!(section.as_settings_section().is_none());
        let raw = section.as_any().downcast_ref::<YamlSection>().unwrap();
        assert!(raw.value().get("providers").is_some());

        assert!(sections.section("missing").unwrap().is_none());
    }

    #[test]
    fn test_section_names_keep_file_order() {
        let sections = YamlSectionSource::from_str(SECTIONS).unwrap();
        assert_eq!(
            sections.section_names().unwrap(),
            vec!["app-settings", "storage"]
        );
    }

    #[test]
    fn test_provider_section() {
        let sections = YamlSectionSource::from_str(SECTIONS).unwrap();
        let storage: ProviderSection<dyn Store> = sections.provider_section("storage").unwrap();
        let names: Vec<_> = storage.providers().names().collect();
        assert_eq!(names, vec!["disk", "memory"]);
        let disk = storage.providers().get_by_name("disk").unwrap();
        assert_eq!(disk.name(), "disk");
        assert_eq!(disk.type_reference(), "storage.DiskStore");
    }

    #[test]
    fn test_provider_section_duplicate_names() {
        let yaml = r#"
storage:
  providers:
    - name: disk
      type: a.Disk
    - name: disk
      type: b.Disk
"#;
        let sections = YamlSectionSource::from_str(yaml).unwrap();
        let err = sections
            .provider_section::<dyn Store, TypeReferenceEntry<dyn Store>>("storage")
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("disk"));
    }

    #[test]
    fn test_missing_provider_section() {
        let sections = YamlSectionSource::from_str(SECTIONS).unwrap();
        let err = sections
            .provider_section::<dyn Store, TypeReferenceEntry<dyn Store>>("codecs")
            .unwrap_err();
        assert!(err.to_string().contains("'codecs'"));
    }

    #[test]
    fn test_invalid_settings_path() {
        let sections = YamlSectionSource::from_str("app:\n  settings_path: 3\n").unwrap();
        assert!(sections.section("app").err().unwrap().is_configuration());

        let sections = YamlSectionSource::from_str("app:\n  settings_path: ''\n").unwrap();
        let err = sections.section("app").err().unwrap();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("'app'"));
    }

    #[test]
    fn test_rejects_non_mapping() {
        let err = YamlSectionSource::from_str("- a\n- b\n").unwrap_err();
        assert!(matches!(err, ConfigError::SourceError { .. }));
        assert!(YamlSectionSource::from_str("").unwrap().section_names().unwrap().is_empty());
    }

    #[test]
    fn test_from_file_and_reload() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"a:\n  settings_path: one.xml\n").unwrap();
        file.flush().unwrap();

        let sections = YamlSectionSource::from_file(file.path()).unwrap();
        assert!(sections.file_path().is_some());
        assert!(sections.section("b").unwrap().is_none());

        std::fs::write(file.path(), "b:\n  settings_path: two.xml\n").unwrap();
        sections.reload().unwrap();
        assert!(sections.section("a").unwrap().is_none());
        assert!(sections.section("b").unwrap().is_some());
    }

    #[test]
    fn test_from_missing_file() {
        let err = YamlSectionSource::from_file("/nonexistent/sections.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::SourceError { .. }));
    }
}
