// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment variable section store adapter.
//!
//! Each `<PREFIX><SECTION>_SETTINGS_PATH` variable defines a settings
//! section. Section names are matched after upper-casing them and replacing
//! `-` and `.` with `_`, so `app-settings` with prefix `MYAPP_` is read from
//! `MYAPP_APP_SETTINGS_SETTINGS_PATH`.

use crate::domain::{ConfigError, Result, SettingsFileSection};
use crate::ports::{ConfigSection, SectionLookup};
use std::collections::HashMap;
use std::env;
use std::sync::{Arc, PoisonError, RwLock};

/// Maximum length for environment variable keys (prevents DoS)
const MAX_ENV_KEY_LEN: usize = 512;

/// Maximum length for environment variable values (prevents DoS)
const MAX_ENV_VALUE_LEN: usize = 1048576; // 1MB

const SETTINGS_PATH_SUFFIX: &str = "_SETTINGS_PATH";

/// Section store reading settings paths from environment variables.
///
/// Variables are read once, on first lookup, and cached until
/// [`reload`](Self::reload).
///
/// # Examples
///
/// ```rust
/// use graphcfg::adapters::EnvSectionSource;
/// use graphcfg::ports::SectionLookup;
/// use std::collections::HashMap;
///
/// let mut values = HashMap::new();
/// values.insert("APP_SETTINGS_SETTINGS_PATH".to_string(), "settings.cfg.xml".to_string());
///
/// let sections = EnvSectionSource::with_values(values);
/// let section = sections.section("app-settings").unwrap().unwrap();
/// assert_eq!(
///     section.as_settings_section().unwrap().settings_path(),
///     "settings.cfg.xml"
/// );
/// ```
#[derive(Debug)]
pub struct EnvSectionSource {
    /// Prefix every variable must carry
    prefix: String,
    /// Settings paths keyed by normalized section name, loaded lazily
    cache: RwLock<Option<HashMap<String, String>>>,
}

impl EnvSectionSource {
    /// Creates a source reading variables without a prefix.
    pub fn new() -> Self {
        Self::with_prefix("")
    }

    /// Creates a source reading only variables starting with `prefix`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use graphcfg::adapters::EnvSectionSource;
    ///
    /// let sections = EnvSectionSource::with_prefix("MYAPP_");
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            cache: RwLock::new(None),
        }
    }

    /// Creates a source with pre-populated variables for testing.
    ///
    /// **Note**: This method is primarily intended for testing. The keys are
    /// full variable names, without a prefix.
    pub fn with_values(values: HashMap<String, String>) -> Self {
        let source = Self::new();
        let parsed = source.collect(values);
        *source.cache.write().unwrap_or_else(PoisonError::into_inner) = Some(parsed);
        source
    }

    /// Forgets cached variables so the next lookup re-reads the environment.
    pub fn reload(&self) {
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Normalizes a section name to its variable form.
    pub fn variable_stem(section_name: &str) -> String {
        section_name
            .chars()
            .map(|c| match c {
                '-' | '.' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect()
    }

    fn collect<I>(&self, variables: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut paths = HashMap::new();

        for (key, value) in variables {
            // Validate input sizes to prevent DoS
            if key.len() > MAX_ENV_KEY_LEN || value.len() > MAX_ENV_VALUE_LEN {
                tracing::warn!(
                    "Skipping oversized environment variable: key_len={}, value_len={} (max key={}, max value={})",
                    key.len(),
                    value.len(),
                    MAX_ENV_KEY_LEN,
                    MAX_ENV_VALUE_LEN
                );
                continue;
            }

            let Some(stem) = key
                .strip_prefix(self.prefix.as_str())
                .and_then(|rest| rest.strip_suffix(SETTINGS_PATH_SUFFIX))
            else {
                continue;
            };
            if stem.is_empty() {
                continue;
            }
            paths.insert(stem.to_string(), value);
        }

        tracing::debug!(
            "Loaded {} settings section(s) from the environment (prefix={:?})",
            paths.len(),
            self.prefix
        );

        paths
    }

    /// Gets the cache, loading it if necessary.
    fn get_cache(&self) -> HashMap<String, String> {
        {
            let cache_guard = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cache) = cache_guard.as_ref() {
                return cache.clone();
            }
        }

        let new_cache = self.collect(env::vars());
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = Some(new_cache.clone());
        new_cache
    }
}

impl Default for EnvSectionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionLookup for EnvSectionSource {
    fn name(&self) -> &str {
        "env"
    }

    fn section(&self, name: &str) -> Result<Option<Arc<dyn ConfigSection>>> {
        let cache = self.get_cache();
        match cache.get(&Self::variable_stem(name)) {
            Some(path) if path.trim().is_empty() => Err(ConfigError::configuration(format!(
                "The configuration section '{}' has an empty settings path in variable '{}{}{}'.",
                name,
                self.prefix,
                Self::variable_stem(name),
                SETTINGS_PATH_SUFFIX
            ))),
            Some(path) => {
                let section: Arc<dyn ConfigSection> =
                    Arc::new(SettingsFileSection::new(name, path.as_str())?);
                Ok(Some(section))
            }
            None => Ok(None),
        }
    }

    fn section_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<_> = self
            .get_cache()
            .keys()
            .map(|stem| stem.to_lowercase().replace('_', "-"))
            .collect();
        names.sort();
        Ok(names)
    }
}
