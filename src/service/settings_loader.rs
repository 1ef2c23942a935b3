// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lazy, section-driven settings loading.
//!
//! A [`SettingsLoader`] names a configuration section. On first access it asks
//! the section store for that section, reads the settings file the section
//! points at, and keeps the resulting object for the rest of its life. A
//! failed load is kept as well and reported again on every later access.
//!
//! [`load_settings`] performs the same file loading against an explicit path,
//! without a section or a cache.

use crate::domain::{ConfigError, Result};
use crate::ports::{GraphReader, SectionLookup};
use crate::service::BaseDirectory;
use once_cell::sync::OnceCell;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};

/// Loads a settings object of type `T` from `path`.
///
/// A relative `path` is anchored to `base_dir`. If the type of the loaded
/// object opted into post-load notification, it is notified once with
/// `sender` before being returned.
///
/// # Errors
///
/// - [`ConfigError::InvalidArgument`] if `path` is empty.
/// - [`ConfigError::Configuration`] if the file holds an object of another type.
/// - Errors from `reader` are returned unchanged.
pub fn load_settings<T: Any + Send + Sync>(
    reader: &dyn GraphReader,
    path: impl AsRef<Path>,
    base_dir: &BaseDirectory,
    sender: Option<&dyn Any>,
) -> Result<T> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(ConfigError::invalid_argument(
            "path",
            "settings path must not be empty",
        ));
    }

    let full_path = base_dir.anchor(path)?;
    tracing::debug!(
        "Reading settings from {} with the '{}' reader",
        full_path.display(),
        reader.name()
    );

    let graph = reader.read_file(&full_path)?;
    let (mut settings, descriptor) = graph.into_typed::<T>().map_err(|found| {
        ConfigError::configuration(format!(
            "The settings file '{}' does not contain an object of type '{}' (found '{}').",
            full_path.display(),
            std::any::type_name::<T>(),
            found
        ))
    })?;

    if descriptor.notify_post_load(&mut *settings, sender) {
        tracing::debug!("Notified '{}' after loading", descriptor.full_name());
    }

    tracing::info!(
        "Loaded '{}' from {}",
        descriptor.full_name(),
        full_path.display()
    );
    Ok(*settings)
}

/// Where a [`SettingsLoader`] is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing has been loaded yet, or a load is in progress.
    Pending,
    /// The settings are cached.
    Loaded,
    /// The load failed and the error is cached.
    Failed,
}

/// Lazily loads and caches the settings object named by a configuration
/// section.
///
/// The first call to [`settings`](Self::settings) performs the load. Callers
/// racing with it block until it finishes and then share its outcome, so the
/// settings file is read at most once per loader. A failure is sticky: later
/// calls return the same error without retrying.
///
/// When the settings type opted into post-load notification, it is notified
/// once with the loader itself as the sender. The settings are not cached
/// until the notification returns, so a listener asking the loader for them
/// gets an error instead of the object being notified.
///
/// # Examples
///
/// ```rust,no_run
/// use graphcfg::adapters::{MemorySectionSource, XmlGraphReader};
/// use graphcfg::domain::TypeRegistry;
/// use graphcfg::service::SettingsLoader;
/// use std::sync::Arc;
///
/// # #[derive(Default)]
/// # struct AppSettings;
/// # fn main() -> graphcfg::domain::Result<()> {
/// let types = Arc::new(TypeRegistry::new());
/// let sections = MemorySectionSource::new()
///     .with_settings_path("app-settings", "settings.cfg.xml")?;
///
/// let loader = SettingsLoader::<AppSettings>::builder("app-settings")
///     .with_sections(Arc::new(sections))
///     .with_reader(Arc::new(XmlGraphReader::relaxed(types)))
///     .build()?;
///
/// let settings = loader.settings()?;
/// # Ok(())
/// # }
/// ```
pub struct SettingsLoader<T> {
    section_name: String,
    sections: Arc<dyn SectionLookup>,
    reader: Arc<dyn GraphReader>,
    base_dir: BaseDirectory,
    cell: OnceCell<std::result::Result<Arc<T>, Arc<ConfigError>>>,
    /// Thread running the first load, if one is in progress
    loading: Mutex<Option<ThreadId>>,
}

/// Marks the current thread as loading until dropped.
struct LoadingGuard<'a>(&'a Mutex<Option<ThreadId>>);

impl<'a> LoadingGuard<'a> {
    fn enter(slot: &'a Mutex<Option<ThreadId>>) -> Self {
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
        Self(slot)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl<T: Any + Send + Sync> SettingsLoader<T> {
    /// Starts building a loader for the section named `section_name`.
    pub fn builder(section_name: impl Into<String>) -> SettingsLoaderBuilder<T> {
        SettingsLoaderBuilder::new(section_name)
    }

    /// Creates a loader anchoring relative paths to the executable directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidArgument`] if `section_name` is empty.
    pub fn new(
        section_name: impl Into<String>,
        sections: Arc<dyn SectionLookup>,
        reader: Arc<dyn GraphReader>,
    ) -> Result<Self> {
        Self::builder(section_name)
            .with_sections(sections)
            .with_reader(reader)
            .build()
    }

    /// The name of the section this loader reads.
    pub fn section_name(&self) -> &str {
        &self.section_name
    }

    /// The directory relative settings paths are anchored to.
    pub fn base_dir(&self) -> &BaseDirectory {
        &self.base_dir
    }

    /// Returns the settings, loading them on first access.
    ///
    /// # Errors
    ///
    /// Returns the error of the first load, wrapped in
    /// [`ConfigError::Shared`], on this and every later call.
    ///
    /// Returns [`ConfigError::Configuration`] when called from the post-load
    /// notification of the settings being loaded. That error is not cached.
    pub fn settings(&self) -> Result<Arc<T>> {
        if self.cell.get().is_none() && self.is_loading_here() {
            return Err(ConfigError::configuration(format!(
                "The settings for configuration section '{}' were requested while they are still being loaded.",
                self.section_name
            )));
        }

        let outcome = self.cell.get_or_init(|| {
            let _guard = LoadingGuard::enter(&self.loading);
            match self.load() {
                Ok(settings) => Ok(Arc::new(settings)),
                Err(error) => {
                    tracing::warn!(
                        "Failed to load settings for section '{}': {}",
                        self.section_name,
                        error
                    );
                    Err(Arc::new(error))
                }
            }
        });

        match outcome {
            Ok(settings) => Ok(Arc::clone(settings)),
            Err(error) => Err(ConfigError::Shared(Arc::clone(error))),
        }
    }

    /// The current load state.
    pub fn state(&self) -> LoadState {
        match self.cell.get() {
            None => LoadState::Pending,
            Some(Ok(_)) => LoadState::Loaded,
            Some(Err(_)) => LoadState::Failed,
        }
    }

    fn is_loading_here(&self) -> bool {
        let loading = self.loading.lock().unwrap_or_else(PoisonError::into_inner);
        *loading == Some(thread::current().id())
    }

    fn load(&self) -> Result<T> {
        tracing::debug!("Resolving configuration section '{}'", self.section_name);

        let section = self.sections.section(&self.section_name)?.ok_or_else(|| {
            ConfigError::configuration(format!(
                "No configuration section has been defined having name '{}'.",
                self.section_name
            ))
        })?;

        let settings_path = section
            .as_settings_section()
            .map(|s| s.settings_path().to_string())
            .ok_or_else(|| {
                ConfigError::configuration(format!(
                    "The configuration section '{}' does not specify a settings file.",
                    self.section_name
                ))
            })?;

        load_settings::<T>(
            self.reader.as_ref(),
            &settings_path,
            &self.base_dir,
            Some(self as &dyn Any),
        )
    }
}

impl<T> fmt::Debug for SettingsLoader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsLoader")
            .field("section_name", &self.section_name)
            .field("sections", &self.sections.name())
            .field("reader", &self.reader.name())
            .field("base_dir", &self.base_dir)
            .field("loaded", &self.cell.get().is_some())
            .finish()
    }
}

/// Builder for [`SettingsLoader`].
pub struct SettingsLoaderBuilder<T> {
    section_name: String,
    sections: Option<Arc<dyn SectionLookup>>,
    reader: Option<Arc<dyn GraphReader>>,
    base_dir: BaseDirectory,
    _settings: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> SettingsLoaderBuilder<T> {
    /// Creates a builder for the section named `section_name`.
    pub fn new(section_name: impl Into<String>) -> Self {
        Self {
            section_name: section_name.into(),
            sections: None,
            reader: None,
            base_dir: BaseDirectory::default(),
            _settings: PhantomData,
        }
    }

    /// Sets the section store.
    pub fn with_sections(mut self, sections: Arc<dyn SectionLookup>) -> Self {
        self.sections = Some(sections);
        self
    }

    /// Sets the markup engine.
    pub fn with_reader(mut self, reader: Arc<dyn GraphReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Sets the directory relative settings paths are anchored to.
    pub fn with_base_dir(mut self, base_dir: BaseDirectory) -> Self {
        self.base_dir = base_dir;
        self
    }

    /// Builds the loader. Nothing is loaded until first access.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidArgument`] if the section name is empty
    /// or the section store or reader is missing.
    pub fn build(self) -> Result<SettingsLoader<T>> {
        if self.section_name.trim().is_empty() {
            return Err(ConfigError::invalid_argument(
                "section_name",
                "section name must not be empty",
            ));
        }
        let sections = self.sections.ok_or_else(|| {
            ConfigError::invalid_argument("sections", "a section store is required")
        })?;
        let reader = self
            .reader
            .ok_or_else(|| ConfigError::invalid_argument("reader", "a graph reader is required"))?;

        Ok(SettingsLoader {
            section_name: self.section_name,
            sections,
            reader,
            base_dir: self.base_dir,
            cell: OnceCell::new(),
            loading: Mutex::new(None),
        })
    }
}
