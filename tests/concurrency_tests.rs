// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests for lazy loading under concurrent access.
//!
//! These tests verify that racing callers share one load, one settings
//! instance and one post-load notification, and that failures stay cached.

mod common;

use common::{relaxed_reader, write_file, AppSettings, CountingReader, APP_SETTINGS};
use graphcfg::adapters::MemorySectionSource;
use graphcfg::domain::Result;
use graphcfg::ports::{ConfigSection, SectionLookup};
use graphcfg::service::{BaseDirectory, LoadState, SettingsLoader};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

const THREADS: usize = 8;

/// A section store that counts lookups.
struct CountingSections {
    inner: MemorySectionSource,
    lookups: AtomicUsize,
}

impl CountingSections {
    fn new(inner: MemorySectionSource) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl SectionLookup for CountingSections {
    fn name(&self) -> &str {
        "counting"
    }

    fn section(&self, name: &str) -> Result<Option<Arc<dyn ConfigSection>>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.section(name)
    }

    fn section_names(&self) -> Result<Vec<String>> {
        self.inner.section_names()
    }
}

fn race<T, F>(loader: Arc<SettingsLoader<AppSettings>>, access: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(&SettingsLoader<AppSettings>) -> T + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(THREADS));
    let access = Arc::new(access);

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let loader = Arc::clone(&loader);
            let barrier = Arc::clone(&barrier);
            let access = Arc::clone(&access);
            thread::spawn(move || {
                barrier.wait();
                access(&loader)
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|h| h.join().expect("worker thread panicked"))
        .collect()
}

#[test]
fn test_concurrent_callers_share_one_load() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "settings.cfg.xml", APP_SETTINGS);
    let sections = MemorySectionSource::new()
        .with_settings_path("app-settings", "settings.cfg.xml")
        .unwrap();
    let reader = Arc::new(CountingReader::new(relaxed_reader()));

    let loader = Arc::new(
        SettingsLoader::<AppSettings>::builder("app-settings")
            .with_sections(Arc::new(sections))
            .with_reader(reader.clone())
            .with_base_dir(BaseDirectory::Fixed(dir.path().to_path_buf()))
            .build()
            .unwrap(),
    );

    let results = race(Arc::clone(&loader), |loader| loader.settings().unwrap());

    assert_eq!(reader.reads(), 1);
    let first = &results[0];
    assert!(results.iter().all(|s| Arc::ptr_eq(s, first)));
    assert_eq!(first.load_count(), 1);
    assert_eq!(loader.state(), LoadState::Loaded);
}

#[test]
fn test_concurrent_failure_is_sticky() {
    let sections = Arc::new(CountingSections::new(MemorySectionSource::new()));
    let reader = Arc::new(CountingReader::new(relaxed_reader()));

    let loader = Arc::new(
        SettingsLoader::<AppSettings>::builder("app-settings")
            .with_sections(sections.clone())
            .with_reader(reader.clone())
            .build()
            .unwrap(),
    );

    let messages = race(Arc::clone(&loader), |loader| {
        let err = loader.settings().unwrap_err();
        assert!(err.is_configuration());
        err.to_string()
    });

    assert_eq!(sections.lookups(), 1);
    assert_eq!(reader.reads(), 0);
    assert!(messages.iter().all(|m| m == &messages[0]));
    assert_eq!(loader.state(), LoadState::Failed);

    // Defining the section afterwards does not trigger a retry.
    sections.inner.insert(Arc::new(
        graphcfg::domain::SettingsFileSection::new("app-settings", "settings.cfg.xml").unwrap(),
    ));
    assert!(loader.settings().is_err());
    assert_eq!(sections.lookups(), 1);
}

#[test]
fn test_loader_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SettingsLoader<AppSettings>>();
}
