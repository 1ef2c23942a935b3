// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for provider sections read from a YAML section file.

#![cfg(feature = "yaml")]

mod common;

use common::{relaxed_reader, types, write_file, AppSettings, Store, APP_SETTINGS};
use graphcfg::adapters::YamlSectionSource;
use graphcfg::domain::{ConfigError, ProviderSection, TypeReferenceEntry};
use graphcfg::service::{BaseDirectory, SettingsLoader};
use std::sync::Arc;
use tempfile::TempDir;

const SECTIONS: &str = r#"
app-settings:
  settings_path: settings.cfg.xml

stores:
  providers:
    - name: primary
      type: storage.DiskStore
    - name: cache
      type: storage.MemoryStore

broken-stores:
  providers:
    - name: clock
      type: storage.Clock
    - name: missing
      type: storage.Missing
    - name: blank
"#;

fn store_section(sections: &YamlSectionSource, name: &str) -> ProviderSection<dyn Store> {
    sections
        .provider_section::<dyn Store, TypeReferenceEntry<dyn Store>>(name)
        .unwrap()
}

#[test]
fn test_providers_are_created_by_name() {
    let sections = YamlSectionSource::from_str(SECTIONS).unwrap();
    let stores = store_section(&sections, "stores");
    let types = types();

    assert_eq!(stores.name(), "stores");
    assert_eq!(stores.providers().len(), 2);
    assert_eq!(stores.create_provider("primary", &types).unwrap().kind(), "disk");
    assert_eq!(stores.create_provider("cache", &types).unwrap().kind(), "memory");

    let all = stores.create_all(&types).unwrap();
    let kinds: Vec<_> = all.iter().map(|(name, s)| (name.as_str(), s.kind())).collect();
    assert_eq!(kinds, vec![("primary", "disk"), ("cache", "memory")]);
}

#[test]
fn test_bad_references_are_configuration_errors() {
    let sections = YamlSectionSource::from_str(SECTIONS).unwrap();
    let broken = store_section(&sections, "broken-stores");
    let types = types();

    for (name, expected) in [
        ("clock", "does not implement"),
        ("missing", "is invalid"),
        ("blank", "The type is not specified"),
    ] {
        let Err(err) = broken.create_provider(name, &types) else {
            panic!("provider '{}' should not resolve", name);
        };
        assert!(err.is_configuration(), "{}: {}", name, err);
        assert!(err.to_string().contains(expected), "{}: {}", name, err);
        assert!(err.to_string().contains(name));
    }

    let Err(err) = broken.create_provider("unknown", &types) else {
        panic!("unknown provider should not resolve");
    };
    assert!(err.is_configuration());
}

#[test]
fn test_resolution_is_memoized_per_entry() {
    let sections = YamlSectionSource::from_str(SECTIONS).unwrap();
    let stores = store_section(&sections, "stores");
    let types = types();

    let entry = stores.providers().get_by_name("primary").unwrap();
    assert!(!entry.is_resolved());
    let first = entry.get_instance_type(&types).unwrap();
    assert!(entry.is_resolved());
    let second = entry.get_instance_type(&types).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_duplicate_provider_names_are_rejected() {
    let yaml = r#"
stores:
  providers:
    - name: primary
      type: storage.DiskStore
    - name: primary
      type: storage.MemoryStore
"#;
    let sections = YamlSectionSource::from_str(yaml).unwrap();
    let result = sections.provider_section::<dyn Store, TypeReferenceEntry<dyn Store>>("stores");
    let Err(err) = result else {
        panic!("duplicate provider names should be rejected");
    };
    assert!(err.to_string().contains("primary"));
}

#[test]
fn test_yaml_file_drives_settings_loader() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "settings.cfg.xml", APP_SETTINGS);
    write_file(&dir, "sections.yaml", SECTIONS);
    let sections = YamlSectionSource::from_file(dir.path().join("sections.yaml")).unwrap();

    let loader = SettingsLoader::<AppSettings>::builder("app-settings")
        .with_sections(Arc::new(sections))
        .with_reader(Arc::new(relaxed_reader()))
        .with_base_dir(BaseDirectory::Fixed(dir.path().to_path_buf()))
        .build()
        .unwrap();

    let settings = loader.settings().unwrap();
    assert_eq!(settings.retry_count(), 3);
    assert_eq!(settings.load_count(), 1);
    assert!(settings.sent_by_loader());
}

#[test]
fn test_provider_section_is_not_a_settings_section() {
    let dir = TempDir::new().unwrap();
    let sections = YamlSectionSource::from_str(SECTIONS).unwrap();

    let loader = SettingsLoader::<AppSettings>::builder("stores")
        .with_sections(Arc::new(sections))
        .with_reader(Arc::new(relaxed_reader()))
        .with_base_dir(BaseDirectory::Fixed(dir.path().to_path_buf()))
        .build()
        .unwrap();

    let err = loader.settings().unwrap_err();
    assert!(matches!(err.root(), ConfigError::Configuration { .. }));
}
