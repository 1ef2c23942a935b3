// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures for integration tests.

#![allow(dead_code)]

use graphcfg::adapters::{RelaxedSchemaContext, XmlGraphReader, COLLECTION_INVOKER_METHOD};
use graphcfg::domain::{LoadListener, Result, TypeDescriptor, TypeRegistry, Visibility};
use graphcfg::ports::{GraphReader, LoadedGraph};
use graphcfg::service::SettingsLoader;
use std::any::Any;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Settings with a private constructor and restricted accessors.
#[derive(Debug, Default)]
pub struct AppSettings {
    name: String,
    retry_count: u32,
    endpoints: EndpointList,
    load_count: usize,
    sender: Option<usize>,
    sent_by_loader: bool,
}

impl AppSettings {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints.items
    }

    pub fn load_count(&self) -> usize {
        self.load_count
    }

    /// Address of the post-load sender, if one was passed.
    pub fn sender(&self) -> Option<usize> {
        self.sender
    }

    pub fn sent_by_loader(&self) -> bool {
        self.sent_by_loader
    }
}

impl LoadListener for AppSettings {
    fn on_post_load(&mut self, sender: Option<&dyn Any>) {
        self.load_count += 1;
        self.sender = sender.map(address_of);
        self.sent_by_loader = sender.is_some_and(|s| s.is::<SettingsLoader<AppSettings>>());
    }
}

/// Address of a sender, comparable with [`address_of`] on the original value.
pub fn address_of(sender: &dyn Any) -> usize {
    sender as *const _ as *const () as usize
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Endpoint {
    pub url: String,
    pub weight: u32,
}

/// A collection that only accepts items through a private `AddItem`.
#[derive(Debug, Default)]
pub struct EndpointList {
    items: Vec<Endpoint>,
}

/// Settings without post-load notification.
#[derive(Debug, Default)]
pub struct PlainSettings {
    pub level: String,
}

pub trait Store: Send + Sync {
    fn kind(&self) -> &'static str;
}

#[derive(Debug, Default)]
pub struct DiskStore;

impl Store for DiskStore {
    fn kind(&self) -> &'static str {
        "disk"
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore;

impl Store for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }
}

#[derive(Debug, Default)]
pub struct Clock;

/// Registry holding every fixture type.
pub fn types() -> Arc<TypeRegistry> {
    let registry = TypeRegistry::new()
        .with(
            TypeDescriptor::builder::<AppSettings>("demo.AppSettings")
                .constructor(Visibility::Private, AppSettings::default)
                .getter("Name", Visibility::Public, |s: &AppSettings| s.name.clone())
                .setter("Name", Visibility::Private, |s: &mut AppSettings, v: String| s.name = v)
                .getter("RetryCount", Visibility::Private, |s: &AppSettings| s.retry_count)
                .setter("RetryCount", Visibility::Private, |s: &mut AppSettings, v: u32| {
                    s.retry_count = v
                })
                .object_setter("Endpoints", Visibility::Private, |s: &mut AppSettings, v: EndpointList| {
                    s.endpoints = v
                })
                .load_listener()
                .build(),
        )
        .and_then(|r| {
            r.with(
                TypeDescriptor::builder::<Endpoint>("demo.Endpoint")
                    .constructor(Visibility::Public, Endpoint::default)
                    .getter("Url", Visibility::Public, |e: &Endpoint| e.url.clone())
                    .setter("Url", Visibility::Public, |e: &mut Endpoint, v: String| e.url = v)
                    .setter("Weight", Visibility::Internal, |e: &mut Endpoint, v: u32| e.weight = v)
                    .build(),
            )
        })
        .and_then(|r| {
            r.with(
                TypeDescriptor::builder::<EndpointList>("demo.EndpointList")
                    .constructor(Visibility::Private, EndpointList::default)
                    .method(COLLECTION_INVOKER_METHOD, Visibility::Private, |l: &mut EndpointList, e: Endpoint| {
                        l.items.push(e)
                    })
                    .build(),
            )
        })
        .and_then(|r| {
            r.with(
                TypeDescriptor::builder::<PlainSettings>("demo.PlainSettings")
                    .constructor(Visibility::Public, PlainSettings::default)
                    .setter("Level", Visibility::Public, |s: &mut PlainSettings, v: String| s.level = v)
                    .build(),
            )
        })
        .and_then(|r| {
            r.with(
                TypeDescriptor::builder::<DiskStore>("storage.DiskStore")
                    .constructor(Visibility::Public, || DiskStore)
                    .implements::<dyn Store, _>(|s| Box::new(s))
                    .build(),
            )
        })
        .and_then(|r| {
            r.with(
                TypeDescriptor::builder::<MemoryStore>("storage.MemoryStore")
                    .constructor(Visibility::Public, || MemoryStore)
                    .implements::<dyn Store, _>(|s| Box::new(s))
                    .build(),
            )
        })
        .and_then(|r| {
            r.with(
                TypeDescriptor::builder::<Clock>("storage.Clock")
                    .constructor(Visibility::Public, || Clock)
                    .build(),
            )
        })
        .expect("fixture types register");
    Arc::new(registry)
}

/// The relaxed reader with the collection invoker enabled.
pub fn relaxed_reader() -> XmlGraphReader {
    XmlGraphReader::with_schema(
        types(),
        Arc::new(RelaxedSchemaContext::new().with_collection_invoker(COLLECTION_INVOKER_METHOD)),
    )
}

pub const APP_SETTINGS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<AppSettings xmlns="clr-namespace:demo"
             xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml"
             Name="orders" RetryCount="3">
  <AppSettings.Endpoints>
    <EndpointList>
      <Endpoint Url="https://a.example.org" Weight="2" />
      <Endpoint Url="https://b.example.org" />
    </EndpointList>
  </AppSettings.Endpoints>
</AppSettings>"#;

/// Writes `content` to `name` inside `dir`.
pub fn write_file(dir: &TempDir, name: &str, content: &str) {
    let mut file = std::fs::File::create(dir.path().join(name)).expect("create fixture file");
    file.write_all(content.as_bytes()).expect("write fixture file");
}

/// A reader that counts how often it is asked to read a file.
pub struct CountingReader<R> {
    inner: R,
    reads: AtomicUsize,
}

impl<R: GraphReader> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl<R: GraphReader> GraphReader for CountingReader<R> {
    fn name(&self) -> &str {
        "counting"
    }

    fn supported_extensions(&self) -> &[&str] {
        self.inner.supported_extensions()
    }

    fn read_str(&self, content: &str) -> Result<LoadedGraph> {
        self.inner.read_str(content)
    }

    fn read_file(&self, path: &Path) -> Result<LoadedGraph> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        // Widen the window in which concurrent callers can race the load.
        std::thread::sleep(std::time::Duration::from_millis(20));
        self.inner.read_file(path)
    }
}
