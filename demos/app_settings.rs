// SPDX-License-Identifier: MIT OR Apache-2.0

//! Section-driven settings loading example.
//!
//! This example demonstrates:
//! - Registering settings types with private constructors and setters
//! - Locating a settings file through a named section in a YAML file
//! - Lazily loading the settings object graph with the relaxed schema
//! - Post-load notification with the loader as sender
//! - Instantiating named providers from a provider section
//!
//! To run this example:
//! ```bash
//! RUST_LOG=debug cargo run --example app_settings --features yaml
//! ```

use graphcfg::adapters::COLLECTION_INVOKER_METHOD;
use graphcfg::prelude::*;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Default)]
struct AppSettings {
    retry_count: u32,
    mirrors: Vec<String>,
    loaded_by_loader: bool,
}

impl LoadListener for AppSettings {
    fn on_post_load(&mut self, sender: Option<&dyn Any>) {
        self.loaded_by_loader = sender.is_some_and(|s| s.is::<SettingsLoader<AppSettings>>());
    }
}

trait Notifier {
    fn notify(&self, message: &str) -> String;
}

struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) -> String {
        format!("[console] {}", message)
    }
}

struct MailNotifier;

impl Notifier for MailNotifier {
    fn notify(&self, message: &str) -> String {
        format!("[mail] {}", message)
    }
}

const SECTIONS: &str = r#"
app-settings:
  settings_path: settings.cfg.xml

notifiers:
  providers:
    - name: console
      type: demo.ConsoleNotifier
    - name: mail
      type: demo.MailNotifier
"#;

const SETTINGS: &str = r#"<AppSettings xmlns="clr-namespace:demo"
             xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml"
             RetryCount="5">
  <x:String>https://mirror-a.example.org</x:String>
  <x:String>https://mirror-b.example.org</x:String>
</AppSettings>"#;

fn register_types() -> Result<TypeRegistry> {
    TypeRegistry::new()
        .with(
            TypeDescriptor::builder::<AppSettings>("demo.AppSettings")
                .constructor(Visibility::Private, AppSettings::default)
                .setter("RetryCount", Visibility::Private, |s: &mut AppSettings, v: u32| {
                    s.retry_count = v
                })
                .method(COLLECTION_INVOKER_METHOD, Visibility::Private, |s: &mut AppSettings, v: String| {
                    s.mirrors.push(v)
                })
                .load_listener()
                .build(),
        )?
        .with(
            TypeDescriptor::builder::<ConsoleNotifier>("demo.ConsoleNotifier")
                .constructor(Visibility::Public, || ConsoleNotifier)
                .implements::<dyn Notifier, _>(|n| Box::new(n))
                .build(),
        )?
        .with(
            TypeDescriptor::builder::<MailNotifier>("demo.MailNotifier")
                .constructor(Visibility::Public, || MailNotifier)
                .implements::<dyn Notifier, _>(|n| Box::new(n))
                .build(),
        )
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt::init();

    println!("=== graphcfg: Section-Driven Settings ===\n");

    // Write the section file and the settings file to a scratch directory
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("sections.yaml"), SECTIONS)?;
    std::fs::write(dir.path().join("settings.cfg.xml"), SETTINGS)?;

    let types = Arc::new(register_types()?);
    let sections = Arc::new(YamlSectionSource::from_file(dir.path().join("sections.yaml"))?);
    let schema = RelaxedSchemaContext::new().with_collection_invoker(COLLECTION_INVOKER_METHOD);
    let reader = XmlGraphReader::with_schema(Arc::clone(&types), Arc::new(schema));

    println!("--- Example 1: Lazy Settings ---");
    let loader = SettingsLoader::<AppSettings>::builder("app-settings")
        .with_sections(sections.clone())
        .with_reader(Arc::new(reader))
        .with_base_dir(BaseDirectory::Fixed(dir.path().to_path_buf()))
        .build()?;
    println!("State before access: {:?}", loader.state());

    let settings = loader.settings()?;
    println!("✓ RetryCount: {}", settings.retry_count);
    println!("✓ Mirrors: {:?}", settings.mirrors);
    println!("✓ Notified by loader: {}", settings.loaded_by_loader);
    println!("State after access: {:?}\n", loader.state());

    println!("--- Example 2: Providers ---");
    let notifiers = sections.provider_section::<dyn Notifier, TypeReferenceEntry<dyn Notifier>>("notifiers")?;
    for (name, notifier) in notifiers.create_all(&types)? {
        println!("✓ {}: {}", name, notifier.notify("settings loaded"));
    }

    println!("\n--- Example 3: Missing Section ---");
    let missing = SettingsLoader::<AppSettings>::builder("other-settings")
        .with_sections(sections)
        .with_reader(Arc::new(XmlGraphReader::relaxed(types)))
        .build()?;
    match missing.settings() {
        Ok(_) => println!("✗ unexpectedly loaded"),
        Err(e) => println!("✓ {}", e),
    }

    Ok(())
}
