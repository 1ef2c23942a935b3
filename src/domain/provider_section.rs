// SPDX-License-Identifier: MIT OR Apache-2.0

//! A configuration section listing named, instantiable providers.

use crate::domain::{
    ConfigError, NamedEntry, NamedEntryCollection, ProviderEntry, Result, TypeRegistry,
};
use crate::ports::ConfigSection;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

/// A named section holding provider entries whose types provide `B`.
///
/// `E` defaults to the plain
/// [`TypeReferenceEntry`](crate::domain::TypeReferenceEntry); applications
/// with per-provider settings use their own entry type implementing
/// [`ProviderEntry`].
///
/// # Examples
///
/// ```
/// use graphcfg::domain::{
///     NamedEntryCollection, ProviderSection, TypeDescriptor, TypeReferenceEntry, TypeRegistry,
///     Visibility,
/// };
///
/// trait Codec {
///     fn id(&self) -> u8;
/// }
///
/// struct Gzip;
///
/// impl Codec for Gzip {
///     fn id(&self) -> u8 {
///         1
///     }
/// }
///
/// # fn main() -> graphcfg::domain::Result<()> {
/// let types = TypeRegistry::new().with(
///     TypeDescriptor::builder::<Gzip>("codecs.Gzip")
///         .constructor(Visibility::Public, || Gzip)
///         .implements::<dyn Codec, _>(|codec| Box::new(codec))
///         .build(),
/// )?;
///
/// let mut section: ProviderSection<dyn Codec> = ProviderSection::new("codecs");
/// section.providers_mut().add(TypeReferenceEntry::new("gzip", "codecs.Gzip"))?;
///
/// let codec = section.create_provider("gzip", &types)?;
/// assert_eq!(codec.id(), 1);
/// # Ok(())
/// # }
/// ```
pub struct ProviderSection<B: ?Sized + 'static, E = crate::domain::TypeReferenceEntry<B>> {
    name: String,
    providers: NamedEntryCollection<E>,
    _capability: PhantomData<fn() -> Box<B>>,
}

impl<B, E> ProviderSection<B, E>
where
    B: ?Sized + 'static,
    E: ProviderEntry<B>,
{
    /// Creates an empty section.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_providers(name, NamedEntryCollection::new())
    }

    /// Creates a section holding `providers`.
    pub fn with_providers(name: impl Into<String>, providers: NamedEntryCollection<E>) -> Self {
        Self {
            name: name.into(),
            providers,
            _capability: PhantomData,
        }
    }

    /// The section name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The provider entries.
    pub fn providers(&self) -> &NamedEntryCollection<E> {
        &self.providers
    }

    /// Mutable access to the provider entries.
    pub fn providers_mut(&mut self) -> &mut NamedEntryCollection<E> {
        &mut self.providers
    }

    /// Replaces the provider entries.
    pub fn set_providers(&mut self, providers: NamedEntryCollection<E>) {
        self.providers = providers;
    }

    /// Instantiates the provider named `name` with its default arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Configuration`] if no provider has that name,
    /// plus any error from resolving or constructing the provider.
    pub fn create_provider(&self, name: &str, types: &TypeRegistry) -> Result<Box<B>> {
        let entry = self.providers.get_by_name(name).ok_or_else(|| {
            ConfigError::configuration(format!(
                "No provider named '{}' is defined in section '{}'.",
                name, self.name
            ))
        })?;
        entry.create_default_instance(types)
    }

    /// Instantiates every provider, in declaration order.
    pub fn create_all(&self, types: &TypeRegistry) -> Result<Vec<(String, Box<B>)>> {
        self.providers
            .iter()
            .map(|entry| {
                let instance = entry.create_default_instance(types)?;
                Ok((entry.name().to_string(), instance))
            })
            .collect()
    }
}

impl<B, E> ConfigSection for ProviderSection<B, E>
where
    B: ?Sized + 'static,
    E: ProviderEntry<B> + Send + Sync + 'static,
{
    fn section_name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<B: ?Sized + 'static, E: fmt::Debug> fmt::Debug for ProviderSection<B, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSection")
            .field("name", &self.name)
            .field("providers", &self.providers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TypeDescriptor, TypeReferenceEntry, Value, Visibility};

    trait Sink: Send {
        fn describe(&self) -> String;
    }

    struct Console {
        prefix: String,
    }

    impl Sink for Console {
        fn describe(&self) -> String {
            format!("console:{}", self.prefix)
        }
    }

    struct Null;

    impl Sink for Null {
        fn describe(&self) -> String {
            "null".to_string()
        }
    }

    fn registry() -> TypeRegistry {
        TypeRegistry::new()
            .with(
                TypeDescriptor::builder::<Console>("sinks.Console")
                    .constructor(Visibility::Public, || Console {
                        prefix: String::new(),
                    })
                    .constructor_with(Visibility::Public, 1, |mut args| {
                        let prefix = args
                            .pop()
                            .and_then(|v| v.downcast::<String>().ok())
                            .unwrap_or_default();
                        Ok(Console { prefix })
                    })
                    .implements::<dyn Sink, _>(|c| Box::new(c))
                    .build(),
            )
            .unwrap()
            .with(
                TypeDescriptor::builder::<Null>("sinks.Null")
                    .constructor(Visibility::Public, || Null)
                    .implements::<dyn Sink, _>(|n| Box::new(n))
                    .build(),
            )
            .unwrap()
    }

    struct PrefixedEntry {
        entry: TypeReferenceEntry<dyn Sink>,
        prefix: String,
    }

    impl NamedEntry for PrefixedEntry {
        fn name(&self) -> &str {
            self.entry.name()
        }
    }

    impl ProviderEntry<dyn Sink> for PrefixedEntry {
        fn type_entry(&self) -> &TypeReferenceEntry<dyn Sink> {
            &self.entry
        }

        fn default_instance_args(&self) -> Vec<Value> {
            vec![Value::text(self.prefix.clone())]
        }
    }

    #[test]
    fn test_create_provider() {
        let types = registry();
        let mut section: ProviderSection<dyn Sink> = ProviderSection::new("sinks");
        section
            .providers_mut()
            .add(TypeReferenceEntry::new("console", "sinks.Console"))
            .unwrap();

        let sink = section.create_provider("console", &types).unwrap();
        assert_eq!(sink.describe(), "console:");
        assert_eq!(section.name(), "sinks");
    }

    #[test]
    fn test_unknown_provider_is_configuration_error() {
        let types = registry();
        let section: ProviderSection<dyn Sink> = ProviderSection::new("sinks");
        let Err(err) = section.create_provider("missing", &types) else {
            panic!("unknown provider must not resolve");
        };
        assert!(err.is_configuration());
        assert!(err.to_string().contains("'missing'"));
    }

    #[test]
    fn test_create_all_in_order() {
        let types = registry();
        let providers = NamedEntryCollection::from_entries(vec![
            TypeReferenceEntry::new("b", "sinks.Null"),
            TypeReferenceEntry::new("a", "sinks.Console"),
        ])
        .unwrap();
        let section: ProviderSection<dyn Sink> = ProviderSection::with_providers("sinks", providers);

        let all = section.create_all(&types).unwrap();
        let names: Vec<_> = all.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(all[0].1.describe(), "null");
    }

    #[test]
    fn test_custom_entry_default_args() {
        let types = registry();
        let mut section: ProviderSection<dyn Sink, PrefixedEntry> = ProviderSection::new("sinks");
        section
            .providers_mut()
            .add(PrefixedEntry {
                entry: TypeReferenceEntry::new("console", "sinks.Console"),
                prefix: "app".to_string(),
            })
            .unwrap();

        let sink = section.create_provider("console", &types).unwrap();
        assert_eq!(sink.describe(), "console:app");
    }

    #[test]
    fn test_create_all_stops_on_bad_reference() {
        let types = registry();
        let mut section: ProviderSection<dyn Sink> = ProviderSection::new("sinks");
        section
            .providers_mut()
            .add(TypeReferenceEntry::new("broken", "sinks.Missing"))
            .unwrap();
        let Err(err) = section.create_all(&types) else {
            panic!("broken reference must not resolve");
        };
        assert!(err.is_configuration());
    }

    #[test]
    fn test_section_as_config_section() {
        let section: ProviderSection<dyn Sink> = ProviderSection::new("sinks");
        let dynamic: &dyn ConfigSection = &section;
        assert_eq!(dynamic.section_name(), "sinks");
        assert!(dynamic.as_settings_section().is_none());
        assert!(dynamic
            .as_any()
            .downcast_ref::<ProviderSection<dyn Sink>>()
            .is_some());
    }
}
