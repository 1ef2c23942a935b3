// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration entries naming a type to instantiate.

use crate::domain::{
    ConfigError, NamedEntry, Result, TypeDescriptor, TypeRegistry, Value, Visibility,
};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

/// A named entry holding a type reference that must resolve to a type
/// providing capability `B`.
///
/// `B` is normally a trait object such as `dyn Storage`. A type provides it
/// when its descriptor declares it with
/// [`TypeBuilder::implements`](crate::domain::TypeBuilder::implements).
///
/// The resolved descriptor is memoized until the reference is reassigned.
///
/// # Examples
///
/// ```
/// use graphcfg::domain::{
///     ProviderEntry, TypeDescriptor, TypeReferenceEntry, TypeRegistry, Visibility,
/// };
///
/// trait Storage {
///     fn kind(&self) -> &'static str;
/// }
///
/// struct DiskStore;
///
/// impl Storage for DiskStore {
///     fn kind(&self) -> &'static str {
///         "disk"
///     }
/// }
///
/// # fn main() -> graphcfg::domain::Result<()> {
/// let types = TypeRegistry::new().with(
///     TypeDescriptor::builder::<DiskStore>("storage.DiskStore")
///         .constructor(Visibility::Public, || DiskStore)
///         .implements::<dyn Storage, _>(|store| Box::new(store))
///         .build(),
/// )?;
///
/// let entry: TypeReferenceEntry<dyn Storage> = TypeReferenceEntry::new("disk", "storage.DiskStore");
/// let store = entry.create_default_instance(&types)?;
/// assert_eq!(store.kind(), "disk");
/// # Ok(())
/// # }
/// ```
pub struct TypeReferenceEntry<B: ?Sized> {
    name: String,
    type_reference: String,
    resolved: Mutex<Option<Arc<TypeDescriptor>>>,
    _capability: PhantomData<fn() -> Box<B>>,
}

impl<B: ?Sized + 'static> TypeReferenceEntry<B> {
    /// Creates an entry.
    pub fn new(name: impl Into<String>, type_reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_reference: type_reference.into(),
            resolved: Mutex::new(None),
            _capability: PhantomData,
        }
    }

    /// Renames the entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidArgument`] if `name` is empty.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::invalid_argument(
                "name",
                "entry name must not be empty",
            ));
        }
        self.name = name;
        Ok(())
    }

    /// The type reference as written in configuration.
    pub fn type_reference(&self) -> &str {
        &self.type_reference
    }

    /// Replaces the type reference and forgets any resolved type.
    pub fn set_type_reference(&mut self, type_reference: impl Into<String>) {
        self.type_reference = type_reference.into();
        *self
            .resolved
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Returns `true` if a resolved type is memoized.
    pub fn is_resolved(&self) -> bool {
        self.resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Resolves the type reference against `types`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Configuration`] if the reference is blank, names
    /// no registered type, or names a type that does not provide `B`.
    pub fn get_instance_type(&self, types: &TypeRegistry) -> Result<Arc<TypeDescriptor>> {
        let mut resolved = self.resolved.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(descriptor) = resolved.as_ref() {
            return Ok(Arc::clone(descriptor));
        }

        let type_name = self.type_reference.trim();
        if type_name.is_empty() {
            return Err(ConfigError::configuration(format!(
                "The type is not specified in configuration element with name '{}'.",
                self.name
            )));
        }

        let descriptor = types.get(type_name).ok_or_else(|| {
            ConfigError::configuration(format!(
                "The type '{}' specified in configuration element with name '{}' is invalid.",
                type_name, self.name
            ))
        })?;

        if !descriptor.satisfies::<B>() {
            return Err(ConfigError::configuration(format!(
                "The type '{}' specified in configuration element with name '{}' does not implement '{}'.",
                type_name,
                self.name,
                std::any::type_name::<B>()
            )));
        }

        tracing::debug!(
            "Resolved type '{}' for configuration element '{}'",
            type_name,
            self.name
        );
        *resolved = Some(Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Instantiates the referenced type through a public constructor taking
    /// `args.len()` arguments.
    ///
    /// # Errors
    ///
    /// Resolution failures are [`ConfigError::Configuration`]. A missing
    /// constructor or a failing factory is reported as-is, typically as
    /// [`ConfigError::Construction`].
    pub fn create_instance(&self, types: &TypeRegistry, args: Vec<Value>) -> Result<Box<B>> {
        let descriptor = self.get_instance_type(types)?;

        let constructor = descriptor
            .constructors()
            .iter()
            .find(|c| c.visibility() == Visibility::Public && c.arity() == args.len())
            .ok_or_else(|| ConfigError::Construction {
                type_name: descriptor.full_name().to_string(),
                message: format!("no public constructor takes {} argument(s)", args.len()),
            })?;

        let object = constructor.invoke(args)?;
        descriptor.cast::<B>(object)
    }
}

impl<B: ?Sized> NamedEntry for TypeReferenceEntry<B> {
    fn name(&self) -> &str {
        &self.name
    }
}

impl<B: ?Sized> Clone for TypeReferenceEntry<B> {
    fn clone(&self) -> Self {
        let resolved = self
            .resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Self {
            name: self.name.clone(),
            type_reference: self.type_reference.clone(),
            resolved: Mutex::new(resolved),
            _capability: PhantomData,
        }
    }
}

impl<B: ?Sized> fmt::Debug for TypeReferenceEntry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeReferenceEntry")
            .field("name", &self.name)
            .field("type_reference", &self.type_reference)
            .finish()
    }
}

#[derive(Deserialize)]
struct RawTypeReference {
    name: String,
    #[serde(rename = "type", default)]
    type_reference: String,
}

impl<'de, B: ?Sized + 'static> Deserialize<'de> for TypeReferenceEntry<B> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawTypeReference::deserialize(deserializer)?;
        Ok(Self::new(raw.name, raw.type_reference))
    }
}

/// A provider entry: something that names a type providing `B` and knows the
/// arguments for its default instance.
///
/// [`TypeReferenceEntry`] implements it with no default arguments. Entry types
/// wrapping a `TypeReferenceEntry` override
/// [`default_instance_args`](Self::default_instance_args) to feed their own
/// settings to the provider's constructor.
pub trait ProviderEntry<B: ?Sized + 'static>: NamedEntry {
    /// The underlying type reference.
    fn type_entry(&self) -> &TypeReferenceEntry<B>;

    /// Arguments used by [`create_default_instance`](Self::create_default_instance).
    fn default_instance_args(&self) -> Vec<Value> {
        Vec::new()
    }

    /// Instantiates the provider with [`default_instance_args`](Self::default_instance_args).
    fn create_default_instance(&self, types: &TypeRegistry) -> Result<Box<B>> {
        self.type_entry()
            .create_instance(types, self.default_instance_args())
    }
}

impl<B: ?Sized + 'static> ProviderEntry<B> for TypeReferenceEntry<B> {
    fn type_entry(&self) -> &TypeReferenceEntry<B> {
        self
    }
}
