// SPDX-License-Identifier: MIT OR Apache-2.0

//! Visibility-relaxed introspection policy.
//!
//! This policy lets the markup engine build settings objects whose
//! constructors and setters are deliberately hidden from ordinary callers.
//! Every rule of [`DefaultSchemaContext`] is kept except visibility:
//!
//! | Query | Relaxed answer |
//! |-------|----------------|
//! | constructible | a no-argument constructor of any visibility exists |
//! | member lookup | properties of any visibility |
//! | write-public | the property has a setter |
//! | read-only | the property has no setter |
//! | read-public | the property has a public getter |
//!
//! Reading stays restricted on purpose: a property with a private getter and
//! a private setter can be populated from markup but not observed through
//! [`XmlGraphReader::read_member`](crate::adapters::XmlGraphReader::read_member).

use crate::adapters::default_schema::DefaultSchemaContext;
use crate::domain::{ConstructorInfo, MethodInfo, PropertyInfo, TypeDescriptor};
use crate::ports::{MemberDescriptor, SchemaContext};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Conventional name of a restricted collection mutation method.
pub const COLLECTION_INVOKER_METHOD: &str = "AddItem";

/// Introspection policy that ignores member visibility.
///
/// The collection invoker is off by default. When enabled with
/// [`with_collection_invoker`](Self::with_collection_invoker), collection
/// items are added through a single-argument method of the given name,
/// whatever its visibility, before falling back to the default `Add`.
///
/// # Examples
///
/// ```
/// use graphcfg::adapters::RelaxedSchemaContext;
/// use graphcfg::domain::{TypeDescriptor, Visibility};
/// use graphcfg::ports::SchemaContext;
///
/// #[derive(Default)]
/// struct Limits {
///     max: u32,
/// }
///
/// let ty = TypeDescriptor::builder::<Limits>("demo.Limits")
///     .constructor(Visibility::Private, Limits::default)
///     .getter("Max", Visibility::Private, |l: &Limits| l.max)
///     .setter("Max", Visibility::Private, |l: &mut Limits, v: u32| l.max = v)
///     .build();
///
/// let context = RelaxedSchemaContext::new();
/// assert!(context.is_constructible(&ty));
///
/// let max = context.member(&ty, "Max").unwrap();
/// assert!(max.is_write_public());
/// assert!(!max.is_read_public());
/// ```
#[derive(Debug, Default)]
pub struct RelaxedSchemaContext {
    collection_invoker: Option<String>,
    fallback: DefaultSchemaContext,
    add_methods: Mutex<HashMap<u64, Option<usize>>>,
}

impl RelaxedSchemaContext {
    /// Creates the policy with the collection invoker disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the collection invoker for methods named `method`.
    ///
    /// The usual name is [`COLLECTION_INVOKER_METHOD`].
    pub fn with_collection_invoker(mut self, method: impl Into<String>) -> Self {
        self.collection_invoker = Some(method.into());
        self
    }

    /// The method name used by the collection invoker, if enabled.
    pub fn collection_invoker(&self) -> Option<&str> {
        self.collection_invoker.as_deref()
    }

    fn describe(property: &PropertyInfo) -> MemberDescriptor<'_> {
        let writable = property.can_write();
        let read_public = property
            .getter_visibility()
            .is_some_and(|v| v.is_public());
        MemberDescriptor::new(property, writable, read_public, !writable)
    }

    fn resolve_add_method(&self, ty: &TypeDescriptor) -> Option<usize> {
        let custom = self.collection_invoker.as_deref().and_then(|name| {
            ty.methods()
                .iter()
                .position(|m| m.name() == name && m.arity() == 1)
        });

        custom.or_else(|| {
            let fallback = self.fallback.add_method(ty)?;
            ty.methods()
                .iter()
                .position(|m| std::ptr::eq(m, fallback))
        })
    }
}

impl SchemaContext for RelaxedSchemaContext {
    fn name(&self) -> &str {
        "relaxed"
    }

    fn default_constructor<'a>(&self, ty: &'a TypeDescriptor) -> Option<&'a ConstructorInfo> {
        ty.no_arg_constructor()
    }

    fn member<'a>(&self, ty: &'a TypeDescriptor, name: &str) -> Option<MemberDescriptor<'a>> {
        ty.property(name).map(Self::describe)
    }

    fn all_members<'a>(&self, ty: &'a TypeDescriptor) -> Vec<MemberDescriptor<'a>> {
        ty.properties().iter().map(Self::describe).collect()
    }

    fn add_method<'a>(&self, ty: &'a TypeDescriptor) -> Option<&'a MethodInfo> {
        let mut cache = self
            .add_methods
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let index = *cache.entry(ty.instance_id()).or_insert_with(|| {
            let index = self.resolve_add_method(ty);
            tracing::debug!(
                "Resolved collection add method for '{}': {:?}",
                ty.full_name(),
                index.map(|i| ty.methods()[i].name())
            );
            index
        });

        index.and_then(|i| ty.methods().get(i))
    }
}
