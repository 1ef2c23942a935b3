// SPDX-License-Identifier: MIT OR Apache-2.0

//! Introspection policy trait definition.
//!
//! A [`SchemaContext`] is consulted by the markup engine whenever it needs to
//! construct a type, find a member, or add an item to a collection. Swapping
//! the context changes which constructors, accessors and methods the engine
//! may use, without touching the engine itself.

use crate::domain::{ConstructorInfo, MethodInfo, PropertyInfo, TypeDescriptor};

/// A property as seen through a [`SchemaContext`].
///
/// The flags describe what the engine is allowed to do with the property, which
/// need not match the declared visibility of its accessors.
#[derive(Debug, Clone, Copy)]
pub struct MemberDescriptor<'a> {
    property: &'a PropertyInfo,
    is_write_public: bool,
    is_read_public: bool,
    is_read_only: bool,
}

impl<'a> MemberDescriptor<'a> {
    /// Wraps a property with the flags computed by a context.
    pub fn new(
        property: &'a PropertyInfo,
        is_write_public: bool,
        is_read_public: bool,
        is_read_only: bool,
    ) -> Self {
        Self {
            property,
            is_write_public,
            is_read_public,
            is_read_only,
        }
    }

    /// The underlying property.
    pub fn property(&self) -> &'a PropertyInfo {
        self.property
    }

    /// The member name.
    pub fn name(&self) -> &'a str {
        self.property.name()
    }

    /// The engine may write the member.
    pub fn is_write_public(&self) -> bool {
        self.is_write_public
    }

    /// The engine may read the member.
    pub fn is_read_public(&self) -> bool {
        self.is_read_public
    }

    /// The member cannot be assigned at all.
    pub fn is_read_only(&self) -> bool {
        self.is_read_only
    }
}

/// The introspection policy used by the markup engine.
///
/// Contexts are shared between threads and may keep per-instance caches, but
/// must not share state between instances.
pub trait SchemaContext: Send + Sync {
    /// Name of the policy, for logging.
    fn name(&self) -> &str;

    /// The constructor used when the markup supplies no arguments.
    fn default_constructor<'a>(&self, ty: &'a TypeDescriptor) -> Option<&'a ConstructorInfo>;

    /// The constructor used for `arity` markup arguments.
    ///
    /// Defaults to a public constructor with that many parameters.
    fn argument_constructor<'a>(
        &self,
        ty: &'a TypeDescriptor,
        arity: usize,
    ) -> Option<&'a ConstructorInfo> {
        ty.constructors()
            .iter()
            .find(|c| c.arity() == arity && c.visibility().is_public())
    }

    /// Whether the engine may create instances of `ty`.
    ///
    /// Types that can only be built from markup arguments are constructible;
    /// otherwise a default constructor must be available.
    fn is_constructible(&self, ty: &TypeDescriptor) -> bool {
        ty.requires_construction_arguments() || self.default_constructor(ty).is_some()
    }

    /// Looks up a member by name.
    fn member<'a>(&self, ty: &'a TypeDescriptor, name: &str) -> Option<MemberDescriptor<'a>>;

    /// All members the context exposes.
    fn all_members<'a>(&self, ty: &'a TypeDescriptor) -> Vec<MemberDescriptor<'a>>;

    /// The single-argument method used to add collection items, if any.
    fn add_method<'a>(&self, ty: &'a TypeDescriptor) -> Option<&'a MethodInfo>;
}
