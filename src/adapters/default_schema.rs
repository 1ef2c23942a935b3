// SPDX-License-Identifier: MIT OR Apache-2.0

//! The engine's default introspection policy: public members only.

use crate::domain::{ConstructorInfo, MethodInfo, PropertyInfo, TypeDescriptor};
use crate::ports::{MemberDescriptor, SchemaContext};

/// Name of the conventional collection method used by the default policy.
pub const DEFAULT_ADD_METHOD: &str = "Add";

/// Introspection policy that only sees public constructors and accessors.
///
/// - A type is constructible through a public no-argument constructor.
/// - A property is visible when at least one accessor is public. It is
///   writable through a public setter and readable through a public getter.
/// - Collection items are added through a public single-argument `Add`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSchemaContext;

impl DefaultSchemaContext {
    /// Creates the default policy.
    pub fn new() -> Self {
        DefaultSchemaContext
    }

    fn describe(property: &PropertyInfo) -> MemberDescriptor<'_> {
        let write_public = property.setter_visibility().is_some_and(|v| v.is_public());
        let read_public = property.getter_visibility().is_some_and(|v| v.is_public());
        MemberDescriptor::new(property, write_public, read_public, !write_public)
    }
}

impl SchemaContext for DefaultSchemaContext {
    fn name(&self) -> &str {
        "default"
    }

    fn default_constructor<'a>(&self, ty: &'a TypeDescriptor) -> Option<&'a ConstructorInfo> {
        ty.constructors()
            .iter()
            .find(|c| c.arity() == 0 && c.visibility().is_public())
    }

    fn member<'a>(&self, ty: &'a TypeDescriptor, name: &str) -> Option<MemberDescriptor<'a>> {
        ty.property(name)
            .filter(|p| p.has_public_accessor())
            .map(Self::describe)
    }

    fn all_members<'a>(&self, ty: &'a TypeDescriptor) -> Vec<MemberDescriptor<'a>> {
        ty.properties()
            .iter()
            .filter(|p| p.has_public_accessor())
            .map(Self::describe)
            .collect()
    }

    fn add_method<'a>(&self, ty: &'a TypeDescriptor) -> Option<&'a MethodInfo> {
        ty.method(DEFAULT_ADD_METHOD, 1)
            .filter(|m| m.visibility().is_public())
    }
}
