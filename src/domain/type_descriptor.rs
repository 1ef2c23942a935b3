// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime type descriptors.
//!
//! Rust has no open reflection, so every type that can appear in a settings
//! graph or be named by a type reference describes itself with a
//! [`TypeDescriptor`]: its constructors, properties and single-argument
//! methods, each tagged with the [`Visibility`] it was declared with, plus the
//! capabilities (trait objects) it can be converted into.
//!
//! Descriptors are usually built by the type's own module, which is the only
//! place that can reach its private constructors and setters:
//!
//! ```
//! use graphcfg::domain::{TypeDescriptor, Visibility};
//!
//! pub struct Retry {
//!     attempts: u32,
//! }
//!
//! impl Retry {
//!     fn new() -> Self {
//!         Retry { attempts: 1 }
//!     }
//!
//!     pub fn attempts(&self) -> u32 {
//!         self.attempts
//!     }
//!
//!     pub fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::builder::<Retry>("demo.Retry")
//!             .constructor(Visibility::Private, Retry::new)
//!             .getter("Attempts", Visibility::Public, |r: &Retry| r.attempts)
//!             .setter("Attempts", Visibility::Private, |r: &mut Retry, v: u32| r.attempts = v)
//!             .build()
//!     }
//! }
//!
//! let descriptor = Retry::descriptor();
//! assert_eq!(descriptor.short_name(), "Retry");
//! assert!(descriptor.no_arg_constructor().is_some());
//! ```

use crate::domain::{ConfigError, LoadListener, Object, Result, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Factory = Arc<dyn Fn(Vec<Value>) -> Result<Object> + Send + Sync>;
type Getter = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Result<Value> + Send + Sync>;
type Setter = Arc<dyn Fn(&mut (dyn Any + Send + Sync), Value) -> Result<()> + Send + Sync>;
type Invoker = Arc<dyn Fn(&mut (dyn Any + Send + Sync), Vec<Value>) -> Result<()> + Send + Sync>;
type PostLoadHook = Arc<dyn Fn(&mut (dyn Any + Send + Sync), Option<&dyn Any>) + Send + Sync>;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Declared accessibility of a constructor, accessor or method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Usable by anyone.
    Public,
    /// Usable by the type and its derivations.
    Protected,
    /// Usable within the declaring crate.
    Internal,
    /// Usable by the type only.
    Private,
}

impl Visibility {
    /// Returns `true` for [`Visibility::Public`].
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Internal => "internal",
            Visibility::Private => "private",
        };
        f.write_str(text)
    }
}

/// A constructor of a described type.
#[derive(Clone)]
pub struct ConstructorInfo {
    type_name: String,
    visibility: Visibility,
    arity: usize,
    factory: Factory,
}

impl ConstructorInfo {
    /// Declared visibility.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Number of arguments the constructor takes.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Runs the constructor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] when the argument count does not
    /// match, or whatever error the factory itself raises.
    pub fn invoke(&self, args: Vec<Value>) -> Result<Object> {
        if args.len() != self.arity {
            return Err(ConfigError::Construction {
                type_name: self.type_name.clone(),
                message: format!(
                    "constructor takes {} argument(s), {} supplied",
                    self.arity,
                    args.len()
                ),
            });
        }
        (self.factory)(args)
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("visibility", &self.visibility)
            .field("arity", &self.arity)
            .finish()
    }
}

/// A property of a described type. Getter and setter are optional and carry
/// their own visibility.
#[derive(Clone)]
pub struct PropertyInfo {
    type_name: String,
    name: String,
    getter: Option<(Visibility, Getter)>,
    setter: Option<(Visibility, Setter)>,
}

impl PropertyInfo {
    fn new(type_name: &str, name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            name: name.to_string(),
            getter: None,
            setter: None,
        }
    }

    /// The property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the property has a getter of any visibility.
    pub fn can_read(&self) -> bool {
        self.getter.is_some()
    }

    /// Returns `true` if the property has a setter of any visibility.
    pub fn can_write(&self) -> bool {
        self.setter.is_some()
    }

    /// Visibility of the getter, if there is one.
    pub fn getter_visibility(&self) -> Option<Visibility> {
        self.getter.as_ref().map(|(visibility, _)| *visibility)
    }

    /// Visibility of the setter, if there is one.
    pub fn setter_visibility(&self) -> Option<Visibility> {
        self.setter.as_ref().map(|(visibility, _)| *visibility)
    }

    /// Returns `true` if either accessor is public.
    pub fn has_public_accessor(&self) -> bool {
        self.getter_visibility().is_some_and(Visibility::is_public)
            || self.setter_visibility().is_some_and(Visibility::is_public)
    }

    /// Reads the property, ignoring visibility.
    ///
    /// Visibility rules are applied by a [`SchemaContext`](crate::ports::SchemaContext),
    /// not here.
    pub fn get(&self, target: &(dyn Any + Send + Sync)) -> Result<Value> {
        let (_, getter) = self
            .getter
            .as_ref()
            .ok_or_else(|| self.error("property has no getter"))?;
        getter(target)
    }

    /// Writes the property, ignoring visibility.
    pub fn set(&self, target: &mut (dyn Any + Send + Sync), value: Value) -> Result<()> {
        let (_, setter) = self
            .setter
            .as_ref()
            .ok_or_else(|| self.error("property has no setter"))?;
        setter(target, value)
    }

    fn error(&self, message: &str) -> ConfigError {
        member_error(&self.type_name, &self.name, message)
    }
}

impl fmt::Debug for PropertyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyInfo")
            .field("name", &self.name)
            .field("getter", &self.getter_visibility())
            .field("setter", &self.setter_visibility())
            .finish()
    }
}

/// A method of a described type.
#[derive(Clone)]
pub struct MethodInfo {
    type_name: String,
    name: String,
    visibility: Visibility,
    arity: usize,
    invoker: Invoker,
}

impl MethodInfo {
    /// The method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared visibility.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Number of arguments the method takes.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Invokes the method on `target`, ignoring visibility.
    pub fn invoke(&self, target: &mut (dyn Any + Send + Sync), args: Vec<Value>) -> Result<()> {
        if args.len() != self.arity {
            return Err(member_error(
                &self.type_name,
                &self.name,
                &format!(
                    "method takes {} argument(s), {} supplied",
                    self.arity,
                    args.len()
                ),
            ));
        }
        (self.invoker)(target, args)
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Converts a described object into a `Box<B>`.
struct Caster<B: ?Sized>(Box<dyn Fn(Object) -> Result<Box<B>> + Send + Sync>);

struct Capability {
    name: &'static str,
    caster: Box<dyn Any + Send + Sync>,
}

/// Everything the loader knows about one type.
pub struct TypeDescriptor {
    instance_id: u64,
    full_name: String,
    short_name: String,
    type_id: TypeId,
    rust_type_name: &'static str,
    constructors: Vec<ConstructorInfo>,
    properties: Vec<PropertyInfo>,
    methods: Vec<MethodInfo>,
    capabilities: HashMap<TypeId, Capability>,
    post_load: Option<PostLoadHook>,
}

impl TypeDescriptor {
    /// Starts describing `T` under a dot-qualified name such as `demo.AppSettings`.
    pub fn builder<T: Any + Send + Sync>(full_name: impl Into<String>) -> TypeBuilder<T> {
        let full_name = full_name.into();
        let short_name = full_name
            .rsplit('.')
            .next()
            .unwrap_or(full_name.as_str())
            .to_string();

        TypeBuilder {
            descriptor: TypeDescriptor {
                instance_id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
                full_name,
                short_name,
                type_id: TypeId::of::<T>(),
                rust_type_name: std::any::type_name::<T>(),
                constructors: Vec::new(),
                properties: Vec::new(),
                methods: Vec::new(),
                capabilities: HashMap::new(),
                post_load: None,
            },
            _marker: PhantomData,
        }
    }

    /// The dot-qualified name.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// The last segment of the full name.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Identifies this descriptor among all descriptors built in the process.
    ///
    /// Two registries describing the same type under the same name still hold
    /// descriptors with different ids.
    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    /// The Rust `TypeId` of the described type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The Rust type name, for diagnostics.
    pub fn rust_type_name(&self) -> &'static str {
        self.rust_type_name
    }

    /// Returns `true` if this descriptor describes `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// All constructors, in declaration order.
    pub fn constructors(&self) -> &[ConstructorInfo] {
        &self.constructors
    }

    /// The first constructor taking no arguments, of any visibility.
    pub fn no_arg_constructor(&self) -> Option<&ConstructorInfo> {
        self.constructor_with_arity(0)
    }

    /// The first constructor taking `arity` arguments, of any visibility.
    pub fn constructor_with_arity(&self, arity: usize) -> Option<&ConstructorInfo> {
        self.constructors.iter().find(|c| c.arity == arity)
    }

    /// Returns `true` if the type can only be constructed with arguments.
    pub fn requires_construction_arguments(&self) -> bool {
        self.no_arg_constructor().is_none() && self.constructors.iter().any(|c| c.arity > 0)
    }

    /// All properties, in declaration order.
    pub fn properties(&self) -> &[PropertyInfo] {
        &self.properties
    }

    /// Looks up a property by exact name, of any visibility.
    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// All methods, in declaration order.
    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    /// Looks up a method by name and argument count, of any visibility.
    pub fn method(&self, name: &str, arity: usize) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.arity == arity)
    }

    /// Returns `true` if the type can be converted into a `Box<B>`.
    pub fn satisfies<B: ?Sized + 'static>(&self) -> bool {
        self.capabilities.contains_key(&TypeId::of::<B>())
    }

    /// Names of the capabilities the type can be converted into.
    pub fn capabilities(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.capabilities.values().map(|c| c.name)
    }

    /// Converts an instance of the described type into a `Box<B>`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Construction`] if the type does not provide `B`
    /// or `object` is not an instance of the described type.
    pub fn cast<B: ?Sized + 'static>(&self, object: Object) -> Result<Box<B>> {
        let caster = self
            .capabilities
            .get(&TypeId::of::<B>())
            .and_then(|c| c.caster.downcast_ref::<Caster<B>>())
            .ok_or_else(|| ConfigError::Construction {
                type_name: self.full_name.clone(),
                message: format!("type does not provide '{}'", std::any::type_name::<B>()),
            })?;
        (caster.0)(object)
    }

    /// Returns `true` if the type opted into post-load notification.
    pub fn is_load_listener(&self) -> bool {
        self.post_load.is_some()
    }

    /// Invokes the post-load notification on `target` if the type supports it.
    ///
    /// Returns `true` if the notification ran.
    pub fn notify_post_load(
        &self,
        target: &mut (dyn Any + Send + Sync),
        sender: Option<&dyn Any>,
    ) -> bool {
        match &self.post_load {
            Some(hook) => {
                hook(target, sender);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("full_name", &self.full_name)
            .field("rust_type_name", &self.rust_type_name)
            .field("constructors", &self.constructors)
            .field("properties", &self.properties)
            .field("methods", &self.methods)
            .field("load_listener", &self.is_load_listener())
            .finish()
    }
}

/// Fluent builder for a [`TypeDescriptor`] of `T`.
///
/// Getters and setters registered under the same name form one property.
pub struct TypeBuilder<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> TypeBuilder<T> {
    /// Adds a constructor taking no arguments.
    pub fn constructor<F>(mut self, visibility: Visibility, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |_args: Vec<Value>| -> Result<Object> { Ok(Box::new(factory())) });
        self.push_constructor(visibility, 0, factory);
        self
    }

    /// Adds a constructor taking `arity` positional arguments.
    pub fn constructor_with<F>(mut self, visibility: Visibility, arity: usize, factory: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<T> + Send + Sync + 'static,
    {
        let factory: Factory =
            Arc::new(move |args: Vec<Value>| factory(args).map(|value| Box::new(value) as Object));
        self.push_constructor(visibility, arity, factory);
        self
    }

    /// Adds a getter that reports the property as text.
    pub fn getter<V, F>(mut self, name: &str, visibility: Visibility, get: F) -> Self
    where
        V: fmt::Display,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let (type_name, member) = (self.descriptor.full_name.clone(), name.to_string());
        let getter: Getter = Arc::new(move |target: &(dyn Any + Send + Sync)| -> Result<Value> {
            let typed = target
                .downcast_ref::<T>()
                .ok_or_else(|| target_mismatch(&type_name, &member))?;
            Ok(Value::Text(get(typed).to_string()))
        });
        self.property_entry(name).getter = Some((visibility, getter));
        self
    }

    /// Adds a getter that reports the property as an object.
    pub fn object_getter<V, F>(mut self, name: &str, visibility: Visibility, get: F) -> Self
    where
        V: Any + Send + Sync,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let (type_name, member) = (self.descriptor.full_name.clone(), name.to_string());
        let getter: Getter = Arc::new(move |target: &(dyn Any + Send + Sync)| -> Result<Value> {
            let typed = target
                .downcast_ref::<T>()
                .ok_or_else(|| target_mismatch(&type_name, &member))?;
            Ok(Value::object(get(typed)))
        });
        self.property_entry(name).getter = Some((visibility, getter));
        self
    }

    /// Adds a setter converting text with [`FromStr`].
    pub fn setter<V, F>(mut self, name: &str, visibility: Visibility, set: F) -> Self
    where
        V: FromStr + Any,
        V::Err: fmt::Display,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let (type_name, member) = (self.descriptor.full_name.clone(), name.to_string());
        let setter: Setter = Arc::new(move |target: &mut (dyn Any + Send + Sync), value: Value| -> Result<()> {
            let typed = target
                .downcast_mut::<T>()
                .ok_or_else(|| target_mismatch(&type_name, &member))?;
            let converted = value
                .parse::<V>()
                .map_err(|message| member_error(&type_name, &member, &message))?;
            set(typed, converted);
            Ok(())
        });
        self.property_entry(name).setter = Some((visibility, setter));
        self
    }

    /// Adds a setter taking an already constructed object.
    pub fn object_setter<V, F>(mut self, name: &str, visibility: Visibility, set: F) -> Self
    where
        V: Any,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let (type_name, member) = (self.descriptor.full_name.clone(), name.to_string());
        let setter: Setter = Arc::new(move |target: &mut (dyn Any + Send + Sync), value: Value| -> Result<()> {
            let typed = target
                .downcast_mut::<T>()
                .ok_or_else(|| target_mismatch(&type_name, &member))?;
            let converted = value.downcast::<V>().map_err(|other| {
                member_error(
                    &type_name,
                    &member,
                    &format!(
                        "expected '{}', found {}",
                        std::any::type_name::<V>(),
                        other.kind()
                    ),
                )
            })?;
            set(typed, converted);
            Ok(())
        });
        self.property_entry(name).setter = Some((visibility, setter));
        self
    }

    /// Adds a single-argument method, e.g. a collection's `Add`.
    ///
    /// The argument is taken as-is: an object of type `V`, or text when `V`
    /// is `String`.
    pub fn method<V, F>(self, name: &str, visibility: Visibility, call: F) -> Self
    where
        V: Any,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let (type_name, member) = (self.descriptor.full_name.clone(), name.to_string());
        self.method_with(name, visibility, 1, move |target: &mut T, mut args: Vec<Value>| -> Result<()> {
            let argument = args
                .pop()
                .ok_or_else(|| member_error(&type_name, &member, "missing argument"))?;
            let converted = argument.downcast::<V>().map_err(|other| {
                member_error(
                    &type_name,
                    &member,
                    &format!(
                        "expected '{}', found {}",
                        std::any::type_name::<V>(),
                        other.kind()
                    ),
                )
            })?;
            call(target, converted);
            Ok(())
        })
    }

    /// Adds a method taking `arity` positional arguments.
    pub fn method_with<F>(mut self, name: &str, visibility: Visibility, arity: usize, call: F) -> Self
    where
        F: Fn(&mut T, Vec<Value>) -> Result<()> + Send + Sync + 'static,
    {
        let (type_name, member) = (self.descriptor.full_name.clone(), name.to_string());
        let invoker: Invoker = Arc::new(
            move |target: &mut (dyn Any + Send + Sync), args: Vec<Value>| -> Result<()> {
                let typed = target
                    .downcast_mut::<T>()
                    .ok_or_else(|| target_mismatch(&type_name, &member))?;
                call(typed, args)
            },
        );
        self.descriptor.methods.push(MethodInfo {
            type_name: self.descriptor.full_name.clone(),
            name: name.to_string(),
            visibility,
            arity,
            invoker,
        });
        self
    }

    /// Declares that `T` provides capability `B`, usually a `dyn Trait`.
    pub fn implements<B, F>(mut self, cast: F) -> Self
    where
        B: ?Sized + 'static,
        F: Fn(T) -> Box<B> + Send + Sync + 'static,
    {
        let type_name = self.descriptor.full_name.clone();
        let caster = Caster::<B>(Box::new(move |object: Object| -> Result<Box<B>> {
            object
                .downcast::<T>()
                .map(|typed| cast(*typed))
                .map_err(|_| ConfigError::Construction {
                    type_name: type_name.clone(),
                    message: "object is not an instance of this type".to_string(),
                })
        }));
        self.descriptor.capabilities.insert(
            TypeId::of::<B>(),
            Capability {
                name: std::any::type_name::<B>(),
                caster: Box::new(caster),
            },
        );
        self
    }

    /// Opts `T` into post-load notification.
    pub fn load_listener(mut self) -> Self
    where
        T: LoadListener,
    {
        let hook: PostLoadHook = Arc::new(
            |target: &mut (dyn Any + Send + Sync), sender: Option<&dyn Any>| {
                if let Some(typed) = target.downcast_mut::<T>() {
                    typed.on_post_load(sender);
                }
            },
        );
        self.descriptor.post_load = Some(hook);
        self
    }

    /// Finishes the descriptor.
    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }

    fn push_constructor(&mut self, visibility: Visibility, arity: usize, factory: Factory) {
        self.descriptor.constructors.push(ConstructorInfo {
            type_name: self.descriptor.full_name.clone(),
            visibility,
            arity,
            factory,
        });
    }

    fn property_entry(&mut self, name: &str) -> &mut PropertyInfo {
        let index = match self.descriptor.properties.iter().position(|p| p.name == name) {
            Some(index) => index,
            None => {
                let property = PropertyInfo::new(&self.descriptor.full_name, name);
                self.descriptor.properties.push(property);
                self.descriptor.properties.len() - 1
            }
        };
        &mut self.descriptor.properties[index]
    }
}

fn member_error(type_name: &str, member: &str, message: &str) -> ConfigError {
    ConfigError::Member {
        type_name: type_name.to_string(),
        member: member.to_string(),
        message: message.to_string(),
    }
}

fn target_mismatch(type_name: &str, member: &str) -> ConfigError {
    member_error(type_name, member, "target object is not an instance of this type")
}
