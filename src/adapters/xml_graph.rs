// SPDX-License-Identifier: MIT OR Apache-2.0

//! XML object-graph reader.
//!
//! This adapter reads a XAML-like markup dialect into objects described by a
//! [`TypeRegistry`]:
//!
//! ```xml
//! <AppSettings xmlns="clr-namespace:demo"
//!              xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml"
//!              RetryCount="3">
//!   <AppSettings.Primary>
//!     <Endpoint Url="https://example.org" />
//!   </AppSettings.Primary>
//! </AppSettings>
//! ```
//!
//! - An element names a type. Its namespace comes from `xmlns` declarations,
//!   with any `clr-namespace:` prefix and `;assembly=` suffix removed, so
//!   `demo` + `AppSettings` resolves `demo.AppSettings`.
//! - Attributes assign properties from text. `xmlns` declarations and
//!   attributes in the `x` namespace are skipped.
//! - A child element `Type.Member` assigns a property from its content, which
//!   is text or exactly one object element.
//! - Any other child is a collection item, added through the policy's add
//!   method.
//! - `<x:Arguments>` holds positional constructor arguments: object elements,
//!   text, or `<x:String>` elements.
//!
//! Every constructor, member and method is found through the reader's
//! [`SchemaContext`], so the same document can succeed under
//! [`RelaxedSchemaContext`] and fail under [`DefaultSchemaContext`].

use crate::adapters::{DefaultSchemaContext, RelaxedSchemaContext};
use crate::domain::{ConfigError, Object, Result, TypeDescriptor, TypeRegistry, Value};
use crate::ports::{GraphReader, LoadedGraph, SchemaContext};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::any::Any;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Maximum allowed size of a settings markup file (10MB)
/// This prevents denial of service attacks via extremely large files
const MAX_MARKUP_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Namespace of the markup directives (`x:Arguments`, `x:String`, `x:Key`).
pub const XAML_NAMESPACE: &str = "http://schemas.microsoft.com/winfx/2006/xaml";

/// Namespace bound to the reserved `xml` prefix in every document.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

const XML_PREFIX: &str = "xml";

const CLR_NAMESPACE_PREFIX: &str = "clr-namespace:";
const SOURCE_NAME: &str = "xml-graph";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Namespace {
    Directive,
    Xml,
    Types(String),
}

impl Namespace {
    fn from_uri(uri: &str) -> Self {
        match uri {
            XAML_NAMESPACE => return Namespace::Directive,
            XML_NAMESPACE => return Namespace::Xml,
            _ => {}
        }
        let namespace = uri.strip_prefix(CLR_NAMESPACE_PREFIX).unwrap_or(uri);
        let namespace = namespace.split(';').next().unwrap_or(namespace);
        Namespace::Types(namespace.trim().to_string())
    }
}

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug)]
struct Element {
    namespace: Option<Namespace>,
    local: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn is_directive(&self, name: &str) -> bool {
        self.namespace == Some(Namespace::Directive) && self.local == name
    }

    fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(Namespace::Types(ns)) if !ns.is_empty() => format!("{}.{}", ns, self.local),
            Some(Namespace::Directive) => format!("x:{}", self.local),
            Some(Namespace::Xml) => format!("{}:{}", XML_PREFIX, self.local),
            _ => self.local.clone(),
        }
    }

    fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }
}

type Scope = HashMap<String, String>;

struct Frame {
    element: Element,
    scope: Scope,
}

/// Reads XML markup into object graphs.
///
/// The reader is cheap to clone and safe to share between threads.
///
/// # Examples
///
/// ```
/// use graphcfg::adapters::XmlGraphReader;
/// use graphcfg::domain::{TypeDescriptor, TypeRegistry, Visibility};
/// use graphcfg::ports::GraphReader;
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Limits {
///     max: u32,
/// }
///
/// # fn main() -> graphcfg::domain::Result<()> {
/// let types = TypeRegistry::new().with(
///     TypeDescriptor::builder::<Limits>("demo.Limits")
///         .constructor(Visibility::Private, Limits::default)
///         .getter("Max", Visibility::Public, |l: &Limits| l.max)
///         .setter("Max", Visibility::Private, |l: &mut Limits, v: u32| l.max = v)
///         .build(),
/// )?;
///
/// let reader = XmlGraphReader::relaxed(Arc::new(types));
/// let graph = reader.read_str(r#"<Limits xmlns="clr-namespace:demo" Max="8" />"#)?;
/// let limits = graph.root.downcast::<Limits>().unwrap();
/// assert_eq!(limits.max, 8);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct XmlGraphReader {
    types: Arc<TypeRegistry>,
    schema: Arc<dyn SchemaContext>,
}

impl XmlGraphReader {
    /// Creates a reader using the public-only [`DefaultSchemaContext`].
    pub fn new(types: Arc<TypeRegistry>) -> Self {
        Self::with_schema(types, Arc::new(DefaultSchemaContext::new()))
    }

    /// Creates a reader using the visibility-relaxed policy.
    pub fn relaxed(types: Arc<TypeRegistry>) -> Self {
        Self::with_schema(types, Arc::new(RelaxedSchemaContext::new()))
    }

    /// Creates a reader using `schema` as its introspection policy.
    pub fn with_schema(types: Arc<TypeRegistry>, schema: Arc<dyn SchemaContext>) -> Self {
        Self { types, schema }
    }

    /// The registry used to resolve element names.
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// The introspection policy.
    pub fn schema(&self) -> &dyn SchemaContext {
        self.schema.as_ref()
    }

    /// Reads a member of `target` through the reader's policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Member`] if the policy does not expose the member
    /// or does not report it as readable, even when it was writable during
    /// loading.
    pub fn read_member<T: Any + Send + Sync>(&self, target: &T, name: &str) -> Result<Value> {
        let descriptor = self.types.descriptor_of::<T>().ok_or_else(|| {
            ConfigError::markup(format!(
                "type '{}' is not registered",
                std::any::type_name::<T>()
            ))
        })?;

        let member = self
            .schema
            .member(&descriptor, name)
            .ok_or_else(|| self.member_error(&descriptor, name, "no such member"))?;
        if !member.is_read_public() {
            return Err(self.member_error(&descriptor, name, "member is not readable"));
        }
        member.property().get(target)
    }

    fn member_error(&self, ty: &TypeDescriptor, member: &str, message: &str) -> ConfigError {
        ConfigError::Member {
            type_name: ty.full_name().to_string(),
            member: member.to_string(),
            message: format!("{} under the '{}' schema", message, self.schema.name()),
        }
    }

    fn resolve_type(&self, element: &Element) -> Result<Arc<TypeDescriptor>> {
        let found = match &element.namespace {
            Some(Namespace::Directive) => {
                return Err(ConfigError::markup(format!(
                    "directive 'x:{}' cannot be used as an object element",
                    element.local
                )))
            }
            Some(Namespace::Xml) => {
                return Err(ConfigError::markup(format!(
                    "reserved name '{}' cannot be used as an object element",
                    element.qualified_name()
                )))
            }
            Some(Namespace::Types(ns)) if !ns.is_empty() => {
                self.types.resolve_markup(Some(ns.as_str()), &element.local)
            }
            _ => self.types.resolve_markup(None, &element.local),
        };

        found.ok_or_else(|| {
            ConfigError::markup(format!("unknown type '{}'", element.qualified_name()))
        })
    }

    fn build_object(&self, element: &Element) -> Result<(Object, Arc<TypeDescriptor>)> {
        let ty = self.resolve_type(element)?;

        let mut arguments = None;
        let mut property_elements = Vec::new();
        let mut items = Vec::new();
        for child in &element.children {
            match child {
                Node::Element(e) if e.is_directive("Arguments") => {
                    if arguments.replace(e).is_some() {
                        return Err(ConfigError::markup(format!(
                            "type '{}' has more than one x:Arguments element",
                            ty.full_name()
                        )));
                    }
                }
                Node::Element(e) if e.namespace != Some(Namespace::Directive) && e.local.contains('.') => {
                    property_elements.push(e)
                }
                other => items.push(other),
            }
        }

        let mut object = match arguments {
            Some(arguments) => self.construct_with_arguments(&ty, arguments)?,
            None => self.construct(&ty)?,
        };

        for (name, text) in &element.attributes {
            self.assign(&ty, &mut object, name, Value::text(text.clone()))?;
        }

        for property in property_elements {
            let (owner, member) = property
                .local
                .split_once('.')
                .unwrap_or(("", property.local.as_str()));
            if owner != ty.short_name() {
                return Err(ConfigError::markup(format!(
                    "property element '{}' does not belong to type '{}'",
                    property.local,
                    ty.full_name()
                )));
            }
            let value = self.property_content(&ty, member, property)?;
            self.assign(&ty, &mut object, member, value)?;
        }

        if !items.is_empty() {
            let add = self.schema.add_method(&ty).ok_or_else(|| {
                ConfigError::markup(format!(
                    "type '{}' does not accept collection items under the '{}' schema",
                    ty.full_name(),
                    self.schema.name()
                ))
            })?;
            for item in items {
                let value = self.build_value(item)?;
                add.invoke(object.as_mut(), vec![value])?;
            }
        }

        Ok((object, ty))
    }

    fn construct(&self, ty: &TypeDescriptor) -> Result<Object> {
        if !self.schema.is_constructible(ty) {
            return Err(ConfigError::markup(format!(
                "type '{}' has no usable constructor under the '{}' schema",
                ty.full_name(),
                self.schema.name()
            )));
        }
        let constructor = self.schema.default_constructor(ty).ok_or_else(|| {
            ConfigError::markup(format!(
                "type '{}' requires x:Arguments",
                ty.full_name()
            ))
        })?;
        constructor.invoke(Vec::new())
    }

    fn construct_with_arguments(&self, ty: &TypeDescriptor, arguments: &Element) -> Result<Object> {
        let values = arguments
            .children
            .iter()
            .map(|child| self.build_value(child))
            .collect::<Result<Vec<_>>>()?;

        let constructor = self
            .schema
            .argument_constructor(ty, values.len())
            .ok_or_else(|| ConfigError::Construction {
                type_name: ty.full_name().to_string(),
                message: format!(
                    "no constructor takes {} argument(s) under the '{}' schema",
                    values.len(),
                    self.schema.name()
                ),
            })?;
        constructor.invoke(values)
    }

    fn build_value(&self, node: &Node) -> Result<Value> {
        match node {
            Node::Text(text) => Ok(Value::text(text.clone())),
            Node::Element(e) if e.is_directive("String") => Ok(Value::Text(e.text())),
            Node::Element(e) => {
                let (object, _) = self.build_object(e)?;
                Ok(Value::Object(object))
            }
        }
    }

    fn property_content(&self, ty: &TypeDescriptor, member: &str, property: &Element) -> Result<Value> {
        let mut elements = property.children.iter().filter(|c| matches!(c, Node::Element(_)));
        match (elements.next(), elements.next()) {
            (None, _) => Ok(Value::Text(property.text())),
            (Some(only), None) => self.build_value(only),
            (Some(_), Some(_)) => Err(self.member_error(
                ty,
                member,
                "property element holds more than one object",
            )),
        }
    }

    fn assign(&self, ty: &TypeDescriptor, object: &mut Object, name: &str, value: Value) -> Result<()> {
        let member = self
            .schema
            .member(ty, name)
            .ok_or_else(|| self.member_error(ty, name, "no such member"))?;
        if member.is_read_only() {
            return Err(self.member_error(ty, name, "member is read-only"));
        }
        if !member.is_write_public() {
            return Err(self.member_error(ty, name, "member is not writable"));
        }
        member.property().set(object.as_mut(), value)
    }
}

impl std::fmt::Debug for XmlGraphReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlGraphReader")
            .field("types", &self.types.len())
            .field("schema", &self.schema.name())
            .finish()
    }
}

impl GraphReader for XmlGraphReader {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn supported_extensions(&self) -> &[&str] {
        &["xml", "xaml"]
    }

    fn read_str(&self, content: &str) -> Result<LoadedGraph> {
        let document = parse_document(content)?;
        let (root, descriptor) = self.build_object(&document)?;
        tracing::debug!(
            "Built object graph rooted at '{}' using the '{}' schema",
            descriptor.full_name(),
            self.schema.name()
        );
        Ok(LoadedGraph { root, descriptor })
    }

    fn read_file(&self, path: &Path) -> Result<LoadedGraph> {
        // Check file size before reading
        let metadata = fs::metadata(path).map_err(|e| ConfigError::SourceError {
            source_name: SOURCE_NAME.to_string(),
            message: format!("Failed to read file metadata: {}", path.display()),
            source: Some(Box::new(e)),
        })?;

        if metadata.len() > MAX_MARKUP_FILE_SIZE {
            return Err(ConfigError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: format!(
                    "File size ({} bytes) exceeds maximum allowed size ({} bytes)",
                    metadata.len(),
                    MAX_MARKUP_FILE_SIZE
                ),
                source: None,
            });
        }

        let content = fs::read_to_string(path)?;
        self.read_str(&content)
    }
}

fn syntax_error<E>(error: E, position: u64) -> ConfigError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ConfigError::Markup {
        message: format!("{} (at byte {})", error, position),
        source: Some(Box::new(error)),
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| ConfigError::Markup {
        message: "name is not valid UTF-8".to_string(),
        source: Some(Box::new(e)),
    })
}

fn open_element(start: &BytesStart<'_>, parent: &Scope, position: u64) -> Result<Frame> {
    let mut scope = parent.clone();
    let mut attributes = Vec::new();

    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| syntax_error(e, position))?;
        let key = utf8(attribute.key.as_ref())?.to_string();
        let value = attribute
            .unescape_value()
            .map_err(|e| syntax_error(e, position))?
            .into_owned();

        if key == "xmlns" {
            scope.insert(String::new(), value);
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            scope.insert(prefix.to_string(), value);
        } else {
            attributes.push((key, value));
        }
    }

    let mut kept = Vec::with_capacity(attributes.len());
    for (key, value) in attributes {
        match key.split_once(':') {
            None => kept.push((key, value)),
            Some((prefix, local)) => match scope.get(prefix).map(|uri| Namespace::from_uri(uri)) {
                // x: directives and xml:space, xml:lang and friends carry no members
                Some(Namespace::Directive | Namespace::Xml) => {}
                Some(Namespace::Types(_)) => {
                    return Err(ConfigError::markup(format!(
                        "attached member '{}' is not supported",
                        local
                    )))
                }
                None => {
                    return Err(ConfigError::markup(format!(
                        "undeclared namespace prefix '{}'",
                        prefix
                    )))
                }
            },
        }
    }

    let name = utf8(start.name().as_ref())?.to_string();
    let (prefix, local) = match name.split_once(':') {
        Some((prefix, local)) => (prefix.to_string(), local.to_string()),
        None => (String::new(), name),
    };
    let namespace = match scope.get(&prefix) {
        Some(uri) => Some(Namespace::from_uri(uri)),
        None if prefix.is_empty() => None,
        None => {
            return Err(ConfigError::markup(format!(
                "undeclared namespace prefix '{}'",
                prefix
            )))
        }
    };

    Ok(Frame {
        element: Element {
            namespace,
            local,
            attributes: kept,
            children: Vec::new(),
        },
        scope,
    })
}

fn close_element(stack: &mut [Frame], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.element.children.push(Node::Element(element));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(ConfigError::markup("document has more than one root element")),
    }
}

fn push_text(stack: &mut [Frame], text: String) -> Result<()> {
    if text.trim().is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(frame) => {
            frame.element.children.push(Node::Text(text));
            Ok(())
        }
        None => Err(ConfigError::markup("text outside the root element")),
    }
}

fn parse_document(content: &str) -> Result<Element> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut root_scope = Scope::new();
    root_scope.insert(XML_PREFIX.to_string(), XML_NAMESPACE.to_string());
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let position = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let parent = stack.last().map(|f| &f.scope).unwrap_or(&root_scope);
                let frame = open_element(&start, parent, position)?;
                stack.push(frame);
            }
            Ok(Event::Empty(start)) => {
                let parent = stack.last().map(|f| &f.scope).unwrap_or(&root_scope);
                let frame = open_element(&start, parent, position)?;
                close_element(&mut stack, &mut root, frame.element)?;
            }
            Ok(Event::End(_)) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| ConfigError::markup("unexpected closing tag"))?;
                close_element(&mut stack, &mut root, frame.element)?;
            }
            Ok(Event::Text(text)) => {
                let text = text
                    .unescape()
                    .map_err(|e| syntax_error(e, position))?
                    .into_owned();
                push_text(&mut stack, text)?;
            }
            Ok(Event::CData(data)) => {
                let text = utf8(data.as_ref())?.to_string();
                push_text(&mut stack, text)?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(syntax_error(e, reader.error_position())),
        }
    }

    if let Some(open) = stack.last() {
        return Err(ConfigError::markup(format!(
            "unexpected end of document inside '{}'",
            open.element.qualified_name()
        )));
    }

    root.ok_or_else(|| ConfigError::markup("document has no root element"))
}
