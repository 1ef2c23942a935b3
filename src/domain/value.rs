// SPDX-License-Identifier: MIT OR Apache-2.0

//! Values flowing through the runtime type model.
//!
//! The markup engine hands values to constructors, property setters and
//! collection methods as a [`Value`]: either the raw text of an attribute or
//! text node, or an already constructed object.

use std::any::Any;
use std::fmt;
use std::str::FromStr;

/// A type-erased object owned by the object graph.
pub type Object = Box<dyn Any + Send + Sync>;

/// A value supplied to a member or constructor during deserialization.
///
/// # Examples
///
/// ```
/// use graphcfg::domain::Value;
///
/// let value = Value::from("42");
/// assert_eq!(value.parse::<u32>().unwrap(), 42);
///
/// let value = Value::object(vec![1u8, 2, 3]);
/// assert_eq!(value.downcast::<Vec<u8>>().ok(), Some(vec![1, 2, 3]));
/// ```
pub enum Value {
    /// Raw text from an attribute or a text node.
    Text(String),
    /// A constructed object.
    Object(Object),
}

impl Value {
    /// Creates a text value.
    pub fn text(text: impl Into<String>) -> Self {
        Value::Text(text.into())
    }

    /// Wraps a typed object.
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Value::Object(Box::new(value))
    }

    /// Returns the text if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            Value::Object(_) => None,
        }
    }

    /// Returns `true` if this is an object value.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Short description of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Object(_) => "object",
        }
    }

    /// Takes the value as a `V` without any conversion.
    ///
    /// Objects are downcast. Text only matches when `V` is `String`.
    /// On mismatch the original value is handed back.
    pub fn downcast<V: Any>(self) -> std::result::Result<V, Value> {
        match self {
            Value::Object(object) => object.downcast::<V>().map(|v| *v).map_err(Value::Object),
            Value::Text(text) => {
                let mut slot = Some(text);
                if let Some(typed) = (&mut slot as &mut dyn Any)
                    .downcast_mut::<Option<V>>()
                    .and_then(Option::take)
                {
                    return Ok(typed);
                }
                Err(Value::Text(slot.unwrap_or_default()))
            }
        }
    }

    /// Converts the value into a `V`.
    ///
    /// Text is parsed with [`FromStr`]; an object is accepted when it already
    /// is a `V`.
    pub fn parse<V>(self) -> std::result::Result<V, String>
    where
        V: FromStr + Any,
        V::Err: fmt::Display,
    {
        match self {
            Value::Text(text) => text
                .parse::<V>()
                .map_err(|e| format!("cannot convert '{}': {}", text, e)),
            Value::Object(object) => object.downcast::<V>().map(|v| *v).map_err(|_| {
                format!(
                    "expected text or '{}', found an object of another type",
                    std::any::type_name::<V>()
                )
            }),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Value::Object(_) => f.write_str("Object(..)"),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text() {
        assert_eq!(Value::from("7").parse::<i64>().unwrap(), 7);
        assert!(Value::from("true").parse::<bool>().unwrap());
    }

    #[test]
    fn test_parse_invalid_text() {
        let err = Value::from("seven").parse::<i64>().unwrap_err();
        assert!(err.contains("seven"));
    }

    #[test]
    fn test_parse_object_of_same_type() {
        assert_eq!(Value::object(3u16).parse::<u16>().unwrap(), 3);
        assert!(Value::object(3u16).parse::<u32>().is_err());
    }

    #[test]
    fn test_downcast_text_as_string() {
        let text = Value::from("hello").downcast::<String>().unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_downcast_text_mismatch_returns_original() {
        let back = Value::from("hello").downcast::<u32>().unwrap_err();
        assert_eq!(back.as_text(), Some("hello"));
    }

    #[test]
    fn test_downcast_object_mismatch_returns_original() {
        let back = Value::object(1u8).downcast::<String>().unwrap_err();
        assert!(back.is_object());
        assert_eq!(back.downcast::<u8>().ok(), Some(1));
    }

    #[test]
    fn test_debug_and_kind() {
        assert_eq!(format!("{:?}", Value::from("a")), "Text(\"a\")");
        assert_eq!(format!("{:?}", Value::object(1u8)), "Object(..)");
        assert_eq!(Value::from("a").kind(), "text");
        assert_eq!(Value::object(1u8).kind(), "object");
    }
}
