use std::sync::Arc;

// attributes are kept ordered by name
use std::collections::BTreeMap;

// used to print out readable forms of a construct
use std::fmt;

use crate::datatype::Value;
use crate::error::Result;

// ------------- Entity -------------
/// An immutable record: an optional uid plus named scalar attributes.
///
/// Every `with*` call returns a new entity and leaves the receiver as it was.
/// The attribute map is shared between copies until one of them changes it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    uid: Option<String>,
    attributes: Arc<BTreeMap<String, Value>>,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }
    pub(crate) fn restore(uid: String, attributes: BTreeMap<String, Value>) -> Self {
        Self {
            uid: Some(uid),
            attributes: Arc::new(attributes),
        }
    }
    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }
    pub fn with_uid(&self, uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
            attributes: Arc::clone(&self.attributes),
        }
    }
    pub fn without_uid(&self) -> Self {
        Self {
            uid: None,
            attributes: Arc::clone(&self.attributes),
        }
    }
    pub fn with_attribute(&self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut new = self.clone();
        Arc::make_mut(&mut new.attributes).insert(name.into(), value.into());
        new
    }
    /// Same as [`Entity::with_attribute`] for values of unknown shape. Arrays
    /// and objects are refused with a type error.
    pub fn try_with_attribute(
        &self,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<Self> {
        let value = Value::try_from(value)?;
        Ok(self.with_attribute(name, value))
    }
    pub fn without_attribute(&self, name: &str) -> Self {
        if !self.attributes.contains_key(name) {
            return self.clone();
        }
        let mut new = self.clone();
        Arc::make_mut(&mut new.attributes).remove(name);
        new
    }
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
    pub fn attribute_or(&self, name: &str, default: impl Into<Value>) -> Value {
        match self.attributes.get(name) {
            Some(value) => value.clone(),
            None => default.into(),
        }
    }
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = String::new();
        for (name, value) in self.attributes.iter() {
            s += &format!("{}: {}::<{}>,", name, value, value.kind_name());
        }
        s.pop();
        write!(f, "{} {{{}}}", self.uid.as_deref().unwrap_or("?"), s)
    }
}
