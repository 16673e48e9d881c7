//! Accumulates SQL text and the values bound into it.
//!
//! Text added with [`Statement::add_text`] is taken verbatim and must never
//! carry untrusted data. Values always go through [`Statement::add_value`],
//! which writes a placeholder and records the value under that name. Adding a
//! value that is already bound (same kind, same value) reuses its placeholder.

use std::fmt;

use crate::datatype::Value;
use crate::error::{EavError, Result};

pub type NameGenerator = Box<dyn FnMut() -> String>;

pub struct Statement {
    text: String,
    parameters: Vec<(String, Value)>,
    generator: NameGenerator,
}

impl Default for Statement {
    fn default() -> Self {
        Self::new()
    }
}

impl Statement {
    /// Uses sequential SQLite named parameters: `:param0`, `:param1`, ...
    pub fn new() -> Self {
        let mut next = 0usize;
        Self::with_generator(move || {
            let name = format!(":param{}", next);
            next += 1;
            name
        })
    }
    /// Generated names must be SQLite named-parameter tokens (`:name`,
    /// `@name` or `$name`), or binding fails when the statement is run.
    pub fn with_generator<G: FnMut() -> String + 'static>(generator: G) -> Self {
        Self {
            text: String::new(),
            parameters: Vec::new(),
            generator: Box::new(generator),
        }
    }
    pub fn add_text(&mut self, text: &str) -> &mut Self {
        self.text.push_str(text);
        self
    }
    /// Appends the placeholder for `value` and returns it.
    pub fn add_value(&mut self, value: impl Into<Value>) -> Result<String> {
        let value = value.into();
        let name = match self.find_parameter(&value) {
            Some(name) => name.to_owned(),
            None => self.add_parameter(value)?,
        };
        self.text.push_str(&name);
        Ok(name)
    }
    pub fn text(&self) -> &str {
        &self.text
    }
    pub fn parameters(&self) -> &[(String, Value)] {
        &self.parameters
    }
    fn find_parameter(&self, value: &Value) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(_, bound)| bound.same_as(value))
            .map(|(name, _)| name.as_str())
    }
    fn add_parameter(&mut self, value: Value) -> Result<String> {
        let name = (self.generator)();
        if name.is_empty() {
            return Err(EavError::BuilderUsage(
                "Parameter name generator must not return an empty string".into(),
            ));
        }
        if self.parameters.iter().any(|(bound, _)| *bound == name) {
            return Err(EavError::BuilderUsage(format!(
                "Parameter name already exists: {}",
                name
            )));
        }
        self.parameters.push((name.clone(), value));
        Ok(name)
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Statement")
            .field("text", &self.text)
            .field("parameters", &self.parameters)
            .finish()
    }
}
