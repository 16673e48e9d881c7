//! Composable boolean queries over entity attributes.
//!
//! A [`Query`] is a group of conditions joined by one [`Boolean`]. Nested
//! groups come from [`Query::and`] and [`Query::or`], whose closures fill an
//! isolated sub-builder that is then appended as a single child:
//!
//! ```
//! use eavpot::query;
//! let q = query::equals("kind", "cat").or(|q| q.less_than("age", 3).equals("name", "Tom"));
//! assert_eq!(
//!     serde_json::to_string(&q.to_array()).unwrap(),
//!     r#"["and",[["kind","=","cat"],["or",[["age","<",3],["name","=","Tom"]]]]]"#
//! );
//! ```
//!
//! Compiling with [`Query::to_array`] yields the canonical [`Node`] tree that
//! drivers consume. The free functions of this module start a new AND-rooted
//! query with their first condition.

use serde::ser::{SerializeTuple, Serializer};
use serde::Serialize;

use std::fmt;
use std::str::FromStr;

use crate::datatype::Value;
use crate::error::{EavError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Boolean {
    And,
    Or,
}
impl Boolean {
    pub fn tag(&self) -> &'static str {
        match self {
            Boolean::And => "and",
            Boolean::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    /// ends with
    LeftLike,
    /// starts with
    RightLike,
    /// contains
    Like,
}

impl Operator {
    pub const ALL: [Operator; 9] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqualTo,
        Operator::LessThan,
        Operator::LessThanOrEqualTo,
        Operator::LeftLike,
        Operator::RightLike,
        Operator::Like,
    ];
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqualTo => ">=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqualTo => "<=",
            Operator::LeftLike => "*LIKE",
            Operator::RightLike => "LIKE*",
            Operator::Like => "*LIKE*",
        }
    }
    /// Name of the builder method that appends this operator.
    pub fn method(&self) -> &'static str {
        match self {
            Operator::Equal => "equals",
            Operator::NotEqual => "notEquals",
            Operator::GreaterThan => "greaterThan",
            Operator::GreaterThanOrEqualTo => "greaterThanOrEqualTo",
            Operator::LessThan => "lessThan",
            Operator::LessThanOrEqualTo => "lessThanOrEqualTo",
            Operator::LeftLike => "leftLike",
            Operator::RightLike => "rightLike",
            Operator::Like => "like",
        }
    }
    pub fn is_pattern(&self) -> bool {
        matches!(self, Operator::LeftLike | Operator::RightLike | Operator::Like)
    }
}

impl FromStr for Operator {
    type Err = EavError;
    /// Accepts either the wire symbol (`">="`) or the builder method name
    /// (`"greaterThanOrEqualTo"`).
    fn from_str(s: &str) -> Result<Self> {
        Operator::ALL
            .iter()
            .find(|op| op.symbol() == s || op.method() == s)
            .copied()
            .ok_or_else(|| EavError::BuilderUsage(format!("No such operation: Query::{}", s)))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

// ------------- Condition -------------
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    attribute: String,
    operator: Operator,
    value: Value,
}
impl Condition {
    pub fn new(attribute: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
            value: value.into(),
        }
    }
    pub fn attribute(&self) -> &str {
        &self.attribute
    }
    pub fn operator(&self) -> Operator {
        self.operator
    }
    pub fn value(&self) -> &Value {
        &self.value
    }
}

// ------------- Node -------------
/// Canonical compiled form. Serializes to the nested-array wire form:
/// a group is `[tag, [children..]]` and a leaf is `[attribute, symbol, value]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Group { boolean: Boolean, children: Vec<Node> },
    Leaf(Condition),
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Node::Group { boolean, children } => {
                let mut tuple = serializer.serialize_tuple(2)?;
                tuple.serialize_element(boolean)?;
                tuple.serialize_element(children)?;
                tuple.end()
            }
            Node::Leaf(condition) => {
                let mut tuple = serializer.serialize_tuple(3)?;
                tuple.serialize_element(&condition.attribute)?;
                tuple.serialize_element(&condition.operator)?;
                tuple.serialize_element(&condition.value)?;
                tuple.end()
            }
        }
    }
}

// ------------- Query -------------
#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Condition(Condition),
    Group(Query),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    boolean: Boolean,
    clauses: Vec<Clause>,
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl Query {
    /// An empty AND-rooted query, which matches everything.
    pub fn new() -> Self {
        Self::group(Boolean::And)
    }
    fn group(boolean: Boolean) -> Self {
        Self {
            boolean,
            clauses: Vec::new(),
        }
    }
    pub fn boolean(&self) -> Boolean {
        self.boolean
    }
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
    pub fn condition(
        mut self,
        attribute: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.clauses
            .push(Clause::Condition(Condition::new(attribute, operator, value)));
        self
    }
    pub fn and<F: FnOnce(Query) -> Query>(self, build: F) -> Self {
        self.nest(Boolean::And, build)
    }
    pub fn or<F: FnOnce(Query) -> Query>(self, build: F) -> Self {
        self.nest(Boolean::Or, build)
    }
    fn nest<F: FnOnce(Query) -> Query>(mut self, boolean: Boolean, build: F) -> Self {
        let sub = build(Query::group(boolean));
        self.clauses.push(Clause::Group(sub));
        self
    }
    pub fn equals(self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(attribute, Operator::Equal, value)
    }
    pub fn not_equals(self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(attribute, Operator::NotEqual, value)
    }
    pub fn greater_than(self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(attribute, Operator::GreaterThan, value)
    }
    pub fn greater_than_or_equal_to(
        self,
        attribute: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.condition(attribute, Operator::GreaterThanOrEqualTo, value)
    }
    pub fn less_than(self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(attribute, Operator::LessThan, value)
    }
    pub fn less_than_or_equal_to(
        self,
        attribute: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.condition(attribute, Operator::LessThanOrEqualTo, value)
    }
    pub fn like(self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(attribute, Operator::Like, value)
    }
    pub fn left_like(self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(attribute, Operator::LeftLike, value)
    }
    pub fn right_like(self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(attribute, Operator::RightLike, value)
    }

    /// Compiles bottom-up. A group whose only child is a sub-query collapses
    /// into that sub-query's compiled form and loses its own tag; a lone leaf
    /// keeps its enclosing group.
    pub fn to_array(&self) -> Node {
        if let [Clause::Group(only)] = self.clauses.as_slice() {
            return only.to_array();
        }
        let children = self
            .clauses
            .iter()
            .map(|clause| match clause {
                Clause::Condition(condition) => Node::Leaf(condition.clone()),
                Clause::Group(sub) => sub.to_array(),
            })
            .collect();
        Node::Group {
            boolean: self.boolean,
            children,
        }
    }
}

// ------------- Entry points -------------
pub fn and<F: FnOnce(Query) -> Query>(build: F) -> Query {
    Query::new().and(build)
}
pub fn or<F: FnOnce(Query) -> Query>(build: F) -> Query {
    Query::new().or(build)
}
pub fn condition(attribute: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Query {
    Query::new().condition(attribute, operator, value)
}
pub fn equals(attribute: impl Into<String>, value: impl Into<Value>) -> Query {
    Query::new().equals(attribute, value)
}
pub fn not_equals(attribute: impl Into<String>, value: impl Into<Value>) -> Query {
    Query::new().not_equals(attribute, value)
}
pub fn greater_than(attribute: impl Into<String>, value: impl Into<Value>) -> Query {
    Query::new().greater_than(attribute, value)
}
pub fn greater_than_or_equal_to(attribute: impl Into<String>, value: impl Into<Value>) -> Query {
    Query::new().greater_than_or_equal_to(attribute, value)
}
pub fn less_than(attribute: impl Into<String>, value: impl Into<Value>) -> Query {
    Query::new().less_than(attribute, value)
}
pub fn less_than_or_equal_to(attribute: impl Into<String>, value: impl Into<Value>) -> Query {
    Query::new().less_than_or_equal_to(attribute, value)
}
pub fn like(attribute: impl Into<String>, value: impl Into<Value>) -> Query {
    Query::new().like(attribute, value)
}
pub fn left_like(attribute: impl Into<String>, value: impl Into<Value>) -> Query {
    Query::new().left_like(attribute, value)
}
pub fn right_like(attribute: impl Into<String>, value: impl Into<Value>) -> Query {
    Query::new().right_like(attribute, value)
}
