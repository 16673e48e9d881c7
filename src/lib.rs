//! Eavpot: entity-attribute-value storage in named pots.
//!
//! Callers keep arbitrary named scalar attributes on entities, group entities
//! into *pots* (named collections, much like tables), and fetch or delete them
//! through a composable boolean query.
//! * An [`construct::Entity`] is an immutable value: an optional uid plus an
//!   ordered map of attribute name to [`datatype::Value`].
//! * A [`query::Query`] is a tree of AND/OR groups over leaf conditions
//!   `(attribute, operator, value)`, compiled by [`query::Query::to_array`]
//!   into a canonical [`query::Node`] form.
//! * A [`statement::Statement`] accumulates SQL text and deduplicated bound
//!   values, so no value is ever spliced into SQL text.
//! * The [`driver::Driver`] trait is the storage contract (`get`, `put`,
//!   `remove`), implemented over SQLite by [`persist::Persistor`].
//!
//! ## Modules
//! * [`datatype`] - the scalar [`datatype::Value`] and its SQL conversions.
//! * [`construct`] - the [`construct::Entity`] value object.
//! * [`query`] - builder, compiler and canonical form.
//! * [`statement`] - parameterized SQL accumulation.
//! * [`executor`] - the [`executor::SqlExecutor`] capability the driver runs on.
//! * [`driver`] - the storage contract.
//! * [`persist`] - the relational driver and pot schema lifecycle.
//! * [`settings`] - settings file and environment loading.
//!
//! ## Quick Start
//! ```
//! use eavpot::{construct::Entity, driver::Driver, persist::Persistor, query};
//! let mut store = Persistor::in_memory("").unwrap();
//! let cat = Entity::new().with_attribute("name", "Tom").with_attribute("age", 3);
//! let uids = store.put("pets", &[cat]).unwrap();
//! let found = store.get("pets", &query::equals("uid", uids[0].as_str()), 0, None).unwrap();
//! assert_eq!(found[0].attribute("name"), Some(&"Tom".into()));
//! ```
//!
//! ## Pots
//! Each pot is backed by two tables, `<prefix><pot>_attributes` and
//! `<prefix><pot>_entities`. Both names are checked against a strict
//! identifier pattern before they are used, and both tables are created
//! together in one transaction on first use of the pot.

pub mod construct;
pub mod datatype;
pub mod driver;
pub mod error;
pub mod executor;
pub mod persist;
pub mod query;
pub mod settings;
pub mod statement;

pub use error::{EavError, Result};
