// used for persistence
use rusqlite::Connection;

// known pots are few, so a fast non-cryptographic hasher will do
use seahash::SeaHasher;
use std::collections::{BTreeMap, HashSet};
use std::hash::BuildHasherDefault;

// table identifiers end up verbatim in SQL text and must be vetted first
use lazy_static::lazy_static;
use regex::Regex;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::construct::Entity;
use crate::datatype::{self, Value};
use crate::driver::Driver;
use crate::error::{EavError, Result};
use crate::executor::{Row, SqlExecutor};
use crate::query::{Boolean, Condition, Node, Operator, Query};
use crate::settings::Settings;
use crate::statement::Statement;

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

/// Attribute name that addresses the entity uid in queries.
pub const UID: &str = "uid";

const ATTRIBUTES: &str = "_attributes";
const ENTITIES: &str = "_entities";
// names SQLite keeps for itself
const RESERVED_PREFIX: &str = "sqlite_";
// every stored entity has one row under this attribute id, so that
// entities without attributes still exist
const HEADER: i64 = 0;

lazy_static! {
    static ref TABLE_NAME: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
}

pub fn assert_valid_table_name(name: &str) -> Result<()> {
    if !TABLE_NAME.is_match(name) {
        return Err(EavError::Validation(format!(
            "Table names must be alphanumeric characters or underscores only, got {}",
            name
        )));
    }
    if name.to_ascii_lowercase().starts_with(RESERVED_PREFIX) {
        return Err(EavError::Validation(format!(
            "Table names cannot begin with {}: {}",
            RESERVED_PREFIX, name
        )));
    }
    Ok(())
}

fn quoted(name: &str) -> String {
    format!("\"{}\"", name)
}

fn corrupted(message: impl Into<String>) -> EavError {
    EavError::DataCorruption {
        message: message.into(),
    }
}

// ------------- Pots -------------
/// The pair of tables backing one pot, with names already vetted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PotTables {
    attributes: String,
    entities: String,
}
impl PotTables {
    pub fn new(prefix: &str, pot: &str) -> Result<Self> {
        if pot.is_empty() {
            return Err(EavError::Validation("Pot names cannot be empty".into()));
        }
        let attributes = format!("{}{}{}", prefix, pot, ATTRIBUTES);
        let entities = format!("{}{}{}", prefix, pot, ENTITIES);
        assert_valid_table_name(&attributes)?;
        assert_valid_table_name(&entities)?;
        Ok(Self {
            attributes,
            entities,
        })
    }
    pub fn attributes(&self) -> &str {
        &self.attributes
    }
    pub fn entities(&self) -> &str {
        &self.entities
    }
}

/// Pots already known to exist, for the lifetime of one driver.
#[derive(Debug, Default)]
pub struct PotKeeper {
    kept: HashSet<String, OtherHasher>,
}
impl PotKeeper {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn keep(&mut self, pot: &str) -> bool {
        self.kept.insert(pot.to_owned())
    }
    pub fn contains(&self, pot: &str) -> bool {
        self.kept.contains(pot)
    }
    pub fn len(&self) -> usize {
        self.kept.len()
    }
    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }
}

// ------------- Persistence -------------
/// Relational driver. Each pot maps to an attribute dictionary
/// (`<prefix><pot>_attributes`) and an entity/value store
/// (`<prefix><pot>_entities`), created on first use.
pub struct Persistor<E: SqlExecutor = Connection> {
    executor: E,
    prefix: String,
    pot_keeper: PotKeeper,
}

impl Persistor<Connection> {
    pub fn in_memory(prefix: &str) -> Result<Self> {
        Ok(Self::new(Connection::open_in_memory()?, prefix))
    }
    /// Opens (creating if needed) the SQLite file at `path`.
    pub fn in_file(path: &str, prefix: &str) -> Result<Self> {
        let connection = Connection::open(path).map_err(|e| {
            EavError::Driver(format!("Could not open sqlite file {}: {}", path, e))
        })?;
        Ok(Self::new(connection, prefix))
    }
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        match &settings.database {
            Some(path) => Self::in_file(path, &settings.prefix),
            None => Self::in_memory(&settings.prefix),
        }
    }
}

impl<E: SqlExecutor> Persistor<E> {
    pub fn new(executor: E, prefix: &str) -> Self {
        Self {
            executor,
            prefix: prefix.to_owned(),
            pot_keeper: PotKeeper::new(),
        }
    }
    pub fn executor(&self) -> &E {
        &self.executor
    }
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
    pub fn pot_keeper(&self) -> &PotKeeper {
        &self.pot_keeper
    }
    /// Vets the pot's table names and makes sure both tables exist.
    pub fn prepare_pot(&mut self, pot: &str) -> Result<PotTables> {
        let tables = PotTables::new(&self.prefix, pot)?;
        if !self.pot_keeper.contains(pot) {
            if !self.pot_exists(&tables)? {
                self.create_pot(&tables)?;
            }
            self.pot_keeper.keep(pot);
        }
        Ok(tables)
    }
    /// Number of entities in `pot` matching `query`.
    pub fn count(&mut self, pot: &str, query: &Query) -> Result<usize> {
        let tables = self.prepare_pot(pot)?;
        let mut statement = Statement::new();
        statement.add_text("SELECT COUNT(*) FROM (");
        matching_uids(&mut statement, &tables, &query.to_array())?;
        statement.add_text(")");
        let rows = self.executor.query(statement.text(), statement.parameters())?;
        match rows.first().and_then(|row| row.first()) {
            Some(Value::Integer(count)) => Ok(*count as usize),
            _ => Err(corrupted("COUNT(*) did not return an integer")),
        }
    }
    fn pot_exists(&self, tables: &PotTables) -> Result<bool> {
        let attributes_exist = self.table_exists(&tables.attributes)?;
        let entities_exist = self.table_exists(&tables.entities)?;
        match (attributes_exist, entities_exist) {
            (true, true) => Ok(true),
            (false, false) => Ok(false),
            (true, false) => Err(EavError::SchemaConsistency(format!(
                "Pot attributes table exists, pot entities table does not: {}",
                tables.attributes
            ))),
            (false, true) => Err(EavError::SchemaConsistency(format!(
                "Pot entities table exists, pot attributes table does not: {}",
                tables.entities
            ))),
        }
    }
    fn table_exists(&self, name: &str) -> Result<bool> {
        let mut statement = Statement::new();
        statement.add_text("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ");
        statement.add_value(name)?;
        let rows = self.executor.query(statement.text(), statement.parameters())?;
        match rows.first().and_then(|row| row.first()) {
            Some(Value::Integer(count)) => Ok(*count > 0),
            _ => Err(corrupted("schema catalog probe did not return a count")),
        }
    }
    fn create_pot(&self, tables: &PotTables) -> Result<()> {
        let created = self.executor.within_transaction(|executor| {
            executor.execute(
                &format!(
                    "
                create table {} (
                    id integer not null,
                    name text not null,
                    constraint referenceable_id primary key (
                        id
                    ),
                    constraint unique_name unique (
                        name
                    )
                )
                ",
                    quoted(&tables.attributes)
                ),
                &[],
            )?;
            // the value column is left untyped so SQLite applies no affinity
            executor.execute(
                &format!(
                    "
                create table {} (
                    uid text not null,
                    attribute_id integer not null,
                    kind integer not null,
                    value,
                    constraint unique_uid_and_attribute primary key (
                        uid,
                        attribute_id
                    )
                ) without rowid
                ",
                    quoted(&tables.entities)
                ),
                &[],
            )?;
            executor.execute(
                &format!(
                    "create index {} on {} (attribute_id, value)",
                    quoted(&format!("{}_values", tables.entities)),
                    quoted(&tables.entities)
                ),
                &[],
            )?;
            Ok(())
        });
        match created {
            Ok(()) => {
                info!(attributes = %tables.attributes, entities = %tables.entities, "created pot");
                Ok(())
            }
            // someone else may have won the race to create the same tables
            Err(e) => {
                if self.pot_exists(tables)? {
                    warn!(error = %e, entities = %tables.entities, "pot already created elsewhere");
                    Ok(())
                } else {
                    Err(e)
                }
            }
        }
    }
}

impl<E: SqlExecutor> Driver for Persistor<E> {
    fn get(
        &mut self,
        pot: &str,
        query: &Query,
        offset: i64,
        length: Option<i64>,
    ) -> Result<Vec<Entity>> {
        if offset < 0 {
            return Err(EavError::Validation(format!(
                "Offset cannot be less than 0, got {}",
                offset
            )));
        }
        if let Some(length) = length {
            if length < 0 {
                return Err(EavError::Validation(format!(
                    "Length cannot be less than 0, got {}",
                    length
                )));
            }
        }
        let tables = self.prepare_pot(pot)?;
        let mut statement = Statement::new();
        statement.add_text("WITH matched AS (");
        matching_uids(&mut statement, &tables, &query.to_array())?;
        // a negative limit means no limit to SQLite
        statement.add_text(" ORDER BY e.uid LIMIT ");
        statement.add_value(length.unwrap_or(-1))?;
        statement.add_text(" OFFSET ");
        statement.add_value(offset)?;
        statement
            .add_text(") SELECT v.uid, a.name, v.kind, v.value FROM ")
            .add_text(&quoted(&tables.entities))
            .add_text(" v JOIN matched m ON m.uid = v.uid LEFT JOIN ")
            .add_text(&quoted(&tables.attributes))
            .add_text(" a ON a.id = v.attribute_id ORDER BY v.uid, v.attribute_id");
        let rows = self.executor.query(statement.text(), statement.parameters())?;
        let entities = restore_entities(rows)?;
        debug!(pot, entities = entities.len(), "get");
        Ok(entities)
    }

    fn put(&mut self, pot: &str, entities: &[Entity]) -> Result<Vec<String>> {
        for entity in entities {
            assert_valid_entity(entity)?;
        }
        let tables = self.prepare_pot(pot)?;
        let uids = self.executor.within_transaction(|executor| {
            let mut uids = Vec::with_capacity(entities.len());
            for entity in entities {
                let uid = match entity.uid() {
                    Some(uid) => uid.to_owned(),
                    None => Uuid::new_v4().to_string(),
                };
                store_entity(executor, &tables, &uid, entity)?;
                uids.push(uid);
            }
            Ok(uids)
        })?;
        debug!(pot, entities = uids.len(), "put");
        Ok(uids)
    }

    fn remove(&mut self, pot: &str, query: &Query) -> Result<&mut Self> {
        let tables = self.prepare_pot(pot)?;
        let mut statement = Statement::new();
        statement
            .add_text("DELETE FROM ")
            .add_text(&quoted(&tables.entities))
            .add_text(" WHERE uid IN (");
        matching_uids(&mut statement, &tables, &query.to_array())?;
        statement.add_text(")");
        let removed = self
            .executor
            .within_transaction(|executor| executor.execute(statement.text(), statement.parameters()))?;
        debug!(pot, rows = removed, "remove");
        Ok(self)
    }
}

fn assert_valid_entity(entity: &Entity) -> Result<()> {
    if entity.uid() == Some("") {
        return Err(EavError::Validation("Entity uids cannot be empty".into()));
    }
    for (name, value) in entity.attributes() {
        if name.is_empty() {
            return Err(EavError::Validation("Attribute names cannot be empty".into()));
        }
        if name == UID {
            return Err(EavError::Validation(format!(
                "Attribute name {} is reserved for the entity uid",
                UID
            )));
        }
        // SQLite keeps a NaN real as NULL, which would no longer read back as a float
        if let Value::Float(x) = value {
            if x.is_nan() {
                return Err(EavError::Validation(format!(
                    "Attribute {} cannot hold NaN",
                    name
                )));
            }
        }
    }
    Ok(())
}

// ------------- Storing -------------
fn store_entity<E: SqlExecutor>(
    executor: &E,
    tables: &PotTables,
    uid: &str,
    entity: &Entity,
) -> Result<()> {
    let entities = quoted(&tables.entities);
    // replace semantics: whatever was kept under this uid goes first
    let mut delete = Statement::new();
    delete
        .add_text("DELETE FROM ")
        .add_text(&entities)
        .add_text(" WHERE uid = ");
    delete.add_value(uid)?;
    executor.execute(delete.text(), delete.parameters())?;

    let mut header = Statement::new();
    header
        .add_text("INSERT INTO ")
        .add_text(&entities)
        .add_text(" (uid, attribute_id, kind, value) VALUES (");
    header.add_value(uid)?;
    header.add_text(&format!(", {}, {}, NULL)", HEADER, datatype::NULL));
    executor.execute(header.text(), header.parameters())?;

    for (name, value) in entity.attributes() {
        let attribute_id = keep_attribute(executor, tables, name)?;
        let mut insert = Statement::new();
        insert
            .add_text("INSERT INTO ")
            .add_text(&entities)
            .add_text(" (uid, attribute_id, kind, value) VALUES (");
        insert.add_value(uid)?;
        insert.add_text(", ");
        insert.add_value(attribute_id)?;
        insert.add_text(", ");
        insert.add_value(value.kind())?;
        insert.add_text(", ");
        insert.add_value(value.clone())?;
        insert.add_text(")");
        executor.execute(insert.text(), insert.parameters())?;
    }
    Ok(())
}

/// Dictionary id of an attribute name, registering the name when new.
fn keep_attribute<E: SqlExecutor>(executor: &E, tables: &PotTables, name: &str) -> Result<i64> {
    let attributes = quoted(&tables.attributes);
    let mut insert = Statement::new();
    insert
        .add_text("INSERT OR IGNORE INTO ")
        .add_text(&attributes)
        .add_text(" (name) VALUES (");
    insert.add_value(name)?;
    insert.add_text(")");
    executor.execute(insert.text(), insert.parameters())?;

    let mut select = Statement::new();
    select
        .add_text("SELECT id FROM ")
        .add_text(&attributes)
        .add_text(" WHERE name = ");
    select.add_value(name)?;
    let rows = executor.query(select.text(), select.parameters())?;
    match rows.first().and_then(|row| row.first()) {
        Some(Value::Integer(id)) => Ok(*id),
        _ => Err(corrupted(format!("attribute {} has no dictionary id", name))),
    }
}

// ------------- Restoring -------------
fn restore_entities(rows: Vec<Row>) -> Result<Vec<Entity>> {
    let mut entities = Vec::new();
    let mut in_progress: Option<String> = None;
    let mut attributes = BTreeMap::new();
    for row in rows {
        let [uid, name, kind, value] = <[Value; 4]>::try_from(row)
            .map_err(|_| corrupted("entity rows must have four columns"))?;
        let Value::String(uid) = uid else {
            return Err(corrupted("entity uid is not text"));
        };
        if in_progress.as_deref() != Some(uid.as_str()) {
            if let Some(done) = in_progress.replace(uid) {
                entities.push(Entity::restore(done, std::mem::take(&mut attributes)));
            }
        }
        match (name, kind) {
            // the header row
            (Value::Null, _) => {}
            (Value::String(name), Value::Integer(kind)) => {
                attributes.insert(name, Value::restore(kind, value)?);
            }
            (name, _) => {
                return Err(corrupted(format!("unreadable attribute row for {}", name)));
            }
        }
    }
    if let Some(done) = in_progress {
        entities.push(Entity::restore(done, attributes));
    }
    Ok(entities)
}

// ------------- Query translation -------------
/// `SELECT e.uid ...` for every entity matching `node`.
fn matching_uids(statement: &mut Statement, tables: &PotTables, node: &Node) -> Result<()> {
    statement
        .add_text("SELECT e.uid FROM ")
        .add_text(&quoted(&tables.entities))
        .add_text(&format!(" e WHERE e.attribute_id = {} AND (", HEADER));
    render_node(statement, tables, node)?;
    statement.add_text(")");
    Ok(())
}

fn render_node(statement: &mut Statement, tables: &PotTables, node: &Node) -> Result<()> {
    match node {
        Node::Group { boolean, children } => render_group(statement, tables, *boolean, children),
        Node::Leaf(condition) => render_condition(statement, tables, condition),
    }
}

fn render_group(
    statement: &mut Statement,
    tables: &PotTables,
    boolean: Boolean,
    children: &[Node],
) -> Result<()> {
    if children.is_empty() {
        // an empty AND holds, an empty OR does not
        statement.add_text(match boolean {
            Boolean::And => "1",
            Boolean::Or => "0",
        });
        return Ok(());
    }
    let delimiter = format!(" {} ", boolean.tag().to_uppercase());
    for (i, child) in children.iter().enumerate() {
        if i != 0 {
            statement.add_text(&delimiter);
        }
        statement.add_text("(");
        render_node(statement, tables, child)?;
        statement.add_text(")");
    }
    Ok(())
}

fn render_condition(statement: &mut Statement, tables: &PotTables, condition: &Condition) -> Result<()> {
    if condition.attribute() == UID {
        statement.add_text("e.uid ");
        return render_comparison(statement, condition);
    }
    statement
        .add_text("e.uid IN (SELECT v.uid FROM ")
        .add_text(&quoted(&tables.entities))
        .add_text(" v JOIN ")
        .add_text(&quoted(&tables.attributes))
        .add_text(" a ON a.id = v.attribute_id WHERE a.name = ");
    statement.add_value(condition.attribute())?;
    statement.add_text(" AND ");
    render_value_test(statement, condition)?;
    statement.add_text(")");
    Ok(())
}

/// Compares a stored value under its kind, so `true`, `1` and `1.0` stay
/// apart. Integers and floats still order against each other.
fn render_value_test(statement: &mut Statement, condition: &Condition) -> Result<()> {
    let operator = condition.operator();
    if operator.is_pattern() {
        statement.add_text("v.value ");
        return render_comparison(statement, condition);
    }
    let kind = condition.value().kind();
    match operator {
        Operator::Equal => {
            statement.add_text("v.kind = ");
            statement.add_value(kind)?;
            statement.add_text(" AND v.value ");
            render_comparison(statement, condition)
        }
        // any other kind is unequal by definition
        Operator::NotEqual => {
            statement.add_text("(v.kind IS NOT ");
            statement.add_value(kind)?;
            statement.add_text(" OR v.value ");
            render_comparison(statement, condition)?;
            statement.add_text(")");
            Ok(())
        }
        _ => {
            if kind == datatype::INTEGER || kind == datatype::FLOAT {
                statement.add_text(&format!(
                    "v.kind IN ({}, {})",
                    datatype::INTEGER,
                    datatype::FLOAT
                ));
            } else {
                statement.add_text("v.kind = ");
                statement.add_value(kind)?;
            }
            statement.add_text(" AND v.value ");
            render_comparison(statement, condition)
        }
    }
}

fn render_comparison(statement: &mut Statement, condition: &Condition) -> Result<()> {
    let operator = condition.operator();
    statement.add_text(comparison(operator)).add_text(" ");
    if operator.is_pattern() {
        statement.add_value(like_pattern(operator, condition.value()))?;
        statement.add_text(" ESCAPE '\\'");
    } else {
        statement.add_value(condition.value().clone())?;
    }
    Ok(())
}

// IS and IS NOT behave like = and != but also compare nulls
fn comparison(operator: Operator) -> &'static str {
    match operator {
        Operator::Equal => "IS",
        Operator::NotEqual => "IS NOT",
        Operator::GreaterThan => ">",
        Operator::GreaterThanOrEqualTo => ">=",
        Operator::LessThan => "<",
        Operator::LessThanOrEqualTo => "<=",
        Operator::LeftLike | Operator::RightLike | Operator::Like => "LIKE",
    }
}

fn like_pattern(operator: Operator, value: &Value) -> String {
    let text = value
        .to_string()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    match operator {
        Operator::LeftLike => format!("%{}", text),
        Operator::RightLike => format!("{}%", text),
        _ => format!("%{}%", text),
    }
}
