use rusqlite::types::ToSql;
use rusqlite::Connection;
use tracing::debug;

use crate::datatype::Value;
use crate::error::Result;

/// One result row, column values in select order.
pub type Row = Vec<Value>;

/// The capability a relational driver needs from its engine: run
/// parameterized SQL and group work into a transaction.
pub trait SqlExecutor {
    /// Runs a statement that returns no rows, giving the number of rows changed.
    fn execute(&self, sql: &str, parameters: &[(String, Value)]) -> Result<usize>;
    fn query(&self, sql: &str, parameters: &[(String, Value)]) -> Result<Vec<Row>>;
    /// Commits when `work` succeeds, rolls back otherwise.
    fn within_transaction<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>;
}

fn bind(parameters: &[(String, Value)]) -> Vec<(&str, &dyn ToSql)> {
    parameters
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect()
}

impl SqlExecutor for Connection {
    fn execute(&self, sql: &str, parameters: &[(String, Value)]) -> Result<usize> {
        debug!(sql, parameters = parameters.len(), "execute");
        let mut prepared = self.prepare(sql)?;
        let bound = bind(parameters);
        Ok(prepared.execute(bound.as_slice())?)
    }
    fn query(&self, sql: &str, parameters: &[(String, Value)]) -> Result<Vec<Row>> {
        debug!(sql, parameters = parameters.len(), "query");
        let mut prepared = self.prepare(sql)?;
        let columns = prepared.column_count();
        let bound = bind(parameters);
        let mut rows = prepared.query(bound.as_slice())?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns);
            for i in 0..columns {
                values.push(row.get::<_, Value>(i)?);
            }
            result.push(values);
        }
        Ok(result)
    }
    fn within_transaction<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        // dropping the transaction without a commit rolls it back
        let transaction = self.unchecked_transaction()?;
        let result = work(self)?;
        transaction.commit()?;
        Ok(result)
    }
}
