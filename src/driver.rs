use crate::construct::Entity;
use crate::error::Result;
use crate::query::Query;

/// What every storage backend provides, over named pots of entities.
pub trait Driver {
    /// Entities in `pot` matching `query`, skipping `offset` of them and
    /// returning at most `length` (all remaining ones when `None`).
    ///
    /// A negative offset or length is a validation error raised before the
    /// store is touched. Ordering is up to the backend.
    fn get(
        &mut self,
        pot: &str,
        query: &Query,
        offset: i64,
        length: Option<i64>,
    ) -> Result<Vec<Entity>>;

    /// Stores the entities and returns their uids in the same positions.
    ///
    /// Entities without a uid receive a freshly generated one; an entity with
    /// a uid replaces whatever was stored under it. The batch is atomic.
    fn put(&mut self, pot: &str, entities: &[Entity]) -> Result<Vec<String>>;

    /// Deletes every entity in `pot` matching `query`. Matching nothing is fine.
    fn remove(&mut self, pot: &str, query: &Query) -> Result<&mut Self>;
}
