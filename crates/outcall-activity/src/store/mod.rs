//! Persistent store capability for activity rows.

mod memory;

use async_trait::async_trait;

use crate::error::{ActivityError, StoreError};
use crate::record::ActivityRow;

pub use memory::MemoryActivityStore;

/// Trait for activity storage backends.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Insert one row and report how many rows were affected.
    async fn insert(&self, row: &ActivityRow) -> Result<u64, StoreError>;

    /// All rows of an actor, newest `created_at` first.
    async fn find_by_actor(&self, actor_id: i64) -> Result<Vec<ActivityRow>, StoreError>;
}

/// Insert a single row.
///
/// Zero affected rows is a failure even when the driver reported none.
pub async fn persist(store: &dyn ActivityStore, row: &ActivityRow) -> Result<(), ActivityError> {
    let affected = store
        .insert(row)
        .await
        .map_err(|e| ActivityError::Persist(e.to_string()))?;
    if affected == 0 {
        return Err(ActivityError::Persist("0 rows affected".to_string()));
    }
    Ok(())
}

/// Rows of an actor, newest first. An empty history is `NotFound`.
pub async fn find_by_actor(
    store: &dyn ActivityStore,
    actor_id: i64,
) -> Result<Vec<ActivityRow>, ActivityError> {
    let rows = store.find_by_actor(actor_id).await?;
    if rows.is_empty() {
        return Err(ActivityError::NotFound("data not found".to_string()));
    }
    Ok(rows)
}
