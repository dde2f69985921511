use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use std::sync::RwLock;

use super::ActivityStore;
use crate::error::StoreError;
use crate::record::ActivityRow;

/// In-process store.
///
/// Useful for tests and for embedders without a database. It can be told to
/// fail every insert, or to "succeed" while writing nothing, to exercise the
/// audit failure paths.
#[derive(Debug, Default)]
pub struct MemoryActivityStore {
    rows: RwLock<Vec<ActivityRow>>,
    mode: InsertMode,
}

#[derive(Debug, Default)]
enum InsertMode {
    #[default]
    Normal,
    ZeroRows,
    Fail(String),
}

impl MemoryActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose inserts report zero affected rows without an error.
    pub fn zero_rows() -> Self {
        Self {
            mode: InsertMode::ZeroRows,
            ..Self::default()
        }
    }

    /// A store whose inserts fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            mode: InsertMode::Fail(message.into()),
            ..Self::default()
        }
    }

    /// Snapshot of every stored row in insertion order.
    pub fn rows(&self) -> Vec<ActivityRow> {
        self.rows.read().map(|rows| rows.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ActivityStore for MemoryActivityStore {
    async fn insert(&self, row: &ActivityRow) -> Result<u64, StoreError> {
        match &self.mode {
            InsertMode::Normal => {}
            InsertMode::ZeroRows => return Ok(0),
            InsertMode::Fail(message) => return Err(StoreError::Database(message.clone())),
        }

        let mut rows = self
            .rows
            .write()
            .map_err(|e| StoreError::Database(format!("failed to acquire write lock: {e}")))?;

        let id = rows.len() as i64 + 1;
        // Keep created_at strictly increasing so ordering is deterministic
        // even when inserts land within the same clock tick.
        let now = Utc::now().naive_utc();
        let created_at = match rows.last().and_then(|r| r.created_at) {
            Some(last) if last >= now => last + Duration::microseconds(1),
            _ => now,
        };

        let mut stored = row.clone();
        stored.id = Some(id);
        stored.created_at = Some(created_at);
        rows.push(stored);
        Ok(1)
    }

    async fn find_by_actor(&self, actor_id: i64) -> Result<Vec<ActivityRow>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|e| StoreError::Database(format!("failed to acquire read lock: {e}")))?;

        let mut matches: Vec<ActivityRow> = rows
            .iter()
            .filter(|r| r.actor_id == actor_id)
            .cloned()
            .collect();
        matches.sort_by_key(|r| std::cmp::Reverse(r.created_at.unwrap_or(NaiveDateTime::MIN)));
        Ok(matches)
    }
}
