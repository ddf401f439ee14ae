// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Record Store Module
//!
//! The persistence collaborator behind every participant and activity
//! operation. Stores expose filtered reads, inserts, updates by id and
//! idempotent deletes on named collections, plus an optional unit-of-work
//! boundary. Two implementations ship with the crate: an in-memory store
//! for tests and short-lived sessions, and a SQLite store for the CLI.

mod error;
pub mod memory;
pub mod migration;
mod query;
pub mod sqlite;

pub use error::{ErrorCategory, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use query::{Collection, Column, ColumnKind, Condition, Filter, Order, Reference, Row};
pub use sqlite::SqliteStore;

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Record store contract.
///
/// This trait abstracts the backend that owns participant, activity and
/// link rows, allowing the SQLite database to be swapped for the
/// in-memory store in tests.
///
/// # Synchronous Interface
///
/// Calls block until the backend answers. Callers that issue several
/// reads before writing (such as the merge coordinator) get a consistent
/// ordering without an async runtime.
///
/// # Example
///
/// ```ignore
/// use roster_core::store::{Collection, Filter, MemoryStore, RecordStore};
///
/// let store = MemoryStore::new();
/// let rows = store.query(Collection::Participants, &Filter::all(), None)?;
/// store.delete(Collection::Registrations, &Filter::where_eq("participant_id", "p1"))?;
/// ```
pub trait RecordStore {
    /// Returns the rows of `collection` matching `filter`, optionally sorted.
    fn query(
        &self,
        collection: Collection,
        filter: &Filter,
        order: Option<&Order>,
    ) -> StoreResult<Vec<Row>>;

    /// Inserts rows and returns them as stored (with `id` and `created_at`).
    ///
    /// Either every row is inserted or none is. Fails with
    /// `StoreError::Conflict` when a unique key would be duplicated.
    fn insert(&self, collection: Collection, rows: Vec<Row>) -> StoreResult<Vec<Row>>;

    /// Overwrites `fields` on the row with the given id.
    ///
    /// Fails with `StoreError::NotFound` when no such row exists.
    fn update(&self, collection: Collection, id: &str, fields: Row) -> StoreResult<()>;

    /// Deletes every row matching `filter` and returns how many were removed.
    ///
    /// Missing rows are not an error. Fails with `StoreError::Constraint`
    /// while other rows still reference a row being deleted.
    fn delete(&self, collection: Collection, filter: &Filter) -> StoreResult<usize>;

    /// Opens a unit of work. Returns `false` when the store has no
    /// transaction support, in which case commit and rollback are no-ops.
    fn begin(&self) -> StoreResult<bool> {
        Ok(false)
    }

    /// Commits the unit of work opened by [`RecordStore::begin`].
    fn commit(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Discards the unit of work opened by [`RecordStore::begin`].
    fn rollback(&self) -> StoreResult<()> {
        Ok(())
    }
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn query(
        &self,
        collection: Collection,
        filter: &Filter,
        order: Option<&Order>,
    ) -> StoreResult<Vec<Row>> {
        (**self).query(collection, filter, order)
    }

    fn insert(&self, collection: Collection, rows: Vec<Row>) -> StoreResult<Vec<Row>> {
        (**self).insert(collection, rows)
    }

    fn update(&self, collection: Collection, id: &str, fields: Row) -> StoreResult<()> {
        (**self).update(collection, id, fields)
    }

    fn delete(&self, collection: Collection, filter: &Filter) -> StoreResult<usize> {
        (**self).delete(collection, filter)
    }

    fn begin(&self) -> StoreResult<bool> {
        (**self).begin()
    }

    fn commit(&self) -> StoreResult<()> {
        (**self).commit()
    }

    fn rollback(&self) -> StoreResult<()> {
        (**self).rollback()
    }
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn query(
        &self,
        collection: Collection,
        filter: &Filter,
        order: Option<&Order>,
    ) -> StoreResult<Vec<Row>> {
        (**self).query(collection, filter, order)
    }

    fn insert(&self, collection: Collection, rows: Vec<Row>) -> StoreResult<Vec<Row>> {
        (**self).insert(collection, rows)
    }

    fn update(&self, collection: Collection, id: &str, fields: Row) -> StoreResult<()> {
        (**self).update(collection, id, fields)
    }

    fn delete(&self, collection: Collection, filter: &Filter) -> StoreResult<usize> {
        (**self).delete(collection, filter)
    }

    fn begin(&self) -> StoreResult<bool> {
        (**self).begin()
    }

    fn commit(&self) -> StoreResult<()> {
        (**self).commit()
    }

    fn rollback(&self) -> StoreResult<()> {
        (**self).rollback()
    }
}

/// Runs `work` inside a unit of work on `store`.
///
/// Commits when `work` succeeds and rolls back when it fails. The boolean
/// passed to `work` tells it whether a real transaction is open.
pub fn atomically<S, T, E, F>(store: &S, work: F) -> Result<T, E>
where
    S: RecordStore + ?Sized,
    E: From<StoreError>,
    F: FnOnce(bool) -> Result<T, E>,
{
    let transactional = store.begin()?;
    match work(transactional) {
        Ok(value) => {
            store.commit()?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = store.rollback() {
                tracing::warn!("rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

/// Opens a record store for the given backend.
///
/// `path` is the SQLite database file and is ignored for the memory backend.
pub fn open_store(backend: StoreBackend, path: &Path) -> StoreResult<Box<dyn RecordStore>> {
    match backend {
        StoreBackend::Memory => Ok(Box::new(MemoryStore::new())),
        StoreBackend::Sqlite => Ok(Box::new(SqliteStore::open(path)?)),
    }
}

/// Current Unix time in seconds, used for `created_at`.
pub(crate) fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Converts a serializable value into a row.
pub fn to_row<T: Serialize>(value: &T) -> StoreResult<Row> {
    match serde_json::to_value(value)? {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::Serialization(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Converts a row into a typed record.
pub fn from_row<T: DeserializeOwned>(row: Row) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Converts a list of rows into typed records.
pub fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> StoreResult<Vec<T>> {
    rows.into_iter().map(from_row).collect()
}
