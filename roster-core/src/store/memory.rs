// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-Memory Record Store
//!
//! Keeps every collection in process memory. Enforces the same unique and
//! foreign keys as the SQLite schema so tests exercise the same failure
//! paths. Units of work snapshot the tables and restore them on rollback.
//!
//! Nothing survives the process; use [`super::SqliteStore`] for real data.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use super::{Collection, Filter, Order, RecordStore, Row, StoreError, StoreResult};

type Tables = BTreeMap<Collection, Vec<Row>>;

/// Record store backed by in-process tables.
///
/// A unit of work is a snapshot of every table: `begin` copies them and
/// `rollback` restores the copy. Writes from any caller between the two,
/// including other threads sharing the store, are discarded on rollback.
/// There is no isolation between concurrent units of work; share one store
/// across threads only if a single writer drives it.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    /// Table snapshot taken by `begin`, restored by `rollback`.
    snapshot: Mutex<Option<Tables>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryStore {
            tables: RwLock::new(Tables::new()),
            snapshot: Mutex::new(None),
        }
    }

    /// Returns the number of rows in a collection.
    pub fn count(&self, collection: Collection) -> usize {
        self.tables
            .read()
            .get(&collection)
            .map(|rows| rows.len())
            .unwrap_or(0)
    }

    /// Fails when `row` duplicates a unique key of another row in `rows`.
    fn check_unique(collection: Collection, rows: &[Row], row: &Row) -> StoreResult<()> {
        let id = row.get("id");
        if rows.iter().any(|existing| existing.get("id") == id) {
            return Err(StoreError::Conflict(format!(
                "{} already has a row with id {}",
                collection,
                id.unwrap_or(&Value::Null)
            )));
        }
        for key in collection.unique_keys() {
            let clash = rows
                .iter()
                .any(|existing| key.iter().all(|field| existing.get(*field) == row.get(*field)));
            if clash {
                return Err(StoreError::Conflict(format!(
                    "duplicate key ({}) in {}",
                    key.join(", "),
                    collection
                )));
            }
        }
        Ok(())
    }

    /// Fails when a foreign key of `row` points at a missing parent.
    fn check_parents(tables: &Tables, collection: Collection, row: &Row) -> StoreResult<()> {
        for reference in collection.references() {
            let target = row.get(reference.column).unwrap_or(&Value::Null);
            let exists = tables
                .get(&reference.parent)
                .is_some_and(|rows| rows.iter().any(|r| r.get("id") == Some(target)));
            if !exists {
                return Err(StoreError::Constraint(format!(
                    "{}.{} references missing {} {}",
                    collection, reference.column, reference.parent, target
                )));
            }
        }
        Ok(())
    }

    /// Fails when any row of another collection references one of `ids`.
    fn check_children(
        tables: &Tables,
        collection: Collection,
        ids: &HashSet<&Value>,
    ) -> StoreResult<()> {
        for child in Collection::ALL {
            for reference in child.references() {
                if reference.parent != collection {
                    continue;
                }
                let referenced = tables.get(&child).is_some_and(|rows| {
                    rows.iter().any(|r| {
                        r.get(reference.column)
                            .is_some_and(|value| ids.contains(value))
                    })
                });
                if referenced {
                    return Err(StoreError::Constraint(format!(
                        "{} rows are still referenced by {}.{}",
                        collection, child, reference.column
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Orders JSON values the way the SQLite store does: nulls first, then
/// numbers, then strings.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) | Value::Number(_) => 1,
            Value::String(_) => 2,
            _ => 3,
        }
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

impl RecordStore for MemoryStore {
    fn query(
        &self,
        collection: Collection,
        filter: &Filter,
        order: Option<&Order>,
    ) -> StoreResult<Vec<Row>> {
        filter.validate(collection)?;
        if let Some(order) = order {
            collection.check_field(&order.field)?;
        }

        let tables = self.tables.read();
        let mut rows: Vec<Row> = tables
            .get(&collection)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = order {
            let null = Value::Null;
            // Stable sort keeps insertion order for ties.
            rows.sort_by(|a, b| {
                let ordering = compare_values(
                    a.get(&order.field).unwrap_or(&null),
                    b.get(&order.field).unwrap_or(&null),
                );
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        Ok(rows)
    }

    fn insert(&self, collection: Collection, rows: Vec<Row>) -> StoreResult<Vec<Row>> {
        let mut tables = self.tables.write();

        let mut prepared = Vec::with_capacity(rows.len());
        for row in rows {
            let row = collection.prepare_row(row)?;
            Self::check_parents(&tables, collection, &row)?;
            let existing = tables.get(&collection).map(Vec::as_slice).unwrap_or(&[]);
            Self::check_unique(collection, existing, &row)?;
            Self::check_unique(collection, &prepared, &row)?;
            prepared.push(row);
        }

        tables
            .entry(collection)
            .or_default()
            .extend(prepared.iter().cloned());
        Ok(prepared)
    }

    fn update(&self, collection: Collection, id: &str, fields: Row) -> StoreResult<()> {
        if fields.contains_key("id") {
            return Err(StoreError::InvalidQuery(format!(
                "{}: id cannot be updated",
                collection
            )));
        }
        for (field, value) in &fields {
            collection.check_value(field, value)?;
        }

        let mut tables = self.tables.write();
        let mut updated = tables
            .get(&collection)
            .and_then(|rows| rows.iter().find(|r| r.get("id").and_then(Value::as_str) == Some(id)))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", collection, id)))?;
        updated.extend(fields);

        Self::check_parents(&tables, collection, &updated)?;
        let others: Vec<Row> = tables
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.get("id").and_then(Value::as_str) != Some(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Self::check_unique(collection, &others, &updated)?;

        if let Some(rows) = tables.get_mut(&collection) {
            for row in rows.iter_mut() {
                if row.get("id").and_then(Value::as_str) == Some(id) {
                    *row = updated;
                    break;
                }
            }
        }
        Ok(())
    }

    fn delete(&self, collection: Collection, filter: &Filter) -> StoreResult<usize> {
        filter.validate(collection)?;
        let mut tables = self.tables.write();

        let doomed: Vec<Value> = tables
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|r| filter.matches(r))
                    .filter_map(|r| r.get("id").cloned())
                    .collect()
            })
            .unwrap_or_default();
        if doomed.is_empty() {
            return Ok(0);
        }

        let ids: HashSet<&Value> = doomed.iter().collect();
        Self::check_children(&tables, collection, &ids)?;

        let rows = tables.entry(collection).or_default();
        let before = rows.len();
        rows.retain(|r| !filter.matches(r));
        Ok(before - rows.len())
    }

    fn begin(&self) -> StoreResult<bool> {
        let mut snapshot = self.snapshot.lock();
        if snapshot.is_some() {
            return Err(StoreError::Backend(
                "a unit of work is already open".to_string(),
            ));
        }
        *snapshot = Some(self.tables.read().clone());
        Ok(true)
    }

    fn commit(&self) -> StoreResult<()> {
        self.snapshot.lock().take();
        Ok(())
    }

    fn rollback(&self) -> StoreResult<()> {
        if let Some(saved) = self.snapshot.lock().take() {
            *self.tables.write() = saved;
        }
        Ok(())
    }
}
