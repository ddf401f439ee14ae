// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Common Test Utilities
//!
//! Store fixtures, seeded rosters and a store wrapper that injects write
//! failures.

#![allow(dead_code)]

pub mod strategies;

use std::cell::Cell;

use roster_core::{
    Collection, Filter, MemoryStore, NewParticipant, Order, Participant, RecordStore, Roster, Row,
    SqliteStore, StoreError, StoreResult,
};

/// One store of each kind, labelled for assertion messages.
pub fn stores() -> Vec<(&'static str, Box<dyn RecordStore>)> {
    vec![
        ("memory", Box::new(MemoryStore::new())),
        (
            "sqlite",
            Box::new(SqliteStore::in_memory().expect("open in-memory sqlite")),
        ),
    ]
}

/// Activity types and activities shared by merge scenarios.
pub struct Catalog {
    pub walking: String,
    pub swimming: String,
    pub yoga: String,
    pub walk_monday: String,
    pub walk_friday: String,
    pub swim_sunday: String,
}

pub fn seed_catalog<S: RecordStore>(roster: &Roster<S>) -> Catalog {
    let walking = roster.add_activity_type("Walking", None).unwrap().id;
    let swimming = roster.add_activity_type("Swimming", None).unwrap().id;
    let yoga = roster.add_activity_type("Yoga", None).unwrap().id;
    let walk_monday = roster.add_activity(&walking, "2026-03-02", None).unwrap().id;
    let walk_friday = roster.add_activity(&walking, "2026-03-06", None).unwrap().id;
    let swim_sunday = roster.add_activity(&swimming, "2026-03-08", None).unwrap().id;
    Catalog {
        walking,
        swimming,
        yoga,
        walk_monday,
        walk_friday,
        swim_sunday,
    }
}

pub fn add<S: RecordStore>(roster: &Roster<S>, new: NewParticipant) -> Participant {
    roster.add_participant(new).unwrap()
}

/// Number of rows in `collection` referencing `participant_id`.
pub fn rows_for<S: RecordStore + ?Sized>(
    store: &S,
    collection: Collection,
    participant_id: &str,
) -> usize {
    store
        .query(
            collection,
            &Filter::where_eq("participant_id", participant_id),
            None,
        )
        .unwrap()
        .len()
}

/// Every row of every collection, for before/after comparisons.
pub fn dump<S: RecordStore + ?Sized>(store: &S) -> Vec<Vec<Row>> {
    Collection::ALL
        .iter()
        .map(|collection| {
            store
                .query(*collection, &Filter::all(), Some(&Order::asc("id")))
                .unwrap()
        })
        .collect()
}

/// Store wrapper that fails the n-th write and counts every call.
///
/// When `transactional` is false the wrapper hides the inner store's unit
/// of work, so failures leave earlier writes in place.
pub struct FlakyStore<S> {
    inner: S,
    transactional: bool,
    fail_on_write: Cell<Option<usize>>,
    writes: Cell<usize>,
    calls: Cell<usize>,
}

impl<S: RecordStore> FlakyStore<S> {
    pub fn new(inner: S, transactional: bool) -> Self {
        FlakyStore {
            inner,
            transactional,
            fail_on_write: Cell::new(None),
            writes: Cell::new(0),
            calls: Cell::new(0),
        }
    }

    /// Fails the n-th write from now (1-based).
    pub fn fail_on_write(&self, n: usize) {
        self.writes.set(0);
        self.fail_on_write.set(Some(n));
    }

    pub fn heal(&self) {
        self.fail_on_write.set(None);
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn reset_calls(&self) {
        self.calls.set(0);
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn write(&self) -> StoreResult<()> {
        self.calls.set(self.calls.get() + 1);
        let n = self.writes.get() + 1;
        self.writes.set(n);
        if self.fail_on_write.get() == Some(n) {
            return Err(StoreError::Backend(format!("injected failure on write {}", n)));
        }
        Ok(())
    }
}

impl<S: RecordStore> RecordStore for FlakyStore<S> {
    fn query(
        &self,
        collection: Collection,
        filter: &Filter,
        order: Option<&Order>,
    ) -> StoreResult<Vec<Row>> {
        self.calls.set(self.calls.get() + 1);
        self.inner.query(collection, filter, order)
    }

    fn insert(&self, collection: Collection, rows: Vec<Row>) -> StoreResult<Vec<Row>> {
        self.write()?;
        self.inner.insert(collection, rows)
    }

    fn update(&self, collection: Collection, id: &str, fields: Row) -> StoreResult<()> {
        self.write()?;
        self.inner.update(collection, id, fields)
    }

    fn delete(&self, collection: Collection, filter: &Filter) -> StoreResult<usize> {
        self.write()?;
        self.inner.delete(collection, filter)
    }

    fn begin(&self) -> StoreResult<bool> {
        self.calls.set(self.calls.get() + 1);
        if self.transactional {
            self.inner.begin()
        } else {
            Ok(false)
        }
    }

    fn commit(&self) -> StoreResult<()> {
        if self.transactional {
            self.inner.commit()
        } else {
            Ok(())
        }
    }

    fn rollback(&self) -> StoreResult<()> {
        if self.transactional {
            self.inner.rollback()
        } else {
            Ok(())
        }
    }
}
