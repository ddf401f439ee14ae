// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Record store behaviour shared by the memory and SQLite backends.

mod common;

use common::stores;
use roster_core::{
    atomically, open_store, Collection, ErrorCategory, Filter, NewParticipant, Order, Roster,
    SqliteStore, StoreBackend, StoreError,
};
use serde_json::json;
use tempfile::TempDir;

fn row(value: serde_json::Value) -> roster_core::Row {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("not an object: {}", other),
    }
}

#[test]
fn test_sqlite_file_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("roster.db");

    let id = {
        let roster = Roster::new(SqliteStore::open(&path).unwrap());
        roster
            .add_participant(NewParticipant::new("Jan", "Bakker"))
            .unwrap()
            .id
    };

    let reopened = Roster::new(SqliteStore::open(&path).unwrap());
    let jan = reopened.participant(&id).unwrap();
    assert_eq!(jan.full_name(), "Jan Bakker");
    assert!(jan.created_at.is_some());
}

#[test]
fn test_open_store_for_each_backend() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("roster.db");

    for backend in [StoreBackend::Memory, StoreBackend::Sqlite] {
        let store = open_store(backend, &path).unwrap();
        let inserted = store
            .insert(
                Collection::ActivityTypes,
                vec![row(json!({ "name": "Walking" }))],
            )
            .unwrap();
        assert_eq!(inserted.len(), 1, "{:?}", backend);
    }
    assert!(path.exists());
}

#[test]
fn test_backends_report_the_same_error_kinds() {
    for (name, store) in stores() {
        let roster = Roster::new(store);
        let walk = roster.add_activity_type("Walking", None).unwrap();
        let activity = roster.add_activity(&walk.id, "2026-05-01", None).unwrap();
        let jan = roster
            .add_participant(NewParticipant::new("Jan", "Bakker"))
            .unwrap();
        roster.add_registration(&jan.id, &activity.id).unwrap();
        let store = roster.store();

        let duplicate = store.insert(
            Collection::Registrations,
            vec![row(json!({ "participant_id": jan.id, "activity_id": activity.id }))],
        );
        assert!(matches!(duplicate, Err(StoreError::Conflict(_))), "{}", name);

        let orphan = store.insert(
            Collection::Registrations,
            vec![row(json!({ "participant_id": "ghost", "activity_id": activity.id }))],
        );
        assert!(matches!(orphan, Err(StoreError::Constraint(_))), "{}", name);

        let referenced = store.delete(Collection::Participants, &Filter::by_id(&jan.id));
        let err = referenced.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Constraint, "{}", name);

        let missing = store.update(
            Collection::Participants,
            "ghost",
            row(json!({ "first_name": "Piet" })),
        );
        assert!(matches!(missing, Err(StoreError::NotFound(_))), "{}", name);

        let unknown = store.query(Collection::Participants, &Filter::where_eq("age", 3), None);
        assert!(matches!(unknown, Err(StoreError::InvalidQuery(_))), "{}", name);

        assert_eq!(
            store
                .delete(Collection::Registrations, &Filter::by_id("ghost"))
                .unwrap(),
            0,
            "{}",
            name
        );
    }
}

#[test]
fn test_backends_order_ties_by_insertion() {
    for (name, store) in stores() {
        let roster = Roster::new(store);
        let walk = roster.add_activity_type("Walking", None).unwrap();
        let first = roster.add_activity(&walk.id, "2026-05-01", Some("first")).unwrap();
        let second = roster.add_activity(&walk.id, "2026-05-01", Some("second")).unwrap();
        let latest = roster.add_activity(&walk.id, "2026-06-01", None).unwrap();

        let ids: Vec<String> = roster
            .store()
            .query(Collection::Activities, &Filter::all(), Some(&Order::desc("date")))
            .unwrap()
            .into_iter()
            .filter_map(|r| r.get("id").and_then(|v| v.as_str()).map(str::to_string))
            .collect();
        assert_eq!(ids, vec![latest.id, first.id, second.id], "{}", name);
    }
}

#[test]
fn test_in_filter_matches_listed_values_only() {
    for (name, store) in stores() {
        let roster = Roster::new(store);
        let a = roster.add_participant(NewParticipant::new("Ann", "Lee")).unwrap();
        let b = roster.add_participant(NewParticipant::new("Bob", "Fox")).unwrap();
        roster.add_participant(NewParticipant::new("Cas", "Dam")).unwrap();

        let rows = roster
            .store()
            .query(
                Collection::Participants,
                &Filter::any_of("id", [a.id.as_str(), b.id.as_str(), "ghost"]),
                Some(&Order::asc("first_name")),
            )
            .unwrap();
        assert_eq!(rows.len(), 2, "{}", name);

        let none: [&str; 0] = [];
        let rows = roster
            .store()
            .query(Collection::Participants, &Filter::any_of("id", none), None)
            .unwrap();
        assert!(rows.is_empty(), "{}", name);
    }
}

#[test]
fn test_atomically_rolls_back_on_error() {
    for (name, store) in stores() {
        let result: Result<(), StoreError> = atomically(&store, |transactional| {
            assert!(transactional);
            store.insert(
                Collection::ActivityTypes,
                vec![row(json!({ "name": "Walking" }))],
            )?;
            Err(StoreError::Backend("abort".into()))
        });

        assert!(result.is_err(), "{}", name);
        let left = store
            .query(Collection::ActivityTypes, &Filter::all(), None)
            .unwrap();
        assert!(left.is_empty(), "{}", name);
    }
}

#[test]
fn test_null_filter_finds_unclassified_participants() {
    for (name, store) in stores() {
        let roster = Roster::new(store);
        roster
            .add_participant(
                NewParticipant::new("Piet", "Jong")
                    .with_role(roster_core::ParticipantRole::Volunteer),
            )
            .unwrap();
        roster.add_participant(NewParticipant::new("Ann", "Lee")).unwrap();

        let rows = roster
            .store()
            .query(
                Collection::Participants,
                &Filter::all().and_is_null("participant_role"),
                None,
            )
            .unwrap();
        assert_eq!(rows.len(), 1, "{}", name);
        assert_eq!(rows[0]["first_name"], json!("Ann"), "{}", name);
    }
}

#[test]
fn test_whole_roster_scan_beyond_sqlite_variable_limit() {
    for (name, store) in stores() {
        let rows = (0..33_000)
            .map(|i| row(json!({ "first_name": format!("Name{}", i), "last_name": "Lee" })))
            .collect();
        store.insert(Collection::Participants, rows).unwrap();

        let roster = Roster::new(store);
        let walk = roster.add_activity_type("Walking", None).unwrap();
        let jan = roster
            .add_participant(NewParticipant::new("Jan", "Bakker").with_activity_types([&walk.id]))
            .unwrap();
        roster.add_participant(NewParticipant::new("jan", "bakker")).unwrap();

        let everyone = roster.participants(None).unwrap();
        assert_eq!(everyone.len(), 33_002, "{}", name);
        let loaded = everyone.iter().find(|p| p.id == jan.id).unwrap();
        assert_eq!(loaded.activity_types, vec![walk.id.clone()], "{}", name);

        let groups = roster.duplicate_groups().unwrap();
        assert_eq!(groups.len(), 1, "{}", name);
        assert_eq!(groups[0].count(), 2, "{}", name);
    }
}
