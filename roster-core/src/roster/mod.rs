// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Roster Service
//!
//! Participant, activity and registration operations over an injected
//! record store, plus the duplicate detection and merge entry points.

mod activities;
mod error;

pub use error::{RosterError, RosterResult};

use std::collections::{HashMap, HashSet};

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::dedup::{
    find_duplicate_participants, find_similar_to, DuplicateGroup, GreedyClustering,
    GroupingStrategy, MergeCoordinator, MergeReport, SimilarityPolicy,
};
use crate::participant::{
    validate_name, NewParticipant, Participant, ParticipantActivityType, ParticipantRole,
};
use crate::store::{
    atomically, from_row, from_rows, Collection, Filter, MemoryStore, Order, RecordStore, Row,
    StoreError,
};

/// Participant and activity service.
///
/// Owns the record store and the similarity policy used for fuzzy
/// duplicate detection.
///
/// # Example
///
/// ```ignore
/// use roster_core::{NewParticipant, Roster};
///
/// let roster = Roster::in_memory();
/// let jan = roster.add_participant(NewParticipant::new("Jan", "Bakker"))?;
/// let dup = roster.add_participant(NewParticipant::new("jan", "bakker"))?;
///
/// for group in roster.duplicate_groups()? {
///     let (primary, rest) = group.participant_ids.split_first().unwrap();
///     roster.merge_participants(primary, rest)?;
/// }
/// ```
pub struct Roster<S: RecordStore = MemoryStore> {
    store: S,
    policy: SimilarityPolicy,
}

impl Roster<MemoryStore> {
    /// Creates a roster over an empty in-memory store.
    pub fn in_memory() -> Self {
        Roster::new(MemoryStore::new())
    }
}

impl<S: RecordStore> Roster<S> {
    /// Creates a roster over `store` with the default similarity policy.
    pub fn new(store: S) -> Self {
        Roster {
            store,
            policy: SimilarityPolicy::default(),
        }
    }

    /// Replaces the similarity policy.
    pub fn with_policy(mut self, policy: SimilarityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &SimilarityPolicy {
        &self.policy
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // === Participant Operations ===

    /// Adds a participant and links it to its activity types.
    pub fn add_participant(&self, new: NewParticipant) -> RosterResult<Participant> {
        let fields = participant_fields(&new)?;
        let type_ids = unique_ids(&new.activity_types);

        let mut participant = atomically(&self.store, |_| -> RosterResult<Participant> {
            let stored = self.store.insert(Collection::Participants, vec![fields])?;
            let row = stored
                .into_iter()
                .next()
                .ok_or_else(|| StoreError::Backend("insert returned no row".into()))?;
            let participant: Participant = from_row(row)?;
            self.link_activity_types(&participant.id, &type_ids)?;
            Ok(participant)
        })?;
        participant.activity_types = type_ids;

        info!("added participant {}", participant.id);
        Ok(participant)
    }

    /// Overwrites a participant's fields and replaces its activity types.
    pub fn update_participant(&self, id: &str, new: NewParticipant) -> RosterResult<Participant> {
        let fields = participant_fields(&new)?;
        let type_ids = unique_ids(&new.activity_types);

        atomically(&self.store, |_| -> RosterResult<()> {
            match self.store.update(Collection::Participants, id, fields) {
                Err(StoreError::NotFound(_)) => {
                    return Err(RosterError::NotFound(format!("participant {}", id)))
                }
                other => other?,
            }
            self.store.delete(
                Collection::ParticipantActivityTypes,
                &Filter::where_eq("participant_id", id),
            )?;
            self.link_activity_types(id, &type_ids)?;
            Ok(())
        })?;

        debug!("updated participant {}", id);
        self.participant(id)
    }

    /// Deletes a participant after its links, registrations and assignments.
    pub fn delete_participant(&self, id: &str) -> RosterResult<()> {
        atomically(&self.store, |_| -> RosterResult<()> {
            let by_participant = Filter::where_eq("participant_id", id);
            self.store
                .delete(Collection::ParticipantActivityTypes, &by_participant)?;
            self.store.delete(Collection::Registrations, &by_participant)?;
            self.store
                .delete(Collection::ActivityAssignees, &by_participant)?;

            let removed = self
                .store
                .delete(Collection::Participants, &Filter::by_id(id))?;
            if removed == 0 {
                return Err(RosterError::NotFound(format!("participant {}", id)));
            }
            Ok(())
        })?;

        info!("deleted participant {}", id);
        Ok(())
    }

    /// Returns one participant with its activity types.
    pub fn participant(&self, id: &str) -> RosterResult<Participant> {
        let rows = self
            .store
            .query(Collection::Participants, &Filter::by_id(id), None)?;
        let found = self.with_activity_types(from_rows(rows)?)?;
        found
            .into_iter()
            .next()
            .ok_or_else(|| RosterError::NotFound(format!("participant {}", id)))
    }

    /// Lists participants by first name, optionally only those linked to
    /// an activity type.
    pub fn participants(&self, activity_type_id: Option<&str>) -> RosterResult<Vec<Participant>> {
        let filter = match activity_type_id {
            Some(type_id) => {
                let links: Vec<ParticipantActivityType> = from_rows(self.store.query(
                    Collection::ParticipantActivityTypes,
                    &Filter::where_eq("activity_type_id", type_id),
                    None,
                )?)?;
                Filter::any_of("id", links.into_iter().map(|link| link.participant_id))
            }
            None => Filter::all(),
        };

        let rows = self.store.query(
            Collection::Participants,
            &filter,
            Some(&Order::asc("first_name")),
        )?;
        self.with_activity_types(from_rows(rows)?)
    }

    /// Lists physiotherapists and volunteers by first name.
    pub fn staff(&self) -> RosterResult<Vec<Participant>> {
        let rows = self.store.query(
            Collection::Participants,
            &Filter::any_of(
                "participant_role",
                ParticipantRole::ALL.iter().map(ParticipantRole::as_str),
            ),
            Some(&Order::asc("first_name")),
        )?;
        self.with_activity_types(from_rows(rows)?)
    }

    /// Links one more activity type to a participant.
    pub fn add_activity_type_to_participant(
        &self,
        participant_id: &str,
        activity_type_id: &str,
    ) -> RosterResult<()> {
        self.link_activity_types(participant_id, &[activity_type_id.to_string()])?;
        Ok(())
    }

    fn link_activity_types(&self, participant_id: &str, type_ids: &[String]) -> RosterResult<()> {
        if type_ids.is_empty() {
            return Ok(());
        }
        let rows = type_ids
            .iter()
            .map(|type_id| {
                let mut row = Row::new();
                row.insert("participant_id".into(), Value::from(participant_id));
                row.insert("activity_type_id".into(), Value::from(type_id.as_str()));
                row
            })
            .collect();
        self.store
            .insert(Collection::ParticipantActivityTypes, rows)?;
        Ok(())
    }

    /// Fills `activity_types` from link rows with one batched read.
    fn with_activity_types(
        &self,
        mut participants: Vec<Participant>,
    ) -> RosterResult<Vec<Participant>> {
        if participants.is_empty() {
            return Ok(participants);
        }

        let links: Vec<ParticipantActivityType> = from_rows(self.store.query(
            Collection::ParticipantActivityTypes,
            &Filter::any_of("participant_id", participants.iter().map(|p| p.id.as_str())),
            None,
        )?)?;

        let mut by_participant: HashMap<String, Vec<String>> = HashMap::new();
        for link in links {
            by_participant
                .entry(link.participant_id)
                .or_default()
                .push(link.activity_type_id);
        }
        for participant in &mut participants {
            participant.activity_types = by_participant.remove(&participant.id).unwrap_or_default();
        }
        Ok(participants)
    }

    // === Duplicate Operations ===

    /// Groups participants with exactly matching names (case-insensitive).
    pub fn duplicate_groups(&self) -> RosterResult<Vec<DuplicateGroup>> {
        Ok(find_duplicate_participants(&self.participants(None)?))
    }

    /// Groups participants with similar names under the roster's policy.
    pub fn similar_name_groups(&self) -> RosterResult<Vec<DuplicateGroup>> {
        self.group_with(&GreedyClustering::new(self.policy))
    }

    /// Groups participants with any grouping strategy.
    pub fn group_with<G: GroupingStrategy + ?Sized>(
        &self,
        strategy: &G,
    ) -> RosterResult<Vec<DuplicateGroup>> {
        Ok(strategy.group(&self.participants(None)?))
    }

    /// Returns participants whose name is similar to the candidate name.
    pub fn find_similar_participants(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> RosterResult<Vec<Participant>> {
        let all = self.participants(None)?;
        Ok(
            find_similar_to(&all, first_name.trim(), last_name.trim(), &self.policy)
                .into_iter()
                .cloned()
                .collect(),
        )
    }

    /// Merges secondary participants into the primary.
    pub fn merge_participants<T: AsRef<str>>(
        &self,
        primary_id: &str,
        secondary_ids: &[T],
    ) -> RosterResult<MergeReport> {
        Ok(MergeCoordinator::new(&self.store).merge(primary_id, secondary_ids)?)
    }
}

/// Validates names and builds the participant row.
fn participant_fields(new: &NewParticipant) -> RosterResult<Row> {
    let first_name = validate_name("First name", &new.first_name)?;
    let last_name = validate_name("Last name", &new.last_name)?;

    let mut row = Row::new();
    row.insert("first_name".into(), Value::from(first_name));
    row.insert("last_name".into(), Value::from(last_name));
    row.insert("participant_role".into(), json!(new.participant_role));
    row.insert("influx".into(), json!(new.influx));
    Ok(row)
}

/// Drops repeated ids, keeping the first occurrence.
fn unique_ids(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::{Influx, ValidationError};

    fn roster_with_types() -> (Roster, String, String) {
        let roster = Roster::in_memory();
        let walk = roster.add_activity_type("Walking", None).unwrap();
        let swim = roster.add_activity_type("Swimming", None).unwrap();
        (roster, walk.id, swim.id)
    }

    #[test]
    fn test_add_participant_links_types() {
        let (roster, walk, swim) = roster_with_types();
        let added = roster
            .add_participant(
                NewParticipant::new(" Jan ", "Bakker")
                    .with_influx(Influx::Bov)
                    .with_activity_types([walk.clone(), swim.clone(), walk.clone()]),
            )
            .unwrap();

        assert_eq!(added.first_name, "Jan");
        assert_eq!(added.activity_types, vec![walk.clone(), swim.clone()]);

        let loaded = roster.participant(&added.id).unwrap();
        assert_eq!(loaded.influx, Some(Influx::Bov));
        assert_eq!(loaded.activity_types.len(), 2);
    }

    #[test]
    fn test_invalid_name_rejected_before_store() {
        let roster = Roster::in_memory();
        let err = roster
            .add_participant(NewParticipant::new("J", "Bakker"))
            .unwrap_err();
        assert!(matches!(
            err,
            RosterError::Validation(ValidationError::TooShort { .. })
        ));
        assert_eq!(roster.store().count(Collection::Participants), 0);
    }

    #[test]
    fn test_unknown_activity_type_leaves_nothing_behind() {
        let roster = Roster::in_memory();
        let result = roster.add_participant(
            NewParticipant::new("Jan", "Bakker").with_activity_types(["missing"]),
        );
        assert!(result.is_err());
        assert_eq!(roster.store().count(Collection::Participants), 0);
    }

    #[test]
    fn test_update_replaces_link_set() {
        let (roster, walk, swim) = roster_with_types();
        let jan = roster
            .add_participant(NewParticipant::new("Jan", "Bakker").with_activity_types([&walk]))
            .unwrap();

        let updated = roster
            .update_participant(
                &jan.id,
                NewParticipant::new("Jan", "Bakker-Smit")
                    .with_role(ParticipantRole::Volunteer)
                    .with_activity_types([&swim]),
            )
            .unwrap();

        assert_eq!(updated.last_name, "Bakker-Smit");
        assert_eq!(updated.participant_role, Some(ParticipantRole::Volunteer));
        assert_eq!(updated.activity_types, vec![swim]);
    }

    #[test]
    fn test_update_missing_participant() {
        let roster = Roster::in_memory();
        let err = roster
            .update_participant("nope", NewParticipant::new("Jan", "Bakker"))
            .unwrap_err();
        assert!(matches!(err, RosterError::NotFound(_)));
    }

    #[test]
    fn test_delete_removes_dependents() {
        let (roster, walk, _) = roster_with_types();
        let jan = roster
            .add_participant(NewParticipant::new("Jan", "Bakker").with_activity_types([&walk]))
            .unwrap();
        let activity = roster.add_activity(&walk, "2026-03-01", None).unwrap();
        roster.add_registration(&jan.id, &activity.id).unwrap();
        roster.assign_participant(&jan.id, &activity.id).unwrap();

        roster.delete_participant(&jan.id).unwrap();

        let store = roster.store();
        assert_eq!(store.count(Collection::Participants), 0);
        assert_eq!(store.count(Collection::ParticipantActivityTypes), 0);
        assert_eq!(store.count(Collection::Registrations), 0);
        assert_eq!(store.count(Collection::ActivityAssignees), 0);
    }

    #[test]
    fn test_delete_missing_participant() {
        let roster = Roster::in_memory();
        assert!(matches!(
            roster.delete_participant("nope"),
            Err(RosterError::NotFound(_))
        ));
    }

    #[test]
    fn test_participants_sorted_and_filtered() {
        let (roster, walk, _) = roster_with_types();
        roster
            .add_participant(NewParticipant::new("Zoe", "Smit").with_activity_types([&walk]))
            .unwrap();
        roster
            .add_participant(NewParticipant::new("Ann", "Lee"))
            .unwrap();

        let names: Vec<_> = roster
            .participants(None)
            .unwrap()
            .into_iter()
            .map(|p| p.first_name)
            .collect();
        assert_eq!(names, vec!["Ann", "Zoe"]);

        let walkers = roster.participants(Some(&walk)).unwrap();
        assert_eq!(walkers.len(), 1);
        assert_eq!(walkers[0].first_name, "Zoe");
    }

    #[test]
    fn test_staff_only_lists_roles() {
        let roster = Roster::in_memory();
        roster
            .add_participant(NewParticipant::new("Piet", "Jong").with_role(ParticipantRole::Physiotherapist))
            .unwrap();
        roster
            .add_participant(NewParticipant::new("Ann", "Lee"))
            .unwrap();
        roster
            .add_participant(NewParticipant::new("Bob", "Fox").with_role(ParticipantRole::Volunteer))
            .unwrap();

        let staff: Vec<_> = roster
            .staff()
            .unwrap()
            .into_iter()
            .map(|p| p.first_name)
            .collect();
        assert_eq!(staff, vec!["Bob", "Piet"]);
    }

    #[test]
    fn test_staff_and_assignees_carry_activity_types() {
        let (roster, walk, swim) = roster_with_types();
        let eva = roster
            .add_participant(
                NewParticipant::new("Eva", "Vries")
                    .with_role(ParticipantRole::Volunteer)
                    .with_activity_types([walk.clone(), swim.clone()]),
            )
            .unwrap();
        let activity = roster.add_activity(&walk, "2026-03-01", None).unwrap();
        roster.assign_participant(&eva.id, &activity.id).unwrap();

        let mut expected = vec![walk, swim];
        expected.sort();

        let staff = roster.staff().unwrap();
        assert_eq!(staff.len(), 1);
        let mut types = staff[0].activity_types.clone();
        types.sort();
        assert_eq!(types, expected);

        let assignees = roster.assignees(&activity.id).unwrap();
        assert_eq!(assignees.len(), 1);
        let mut types = assignees[0].activity_types.clone();
        types.sort();
        assert_eq!(types, expected);
    }

    #[test]
    fn test_find_similar_participants() {
        let roster = Roster::in_memory();
        roster
            .add_participant(NewParticipant::new("Anna", "Smith"))
            .unwrap();
        roster
            .add_participant(NewParticipant::new("Bob", "Fox"))
            .unwrap();

        let hits = roster.find_similar_participants("Ana", "Smith").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].first_name, "Anna");
    }

    #[test]
    fn test_duplicate_groups_then_merge() {
        let roster = Roster::in_memory();
        let a = roster
            .add_participant(NewParticipant::new("Jan", "Bakker"))
            .unwrap();
        let b = roster
            .add_participant(NewParticipant::new("jan", "bakker").with_influx(Influx::Wgc))
            .unwrap();

        let groups = roster.duplicate_groups().unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups[0].contains(&a.id) && groups[0].contains(&b.id));

        let report = roster.merge_participants(&a.id, &[&b.id]).unwrap();
        assert_eq!(report.participants_removed, 1);
        assert_eq!(roster.participant(&a.id).unwrap().influx, Some(Influx::Wgc));
        assert!(roster.duplicate_groups().unwrap().is_empty());
    }

    #[test]
    fn test_custom_policy_used_for_fuzzy_groups() {
        let roster = Roster::in_memory().with_policy(SimilarityPolicy::new(0.99, 0));
        roster
            .add_participant(NewParticipant::new("Ann", "Lee"))
            .unwrap();
        roster
            .add_participant(NewParticipant::new("Anne", "Lee"))
            .unwrap();
        assert!(roster.similar_name_groups().unwrap().is_empty());
    }
}
