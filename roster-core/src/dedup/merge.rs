// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Participant Merge
//!
//! Folds one or more secondary participants into a primary participant:
//! classification attributes are reconciled, activity type links,
//! registrations and staff assignments are unioned onto the primary, and
//! the secondaries are removed together with their dependent rows.
//!
//! All reads happen before the first write. Writes run inside a unit of
//! work when the store offers one; otherwise every step is idempotent, so
//! re-running the whole merge after a failure is safe.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::participant::{
    known_influx, ActivityAssignee, Influx, Participant, ParticipantActivityType,
    ParticipantRole, Registration,
};
use crate::store::{
    atomically, from_rows, Collection, Filter, RecordStore, Row, StoreError, StoreResult,
};

/// Write steps of a merge, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStep {
    LinkActivityTypes,
    AddRegistrations,
    AddAssignments,
    UpdatePrimary,
    RemoveDependents,
    RemoveSecondaries,
}

impl fmt::Display for MergeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MergeStep::LinkActivityTypes => "link activity types",
            MergeStep::AddRegistrations => "add registrations",
            MergeStep::AddAssignments => "add assignments",
            MergeStep::UpdatePrimary => "update primary",
            MergeStep::RemoveDependents => "remove dependent rows",
            MergeStep::RemoveSecondaries => "remove secondaries",
        };
        f.write_str(name)
    }
}

/// Merge error types.
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("primary participant not found: {0}")]
    PrimaryNotFound(String),

    /// Failure before any change was made, or rolled back by the store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A write failed after earlier writes were applied on a store without
    /// transactions. Re-running the same merge completes it.
    #[error("merge incomplete at step '{step}': {source}")]
    Incomplete {
        step: MergeStep,
        #[source]
        source: StoreError,
    },
}

impl MergeError {
    /// Whether retrying the whole merge is the expected recovery.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MergeError::Incomplete { .. })
    }
}

/// A participant together with the rows that depend on it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantSnapshot {
    pub participant: Participant,
    pub activity_type_ids: Vec<String>,
    pub registrations: Vec<Registration>,
    pub assignments: Vec<ActivityAssignee>,
}

impl ParticipantSnapshot {
    pub fn new(participant: Participant) -> Self {
        ParticipantSnapshot {
            participant,
            activity_type_ids: Vec::new(),
            registrations: Vec::new(),
            assignments: Vec::new(),
        }
    }
}

/// A registration to create on the primary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRegistration {
    pub activity_id: String,
    /// Attendance of the first secondary registration for this activity.
    pub attended: Option<bool>,
}

/// Outcome of reconciling a primary with its secondaries.
#[derive(Debug, Clone, PartialEq)]
pub struct MergePlan {
    pub influx: Option<Influx>,
    pub participant_role: Option<ParticipantRole>,
    pub influx_changed: bool,
    pub role_changed: bool,
    /// Activity type ids to link to the primary.
    pub activity_type_ids: Vec<String>,
    pub registrations: Vec<PlannedRegistration>,
    /// Activity ids the primary should be assigned to.
    pub assignment_activity_ids: Vec<String>,
}

impl MergePlan {
    pub fn changes_fields(&self) -> bool {
        self.influx_changed || self.role_changed
    }
}

/// Reconciles a primary with its secondaries, in the given order.
///
/// An unset or `UNKNOWN` influx and an unset role are filled from the first
/// secondary that has a value; later secondaries never override. Links,
/// registrations and assignments are unioned, skipping anything the
/// primary already has and keeping one row per activity.
pub fn plan_merge(primary: &ParticipantSnapshot, secondaries: &[&ParticipantSnapshot]) -> MergePlan {
    let mut influx = primary.participant.influx;
    let mut role = primary.participant.participant_role;

    let mut linked: HashSet<&str> = primary
        .activity_type_ids
        .iter()
        .map(String::as_str)
        .collect();
    let mut registered: HashSet<&str> = primary
        .registrations
        .iter()
        .map(|r| r.activity_id.as_str())
        .collect();
    let mut assigned: HashSet<&str> = primary
        .assignments
        .iter()
        .map(|a| a.activity_id.as_str())
        .collect();

    let mut activity_type_ids = Vec::new();
    let mut registrations = Vec::new();
    let mut assignment_activity_ids = Vec::new();

    for secondary in secondaries {
        if known_influx(influx).is_none() {
            if let Some(found) = known_influx(secondary.participant.influx) {
                influx = Some(found);
            }
        }
        if role.is_none() {
            role = secondary.participant.participant_role;
        }

        for type_id in &secondary.activity_type_ids {
            if linked.insert(type_id) {
                activity_type_ids.push(type_id.clone());
            }
        }
        for registration in &secondary.registrations {
            if registered.insert(&registration.activity_id) {
                registrations.push(PlannedRegistration {
                    activity_id: registration.activity_id.clone(),
                    attended: registration.attended,
                });
            }
        }
        for assignment in &secondary.assignments {
            if assigned.insert(&assignment.activity_id) {
                assignment_activity_ids.push(assignment.activity_id.clone());
            }
        }
    }

    MergePlan {
        influx_changed: influx != primary.participant.influx,
        role_changed: role != primary.participant.participant_role,
        influx,
        participant_role: role,
        activity_type_ids,
        registrations,
        assignment_activity_ids,
    }
}

/// What a merge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub primary_id: String,
    pub activity_types_linked: usize,
    pub registrations_added: usize,
    pub assignments_added: usize,
    pub fields_updated: bool,
    pub participants_removed: usize,
}

/// Loads participants and their dependent rows in four batched reads.
pub fn load_snapshots<S: RecordStore + ?Sized>(
    store: &S,
    ids: &[&str],
) -> StoreResult<HashMap<String, ParticipantSnapshot>> {
    let participants: Vec<Participant> = from_rows(store.query(
        Collection::Participants,
        &Filter::any_of("id", ids.iter().copied()),
        None,
    )?)?;
    let mut snapshots: HashMap<String, ParticipantSnapshot> = participants
        .into_iter()
        .map(|p| (p.id.clone(), ParticipantSnapshot::new(p)))
        .collect();

    let by_participant = Filter::any_of("participant_id", ids.iter().copied());

    let links: Vec<ParticipantActivityType> = from_rows(store.query(
        Collection::ParticipantActivityTypes,
        &by_participant,
        None,
    )?)?;
    for link in links {
        if let Some(snapshot) = snapshots.get_mut(&link.participant_id) {
            snapshot.activity_type_ids.push(link.activity_type_id.clone());
            snapshot.participant.activity_types.push(link.activity_type_id);
        }
    }

    let registrations: Vec<Registration> =
        from_rows(store.query(Collection::Registrations, &by_participant, None)?)?;
    for registration in registrations {
        if let Some(snapshot) = snapshots.get_mut(&registration.participant_id) {
            snapshot.registrations.push(registration);
        }
    }

    let assignments: Vec<ActivityAssignee> =
        from_rows(store.query(Collection::ActivityAssignees, &by_participant, None)?)?;
    for assignment in assignments {
        if let Some(snapshot) = snapshots.get_mut(&assignment.participant_id) {
            snapshot.assignments.push(assignment);
        }
    }

    Ok(snapshots)
}

/// Tracks applied writes so failures can be classified.
struct WriteProgress {
    transactional: bool,
    applied: usize,
}

impl WriteProgress {
    fn run<T>(
        &mut self,
        step: MergeStep,
        write: impl FnOnce() -> StoreResult<T>,
    ) -> Result<T, MergeError> {
        debug!("merge step: {}", step);
        match write() {
            Ok(value) => {
                self.applied += 1;
                Ok(value)
            }
            Err(source) if !self.transactional && self.applied > 0 => {
                Err(MergeError::Incomplete { step, source })
            }
            Err(source) => Err(MergeError::Store(source)),
        }
    }
}

fn link_row(participant_id: &str, other_field: &str, other_id: &str) -> Row {
    let mut row = Row::new();
    row.insert("participant_id".into(), Value::from(participant_id));
    row.insert(other_field.into(), Value::from(other_id));
    row
}

/// Merges secondary participants into a primary through a record store.
pub struct MergeCoordinator<'a, S: RecordStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> MergeCoordinator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        MergeCoordinator { store }
    }

    /// Merges `secondary_ids` into `primary_id`.
    ///
    /// Returns immediately when there are no secondaries. Duplicate ids and
    /// the primary's own id are ignored. A secondary missing from the store
    /// contributes nothing. Fails with `PrimaryNotFound` when the primary
    /// does not exist.
    pub fn merge<T: AsRef<str>>(
        &self,
        primary_id: &str,
        secondary_ids: &[T],
    ) -> Result<MergeReport, MergeError> {
        let mut seen = HashSet::new();
        let mut secondaries: Vec<&str> = Vec::with_capacity(secondary_ids.len());
        for id in secondary_ids.iter().map(AsRef::as_ref) {
            if id == primary_id {
                warn!("ignoring primary {} listed as its own secondary", primary_id);
                continue;
            }
            if seen.insert(id) {
                secondaries.push(id);
            }
        }

        if secondaries.is_empty() {
            return Ok(MergeReport {
                primary_id: primary_id.to_string(),
                ..Default::default()
            });
        }

        let report = atomically(self.store, |transactional| {
            self.run(primary_id, &secondaries, transactional)
        })?;

        info!(
            "merged {} participant(s) into {}: {} activity type link(s), {} registration(s), {} assignment(s)",
            report.participants_removed,
            primary_id,
            report.activity_types_linked,
            report.registrations_added,
            report.assignments_added
        );
        Ok(report)
    }

    fn run(
        &self,
        primary_id: &str,
        secondaries: &[&str],
        transactional: bool,
    ) -> Result<MergeReport, MergeError> {
        let mut ids = Vec::with_capacity(secondaries.len() + 1);
        ids.push(primary_id);
        ids.extend_from_slice(secondaries);

        let mut snapshots = load_snapshots(self.store, &ids)?;
        let primary = snapshots
            .remove(primary_id)
            .ok_or_else(|| MergeError::PrimaryNotFound(primary_id.to_string()))?;

        let mut sources = Vec::with_capacity(secondaries.len());
        for id in secondaries {
            match snapshots.get(*id) {
                Some(snapshot) => sources.push(snapshot),
                None => warn!("secondary participant {} not found, skipping", id),
            }
        }

        let plan = plan_merge(&primary, &sources);
        let mut progress = WriteProgress {
            transactional,
            applied: 0,
        };
        let mut report = MergeReport {
            primary_id: primary_id.to_string(),
            ..Default::default()
        };

        if !plan.activity_type_ids.is_empty() {
            let rows = plan
                .activity_type_ids
                .iter()
                .map(|type_id| link_row(primary_id, "activity_type_id", type_id))
                .collect();
            report.activity_types_linked = progress
                .run(MergeStep::LinkActivityTypes, || {
                    self.store.insert(Collection::ParticipantActivityTypes, rows)
                })?
                .len();
        }

        if !plan.registrations.is_empty() {
            let rows = plan
                .registrations
                .iter()
                .map(|planned| {
                    let mut row = link_row(primary_id, "activity_id", &planned.activity_id);
                    row.insert("attended".into(), json!(planned.attended));
                    row
                })
                .collect();
            report.registrations_added = progress
                .run(MergeStep::AddRegistrations, || {
                    self.store.insert(Collection::Registrations, rows)
                })?
                .len();
        }

        if !plan.assignment_activity_ids.is_empty() {
            let rows = plan
                .assignment_activity_ids
                .iter()
                .map(|activity_id| link_row(primary_id, "activity_id", activity_id))
                .collect();
            report.assignments_added = progress
                .run(MergeStep::AddAssignments, || {
                    self.store.insert(Collection::ActivityAssignees, rows)
                })?
                .len();
        }

        if plan.changes_fields() {
            let mut fields = Row::new();
            fields.insert("influx".into(), json!(plan.influx));
            fields.insert("participant_role".into(), json!(plan.participant_role));
            progress.run(MergeStep::UpdatePrimary, || {
                self.store.update(Collection::Participants, primary_id, fields)
            })?;
            report.fields_updated = true;
        }

        let by_participant = Filter::any_of("participant_id", secondaries.iter().copied());
        for dependent in [
            Collection::ParticipantActivityTypes,
            Collection::Registrations,
            Collection::ActivityAssignees,
        ] {
            progress.run(MergeStep::RemoveDependents, || {
                self.store.delete(dependent, &by_participant)
            })?;
        }

        report.participants_removed = progress.run(MergeStep::RemoveSecondaries, || {
            self.store.delete(
                Collection::Participants,
                &Filter::any_of("id", secondaries.iter().copied()),
            )
        })?;

        Ok(report)
    }
}

/// Merges `secondary_ids` into `primary_id` using `store`.
pub fn merge_participants<S, T>(
    store: &S,
    primary_id: &str,
    secondary_ids: &[T],
) -> Result<MergeReport, MergeError>
where
    S: RecordStore + ?Sized,
    T: AsRef<str>,
{
    MergeCoordinator::new(store).merge(primary_id, secondary_ids)
}
