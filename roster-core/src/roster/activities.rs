// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Activity types, activities, registrations and staff assignments.

use serde_json::{json, Value};
use tracing::debug;

use super::{Roster, RosterError, RosterResult};
use crate::participant::{
    validate_description, validate_name, Activity, ActivityAssignee, ActivityType,
    Participant, Registration, ValidationError,
};
use crate::store::{
    from_row, from_rows, Collection, Filter, Order, RecordStore, Row, StoreError,
};

impl<S: RecordStore> Roster<S> {
    // === Activity Type Operations ===

    /// Adds an activity type. The description is optional but validated
    /// when present.
    pub fn add_activity_type(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> RosterResult<ActivityType> {
        let name = validate_name("Name", name)?;
        let description = description.map(validate_description).transpose()?;

        let mut row = Row::new();
        row.insert("name".into(), Value::from(name));
        row.insert("description".into(), json!(description));
        self.insert_one(Collection::ActivityTypes, row)
    }

    /// Lists activity types by name.
    pub fn activity_types(&self) -> RosterResult<Vec<ActivityType>> {
        let rows = self.store.query(
            Collection::ActivityTypes,
            &Filter::all(),
            Some(&Order::asc("name")),
        )?;
        Ok(from_rows(rows)?)
    }

    // === Activity Operations ===

    /// Schedules an activity of the given type on `date`.
    pub fn add_activity(
        &self,
        activity_type_id: &str,
        date: &str,
        comment: Option<&str>,
    ) -> RosterResult<Activity> {
        let date = date.trim();
        if date.is_empty() {
            return Err(ValidationError::Required("Date".into()).into());
        }
        let comment = comment.map(str::trim).filter(|c| !c.is_empty());

        let mut row = Row::new();
        row.insert("activity_type_id".into(), Value::from(activity_type_id));
        row.insert("date".into(), Value::from(date));
        row.insert("comment".into(), json!(comment));
        self.insert_one(Collection::Activities, row)
    }

    /// Lists activities, most recent first, optionally of one type.
    pub fn activities(&self, activity_type_id: Option<&str>) -> RosterResult<Vec<Activity>> {
        let filter = match activity_type_id {
            Some(type_id) => Filter::where_eq("activity_type_id", type_id),
            None => Filter::all(),
        };
        let rows = self
            .store
            .query(Collection::Activities, &filter, Some(&Order::desc("date")))?;
        Ok(from_rows(rows)?)
    }

    // === Registration Operations ===

    /// Registers a participant for an activity.
    ///
    /// Registering the same pair twice fails with a store conflict.
    pub fn add_registration(
        &self,
        participant_id: &str,
        activity_id: &str,
    ) -> RosterResult<Registration> {
        let row = pair_row(participant_id, activity_id);
        let registration = self.insert_one(Collection::Registrations, row)?;
        debug!(
            "registered participant {} for activity {}",
            participant_id, activity_id
        );
        Ok(registration)
    }

    /// Records whether the participant showed up.
    pub fn set_attendance(&self, registration_id: &str, attended: bool) -> RosterResult<()> {
        let mut fields = Row::new();
        fields.insert("attended".into(), Value::from(attended));
        match self
            .store
            .update(Collection::Registrations, registration_id, fields)
        {
            Err(StoreError::NotFound(_)) => Err(RosterError::NotFound(format!(
                "registration {}",
                registration_id
            ))),
            other => Ok(other?),
        }
    }

    pub fn registrations_for_activity(&self, activity_id: &str) -> RosterResult<Vec<Registration>> {
        let rows = self.store.query(
            Collection::Registrations,
            &Filter::where_eq("activity_id", activity_id),
            None,
        )?;
        Ok(from_rows(rows)?)
    }

    pub fn registrations_for_participant(
        &self,
        participant_id: &str,
    ) -> RosterResult<Vec<Registration>> {
        let rows = self.store.query(
            Collection::Registrations,
            &Filter::where_eq("participant_id", participant_id),
            None,
        )?;
        Ok(from_rows(rows)?)
    }

    /// Deletes a registration by id. Returns whether a row was removed.
    pub fn delete_registration(&self, registration_id: &str) -> RosterResult<bool> {
        let removed = self
            .store
            .delete(Collection::Registrations, &Filter::by_id(registration_id))?;
        Ok(removed > 0)
    }

    // === Assignment Operations ===

    /// Assigns a staff member to run an activity.
    pub fn assign_participant(
        &self,
        participant_id: &str,
        activity_id: &str,
    ) -> RosterResult<ActivityAssignee> {
        self.insert_one(
            Collection::ActivityAssignees,
            pair_row(participant_id, activity_id),
        )
    }

    /// Removes a staff assignment. Returns whether a row was removed.
    pub fn unassign_participant(&self, participant_id: &str, activity_id: &str) -> RosterResult<bool> {
        let removed = self.store.delete(
            Collection::ActivityAssignees,
            &Filter::where_eq("participant_id", participant_id).and_eq("activity_id", activity_id),
        )?;
        Ok(removed > 0)
    }

    /// Participants assigned to an activity, by first name.
    pub fn assignees(&self, activity_id: &str) -> RosterResult<Vec<Participant>> {
        let assignments: Vec<ActivityAssignee> = from_rows(self.store.query(
            Collection::ActivityAssignees,
            &Filter::where_eq("activity_id", activity_id),
            None,
        )?)?;
        if assignments.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.store.query(
            Collection::Participants,
            &Filter::any_of("id", assignments.into_iter().map(|a| a.participant_id)),
            Some(&Order::asc("first_name")),
        )?;
        self.with_activity_types(from_rows(rows)?)
    }

    fn insert_one<T: serde::de::DeserializeOwned>(
        &self,
        collection: Collection,
        row: Row,
    ) -> RosterResult<T> {
        let row = self
            .store
            .insert(collection, vec![row])?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend(format!("insert into {} returned no row", collection)))?;
        Ok(from_row(row)?)
    }
}

fn pair_row(participant_id: &str, activity_id: &str) -> Row {
    let mut row = Row::new();
    row.insert("participant_id".into(), Value::from(participant_id));
    row.insert("activity_id".into(), Value::from(activity_id));
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::NewParticipant;
    use crate::store::ErrorCategory;

    fn setup() -> (Roster, Activity, Participant) {
        let roster = Roster::in_memory();
        let walk = roster
            .add_activity_type("Walking", Some("A relaxed walk around the park"))
            .unwrap();
        let activity = roster.add_activity(&walk.id, "2026-03-01", None).unwrap();
        let jan = roster
            .add_participant(NewParticipant::new("Jan", "Bakker"))
            .unwrap();
        (roster, activity, jan)
    }

    #[test]
    fn test_activity_type_description_validated() {
        let roster = Roster::in_memory();
        assert!(matches!(
            roster.add_activity_type("Walking", Some("short")),
            Err(RosterError::Validation(ValidationError::TooShort { .. }))
        ));
        let walk = roster.add_activity_type("Walking", None).unwrap();
        assert_eq!(walk.description, None);
    }

    #[test]
    fn test_activity_types_sorted_by_name() {
        let roster = Roster::in_memory();
        roster.add_activity_type("Yoga", None).unwrap();
        roster.add_activity_type("Aquafit", None).unwrap();
        let names: Vec<_> = roster
            .activity_types()
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Aquafit", "Yoga"]);
    }

    #[test]
    fn test_activities_most_recent_first() {
        let (roster, first, _) = setup();
        let later = roster
            .add_activity(&first.activity_type_id, "2026-04-12", Some("  bring water "))
            .unwrap();
        assert_eq!(later.comment.as_deref(), Some("bring water"));

        let ids: Vec<_> = roster
            .activities(None)
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![later.id, first.id]);
    }

    #[test]
    fn test_activity_requires_date() {
        let (roster, activity, _) = setup();
        assert!(matches!(
            roster.add_activity(&activity.activity_type_id, "  ", None),
            Err(RosterError::Validation(ValidationError::Required(_)))
        ));
    }

    #[test]
    fn test_duplicate_registration_conflicts() {
        let (roster, activity, jan) = setup();
        roster.add_registration(&jan.id, &activity.id).unwrap();
        let err = roster.add_registration(&jan.id, &activity.id).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Duplicate);
    }

    #[test]
    fn test_registration_lookup_and_delete() {
        let (roster, activity, jan) = setup();
        let registration = roster.add_registration(&jan.id, &activity.id).unwrap();
        assert_eq!(registration.attended, None);

        roster.set_attendance(&registration.id, true).unwrap();
        let by_activity = roster.registrations_for_activity(&activity.id).unwrap();
        assert_eq!(by_activity[0].attended, Some(true));
        assert_eq!(roster.registrations_for_participant(&jan.id).unwrap().len(), 1);

        assert!(roster.delete_registration(&registration.id).unwrap());
        assert!(!roster.delete_registration(&registration.id).unwrap());
        assert!(roster.registrations_for_activity(&activity.id).unwrap().is_empty());
    }

    #[test]
    fn test_assign_and_unassign() {
        let (roster, activity, jan) = setup();
        roster.assign_participant(&jan.id, &activity.id).unwrap();
        let assigned = roster.assignees(&activity.id).unwrap();
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].id, jan.id);

        assert!(roster.unassign_participant(&jan.id, &activity.id).unwrap());
        assert!(roster.assignees(&activity.id).unwrap().is_empty());
    }

    #[test]
    fn test_registration_for_unknown_activity_rejected() {
        let (roster, _, jan) = setup();
        let err = roster.add_registration(&jan.id, "missing").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Constraint);
    }
}
