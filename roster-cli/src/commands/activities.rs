// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Activities Command
//!
//! Activity types, scheduled activities, registrations and staff.

use anyhow::{bail, Result};

use super::{activity_type_names, resolve_activity_type, resolve_participant};
use crate::config::CliConfig;
use crate::display;

/// Lists activity types.
pub fn list_types(config: &CliConfig) -> Result<()> {
    let roster = config.open_roster()?;
    let types = roster.activity_types()?;

    if types.is_empty() {
        display::info("No activity types yet. Add one with:");
        println!("  roster activity-types add <name>");
        return Ok(());
    }

    println!();
    display::activity_types_table(&types);
    println!();
    Ok(())
}

/// Adds an activity type.
pub fn add_type(config: &CliConfig, name: &str, description: Option<&str>) -> Result<()> {
    let roster = config.open_roster()?;
    let activity_type = roster.add_activity_type(name, description)?;
    display::success(&format!("Added activity type {}", activity_type.name));
    println!("  ID: {}", activity_type.id);
    Ok(())
}

/// Lists activities, most recent first.
pub fn list(config: &CliConfig, activity_type: Option<&str>) -> Result<()> {
    let roster = config.open_roster()?;
    let type_id = match activity_type {
        Some(query) => Some(resolve_activity_type(&roster, query)?.id),
        None => None,
    };
    let activities = roster.activities(type_id.as_deref())?;

    if activities.is_empty() {
        display::info("No activities scheduled");
        return Ok(());
    }

    let names = activity_type_names(&roster)?;
    let mut rows = Vec::with_capacity(activities.len());
    for activity in activities {
        let type_name = names
            .get(&activity.activity_type_id)
            .cloned()
            .unwrap_or_else(|| activity.activity_type_id.clone());
        let staff = roster.assignees(&activity.id)?;
        rows.push((activity, type_name, staff));
    }

    println!();
    display::activities_table(&rows);
    println!();
    Ok(())
}

/// Schedules an activity.
pub fn add(
    config: &CliConfig,
    activity_type: &str,
    date: &str,
    comment: Option<&str>,
) -> Result<()> {
    let roster = config.open_roster()?;
    let activity_type = resolve_activity_type(&roster, activity_type)?;
    let activity = roster.add_activity(&activity_type.id, date, comment)?;
    display::success(&format!(
        "Scheduled {} on {}",
        activity_type.name, activity.date
    ));
    println!("  ID: {}", activity.id);
    Ok(())
}

/// Registers a participant for an activity.
pub fn register(config: &CliConfig, participant: &str, activity_id: &str) -> Result<()> {
    let roster = config.open_roster()?;
    let participant = resolve_participant(&roster, participant)?;
    let registration = roster.add_registration(&participant.id, activity_id)?;
    display::success(&format!("Registered {}", participant.full_name()));
    println!("  Registration ID: {}", registration.id);
    Ok(())
}

/// Deletes a registration.
pub fn unregister(config: &CliConfig, registration_id: &str) -> Result<()> {
    let roster = config.open_roster()?;
    if roster.delete_registration(registration_id)? {
        display::success("Registration removed");
    } else {
        display::warning(&format!("Registration '{}' not found", registration_id));
    }
    Ok(())
}

/// Records attendance for a registration.
pub fn attend(config: &CliConfig, registration_id: &str, absent: bool) -> Result<()> {
    let roster = config.open_roster()?;
    roster.set_attendance(registration_id, !absent)?;
    if absent {
        display::success("Marked as absent");
    } else {
        display::success("Marked as attended");
    }
    Ok(())
}

/// Assigns a staff member to an activity.
pub fn assign(config: &CliConfig, participant: &str, activity_id: &str) -> Result<()> {
    let roster = config.open_roster()?;
    let participant = resolve_participant(&roster, participant)?;
    if !participant.is_staff() {
        bail!(
            "{} is not staff; set a role with: roster participants update {} --role volunteer",
            participant.full_name(),
            participant.id
        );
    }
    roster.assign_participant(&participant.id, activity_id)?;
    display::success(&format!("Assigned {}", participant.full_name()));
    Ok(())
}

/// Removes a staff assignment.
pub fn unassign(config: &CliConfig, participant: &str, activity_id: &str) -> Result<()> {
    let roster = config.open_roster()?;
    let participant = resolve_participant(&roster, participant)?;
    if roster.unassign_participant(&participant.id, activity_id)? {
        display::success(&format!("Unassigned {}", participant.full_name()));
    } else {
        display::warning(&format!(
            "{} was not assigned to that activity",
            participant.full_name()
        ));
    }
    Ok(())
}
