// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Participants Command
//!
//! List, add, edit and remove participants.

use anyhow::{bail, Result};
use roster_core::{Influx, NewParticipant, ParticipantRole};

use super::{
    activity_type_names, confirm, resolve_activity_type, resolve_participant, CliRoster,
};
use crate::config::CliConfig;
use crate::display;

/// Fields accepted by `participants add` and `participants update`.
#[derive(Debug, Default)]
pub struct ParticipantArgs {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<ParticipantRole>,
    pub influx: Option<Influx>,
    /// Activity type ids or names.
    pub activity_types: Vec<String>,
    /// Update only: reset the role to none.
    pub clear_role: bool,
    /// Update only: reset the influx to none.
    pub clear_influx: bool,
    /// Update only: unlink every activity type.
    pub clear_activity_types: bool,
}

fn resolve_types(roster: &CliRoster, queries: &[String]) -> Result<Vec<String>> {
    queries
        .iter()
        .map(|q| resolve_activity_type(roster, q).map(|t| t.id))
        .collect()
}

/// Lists participants.
pub fn list(
    config: &CliConfig,
    activity_type: Option<&str>,
    staff_only: bool,
    json: bool,
) -> Result<()> {
    let roster = config.open_roster()?;
    let participants = if staff_only {
        roster.staff()?
    } else {
        let type_id = match activity_type {
            Some(query) => Some(resolve_activity_type(&roster, query)?.id),
            None => None,
        };
        roster.participants(type_id.as_deref())?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&participants)?);
        return Ok(());
    }

    if participants.is_empty() {
        display::info("No participants yet. Add one with:");
        println!("  roster participants add <first-name> <last-name>");
        return Ok(());
    }

    let names = activity_type_names(&roster)?;
    println!();
    println!("Participants ({}):", participants.len());
    println!();
    display::participants_table(&participants, &|id| {
        names.get(id).cloned().unwrap_or_else(|| id.to_string())
    });
    println!();

    Ok(())
}

/// Shows one participant.
pub fn show(config: &CliConfig, id: &str) -> Result<()> {
    let roster = config.open_roster()?;
    let participant = resolve_participant(&roster, id)?;
    let registrations = roster.registrations_for_participant(&participant.id)?;
    let names = activity_type_names(&roster)?;

    display::participant_details(
        &participant,
        &|id| names.get(id).cloned().unwrap_or_else(|| id.to_string()),
        &registrations,
    );
    Ok(())
}

/// Adds a participant, warning about similar existing names first.
///
/// With `strict`, a similar name aborts the add.
pub fn add(config: &CliConfig, args: ParticipantArgs, strict: bool) -> Result<()> {
    let roster = config.open_roster()?;
    let first_name = args.first_name.unwrap_or_default();
    let last_name = args.last_name.unwrap_or_default();

    let similar = roster.find_similar_participants(&first_name, &last_name)?;
    if !similar.is_empty() {
        display::warning(&format!(
            "{} similar participant(s) already exist:",
            similar.len()
        ));
        for p in &similar {
            println!("    {}  {}", p.id, p.full_name());
        }
        if strict {
            bail!("Not adding '{} {}' (--strict)", first_name, last_name);
        }
    }

    let mut new = NewParticipant::new(&first_name, &last_name)
        .with_activity_types(resolve_types(&roster, &args.activity_types)?);
    new.participant_role = args.role;
    new.influx = args.influx;

    let participant = roster.add_participant(new)?;
    display::success(&format!("Added {}", participant.full_name()));
    println!("  ID: {}", participant.id);
    Ok(())
}

/// Updates a participant. Omitted fields keep their current value; given
/// activity types replace the current set. The `clear_*` flags reset a field
/// to absent.
pub fn update(config: &CliConfig, id: &str, args: ParticipantArgs) -> Result<()> {
    let roster = config.open_roster()?;
    let current = resolve_participant(&roster, id)?;

    let activity_types = if args.clear_activity_types {
        Vec::new()
    } else if args.activity_types.is_empty() {
        current.activity_types.clone()
    } else {
        resolve_types(&roster, &args.activity_types)?
    };
    let participant_role = if args.clear_role {
        None
    } else {
        args.role.or(current.participant_role)
    };
    let influx = if args.clear_influx {
        None
    } else {
        args.influx.or(current.influx)
    };
    let new = NewParticipant {
        first_name: args.first_name.unwrap_or(current.first_name),
        last_name: args.last_name.unwrap_or(current.last_name),
        participant_role,
        influx,
        activity_types,
    };

    let updated = roster.update_participant(&current.id, new)?;
    display::success(&format!("Updated {}", updated.full_name()));
    Ok(())
}

/// Removes a participant and everything linked to it.
pub fn remove(config: &CliConfig, id: &str, assume_yes: bool) -> Result<()> {
    let roster = config.open_roster()?;
    let participant = resolve_participant(&roster, id)?;

    let prompt = format!(
        "Remove {} and all of their registrations?",
        participant.full_name()
    );
    if !confirm(&prompt, assume_yes)? {
        display::info("Cancelled");
        return Ok(());
    }

    roster.delete_participant(&participant.id)?;
    display::success(&format!("Removed {}", participant.full_name()));
    Ok(())
}

/// Lists participants with a name similar to the given one.
pub fn similar(config: &CliConfig, first_name: &str, last_name: &str) -> Result<()> {
    let roster = config.open_roster()?;
    let matches = roster.find_similar_participants(first_name, last_name)?;

    if matches.is_empty() {
        display::info(&format!("No participants similar to '{} {}'", first_name, last_name));
        return Ok(());
    }

    println!();
    println!("Similar to '{} {}':", first_name, last_name);
    println!();
    for (i, p) in matches.iter().enumerate() {
        let score = roster_core::similarity_ratio(
            &roster_core::participant::full_name(first_name, last_name),
            &p.full_name(),
        );
        println!(
            "  {}. {}  {}  {}",
            i + 1,
            console::style(p.full_name()).bold(),
            console::style(&p.id).dim(),
            console::style(format!("{:.0}%", score * 100.0)).dim()
        );
    }
    println!();
    Ok(())
}
