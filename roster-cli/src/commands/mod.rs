// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI Commands

pub mod activities;
pub mod duplicates;
pub mod merge;
pub mod participants;

use std::collections::HashMap;

use anyhow::{bail, Result};
use dialoguer::Confirm;
use roster_core::{ActivityType, Participant, RecordStore, Roster, RosterError};

/// Roster handle used by every command.
pub type CliRoster = Roster<Box<dyn RecordStore>>;

/// Shortest id prefix accepted in place of a full id.
const MIN_PREFIX_LEN: usize = 4;

/// Finds a participant by full id or unique id prefix.
pub fn resolve_participant(roster: &CliRoster, query: &str) -> Result<Participant> {
    match roster.participant(query) {
        Ok(participant) => return Ok(participant),
        Err(RosterError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    if query.len() >= MIN_PREFIX_LEN {
        let mut matches: Vec<Participant> = roster
            .participants(None)?
            .into_iter()
            .filter(|p| p.id.starts_with(query))
            .collect();
        match matches.len() {
            0 => {}
            1 => return Ok(matches.remove(0)),
            n => bail!("ID prefix '{}' matches {} participants", query, n),
        }
    }
    bail!("Participant '{}' not found", query)
}

/// Finds an activity type by id or case-insensitive name.
pub fn resolve_activity_type(roster: &CliRoster, query: &str) -> Result<ActivityType> {
    let types = roster.activity_types()?;
    types
        .into_iter()
        .find(|t| t.id == query || t.name.eq_ignore_ascii_case(query))
        .ok_or_else(|| anyhow::anyhow!("Activity type '{}' not found", query))
}

/// Activity type names keyed by id.
pub fn activity_type_names(roster: &CliRoster) -> Result<HashMap<String, String>> {
    Ok(roster
        .activity_types()?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect())
}

/// Asks for confirmation unless `assume_yes` is set.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
