// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Merge Command
//!
//! Folds duplicate participant records into one.

use anyhow::{bail, Result};
use roster_core::{MergeError, Participant, RosterError};

use super::{confirm, resolve_participant};
use crate::config::CliConfig;
use crate::display;

/// Merges `secondaries` into `primary` after confirmation.
pub fn run(
    config: &CliConfig,
    primary: &str,
    secondaries: &[String],
    assume_yes: bool,
) -> Result<()> {
    let roster = config.open_roster()?;
    let primary = resolve_participant(&roster, primary)?;

    let mut others: Vec<Participant> = Vec::with_capacity(secondaries.len());
    for query in secondaries {
        let participant = resolve_participant(&roster, query)?;
        if participant.id == primary.id {
            display::warning(&format!(
                "Skipping {}: it is the record being kept",
                participant.full_name()
            ));
            continue;
        }
        if !others.iter().any(|p| p.id == participant.id) {
            others.push(participant);
        }
    }
    if others.is_empty() {
        bail!("Nothing to merge: give at least one record other than the one being kept");
    }

    println!();
    println!("Keep:   {}  {}", primary.full_name(), console::style(&primary.id).dim());
    for p in &others {
        println!("Merge:  {}  {}", p.full_name(), console::style(&p.id).dim());
    }
    println!();

    let prompt = format!(
        "Merge {} record(s) into {}? Merged records are deleted.",
        others.len(),
        primary.full_name()
    );
    if !confirm(&prompt, assume_yes)? {
        display::info("Cancelled");
        return Ok(());
    }

    let ids: Vec<&str> = others.iter().map(|p| p.id.as_str()).collect();
    match roster.merge_participants(&primary.id, &ids) {
        Ok(report) => {
            display::merge_report(&report, &primary.full_name());
            Ok(())
        }
        Err(RosterError::Merge(e @ MergeError::Incomplete { .. })) => {
            display::warning(
                "The merge stopped part way. Run the same command again to finish it.",
            );
            Err(RosterError::Merge(e).into())
        }
        Err(e) => Err(e.into()),
    }
}
