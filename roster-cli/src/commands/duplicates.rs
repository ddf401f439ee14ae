// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Duplicates Command
//!
//! Lists groups of participants that are likely the same person.

use std::collections::HashMap;

use anyhow::Result;
use roster_core::{DuplicateGroup, TransitiveClustering};

use crate::config::CliConfig;
use crate::display;

/// How to group participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matching {
    /// Same first and last name, ignoring case.
    Exact,
    /// Similar names, greedy single pass.
    Fuzzy,
    /// Similar names, following chains of similarity.
    Transitive,
}

pub fn run(config: &CliConfig, matching: Matching, json: bool) -> Result<()> {
    let roster = config.open_roster()?;
    let groups: Vec<DuplicateGroup> = match matching {
        Matching::Exact => roster.duplicate_groups()?,
        Matching::Fuzzy => roster.similar_name_groups()?,
        Matching::Transitive => roster.group_with(&TransitiveClustering::new(config.policy))?,
    };

    if json {
        let value: Vec<_> = groups
            .iter()
            .map(|g| {
                serde_json::json!({
                    "label": g.label,
                    "count": g.count(),
                    "participant_ids": g.participant_ids,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if groups.is_empty() {
        display::success("No duplicates found");
        return Ok(());
    }

    let names: HashMap<String, String> = roster
        .participants(None)?
        .into_iter()
        .map(|p| {
            let name = p.full_name();
            (p.id, name)
        })
        .collect();

    println!();
    println!("Possible duplicates ({} group(s)):", groups.len());
    println!();
    display::duplicate_groups(&groups, &|id| names.get(id).cloned().unwrap_or_default());
    println!();
    display::info("Merge a group with: roster merge <primary-id> <other-id>...");

    Ok(())
}
