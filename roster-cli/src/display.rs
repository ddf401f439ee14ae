// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Display Helpers
//!
//! Terminal output formatting and styling.

use console::style;
use roster_core::{
    Activity, ActivityType, DuplicateGroup, MergeReport, Participant, Registration,
};
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Prints a success message.
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Prints an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Prints a warning message.
pub fn warning(msg: &str) {
    println!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Prints an info message.
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

#[derive(Tabled)]
struct ParticipantRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Influx")]
    influx: String,
    #[tabled(rename = "Activity types")]
    activity_types: String,
}

/// Displays participants as a table. `type_names` maps activity type ids
/// to names.
pub fn participants_table(participants: &[Participant], type_names: &dyn Fn(&str) -> String) {
    let rows: Vec<ParticipantRow> = participants
        .iter()
        .map(|p| ParticipantRow {
            id: p.id.clone(),
            name: p.full_name(),
            role: or_dash(p.participant_role.map(|r| r.to_string())),
            influx: or_dash(p.influx.map(|i| i.to_string())),
            activity_types: p
                .activity_types
                .iter()
                .map(|id| type_names(id))
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
}

/// Displays one participant with its registrations.
pub fn participant_details(
    participant: &Participant,
    type_names: &dyn Fn(&str) -> String,
    registrations: &[Registration],
) {
    println!();
    println!("  {}", style(participant.full_name()).bold().cyan());
    println!("  ID: {}", style(&participant.id).dim());
    println!(
        "  Role: {}",
        or_dash(participant.participant_role.map(|r| r.to_string()))
    );
    println!(
        "  Influx: {}",
        or_dash(participant.influx.map(|i| i.to_string()))
    );
    if participant.activity_types.is_empty() {
        println!("  Activity types: {}", style("(none)").dim());
    } else {
        let names: Vec<String> = participant
            .activity_types
            .iter()
            .map(|id| type_names(id))
            .collect();
        println!("  Activity types: {}", names.join(", "));
    }
    let attended = registrations
        .iter()
        .filter(|r| r.attended == Some(true))
        .count();
    println!(
        "  Registrations: {} ({} attended)",
        registrations.len(),
        attended
    );
    println!();
}

/// Displays duplicate groups with member names.
pub fn duplicate_groups(groups: &[DuplicateGroup], name_of: &dyn Fn(&str) -> String) {
    for (i, group) in groups.iter().enumerate() {
        println!(
            "  {}. {}  {}",
            i + 1,
            style(&group.label).bold(),
            style(format!("({} records)", group.count())).dim()
        );
        for id in &group.participant_ids {
            println!("       {}  {}", style(id).dim(), name_of(id));
        }
    }
}

#[derive(Tabled)]
struct ActivityTypeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
}

pub fn activity_types_table(types: &[ActivityType]) {
    let rows: Vec<ActivityTypeRow> = types
        .iter()
        .map(|t| ActivityTypeRow {
            id: t.id.clone(),
            name: t.name.clone(),
            description: or_dash(t.description.clone()),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
}

#[derive(Tabled)]
struct ActivityRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Type")]
    activity_type: String,
    #[tabled(rename = "Staff")]
    staff: String,
    #[tabled(rename = "Comment")]
    comment: String,
}

/// Displays activities with their type name and assigned staff.
pub fn activities_table(activities: &[(Activity, String, Vec<Participant>)]) {
    let rows: Vec<ActivityRow> = activities
        .iter()
        .map(|(activity, type_name, staff)| ActivityRow {
            id: activity.id.clone(),
            date: activity.date.clone(),
            activity_type: type_name.clone(),
            staff: staff
                .iter()
                .map(Participant::full_name)
                .collect::<Vec<_>>()
                .join(", "),
            comment: or_dash(activity.comment.clone()),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
}

/// Summarizes what a merge changed.
pub fn merge_report(report: &MergeReport, primary_name: &str) {
    success(&format!(
        "Merged {} record(s) into {}",
        report.participants_removed, primary_name
    ));
    println!(
        "  {} activity type link(s), {} registration(s), {} assignment(s) moved",
        report.activity_types_linked, report.registrations_added, report.assignments_added
    );
    if report.fields_updated {
        println!("  Role or influx filled in from merged records");
    }
}
