// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Participant Module
//!
//! Participants, their classification attributes, and the records that link
//! them to activity types and activities.

pub mod validation;

pub use validation::{validate_description, validate_name, ValidationError};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Staff classification of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantRole {
    Physiotherapist,
    Volunteer,
}

impl ParticipantRole {
    pub const ALL: [ParticipantRole; 2] =
        [ParticipantRole::Physiotherapist, ParticipantRole::Volunteer];

    /// Wire name as stored in the `participant_role` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Physiotherapist => "PHYSIOTHERAPIST",
            ParticipantRole::Volunteer => "VOLUNTEER",
        }
    }
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipantRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown participant role: {}", s))
    }
}

/// How a participant found their way to the organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Influx {
    Wgc,
    Bov,
    Physio,
    Other,
    Unknown,
}

impl Influx {
    pub const ALL: [Influx; 5] = [
        Influx::Wgc,
        Influx::Bov,
        Influx::Physio,
        Influx::Other,
        Influx::Unknown,
    ];

    /// Wire name as stored in the `influx` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Influx::Wgc => "WGC",
            Influx::Bov => "BOV",
            Influx::Physio => "PHYSIO",
            Influx::Other => "OTHER",
            Influx::Unknown => "UNKNOWN",
        }
    }

    /// `Unknown` carries no information and counts as unset.
    pub fn is_known(&self) -> bool {
        !matches!(self, Influx::Unknown)
    }
}

impl fmt::Display for Influx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Influx {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|influx| influx.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown influx: {}", s))
    }
}

/// Returns the influx only when it carries information.
pub fn known_influx(influx: Option<Influx>) -> Option<Influx> {
    influx.filter(Influx::is_known)
}

/// A participant as read from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub participant_role: Option<ParticipantRole>,
    #[serde(default)]
    pub influx: Option<Influx>,
    /// Activity type ids, assembled from link rows. Never stored on the row itself.
    #[serde(default, skip_serializing)]
    pub activity_types: Vec<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl Participant {
    /// Creates a participant with no attributes (mostly useful in tests).
    pub fn new(id: &str, first_name: &str, last_name: &str) -> Self {
        Participant {
            id: id.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            participant_role: None,
            influx: None,
            activity_types: Vec::new(),
            created_at: None,
        }
    }

    /// First and last name joined by a single space.
    pub fn full_name(&self) -> String {
        full_name(&self.first_name, &self.last_name)
    }

    /// Case-folded full name used for similarity comparison.
    pub fn comparison_name(&self) -> String {
        self.full_name().to_lowercase()
    }

    /// Exact-duplicate key: `lower(first)_lower(last)`.
    pub fn duplicate_key(&self) -> String {
        format!(
            "{}_{}",
            self.first_name.to_lowercase(),
            self.last_name.to_lowercase()
        )
    }

    /// Whether this participant is staff (physiotherapist or volunteer).
    pub fn is_staff(&self) -> bool {
        self.participant_role.is_some()
    }
}

/// Joins a first and last name with a single space.
pub fn full_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name, last_name)
}

/// Fields supplied when creating or editing a participant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewParticipant {
    pub first_name: String,
    pub last_name: String,
    pub participant_role: Option<ParticipantRole>,
    pub influx: Option<Influx>,
    pub activity_types: Vec<String>,
}

impl NewParticipant {
    pub fn new(first_name: &str, last_name: &str) -> Self {
        NewParticipant {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: ParticipantRole) -> Self {
        self.participant_role = Some(role);
        self
    }

    pub fn with_influx(mut self, influx: Influx) -> Self {
        self.influx = Some(influx);
        self
    }

    pub fn with_activity_types<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.activity_types = ids.into_iter().map(Into::into).collect();
        self
    }
}

/// Link between a participant and an activity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantActivityType {
    pub id: String,
    pub participant_id: String,
    pub activity_type_id: String,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// A participant's registration for an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub id: String,
    pub participant_id: String,
    pub activity_id: String,
    #[serde(default)]
    pub attended: Option<bool>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// A staff member assigned to run an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityAssignee {
    pub id: String,
    pub activity_id: String,
    pub participant_id: String,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// A kind of activity participants can sign up for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// A scheduled occurrence of an activity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub activity_type_id: String,
    /// ISO 8601 date or date-time.
    pub date: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}
