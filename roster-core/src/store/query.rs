// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Collections, rows, filters and orderings understood by every store.

use std::fmt;

use serde_json::Value;

use super::{now_secs, StoreError, StoreResult};

/// A single record as exchanged with the store.
pub type Row = serde_json::Map<String, Value>;

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Bool,
}

/// Column metadata.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
}

const fn text(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Text,
        nullable: false,
    }
}

const fn optional_text(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Text,
        nullable: true,
    }
}

const ID: Column = text("id");
const CREATED_AT: Column = Column {
    name: "created_at",
    kind: ColumnKind::Integer,
    nullable: false,
};

const ACTIVITY_TYPE_COLUMNS: &[Column] = &[
    ID,
    text("name"),
    optional_text("description"),
    CREATED_AT,
];

const ACTIVITY_COLUMNS: &[Column] = &[
    ID,
    text("activity_type_id"),
    text("date"),
    optional_text("comment"),
    CREATED_AT,
];

const PARTICIPANT_COLUMNS: &[Column] = &[
    ID,
    text("first_name"),
    text("last_name"),
    optional_text("participant_role"),
    optional_text("influx"),
    CREATED_AT,
];

const PARTICIPANT_ACTIVITY_TYPE_COLUMNS: &[Column] = &[
    ID,
    text("participant_id"),
    text("activity_type_id"),
    CREATED_AT,
];

const REGISTRATION_COLUMNS: &[Column] = &[
    ID,
    text("participant_id"),
    text("activity_id"),
    Column {
        name: "attended",
        kind: ColumnKind::Bool,
        nullable: true,
    },
    CREATED_AT,
];

const ASSIGNEE_COLUMNS: &[Column] = &[
    ID,
    text("activity_id"),
    text("participant_id"),
    CREATED_AT,
];

/// A foreign key from a column to the `id` of a parent collection.
#[derive(Debug, Clone, Copy)]
pub struct Reference {
    pub column: &'static str,
    pub parent: Collection,
}

/// Named collections held by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    ActivityTypes,
    Activities,
    Participants,
    ParticipantActivityTypes,
    Registrations,
    ActivityAssignees,
}

impl Collection {
    /// Every collection, parents before children.
    pub const ALL: [Collection; 6] = [
        Collection::ActivityTypes,
        Collection::Activities,
        Collection::Participants,
        Collection::ParticipantActivityTypes,
        Collection::Registrations,
        Collection::ActivityAssignees,
    ];

    /// Table name in the backing store.
    pub fn table(&self) -> &'static str {
        match self {
            Collection::ActivityTypes => "activity_types",
            Collection::Activities => "activities",
            Collection::Participants => "participants",
            Collection::ParticipantActivityTypes => "participant_activity_types",
            Collection::Registrations => "registrations",
            Collection::ActivityAssignees => "activity_assignees",
        }
    }

    /// Columns in declaration order. The first column is always `id`.
    pub fn columns(&self) -> &'static [Column] {
        match self {
            Collection::ActivityTypes => ACTIVITY_TYPE_COLUMNS,
            Collection::Activities => ACTIVITY_COLUMNS,
            Collection::Participants => PARTICIPANT_COLUMNS,
            Collection::ParticipantActivityTypes => PARTICIPANT_ACTIVITY_TYPE_COLUMNS,
            Collection::Registrations => REGISTRATION_COLUMNS,
            Collection::ActivityAssignees => ASSIGNEE_COLUMNS,
        }
    }

    /// Column sets that must be unique across rows (besides `id`).
    pub fn unique_keys(&self) -> &'static [&'static [&'static str]] {
        match self {
            Collection::ParticipantActivityTypes => &[&["participant_id", "activity_type_id"]],
            Collection::Registrations => &[&["participant_id", "activity_id"]],
            Collection::ActivityAssignees => &[&["activity_id", "participant_id"]],
            _ => &[],
        }
    }

    /// Foreign keys held by this collection.
    pub fn references(&self) -> &'static [Reference] {
        match self {
            Collection::Activities => &[Reference {
                column: "activity_type_id",
                parent: Collection::ActivityTypes,
            }],
            Collection::ParticipantActivityTypes => &[
                Reference {
                    column: "participant_id",
                    parent: Collection::Participants,
                },
                Reference {
                    column: "activity_type_id",
                    parent: Collection::ActivityTypes,
                },
            ],
            Collection::Registrations => &[
                Reference {
                    column: "participant_id",
                    parent: Collection::Participants,
                },
                Reference {
                    column: "activity_id",
                    parent: Collection::Activities,
                },
            ],
            Collection::ActivityAssignees => &[
                Reference {
                    column: "activity_id",
                    parent: Collection::Activities,
                },
                Reference {
                    column: "participant_id",
                    parent: Collection::Participants,
                },
            ],
            _ => &[],
        }
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns().iter().find(|c| c.name == name)
    }

    /// Returns an `InvalidQuery` error unless `name` is a column of this collection.
    pub fn check_field(&self, name: &str) -> StoreResult<&'static Column> {
        self.column(name).ok_or_else(|| {
            StoreError::InvalidQuery(format!("{} has no field '{}'", self.table(), name))
        })
    }

    /// Checks that `value` fits the column `field`.
    pub fn check_value(&self, field: &str, value: &Value) -> StoreResult<()> {
        let column = self.check_field(field)?;
        let ok = match (column.kind, value) {
            (_, Value::Null) => column.nullable,
            (ColumnKind::Text, Value::String(_)) => true,
            (ColumnKind::Integer, Value::Number(n)) => n.is_i64(),
            (ColumnKind::Bool, Value::Bool(_)) => true,
            _ => false,
        };
        if ok {
            Ok(())
        } else if value.is_null() {
            Err(StoreError::Constraint(format!(
                "{}.{} may not be null",
                self, field
            )))
        } else {
            Err(StoreError::InvalidQuery(format!(
                "{}.{} has the wrong type: {}",
                self, field, value
            )))
        }
    }

    /// Validates a row for insertion: rejects unknown fields, assigns `id`
    /// and `created_at` when absent, fills missing columns with null and
    /// checks every value against its column.
    pub fn prepare_row(&self, mut row: Row) -> StoreResult<Row> {
        for field in row.keys() {
            self.check_field(field)?;
        }
        if !row.get("id").is_some_and(Value::is_string) {
            row.insert(
                "id".to_string(),
                Value::String(uuid::Uuid::new_v4().to_string()),
            );
        }
        if !row.get("created_at").is_some_and(Value::is_i64) {
            row.insert("created_at".to_string(), Value::from(now_secs()));
        }
        for column in self.columns() {
            let value = row.entry(column.name).or_insert(Value::Null);
            self.check_value(column.name, value)?;
        }
        Ok(row)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// A single predicate on a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    In(String, Vec<Value>),
    IsNull(String),
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Eq(field, _) | Condition::In(field, _) | Condition::IsNull(field) => field,
        }
    }

    /// Evaluates the condition against an in-memory row.
    pub fn matches(&self, row: &Row) -> bool {
        let value = row.get(self.field()).unwrap_or(&Value::Null);
        match self {
            Condition::Eq(_, expected) => value == expected,
            Condition::In(_, options) => options.iter().any(|o| o == value),
            Condition::IsNull(_) => value.is_null(),
        }
    }
}

/// Conjunction of conditions. The empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches rows whose `field` equals `value`.
    pub fn where_eq(field: &str, value: impl Into<Value>) -> Self {
        Self::all().and_eq(field, value)
    }

    /// Matches rows whose `field` is any of `values`. An empty list matches nothing.
    pub fn any_of<I, V>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::all().and_any_of(field, values)
    }

    /// Matches the row with the given `id`.
    pub fn by_id(id: &str) -> Self {
        Self::where_eq("id", id)
    }

    pub fn and_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Eq(field.to_string(), value.into()));
        self
    }

    pub fn and_any_of<I, V>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.conditions.push(Condition::In(
            field.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn and_is_null(mut self, field: &str) -> Self {
        self.conditions.push(Condition::IsNull(field.to_string()));
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }

    /// Checks every referenced field exists in `collection`.
    pub fn validate(&self, collection: Collection) -> StoreResult<()> {
        for condition in &self.conditions {
            collection.check_field(condition.field())?;
        }
        Ok(())
    }
}

/// Sort order for query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(field: &str) -> Self {
        Order {
            field: field.to_string(),
            ascending: true,
        }
    }

    pub fn desc(field: &str) -> Self {
        Order {
            field: field.to_string(),
            ascending: false,
        }
    }
}
