// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! SQLite Record Store
//!
//! Maps collections onto tables created by the migration runner. Foreign
//! keys are enforced by SQLite, and constraint failures are translated into
//! `Conflict` (unique keys) or `Constraint` (foreign and not-null keys).

use std::path::Path;

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{ffi, params_from_iter, Connection, ErrorCode};
use serde_json::Value;

use super::migration::{self, MigrationRunner};
use super::{Collection, ColumnKind, Condition, Filter, Order, RecordStore, Row, StoreError, StoreResult};

/// `IN` lists longer than this are bound as a single JSON array.
const MAX_INLINE_VALUES: usize = 500;

/// SQLite-based record store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Creates an in-memory database (for testing).
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        MigrationRunner::run(&conn, &migration::all_migrations())?;
        Ok(SqliteStore { conn })
    }

    /// Returns the current schema version.
    pub fn schema_version(&self) -> StoreResult<u32> {
        MigrationRunner::current_version(&self.conn)
    }

    fn column_list(collection: Collection) -> String {
        collection
            .columns()
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Builds a `WHERE` clause and its parameters.
    fn where_clause(
        collection: Collection,
        filter: &Filter,
        params: &mut Vec<SqlValue>,
    ) -> StoreResult<String> {
        filter.validate(collection)?;
        if filter.conditions().is_empty() {
            return Ok(String::new());
        }

        let mut clauses = Vec::with_capacity(filter.conditions().len());
        for condition in filter.conditions() {
            let field = condition.field();
            let kind = collection.check_field(field)?.kind;
            let clause = match condition {
                Condition::Eq(_, Value::Null) | Condition::IsNull(_) => {
                    format!("{} IS NULL", field)
                }
                Condition::Eq(_, value) => {
                    params.push(to_sql(kind, value)?);
                    format!("{} = ?{}", field, params.len())
                }
                Condition::In(_, values) => {
                    let has_null = values.iter().any(Value::is_null);
                    let present: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
                    let membership = if present.len() > MAX_INLINE_VALUES {
                        // SQLite caps bound variables at 32766.
                        for value in &present {
                            to_sql(kind, value)?;
                        }
                        params.push(SqlValue::Text(serde_json::to_string(&present)?));
                        Some(format!(
                            "{} IN (SELECT value FROM json_each(?{}))",
                            field,
                            params.len()
                        ))
                    } else if present.is_empty() {
                        None
                    } else {
                        let mut placeholders = Vec::with_capacity(present.len());
                        for value in &present {
                            params.push(to_sql(kind, value)?);
                            placeholders.push(format!("?{}", params.len()));
                        }
                        Some(format!("{} IN ({})", field, placeholders.join(", ")))
                    };
                    match (membership, has_null) {
                        (None, false) => "0".to_string(),
                        (None, true) => format!("{} IS NULL", field),
                        (Some(membership), false) => membership,
                        (Some(membership), true) => {
                            format!("({} OR {} IS NULL)", membership, field)
                        }
                    }
                }
            };
            clauses.push(clause);
        }
        Ok(format!(" WHERE {}", clauses.join(" AND ")))
    }

    fn read_row(collection: Collection, row: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
        let mut out = Row::new();
        for (index, column) in collection.columns().iter().enumerate() {
            let value = match (column.kind, row.get_ref(index)?) {
                (_, ValueRef::Null) => Value::Null,
                (ColumnKind::Bool, ValueRef::Integer(i)) => Value::Bool(i != 0),
                (_, ValueRef::Integer(i)) => Value::from(i),
                (_, ValueRef::Real(f)) => Value::from(f),
                (_, ValueRef::Text(bytes)) => {
                    Value::String(String::from_utf8_lossy(bytes).into_owned())
                }
                (_, ValueRef::Blob(_)) => Value::Null,
            };
            out.insert(column.name.to_string(), value);
        }
        Ok(out)
    }

    fn insert_rows(&self, collection: Collection, rows: &[Row]) -> StoreResult<()> {
        let columns = collection.columns();
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            collection.table(),
            Self::column_list(collection),
            placeholders
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        for row in rows {
            let mut params = Vec::with_capacity(columns.len());
            for column in columns {
                let value = row.get(column.name).unwrap_or(&Value::Null);
                params.push(to_sql(column.kind, value)?);
            }
            stmt.execute(params_from_iter(params.iter()))
                .map_err(|e| map_constraint(collection, e))?;
        }
        Ok(())
    }
}

/// Converts a JSON value into a SQL parameter for a column of `kind`.
fn to_sql(kind: ColumnKind, value: &Value) -> StoreResult<SqlValue> {
    match (kind, value) {
        (_, Value::Null) => Ok(SqlValue::Null),
        (ColumnKind::Text, Value::String(s)) => Ok(SqlValue::Text(s.clone())),
        (ColumnKind::Integer, Value::Number(n)) => n
            .as_i64()
            .map(SqlValue::Integer)
            .ok_or_else(|| StoreError::InvalidQuery(format!("not an integer: {}", n))),
        (ColumnKind::Bool, Value::Bool(b)) => Ok(SqlValue::Integer(i64::from(*b))),
        (_, other) => Err(StoreError::InvalidQuery(format!(
            "value {} does not match column type {:?}",
            other, kind
        ))),
    }
}

/// Translates SQLite constraint failures into store errors.
fn map_constraint(collection: Collection, e: rusqlite::Error) -> StoreError {
    match &e {
        rusqlite::Error::SqliteFailure(err, message)
            if err.code == ErrorCode::ConstraintViolation =>
        {
            let detail = message.clone().unwrap_or_else(|| err.to_string());
            match err.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    StoreError::Conflict(format!("{}: {}", collection, detail))
                }
                _ => StoreError::Constraint(format!("{}: {}", collection, detail)),
            }
        }
        _ => StoreError::Database(e),
    }
}

impl RecordStore for SqliteStore {
    fn query(
        &self,
        collection: Collection,
        filter: &Filter,
        order: Option<&Order>,
    ) -> StoreResult<Vec<Row>> {
        let mut params = Vec::new();
        let mut sql = format!(
            "SELECT {} FROM {}",
            Self::column_list(collection),
            collection.table()
        );
        sql.push_str(&Self::where_clause(collection, filter, &mut params)?);
        if let Some(order) = order {
            collection.check_field(&order.field)?;
            let direction = if order.ascending { "ASC" } else { "DESC" };
            sql.push_str(&format!(" ORDER BY {} {}, rowid ASC", order.field, direction));
        } else {
            sql.push_str(" ORDER BY rowid ASC");
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            Self::read_row(collection, row)
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn insert(&self, collection: Collection, rows: Vec<Row>) -> StoreResult<Vec<Row>> {
        let prepared = rows
            .into_iter()
            .map(|row| collection.prepare_row(row))
            .collect::<StoreResult<Vec<_>>>()?;
        if prepared.is_empty() {
            return Ok(prepared);
        }

        // Savepoint keeps multi-row inserts all-or-nothing inside or outside a unit of work.
        self.conn.execute_batch("SAVEPOINT roster_insert;")?;
        match self.insert_rows(collection, &prepared) {
            Ok(()) => {
                self.conn.execute_batch("RELEASE roster_insert;")?;
                Ok(prepared)
            }
            Err(e) => {
                self.conn
                    .execute_batch("ROLLBACK TO roster_insert; RELEASE roster_insert;")?;
                Err(e)
            }
        }
    }

    fn update(&self, collection: Collection, id: &str, fields: Row) -> StoreResult<()> {
        if fields.contains_key("id") {
            return Err(StoreError::InvalidQuery(format!(
                "{}: id cannot be updated",
                collection
            )));
        }
        if fields.is_empty() {
            let exists: bool = self.conn.query_row(
                &format!("SELECT COUNT(*) > 0 FROM {} WHERE id = ?1", collection.table()),
                [id],
                |row| row.get(0),
            )?;
            return if exists {
                Ok(())
            } else {
                Err(StoreError::NotFound(format!("{} {}", collection, id)))
            };
        }

        let mut params = Vec::with_capacity(fields.len() + 1);
        let mut assignments = Vec::with_capacity(fields.len());
        for (field, value) in &fields {
            collection.check_value(field, value)?;
            let kind = collection.check_field(field)?.kind;
            params.push(to_sql(kind, value)?);
            assignments.push(format!("{} = ?{}", field, params.len()));
        }
        params.push(SqlValue::Text(id.to_string()));
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            collection.table(),
            assignments.join(", "),
            params.len()
        );

        let changed = self
            .conn
            .execute(&sql, params_from_iter(params.iter()))
            .map_err(|e| map_constraint(collection, e))?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("{} {}", collection, id)));
        }
        Ok(())
    }

    fn delete(&self, collection: Collection, filter: &Filter) -> StoreResult<usize> {
        let mut params = Vec::new();
        let sql = format!(
            "DELETE FROM {}{}",
            collection.table(),
            Self::where_clause(collection, filter, &mut params)?
        );
        let removed = self
            .conn
            .execute(&sql, params_from_iter(params.iter()))
            .map_err(|e| map_constraint(collection, e))?;
        Ok(removed)
    }

    fn begin(&self) -> StoreResult<bool> {
        if !self.conn.is_autocommit() {
            return Err(StoreError::Backend(
                "a unit of work is already open".to_string(),
            ));
        }
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        Ok(true)
    }

    fn commit(&self) -> StoreResult<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT;")?;
        }
        Ok(())
    }

    fn rollback(&self) -> StoreResult<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK;")?;
        }
        Ok(())
    }
}
