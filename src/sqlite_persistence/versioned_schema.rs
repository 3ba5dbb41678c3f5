//! Declarative SQLite schema definitions.
//!
//! Tables are declared as consts and executed against a connection before
//! the data-access layer touches it. The schema version is tracked in
//! `PRAGMA user_version` so an existing database file can be validated and
//! migrated forward on startup.

use anyhow::{bail, Result};
use rusqlite::{params, types::Type, Connection};

/// Offset applied to `PRAGMA user_version` so that a plain SQLite file
/// (user_version 0) is never mistaken for a version of ours.
pub const BASE_DB_VERSION: usize = 77000;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // unused_mut fires when the macro is called without optional
            // field assignments
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                is_unique: false,
                default_value: None,
                foreign_key: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
}

#[allow(unused)]
pub enum ForeignKeyOnDelete {
    Restrict,
    Cascade,
}

impl ForeignKeyOnDelete {
    fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyOnDelete::Restrict => "RESTRICT",
            ForeignKeyOnDelete::Cascade => "CASCADE",
        }
    }
}

pub struct ForeignKey {
    pub foreign_table: &'static str,
    pub foreign_column: &'static str,
    pub on_delete: ForeignKeyOnDelete,
}

pub struct Column<'a, S: AsRef<str>> {
    pub name: S,
    pub sql_type: &'a SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub is_unique: bool,
    pub default_value: Option<S>,
    pub foreign_key: Option<&'a ForeignKey>,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column<'static, &'static str>],
    pub indices: &'static [(&'static str, &'static str)],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let mut sql = format!("CREATE TABLE {} (", self.name);
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(column.name);
            sql.push(' ');
            sql.push_str(match column.sql_type {
                SqlType::Text => "TEXT",
                SqlType::Integer => "INTEGER",
                SqlType::Real => "REAL",
            });
            if column.is_primary_key {
                sql.push_str(" PRIMARY KEY");
            }
            if column.non_null {
                sql.push_str(" NOT NULL");
            }
            if column.is_unique {
                sql.push_str(" UNIQUE");
            }
            if let Some(default_value) = column.default_value {
                sql.push_str(&format!(" DEFAULT {}", default_value));
            }
            if let Some(fk) = column.foreign_key {
                sql.push_str(&format!(
                    " REFERENCES {}({}) ON DELETE {}",
                    fk.foreign_table,
                    fk.foreign_column,
                    fk.on_delete.as_sql()
                ));
            }
        }
        sql.push_str(");");
        conn.execute(&sql, params![])?;

        for (index_name, columns) in self.indices {
            conn.execute(
                &format!("CREATE INDEX {} ON {}({});", index_name, self.name, columns),
                params![],
            )?;
        }
        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    /// Migrates a database at the previous version up to this one.
    /// The initial version has no migration.
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    /// Checks that an existing database matches this schema: column names,
    /// types, nullability, primary keys, indices, and foreign keys with
    /// their ON DELETE actions.
    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            Self::validate_columns(conn, table)?;
            Self::validate_indices(conn, table)?;
            Self::validate_foreign_keys(conn, table)?;
        }
        Ok(())
    }

    fn validate_columns(conn: &Connection, table: &Table) -> Result<()> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", table.name))?;
        let actual: Vec<(String, &'static SqlType, bool, bool)> = stmt
            .query_map(params![], |row| {
                let sql_type = match row.get::<_, String>(2)?.as_str() {
                    "TEXT" => &SqlType::Text,
                    "INTEGER" => &SqlType::Integer,
                    "REAL" => &SqlType::Real,
                    _ => {
                        return Err(rusqlite::Error::InvalidColumnType(
                            2,
                            "unsupported column type".to_string(),
                            Type::Text,
                        ))
                    }
                };
                Ok((
                    row.get::<_, String>(1)?,
                    sql_type,
                    row.get::<_, i32>(3)? == 1,
                    row.get::<_, i32>(5)? == 1,
                ))
            })?
            .collect::<rusqlite::Result<_>>()?;

        if actual.len() != table.columns.len() {
            bail!(
                "Table {} has {} columns, expected {} ({})",
                table.name,
                actual.len(),
                table.columns.len(),
                table
                    .columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        for ((name, sql_type, non_null, is_pk), expected) in
            actual.iter().zip(table.columns.iter())
        {
            if name != expected.name {
                bail!(
                    "Table {}: expected column {}, found {}",
                    table.name,
                    expected.name,
                    name
                );
            }
            if *sql_type != expected.sql_type {
                bail!(
                    "Table {} column {}: expected type {:?}, found {:?}",
                    table.name,
                    name,
                    expected.sql_type,
                    sql_type
                );
            }
            if *non_null != expected.non_null {
                bail!(
                    "Table {} column {}: NOT NULL mismatch (expected {})",
                    table.name,
                    name,
                    expected.non_null
                );
            }
            if *is_pk != expected.is_primary_key {
                bail!(
                    "Table {} column {}: PRIMARY KEY mismatch (expected {})",
                    table.name,
                    name,
                    expected.is_primary_key
                );
            }
        }
        Ok(())
    }

    fn validate_indices(conn: &Connection, table: &Table) -> Result<()> {
        for (index_name, _) in table.indices {
            let exists: bool = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                    params![index_name, table.name],
                    |_| Ok(true),
                )
                .unwrap_or(false);
            if !exists {
                bail!("Table {} is missing index '{}'", table.name, index_name);
            }
        }
        Ok(())
    }

    fn validate_foreign_keys(conn: &Connection, table: &Table) -> Result<()> {
        // PRAGMA foreign_key_list columns: id, seq, table, from, to, on_update, on_delete, match
        let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list({});", table.name))?;
        let actual_fks: Vec<(String, String, String, String)> = stmt
            .query_map([], |row| {
                Ok((row.get(3)?, row.get(2)?, row.get(4)?, row.get(6)?))
            })?
            .collect::<rusqlite::Result<_>>()?;

        for column in table.columns {
            let Some(expected) = column.foreign_key else {
                continue;
            };
            let found = actual_fks.iter().any(|(from, to_table, to_col, on_delete)| {
                from == column.name
                    && to_table == expected.foreign_table
                    && to_col == expected.foreign_column
                    && on_delete == expected.on_delete.as_sql()
            });
            if !found {
                bail!(
                    "Table {} column {} is missing foreign key REFERENCES {}({}) ON DELETE {}",
                    table.name,
                    column.name,
                    expected.foreign_table,
                    expected.foreign_column,
                    expected.on_delete.as_sql()
                );
            }
        }
        Ok(())
    }
}
