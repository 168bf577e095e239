//! Schema introspection for the mirror database.

use super::Database;
use anyhow::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Information about a table column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

/// Information about an index, including those backing UNIQUE constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

/// Information about a foreign key relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub on_delete: String,
}

/// Information about a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub row_count: i64,
    pub columns: Vec<ColumnInfo>,
    pub indexes: Vec<IndexInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

/// Complete database schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub tables: Vec<TableInfo>,
    pub sqlite_version: String,
}

impl DatabaseSchema {
    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.iter().find(|t| t.name == name)
    }
}

impl TableInfo {
    /// True if some unique index covers exactly these columns.
    pub fn has_unique(&self, columns: &[&str]) -> bool {
        self.indexes
            .iter()
            .any(|idx| idx.unique && idx.columns.iter().map(String::as_str).eq(columns.iter().copied()))
    }
}

fn table_columns(conn: &Connection, table_name: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info('{}')", table_name))?;

    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get(1)?,
                data_type: row.get::<_, String>(2)?.to_uppercase(),
                nullable: row.get::<_, i32>(3)? == 0,
                default_value: row.get(4)?,
                primary_key: row.get::<_, i32>(5)? > 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(columns)
}

fn table_indexes(conn: &Connection, table_name: &str) -> Result<Vec<IndexInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA index_list('{}')", table_name))?;

    // (name, unique, origin)
    let index_list: Vec<(String, bool, String)> = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(1)?,
                row.get::<_, i32>(2)? == 1,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut indexes = Vec::new();
    for (index_name, unique, origin) in index_list {
        if origin == "pk" {
            continue;
        }

        let mut stmt = conn.prepare(&format!("PRAGMA index_info('{}')", index_name))?;
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get(2))?
            .collect::<Result<Vec<_>, _>>()?;

        indexes.push(IndexInfo {
            name: index_name,
            unique,
            columns,
        });
    }

    Ok(indexes)
}

fn table_foreign_keys(conn: &Connection, table_name: &str) -> Result<Vec<ForeignKeyInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list('{}')", table_name))?;

    let foreign_keys = stmt
        .query_map([], |row| {
            Ok(ForeignKeyInfo {
                from_column: row.get(3)?,
                to_table: row.get(2)?,
                to_column: row.get(4)?,
                on_delete: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(foreign_keys)
}

impl Database {
    /// Get complete schema information for the database.
    pub fn get_schema(&self) -> Result<DatabaseSchema> {
        self.with_conn(|conn| {
            let sqlite_version: String =
                conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;

            // Skip internal sqlite_ tables and refinery's history table
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table'
                 AND name NOT LIKE 'sqlite_%'
                 AND name NOT LIKE 'refinery_%'
                 ORDER BY name",
            )?;
            let table_names: Vec<String> = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;

            let mut tables = Vec::new();
            for name in table_names {
                let row_count: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", name), [], |row| {
                        row.get(0)
                    })?;
                tables.push(TableInfo {
                    columns: table_columns(conn, &name)?,
                    indexes: table_indexes(conn, &name)?,
                    foreign_keys: table_foreign_keys(conn, &name)?,
                    row_count,
                    name,
                });
            }

            Ok(DatabaseSchema {
                tables,
                sqlite_version,
            })
        })
    }
}
