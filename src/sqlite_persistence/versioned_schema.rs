use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";

pub const BASE_DB_VERSION: usize = 99999;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // Only mutated when optional field assignments are passed.
            #[allow(unused_mut)]
            let mut column = $crate::sqlite_persistence::Column {
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
    Blob,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Blob => "BLOB",
        }
    }

    fn from_sql(s: &str) -> Option<&'static SqlType> {
        match s {
            "TEXT" => Some(&SqlType::Text),
            "INTEGER" => Some(&SqlType::Integer),
            "REAL" => Some(&SqlType::Real),
            "BLOB" => Some(&SqlType::Blob),
            _ => None,
        }
    }
}

/// What happens to referencing rows when the referenced row is deleted.
#[derive(Debug)]
pub enum ForeignKeyOnChange {
    Restrict,
    Cascade,
}

impl ForeignKeyOnChange {
    fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyOnChange::Restrict => "RESTRICT",
            ForeignKeyOnChange::Cascade => "CASCADE",
        }
    }
}

#[derive(Debug)]
pub struct ForeignKey {
    pub foreign_table: &'static str,
    pub foreign_column: &'static str,
    pub on_delete: ForeignKeyOnChange,
}

#[derive(Debug)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub is_unique: bool,
    pub default_value: Option<&'static str>,
    pub foreign_key: Option<&'static ForeignKey>,
}

impl Column {
    /// The column definition as it appears in CREATE TABLE and ALTER TABLE ADD COLUMN.
    pub fn definition_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type.as_sql());
        if self.is_primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.non_null {
            sql.push_str(" NOT NULL");
        }
        if self.is_unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(default_value) = self.default_value {
            sql.push_str(&format!(" DEFAULT {}", default_value));
        }
        if let Some(foreign_key) = self.foreign_key {
            sql.push_str(&format!(
                " REFERENCES {}({}) ON DELETE {}",
                foreign_key.foreign_table,
                foreign_key.foreign_column,
                foreign_key.on_delete.as_sql()
            ));
        }
        sql
    }
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub indices: &'static [(&'static str, &'static str)],
    pub unique_constraints: &'static [&'static [&'static str]],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let mut create_sql = format!("CREATE TABLE {} (", self.name);
        let definitions: Vec<String> = self.columns.iter().map(Column::definition_sql).collect();
        create_sql.push_str(&definitions.join(", "));
        for unique_constraint in self.unique_constraints {
            create_sql.push_str(&format!(", UNIQUE ({})", unique_constraint.join(", ")));
        }
        create_sql.push_str(");");
        conn.execute(&create_sql, params![])?;

        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {}({});",
                    index_name, self.name, column_name
                ),
                params![],
            )?;
        }
        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;
        for table in self.tables {
            table.create(conn)?;
        }
        conn.pragma_update(None, "user_version", BASE_DB_VERSION + self.version)?;
        Ok(())
    }

    /// Fails unless every table matches its description: same columns in the same
    /// order, plus the declared indices and unique constraints.
    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table
                .validate(conn)
                .with_context(|| format!("Table {} does not match schema v{}", table.name, self.version))?;
        }
        Ok(())
    }
}

/// A column as reported by `PRAGMA table_info`.
struct LiveColumn {
    name: String,
    sql_type: Option<&'static SqlType>,
    non_null: bool,
    default_value: Option<String>,
    is_primary_key: bool,
}

/// SQLite reports expression defaults wrapped in parentheses.
fn normalized_default(value: &str) -> &str {
    value
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .unwrap_or(value)
}

fn live_columns(conn: &Connection, table: &str) -> Result<Vec<LiveColumn>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(LiveColumn {
                name: row.get(1)?,
                sql_type: SqlType::from_sql(&row.get::<_, String>(2)?),
                non_null: row.get::<_, i32>(3)? != 0,
                default_value: row.get(4)?,
                is_primary_key: row.get::<_, i32>(5)? != 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

fn check_column(live: &LiveColumn, expected: &Column) -> Result<()> {
    if live.name != expected.name {
        bail!("found column {} where {} was expected", live.name, expected.name);
    }
    if live.sql_type != Some(expected.sql_type) {
        bail!(
            "column {} has type {:?} instead of {:?}",
            expected.name,
            live.sql_type,
            expected.sql_type
        );
    }
    if live.non_null != expected.non_null {
        bail!(
            "column {} NOT NULL is {}, expected {}",
            expected.name,
            live.non_null,
            expected.non_null
        );
    }
    if live.default_value.as_deref().map(normalized_default)
        != expected.default_value.map(normalized_default)
    {
        bail!(
            "column {} defaults to {:?} instead of {:?}",
            expected.name,
            live.default_value,
            expected.default_value
        );
    }
    if live.is_primary_key != expected.is_primary_key {
        bail!(
            "column {} PRIMARY KEY is {}, expected {}",
            expected.name,
            live.is_primary_key,
            expected.is_primary_key
        );
    }
    Ok(())
}

fn index_exists(conn: &Connection, table: &str, index_name: &str) -> Result<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?1 AND tbl_name = ?2",
            params![index_name, table],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

/// Sorted column sets of every unique index on `table`, including the implicit
/// ones SQLite creates for UNIQUE constraints.
fn unique_column_sets(conn: &Connection, table: &str) -> Result<Vec<Vec<String>>> {
    let mut list_stmt = conn.prepare(&format!("PRAGMA index_list({})", table))?;
    let unique_indices = list_stmt
        .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i32>(2)? != 0)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut sets = Vec::new();
    for (index_name, _) in unique_indices.into_iter().filter(|(_, unique)| *unique) {
        let mut info_stmt = conn.prepare(&format!("PRAGMA index_info({})", index_name))?;
        let mut columns = info_stmt
            .query_map([], |row| row.get::<_, String>(2))?
            .collect::<Result<Vec<_>, _>>()?;
        columns.sort();
        sets.push(columns);
    }
    Ok(sets)
}

impl Table {
    fn validate(&self, conn: &Connection) -> Result<()> {
        let live = live_columns(conn, self.name)?;
        if live.len() != self.columns.len() {
            let names: Vec<&str> = live.iter().map(|c| c.name.as_str()).collect();
            bail!(
                "has {} columns, expected {} (found: {})",
                live.len(),
                self.columns.len(),
                names.join(", ")
            );
        }
        for (live_column, expected) in live.iter().zip(self.columns) {
            check_column(live_column, expected)?;
        }

        for (index_name, _) in self.indices {
            if !index_exists(conn, self.name, index_name)? {
                bail!("missing index {}", index_name);
            }
        }

        if self.unique_constraints.is_empty() {
            return Ok(());
        }
        let unique_sets = unique_column_sets(conn, self.name)?;
        for constraint in self.unique_constraints {
            let mut expected: Vec<&str> = constraint.to_vec();
            expected.sort();
            let present = unique_sets
                .iter()
                .any(|set| set.iter().map(String::as_str).eq(expected.iter().copied()));
            if !present {
                bail!("missing unique constraint on ({})", constraint.join(", "));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMED_TABLE: Table = Table {
        name: "named",
        columns: &[
            sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
            sqlite_column!("name", &SqlType::Text, non_null = true),
            sqlite_column!(
                "created",
                &SqlType::Integer,
                non_null = true,
                default_value = Some(DEFAULT_TIMESTAMP)
            ),
        ],
        indices: &[("idx_named_name", "name")],
        unique_constraints: &[&["name"]],
    };

    fn schema() -> VersionedSchema {
        VersionedSchema {
            version: 2,
            tables: &[NAMED_TABLE],
            migration: None,
        }
    }

    #[test]
    fn created_schema_validates_and_stamps_version() {
        let conn = Connection::open_in_memory().unwrap();
        schema().create(&conn).unwrap();
        schema().validate(&conn).unwrap();

        let version: usize = conn
            .query_row("PRAGMA user_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, BASE_DB_VERSION + 2);
    }

    #[test]
    fn validate_detects_missing_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE named (id INTEGER PRIMARY KEY, name TEXT NOT NULL, UNIQUE (name))",
            [],
        )
        .unwrap();
        conn.execute("CREATE INDEX idx_named_name ON named(name)", [])
            .unwrap();

        let err = format!("{:#}", schema().validate(&conn).unwrap_err());
        assert!(err.contains("has 2 columns, expected 3"), "{}", err);
    }

    #[test]
    fn validate_detects_missing_index() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            &format!(
                "CREATE TABLE named (id INTEGER PRIMARY KEY, name TEXT NOT NULL, created INTEGER NOT NULL DEFAULT {}, UNIQUE (name))",
                DEFAULT_TIMESTAMP
            ),
            [],
        )
        .unwrap();

        let err = format!("{:#}", schema().validate(&conn).unwrap_err());
        assert!(err.contains("missing index idx_named_name"), "{}", err);
    }

    #[test]
    fn validate_detects_missing_unique_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            &format!(
                "CREATE TABLE named (id INTEGER PRIMARY KEY, name TEXT NOT NULL, created INTEGER NOT NULL DEFAULT {})",
                DEFAULT_TIMESTAMP
            ),
            [],
        )
        .unwrap();
        conn.execute("CREATE INDEX idx_named_name ON named(name)", [])
            .unwrap();

        let err = format!("{:#}", schema().validate(&conn).unwrap_err());
        assert!(err.contains("missing unique constraint on (name)"), "{}", err);
    }

    #[test]
    fn column_definition_includes_foreign_key() {
        const PARENT_FK: ForeignKey = ForeignKey {
            foreign_table: "parent",
            foreign_column: "id",
            on_delete: ForeignKeyOnChange::Cascade,
        };
        let column = sqlite_column!(
            "parent_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PARENT_FK)
        );
        assert_eq!(
            column.definition_sql(),
            "parent_id INTEGER NOT NULL REFERENCES parent(id) ON DELETE CASCADE"
        );
    }
}
