use std::path::Path;

use rusqlite::{params, Connection};
use tracing;

use super::DatabaseError;

/// Open a SQLite connection to the given path and run migrations
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing)
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA foreign_keys=ON;"
    )?;
    Ok(())
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_current_version(conn);

    let migrations: Vec<(i64, &str)> = vec![
        (1, include_str!("../../resources/migrations/001_vocabulary.sql")),
        (2, include_str!("../../resources/migrations/002_regimen_schema.sql")),
    ];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql).map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        }
    }

    Ok(())
}

/// Get the current schema version (0 if no schema exists yet)
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get::<_, i64>(0),
    )
    .unwrap_or(0)
}

/// Count tables in the database (for verification)
pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

/// Column names of a table in declaration order
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
        .query_map(params![table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    if columns.is_empty() {
        return Err(DatabaseError::not_found("table", table));
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_initializes_all_tables() {
        let conn = open_memory_database().unwrap();
        // 7 regimen tables + concept + schema_version
        let count = count_tables(&conn).unwrap();
        assert_eq!(count, 9, "Expected 9 tables, got {count}");
    }

    #[test]
    fn schema_version_is_current() {
        let conn = open_memory_database().unwrap();
        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 2);
    }

    #[test]
    fn migration_idempotent() {
        let conn = open_memory_database().unwrap();
        let result = run_migrations(&conn);
        assert!(result.is_ok());
        assert_eq!(count_tables(&conn).unwrap(), 9);
    }

    #[test]
    fn foreign_keys_enabled() {
        let conn = open_memory_database().unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn existing_vocabulary_is_preserved() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE concept (
                concept_id INTEGER PRIMARY KEY,
                concept_name TEXT NOT NULL,
                domain_id TEXT NOT NULL,
                vocabulary_id TEXT NOT NULL,
                concept_class_id TEXT NOT NULL,
                standard_concept TEXT,
                concept_code TEXT NOT NULL,
                valid_start_date TEXT
             );
             INSERT INTO concept VALUES (1, 'Cisplatin', 'Drug', 'RxNorm', 'Ingredient', 'S', '2555', '1970-01-01');",
        )
        .unwrap();
        configure_pragmas(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let name: String = conn
            .query_row("SELECT concept_name FROM concept WHERE concept_id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "Cisplatin");
        assert!(table_columns(&conn, "concept").unwrap().contains(&"valid_start_date".to_string()));
    }

    #[test]
    fn regimen_multiples_has_composite_key() {
        let conn = open_memory_database().unwrap();
        let pk_columns: Vec<String> = conn
            .prepare("SELECT name FROM pragma_table_info('regimen_multiples') WHERE pk > 0 ORDER BY pk")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            pk_columns,
            vec!["regimen_reference_id", "equivalent_regimen_reference_id"]
        );
    }

    #[test]
    fn cycle_reference_columns_match_model() {
        let conn = open_memory_database().unwrap();
        let columns = table_columns(&conn, "cycle_reference").unwrap();
        assert_eq!(
            columns,
            vec!["cycle_id", "regimen_part", "cycle_number", "cycle_length", "min_cycles", "max_cycles"]
        );
    }

    #[test]
    fn unknown_table_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = table_columns(&conn, "no_such_table").unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn on_disk_database_reopens_at_current_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regimens.db");
        {
            let conn = open_database(&path).unwrap();
            conn.execute(
                "INSERT INTO concept (concept_id, concept_name, domain_id, vocabulary_id, concept_class_id, concept_code)
                 VALUES (10, 'Oral', 'Route', 'SNOMED', 'Qualifier Value', '26643006')",
                [],
            )
            .unwrap();
        }
        let conn = open_database(&path).unwrap();
        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(versions, 2);
        let routes: i64 = conn
            .query_row("SELECT COUNT(*) FROM concept", [], |row| row.get(0))
            .unwrap();
        assert_eq!(routes, 1);
    }
}
