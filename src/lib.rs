//! Relational reference schema for oncology drug regimens.
//!
//! Regimens own parts, parts own cycles, cycles own drugs and drugs own
//! administration days. Drugs, routes, diagnoses and HemOnc identifiers are
//! foreign keys into an external `concept` vocabulary.

pub mod config;
pub mod db;
pub mod models;

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to
/// [`config::default_log_filter`]. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::debug!("{} v{} tracing initialized", config::APP_NAME, config::APP_VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }

    #[test]
    fn open_database_from_config_path() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(config::DATABASE_FILE);
        let conn = db::open_database(&path).unwrap();
        assert_eq!(db::count_tables(&conn).unwrap(), 9);
        assert!(db::check_integrity(&conn).unwrap().is_clean());
    }
}
