use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "oa-dosing";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// File name of the regimen database inside the data directory
pub const DATABASE_FILE: &str = "regimens.db";

/// Environment variable overriding the database location
pub const DB_PATH_ENV: &str = "OA_DOSING_DB";

/// Upper bound for every `String(250)` column
pub const MAX_LABEL_LEN: usize = 250;

/// Maximum number of `variant_of` hops followed before a lineage is
/// considered malformed.
pub const MAX_VARIANT_DEPTH: usize = 64;

/// Get the application data directory
/// Falls back to the working directory when no platform data dir exists.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Resolve the database path: `OA_DOSING_DB` if set, otherwise
/// `<data dir>/oa-dosing/regimens.db`.
pub fn database_path() -> PathBuf {
    match std::env::var_os(DB_PATH_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => app_data_dir().join(DATABASE_FILE),
    }
}

/// Log filter used when `RUST_LOG` is not set
pub fn default_log_filter() -> &'static str {
    "oa_dosing=info,warn"
}
