use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "HospAdmin";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Storage format for date-valued fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database file name inside the application data directory.
pub const DATABASE_FILE: &str = "hospital.db";

/// Get the application data directory
/// ~/HospAdmin/ on all platforms, falling back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the default database path
pub fn database_path() -> PathBuf {
    app_data_dir().join(DATABASE_FILE)
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "hospadmin=info,hospadmin_lib=info"
}
