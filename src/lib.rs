pub mod config;
pub mod db;
pub mod models;
pub mod error;
pub mod catalog; // Field catalog
pub mod joins; // Display joins for Doctor / Patient
pub mod editor; // Generic entity editor
pub mod core_state;
pub mod shell; // Console front end

use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

/// Binary entry point: `hospadmin [database-path]`.
pub fn run() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(config::database_path);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::error!(path = %parent.display(), "Cannot create data directory: {e}");
            return ExitCode::FAILURE;
        }
    }

    let state = match core_state::CoreState::open(&path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(path = %path.display(), "Database unavailable: {e}");
            eprintln!("Cannot open {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let stdin = std::io::stdin();
    let mut shell = shell::Shell::new(&state, stdin.lock(), std::io::stdout());
    match shell.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Console I/O failed: {e}");
            ExitCode::FAILURE
        }
    }
}
