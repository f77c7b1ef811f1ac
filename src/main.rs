mod cli;
mod clock;
mod config;
mod export;
mod geo;
mod insights;
mod model;
mod notify;
mod position;
mod storage;
mod tracker;

use std::process;

use tracing_subscriber::EnvFilter;

use config::Config;

/// Environment variable that overrides the configured log filter.
const LOG_ENV: &str = "TRIPID_LOG";

fn main() {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });

    init_logging(&config.log_level);

    let root = Config::data_dir().unwrap_or_else(|| {
        eprintln!("Could not determine home directory.");
        process::exit(1);
    });

    let store = match storage::open(config.storage_backend, root) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialize storage: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(&config, store) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Logs go to stderr so stdout stays clean for command output.
fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
