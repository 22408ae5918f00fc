// src/utils/env.rs

use log::{debug, info, warn};
use std::path::Path;

/// Loads the first `.env` file found in the usual locations.
/// Variables already present in the process environment are left untouched.
pub fn load_env() {
    let env_paths = [".env", ".env.local", "../.env"];
    let mut loaded_env = false;
    for path in env_paths.iter() {
        if Path::new(path).exists() {
            match dotenv::from_path(path) {
                Ok(()) => {
                    info!("Loaded environment variables from {}", path);
                    loaded_env = true;
                    break;
                }
                Err(e) => warn!("Failed to load environment from {}: {}", path, e),
            }
        }
    }
    if !loaded_env {
        info!("No .env file found, using environment variables from system");
    }
}

/// Reads an env var, returning `None` for unset or blank values.
pub fn non_empty_var(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        Ok(_) => {
            debug!("Env var {} is set but blank, ignoring", key);
            None
        }
        Err(_) => None,
    }
}
