//! Runtime configuration
//!
//! Everything is read from the environment once at startup.

use std::env;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// Credentials for the optional hosted backend
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
    /// Account to sign in as before syncing; the api key alone is used otherwise
    pub credentials: Option<(String, String)>,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub chart_dir: PathBuf,
    pub remote: Option<RemoteConfig>,
}

impl Config {
    /// Load configuration from `MACROTRACK_*` environment variables
    pub fn from_env() -> Self {
        let database_path = var("MACROTRACK_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let chart_dir = var("MACROTRACK_CHART_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_chart_dir(&database_path));

        let remote = match (var("MACROTRACK_REMOTE_URL"), var("MACROTRACK_REMOTE_KEY")) {
            (Some(base_url), Some(api_key)) => {
                info!("Remote backend configured at {}", base_url);
                let credentials =
                    var("MACROTRACK_REMOTE_EMAIL").zip(var("MACROTRACK_REMOTE_PASSWORD"));
                Some(RemoteConfig {
                    base_url: base_url.trim_end_matches('/').to_string(),
                    api_key,
                    credentials,
                })
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!(
                    "MACROTRACK_REMOTE_URL and MACROTRACK_REMOTE_KEY must both be set; remote sync disabled"
                );
                None
            }
            (None, None) => None,
        };

        Self {
            database_path,
            chart_dir,
            remote,
        }
    }
}

fn var(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => {
            debug!("{} not set, using default", key);
            None
        }
    }
}

/// `<project>/data/macrotrack.db`, resolved from the executable location
pub fn default_database_path() -> PathBuf {
    let mut path = env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("macrotrack.db");
    path
}

fn default_chart_dir(database_path: &Path) -> PathBuf {
    database_path
        .parent()
        .map(|p| p.join("charts"))
        .unwrap_or_else(|| PathBuf::from("charts"))
}
