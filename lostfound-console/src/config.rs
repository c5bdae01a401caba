use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the REST API, without a trailing slash.
    pub api_base_url: String,
    /// Directory for client state (the saved session file).
    /// Defaults to `~/.lostfound`, so a session saved by `login` is found
    /// again no matter where later commands run from.
    pub state_dir: PathBuf,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_base_url = env::var("LOSTFOUND_API_URL")
            .unwrap_or_else(|_| "http://localhost:5000/api".to_string())
            .trim_end_matches('/')
            .to_string();

        let state_dir = env::var_os("LOSTFOUND_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_state_dir(env::var_os("HOME").map(PathBuf::from)));

        let request_timeout_secs = env::var("LOSTFOUND_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .context("LOSTFOUND_TIMEOUT_SECS must be a valid number")?;

        Ok(Config {
            api_base_url,
            state_dir,
            request_timeout_secs,
        })
    }

    /// Where the current session (token + profile) is persisted.
    pub fn session_path(&self) -> PathBuf {
        self.state_dir.join("session.json")
    }
}

/// `~/.lostfound`, falling back to the working directory when `$HOME` is
/// unset.
fn default_state_dir(home: Option<PathBuf>) -> PathBuf {
    match home {
        Some(home) => home.join(".lostfound"),
        None => PathBuf::from("."),
    }
}
