//! Explicit session context.
//!
//! The session (bearer token + profile) is loaded once and passed to
//! whichever component needs auth or role, rather than having every module
//! re-query ambient storage. The admin gate here is a courtesy check for
//! better error messages; the backend enforces the real one.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use lostfound_core::model::UserId;

/// Backend user roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

/// The logged-in user, as served by `GET /auth/profile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// An authenticated session: the bearer token plus who it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: Profile,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<()> {
        if !self.is_admin() {
            bail!(
                "admin access required: {} has role '{}'",
                self.user.email,
                self.user.role
            );
        }
        Ok(())
    }
}

/// On-disk persistence for the session, the CLI analog of the browser's
/// token storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the saved session, or `None` if nobody is logged in.
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read session file {}", self.path.display()))?;
        let session = serde_json::from_str(&raw)
            .with_context(|| format!("session file {} is corrupt", self.path.display()))?;
        Ok(Some(session))
    }

    /// Load the saved session, failing with a login hint if there is none.
    pub fn require(&self) -> Result<Session> {
        self.load()?
            .context("not logged in; run `lostfound login` first")
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(session).context("failed to encode session")?;
        fs::write(&self.path, raw)
            .with_context(|| format!("failed to write session file {}", self.path.display()))?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).with_context(|| {
                format!("failed to remove session file {}", self.path.display())
            })?;
        }
        Ok(())
    }
}
