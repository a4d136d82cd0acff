//! Authenticated sessions and the on-disk session cache.
//!
//! The cache is a single JSON file mapping user names to the last session
//! resolved for them. Entries expire a safety margin before the token does.
//! Writes are not locked: concurrent invocations may overwrite each other,
//! which only costs an extra authentication round-trip.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Seconds subtracted from the token expiry when deciding freshness.
pub const EXPIRY_MARGIN_SECS: i64 = 300;

/// Credentials and endpoint resolved for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Token sent as `X-Auth-Token`.
    pub token: String,
    /// Versioned dcmanager endpoint, e.g. `http://10.0.0.1:8119/v1.0`.
    pub endpoint: String,
    /// Project the token is scoped to.
    #[serde(default)]
    pub project_id: Option<String>,
    /// User the token belongs to.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Token expiry, when known.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// True when the token is known to outlive `now` plus the safety margin.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires| now + TimeDelta::seconds(EXPIRY_MARGIN_SECS) < expires)
    }
}

/// File-backed session cache keyed by user name.
#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    /// Cache stored at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<cache_dir>/dcmanagerclient/sessions.json`, if the platform has a cache dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::cache_dir().map(|dir| dir.join("dcmanagerclient").join("sessions.json"))
    }

    /// Location of the cache file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a fresh cached session for `username`.
    #[must_use]
    pub fn load(&self, username: &str) -> Option<Session> {
        self.load_at(username, Utc::now())
    }

    /// Returns the session for `username` if it is fresh at `now`.
    #[must_use]
    pub fn load_at(&self, username: &str, now: DateTime<Utc>) -> Option<Session> {
        let session = self.read_all().remove(username)?;
        if session.is_fresh_at(now) {
            debug!(username, "using cached session");
            Some(session)
        } else {
            debug!(username, "cached session expired");
            None
        }
    }

    /// Stores `session` for `username`. Sessions without an expiry are not cached.
    pub fn store(&self, username: &str, session: &Session) -> Result<()> {
        if session.expires_at.is_none() {
            return Ok(());
        }
        let mut sessions = self.read_all();
        sessions.insert(username.to_string(), session.clone());
        self.write_all(&sessions)
    }

    /// Removes the entry for `username`.
    pub fn invalidate(&self, username: &str) -> Result<()> {
        let mut sessions = self.read_all();
        if sessions.remove(username).is_some() {
            self.write_all(&sessions)?;
        }
        Ok(())
    }

    fn read_all(&self) -> BTreeMap<String, Session> {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "ignoring unreadable session cache");
            BTreeMap::new()
        })
    }

    fn write_all(&self, sessions: &BTreeMap<String, Session>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = open_private(&tmp)?;
            file.write_all(serde_json::to_string_pretty(sessions)?.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::File::create(path)
}
