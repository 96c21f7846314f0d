//! Stored login session
//!
//! `kdctl login` trades a user name and password for an API token and keeps
//! it at XDG_CACHE_HOME/kdctl/session.json. The token is reused only for the
//! server it was issued by and only while younger than the configured TTL.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Server URL the token was issued by
    pub server_url: String,
    pub user: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(server_url: &str, user: &str, token: String) -> Self {
        Self {
            server_url: normalize(server_url).to_string(),
            user: user.to_string(),
            token,
            created_at: Utc::now(),
        }
    }

    pub fn is_valid(&self, server_url: &str, ttl: u64, now: DateTime<Utc>) -> bool {
        if self.server_url != normalize(server_url) {
            return false;
        }
        let ttl = i64::try_from(ttl).unwrap_or(i64::MAX);
        match Duration::try_seconds(ttl).and_then(|ttl| self.created_at.checked_add_signed(ttl)) {
            Some(expires_at) => now < expires_at,
            // TTL too large to represent: never expires
            None => true,
        }
    }

    /// Load the stored session if it is usable for `server_url`
    pub fn load(server_url: &str, ttl: u64) -> Result<Option<Self>> {
        Self::load_from(&session_path()?, server_url, ttl)
    }

    pub fn load_from(path: &Path, server_url: &str, ttl: u64) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("reading session from {}", path.display()))?;
        let session: Session = serde_json::from_str(&content)
            .with_context(|| format!("parsing session from {}", path.display()))?;

        if session.is_valid(server_url, ttl, Utc::now()) {
            Ok(Some(session))
        } else {
            log::debug!("Stored session expired or for a different server");
            Ok(None)
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = session_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating cache directory {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("writing session to {}", path.display()))?;
        restrict_permissions(path)
    }
}

/// Remove the stored session; returns whether one existed
pub fn clear() -> Result<bool> {
    clear_at(&session_path()?)
}

pub fn clear_at(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).with_context(|| format!("removing session {}", path.display()))?;
    Ok(true)
}

fn normalize(server_url: &str) -> &str {
    server_url.trim_end_matches('/')
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("restricting permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

pub fn session_path() -> Result<PathBuf> {
    Ok(cache_dir()?.join(SESSION_FILE))
}

fn cache_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_CACHE_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir).join(APP_NAME));
    }

    if let Some(mut dir) = dirs::cache_dir() {
        dir.push(APP_NAME);
        return Ok(dir);
    }

    dirs::home_dir()
        .map(|home| home.join(".cache").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine cache directory"))
}
