//! Cookie persistence between runs.
//!
//! The file layout follows the browser "storage state" convention
//! (`{"cookies": [...], "origins": [...]}` with camelCase cookie fields), so
//! files written by other automation tools load as-is. Only cookies are
//! restored into the browser; stored origins are kept across saves.

use crate::{Error, Result};
use chromiumoxide::cdp::browser_protocol::network::{
    Cookie, CookieParam, CookieSameSite, TimeSinceEpoch,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "root_path")]
    pub path: String,
    /// Seconds since the epoch; `-1` marks a session cookie
    #[serde(default = "session_expiry")]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

fn root_path() -> String {
    "/".to_string()
}

fn session_expiry() -> f64 {
    -1.0
}

impl StoredCookie {
    pub fn is_session(&self) -> bool {
        self.expires <= 0.0
    }

    pub fn is_expired_at(&self, now_secs: f64) -> bool {
        !self.is_session() && self.expires < now_secs
    }

    fn to_param(&self) -> Result<CookieParam> {
        let mut builder = CookieParam::builder()
            .name(self.name.clone())
            .value(self.value.clone())
            .domain(self.domain.clone())
            .path(self.path.clone())
            .secure(self.secure)
            .http_only(self.http_only);

        if !self.is_session() {
            builder = builder.expires(TimeSinceEpoch::new(self.expires));
        }

        if let Some(same_site) = self.same_site.as_deref().and_then(parse_same_site) {
            builder = builder.same_site(same_site);
        }

        builder.build().map_err(Error::Browser)
    }
}

impl From<&Cookie> for StoredCookie {
    fn from(cookie: &Cookie) -> Self {
        Self {
            name: cookie.name.clone(),
            value: cookie.value.clone(),
            domain: cookie.domain.clone(),
            path: cookie.path.clone(),
            expires: if cookie.session { -1.0 } else { cookie.expires },
            http_only: cookie.http_only,
            secure: cookie.secure,
            same_site: cookie.same_site.as_ref().map(|s| same_site_name(s).to_string()),
        }
    }
}

fn parse_same_site(value: &str) -> Option<CookieSameSite> {
    match value.to_ascii_lowercase().as_str() {
        "strict" => Some(CookieSameSite::Strict),
        "lax" => Some(CookieSameSite::Lax),
        "none" => Some(CookieSameSite::None),
        _ => None,
    }
}

fn same_site_name(value: &CookieSameSite) -> &'static str {
    match value {
        CookieSameSite::Strict => "Strict",
        CookieSameSite::Lax => "Lax",
        CookieSameSite::None => "None",
    }
}

/// Contents of the session file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
    #[serde(default)]
    pub cookies: Vec<StoredCookie>,
    #[serde(default)]
    pub origins: Vec<serde_json::Value>,
}

impl StoredSession {
    pub fn from_cookies(cookies: &[Cookie]) -> Self {
        Self {
            saved_at: Some(chrono::Local::now().to_rfc3339()),
            cookies: cookies.iter().map(StoredCookie::from).collect(),
            origins: Vec::new(),
        }
    }

    /// Cookies still valid at `now_secs`, as CDP parameters
    pub fn cookie_params(&self, now_secs: f64) -> Result<Vec<CookieParam>> {
        self.cookies
            .iter()
            .filter(|c| !c.is_expired_at(now_secs))
            .map(StoredCookie::to_param)
            .collect()
    }

    /// Distinct cookie domains, sorted
    pub fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.cookies.iter().map(|c| c.domain.clone()).collect();
        domains.sort();
        domains.dedup();
        domains
    }

    pub fn expired_count(&self, now_secs: f64) -> usize {
        self.cookies
            .iter()
            .filter(|c| c.is_expired_at(now_secs))
            .count()
    }
}

/// Reads and writes the session file
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the saved session; a missing file means "no session yet"
    pub fn load(&self) -> Result<Option<StoredSession>> {
        if !self.exists() {
            return Ok(None);
        }

        let data = fs::read_to_string(&self.path)?;
        let session = serde_json::from_str(&data)?;
        Ok(Some(session))
    }

    pub fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)?;
        tracing::info!("Saved session to {}", self.path.display());
        Ok(())
    }

    /// Save fresh cookies, carrying over the origins of the file being
    /// replaced when the new session has none of its own
    pub fn save_keeping_origins(&self, mut session: StoredSession) -> Result<()> {
        if session.origins.is_empty() {
            match self.load() {
                Ok(Some(previous)) => session.origins = previous.origins,
                Ok(None) => {}
                Err(e) => tracing::debug!("Not carrying origins from unreadable session: {}", e),
            }
        }
        self.save(&session)
    }

    /// Delete the session file; returns whether one existed
    pub fn clear(&self) -> Result<bool> {
        if !self.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)?;
        Ok(true)
    }
}
