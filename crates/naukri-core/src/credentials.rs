//! Login credential resolution.
//!
//! The password is looked up in order: explicit flag, a named environment
//! variable, then the OS keychain. A missing password is not an error; the
//! upload simply proceeds without the login fallback.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Username/password pair for the portal login form
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Pair a username with a resolved password; both are required for login
    pub fn from_parts(username: Option<String>, password: Option<String>) -> Option<Self> {
        match (username.and_then(non_empty), password.and_then(non_empty)) {
            (Some(username), Some(password)) => Some(Self::new(username, password)),
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// OS secret store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeychainBackend {
    /// macOS `security` tool
    MacSecurity,
    /// libsecret's `secret-tool`
    SecretTool,
}

impl KeychainBackend {
    /// Backend for the current platform, if its tool is installed
    pub fn detect() -> Option<Self> {
        let candidate = if cfg!(target_os = "macos") {
            KeychainBackend::MacSecurity
        } else {
            KeychainBackend::SecretTool
        };

        which::which(candidate.program()).ok().map(|_| candidate)
    }

    pub fn program(&self) -> &'static str {
        match self {
            KeychainBackend::MacSecurity => "security",
            KeychainBackend::SecretTool => "secret-tool",
        }
    }

    /// Arguments that print the secret for `service` (and `account`) on stdout
    pub fn lookup_args(&self, service: &str, account: Option<&str>) -> Vec<String> {
        let mut args = Vec::new();
        match self {
            KeychainBackend::MacSecurity => {
                args.push("find-generic-password".to_string());
                if let Some(account) = account {
                    args.push("-a".to_string());
                    args.push(account.to_string());
                }
                args.push("-s".to_string());
                args.push(service.to_string());
                args.push("-w".to_string());
            }
            KeychainBackend::SecretTool => {
                args.push("lookup".to_string());
                args.push("service".to_string());
                args.push(service.to_string());
                if let Some(account) = account {
                    args.push("account".to_string());
                    args.push(account.to_string());
                }
            }
        }
        args
    }
}

/// Reads a generic password from the OS keychain
#[derive(Debug, Clone)]
pub struct KeychainLookup {
    service: String,
    backend: Option<KeychainBackend>,
    /// Overrides the backend's tool, resolved through `PATH` otherwise
    program: Option<PathBuf>,
}

impl KeychainLookup {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            backend: KeychainBackend::detect(),
            program: None,
        }
    }

    pub fn with_backend(mut self, backend: Option<KeychainBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Look up the secret; any failure yields `None`
    pub fn find(&self, account: Option<&str>) -> Option<String> {
        let backend = self.backend?;
        let program = self
            .program
            .as_deref()
            .unwrap_or_else(|| Path::new(backend.program()));
        let output = Command::new(program)
            .args(backend.lookup_args(&self.service, account))
            .output();

        match output {
            Ok(output) if output.status.success() => {
                non_empty(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
            }
            Ok(output) => {
                tracing::debug!(
                    "Keychain lookup for '{}' failed: {}",
                    self.service,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                None
            }
            Err(e) => {
                tracing::debug!("Could not run {}: {}", program.display(), e);
                None
            }
        }
    }
}

/// Where a password may come from, in priority order
pub struct PasswordSources<'a> {
    /// Value given directly on the command line
    pub explicit: Option<String>,
    /// Name of the environment variable holding the password
    pub env_var: &'a str,
    /// Keychain entry consulted last
    pub keychain: Option<KeychainLookup>,
}

impl PasswordSources<'_> {
    /// Resolve using the process environment
    pub fn resolve(self, account: Option<&str>) -> Option<String> {
        self.resolve_with(account, |name| std::env::var(name).ok())
    }

    /// Credentials for `username`, resolving the password only when there
    /// is someone to log in as
    pub fn credentials_for(self, username: Option<String>) -> Option<Credentials> {
        self.credentials_for_with(username, |name| std::env::var(name).ok())
    }

    pub fn credentials_for_with<F>(self, username: Option<String>, env: F) -> Option<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = username.and_then(non_empty)?;
        let password = self.resolve_with(Some(&username), env);
        Credentials::from_parts(Some(username), password)
    }

    /// Resolve with an injectable environment lookup
    pub fn resolve_with<F>(self, account: Option<&str>, env: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(password) = self.explicit.and_then(non_empty) {
            tracing::debug!("Using password from command line");
            return Some(password);
        }

        if let Some(password) = env(self.env_var).and_then(non_empty) {
            tracing::debug!("Using password from ${}", self.env_var);
            return Some(password);
        }

        let keychain = self.keychain?;
        let password = keychain.find(account);
        if password.is_some() {
            tracing::debug!("Using password from keychain service '{}'", keychain.service());
        }
        password
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
