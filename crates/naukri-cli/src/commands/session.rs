//! Inspect or delete the saved session.
//!
//! ```bash
//! naukri-uploader session info
//! naukri-uploader session clear --force
//! ```

use anyhow::{Result, anyhow};
use naukri_browser::SessionStore;
use naukri_core::paths;
use std::io::{self, Write};
use std::path::PathBuf;

fn store(storage: Option<PathBuf>) -> Result<SessionStore> {
    let path = match storage {
        Some(path) => path,
        None => paths::default_storage_path()?,
    };
    Ok(SessionStore::new(path))
}

/// Show what the session file holds
pub fn info(storage: Option<PathBuf>) -> Result<()> {
    let store = store(storage)?;

    let Some(session) = store.load()? else {
        return Err(anyhow!(
            "Session not found at {}. Run 'naukri-uploader setup' first.",
            store.path().display()
        ));
    };

    let now = chrono::Utc::now().timestamp() as f64;

    println!("Session: {}", store.path().display());
    if let Some(saved_at) = &session.saved_at {
        println!("Saved: {}", saved_at);
    }
    println!(
        "Cookies: {} ({} expired)",
        session.cookies.len(),
        session.expired_count(now)
    );

    let domains = session.domains();
    if !domains.is_empty() {
        println!("Domains: {}", domains.join(", "));
    }

    if session.cookies.is_empty() {
        println!("⚠️  No cookies saved. Run 'naukri-uploader setup' to log in again.");
    }

    Ok(())
}

/// Delete the session file
pub fn clear(storage: Option<PathBuf>, force: bool) -> Result<()> {
    let store = store(storage)?;

    if !store.exists() {
        return Err(anyhow!(
            "Session not found at {}",
            store.path().display()
        ));
    }

    if !force {
        print!(
            "⚠️  This will delete the saved login at {}.\nType 'yes' to confirm: ",
            store.path().display()
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if input.trim() != "yes" {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    store.clear()?;
    println!("✅ Session deleted");

    Ok(())
}
