//! Default on-disk locations, all rooted at `~/naukri_job`.

use crate::{Error, Result};
use std::path::PathBuf;

const DATA_DIR_NAME: &str = "naukri_job";

/// Root directory holding the resume folder and the saved session
pub fn data_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(DATA_DIR_NAME))
        .ok_or(Error::NoHomeDir)
}

/// Default resume location (a folder; the newest supported file is picked)
pub fn default_resume_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("resume"))
}

/// Default session file location
pub fn default_storage_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("storage_state.json"))
}
