use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Throwaway browser user-data directory.
///
/// Each run starts from an empty profile so that cookie state only ever
/// comes from the session file. The directory is removed on drop.
pub struct ProfileDir {
    path: PathBuf,
}

impl ProfileDir {
    pub fn temporary() -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("naukri-profile-")
            .tempdir()
            .map_err(Error::Io)?;

        Ok(Self {
            path: temp_dir.keep(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProfileDir {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                tracing::debug!("Could not remove profile {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_is_created_and_removed() {
        let profile = ProfileDir::temporary().unwrap();
        let path = profile.path().to_path_buf();

        assert!(path.is_dir());
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("naukri-profile-")
        );

        std::fs::write(path.join("Cookies"), b"stale").unwrap();
        drop(profile);

        assert!(!path.exists());
    }
}
