use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Chromium-family browsers that speak the DevTools protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrowserEngine {
    Chromium,
    Chrome,
    Edge,
    Brave,
}

impl BrowserEngine {
    /// Preference order used when probing installed engines
    pub const ALL: [BrowserEngine; 4] = [
        BrowserEngine::Chromium,
        BrowserEngine::Chrome,
        BrowserEngine::Edge,
        BrowserEngine::Brave,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserEngine::Chromium => "Chromium",
            BrowserEngine::Chrome => "Google Chrome",
            BrowserEngine::Edge => "Microsoft Edge",
            BrowserEngine::Brave => "Brave",
        }
    }

    /// Guess the engine from a binary's file name
    pub fn from_binary(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        if name.contains("brave") {
            Some(BrowserEngine::Brave)
        } else if name.contains("edge") {
            Some(BrowserEngine::Edge)
        } else if name.contains("chromium") {
            Some(BrowserEngine::Chromium)
        } else if name.contains("chrome") {
            Some(BrowserEngine::Chrome)
        } else {
            None
        }
    }

    /// Application process name, as macOS System Events sees it
    pub fn process_name(&self) -> &'static str {
        match self {
            BrowserEngine::Chromium => "Chromium",
            BrowserEngine::Chrome => "Google Chrome",
            BrowserEngine::Edge => "Microsoft Edge",
            BrowserEngine::Brave => "Brave Browser",
        }
    }

    /// Platform-specific install locations
    fn default_paths(&self) -> Vec<PathBuf> {
        #[cfg(target_os = "macos")]
        let paths: &[&str] = match self {
            BrowserEngine::Chromium => &["/Applications/Chromium.app/Contents/MacOS/Chromium"],
            BrowserEngine::Chrome => {
                &["/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"]
            }
            BrowserEngine::Edge => {
                &["/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge"]
            }
            BrowserEngine::Brave => {
                &["/Applications/Brave Browser.app/Contents/MacOS/Brave Browser"]
            }
        };

        #[cfg(target_os = "linux")]
        let paths: &[&str] = match self {
            BrowserEngine::Chromium => &[
                "/usr/bin/chromium",
                "/usr/bin/chromium-browser",
                "/snap/bin/chromium",
            ],
            BrowserEngine::Chrome => &["/usr/bin/google-chrome", "/usr/bin/google-chrome-stable"],
            BrowserEngine::Edge => &["/usr/bin/microsoft-edge", "/usr/bin/microsoft-edge-stable"],
            BrowserEngine::Brave => &["/usr/bin/brave-browser", "/usr/bin/brave"],
        };

        #[cfg(target_os = "windows")]
        let paths: &[&str] = match self {
            BrowserEngine::Chromium => &[r"C:\Program Files\Chromium\Application\chrome.exe"],
            BrowserEngine::Chrome => &[
                r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            ],
            BrowserEngine::Edge => {
                &[r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe"]
            }
            BrowserEngine::Brave => {
                &[r"C:\Program Files\BraveSoftware\Brave-Browser\Application\brave.exe"]
            }
        };

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        let paths: &[&str] = &[];

        paths.iter().map(PathBuf::from).collect()
    }
}

impl fmt::Display for BrowserEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A browser binary that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedBrowser {
    pub engine: BrowserEngine,
    pub path: PathBuf,
}

/// Locates Chromium-family browser binaries on the system
pub struct ChromeFinder {
    custom_path: Option<PathBuf>,
}

impl ChromeFinder {
    /// Create a new ChromeFinder with optional custom path
    pub fn new(custom_path: Option<PathBuf>) -> Self {
        Self { custom_path }
    }

    /// Find a browser, checking the custom path first.
    ///
    /// With no engine given, the first installed engine in
    /// [`BrowserEngine::ALL`] order wins.
    pub fn find(&self, engine: Option<BrowserEngine>) -> Result<LocatedBrowser> {
        if let Some(ref path) = self.custom_path {
            let engine = engine
                .or_else(|| BrowserEngine::from_binary(path))
                .unwrap_or(BrowserEngine::Chromium);
            return Ok(LocatedBrowser {
                engine,
                path: validate_browser_path(path)?,
            });
        }

        let engines: Vec<BrowserEngine> = match engine {
            Some(engine) => vec![engine],
            None => BrowserEngine::ALL.to_vec(),
        };

        for engine in &engines {
            if let Some(found) = Self::find_engine(*engine) {
                return Ok(found);
            }
        }

        let checked: Vec<String> = engines
            .iter()
            .flat_map(|e| e.default_paths())
            .map(|p| p.display().to_string())
            .collect();

        Err(Error::Browser(format!(
            "Browser not found. Checked: {}. Use --chrome-path to specify location.",
            checked.join(", ")
        )))
    }

    /// Every installed engine, in preference order
    pub fn installed(&self) -> Vec<LocatedBrowser> {
        if self.custom_path.is_some() {
            return self.find(None).into_iter().collect();
        }

        BrowserEngine::ALL
            .iter()
            .filter_map(|engine| Self::find_engine(*engine))
            .collect()
    }

    fn find_engine(engine: BrowserEngine) -> Option<LocatedBrowser> {
        engine
            .default_paths()
            .iter()
            .find_map(|path| validate_browser_path(path).ok())
            .map(|path| LocatedBrowser { engine, path })
    }
}

/// Validate that a path exists and is executable
fn validate_browser_path(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(Error::Browser(format!(
            "Browser not found at: {}",
            path.display()
        )));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = std::fs::metadata(path).map_err(Error::Io)?;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(Error::Browser(format!(
                "Browser binary not executable: {}",
                path.display()
            )));
        }
    }

    Ok(path.to_path_buf())
}
