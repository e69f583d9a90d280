use chrono::{DateTime, Local};
use std::path::PathBuf;

/// Final result of an upload run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Page text confirmed the upload
    Uploaded,
    /// File was handed to the page but no confirmation appeared
    Unconfirmed,
    /// Resume file or folder could not be read
    ResumeUnavailable,
    /// Neither the file input nor the chooser button could be reached
    ControlsUnavailable,
    /// No browser could be launched
    BrowserUnavailable,
}

impl UploadOutcome {
    /// Process exit status for this outcome
    pub fn exit_code(&self) -> u8 {
        match self {
            UploadOutcome::Uploaded => 0,
            UploadOutcome::Unconfirmed => 1,
            UploadOutcome::ResumeUnavailable => 2,
            UploadOutcome::ControlsUnavailable => 3,
            UploadOutcome::BrowserUnavailable => 4,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadOutcome::Uploaded => "uploaded",
            UploadOutcome::Unconfirmed => "unconfirmed",
            UploadOutcome::ResumeUnavailable => "resume unavailable",
            UploadOutcome::ControlsUnavailable => "upload controls unavailable",
            UploadOutcome::BrowserUnavailable => "browser unavailable",
        }
    }
}

/// Outcome plus the context needed to describe it
#[derive(Debug, Clone)]
pub struct Report {
    pub outcome: UploadOutcome,
    /// Path the user asked for (file or folder)
    pub resume_path: PathBuf,
    /// Browser engine that produced the outcome, when one ran
    pub engine: Option<String>,
    /// Several headless engines were probed and none confirmed the upload
    pub probed_engines: bool,
    pub finished_at: DateTime<Local>,
}

impl Report {
    pub fn new(outcome: UploadOutcome, resume_path: impl Into<PathBuf>) -> Self {
        Self {
            outcome,
            resume_path: resume_path.into(),
            engine: None,
            probed_engines: false,
            finished_at: Local::now(),
        }
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn with_probed_engines(mut self) -> Self {
        self.probed_engines = true;
        self
    }

    pub fn timestamp(&self) -> String {
        self.finished_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
