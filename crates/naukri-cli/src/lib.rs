use clap::ValueEnum;
use naukri_browser::BrowserEngine;
use naukri_core::notify::MailerKind;

pub mod commands;

/// Browser selection on the command line
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum EngineChoice {
    /// Probe installed engines headless, or pick the first one when headed
    Auto,
    Chromium,
    Chrome,
    Edge,
    Brave,
}

impl EngineChoice {
    /// Concrete engine, `None` for auto
    pub fn engine(&self) -> Option<BrowserEngine> {
        match self {
            EngineChoice::Auto => None,
            EngineChoice::Chromium => Some(BrowserEngine::Chromium),
            EngineChoice::Chrome => Some(BrowserEngine::Chrome),
            EngineChoice::Edge => Some(BrowserEngine::Edge),
            EngineChoice::Brave => Some(BrowserEngine::Brave),
        }
    }
}

/// Mail client used for email notifications
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum MailerChoice {
    Auto,
    MailApp,
    Sendmail,
    None,
}

impl From<MailerChoice> for MailerKind {
    fn from(choice: MailerChoice) -> Self {
        match choice {
            MailerChoice::Auto => MailerKind::Auto,
            MailerChoice::MailApp => MailerKind::MailApp,
            MailerChoice::Sendmail => MailerKind::Sendmail,
            MailerChoice::None => MailerKind::None,
        }
    }
}
