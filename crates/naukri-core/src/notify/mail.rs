use crate::{Error, Result};
use std::io::Write;
use std::process::{Command, Stdio};

/// Sends a plain-text email through a local mail client
pub trait Mailer {
    fn name(&self) -> &'static str;

    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Which mail client to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MailerKind {
    /// Mail.app on macOS, otherwise sendmail when installed
    #[default]
    Auto,
    MailApp,
    Sendmail,
    None,
}

impl MailerKind {
    pub fn build(self) -> Option<Box<dyn Mailer>> {
        match self {
            MailerKind::MailApp => Some(Box::new(MailApp)),
            MailerKind::Sendmail => Some(Box::new(Sendmail)),
            MailerKind::None => None,
            MailerKind::Auto => {
                if cfg!(target_os = "macos") && which::which("osascript").is_ok() {
                    Some(Box::new(MailApp))
                } else if which::which("sendmail").is_ok() {
                    Some(Box::new(Sendmail))
                } else {
                    tracing::debug!("No mail client found; email notifications disabled");
                    None
                }
            }
        }
    }
}

/// Escape text for use inside an AppleScript string literal
pub fn applescript_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Mail.app driven through `osascript`
#[derive(Debug, Default, Clone, Copy)]
pub struct MailApp;

impl MailApp {
    fn script(to: &str, subject: &str, body: &str) -> Vec<String> {
        vec![
            r#"tell application "Mail""#.to_string(),
            format!(
                r#"set newMessage to make new outgoing message with properties {{subject:"{}", content:"{}{}", visible:false}}"#,
                applescript_escape(subject),
                applescript_escape(body),
                "\n"
            ),
            format!(
                r#"tell newMessage to make new to recipient at end of to recipients with properties {{address:"{}"}}"#,
                applescript_escape(to)
            ),
            "send newMessage".to_string(),
            "end tell".to_string(),
        ]
    }
}

impl Mailer for MailApp {
    fn name(&self) -> &'static str {
        "Mail.app"
    }

    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let mut cmd = Command::new("osascript");
        for line in Self::script(to, subject, body) {
            cmd.arg("-e").arg(line);
        }

        let output = cmd.output()?;
        if !output.status.success() {
            return Err(Error::Notify(format!(
                "osascript failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Local MTA via `sendmail -t`
#[derive(Debug, Default, Clone, Copy)]
pub struct Sendmail;

impl Sendmail {
    fn message(to: &str, subject: &str, body: &str) -> String {
        format!(
            "To: {}\nSubject: {}\nContent-Type: text/plain; charset=utf-8\n\n{}\n",
            header_value(to),
            header_value(subject),
            body
        )
    }
}

impl Mailer for Sendmail {
    fn name(&self) -> &'static str {
        "sendmail"
    }

    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let mut child = Command::new("sendmail")
            .arg("-t")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(Self::message(to, subject, body).as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(Error::Notify(format!(
                "sendmail exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

fn header_value(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}
