use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Page text that confirms the resume was accepted
    pub static ref SUCCESS_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)uploaded\s+on").unwrap(),
        Regex::new(r"(?i)resume uploaded successfully").unwrap(),
        Regex::new(r"(?i)success").unwrap(),
    ];

    static ref OTP_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)OTP").unwrap(),
        Regex::new(r"(?i)one[- ]time password").unwrap(),
    ];

    static ref LOGOUT_PATTERN: Regex = Regex::new(r"(?i)logout").unwrap();

    /// Label of the button that opens the resume file chooser
    pub static ref UPDATE_RESUME_LABEL: Regex = Regex::new(r"(?i)update resume").unwrap();

    /// Label of the login form's submit button
    pub static ref LOGIN_LABEL: Regex = Regex::new(r"(?i)login|submit").unwrap();
}

/// True when the rendered page confirms a completed upload
pub fn shows_upload_success(html: &str) -> bool {
    SUCCESS_PATTERNS.iter().any(|rx| rx.is_match(html))
}

/// True when the portal is asking for a one-time password
pub fn requires_otp(html: &str) -> bool {
    OTP_PATTERNS.iter().any(|rx| rx.is_match(html))
}

/// Fallback logged-in check used when the upload button is not found
pub fn shows_logout(html: &str) -> bool {
    LOGOUT_PATTERN.is_match(html)
}
