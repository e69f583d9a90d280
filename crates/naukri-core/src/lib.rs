pub mod credentials;
pub mod error;
pub mod indicators;
pub mod notify;
pub mod outcome;
pub mod paths;
pub mod portal;
pub mod resume;
pub mod workflow;

pub use credentials::{Credentials, KeychainLookup, PasswordSources};
pub use error::{Error, Result};
pub use outcome::{Report, UploadOutcome};
pub use portal::Portal;
pub use workflow::{AttemptPolicy, LoginOutcome, UploadWorkflow};
