pub mod completion;
pub mod session;
pub mod setup;
pub mod upload;
