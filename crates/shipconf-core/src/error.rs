//! Error types for shipconf.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("release packaging requested but no signing credentials are configured")]
    SigningNotConfigured,
}

pub type Result<T> = std::result::Result<T, Error>;
