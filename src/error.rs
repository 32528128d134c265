//! Error types for board-backup
//!
//! Every failure in a backup run is terminal. This module provides:
//! - The [`Error`] enum covering transport, remote-format, authentication,
//!   local I/O and decode failures
//! - [`AuthError`] for the login handshake
//! - [`Step`] context naming which step of the run failed
//! - [`ErrorKind`] classification used for exit codes and tests

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for board-backup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for board-backup
#[derive(Debug, Error)]
pub enum Error {
    /// Wrong number of command-line arguments
    #[error("usage error: {0}")]
    Usage(String),

    /// Invalid configuration value
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// Network, DNS or TLS failure
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// An API call answered with a non-success status
    #[error("response status {status} from {url}")]
    HttpStatus {
        /// The HTTP status code returned
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// An expected pattern or field was absent from a remote response
    #[error("unexpected remote format: {0} (board-backup may need to be updated)")]
    RemoteFormat(String),

    /// Login handshake failure
    #[error("{0}")]
    Authentication(#[from] AuthError),

    /// Local file or directory failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local file failure with the offending path
    #[error("I/O error on {path}: {source}")]
    File {
        /// The file or directory being written
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// A built-in or configured pattern failed to compile
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Malformed JSON response
    #[error("decode json: {0}")]
    Decode(#[from] serde_json::Error),

    /// A failure annotated with the step of the run it happened in
    #[error("{step}: {source}")]
    Step {
        /// The step that failed
        step: Step,
        /// The underlying error
        source: Box<Error>,
    },
}

/// Login handshake errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// The login page no longer carries the session token marker
    #[error("could not find dsc in login page")]
    TokenNotFound,

    /// The account requires a one-time code and no secret was supplied
    #[error("second factor required")]
    SecondFactorRequired,

    /// The service rejected the credentials or the one-time code
    #[error("api error: {0}")]
    Rejected(String),

    /// The one-time code secret could not be decoded
    #[error("invalid TOTP secret: {0}")]
    InvalidSecret(String),
}

/// Step of a backup run, used as error context
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Fetching the login page token
    LoginToken,
    /// Exchanging credentials for an authentication code
    Authenticate,
    /// Turning the authentication code into a session
    UpdateSession,
    /// Looking up the logged-in username
    Username,
    /// Listing boards
    Boards,
    /// Fetching a board export
    BoardExport,
    /// Writing a board export to disk
    SaveExport,
    /// Downloading one asset of the given singular kind
    Asset(&'static str),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::LoginToken => write!(f, "could not get login token"),
            Step::Authenticate => write!(f, "could not authenticate"),
            Step::UpdateSession => write!(f, "could not update session info"),
            Step::Username => write!(f, "could not get username"),
            Step::Boards => write!(f, "could not get boards"),
            Step::BoardExport => write!(f, "could not get board JSON"),
            Step::SaveExport => write!(f, "could not save file"),
            Step::Asset(kind) => write!(f, "could not download {kind}"),
        }
    }
}

/// Error taxonomy class
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad argument count
    Usage,
    /// Bad configuration value
    Config,
    /// Network, DNS, TLS or unexpected HTTP status
    Transport,
    /// Remote service changed shape
    RemoteFormat,
    /// Bad credentials, rejected or missing second factor
    Authentication,
    /// File or directory failure
    LocalIo,
    /// Malformed JSON
    Decode,
}

impl Error {
    /// Wrap this error with the step it happened in
    pub fn at(self, step: Step) -> Self {
        Error::Step {
            step,
            source: Box::new(self),
        }
    }

    /// Classify the innermost error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Usage(_) => ErrorKind::Usage,
            Error::Config { .. } | Error::Pattern(_) => ErrorKind::Config,
            Error::Transport(e) if e.is_decode() => ErrorKind::Decode,
            Error::Transport(_) => ErrorKind::Transport,
            Error::HttpStatus { status, .. } if *status == 401 || *status == 403 => {
                ErrorKind::Authentication
            }
            Error::HttpStatus { .. } => ErrorKind::Transport,
            Error::RemoteFormat(_) => ErrorKind::RemoteFormat,
            Error::Authentication(AuthError::TokenNotFound) => ErrorKind::RemoteFormat,
            Error::Authentication(_) => ErrorKind::Authentication,
            Error::Io(_) | Error::File { .. } => ErrorKind::LocalIo,
            Error::Decode(_) => ErrorKind::Decode,
            Error::Step { source, .. } => source.kind(),
        }
    }

    /// The step annotation, if any
    pub fn step(&self) -> Option<&Step> {
        match self {
            Error::Step { step, .. } => Some(step),
            _ => None,
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        1
    }
}

/// Adds step context to fallible results
pub trait ResultExt<T> {
    /// Annotate the error with the step it happened in
    fn at(self, step: Step) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn at(self, step: Step) -> Result<T> {
        self.map_err(|e| e.into().at(step))
    }
}
