//! # board-backup
//!
//! Back up every open Trello board of an account to local disk: the full
//! JSON export of each board plus the attachment and background files it
//! references.
//!
//! ## Design
//!
//! - **Sequential** - one request at a time, in a fixed order
//! - **Fail fast** - the first error ends the run, nothing is retried
//! - **Incremental** - assets already on disk are never fetched again
//!
//! ## Quick Start
//!
//! ```no_run
//! use board_backup::{BackupOrchestrator, Config, ConsoleProgress, login_from_args};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let login = login_from_args(&["my-token-cookie".to_string()])?;
//!     let backup = BackupOrchestrator::new(Config::default(), login, Box::new(ConsoleProgress))?;
//!
//!     let summary = backup.run().await?;
//!     println!("{} boards saved", summary.boards_backed_up);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Account identity and board listing
pub mod account;
/// Asset URL extraction and download
pub mod assets;
/// Backup run orchestration
pub mod backup;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Board export download and naming
pub mod export;
/// Progress reporting
pub mod progress;
/// Authenticated sessions and login strategies
pub mod session;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use assets::{AssetDownloader, AssetExtractor, DownloadOutcome};
pub use backup::BackupOrchestrator;
pub use config::Config;
pub use error::{AuthError, Error, ErrorKind, Result, Step};
pub use progress::{ConsoleProgress, Progress, RecordingProgress, SilentProgress};
pub use session::{
    CookieLogin, CredentialLogin, LoginState, OneTimeCode, Session, SessionEstablisher,
    TotpCodeGenerator, USAGE, login_from_args,
};
pub use types::{AssetKind, AssetReference, BackupSummary, Board, Credentials, Event, Username};
