//! Core types and events for board-backup

use serde::{Deserialize, Serialize};
use std::fmt;

/// Username of the logged-in account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(pub String);

impl Username {
    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A board as listed by the members API
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Board {
    /// Board id
    pub id: String,
    /// Short link code (e.g. "aBcD1234")
    pub short_link: String,
    /// Short board URL; the export lives at this URL plus ".json"
    #[serde(alias = "shortURL")]
    pub short_url: String,
    /// Display name
    pub name: String,
    /// Whether the board is archived
    pub closed: bool,
}

/// Login credentials supplied on the command line
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account username or email
    pub username: String,
    /// Account password
    pub password: String,
    /// Base32 TOTP secret for accounts with a second factor
    pub totp_secret: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field(
                "totp_secret",
                &self.totp_secret.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Kind of media referenced from a board export
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Card attachments
    Attachment,
    /// Board backgrounds
    Background,
}

impl AssetKind {
    /// All kinds, in the order a board is processed
    pub const ALL: [AssetKind; 2] = [AssetKind::Attachment, AssetKind::Background];

    /// Plural name, used for storage hosts and local directories
    pub fn plural(self) -> &'static str {
        match self {
            AssetKind::Attachment => "attachments",
            AssetKind::Background => "backgrounds",
        }
    }

    /// Singular name, used in progress lines
    pub fn singular(self) -> &'static str {
        match self {
            AssetKind::Attachment => "attachment",
            AssetKind::Background => "background",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plural())
    }
}

/// An asset URL found in a board export
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssetReference {
    /// What kind of asset the URL points at
    pub kind: AssetKind,
    /// The full URL, verbatim from the export
    pub url: String,
}

/// Progress events emitted during a backup run
///
/// `Display` renders the console line for each event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Bearer-cookie login selected
    LoginWithCookie,
    /// Credential login selected
    LoginWithAccount,
    /// Fetching the login page token
    FetchingLoginToken,
    /// Posting credentials
    Authenticating,
    /// Posting the authentication code for a session
    UpdatingSession,
    /// Username lookup succeeded
    LoggedIn {
        /// The account username
        username: Username,
    },
    /// Listing boards
    FetchingBoards,
    /// A closed board was skipped
    SkippedClosedBoard {
        /// The skipped board
        board: Board,
    },
    /// A board backup started
    BackingUp {
        /// The board being backed up
        board: Board,
    },
    /// Writing the board export
    SavingExport,
    /// Scanning for one asset kind
    DownloadingKind {
        /// The kind being processed
        kind: AssetKind,
    },
    /// One asset reference is being handled
    DownloadingAsset {
        /// The asset
        asset: AssetReference,
    },
    /// Run finished
    Complete,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::LoginWithCookie => write!(f, "Logging in with token cookie"),
            Event::LoginWithAccount => write!(f, "Logging in with Trello account"),
            Event::FetchingLoginToken => write!(f, "Getting login token"),
            Event::Authenticating => write!(f, "Authenticating"),
            Event::UpdatingSession => write!(f, "Updating session info"),
            Event::LoggedIn { username } => write!(f, "Logged in as {username}"),
            Event::FetchingBoards => write!(f, "Getting boards"),
            Event::SkippedClosedBoard { board } => write!(
                f,
                "Skipping closed board {} ({}) (id: {})",
                board.name, board.short_link, board.id
            ),
            Event::BackingUp { board } => write!(
                f,
                "Backing up {} ({}) (id: {})",
                board.name, board.short_link, board.id
            ),
            Event::SavingExport => write!(f, "--> Saving JSON"),
            Event::DownloadingKind { kind } => write!(f, "--> Downloading {kind}"),
            Event::DownloadingAsset { asset } => {
                write!(f, "    Downloading {} {}", asset.kind.singular(), asset.url)
            }
            Event::Complete => write!(f, "Successfully backed up Trello data"),
        }
    }
}

/// Counts reported at the end of a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BackupSummary {
    /// Boards whose export was written
    pub boards_backed_up: usize,
    /// Closed boards that were skipped
    pub boards_skipped: usize,
    /// Assets fetched over the network
    pub assets_downloaded: usize,
    /// Asset references whose file already existed
    pub assets_present: usize,
}
