//! Board export download and export file naming.

use crate::error::{Error, Result};
use crate::session::Session;
use crate::types::{Board, Username};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Timestamp layout embedded in export file names
pub const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M";

/// Fetches full board exports
pub struct BoardExporter<'a> {
    session: &'a Session,
}

impl<'a> BoardExporter<'a> {
    /// Create an exporter bound to `session`
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// URL of a board's JSON export
    pub fn export_url(board: &Board) -> Result<Url> {
        if board.short_url.is_empty() {
            return Err(Error::RemoteFormat(format!(
                "board {} has no short URL",
                board.id
            )));
        }
        let raw = format!("{}.json", board.short_url);
        Url::parse(&raw).map_err(|e| Error::RemoteFormat(format!("invalid export URL {raw}: {e}")))
    }

    /// Fetch the raw export body of `board`
    ///
    /// The body is returned verbatim; it is neither parsed nor status-checked.
    pub async fn fetch_export(&self, board: &Board) -> Result<Vec<u8>> {
        let url = Self::export_url(board)?;
        debug!(%url, board = %board.id, "fetching board export");
        let body = self.session.client().get(url).send().await?.bytes().await?;
        debug!(bytes = body.len(), "board export received");
        Ok(body.to_vec())
    }
}

/// Strip every character outside `[a-zA-Z0-9_)(-]` from a board name
pub fn sanitize_board_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ')' | '(' | '-'))
        .collect()
}

/// File name for a board export:
/// `trello_<YYYY-MM-DD_HH-MM>_<username>_<boardID>_<sanitizedName>.json`
pub fn export_filename(timestamp: &NaiveDateTime, username: &Username, board: &Board) -> String {
    format!(
        "trello_{}_{}_{}_{}.json",
        timestamp.format(EXPORT_TIMESTAMP_FORMAT),
        username,
        board.id,
        sanitize_board_name(&board.name)
    )
}

/// Write an export body to `dir/filename`
pub async fn save_export(dir: &Path, filename: &str, body: &[u8]) -> Result<PathBuf> {
    let path = dir.join(filename);
    tokio::fs::write(&path, body)
        .await
        .map_err(|source| Error::File {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}
