//! Identity and board listing for the logged-in account.

use crate::error::{Error, Result};
use crate::session::Session;
use crate::types::{Board, Username};
use serde::Deserialize;
use tracing::debug;

const MEMBER_PATH: &str = "/1/members/me?fields=username";
const BOARDS_PATH: &str = "/1/Members/me/boards";

#[derive(Debug, Deserialize)]
struct MemberResponse {
    #[serde(default, alias = "Username")]
    username: String,
}

/// Account lookups against an authenticated session
pub struct AccountQuery<'a> {
    session: &'a Session,
}

impl<'a> AccountQuery<'a> {
    /// Create a query bound to `session`
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Fetch the username of the logged-in account
    ///
    /// # Errors
    /// - [`Error::HttpStatus`] for any status other than 200 (a rejected
    ///   cookie shows up here as 401)
    /// - [`Error::Decode`] for a malformed body
    pub async fn fetch_username(&self) -> Result<Username> {
        let url = self.session.endpoint(MEMBER_PATH)?;
        debug!(%url, "fetching member");
        let response = self.session.client().get(url.clone()).send().await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let member: MemberResponse = serde_json::from_str(&body)?;
        Ok(Username(member.username))
    }

    /// Fetch every board the account can see, open and closed
    ///
    /// # Errors
    /// - [`Error::HttpStatus`] for a non-success status
    /// - [`Error::Decode`] if the body is not a JSON array of boards
    pub async fn fetch_boards(&self) -> Result<Vec<Board>> {
        let url = self.session.endpoint(BOARDS_PATH)?;
        debug!(%url, "fetching boards");
        let response = self.session.client().get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let boards: Vec<Board> = serde_json::from_str(&body)?;
        debug!(count = boards.len(), "boards listed");
        Ok(boards)
    }
}
