//! Bearer-cookie login.

use super::{Session, SessionEstablisher};
use crate::error::{Error, Result};
use crate::progress::Progress;
use crate::types::Event;
use async_trait::async_trait;
use tracing::info;

/// Name of the session cookie the service reads
pub const TOKEN_COOKIE_NAME: &str = "token";

/// Lifetime given to the installed cookie, in seconds
const TOKEN_COOKIE_MAX_AGE_SECS: u64 = 3600;

/// Logs in by installing an existing `token` cookie
///
/// No request is made; a bad token only shows up when the first API call is
/// rejected. Tokens that cannot be a cookie value are refused up front.
pub struct CookieLogin {
    token: String,
}

impl CookieLogin {
    /// Create a login from the raw cookie value
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Refuse tokens that are not a valid cookie value
    fn check_token(&self) -> Result<()> {
        let invalid = |c: char| {
            c.is_ascii_control() || c.is_whitespace() || matches!(c, ';' | ',' | '"' | '\\')
        };
        if self.token.is_empty() {
            return Err(Error::Usage("token cookie is empty".to_string()));
        }
        if let Some(c) = self.token.chars().find(|c| invalid(*c)) {
            return Err(Error::Usage(format!(
                "token cookie contains {c:?}, which is not allowed in a cookie value"
            )));
        }
        Ok(())
    }

    fn cookie_line(&self, domain: &str) -> String {
        format!(
            "{TOKEN_COOKIE_NAME}={}; Domain={domain}; Path=/; Max-Age={TOKEN_COOKIE_MAX_AGE_SECS}",
            self.token
        )
    }
}

#[async_trait]
impl SessionEstablisher for CookieLogin {
    async fn establish(&self, session: &Session, progress: &dyn Progress) -> Result<()> {
        progress.emit(Event::LoginWithCookie);
        self.check_token()?;
        let domain = session.base_url().host_str().unwrap_or_default().to_string();
        session.add_cookie(&self.cookie_line(&domain));
        info!(%domain, "token cookie installed");
        Ok(())
    }
}
