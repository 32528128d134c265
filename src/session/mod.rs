//! Authenticated HTTP sessions and the two login strategies.
//!
//! A [`Session`] owns the HTTP client and its cookie jar for the lifetime of a
//! run. A [`SessionEstablisher`] fills the jar, either by installing a bearer
//! cookie ([`CookieLogin`]) or by running the credential handshake
//! ([`CredentialLogin`]).

mod cookie;
mod credentials;
mod totp;

pub use cookie::CookieLogin;
pub use credentials::{CredentialLogin, LoginState};
pub use totp::{OneTimeCode, TotpCodeGenerator};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::progress::Progress;
use crate::types::Credentials;
use async_trait::async_trait;
use reqwest::cookie::Jar;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Usage banner printed when the argument count is wrong
pub const USAGE: &str = "Usage: trellobackup (TOKEN_COOKIE | USERNAME PASSWORD [TOTP_SECRET])\n\
Note: If you're using an Atlassian account, you must use the token cookie.";

/// Authenticated HTTP context shared by every step of a run
pub struct Session {
    client: reqwest::Client,
    jar: Arc<Jar>,
    base_url: Url,
}

impl Session {
    /// Create an unauthenticated session for the configured service
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config.parsed_base_url()?;
        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            jar,
            base_url,
        })
    }

    /// The underlying HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// The service base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an API path against the service base URL
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::RemoteFormat(format!("invalid endpoint {path}: {e}")))
    }

    /// Install a raw `Set-Cookie` style cookie for the service host
    pub(crate) fn add_cookie(&self, cookie: &str) {
        debug!(host = ?self.base_url.host_str(), "installing session cookie");
        self.jar.add_cookie_str(cookie, &self.base_url);
    }

    /// Cookie header the jar would send to the service, if any
    pub fn cookie_header(&self) -> Option<String> {
        use reqwest::cookie::CookieStore;
        self.jar
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// A strategy that turns a fresh [`Session`] into an authenticated one
#[async_trait]
pub trait SessionEstablisher: Send + Sync {
    /// Authenticate `session`, reporting each step to `progress`
    async fn establish(&self, session: &Session, progress: &dyn Progress) -> Result<()>;
}

/// Pick the login strategy from the positional command-line arguments
///
/// One argument selects bearer-cookie login; two or three select credential
/// login with an optional TOTP secret.
///
/// # Errors
/// Returns [`Error::Usage`] for any other argument count.
pub fn login_from_args(args: &[String]) -> Result<Box<dyn SessionEstablisher>> {
    match args {
        [token] => Ok(Box::new(CookieLogin::new(token.clone()))),
        [username, password] => Ok(Box::new(CredentialLogin::new(Credentials {
            username: username.clone(),
            password: password.clone(),
            totp_secret: None,
        }))),
        [username, password, secret] => Ok(Box::new(CredentialLogin::new(Credentials {
            username: username.clone(),
            password: password.clone(),
            totp_secret: Some(secret.clone()),
        }))),
        _ => Err(Error::Usage(format!(
            "expected 1 to 3 arguments, got {}",
            args.len()
        ))),
    }
}
