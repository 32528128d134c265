//! Username/password login with an optional second factor.
//!
//! The handshake runs as a small state machine:
//!
//! ```text
//! Start -> TokenFetched -> Authenticated -> SessionEstablished
//! ```
//!
//! 1. The login page carries a `dsc` token needed to finalize the session.
//! 2. Credentials are exchanged for an authentication code. If the service
//!    answers `TWO_FACTOR_MISSING` and a TOTP secret is known, the exchange is
//!    repeated once with a fresh one-time code.
//! 3. The authentication code and `dsc` token are posted to the session
//!    endpoint, which sets the session cookies.
//!
//! Any failure aborts the handshake.

use super::totp::{OneTimeCode, TotpCodeGenerator};
use super::{Session, SessionEstablisher};
use crate::error::{AuthError, Error, ResultExt, Result, Step};
use crate::progress::Progress;
use crate::types::{Credentials, Event};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

const LOGIN_PAGE_PATH: &str = "/login";
const AUTHENTICATION_PATH: &str = "/1/authentication";
const SESSION_PATH: &str = "/1/authorization/session";

/// Marker around the session token in the login page
const LOGIN_TOKEN_PATTERN: &str = r#"dsc="([a-zA-Z0-9]+)""#;

/// Error string the service returns when a one-time code is needed
const SECOND_FACTOR_SIGNAL: &str = "TWO_FACTOR_MISSING";

/// Progress of the credential handshake
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginState {
    /// Nothing done yet
    Start,
    /// Login page token scraped
    TokenFetched {
        /// The `dsc` token
        token: String,
    },
    /// Credentials accepted
    Authenticated {
        /// The `dsc` token
        token: String,
        /// Authentication code returned by the service
        code: String,
    },
    /// Session cookies installed
    SessionEstablished,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AuthenticationResponse {
    #[serde(alias = "Code")]
    code: String,
    #[serde(alias = "Error")]
    error: String,
}

/// Logs in with username, password and an optional TOTP secret
pub struct CredentialLogin {
    credentials: Credentials,
    codes: Box<dyn OneTimeCode>,
}

impl CredentialLogin {
    /// Create a login using RFC 6238 codes for the second factor
    pub fn new(credentials: Credentials) -> Self {
        Self::with_code_generator(credentials, Box::new(TotpCodeGenerator))
    }

    /// Create a login with a custom one-time code source
    pub fn with_code_generator(credentials: Credentials, codes: Box<dyn OneTimeCode>) -> Self {
        Self { credentials, codes }
    }

    /// Move the handshake one state forward
    ///
    /// # Errors
    /// Any failure of the transition's request, annotated with its step.
    /// Advancing from [`LoginState::SessionEstablished`] is a no-op.
    pub async fn advance(
        &self,
        state: LoginState,
        session: &Session,
        progress: &dyn Progress,
    ) -> Result<LoginState> {
        match state {
            LoginState::Start => {
                progress.emit(Event::FetchingLoginToken);
                let token = self.fetch_login_token(session).await.at(Step::LoginToken)?;
                Ok(LoginState::TokenFetched { token })
            }
            LoginState::TokenFetched { token } => {
                progress.emit(Event::Authenticating);
                let code = self
                    .exchange_credentials(session)
                    .await
                    .at(Step::Authenticate)?;
                Ok(LoginState::Authenticated { token, code })
            }
            LoginState::Authenticated { token, code } => {
                progress.emit(Event::UpdatingSession);
                self.update_session(session, &code, &token)
                    .await
                    .at(Step::UpdateSession)?;
                Ok(LoginState::SessionEstablished)
            }
            LoginState::SessionEstablished => Ok(LoginState::SessionEstablished),
        }
    }

    /// Scrape the `dsc` token from the login page
    ///
    /// # Errors
    /// Returns [`AuthError::TokenNotFound`] if the page no longer carries the
    /// token marker.
    pub async fn fetch_login_token(&self, session: &Session) -> Result<String> {
        let url = session.endpoint(LOGIN_PAGE_PATH)?;
        debug!(%url, "fetching login page");
        let body = session.client().get(url).send().await?.text().await?;

        let pattern = Regex::new(LOGIN_TOKEN_PATTERN)?;
        pattern
            .captures(&body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| AuthError::TokenNotFound.into())
    }

    /// Exchange credentials for an authentication code, answering a
    /// second-factor challenge once if a TOTP secret is known
    ///
    /// # Errors
    /// - [`AuthError::SecondFactorRequired`] if the account needs a code and
    ///   no secret was supplied
    /// - [`AuthError::Rejected`] for any other error the service reports
    pub async fn exchange_credentials(&self, session: &Session) -> Result<String> {
        match self.authenticate(session, None).await {
            Err(Error::Authentication(AuthError::Rejected(message)))
                if message.contains(SECOND_FACTOR_SIGNAL) =>
            {
                let Some(secret) = self.credentials.totp_secret.as_deref() else {
                    return Err(AuthError::SecondFactorRequired.into());
                };
                info!("second factor requested, submitting one-time code");
                let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
                let code = self.codes.code_at(secret, now)?;
                self.authenticate(session, Some(&code)).await
            }
            other => other,
        }
    }

    /// Post credentials once, optionally with a one-time code
    async fn authenticate(&self, session: &Session, one_time_code: Option<&str>) -> Result<String> {
        let mut form = vec![
            ("factors[user]", self.credentials.username.as_str()),
            ("factors[password]", self.credentials.password.as_str()),
            ("method", "password"),
        ];
        if let Some(code) = one_time_code {
            form.push(("factors[totp][password]", code));
        }

        let url = session.endpoint(AUTHENTICATION_PATH)?;
        debug!(%url, with_code = one_time_code.is_some(), "submitting credentials");
        let body = session
            .client()
            .post(url)
            .form(&form)
            .send()
            .await?
            .text()
            .await?;

        let response: AuthenticationResponse = serde_json::from_str(&body)?;
        if !response.error.is_empty() {
            return Err(AuthError::Rejected(response.error).into());
        }
        Ok(response.code)
    }

    /// Trade the authentication code and login token for session cookies
    ///
    /// The response is not inspected; only a transport failure is an error.
    pub async fn update_session(&self, session: &Session, code: &str, token: &str) -> Result<()> {
        let url = session.endpoint(SESSION_PATH)?;
        debug!(%url, "establishing session");
        session
            .client()
            .post(url)
            .form(&[("authentication", code), ("dsc", token)])
            .send()
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionEstablisher for CredentialLogin {
    async fn establish(&self, session: &Session, progress: &dyn Progress) -> Result<()> {
        progress.emit(Event::LoginWithAccount);
        let mut state = LoginState::Start;
        while state != LoginState::SessionEstablished {
            state = self.advance(state, session, progress).await?;
        }
        info!(username = %self.credentials.username, "session established");
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ErrorKind;
    use crate::progress::{RecordingProgress, SilentProgress};
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedCode(&'static str);

    impl OneTimeCode for FixedCode {
        fn code_at(&self, _secret: &str, _unix_time: u64) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn credentials(secret: Option<&str>) -> Credentials {
        Credentials {
            username: "alice".into(),
            password: "hunter2".into(),
            totp_secret: secret.map(str::to_string),
        }
    }

    fn session_for(server: &MockServer) -> Session {
        let config = Config {
            base_url: server.uri(),
            ..Default::default()
        };
        Session::new(&config).unwrap()
    }

    async fn mount_login_page(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<html><body data-x dsc="a1B2c3D4" class="x"></body></html>"#),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn login_token_is_scraped_from_page() {
        let server = MockServer::start().await;
        mount_login_page(&server).await;
        let login = CredentialLogin::new(credentials(None));

        let token = login.fetch_login_token(&session_for(&server)).await.unwrap();

        assert_eq!(token, "a1B2c3D4");
    }

    #[tokio::test]
    async fn missing_login_token_is_remote_format_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>redesigned</html>"))
            .mount(&server)
            .await;
        let login = CredentialLogin::new(credentials(None));

        let err = login
            .advance(LoginState::Start, &session_for(&server), &SilentProgress)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RemoteFormat);
        assert_eq!(err.step(), Some(&Step::LoginToken));
    }

    #[tokio::test]
    async fn full_handshake_walks_every_state() {
        let server = MockServer::start().await;
        mount_login_page(&server).await;
        Mock::given(method("POST"))
            .and(path("/1/authentication"))
            .and(body_string_contains("factors%5Buser%5D=alice"))
            .and(body_string_contains("factors%5Bpassword%5D=hunter2"))
            .and(body_string_contains("method=password"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":"auth-code-1"}"#))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/1/authorization/session"))
            .and(body_string_contains("authentication=auth-code-1"))
            .and(body_string_contains("dsc=a1B2c3D4"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let session = session_for(&server);
        let progress = RecordingProgress::new();
        CredentialLogin::new(credentials(None))
            .establish(&session, &progress)
            .await
            .unwrap();

        assert_eq!(
            progress.events(),
            vec![
                Event::LoginWithAccount,
                Event::FetchingLoginToken,
                Event::Authenticating,
                Event::UpdatingSession,
            ]
        );
    }

    #[tokio::test]
    async fn second_factor_without_secret_stops_after_first_attempt() {
        let server = MockServer::start().await;
        mount_login_page(&server).await;
        Mock::given(method("POST"))
            .and(path("/1/authentication"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"error":"TWO_FACTOR_MISSING"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/1/authorization/session"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = CredentialLogin::new(credentials(None))
            .establish(&session_for(&server), &SilentProgress)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(matches!(
            err,
            Error::Step { ref source, .. }
                if matches!(**source, Error::Authentication(AuthError::SecondFactorRequired))
        ));
    }

    #[tokio::test]
    async fn second_factor_with_secret_resubmits_once_with_code() {
        let server = MockServer::start().await;
        mount_login_page(&server).await;
        Mock::given(method("POST"))
            .and(path("/1/authentication"))
            .and(body_string_contains("factors%5Btotp%5D%5Bpassword%5D=654321"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":"auth-code-2"}"#))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/1/authentication"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"error":"TWO_FACTOR_MISSING"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/1/authorization/session"))
            .and(body_string_contains("authentication=auth-code-2"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let login = CredentialLogin::with_code_generator(
            credentials(Some("JBSWY3DPEHPK3PXP")),
            Box::new(FixedCode("654321")),
        );
        login
            .establish(&session_for(&server), &SilentProgress)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn other_api_errors_are_rejections() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/authentication"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string(r#"{"error":"INVALID_PASSWORD"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = CredentialLogin::new(credentials(Some("JBSWY3DPEHPK3PXP")))
            .exchange_credentials(&session_for(&server))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Authentication(AuthError::Rejected(ref m)) if m == "INVALID_PASSWORD"
        ));
    }

    #[tokio::test]
    async fn malformed_authentication_response_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1/authentication"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let err = CredentialLogin::new(credentials(None))
            .exchange_credentials(&session_for(&server))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn established_state_is_terminal() {
        let server = MockServer::start().await;
        let login = CredentialLogin::new(credentials(None));
        let next = login
            .advance(
                LoginState::SessionEstablished,
                &session_for(&server),
                &SilentProgress,
            )
            .await
            .unwrap();
        assert_eq!(next, LoginState::SessionEstablished);
    }
}
