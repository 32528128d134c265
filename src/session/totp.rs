//! Time-based one-time codes for the second login factor.

use crate::error::{AuthError, Result};
use totp_rs::{Algorithm, Secret, TOTP};

const DIGITS: usize = 6;
const STEP_SECS: u64 = 30;

/// Computes a one-time code from a shared secret and a point in time
pub trait OneTimeCode: Send + Sync {
    /// Code for `secret` at `unix_time` (seconds since the epoch)
    fn code_at(&self, secret: &str, unix_time: u64) -> Result<String>;
}

/// RFC 6238 codes with the common authenticator-app profile
/// (SHA-1, 6 digits, 30 second step, base32 secret)
#[derive(Clone, Copy, Debug, Default)]
pub struct TotpCodeGenerator;

impl TotpCodeGenerator {
    /// Normalize a secret as authenticator apps display it: grouped with
    /// spaces, lowercase allowed, padding optional
    fn normalize(secret: &str) -> String {
        secret
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '=')
            .map(|c| c.to_ascii_uppercase())
            .collect()
    }
}

impl OneTimeCode for TotpCodeGenerator {
    fn code_at(&self, secret: &str, unix_time: u64) -> Result<String> {
        let bytes = Secret::Encoded(Self::normalize(secret))
            .to_bytes()
            .map_err(|e| AuthError::InvalidSecret(format!("{e:?}")))?;
        if bytes.is_empty() {
            return Err(AuthError::InvalidSecret("secret is empty".to_string()).into());
        }
        let totp = TOTP::new_unchecked(Algorithm::SHA1, DIGITS, 1, STEP_SECS, bytes);
        Ok(totp.generate(unix_time))
    }
}
