use crate::error::{Result, XsrfError};
use crate::secret::SecretKey;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// How long a token stays valid after it was issued
pub const DEFAULT_TOKEN_VALIDITY: Duration = Duration::hours(24);

/// How far in the future an issue time may lie before the token is refused
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::seconds(60);

/// Stateless XSRF token codec.
///
/// A token is `<mac>:<issued>` where `mac` is the unpadded base64url
/// HMAC-SHA256 of the session identifier, the request path and the issue
/// time, and `issued` is the issue time in Unix milliseconds. Tokens are bound
/// to one session and one path and expire once `validity` has elapsed.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    secret: SecretKey,
    validity: Duration,
    clock_skew: Duration,
}

impl TokenCodec {
    pub fn new(secret: impl Into<SecretKey>) -> Self {
        Self {
            secret: secret.into(),
            validity: DEFAULT_TOKEN_VALIDITY,
            clock_skew: DEFAULT_CLOCK_SKEW,
        }
    }

    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    pub fn with_clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    pub fn clock_skew(&self) -> Duration {
        self.clock_skew
    }

    /// Issue a token for `session_id` and `path`, stamped with the current time
    pub fn generate(&self, session_id: &str, path: &str) -> Result<String> {
        self.generate_at(session_id, path, Utc::now())
    }

    /// Issue a token stamped with `issued_at`
    pub fn generate_at(
        &self,
        session_id: &str,
        path: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String> {
        let issued = issued_at.timestamp_millis();
        let mac = self.mac(session_id, path, issued)?;
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{}:{}", signature, issued))
    }

    /// Check `token` against `session_id` and `path` at the current time
    pub fn validate(&self, token: &str, session_id: &str, path: &str) -> bool {
        self.validate_at(token, session_id, path, Utc::now())
    }

    /// Check `token` as of `now`.
    ///
    /// Malformed tokens are invalid; this never panics.
    pub fn validate_at(
        &self,
        token: &str,
        session_id: &str,
        path: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let Some((signature, issued)) = token.rsplit_once(':') else {
            return false;
        };
        let Ok(issued) = issued.parse::<i64>() else {
            return false;
        };
        let Some(issued_at) = DateTime::<Utc>::from_timestamp_millis(issued) else {
            return false;
        };

        if issued_at - now > self.clock_skew || now - issued_at >= self.validity {
            return false;
        }

        let Ok(signature) = URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };

        match self.mac(session_id, path, issued) {
            Ok(mac) => mac.verify_slice(&signature).is_ok(),
            Err(_) => false,
        }
    }

    fn mac(&self, session_id: &str, path: &str, issued: i64) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| XsrfError::Codec(e.to_string()))?;

        // Length prefixes keep ("ab", "/c") and ("a", "b/c") apart.
        mac.update(&(session_id.len() as u64).to_be_bytes());
        mac.update(session_id.as_bytes());
        mac.update(&(path.len() as u64).to_be_bytes());
        mac.update(path.as_bytes());
        mac.update(&issued.to_be_bytes());

        Ok(mac)
    }
}
