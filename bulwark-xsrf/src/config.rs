use crate::error::{Result, XsrfError};
use bulwark_core::DEFAULT_MULTIPART_LIMIT;
use chrono::Duration;
use serde::Deserialize;

/// Cookie holding the session identifier for the form-token strategy
pub const DEFAULT_COOKIE_NAME: &str = "xsrf-cookie";

/// Form field carrying the token for the form-token strategy
pub const DEFAULT_FIELD_NAME: &str = "xsrf-token";

/// Cookie read by Angular's `HttpClientXsrfModule`
pub const ANGULAR_COOKIE_NAME: &str = "XSRF-TOKEN";

/// Header Angular echoes the cookie into
pub const ANGULAR_HEADER_NAME: &str = "X-XSRF-TOKEN";

/// Smallest accepted session identifier, in random bytes
pub const MIN_SESSION_ID_BYTES: usize = 20;

/// XSRF protection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct XsrfConfig {
    /// Name of the session identifier cookie
    pub cookie_name: String,

    /// Form field name for the token
    pub field_name: String,

    /// Header echoing the cookie (Angular strategy)
    pub header_name: String,

    /// Token time-to-live in seconds
    pub token_ttl: i64,

    /// Accepted clock skew for tokens issued in the future, in seconds
    pub clock_skew: i64,

    /// Random bytes in a freshly minted session identifier
    pub session_id_bytes: usize,

    /// Upper bound on multipart bodies searched for the token
    pub max_multipart_bytes: usize,

    /// Cookie domain
    pub cookie_domain: Option<String>,

    /// Cookie path
    pub cookie_path: Option<String>,

    /// Cookie Max-Age in seconds; session cookie when unset
    pub cookie_max_age: Option<i64>,

    /// Cookie secure flag (HTTPS only)
    pub cookie_secure: bool,

    /// Cookie HttpOnly flag
    pub cookie_http_only: bool,

    /// Cookie SameSite policy
    pub cookie_same_site: SameSite,
}

/// Cookie SameSite attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SameSite {
    #[default]
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl From<SameSite> for cookie::SameSite {
    fn from(same_site: SameSite) -> Self {
        match same_site {
            SameSite::Strict => cookie::SameSite::Strict,
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::None => cookie::SameSite::None,
        }
    }
}

impl XsrfConfig {
    /// Preset for Angular's cookie-to-header scheme.
    ///
    /// The cookie must be readable by scripts, so it is not HttpOnly. It is
    /// scoped to `/` and lives for a day.
    pub fn angular() -> Self {
        Self {
            cookie_name: ANGULAR_COOKIE_NAME.to_string(),
            cookie_path: Some("/".to_string()),
            cookie_max_age: Some(24 * 60 * 60),
            cookie_http_only: false,
            ..Self::default()
        }
    }

    /// Check the configuration for values that would weaken protection
    pub fn validate(&self) -> Result<()> {
        if self.session_id_bytes < MIN_SESSION_ID_BYTES {
            return Err(XsrfError::InvalidConfig(format!(
                "session identifier must be at least {} bytes",
                MIN_SESSION_ID_BYTES
            )));
        }

        if self.token_ttl <= 0 {
            return Err(XsrfError::InvalidConfig(
                "token TTL must be positive".to_string(),
            ));
        }

        if self.token_validity().is_none() {
            return Err(XsrfError::InvalidConfig(format!(
                "token TTL of {} seconds is out of range",
                self.token_ttl
            )));
        }

        if self.clock_skew < 0 {
            return Err(XsrfError::InvalidConfig(
                "clock skew must not be negative".to_string(),
            ));
        }

        if self.clock_skew_allowance().is_none() {
            return Err(XsrfError::InvalidConfig(format!(
                "clock skew of {} seconds is out of range",
                self.clock_skew
            )));
        }

        if self.max_multipart_bytes == 0 {
            return Err(XsrfError::InvalidConfig(
                "multipart limit must be non-zero".to_string(),
            ));
        }

        if self.cookie_name.is_empty() || self.field_name.is_empty() || self.header_name.is_empty()
        {
            return Err(XsrfError::InvalidConfig(
                "cookie, field and header names must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Token TTL as a duration, `None` when it does not fit
    pub fn token_validity(&self) -> Option<Duration> {
        Duration::try_seconds(self.token_ttl)
    }

    pub fn clock_skew_allowance(&self) -> Option<Duration> {
        Duration::try_seconds(self.clock_skew)
    }

    /// Set cookie name
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set form field name
    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    /// Set header name
    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    /// Set token TTL
    pub fn with_token_ttl(mut self, ttl_seconds: i64) -> Self {
        self.token_ttl = ttl_seconds;
        self
    }

    pub fn with_clock_skew(mut self, skew_seconds: i64) -> Self {
        self.clock_skew = skew_seconds;
        self
    }

    pub fn with_session_id_bytes(mut self, bytes: usize) -> Self {
        self.session_id_bytes = bytes;
        self
    }

    pub fn with_max_multipart_bytes(mut self, bytes: usize) -> Self {
        self.max_multipart_bytes = bytes;
        self
    }

    /// Set cookie domain
    pub fn with_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.cookie_domain = Some(domain.into());
        self
    }

    /// Set cookie path
    pub fn with_cookie_path(mut self, path: impl Into<String>) -> Self {
        self.cookie_path = Some(path.into());
        self
    }

    pub fn with_cookie_max_age(mut self, seconds: i64) -> Self {
        self.cookie_max_age = Some(seconds);
        self
    }

    /// Set cookie secure flag
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Set cookie HttpOnly flag
    pub fn with_cookie_http_only(mut self, http_only: bool) -> Self {
        self.cookie_http_only = http_only;
        self
    }

    /// Set cookie SameSite policy
    pub fn with_cookie_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie_same_site = same_site;
        self
    }
}

impl Default for XsrfConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            field_name: DEFAULT_FIELD_NAME.to_string(),
            header_name: ANGULAR_HEADER_NAME.to_string(),
            token_ttl: 24 * 60 * 60,
            clock_skew: 60,
            session_id_bytes: MIN_SESSION_ID_BYTES,
            max_multipart_bytes: DEFAULT_MULTIPART_LIMIT,
            cookie_domain: None,
            cookie_path: None,
            cookie_max_age: None,
            cookie_secure: true,
            cookie_http_only: true,
            cookie_same_site: SameSite::Strict,
        }
    }
}
