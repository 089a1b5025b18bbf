//! # Bulwark XSRF Protection
//!
//! Cross-Site Request Forgery (XSRF) protection as a Bulwark interceptor.
//!
//! ## Features
//!
//! - ✅ **Form tokens** - HMAC-SHA256 tokens bound to a session cookie and the request path
//! - ✅ **Angular** - Cookie-to-header scheme used by Angular's `HttpClient`
//! - ✅ **Stateless** - Nothing stored server-side besides the key
//! - ✅ **Pluggable** - Custom checker, generator and injector implementations
//! - ✅ **Configurable** - Cookie attributes, field names, token lifetime
//!
//! ## Quick Start
//!
//! ```rust
//! use bulwark_core::InterceptorChain;
//! use bulwark_xsrf::{XsrfConfig, XsrfInterceptor};
//!
//! // Form tokens in the `xsrf-token` field, session id in `xsrf-cookie`
//! let chain = InterceptorChain::new()
//!     .with_interceptor(XsrfInterceptor::default_strategy("server-side secret"));
//!
//! // Or tuned
//! let config = XsrfConfig::default()
//!     .with_token_ttl(3600)
//!     .with_cookie_path("/app");
//! let xsrf = XsrfInterceptor::with_config("server-side secret", config).unwrap();
//! ```
//!
//! ## Tokens
//!
//! ```rust
//! use bulwark_xsrf::TokenCodec;
//!
//! let codec = TokenCodec::new("server-side secret");
//! let token = codec.generate("session-id", "/transfer").unwrap();
//!
//! assert!(codec.validate(&token, "session-id", "/transfer"));
//! assert!(!codec.validate(&token, "session-id", "/elsewhere"));
//! assert!(!codec.validate(&token, "other-session", "/transfer"));
//! ```
//!
//! ## Angular
//!
//! ```rust
//! use bulwark_xsrf::XsrfInterceptor;
//!
//! let xsrf = XsrfInterceptor::angular("XSRF-TOKEN", "X-XSRF-TOKEN");
//! ```

pub mod config;
pub mod error;
pub mod interceptor;
pub mod secret;
pub mod strategy;
pub mod token;

pub use config::{SameSite, XsrfConfig};
pub use error::{Result, XsrfError};
pub use interceptor::XsrfInterceptor;
pub use secret::SecretKey;
pub use strategy::{
    AngularData, AngularStrategy, Checker, DefaultData, DefaultStrategy, GeneratedData, Generator,
    Injector, RandomSource, TOKEN_FUNC_NAME, is_state_preserving,
};
pub use token::TokenCodec;
