// Core request/response layer for Bulwark
// Typed accessors over requests, a per-request response writer, template
// responses and the interceptor pipeline that drives them.

pub mod error;
pub mod form;
pub mod http;
pub mod interceptor;
pub mod template;
pub mod writer;

// Re-export commonly used types
pub use error::*;
pub use form::*;
pub use crate::http::*;
pub use interceptor::*;
pub use template::*;
pub use writer::*;

pub use cookie::{Cookie, SameSite};
