//! Checker, generator and injector seams plus the two built-in strategies.

mod angular;
mod default;

pub use angular::AngularStrategy;
pub use default::DefaultStrategy;

use crate::config::XsrfConfig;
use crate::error::Result;
use base64::{Engine, engine::general_purpose::STANDARD};
use bulwark_core::{Cookie, HttpRequest, Response, ResponseWriter};
use http::Method;
use rand::RngCore;
use rand::rngs::OsRng;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Name under which the token is exposed to templates
pub const TOKEN_FUNC_NAME: &str = "XSRFToken";

/// Decides whether a request may proceed.
pub trait Checker: Send + Sync {
    fn check(&self, request: &HttpRequest) -> Result<()>;
}

/// Produces the proof material for a response.
pub trait Generator: Send + Sync {
    fn generate(&self, request: &HttpRequest) -> Result<GeneratedData>;
}

/// Attaches generated proof material to a response.
pub trait Injector: Send + Sync {
    fn inject(
        &self,
        writer: &mut ResponseWriter,
        response: &mut Response,
        data: GeneratedData,
    ) -> Result<()>;
}

/// Output of a [`Generator`], consumed by the matching [`Injector`].
#[derive(Debug)]
pub enum GeneratedData {
    Default(DefaultData),
    Angular(AngularData),
    Custom(Box<dyn Any + Send>),
}

impl GeneratedData {
    pub fn kind(&self) -> &'static str {
        match self {
            GeneratedData::Default(_) => "default",
            GeneratedData::Angular(_) => "angular",
            GeneratedData::Custom(_) => "custom",
        }
    }
}

/// Session cookie and derived token
#[derive(Debug, Clone)]
pub struct DefaultData {
    pub cookie: Cookie<'static>,
    pub token: String,
    /// The cookie was minted for this response and must be sent
    pub set_cookie: bool,
}

#[derive(Debug, Clone)]
pub struct AngularData {
    pub cookie: Cookie<'static>,
    pub set_cookie: bool,
}

/// GET, HEAD and OPTIONS never change server state and are not checked
pub fn is_state_preserving(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

type FillBytes = dyn Fn(&mut [u8]) -> std::result::Result<(), rand::Error> + Send + Sync;

/// Where session identifier bytes come from.
///
/// Defaults to the operating system's CSPRNG. A failed draw surfaces as
/// [`XsrfError::RandomSource`](crate::XsrfError::RandomSource).
#[derive(Clone)]
pub struct RandomSource(Arc<FillBytes>);

impl RandomSource {
    pub fn from_fn<F>(fill: F) -> Self
    where
        F: Fn(&mut [u8]) -> std::result::Result<(), rand::Error> + Send + Sync + 'static,
    {
        Self(Arc::new(fill))
    }

    pub fn fill(&self, dest: &mut [u8]) -> Result<()> {
        (self.0)(dest)?;
        Ok(())
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_fn(|dest| OsRng.try_fill_bytes(dest))
    }
}

impl fmt::Debug for RandomSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RandomSource")
    }
}

/// The request's session cookie, or a freshly minted one.
///
/// The boolean is `true` when the cookie is new and has to be set.
pub(crate) fn session_cookie(
    request: &HttpRequest,
    config: &XsrfConfig,
    random: &RandomSource,
) -> Result<(Cookie<'static>, bool)> {
    if let Some(cookie) = request.cookie(&config.cookie_name) {
        return Ok((cookie, false));
    }

    let mut id = vec![0u8; config.session_id_bytes];
    random.fill(&mut id)?;

    let mut builder = Cookie::build((config.cookie_name.clone(), STANDARD.encode(&id)))
        .same_site(config.cookie_same_site.into())
        .secure(config.cookie_secure)
        .http_only(config.cookie_http_only);

    if let Some(path) = &config.cookie_path {
        builder = builder.path(path.clone());
    }
    if let Some(domain) = &config.cookie_domain {
        builder = builder.domain(domain.clone());
    }
    if let Some(max_age) = config.cookie_max_age {
        builder = builder.max_age(cookie::time::Duration::seconds(max_age));
    }

    Ok((builder.build(), true))
}
