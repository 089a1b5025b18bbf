use super::{
    Checker, DefaultData, GeneratedData, Generator, Injector, RandomSource, TOKEN_FUNC_NAME,
    is_state_preserving, session_cookie,
};
use crate::config::XsrfConfig;
use crate::error::{Result, XsrfError};
use crate::secret::SecretKey;
use crate::token::TokenCodec;
use bulwark_core::{HttpRequest, Response, ResponseWriter};
use chrono::Duration;

/// Form-token strategy.
///
/// A random session identifier lives in an HttpOnly cookie. Every template
/// response gets a token bound to that identifier and the request path, and
/// state-changing requests must post it back in a form field.
#[derive(Debug, Clone)]
pub struct DefaultStrategy {
    codec: TokenCodec,
    config: XsrfConfig,
    random: RandomSource,
}

impl DefaultStrategy {
    /// Durations too large for the clock saturate; [`XsrfConfig::validate`]
    /// rejects them up front.
    pub fn new(key: impl Into<SecretKey>, config: XsrfConfig) -> Self {
        let codec = TokenCodec::new(key)
            .with_validity(config.token_validity().unwrap_or(Duration::MAX))
            .with_clock_skew(config.clock_skew_allowance().unwrap_or(Duration::MAX));

        Self {
            codec,
            config,
            random: RandomSource::default(),
        }
    }

    /// Draw session identifiers from `random` instead of the OS generator
    pub fn with_random_source(mut self, random: RandomSource) -> Self {
        self.random = random;
        self
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn config(&self) -> &XsrfConfig {
        &self.config
    }

    fn token_from_body(&self, request: &HttpRequest) -> Result<String> {
        let form = match request.post_form() {
            Ok(form) => form,
            Err(_) => {
                request
                    .multipart_form(self.config.max_multipart_bytes)
                    .map_err(|e| XsrfError::MalformedBody(e.to_string()))?
                    .form
            }
        };

        Ok(form.string(&self.config.field_name, "").to_string())
    }
}

impl Checker for DefaultStrategy {
    fn check(&self, request: &HttpRequest) -> Result<()> {
        if is_state_preserving(request.method()) {
            return Ok(());
        }

        let cookie = request
            .cookie(&self.config.cookie_name)
            .ok_or(XsrfError::MissingCookie)?;

        let token = self.token_from_body(request)?;
        if token.is_empty() {
            return Err(XsrfError::MissingToken);
        }

        if !self.codec.validate(&token, cookie.value(), request.path()) {
            return Err(XsrfError::InvalidToken);
        }

        Ok(())
    }
}

impl Generator for DefaultStrategy {
    fn generate(&self, request: &HttpRequest) -> Result<GeneratedData> {
        let (cookie, set_cookie) = session_cookie(request, &self.config, &self.random)?;
        let token = self.codec.generate(cookie.value(), request.path())?;

        Ok(GeneratedData::Default(DefaultData {
            cookie,
            token,
            set_cookie,
        }))
    }
}

impl Injector for DefaultStrategy {
    fn inject(
        &self,
        writer: &mut ResponseWriter,
        response: &mut Response,
        data: GeneratedData,
    ) -> Result<()> {
        let data = match data {
            GeneratedData::Default(data) => data,
            other => {
                return Err(XsrfError::DataMismatch {
                    expected: "default",
                    found: other.kind(),
                });
            }
        };

        if data.set_cookie {
            tracing::trace!(cookie = %self.config.cookie_name, "Issuing XSRF session cookie");
            writer.set_cookie(data.cookie)?;
        }

        match response.template_mut() {
            Some(template) => {
                let token = data.token;
                template.func_map.insert(TOKEN_FUNC_NAME, move || token.clone());
            }
            None => {
                tracing::debug!("Response is not template-backed, skipping XSRF token binding");
            }
        }

        Ok(())
    }
}
