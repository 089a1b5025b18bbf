use crate::config::XsrfConfig;
use crate::error::Result;
use crate::secret::SecretKey;
use crate::strategy::{AngularStrategy, Checker, DefaultStrategy, Generator, Injector};
use bulwark_core::{Disposition, HttpRequest, Interceptor, Response, ResponseWriter};
use http::StatusCode;
use std::sync::Arc;

/// XSRF protection as a request-pipeline interceptor.
///
/// `before` runs the checker and writes the rejection status on failure.
/// `commit` runs the generator and the injector; any error there replaces
/// the response with a bare 500.
#[derive(Clone)]
pub struct XsrfInterceptor {
    generator: Arc<dyn Generator>,
    checker: Arc<dyn Checker>,
    injector: Arc<dyn Injector>,
}

impl XsrfInterceptor {
    pub fn new(
        generator: Arc<dyn Generator>,
        checker: Arc<dyn Checker>,
        injector: Arc<dyn Injector>,
    ) -> Self {
        Self {
            generator,
            checker,
            injector,
        }
    }

    /// Form-token protection with the `xsrf-cookie` cookie and `xsrf-token` field
    pub fn default_strategy(key: impl Into<SecretKey>) -> Self {
        Self::from_strategy(DefaultStrategy::new(key, XsrfConfig::default()))
    }

    /// Form-token protection with a tuned configuration
    pub fn with_config(key: impl Into<SecretKey>, config: XsrfConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_strategy(DefaultStrategy::new(key, config)))
    }

    /// Angular cookie-to-header protection.
    ///
    /// Both names must be non-empty; use [`angular_with_config`] to have
    /// them checked at runtime.
    ///
    /// [`angular_with_config`]: XsrfInterceptor::angular_with_config
    pub fn angular(cookie_name: impl Into<String>, header_name: impl Into<String>) -> Self {
        let config = XsrfConfig::angular()
            .with_cookie_name(cookie_name)
            .with_header_name(header_name);
        debug_assert!(
            !config.cookie_name.is_empty() && !config.header_name.is_empty(),
            "XSRF cookie and header names must not be empty"
        );
        Self::from_strategy(AngularStrategy::new(config))
    }

    pub fn angular_with_config(config: XsrfConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_strategy(AngularStrategy::new(config)))
    }

    fn from_strategy<S>(strategy: S) -> Self
    where
        S: Checker + Generator + Injector + 'static,
    {
        let strategy = Arc::new(strategy);
        Self {
            generator: strategy.clone(),
            checker: strategy.clone(),
            injector: strategy,
        }
    }
}

impl Interceptor for XsrfInterceptor {
    fn before(&self, writer: &mut ResponseWriter, request: &HttpRequest) -> Disposition {
        match self.checker.check(request) {
            Ok(()) => Disposition::NotWritten,
            Err(e) => {
                tracing::debug!(
                    method = %request.method(),
                    path = request.path(),
                    reason = %e,
                    "XSRF check rejected request"
                );
                writer.write_error(e.status_code())
            }
        }
    }

    fn commit(
        &self,
        writer: &mut ResponseWriter,
        request: &HttpRequest,
        response: &mut Response,
    ) -> Disposition {
        let result = self
            .generator
            .generate(request)
            .and_then(|data| self.injector.inject(writer, response, data));

        match result {
            Ok(()) => Disposition::NotWritten,
            Err(e) => {
                tracing::warn!(
                    method = %request.method(),
                    path = request.path(),
                    error = %e,
                    "XSRF token issuance failed"
                );
                writer.write_error(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XsrfError;
    use crate::strategy::{GeneratedData, RandomSource};
    use bulwark_core::{HttpResponse, InterceptorChain};
    use http::Method;

    struct Rejecting;

    impl Checker for Rejecting {
        fn check(&self, _request: &HttpRequest) -> Result<()> {
            Err(XsrfError::MissingToken)
        }
    }

    struct CustomGenerator;

    impl Generator for CustomGenerator {
        fn generate(&self, _request: &HttpRequest) -> Result<GeneratedData> {
            Ok(GeneratedData::Custom(Box::new("nonce".to_string())))
        }
    }

    #[test]
    fn test_before_writes_rejection_status() {
        let strategy = Arc::new(DefaultStrategy::new("k", XsrfConfig::default()));
        let interceptor = XsrfInterceptor::new(strategy.clone(), Arc::new(Rejecting), strategy);

        let mut writer = ResponseWriter::new();
        let disposition = interceptor.before(&mut writer, &HttpRequest::new(Method::POST, "/"));

        assert_eq!(disposition, Disposition::Written);
        assert_eq!(writer.written_status(), Some(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_before_continues_on_bypass() {
        let interceptor = XsrfInterceptor::default_strategy("k");
        let mut writer = ResponseWriter::new();

        let disposition = interceptor.before(&mut writer, &HttpRequest::new(Method::GET, "/"));
        assert_eq!(disposition, Disposition::NotWritten);
        assert!(!writer.is_written());
    }

    #[test]
    fn test_mismatched_data_is_internal_error() {
        let strategy = Arc::new(DefaultStrategy::new("k", XsrfConfig::default()));
        let interceptor =
            XsrfInterceptor::new(Arc::new(CustomGenerator), strategy.clone(), strategy);

        let mut writer = ResponseWriter::new();
        let mut response = Response::from(HttpResponse::ok());
        let disposition = interceptor.commit(
            &mut writer,
            &HttpRequest::new(Method::GET, "/"),
            &mut response,
        );

        assert_eq!(disposition, Disposition::Written);
        assert_eq!(
            writer.written_status(),
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
    }

    #[test]
    fn test_random_failure_becomes_bare_500() {
        let strategy = Arc::new(
            DefaultStrategy::new("k", XsrfConfig::default()).with_random_source(
                RandomSource::from_fn(|_| Err(rand::Error::new(std::io::Error::other("no entropy")))),
            ),
        );
        let interceptor = XsrfInterceptor::new(strategy.clone(), strategy.clone(), strategy);

        let mut writer = ResponseWriter::new();
        let mut response = Response::from(HttpResponse::ok());
        let disposition = interceptor.commit(
            &mut writer,
            &HttpRequest::new(Method::GET, "/"),
            &mut response,
        );
        assert_eq!(disposition, Disposition::Written);
        assert_eq!(
            writer.written_status(),
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
        assert!(writer.cookies().is_empty());

        let chain = InterceptorChain::new().with_interceptor(interceptor);
        let response = chain.handle(&HttpRequest::new(Method::GET, "/"), |_| {
            Ok(HttpResponse::text("page").into())
        });
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body_string(), "Internal Server Error");
        assert!(response.header("set-cookie").is_none());
    }

    #[test]
    fn test_oversized_durations_fail_validation() {
        let huge_ttl = XsrfConfig::default().with_token_ttl(i64::MAX);
        assert!(matches!(
            XsrfInterceptor::with_config("k", huge_ttl),
            Err(XsrfError::InvalidConfig(_))
        ));

        let huge_skew = XsrfConfig::angular().with_clock_skew(i64::MAX);
        assert!(matches!(
            XsrfInterceptor::angular_with_config(huge_skew),
            Err(XsrfError::InvalidConfig(_))
        ));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "must not be empty")]
    fn test_angular_requires_names() {
        let _ = XsrfInterceptor::angular("", "");
    }

    #[test]
    fn test_config_is_validated() {
        let weak = XsrfConfig::default().with_session_id_bytes(4);
        assert!(XsrfInterceptor::with_config("k", weak.clone()).is_err());
        assert!(XsrfInterceptor::angular_with_config(weak).is_err());
        assert!(XsrfInterceptor::with_config("k", XsrfConfig::default()).is_ok());
    }
}
