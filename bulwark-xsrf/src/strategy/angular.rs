use super::{
    AngularData, Checker, GeneratedData, Generator, Injector, RandomSource, is_state_preserving,
    session_cookie,
};
use crate::config::XsrfConfig;
use crate::error::{Result, XsrfError};
use bulwark_core::{HttpRequest, Response, ResponseWriter};
use subtle::ConstantTimeEq;

/// Cookie-to-header strategy for Angular's `HttpClient`.
///
/// The client reads the cookie with script and echoes it in a header. A
/// foreign origin can neither read the cookie nor set the header.
#[derive(Debug, Clone)]
pub struct AngularStrategy {
    config: XsrfConfig,
    random: RandomSource,
}

impl AngularStrategy {
    pub fn new(config: XsrfConfig) -> Self {
        Self {
            config,
            random: RandomSource::default(),
        }
    }

    pub fn with_random_source(mut self, random: RandomSource) -> Self {
        self.random = random;
        self
    }

    pub fn config(&self) -> &XsrfConfig {
        &self.config
    }
}

impl Default for AngularStrategy {
    fn default() -> Self {
        Self::new(XsrfConfig::angular())
    }
}

impl Checker for AngularStrategy {
    fn check(&self, request: &HttpRequest) -> Result<()> {
        if is_state_preserving(request.method()) {
            return Ok(());
        }

        let cookie = request
            .cookie(&self.config.cookie_name)
            .ok_or(XsrfError::MissingCookie)?;

        let header = request.header(&self.config.header_name).unwrap_or_default();
        if header.is_empty() || !bool::from(header.as_bytes().ct_eq(cookie.value().as_bytes())) {
            return Err(XsrfError::HeaderMismatch);
        }

        Ok(())
    }
}

impl Generator for AngularStrategy {
    fn generate(&self, request: &HttpRequest) -> Result<GeneratedData> {
        let (cookie, set_cookie) = session_cookie(request, &self.config, &self.random)?;
        Ok(GeneratedData::Angular(AngularData { cookie, set_cookie }))
    }
}

impl Injector for AngularStrategy {
    fn inject(
        &self,
        writer: &mut ResponseWriter,
        _response: &mut Response,
        data: GeneratedData,
    ) -> Result<()> {
        let data = match data {
            GeneratedData::Angular(data) => data,
            other => {
                return Err(XsrfError::DataMismatch {
                    expected: "angular",
                    found: other.kind(),
                });
            }
        };

        if data.set_cookie {
            tracing::trace!(cookie = %self.config.cookie_name, "Issuing XSRF cookie");
            writer.set_cookie(data.cookie)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulwark_core::TemplateResponse;
    use http::{Method, StatusCode};

    fn request(method: Method, cookie: Option<&str>, header: Option<&str>) -> HttpRequest {
        let mut request = HttpRequest::new(method, "/api/items");
        if let Some(cookie) = cookie {
            request.headers.insert(
                http::header::COOKIE,
                format!("XSRF-TOKEN={}", cookie).parse().unwrap(),
            );
        }
        if let Some(header) = header {
            request
                .headers
                .insert("x-xsrf-token", header.parse().unwrap());
        }
        request
    }

    #[test]
    fn test_safe_methods_bypass() {
        let strategy = AngularStrategy::default();
        assert!(strategy.check(&request(Method::GET, None, None)).is_ok());
        assert!(strategy.check(&request(Method::HEAD, None, None)).is_ok());
        assert!(strategy.check(&request(Method::OPTIONS, None, None)).is_ok());
    }

    #[test]
    fn test_missing_cookie_forbidden() {
        let err = AngularStrategy::default()
            .check(&request(Method::POST, None, Some("abc")))
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_header_checks() {
        let strategy = AngularStrategy::default();
        let value = "q83vEjRWeJCrze8SNFZ4kKvN7xI=";

        assert!(strategy
            .check(&request(Method::POST, Some(value), Some(value)))
            .is_ok());

        for header in [None, Some(""), Some("q83vEjRWeJCrze8SNFZ4kKvN7xJ="), Some("short")] {
            let err = strategy
                .check(&request(Method::DELETE, Some(value), header))
                .unwrap_err();
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED, "header {:?}", header);
        }
    }

    #[test]
    fn test_custom_names() {
        let strategy = AngularStrategy::new(
            XsrfConfig::angular()
                .with_cookie_name("csrftoken")
                .with_header_name("X-CSRFToken"),
        );

        let mut request = HttpRequest::new(Method::PUT, "/");
        request
            .headers
            .insert(http::header::COOKIE, "csrftoken=v4lue".parse().unwrap());
        request.headers.insert("x-csrftoken", "v4lue".parse().unwrap());

        assert!(strategy.check(&request).is_ok());
    }

    #[test]
    fn test_commit_sets_readable_cookie() {
        let strategy = AngularStrategy::default();
        let data = strategy.generate(&request(Method::GET, None, None)).unwrap();

        let mut writer = ResponseWriter::new();
        let mut response = Response::from(TemplateResponse::new("app", serde_json::json!({})));
        strategy.inject(&mut writer, &mut response, data).unwrap();

        let issued = &writer.cookies()[0];
        assert_eq!(issued.name(), "XSRF-TOKEN");
        assert_eq!(issued.path(), Some("/"));
        assert_eq!(issued.max_age(), Some(cookie::time::Duration::seconds(86400)));
        assert_eq!(issued.http_only(), Some(false));
        assert_eq!(issued.same_site(), Some(cookie::SameSite::Strict));

        // no token binding for this strategy
        assert!(response.template_mut().unwrap().func_map.is_empty());
    }

    #[test]
    fn test_random_failure_mints_nothing() {
        let strategy = AngularStrategy::default().with_random_source(RandomSource::from_fn(|_| {
            Err(rand::Error::new(std::io::Error::other("no entropy")))
        }));

        let err = strategy
            .generate(&request(Method::GET, None, None))
            .unwrap_err();
        assert!(matches!(err, XsrfError::RandomSource(_)));
    }

    #[test]
    fn test_existing_cookie_not_reissued() {
        let strategy = AngularStrategy::default();
        let data = strategy
            .generate(&request(Method::GET, Some("existing"), None))
            .unwrap();

        let mut writer = ResponseWriter::new();
        let mut response = Response::from(bulwark_core::HttpResponse::ok());
        strategy.inject(&mut writer, &mut response, data).unwrap();
        assert!(writer.cookies().is_empty());
    }
}
