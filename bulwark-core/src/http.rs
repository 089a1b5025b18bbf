// HTTP request and response types

use crate::form::{Form, MultipartForm, MultipartParser};
use crate::template::TemplateResponse;
use crate::{Error, Result};
use cookie::Cookie;
use http::header::{CONTENT_TYPE, COOKIE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use std::collections::HashMap;

/// HTTP request wrapper
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub query_params: HashMap<String, String>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            query_params: HashMap::new(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// URL path, without the query string
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get a header value by name (case-insensitive).
    ///
    /// Values that are not visible ASCII are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Media type of the body, without parameters, lowercased
    pub fn media_type(&self) -> Option<String> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|ct| ct.split(';').next())
            .map(|mt| mt.trim().to_ascii_lowercase())
    }

    /// All cookies sent with the request, across every `Cookie` header.
    ///
    /// Malformed pairs are skipped.
    pub fn cookies(&self) -> impl Iterator<Item = Cookie<'static>> + '_ {
        self.headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|header| Cookie::split_parse(header.to_owned()))
            .filter_map(|c| c.ok())
    }

    /// First cookie named `name`
    pub fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.cookies().find(|c| c.name() == name)
    }

    /// Parse an `application/x-www-form-urlencoded` body.
    ///
    /// Only POST, PUT and PATCH requests carry a form body; any other method,
    /// or a different content type, is an error.
    pub fn post_form(&self) -> Result<Form> {
        self.require_body_method()?;

        match self.media_type().as_deref() {
            Some("application/x-www-form-urlencoded") => Form::from_urlencoded(&self.body),
            other => Err(Error::UnsupportedMediaType(format!(
                "expected application/x-www-form-urlencoded, got {}",
                other.unwrap_or("no content type")
            ))),
        }
    }

    /// Parse a `multipart/form-data` body of at most `max_bytes` bytes
    pub fn multipart_form(&self, max_bytes: usize) -> Result<MultipartForm> {
        self.require_body_method()?;

        if self.media_type().as_deref() != Some("multipart/form-data") {
            return Err(Error::UnsupportedMediaType(
                "expected multipart/form-data".to_string(),
            ));
        }

        let content_type = self.header("content-type").unwrap_or_default();
        MultipartParser::from_content_type(content_type)?
            .with_limit(max_bytes)
            .parse(&self.body)
    }

    /// Get a query parameter by name
    pub fn query(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    fn require_body_method(&self) -> Result<()> {
        if matches!(self.method, Method::POST | Method::PUT | Method::PATCH) {
            Ok(())
        } else {
            Err(Error::BadRequest(format!(
                "got request method {}, want POST/PATCH/PUT",
                self.method
            )))
        }
    }
}

impl From<http::Request<Vec<u8>>> for HttpRequest {
    fn from(req: http::Request<Vec<u8>>) -> Self {
        let (parts, body) = req.into_parts();

        let query_params = parts
            .uri
            .query()
            .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
            .map(|pairs| pairs.into_iter().collect())
            .unwrap_or_default();

        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            headers: parts.headers,
            body,
            query_params,
        }
    }
}

/// HTTP response wrapper
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// Plain-text error response carrying only the canonical reason phrase
    pub fn error(status: StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or("Error");
        Self::text(reason).with_status(status)
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self::ok()
            .with_header(
                CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            )
            .with_body(body.into().into_bytes())
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self::ok()
            .with_header(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            )
            .with_body(body.into().into_bytes())
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Get a header value by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Cookies set by this response, parsed from `Set-Cookie` headers
    pub fn set_cookies(&self) -> Vec<Cookie<'static>> {
        self.headers
            .get_all(http::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| Cookie::parse(v.to_owned()).ok())
            .collect()
    }

    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// What a handler produces, before it is rendered to bytes.
#[derive(Debug)]
pub enum Response {
    /// A fully formed response
    Http(HttpResponse),
    /// A template to be rendered after the interceptors have committed
    Template(TemplateResponse),
}

impl Response {
    /// Mutable access to the template, when this response is template-backed
    pub fn template_mut(&mut self) -> Option<&mut TemplateResponse> {
        match self {
            Response::Template(t) => Some(t),
            Response::Http(_) => None,
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self, Response::Template(_))
    }
}

impl From<HttpResponse> for Response {
    fn from(response: HttpResponse) -> Self {
        Response::Http(response)
    }
}

impl From<TemplateResponse> for Response {
    fn from(response: TemplateResponse) -> Self {
        Response::Template(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, headers: &[(&str, &str)], body: &[u8]) -> HttpRequest {
        let mut builder = http::Request::builder().method(method).uri("/submit?x=1");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(body.to_vec()).unwrap().into()
    }

    #[test]
    fn test_from_http_request() {
        let req = request("POST", &[("X-Custom", "yes")], b"");
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.path(), "/submit");
        assert_eq!(req.header("x-custom"), Some("yes"));
        assert_eq!(req.query("x"), Some(&"1".to_string()));
    }

    #[test]
    fn test_cookie_lookup() {
        let req = request(
            "GET",
            &[("Cookie", "a=1; xsrf-cookie=abc+/="), ("Cookie", "b=2")],
            b"",
        );

        assert_eq!(req.cookie("xsrf-cookie").unwrap().value(), "abc+/=");
        assert_eq!(req.cookie("b").unwrap().value(), "2");
        assert!(req.cookie("missing").is_none());
        assert_eq!(req.cookies().count(), 3);
    }

    #[test]
    fn test_post_form() {
        let req = request(
            "POST",
            &[(
                "Content-Type",
                "application/x-www-form-urlencoded; charset=UTF-8",
            )],
            b"xsrf-token=abc",
        );

        assert_eq!(req.post_form().unwrap().string("xsrf-token", ""), "abc");
    }

    #[test]
    fn test_post_form_wrong_content_type() {
        let req = request("POST", &[("Content-Type", "application/json")], b"{}");
        assert!(matches!(
            req.post_form(),
            Err(Error::UnsupportedMediaType(_))
        ));

        let req = request("POST", &[], b"xsrf-token=abc");
        assert!(req.post_form().is_err());
    }

    #[test]
    fn test_post_form_wrong_method() {
        let req = request(
            "DELETE",
            &[("Content-Type", "application/x-www-form-urlencoded")],
            b"xsrf-token=abc",
        );
        assert!(matches!(req.post_form(), Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_multipart_form() {
        let body = b"--XYZ\r\n\
                     Content-Disposition: form-data; name=\"xsrf-token\"\r\n\r\n\
                     tok\r\n\
                     --XYZ--\r\n";
        let req = request(
            "PUT",
            &[("Content-Type", "multipart/form-data; boundary=XYZ")],
            body,
        );

        let form = req.multipart_form(1024).unwrap();
        assert_eq!(form.form.string("xsrf-token", ""), "tok");
        assert!(req.multipart_form(8).is_err());
    }

    #[test]
    fn test_error_response_has_no_detail() {
        let response = HttpResponse::error(StatusCode::FORBIDDEN);
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.body_string(), "Forbidden");
    }

    #[test]
    fn test_response_template_access() {
        let mut response = Response::from(HttpResponse::ok());
        assert!(response.template_mut().is_none());

        let mut response = Response::from(TemplateResponse::new("index", serde_json::json!({})));
        assert!(response.is_template());
        assert!(response.template_mut().is_some());
    }
}
