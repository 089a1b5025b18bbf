// Interceptors that run around request handlers

use crate::{
    Disposition, HttpRequest, HttpResponse, Response, ResponseWriter, Result, TemplateRenderer,
};
use http::StatusCode;
use std::sync::Arc;

/// A request-pipeline hook.
///
/// `before` runs ahead of the handler and may reject the request by writing
/// an error. `commit` runs after the handler, before the response is
/// rendered, and may amend it.
pub trait Interceptor: Send + Sync {
    fn before(&self, writer: &mut ResponseWriter, request: &HttpRequest) -> Disposition;

    fn commit(
        &self,
        writer: &mut ResponseWriter,
        request: &HttpRequest,
        response: &mut Response,
    ) -> Disposition;
}

/// Ordered set of interceptors plus the renderer for template responses.
#[derive(Default, Clone)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
    renderer: Option<Arc<dyn TemplateRenderer>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interceptor<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.add_interceptor(Arc::new(interceptor));
        self
    }

    pub fn add_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn with_renderer<R: TemplateRenderer + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Run `handler` for `request` through every interceptor.
    ///
    /// `before` hooks run in registration order and `commit` hooks in reverse.
    /// The first hook that writes a response stops the chain; the handler is
    /// not invoked when a `before` hook writes.
    pub fn handle<H>(&self, request: &HttpRequest, handler: H) -> HttpResponse
    where
        H: FnOnce(&HttpRequest) -> Result<Response>,
    {
        let mut writer = ResponseWriter::new();

        for interceptor in &self.interceptors {
            if interceptor.before(&mut writer, request).is_written() {
                return writer.into_response(None);
            }
        }

        let mut response = match handler(request) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(
                    method = %request.method(),
                    path = request.path(),
                    error = %e,
                    "Handler failed"
                );
                let _ = writer.write_error(e.status_code());
                return writer.into_response(None);
            }
        };

        for interceptor in self.interceptors.iter().rev() {
            if interceptor
                .commit(&mut writer, request, &mut response)
                .is_written()
            {
                return writer.into_response(None);
            }
        }

        let rendered = self.render(response);
        if rendered.is_none() {
            let _ = writer.write_error(StatusCode::INTERNAL_SERVER_ERROR);
        }
        writer.into_response(rendered)
    }

    fn render(&self, response: Response) -> Option<HttpResponse> {
        match response {
            Response::Http(response) => Some(response),
            Response::Template(template) => {
                let Some(renderer) = &self.renderer else {
                    tracing::warn!(
                        template = %template.template,
                        "No template renderer configured"
                    );
                    return None;
                };

                match renderer.render(&template) {
                    Ok(body) => Some(HttpResponse::html(body).with_status(template.status)),
                    Err(e) => {
                        tracing::warn!(template = %template.template, error = %e, "Template rendering failed");
                        None
                    }
                }
            }
        }
    }
}
