//! Handlebars rendering for Bulwark template responses
//!
//! Renders a [`TemplateResponse`] with its function map available to the
//! template: every function is registered as a helper, so a form can embed
//! the XSRF token with `{{XSRFToken}}`.
//!
//! ## Example
//!
//! ```
//! use bulwark_core::{TemplateRenderer, TemplateResponse};
//! use bulwark_handlebars::{HandlebarsConfig, HandlebarsEngine};
//! use serde_json::json;
//!
//! let engine = HandlebarsEngine::new(HandlebarsConfig::in_memory()).unwrap();
//! engine
//!     .register_template("form", r#"<input name="xsrf-token" value="{{XSRFToken}}">"#)
//!     .unwrap();
//!
//! let response = TemplateResponse::new("form", json!({}))
//!     .with_func("XSRFToken", || "abc:1700000000000".to_string());
//!
//! let html = TemplateRenderer::render(&engine, &response).unwrap();
//! assert_eq!(html, r#"<input name="xsrf-token" value="abc:1700000000000">"#);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod helpers;

pub use config::HandlebarsConfig;
pub use engine::HandlebarsEngine;
pub use error::{HandlebarsError, Result};

use bulwark_core::{HttpResponse, TemplateResponse};
use serde::Serialize;

/// Async facade over [`HandlebarsEngine`]
#[derive(Clone)]
pub struct HandlebarsService {
    engine: HandlebarsEngine,
}

impl HandlebarsService {
    pub fn new(config: HandlebarsConfig) -> Result<Self> {
        let engine = HandlebarsEngine::new(config)?;
        Ok(Self { engine })
    }

    /// Render a template with data
    pub async fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String> {
        // Rendering is CPU-bound
        let engine = self.engine.clone();
        let template = template.to_string();
        let data_json = serde_json::to_value(data)?;

        tokio::task::spawn_blocking(move || engine.render(&template, &data_json))
            .await
            .map_err(|e| HandlebarsError::RenderError(e.to_string()))?
    }

    /// Render a template response, function map included, into HTML
    pub async fn render_response(&self, response: TemplateResponse) -> Result<HttpResponse> {
        let engine = self.engine.clone();
        let status = response.status;

        let html = tokio::task::spawn_blocking(move || {
            engine.render_with_funcs(&response.template, &response.data, &response.func_map)
        })
        .await
        .map_err(|e| HandlebarsError::RenderError(e.to_string()))??;

        Ok(HttpResponse::html(html).with_status(status))
    }

    /// Register a template from string
    pub fn register_template(&self, name: &str, template: &str) -> Result<()> {
        self.engine.register_template(name, template)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.engine.has_template(name)
    }

    /// Reload all templates from disk
    pub async fn reload_templates(&self) -> Result<()> {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || engine.reload_templates())
            .await
            .map_err(|e| HandlebarsError::RenderError(e.to_string()))?
    }

    pub fn engine(&self) -> &HandlebarsEngine {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_templates() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let templates_dir = temp_dir.path().join("templates");
        fs::create_dir(&templates_dir).unwrap();

        fs::write(templates_dir.join("hello.hbs"), "<h1>Hello {{name}}!</h1>").unwrap();
        fs::write(
            templates_dir.join("form.hbs"),
            "<form>{{XSRFToken}}</form>",
        )
        .unwrap();

        temp_dir
    }

    fn service(temp_dir: &TempDir) -> HandlebarsService {
        HandlebarsService::new(HandlebarsConfig::new(temp_dir.path().join("templates"))).unwrap()
    }

    #[tokio::test]
    async fn test_service_render() {
        let temp_dir = create_test_templates();
        let result = service(&temp_dir)
            .render("hello", &json!({"name": "Bulwark"}))
            .await
            .unwrap();
        assert_eq!(result, "<h1>Hello Bulwark!</h1>");
    }

    #[tokio::test]
    async fn test_service_render_response() {
        let temp_dir = create_test_templates();
        let response = TemplateResponse::new("form", json!({}))
            .with_status(StatusCode::ACCEPTED)
            .with_func("XSRFToken", || "tok".to_string());

        let response = service(&temp_dir).render_response(response).await.unwrap();

        assert_eq!(response.status, StatusCode::ACCEPTED);
        assert_eq!(
            response.header("content-type"),
            Some("text/html; charset=utf-8")
        );
        assert_eq!(response.body_string(), "<form>tok</form>");
    }

    #[tokio::test]
    async fn test_reload_templates() {
        let temp_dir = create_test_templates();
        let service = service(&temp_dir);
        fs::write(temp_dir.path().join("templates").join("extra.hbs"), "extra").unwrap();

        assert!(!service.has_template("extra"));
        service.reload_templates().await.unwrap();
        assert!(service.has_template("extra"));
    }
}
