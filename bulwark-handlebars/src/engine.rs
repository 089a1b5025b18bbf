//! Handlebars engine rendering Bulwark template responses

use crate::{Result, config::HandlebarsConfig, error::HandlebarsError, helpers};
use bulwark_core::{FuncMap, TemplateRenderer, TemplateResponse};
use handlebars::Handlebars;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Handlebars template engine
#[derive(Clone)]
pub struct HandlebarsEngine {
    handlebars: Arc<RwLock<Handlebars<'static>>>,
    config: HandlebarsConfig,
}

impl HandlebarsEngine {
    pub fn new(config: HandlebarsConfig) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(config.strict_mode);

        if !config.escape_html {
            handlebars.register_escape_fn(handlebars::no_escape);
        }

        let engine = Self {
            handlebars: Arc::new(RwLock::new(handlebars)),
            config,
        };
        engine.load_templates()?;

        Ok(engine)
    }

    fn read(&self) -> RwLockReadGuard<'_, Handlebars<'static>> {
        self.handlebars.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Handlebars<'static>> {
        self.handlebars
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn load_templates(&self) -> Result<()> {
        let Some(dir) = &self.config.template_dir else {
            return Ok(());
        };

        if !dir.exists() {
            return Err(HandlebarsError::ConfigError(format!(
                "Template directory not found: {:?}",
                dir
            )));
        }

        self.load_templates_from_dir(dir, dir)
    }

    fn load_templates_from_dir(&self, root: &Path, dir: &Path) -> Result<()> {
        use std::fs;

        let extension = self.config.template_extension.trim_start_matches('.');

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();

            if path.is_dir() {
                self.load_templates_from_dir(root, &path)?;
            } else if path.extension().is_some_and(|ext| ext == extension) {
                let name = path
                    .strip_prefix(root)
                    .unwrap_or(&path)
                    .with_extension("")
                    .to_string_lossy()
                    .replace('\\', "/");

                let content = fs::read_to_string(&path)?;
                tracing::trace!(template = %name, "Registering template");
                self.write().register_template_string(&name, content)?;
            }
        }

        Ok(())
    }

    /// Render a registered template with data
    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String> {
        self.render_with_funcs(template, data, &FuncMap::new())
    }

    /// Render a registered template with the functions in `funcs` available
    /// as helpers.
    pub fn render_with_funcs<T: Serialize>(
        &self,
        template: &str,
        data: &T,
        funcs: &FuncMap,
    ) -> Result<String> {
        if self.config.dev_mode {
            self.reload_templates()?;
        }

        if !self.has_template(template) {
            return Err(HandlebarsError::TemplateNotFound(template.to_string()));
        }

        if funcs.is_empty() {
            return Ok(self.read().render(template, data)?);
        }

        // Function maps are per response, so they go on a private copy.
        let mut registry = self.read().clone();
        helpers::register_func_map(&mut registry, funcs);
        Ok(registry.render(template, data)?)
    }

    /// Render a template string (not from file)
    pub fn render_template<T: Serialize>(&self, template_str: &str, data: &T) -> Result<String> {
        Ok(self.read().render_template(template_str, data)?)
    }

    /// Register a template from string
    pub fn register_template(&self, name: &str, template: &str) -> Result<()> {
        Ok(self.write().register_template_string(name, template)?)
    }

    pub fn register_partial(&self, name: &str, template: &str) -> Result<()> {
        Ok(self.write().register_partial(name, template)?)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.read().has_template(name)
    }

    /// Names of all registered templates
    pub fn get_templates(&self) -> Vec<String> {
        self.read().get_templates().keys().cloned().collect()
    }

    /// Reload all templates from disk
    pub fn reload_templates(&self) -> Result<()> {
        if self.config.template_dir.is_none() {
            return Ok(());
        }

        self.write().clear_templates();
        self.load_templates()
    }

    pub fn config(&self) -> &HandlebarsConfig {
        &self.config
    }
}

impl TemplateRenderer for HandlebarsEngine {
    fn render(&self, response: &TemplateResponse) -> bulwark_core::Result<String> {
        Ok(self.render_with_funcs(&response.template, &response.data, &response.func_map)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_templates() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let templates_dir = temp_dir.path().join("templates");
        fs::create_dir_all(templates_dir.join("forms")).unwrap();

        fs::write(templates_dir.join("test.hbs"), "<h1>Hello {{name}}!</h1>").unwrap();
        fs::write(
            templates_dir.join("forms").join("transfer.hbs"),
            r#"<input type="hidden" name="xsrf-token" value="{{XSRFToken}}">"#,
        )
        .unwrap();
        fs::write(templates_dir.join("notes.txt"), "ignored").unwrap();

        temp_dir
    }

    fn engine(temp_dir: &TempDir) -> HandlebarsEngine {
        HandlebarsEngine::new(HandlebarsConfig::new(temp_dir.path().join("templates"))).unwrap()
    }

    #[test]
    fn test_loads_nested_templates() {
        let temp_dir = create_test_templates();
        let engine = engine(&temp_dir);

        assert!(engine.has_template("test"));
        assert!(engine.has_template("forms/transfer"));
        assert!(!engine.has_template("notes"));
        assert_eq!(engine.get_templates().len(), 2);
    }

    #[test]
    fn test_render_template() {
        let temp_dir = create_test_templates();
        let result = engine(&temp_dir)
            .render("test", &json!({"name": "World"}))
            .unwrap();
        assert_eq!(result, "<h1>Hello World!</h1>");
    }

    #[test]
    fn test_render_with_funcs() {
        let temp_dir = create_test_templates();
        let engine = engine(&temp_dir);

        let mut funcs = FuncMap::new();
        funcs.insert("XSRFToken", || "abc:1".to_string());

        let result = engine
            .render_with_funcs("forms/transfer", &json!({}), &funcs)
            .unwrap();
        assert_eq!(
            result,
            r#"<input type="hidden" name="xsrf-token" value="abc:1">"#
        );

        // funcs do not leak into the shared registry
        let plain = engine.render("forms/transfer", &json!({})).unwrap();
        assert_eq!(plain, r#"<input type="hidden" name="xsrf-token" value="">"#);
    }

    #[test]
    fn test_renderer_trait() {
        let engine = HandlebarsEngine::new(HandlebarsConfig::in_memory()).unwrap();
        engine.register_template("token", "{{XSRFToken}}").unwrap();

        let response = TemplateResponse::new("token", json!({}))
            .with_func("XSRFToken", || "t0k3n".to_string());
        assert_eq!(TemplateRenderer::render(&engine, &response).unwrap(), "t0k3n");
    }

    #[test]
    fn test_missing_template() {
        let engine = HandlebarsEngine::new(HandlebarsConfig::in_memory()).unwrap();
        assert!(matches!(
            engine.render("absent", &json!({})),
            Err(HandlebarsError::TemplateNotFound(_))
        ));

        let response = TemplateResponse::new("absent", json!({}));
        assert!(matches!(
            TemplateRenderer::render(&engine, &response),
            Err(bulwark_core::Error::Template(_))
        ));
    }

    #[test]
    fn test_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config = HandlebarsConfig::new(temp_dir.path().join("nope"));
        assert!(matches!(
            HandlebarsEngine::new(config),
            Err(HandlebarsError::ConfigError(_))
        ));
    }

    #[test]
    fn test_dev_mode_reloads() {
        let temp_dir = create_test_templates();
        let dir = temp_dir.path().join("templates");
        let engine = HandlebarsEngine::new(HandlebarsConfig::new(&dir).with_dev_mode(true)).unwrap();

        fs::write(dir.join("test.hbs"), "<h2>{{name}}</h2>").unwrap();
        let result = engine.render("test", &json!({"name": "again"})).unwrap();
        assert_eq!(result, "<h2>again</h2>");
    }

    #[test]
    fn test_strict_mode() {
        let config = HandlebarsConfig::in_memory().with_strict_mode(true);
        let engine = HandlebarsEngine::new(config).unwrap();

        engine.register_template("strict", "{{missing}}").unwrap();
        assert!(engine.render("strict", &json!({})).is_err());
    }
}
