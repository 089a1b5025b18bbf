//! Configuration for the Handlebars renderer

use std::path::PathBuf;

/// Configuration for the Handlebars renderer
#[derive(Debug, Clone)]
pub struct HandlebarsConfig {
    /// Directory scanned for template files; `None` keeps templates in memory only
    pub template_dir: Option<PathBuf>,

    /// Template file extension (default: ".hbs")
    pub template_extension: String,

    /// Reload templates from disk before every render
    pub dev_mode: bool,

    /// Error on missing variables
    pub strict_mode: bool,

    /// Enable HTML escaping (default: true)
    pub escape_html: bool,
}

impl HandlebarsConfig {
    /// Load templates from `template_dir`
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: Some(template_dir.into()),
            ..Self::in_memory()
        }
    }

    /// No template directory; templates are registered from strings
    pub fn in_memory() -> Self {
        Self {
            template_dir: None,
            template_extension: ".hbs".to_string(),
            dev_mode: false,
            strict_mode: false,
            escape_html: true,
        }
    }

    /// Set template file extension
    pub fn with_extension(mut self, ext: impl Into<String>) -> Self {
        self.template_extension = ext.into();
        self
    }

    pub fn with_dev_mode(mut self, enable: bool) -> Self {
        self.dev_mode = enable;
        self
    }

    pub fn with_strict_mode(mut self, enable: bool) -> Self {
        self.strict_mode = enable;
        self
    }

    /// Enable/disable HTML escaping
    pub fn with_escape_html(mut self, enable: bool) -> Self {
        self.escape_html = enable;
        self
    }
}

impl Default for HandlebarsConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}
