// Template-backed responses and the function map exposed to templates

use crate::Result;
use http::StatusCode;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A zero-argument function callable from a template
pub type TemplateFn = Arc<dyn Fn() -> String + Send + Sync>;

/// Named functions made available to a template at render time.
#[derive(Clone, Default)]
pub struct FuncMap {
    funcs: BTreeMap<String, TemplateFn>,
}

impl FuncMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any previous binding
    pub fn insert<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.funcs.insert(name.into(), Arc::new(func));
    }

    pub fn get(&self, name: &str) -> Option<&TemplateFn> {
        self.funcs.get(name)
    }

    /// Invoke the function bound to `name`
    pub fn call(&self, name: &str) -> Option<String> {
        self.funcs.get(name).map(|f| f())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.funcs.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TemplateFn)> {
        self.funcs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

impl fmt::Debug for FuncMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.funcs.keys()).finish()
    }
}

/// A response that still has to be rendered from a named template.
#[derive(Debug, Clone)]
pub struct TemplateResponse {
    pub template: String,
    pub data: Value,
    pub func_map: FuncMap,
    pub status: StatusCode,
}

impl TemplateResponse {
    pub fn new(template: impl Into<String>, data: Value) -> Self {
        Self {
            template: template.into(),
            data,
            func_map: FuncMap::new(),
            status: StatusCode::OK,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_func<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.func_map.insert(name, func);
        self
    }

    pub fn func_map(&self) -> &FuncMap {
        &self.func_map
    }

    pub fn func_map_mut(&mut self) -> &mut FuncMap {
        &mut self.func_map
    }
}

/// Turns a [`TemplateResponse`] into markup.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, response: &TemplateResponse) -> Result<String>;
}
