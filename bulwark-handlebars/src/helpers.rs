//! Template function maps as Handlebars helpers

use bulwark_core::{FuncMap, TemplateFn};
use handlebars::{Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext};

/// Register every function in `funcs` as a zero-argument helper, so that
/// `{{Name}}` renders the function's output.
pub fn register_func_map(handlebars: &mut Handlebars<'_>, funcs: &FuncMap) {
    for (name, func) in funcs.iter() {
        handlebars.register_helper(name, Box::new(func_helper(func.clone())));
    }
}

fn func_helper(func: TemplateFn) -> impl HelperDef + Send + Sync + 'static {
    helper_fn(move |_, registry, _, _, out| {
        let escape = registry.get_escape_fn();
        out.write(&escape(&func()))?;
        Ok(())
    })
}

fn helper_fn<F>(f: F) -> F
where
    F: Fn(&Helper, &Handlebars, &Context, &mut RenderContext, &mut dyn Output) -> HelperResult
        + Send
        + Sync
        + 'static,
{
    f
}
