// Bulwark - request interceptors for web applications
//
// The core crate supplies typed request/response accessors and the
// interceptor pipeline; optional crates plug protections and renderers
// into it.

// Re-export core functionality
pub use bulwark_core::*;

// Re-export optional crates
#[cfg(feature = "xsrf")]
pub use bulwark_xsrf as xsrf;

#[cfg(feature = "handlebars")]
pub use bulwark_handlebars as handlebars;

pub mod prelude {
    pub use crate::{
        Cookie, Disposition, Error, Form, FuncMap, HttpRequest, HttpResponse, Interceptor,
        InterceptorChain, MultipartForm, Response, ResponseWriter, TemplateRenderer,
        TemplateResponse,
    };

    #[cfg(feature = "xsrf")]
    pub use bulwark_xsrf::{
        AngularStrategy, Checker, DefaultStrategy, GeneratedData, Generator, Injector,
        RandomSource, SecretKey, TOKEN_FUNC_NAME, TokenCodec, XsrfConfig, XsrfError,
        XsrfInterceptor,
    };

    #[cfg(feature = "handlebars")]
    pub use bulwark_handlebars::{HandlebarsConfig, HandlebarsEngine, HandlebarsService};
}
