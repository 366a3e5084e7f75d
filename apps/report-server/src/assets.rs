//! Static asset serving for the template and its fonts
//!
//! The renderer loads the template from memory with a `<base href>`
//! pointing here, so images, stylesheets and fonts referenced relatively by
//! the template are fetched over HTTP.

use std::path::Path;

use axum::http::{header, HeaderValue};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;

/// Routes for `/`, `/index.html`, `/fonts/*` and everything next to the template
pub fn routes(template_path: &Path, fonts_dir: &Path) -> Router {
    let template_dir = template_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let no_cache = SetResponseHeaderLayer::overriding(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache"),
    );

    let template = ServiceBuilder::new()
        .layer(no_cache.clone())
        .service(ServeFile::new(template_path));

    let fonts = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=86400"),
        ))
        .service(ServeDir::new(fonts_dir));

    let files = ServiceBuilder::new()
        .layer(no_cache)
        .service(ServeDir::new(template_dir));

    Router::new()
        .route_service("/", template.clone())
        .route_service("/index.html", template)
        .nest_service("/fonts", fonts)
        .fallback_service(files)
}
