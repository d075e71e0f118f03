use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// Any origin; the download filename header is exposed to the browser.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any)
        .expose_headers([header::CONTENT_DISPOSITION])
}
