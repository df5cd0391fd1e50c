//! topic-board/crates/tb-api/src/middleware.rs Middleware
//!
//! Request logging and CORS for the Topic-Board API.

use actix_cors::Cors;
use actix_web::middleware::Logger;

/// Access log line per request:
/// remote-ip "request-line" status-code response-size duration
pub fn standard_middleware() -> Logger {
    Logger::new(r#"%a "%r" %s %b %Dms"#)
}

/// Browser clients may live on another origin; bearer tokens travel in
/// the Authorization header, so no cookies are involved.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![
            actix_web::http::header::AUTHORIZATION,
            actix_web::http::header::CONTENT_TYPE,
        ])
        .max_age(3600)
}
