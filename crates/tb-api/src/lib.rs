//! # tb-api
//!
//! The web routing and orchestration layer for Topic-Board.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;

use actix_web::web;
use tb_core::error::AppError;

use crate::error::ApiError;

/// Configures the routes for the forum API.
///
/// Malformed JSON bodies are answered with the same 400 `{message}` shape as
/// validation failures.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::from(AppError::ValidationError(err.to_string())).into()
    }))
    .service(
        web::scope("")
            .route("/health", web::get().to(handlers::health))
            // Identity
            .route("/register", web::post().to(handlers::register))
            .route("/login", web::post().to(handlers::login))
            // Post lifecycle
            .route("/post", web::post().to(handlers::create_post))
            .route("/topic/{topic}", web::get().to(handlers::browse_topic))
            .route("/topic/{topic}/{id}", web::get().to(handlers::view_post))
            // Rankings
            .route("/history/{topic}", web::get().to(handlers::expired_history))
            .route("/most-active", web::get().to(handlers::most_active))
            // Interactions
            .route("/interaction/{post_id}", web::post().to(handlers::interact))
            .route("/posts/{post_id}/comments", web::get().to(handlers::list_comments))
            .route("/posts/{post_id}/comments", web::post().to(handlers::add_comment))
            .route("/posts/{post_id}/interactions", web::get().to(handlers::list_interactions)),
    );
}
