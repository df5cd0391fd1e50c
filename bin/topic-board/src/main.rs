//! # Topic-Board Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tb_api::handlers::AppState;
use tb_config::AppConfig;
use tb_core::clock::{Clock, SystemClock};
use tb_core::services::PostRegistry;
use tb_core::traits::{ForumRepo, TokenIssuer};

// Storage and auth plugins are selected by Cargo feature
#[cfg(feature = "db-sqlite")]
use tb_db_sqlite::SqliteForumRepo;

#[cfg(all(feature = "db-memory", not(feature = "db-sqlite")))]
use tb_db_memory::MemoryForumRepo;

#[cfg(feature = "auth-jwt")]
use tb_auth_jwt::JwtTokenIssuer;

#[cfg(not(any(feature = "db-sqlite", feature = "db-memory")))]
compile_error!("enable one storage feature: db-sqlite or db-memory");

#[cfg(not(feature = "auth-jwt"))]
compile_error!("enable the auth-jwt feature");

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // 1. Load Configuration (defaults → file → TOPIC_BOARD__* env)
    let config_path = std::env::var("TOPIC_BOARD_CONFIG").ok();
    let config = AppConfig::load(config_path.as_deref()).context("loading configuration")?;

    // 2. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let repo: Arc<dyn ForumRepo> = Arc::new(
        SqliteForumRepo::new(&config.database.url, config.database.max_connections)
            .await
            .context("initialising SQLite")?,
    );

    #[cfg(all(feature = "db-memory", not(feature = "db-sqlite")))]
    let repo: Arc<dyn ForumRepo> = Arc::new(MemoryForumRepo::new());

    // 3. Initialize Auth Implementation
    #[cfg(feature = "auth-jwt")]
    let tokens: Arc<dyn TokenIssuer> =
        Arc::new(JwtTokenIssuer::new(&config.auth.secret_key, config.auth.token_ttl_secs));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 4. Background expiration sweep (reads also sweep lazily)
    if config.lifecycle.sweep_interval_secs > 0 {
        let registry = PostRegistry::new(repo.clone(), clock.clone());
        let period = Duration::from_secs(config.lifecycle.sweep_interval_secs);
        actix_web::rt::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                if let Err(err) = registry.sweep_expired().await {
                    log::error!("expiration sweep failed: {err}");
                }
            }
        });
    }

    // 5. Shared services behind trait objects
    let state = web::Data::new(AppState::new(repo, tokens, clock));

    let (host, port) = config.bind_addr();
    log::info!("Topic-Board starting on http://{host}:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(tb_api::middleware::standard_middleware())
            .wrap(tb_api::middleware::cors_policy())
            .configure(tb_api::configure_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
