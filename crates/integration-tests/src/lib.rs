//! Shared fixtures for the cross-crate scenario tests.
//!
//! A [`Harness`] wires the real services (through `tb_api::handlers::AppState`)
//! over one storage plugin, a JWT issuer and a [`ManualClock`], so tests can
//! move time forward and watch posts expire.

use std::sync::Arc;

use actix_web::web;
use chrono::Duration;
use secrecy::SecretString;
use tb_api::handlers::AppState;
use tb_auth_jwt::JwtTokenIssuer;
use tb_core::clock::{Clock, ManualClock};
use tb_core::models::{CreatePost, Identity, PostId};
use tb_core::time::{format_timestamp, parse_timestamp};
use tb_core::traits::{ForumRepo, TokenIssuer};
use tb_db_memory::MemoryForumRepo;
use tb_db_sqlite::SqliteForumRepo;
use tempfile::TempDir;

/// Wall-clock start of every harness.
pub const START: &str = "2024-06-01T12:00:00";

pub struct Harness {
    /// Storage plugin under test, for assertion messages
    pub backend: &'static str,
    pub clock: Arc<ManualClock>,
    pub repo: Arc<dyn ForumRepo>,
    pub state: web::Data<AppState>,
}

impl Harness {
    fn build(backend: &'static str, repo: Arc<dyn ForumRepo>) -> Self {
        let clock = Arc::new(ManualClock::new(parse_timestamp(START).expect("valid start")));
        let tokens: Arc<dyn TokenIssuer> =
            Arc::new(JwtTokenIssuer::new(&SecretString::from("integration-secret".to_string()), 3600));
        let state = web::Data::new(AppState::new(repo.clone(), tokens, clock.clone() as Arc<dyn Clock>));
        Self { backend, clock, repo, state }
    }

    pub fn memory() -> Self {
        Self::build("memory", Arc::new(MemoryForumRepo::new()))
    }

    pub async fn sqlite() -> Self {
        let repo = SqliteForumRepo::new("sqlite::memory:", 1)
            .await
            .expect("in-memory sqlite");
        Self::build("sqlite", Arc::new(repo))
    }

    /// File-backed SQLite with a multi-connection WAL pool, as the binary runs it.
    pub async fn sqlite_file(dir: &TempDir) -> Self {
        let url = format!("sqlite:{}", dir.path().join("topic-board.db").display());
        let repo = SqliteForumRepo::new(&url, 5).await.expect("file sqlite");
        Self::build("sqlite-file", Arc::new(repo))
    }

    /// One harness per storage plugin.
    pub async fn all() -> Vec<Self> {
        vec![Self::memory(), Self::sqlite().await]
    }

    /// Timestamp `hours` away from the harness clock, in wire format.
    pub fn in_hours(&self, hours: i64) -> String {
        format_timestamp(&(self.clock.now() + Duration::hours(hours)))
    }

    pub fn advance_hours(&self, hours: i64) {
        self.clock.advance(Duration::hours(hours));
    }

    /// Creates a post through the registry and returns its id.
    pub async fn post(&self, owner: &str, topic: &str, title: &str, expires: &str) -> PostId {
        self.state
            .registry
            .create_post(
                owner,
                CreatePost {
                    title: title.to_string(),
                    topic: topic.to_string(),
                    body: format!("{title} body"),
                    expiration_time: expires.to_string(),
                },
            )
            .await
            .unwrap_or_else(|err| panic!("[{}] create_post failed: {err}", self.backend))
    }
}

pub fn identity(name: &str) -> Identity {
    Identity(name.to_string())
}
