//! # Post Registry
//!
//! Owns post creation and the Live → Expired transition.
//!
//! Expiration is applied lazily: every read runs [`PostRegistry::sweep_expired`]
//! before touching post state, so a post is never reported Live once
//! `now >= expiration_time`. The binary may also call the sweep on a timer;
//! both paths use the same repository update, so running them together is
//! harmless.

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::Result;
use crate::models::{CreatePost, NewPost, Post, PostId, PostStatus, PostSummary};
use crate::services::require;
use crate::time::parse_timestamp;
use crate::traits::ForumRepo;

pub struct PostRegistry {
    repo: Arc<dyn ForumRepo>,
    clock: Arc<dyn Clock>,
}

impl PostRegistry {
    pub fn new(repo: Arc<dyn ForumRepo>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub fn repo(&self) -> &Arc<dyn ForumRepo> {
        &self.repo
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Validates and stores a new Live post owned by `owner`.
    ///
    /// An expiration time at or before now is accepted; such a post turns
    /// Expired on the next sweep.
    pub async fn create_post(&self, owner: &str, input: CreatePost) -> Result<PostId> {
        let owner_name = require("owner", owner)?;
        let title = require("title", &input.title)?;
        let topic = require("topic", &input.topic)?;
        let body = require("body", &input.body)?;
        let expiration_time = parse_timestamp(require("expiration_time", &input.expiration_time)?)?;

        let post = self
            .repo
            .create_post(NewPost {
                title: title.to_string(),
                topic: topic.to_string(),
                body: body.to_string(),
                owner_name: owner_name.to_string(),
                created_at: self.clock.now(),
                expiration_time,
            })
            .await?;

        log::info!("post {} created in '{}' by {}", post.id, post.topic, post.owner_name);
        Ok(post.id)
    }

    /// Transitions every due Live post to Expired.
    pub async fn sweep_expired(&self) -> Result<u64> {
        let expired = self.repo.expire_posts(self.clock.now()).await?;
        if expired > 0 {
            log::info!("expired {expired} post(s)");
        }
        Ok(expired)
    }

    /// Single Live post lookup; expired or foreign-topic posts read as absent.
    pub async fn get_post(&self, topic: &str, id: PostId) -> Result<Option<Post>> {
        self.sweep_expired().await?;
        let topic = topic.trim();
        let post = self.repo.get_post(id).await?;
        Ok(post.filter(|p| p.topic == topic && p.is_live()))
    }

    /// Live posts of a topic without their bodies.
    pub async fn list_by_topic(&self, topic: &str) -> Result<Vec<PostSummary>> {
        self.sweep_expired().await?;
        let posts = self.repo.list_posts(topic.trim(), PostStatus::Live).await?;
        Ok(posts.iter().map(Post::summary).collect())
    }

    pub async fn list_expired_by_topic(&self, topic: &str) -> Result<Vec<Post>> {
        self.sweep_expired().await?;
        Ok(self.repo.list_posts(topic.trim(), PostStatus::Expired).await?)
    }

    /// Every Live post across topics, after the sweep.
    pub async fn list_live(&self) -> Result<Vec<Post>> {
        self.sweep_expired().await?;
        Ok(self.repo.list_posts_by_status(PostStatus::Live).await?)
    }

    /// Looks a post up by id only, after the sweep, whatever its status.
    pub async fn find(&self, id: PostId) -> Result<Option<Post>> {
        self.sweep_expired().await?;
        Ok(self.repo.get_post(id).await?)
    }
}
