//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::models::{Comment, Interaction, NewComment, NewPost, Post, PostId, PostStatus, Reaction, User};

/// Data persistence contract for users, posts, comments and the interaction log.
///
/// Implementations must make `record_reaction` and `create_comment` atomic
/// with respect to the post row they touch: concurrent increments on the
/// same post are never lost. How far calls on different posts overlap is up
/// to the backend; the in-memory plugin locks per post, SQLite has a single
/// writer per database file.
///
/// `expire_posts` runs before every registry read, so it should not take a
/// write lock when no post is due.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ForumRepo: Send + Sync {
    // User Operations
    /// Inserts the user unless the username is taken. Returns `false` on conflict.
    async fn create_user(&self, user: User) -> anyhow::Result<bool>;
    async fn find_user(&self, username: &str) -> anyhow::Result<Option<User>>;

    // Post Operations
    async fn create_post(&self, post: NewPost) -> anyhow::Result<Post>;
    async fn get_post(&self, id: PostId) -> anyhow::Result<Option<Post>>;
    /// Posts of one topic in the given status, ascending id.
    async fn list_posts(&self, topic: &str, status: PostStatus) -> anyhow::Result<Vec<Post>>;
    /// Posts of every topic in the given status, ascending id.
    async fn list_posts_by_status(&self, status: PostStatus) -> anyhow::Result<Vec<Post>>;
    /// Moves every Live post with `expiration_time <= now` to Expired.
    /// Returns how many posts changed status.
    async fn expire_posts(&self, now: NaiveDateTime) -> anyhow::Result<u64>;

    // Interaction Operations
    /// Atomically bumps the counter and appends the interaction log entry.
    /// Returns the updated post, or `None` when no post has that id.
    async fn record_reaction(
        &self,
        post_id: PostId,
        reaction: Reaction,
        user_name: &str,
        at: NaiveDateTime,
    ) -> anyhow::Result<Option<Post>>;
    /// Appends the comment and its interaction log entry.
    /// Returns `None` when no post has that id.
    async fn create_comment(&self, comment: NewComment) -> anyhow::Result<Option<Comment>>;
    /// Comments of a post in acceptance order.
    async fn list_comments(&self, post_id: PostId) -> anyhow::Result<Vec<Comment>>;
    /// Interaction log of a post, oldest first.
    async fn list_interactions(&self, post_id: PostId) -> anyhow::Result<Vec<Interaction>>;
}

/// Access token contract. Signing details belong to the plugin.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    /// Issues an opaque token bound to `username`.
    fn issue(&self, username: &str) -> anyhow::Result<String>;

    /// Resolves a token back to the username it was issued for.
    fn verify(&self, token: &str) -> anyhow::Result<String>;
}
