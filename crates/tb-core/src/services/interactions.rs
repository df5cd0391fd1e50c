//! # Interaction Engine
//!
//! Applies likes, dislikes and comments to posts. Counter updates are a
//! single repository call so concurrent interactions on one post serialize
//! inside the storage plugin and never lose an increment.
//!
//! Interactions are accepted on any existing post, Live or Expired. Listing
//! comments requires a Live post. `add_comment` uses the same lenient check
//! as `apply_interaction`.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Applied, Comment, CommentId, Identity, Interaction, InteractionKind, NewComment, PostId, Reaction};
use crate::services::registry::PostRegistry;
use crate::services::require;

pub struct InteractionEngine {
    registry: Arc<PostRegistry>,
}

impl InteractionEngine {
    pub fn new(registry: Arc<PostRegistry>) -> Self {
        Self { registry }
    }

    /// Applies one interaction of the named kind.
    ///
    /// The kind (and, for comments, the text) is validated before any post
    /// lookup, so a rejected call touches no state.
    pub async fn apply_interaction(
        &self,
        identity: &Identity,
        post_id: PostId,
        kind: &str,
        comment_text: Option<&str>,
    ) -> Result<Applied> {
        let kind: InteractionKind = kind.parse()?;

        let applied = match kind {
            InteractionKind::Like => self.react(identity, post_id, Reaction::Like).await?,
            InteractionKind::Dislike => self.react(identity, post_id, Reaction::Dislike).await?,
            InteractionKind::Comment => {
                let text = require("comment", comment_text.unwrap_or_default())?;
                Applied::Commented(self.comment(identity, post_id, text).await?)
            }
        };

        log::debug!("{} applied to post {post_id} by {}", kind.as_str(), identity.name());
        Ok(applied)
    }

    /// Standalone comment path. Does not require the post to be Live.
    pub async fn add_comment(&self, identity: &Identity, post_id: PostId, text: &str) -> Result<CommentId> {
        let text = require("text", text)?;
        let comment = self.comment(identity, post_id, text).await?;
        Ok(comment.id)
    }

    /// Comments of a Live post, oldest first.
    pub async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>> {
        match self.registry.find(post_id).await? {
            Some(post) if post.is_live() => Ok(self.registry.repo().list_comments(post_id).await?),
            _ => Err(AppError::PostNotFound(post_id)),
        }
    }

    /// Interaction log of any existing post, oldest first.
    pub async fn list_interactions(&self, post_id: PostId) -> Result<Vec<Interaction>> {
        if self.registry.find(post_id).await?.is_none() {
            return Err(AppError::PostNotFound(post_id));
        }
        Ok(self.registry.repo().list_interactions(post_id).await?)
    }

    async fn react(&self, identity: &Identity, post_id: PostId, reaction: Reaction) -> Result<Applied> {
        let now = self.registry.clock().now();
        let post = self
            .registry
            .repo()
            .record_reaction(post_id, reaction, identity.name(), now)
            .await?
            .ok_or(AppError::PostNotFound(post_id))?;

        Ok(Applied::Reacted { kind: reaction.kind(), likes: post.likes, dislikes: post.dislikes })
    }

    async fn comment(&self, identity: &Identity, post_id: PostId, text: &str) -> Result<Comment> {
        let new = NewComment {
            post_id,
            user_name: identity.name().to_string(),
            text: text.to_string(),
            created_at: self.registry.clock().now(),
        };
        self.registry
            .repo()
            .create_comment(new)
            .await?
            .ok_or(AppError::PostNotFound(post_id))
    }
}
