//! # Domain Models
//!
//! These structs represent the core entities of Topic-Board.
//! Posts, comments and interaction records use monotonic integer ids assigned
//! by the storage plugin. Users and authors are referenced by name only; no
//! plugin enforces referential integrity on those names.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::time::serde_timestamp;

pub type PostId = i64;
pub type CommentId = i64;

/// A registered account. The password is an opaque credential compared by
/// exact equality.
#[derive(Clone, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// The verified principal name attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity(pub String);

impl Identity {
    pub fn name(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostStatus {
    Live,
    Expired,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Live => "Live",
            PostStatus::Expired => "Expired",
        }
    }
}

impl FromStr for PostStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Live" => Ok(PostStatus::Live),
            "Expired" => Ok(PostStatus::Expired),
            other => Err(anyhow::anyhow!("unknown post status '{other}'")),
        }
    }
}

/// A time-limited topical message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub topic: String,
    pub body: String,
    /// Author's username (reference by name)
    pub owner_name: String,
    #[serde(with = "serde_timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serde_timestamp")]
    pub expiration_time: NaiveDateTime,
    pub status: PostStatus,
    pub likes: i64,
    pub dislikes: i64,
}

impl Post {
    pub fn is_live(&self) -> bool {
        self.status == PostStatus::Live
    }

    /// True once the validity window has closed, whatever `status` says.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        now >= self.expiration_time
    }

    /// Whole seconds left until expiration; negative once past it.
    pub fn seconds_left(&self, now: NaiveDateTime) -> i64 {
        (self.expiration_time - now).num_seconds()
    }

    pub fn summary(&self) -> PostSummary {
        PostSummary {
            id: self.id,
            title: self.title.clone(),
            topic: self.topic.clone(),
            owner_name: self.owner_name.clone(),
            created_at: self.created_at,
            expiration_time: self.expiration_time,
            status: self.status,
            likes: self.likes,
            dislikes: self.dislikes,
        }
    }
}

/// List projection of a [`Post`]: everything but the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: PostId,
    pub title: String,
    pub topic: String,
    pub owner_name: String,
    #[serde(with = "serde_timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serde_timestamp")]
    pub expiration_time: NaiveDateTime,
    pub status: PostStatus,
    pub likes: i64,
    pub dislikes: i64,
}

/// Raw post submission as received from the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub topic: String,
    pub body: String,
    /// `YYYY-MM-DDTHH:MM:SS`
    pub expiration_time: String,
}

/// A validated post ready for insertion; the plugin assigns the id and
/// starts it Live with zeroed counters.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub topic: String,
    pub body: String,
    pub owner_name: String,
    pub created_at: NaiveDateTime,
    pub expiration_time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub user_name: String,
    pub text: String,
    #[serde(with = "serde_timestamp")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: PostId,
    pub user_name: String,
    pub text: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Like,
    Dislike,
    Comment,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Like => "like",
            InteractionKind::Dislike => "dislike",
            InteractionKind::Comment => "comment",
        }
    }
}

impl FromStr for InteractionKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(InteractionKind::Like),
            "dislike" => Ok(InteractionKind::Dislike),
            "comment" => Ok(InteractionKind::Comment),
            other => Err(AppError::InvalidKind(other.to_string())),
        }
    }
}

/// Counter-only interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    pub fn kind(&self) -> InteractionKind {
        match self {
            Reaction::Like => InteractionKind::Like,
            Reaction::Dislike => InteractionKind::Dislike,
        }
    }
}

/// One applied interaction, as recorded in the interaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: i64,
    pub post_id: PostId,
    pub user_name: String,
    pub kind: InteractionKind,
    /// Seconds until the post's expiration when the interaction landed
    pub time_left: i64,
    #[serde(with = "serde_timestamp")]
    pub created_at: NaiveDateTime,
}

/// Outcome of a successful `apply_interaction`.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Reacted {
        kind: InteractionKind,
        likes: i64,
        dislikes: i64,
    },
    Commented(Comment),
}

impl Applied {
    pub fn kind(&self) -> InteractionKind {
        match self {
            Applied::Reacted { kind, .. } => *kind,
            Applied::Commented(_) => InteractionKind::Comment,
        }
    }
}
