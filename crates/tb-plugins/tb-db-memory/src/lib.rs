//! # tb-db-memory
//!
//! `ForumRepo` kept entirely in process memory, for tests and throwaway runs.
//!
//! Each post lives in its own `DashMap` entry; counter updates and the
//! matching log append happen while that entry's lock is held, so
//! increments on one post serialize while other posts stay available.
//! Lock order is always posts → comments → interactions.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tb_core::models::{Comment, Interaction, InteractionKind, NewComment, NewPost, Post, PostId, PostStatus, Reaction, User};
use tb_core::traits::ForumRepo;

#[derive(Default)]
pub struct MemoryForumRepo {
    users: DashMap<String, User>,
    posts: DashMap<PostId, Post>,
    comments: DashMap<PostId, Vec<Comment>>,
    interactions: DashMap<PostId, Vec<Interaction>>,
    post_seq: AtomicI64,
    comment_seq: AtomicI64,
    interaction_seq: AtomicI64,
}

impl MemoryForumRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(seq: &AtomicI64) -> i64 {
        seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn log_interaction(&self, post: &Post, user_name: &str, kind: InteractionKind, at: NaiveDateTime) {
        let mut log = self.interactions.entry(post.id).or_default();
        log.push(Interaction {
            id: Self::next(&self.interaction_seq),
            post_id: post.id,
            user_name: user_name.to_string(),
            kind,
            time_left: post.seconds_left(at),
            created_at: at,
        });
    }

    fn collect_posts(&self, keep: impl Fn(&Post) -> bool) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        posts.sort_by_key(|p| p.id);
        posts
    }
}

#[async_trait]
impl ForumRepo for MemoryForumRepo {
    async fn create_user(&self, user: User) -> anyhow::Result<bool> {
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(true)
            }
        }
    }

    async fn find_user(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self.users.get(username).map(|user| user.value().clone()))
    }

    async fn create_post(&self, post: NewPost) -> anyhow::Result<Post> {
        let post = Post {
            id: Self::next(&self.post_seq),
            title: post.title,
            topic: post.topic,
            body: post.body,
            owner_name: post.owner_name,
            created_at: post.created_at,
            expiration_time: post.expiration_time,
            status: PostStatus::Live,
            likes: 0,
            dislikes: 0,
        };
        self.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: PostId) -> anyhow::Result<Option<Post>> {
        Ok(self.posts.get(&id).map(|post| post.value().clone()))
    }

    async fn list_posts(&self, topic: &str, status: PostStatus) -> anyhow::Result<Vec<Post>> {
        Ok(self.collect_posts(|p| p.topic == topic && p.status == status))
    }

    async fn list_posts_by_status(&self, status: PostStatus) -> anyhow::Result<Vec<Post>> {
        Ok(self.collect_posts(|p| p.status == status))
    }

    async fn expire_posts(&self, now: NaiveDateTime) -> anyhow::Result<u64> {
        let mut expired = 0;
        for mut post in self.posts.iter_mut() {
            if post.is_live() && post.is_due(now) {
                post.status = PostStatus::Expired;
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn record_reaction(
        &self,
        post_id: PostId,
        reaction: Reaction,
        user_name: &str,
        at: NaiveDateTime,
    ) -> anyhow::Result<Option<Post>> {
        let Some(mut post) = self.posts.get_mut(&post_id) else {
            return Ok(None);
        };
        match reaction {
            Reaction::Like => post.likes += 1,
            Reaction::Dislike => post.dislikes += 1,
        }
        self.log_interaction(&post, user_name, reaction.kind(), at);
        Ok(Some(post.clone()))
    }

    async fn create_comment(&self, comment: NewComment) -> anyhow::Result<Option<Comment>> {
        let Some(post) = self.posts.get(&comment.post_id) else {
            return Ok(None);
        };

        // The log entry is appended under the thread guard so both lists share one order.
        let mut thread = self.comments.entry(comment.post_id).or_default();
        let created = Comment {
            id: Self::next(&self.comment_seq),
            post_id: comment.post_id,
            user_name: comment.user_name,
            text: comment.text,
            created_at: comment.created_at,
        };
        thread.push(created.clone());
        self.log_interaction(&post, &created.user_name, InteractionKind::Comment, created.created_at);
        Ok(Some(created))
    }

    async fn list_comments(&self, post_id: PostId) -> anyhow::Result<Vec<Comment>> {
        Ok(self.comments.get(&post_id).map(|c| c.value().clone()).unwrap_or_default())
    }

    async fn list_interactions(&self, post_id: PostId) -> anyhow::Result<Vec<Interaction>> {
        Ok(self.interactions.get(&post_id).map(|log| log.value().clone()).unwrap_or_default())
    }
}
