//! # Ranking Service
//!
//! Read-only views derived from the post store.

use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Result;
use crate::models::Post;
use crate::services::registry::PostRegistry;

pub struct RankingService {
    registry: Arc<PostRegistry>,
}

impl RankingService {
    pub fn new(registry: Arc<PostRegistry>) -> Self {
        Self { registry }
    }

    /// The most active Live post of every topic that has one.
    pub async fn most_active_per_topic(&self) -> Result<BTreeMap<String, Post>> {
        let live = self.registry.list_live().await?;
        Ok(most_active(live))
    }

    /// Every Expired post of the topic, counters included.
    pub async fn expired_history(&self, topic: &str) -> Result<Vec<Post>> {
        self.registry.list_expired_by_topic(topic).await
    }
}

/// Activity order: more likes, then more dislikes, then the older post.
fn activity(a: &Post, b: &Post) -> Ordering {
    a.likes
        .cmp(&b.likes)
        .then(a.dislikes.cmp(&b.dislikes))
        .then(b.id.cmp(&a.id))
}

/// Picks one winner per topic from a snapshot of Live posts.
fn most_active(posts: Vec<Post>) -> BTreeMap<String, Post> {
    let mut best: BTreeMap<String, Post> = BTreeMap::new();
    for post in posts.into_iter().filter(Post::is_live) {
        match best.entry(post.topic.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(post);
            }
            Entry::Occupied(mut slot) => {
                if activity(&post, slot.get()) == Ordering::Greater {
                    slot.insert(post);
                }
            }
        }
    }
    best
}
