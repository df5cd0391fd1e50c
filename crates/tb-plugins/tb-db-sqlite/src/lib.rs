//! # tb-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `tb-core` domain models.
//!
//! Counter updates run as `likes = likes + 1` inside the same transaction as
//! the interaction log insert, so SQLite's write lock serializes concurrent
//! increments and a failed log write rolls the increment back.
//!
//! SQLite has a single writer per database file. Writes to unrelated posts
//! therefore queue behind each other (bounded by the busy timeout). Expiry
//! sweeps only take the write lock when some Live post is actually due, so
//! plain reads never wait on writers under WAL.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tb_core::models::{Comment, Interaction, InteractionKind, NewComment, NewPost, Post, PostId, PostStatus, Reaction, User};
use tb_core::traits::ForumRepo;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        username TEXT PRIMARY KEY NOT NULL,
        password TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        title           TEXT NOT NULL,
        topic           TEXT NOT NULL,
        body            TEXT NOT NULL,
        owner_name      TEXT NOT NULL,
        created_at      TEXT NOT NULL,
        expiration_time TEXT NOT NULL,
        status          TEXT NOT NULL DEFAULT 'Live',
        likes           INTEGER NOT NULL DEFAULT 0,
        dislikes        INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS idx_posts_topic_status ON posts (topic, status)",
    "CREATE INDEX IF NOT EXISTS idx_posts_status_expiration ON posts (status, expiration_time)",
    "CREATE TABLE IF NOT EXISTS comments (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        post_id    INTEGER NOT NULL REFERENCES posts (id),
        user_name  TEXT NOT NULL,
        text       TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments (post_id)",
    "CREATE TABLE IF NOT EXISTS interactions (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        post_id    INTEGER NOT NULL REFERENCES posts (id),
        user_name  TEXT NOT NULL,
        kind       TEXT NOT NULL,
        time_left  INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_interactions_post ON interactions (post_id)",
];

pub struct SqliteForumRepo {
    pool: SqlitePool,
}

impl SqliteForumRepo {
    /// Connects and creates the schema if needed.
    ///
    /// In-memory databases live as long as their connection, so they get a
    /// single pinned connection regardless of `max_connections`.
    pub async fn new(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = if url.contains(":memory:") || url.contains("mode=memory") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect_with(
                    options
                        .journal_mode(SqliteJournalMode::Wal)
                        .busy_timeout(Duration::from_secs(5)),
                )
                .await?
        };

        let repo = Self { pool };
        repo.migrate().await?;
        log::info!("sqlite repository ready at {url}");
        Ok(repo)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn row_to_post(row: &SqliteRow) -> anyhow::Result<Post> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        topic: row.try_get("topic")?,
        body: row.try_get("body")?,
        owner_name: row.try_get("owner_name")?,
        created_at: row.try_get("created_at")?,
        expiration_time: row.try_get("expiration_time")?,
        status: row.try_get::<String, _>("status")?.parse()?,
        likes: row.try_get("likes")?,
        dislikes: row.try_get("dislikes")?,
    })
}

fn row_to_comment(row: &SqliteRow) -> anyhow::Result<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        user_name: row.try_get("user_name")?,
        text: row.try_get("text")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_interaction(row: &SqliteRow) -> anyhow::Result<Interaction> {
    Ok(Interaction {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        user_name: row.try_get("user_name")?,
        kind: row.try_get::<String, _>("kind")?.parse::<InteractionKind>()?,
        time_left: row.try_get("time_left")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl ForumRepo for SqliteForumRepo {
    async fn create_user(&self, user: User) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO users (username, password) VALUES (?, ?) ON CONFLICT (username) DO NOTHING",
        )
        .bind(&user.username)
        .bind(&user.password)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_user(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT username, password FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> anyhow::Result<User> {
            Ok(User {
                username: row.try_get("username")?,
                password: row.try_get("password")?,
            })
        })
        .transpose()
    }

    async fn create_post(&self, post: NewPost) -> anyhow::Result<Post> {
        let row = sqlx::query(
            "INSERT INTO posts (title, topic, body, owner_name, created_at, expiration_time, status, likes, dislikes)
             VALUES (?, ?, ?, ?, ?, ?, ?, 0, 0)
             RETURNING *",
        )
        .bind(post.title)
        .bind(post.topic)
        .bind(post.body)
        .bind(post.owner_name)
        .bind(post.created_at)
        .bind(post.expiration_time)
        .bind(PostStatus::Live.as_str())
        .fetch_one(&self.pool)
        .await?;
        row_to_post(&row)
    }

    async fn get_post(&self, id: PostId) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_post).transpose()
    }

    async fn list_posts(&self, topic: &str, status: PostStatus) -> anyhow::Result<Vec<Post>> {
        sqlx::query("SELECT * FROM posts WHERE topic = ? AND status = ? ORDER BY id ASC")
            .bind(topic)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_post)
            .collect()
    }

    async fn list_posts_by_status(&self, status: PostStatus) -> anyhow::Result<Vec<Post>> {
        sqlx::query("SELECT * FROM posts WHERE status = ? ORDER BY id ASC")
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_post)
            .collect()
    }

    async fn expire_posts(&self, now: NaiveDateTime) -> anyhow::Result<u64> {
        let due: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM posts WHERE status = ? AND expiration_time <= ?)")
                .bind(PostStatus::Live.as_str())
                .bind(now)
                .fetch_one(&self.pool)
                .await?;
        if !due {
            return Ok(0);
        }

        let result = sqlx::query("UPDATE posts SET status = ? WHERE status = ? AND expiration_time <= ?")
            .bind(PostStatus::Expired.as_str())
            .bind(PostStatus::Live.as_str())
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn record_reaction(
        &self,
        post_id: PostId,
        reaction: Reaction,
        user_name: &str,
        at: NaiveDateTime,
    ) -> anyhow::Result<Option<Post>> {
        let increment = match reaction {
            Reaction::Like => "UPDATE posts SET likes = likes + 1 WHERE id = ? RETURNING *",
            Reaction::Dislike => "UPDATE posts SET dislikes = dislikes + 1 WHERE id = ? RETURNING *",
        };

        let mut tx = self.pool.begin().await?;
        let Some(row) = sqlx::query(increment).bind(post_id).fetch_optional(&mut *tx).await? else {
            return Ok(None);
        };
        let post = row_to_post(&row)?;

        sqlx::query(
            "INSERT INTO interactions (post_id, user_name, kind, time_left, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(post_id)
        .bind(user_name)
        .bind(reaction.kind().as_str())
        .bind(post.seconds_left(at))
        .bind(at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(post))
    }

    async fn create_comment(&self, comment: NewComment) -> anyhow::Result<Option<Comment>> {
        let mut tx = self.pool.begin().await?;

        // Insert-select takes the write lock up front and only inserts when the post exists.
        let inserted = sqlx::query(
            "INSERT INTO comments (post_id, user_name, text, created_at)
             SELECT id, ?, ?, ? FROM posts WHERE id = ?
             RETURNING id",
        )
        .bind(&comment.user_name)
        .bind(&comment.text)
        .bind(comment.created_at)
        .bind(comment.post_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(inserted) = inserted else {
            return Ok(None);
        };
        let id: i64 = inserted.try_get("id")?;

        let expiration_time: NaiveDateTime = sqlx::query_scalar("SELECT expiration_time FROM posts WHERE id = ?")
            .bind(comment.post_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO interactions (post_id, user_name, kind, time_left, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(comment.post_id)
        .bind(&comment.user_name)
        .bind(InteractionKind::Comment.as_str())
        .bind((expiration_time - comment.created_at).num_seconds())
        .bind(comment.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(Comment {
            id,
            post_id: comment.post_id,
            user_name: comment.user_name,
            text: comment.text,
            created_at: comment.created_at,
        }))
    }

    async fn list_comments(&self, post_id: PostId) -> anyhow::Result<Vec<Comment>> {
        sqlx::query("SELECT * FROM comments WHERE post_id = ? ORDER BY id ASC")
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_comment)
            .collect()
    }

    async fn list_interactions(&self, post_id: PostId) -> anyhow::Result<Vec<Interaction>> {
        sqlx::query("SELECT * FROM interactions WHERE post_id = ? ORDER BY id ASC")
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_interaction)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tb_core::time::parse_timestamp;
    use tempfile::TempDir;

    async fn repo() -> SqliteForumRepo {
        SqliteForumRepo::new("sqlite::memory:", 1).await.unwrap()
    }

    fn new_post(topic: &str, expires: &str) -> NewPost {
        NewPost {
            title: "Margherita".into(),
            topic: topic.into(),
            body: "Tomato and mozzarella".into(),
            owner_name: "alice".into(),
            created_at: parse_timestamp("2024-01-01T10:00:00").unwrap(),
            expiration_time: parse_timestamp(expires).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_post() {
        let repo = repo().await;
        let created = repo.create_post(new_post("pizza", "2024-01-02T10:00:00")).await.unwrap();

        assert_eq!(created.status, PostStatus::Live);
        assert_eq!((created.likes, created.dislikes), (0, 0));

        let fetched = repo.get_post(created.id).await.unwrap().expect("post should exist");
        assert_eq!(fetched, created);
        assert!(repo.get_post(created.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_a_conflict() {
        let repo = repo().await;
        let user = User { username: "alice".into(), password: "pw".into() };
        assert!(repo.create_user(user.clone()).await.unwrap());
        assert!(!repo.create_user(user).await.unwrap());
        assert_eq!(repo.find_user("alice").await.unwrap().unwrap().password, "pw");
        assert!(repo.find_user("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expire_posts_is_inclusive_and_idempotent() {
        let repo = repo().await;
        let early = repo.create_post(new_post("pizza", "2024-01-01T12:00:00")).await.unwrap();
        let late = repo.create_post(new_post("pizza", "2024-01-03T12:00:00")).await.unwrap();

        let now = parse_timestamp("2024-01-01T12:00:00").unwrap();
        assert_eq!(repo.expire_posts(now).await.unwrap(), 1);
        assert_eq!(repo.expire_posts(now).await.unwrap(), 0);

        let expired = repo.list_posts("pizza", PostStatus::Expired).await.unwrap();
        let live = repo.list_posts("pizza", PostStatus::Live).await.unwrap();
        assert_eq!(expired.iter().map(|p| p.id).collect::<Vec<_>>(), vec![early.id]);
        assert_eq!(live.iter().map(|p| p.id).collect::<Vec<_>>(), vec![late.id]);
    }

    async fn file_repo(dir: &TempDir) -> SqliteForumRepo {
        let url = format!("sqlite:{}", dir.path().join("forum.db").display());
        SqliteForumRepo::new(&url, 5).await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_likes_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(file_repo(&dir).await);
        let post_id = repo.create_post(new_post("pizza", "2024-01-02T10:00:00")).await.unwrap().id;
        let at = parse_timestamp("2024-01-01T11:00:00").unwrap();

        let tasks: Vec<_> = (0..100)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        repo.expire_posts(at).await.unwrap();
                    }
                    repo.record_reaction(post_id, Reaction::Like, &format!("user{i}"), at)
                        .await
                        .unwrap()
                })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().is_some());
        }

        let post = repo.get_post(post_id).await.unwrap().unwrap();
        assert_eq!((post.likes, post.dislikes), (100, 0));
        assert_eq!(repo.list_interactions(post_id).await.unwrap().len(), 100);
    }

    #[tokio::test]
    async fn test_sweep_with_nothing_due_does_not_wait_for_writers() {
        let dir = TempDir::new().unwrap();
        let repo = file_repo(&dir).await;
        let post = repo.create_post(new_post("pizza", "2024-01-02T10:00:00")).await.unwrap();

        // Another connection holds the write lock for the whole check.
        let mut writer = repo.pool.begin().await.unwrap();
        sqlx::query("UPDATE posts SET likes = likes + 1 WHERE id = ?")
            .bind(post.id)
            .execute(&mut *writer)
            .await
            .unwrap();

        let now = parse_timestamp("2024-01-01T11:00:00").unwrap();
        let swept = tokio::time::timeout(Duration::from_secs(1), repo.expire_posts(now))
            .await
            .expect("sweep blocked on the writer");
        assert_eq!(swept.unwrap(), 0);
        writer.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_reaction_on_missing_post_writes_nothing() {
        let repo = repo().await;
        let at = parse_timestamp("2024-01-01T11:00:00").unwrap();
        assert!(repo.record_reaction(999, Reaction::Dislike, "bob", at).await.unwrap().is_none());
        assert!(repo.list_interactions(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comments_keep_order_and_log_time_left() {
        let repo = repo().await;
        let post = repo.create_post(new_post("pizza", "2024-01-01T11:00:00")).await.unwrap();

        for (minute, text) in [(0, "first"), (30, "second")] {
            let created_at = parse_timestamp(&format!("2024-01-01T10:{minute:02}:00")).unwrap();
            let comment = NewComment { post_id: post.id, user_name: "bob".into(), text: text.into(), created_at };
            assert!(repo.create_comment(comment).await.unwrap().is_some());
        }
        let orphan = NewComment {
            post_id: 999,
            user_name: "bob".into(),
            text: "lost".into(),
            created_at: parse_timestamp("2024-01-01T10:00:00").unwrap(),
        };
        assert!(repo.create_comment(orphan).await.unwrap().is_none());

        let comments = repo.list_comments(post.id).await.unwrap();
        assert_eq!(comments.iter().map(|c| c.text.as_str()).collect::<Vec<_>>(), vec!["first", "second"]);

        let log = repo.list_interactions(post.id).await.unwrap();
        assert_eq!(log.iter().map(|i| i.time_left).collect::<Vec<_>>(), vec![3600, 1800]);
        assert!(log.iter().all(|i| i.kind == InteractionKind::Comment));
    }
}
