use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{MovieId, UserId, WatchStatus, WatchedEntry},
};

/// Per-user record of watched movies
///
/// Marking and unmarking are idempotent single-row writes. Listings are ordered
/// most recently watched first; the recommendation engine seeds its queries
/// from the head of that list.
#[async_trait::async_trait]
pub trait WatchHistoryStore: Send + Sync {
    /// Record that `user_id` watched `movie_id`; marking twice keeps the first timestamp
    async fn mark_watched(&self, user_id: UserId, movie_id: MovieId) -> AppResult<()>;

    /// Forget a watched movie; a no-op when it was never marked
    async fn unmark(&self, user_id: UserId, movie_id: MovieId) -> AppResult<()>;

    /// Watched entries, most recent first
    async fn list_entries(&self, user_id: UserId) -> AppResult<Vec<WatchedEntry>>;

    async fn watch_status(&self, user_id: UserId, movie_id: MovieId) -> AppResult<WatchStatus>;

    /// Watched movie ids, most recent first
    async fn list_watched(&self, user_id: UserId) -> AppResult<Vec<MovieId>> {
        let entries = self.list_entries(user_id).await?;
        Ok(entries.into_iter().map(|entry| entry.movie_id).collect())
    }
}

/// Watch history backed by the `watched_movies` Postgres table
///
/// Rows with the same `watched_at` list the later insert first, matching
/// [`InMemoryWatchHistory`].
#[derive(Clone)]
pub struct PgWatchHistory {
    pool: PgPool,
}

impl PgWatchHistory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl WatchHistoryStore for PgWatchHistory {
    async fn mark_watched(&self, user_id: UserId, movie_id: MovieId) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO watched_movies (user_id, movie_id, watched_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id, movie_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            user_id,
            movie_id,
            inserted = result.rows_affected(),
            "Marked movie as watched"
        );

        Ok(())
    }

    async fn unmark(&self, user_id: UserId, movie_id: MovieId) -> AppResult<()> {
        sqlx::query("DELETE FROM watched_movies WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_entries(&self, user_id: UserId) -> AppResult<Vec<WatchedEntry>> {
        let entries = sqlx::query_as::<_, WatchedEntry>(
            r#"
            SELECT user_id, movie_id, watched_at
            FROM watched_movies
            WHERE user_id = $1
            ORDER BY watched_at DESC, seq DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn watch_status(&self, user_id: UserId, movie_id: MovieId) -> AppResult<WatchStatus> {
        let entry = sqlx::query_as::<_, WatchedEntry>(
            r#"
            SELECT user_id, movie_id, watched_at
            FROM watched_movies
            WHERE user_id = $1 AND movie_id = $2
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry.into())
    }

    async fn list_watched(&self, user_id: UserId) -> AppResult<Vec<MovieId>> {
        let ids = sqlx::query_scalar::<_, MovieId>(
            r#"
            SELECT movie_id
            FROM watched_movies
            WHERE user_id = $1
            ORDER BY watched_at DESC, seq DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}

/// Process-local watch history, used when no database is configured and in tests
#[derive(Default)]
pub struct InMemoryWatchHistory {
    entries: RwLock<HashMap<UserId, Vec<WatchedEntry>>>,
}

impl InMemoryWatchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a movie with an explicit timestamp
    pub async fn mark_watched_at(&self, user_id: UserId, movie_id: MovieId, at: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        let user_entries = entries.entry(user_id).or_default();

        if user_entries.iter().any(|entry| entry.movie_id == movie_id) {
            return;
        }

        user_entries.push(WatchedEntry {
            user_id,
            movie_id,
            watched_at: at,
        });
    }
}

#[async_trait::async_trait]
impl WatchHistoryStore for InMemoryWatchHistory {
    async fn mark_watched(&self, user_id: UserId, movie_id: MovieId) -> AppResult<()> {
        self.mark_watched_at(user_id, movie_id, Utc::now()).await;
        Ok(())
    }

    async fn unmark(&self, user_id: UserId, movie_id: MovieId) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        if let Some(user_entries) = entries.get_mut(&user_id) {
            user_entries.retain(|entry| entry.movie_id != movie_id);
        }
        Ok(())
    }

    async fn list_entries(&self, user_id: UserId) -> AppResult<Vec<WatchedEntry>> {
        let entries = self.entries.read().await;
        let mut listed: Vec<WatchedEntry> = entries
            .get(&user_id)
            .map(|user_entries| user_entries.iter().rev().cloned().collect())
            .unwrap_or_default();

        // Newest insert first among equal timestamps
        listed.sort_by(|a, b| b.watched_at.cmp(&a.watched_at));
        Ok(listed)
    }

    async fn watch_status(&self, user_id: UserId, movie_id: MovieId) -> AppResult<WatchStatus> {
        let entries = self.entries.read().await;
        let entry = entries
            .get(&user_id)
            .and_then(|user_entries| user_entries.iter().find(|e| e.movie_id == movie_id))
            .cloned();
        Ok(entry.into())
    }
}
