use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MovieId, UserId};

/// A single "user watched this movie" record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WatchedEntry {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub watched_at: DateTime<Utc>,
}

/// Whether a user has watched a given movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WatchStatus {
    Watched { at: DateTime<Utc> },
    NotWatched,
}

impl WatchStatus {
    pub fn is_watched(&self) -> bool {
        matches!(self, WatchStatus::Watched { .. })
    }

    pub fn watched_at(&self) -> Option<DateTime<Utc>> {
        match self {
            WatchStatus::Watched { at } => Some(*at),
            WatchStatus::NotWatched => None,
        }
    }
}

impl From<Option<WatchedEntry>> for WatchStatus {
    fn from(entry: Option<WatchedEntry>) -> Self {
        match entry {
            Some(entry) => WatchStatus::Watched {
                at: entry.watched_at,
            },
            None => WatchStatus::NotWatched,
        }
    }
}
