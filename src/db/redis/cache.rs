use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use std::fmt::Display;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::AppError;
use crate::error::AppResult;
use crate::models::{GenreId, MovieId, TrendingWindow};

/// Typed keys for cached catalog responses
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Movie(MovieId),
    MovieDetails(MovieId),
    Similar(MovieId),
    Recommendations(MovieId),
    Discover(Vec<GenreId>),
    Search { query: String, page: u32 },
    Trending(TrendingWindow),
    Popular(u32),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Movie(id) => write!(f, "movie:{}", id),
            CacheKey::MovieDetails(id) => write!(f, "details:{}", id),
            CacheKey::Similar(id) => write!(f, "similar:{}", id),
            CacheKey::Recommendations(id) => write!(f, "recs:{}", id),
            CacheKey::Discover(genres) => {
                let joined = genres
                    .iter()
                    .map(|g| g.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "discover:{}", joined)
            }
            CacheKey::Search { query, page } => {
                write!(f, "search:{}:{}", page, query.trim().to_lowercase())
            }
            CacheKey::Trending(window) => write!(f, "trending:{}", window),
            CacheKey::Popular(page) => write!(f, "popular:{}", page),
        }
    }
}

/// Opens a Redis client; no connection is made until the first cache operation
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// A serialized value waiting to be written
struct PendingWrite {
    key: String,
    value: String,
    ttl: u64,
}

/// Read side of the catalog cache plus a queue into the background writer
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<PendingWrite>,
}

/// Stops the background writer once every queued write has been attempted
pub struct CacheWriterHandle {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task panicked");
        }
    }
}

/// Owns the writer's Redis connection, reopening it after a failed write
struct CacheWriter {
    client: Client,
    conn: Option<MultiplexedConnection>,
}

impl CacheWriter {
    async fn write(&mut self, pending: PendingWrite) -> AppResult<()> {
        let mut conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.client.get_multiplexed_async_connection().await?,
        };

        let _: () = conn.set_ex(&pending.key, pending.value, pending.ttl).await?;
        self.conn = Some(conn);

        tracing::debug!(key = %pending.key, ttl = pending.ttl, "Cache write stored");
        Ok(())
    }

    async fn run(
        mut self,
        mut write_rx: mpsc::UnboundedReceiver<PendingWrite>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                Some(pending) = write_rx.recv() => {
                    if let Err(e) = self.write(pending).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = &mut shutdown_rx => break,
            }
        }

        write_rx.close();
        let mut flushed = 0usize;
        let mut failed = 0usize;
        while let Some(pending) = write_rx.recv().await {
            match self.write(pending).await {
                Ok(()) => flushed += 1,
                Err(_) => failed += 1,
            }
        }

        tracing::info!(flushed, failed, "Cache writer stopped");
    }
}

impl Cache {
    /// Creates the cache and spawns its writer; must be called inside a Tokio runtime
    ///
    /// Writes go through a channel so caching never adds latency to a response.
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let writer = CacheWriter {
            client: redis_client.clone(),
            conn: None,
        };
        let task = tokio::spawn(writer.run(write_rx, shutdown_rx));

        let cache = Self {
            redis_client,
            write_tx,
        };

        (cache, CacheWriterHandle { shutdown_tx, task })
    }

    /// Retrieves and deserializes a cached value, `None` when the key is absent
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Queues a value for a background write and returns immediately
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let pending = PendingWrite {
            key: key.to_string(),
            value: json,
            ttl,
        };

        if self.write_tx.send(pending).is_err() {
            tracing::warn!(key = %key, "Cache writer stopped, dropping write");
        }
    }
}
