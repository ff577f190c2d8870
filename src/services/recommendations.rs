use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{
    error::{AppError, AppResult},
    models::{
        GenreId, Movie, MovieId, RecommendationProfile, ScoredCandidate, SignalWeights, UserId,
    },
    services::{
        genres::extract_top_genres,
        providers::{with_timeout, MovieCatalog},
        watch_history::WatchHistoryStore,
    },
};

/// Signal sources queried once per recently watched movie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeededSignal {
    Similar,
    Recommendations,
}

impl SeededSignal {
    async fn fetch(self, catalog: &dyn MovieCatalog, seed: MovieId) -> AppResult<Vec<Movie>> {
        match self {
            SeededSignal::Similar => catalog.get_similar(seed).await,
            SeededSignal::Recommendations => catalog.get_recommendations(seed).await,
        }
    }
}

impl Display for SeededSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeededSignal::Similar => write!(f, "similar"),
            SeededSignal::Recommendations => write!(f, "recommendations"),
        }
    }
}

/// Candidates of a single aggregation run, keyed by movie id
///
/// Candidates live in a vector in first-discovery order; the map points from a
/// movie id to its slot so rediscovery bumps the score instead of duplicating.
struct CandidateSet<'a> {
    watched: &'a HashSet<MovieId>,
    slots: HashMap<MovieId, usize>,
    candidates: Vec<ScoredCandidate>,
}

impl<'a> CandidateSet<'a> {
    fn new(watched: &'a HashSet<MovieId>) -> Self {
        Self {
            watched,
            slots: HashMap::new(),
            candidates: Vec::new(),
        }
    }

    fn add(&mut self, movie: Movie, weight: u32) {
        if self.watched.contains(&movie.id) {
            return;
        }

        match self.slots.get(&movie.id) {
            Some(&slot) => self.candidates[slot].score += weight,
            None => {
                self.slots.insert(movie.id, self.candidates.len());
                self.candidates.push(ScoredCandidate {
                    movie,
                    score: weight,
                });
            }
        }
    }

    fn add_all(&mut self, movies: Vec<Movie>, weight: u32) {
        for movie in movies {
            self.add(movie, weight);
        }
    }

    /// Highest score first, then most popular; remaining ties keep discovery order
    fn into_ranked(mut self, limit: usize) -> Vec<Movie> {
        self.candidates.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.movie.popularity.total_cmp(&a.movie.popularity))
        });

        self.candidates
            .into_iter()
            .take(limit)
            .map(|candidate| candidate.movie)
            .collect()
    }
}

/// Outcome of recommending for a stored user
#[derive(Debug, Clone, PartialEq)]
pub enum UserRecommendations {
    /// The user has not watched anything yet
    NoHistory,
    Ranked(Vec<Movie>),
}

impl UserRecommendations {
    pub fn into_movies(self) -> Vec<Movie> {
        match self {
            UserRecommendations::NoHistory => Vec::new(),
            UserRecommendations::Ranked(movies) => movies,
        }
    }
}

/// Builds ranked recommendations from a user's watch history
///
/// Three signal sources feed one score per candidate movie:
/// 1. movies similar to each recently watched movie (`weights.similar` per hit)
/// 2. TMDB recommendations for each recently watched movie (`weights.recommendations`)
/// 3. popular movies in the user's favourite genres across the whole history (`weights.genre`)
///
/// Movies already watched are never recommended. Every upstream call is independent
/// and bounded by `upstream_timeout`; a failing call contributes nothing.
#[derive(Clone)]
pub struct RecommendationEngine {
    catalog: Arc<dyn MovieCatalog>,
    weights: SignalWeights,
    upstream_timeout: Duration,
}

impl RecommendationEngine {
    pub fn new(catalog: Arc<dyn MovieCatalog>, upstream_timeout: Duration) -> Self {
        Self {
            catalog,
            weights: SignalWeights::default(),
            upstream_timeout,
        }
    }

    pub fn with_weights(mut self, weights: SignalWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Reads the user's history and ranks recommendations for it
    ///
    /// A history read failure is the only error surfaced; catalog failures only
    /// shrink the result.
    pub async fn recommend_for_user(
        &self,
        history: &dyn WatchHistoryStore,
        user_id: UserId,
        profile: &RecommendationProfile,
    ) -> AppResult<UserRecommendations> {
        let watched = history.list_watched(user_id).await.map_err(|e| {
            tracing::error!(user_id, error = %e, "Failed to read watch history");
            AppError::HistoryStore(e.to_string())
        })?;

        if watched.is_empty() {
            return Ok(UserRecommendations::NoHistory);
        }

        Ok(UserRecommendations::Ranked(
            self.recommend(&watched, profile).await,
        ))
    }

    /// Ranks recommendations for a history ordered most recent first
    ///
    /// An empty history yields no recommendations and makes no catalog calls.
    pub async fn recommend(
        &self,
        watch_history: &[MovieId],
        profile: &RecommendationProfile,
    ) -> Vec<Movie> {
        if watch_history.is_empty() {
            return Vec::new();
        }

        let start = Instant::now();
        let watched: HashSet<MovieId> = watch_history.iter().copied().collect();
        let recent: Vec<MovieId> = watch_history
            .iter()
            .take(profile.recent_count)
            .copied()
            .collect();

        let (similar, recommended, by_genre) = tokio::join!(
            self.fan_out(SeededSignal::Similar, &recent),
            self.fan_out(SeededSignal::Recommendations, &recent),
            self.genre_discovery(watch_history, profile.top_genres),
        );

        // Merge order is fixed so equal-score ties resolve the same way every run
        let mut candidates = CandidateSet::new(&watched);
        candidates.add_all(similar, self.weights.similar);
        candidates.add_all(recommended, self.weights.recommendations);
        candidates.add_all(by_genre, self.weights.genre);

        let candidate_count = candidates.candidates.len();
        let ranked = candidates.into_ranked(profile.limit);

        tracing::info!(
            history = watch_history.len(),
            seeds = recent.len(),
            candidates = candidate_count,
            returned = ranked.len(),
            processing_time_ms = start.elapsed().as_millis(),
            "Recommendations ranked"
        );

        ranked
    }

    /// Queries one seeded signal source for every seed concurrently
    ///
    /// Results are concatenated in seed order. Failed seeds contribute nothing.
    async fn fan_out(&self, signal: SeededSignal, seeds: &[MovieId]) -> Vec<Movie> {
        let mut tasks = Vec::new();

        for &seed in seeds {
            let catalog = Arc::clone(&self.catalog);
            let timeout = self.upstream_timeout;
            let task = tokio::spawn(async move {
                with_timeout(timeout, signal.fetch(catalog.as_ref(), seed)).await
            });
            tasks.push((seed, task));
        }

        let mut movies = Vec::new();
        for (seed, task) in tasks {
            match task.await {
                Ok(Ok(found)) => movies.extend(found),
                Ok(Err(e)) => {
                    tracing::warn!(
                        signal = %signal,
                        seed,
                        error = %e,
                        "Signal source failed, contributing no candidates"
                    );
                }
                Err(e) => {
                    tracing::error!(signal = %signal, seed, error = %e, "Task join error");
                }
            }
        }

        movies
    }

    /// Popular movies in the favourite genres of the full history
    ///
    /// Skipped when the history's movie details cannot be fetched or carry no genres.
    async fn genre_discovery(&self, watch_history: &[MovieId], top_genres: usize) -> Vec<Movie> {
        let genres = self.favourite_genres(watch_history, top_genres).await;
        if genres.is_empty() {
            return Vec::new();
        }

        match with_timeout(
            self.upstream_timeout,
            self.catalog.discover_by_genres(genres.clone()),
        )
        .await
        {
            Ok(movies) => movies,
            Err(e) => {
                tracing::warn!(
                    signal = "genre",
                    genres = ?genres,
                    error = %e,
                    "Signal source failed, contributing no candidates"
                );
                Vec::new()
            }
        }
    }

    async fn favourite_genres(&self, watch_history: &[MovieId], limit: usize) -> Vec<GenreId> {
        if limit == 0 {
            return Vec::new();
        }

        // Deadlines apply per lookup
        match self
            .catalog
            .get_movies_by_ids(watch_history.to_vec(), self.upstream_timeout)
            .await
        {
            Ok(movies) => extract_top_genres(&movies, limit),
            Err(e) => {
                tracing::warn!(error = %e, "Watched movie details unavailable, skipping genre analysis");
                Vec::new()
            }
        }
    }
}
