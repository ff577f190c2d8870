use serde::{Deserialize, Serialize};

use super::Movie;

/// Knobs for one recommendation context (home feed vs. dedicated page)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationProfile {
    /// How many of the most recently watched movies seed the similar/recommended queries
    pub recent_count: usize,
    /// Maximum number of movies returned
    pub limit: usize,
    /// How many favourite genres feed genre discovery
    pub top_genres: usize,
}

impl RecommendationProfile {
    /// Short list shown next to trending/popular on the home feed
    pub fn home() -> Self {
        Self {
            recent_count: 3,
            limit: 7,
            top_genres: 3,
        }
    }

    /// Longer list for the recommendations page
    pub fn page() -> Self {
        Self {
            recent_count: 5,
            limit: 20,
            top_genres: 3,
        }
    }
}

/// Score added each time a movie is returned by a signal source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalWeights {
    pub similar: u32,
    pub recommendations: u32,
    pub genre: u32,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            similar: 3,
            recommendations: 2,
            genre: 1,
        }
    }
}

/// A candidate movie and the score accumulated over one aggregation run
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub movie: Movie,
    pub score: u32,
}
