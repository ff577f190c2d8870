use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod recommendation;
pub mod watch;

pub use recommendation::{RecommendationProfile, ScoredCandidate, SignalWeights};
pub use watch::{WatchStatus, WatchedEntry};

/// TMDB movie identifier
pub type MovieId = i64;
/// TMDB genre identifier
pub type GenreId = i64;
/// Identifier of a user owning a watch history
pub type UserId = i64;

const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/";
const PLACEHOLDER_IMAGE: &str = "/placeholder-movie.jpg";

/// A movie snapshot as returned by the catalog.
///
/// List endpoints (similar, recommendations, discover, search) carry `genre_ids`;
/// the details endpoint carries full genre objects instead, see [`MovieDetails`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub genre_ids: Vec<GenreId>,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub adult: bool,
}

impl Movie {
    /// A bare movie with only an id and a title set
    pub fn new(id: MovieId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            overview: String::new(),
            poster_path: None,
            backdrop_path: None,
            release_date: String::new(),
            popularity: 0.0,
            vote_average: 0.0,
            vote_count: 0,
            genre_ids: Vec::new(),
            original_language: String::new(),
            original_title: String::new(),
            adult: false,
        }
    }

    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = popularity;
        self
    }

    pub fn with_genres(mut self, genre_ids: Vec<GenreId>) -> Self {
        self.genre_ids = genre_ids;
        self
    }
}

/// Poster/backdrop sizes served by the TMDB image CDN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    #[default]
    W500,
    Original,
}

impl Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageSize::W500 => write!(f, "w500"),
            ImageSize::Original => write!(f, "original"),
        }
    }
}

/// Builds a full image URL for a TMDB image path, falling back to a placeholder
pub fn image_url(path: Option<&str>, size: ImageSize) -> String {
    match path {
        Some(path) if !path.is_empty() => format!("{}{}{}", IMAGE_BASE_URL, size, path),
        _ => PLACEHOLDER_IMAGE.to_string(),
    }
}

/// Time window for the trending list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingWindow {
    Day,
    #[default]
    Week,
}

impl Display for TrendingWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendingWindow::Day => write!(f, "day"),
            TrendingWindow::Week => write!(f, "week"),
        }
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchResults {
    pub results: Vec<Movie>,
    pub total_pages: u32,
    pub total_results: u32,
}

impl SearchResults {
    pub fn empty() -> Self {
        Self::default()
    }
}

// ============================================================================
// Movie details
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: String,
    pub author: String,
    pub author_details: ReviewAuthor,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewAuthor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar_path: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub character: String,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrewMember {
    pub id: i64,
    pub name: String,
    pub job: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// Full movie record with credits, reviews and certification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub budget: i64,
    #[serde(default)]
    pub revenue: i64,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
    #[serde(default)]
    pub age_rating: Option<String>,
}

impl From<MovieDetails> for Movie {
    /// The details endpoint has no `genre_ids`; derive them from the genre objects
    fn from(details: MovieDetails) -> Self {
        let mut movie = details.movie;
        if movie.genre_ids.is_empty() {
            movie.genre_ids = details.genres.iter().map(|g| g.id).collect();
        }
        movie
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Paged list envelope used by every TMDB list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage<T> {
    #[serde(default)]
    pub page: u32,
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

/// Response from GET /movie/{id}/credits
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

/// Response from GET /movie/{id}/release_dates
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbReleaseDates {
    #[serde(default)]
    pub results: Vec<TmdbCountryReleases>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCountryReleases {
    pub iso_3166_1: String,
    #[serde(default)]
    pub release_dates: Vec<TmdbReleaseDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbReleaseDate {
    #[serde(default)]
    pub certification: String,
}

impl TmdbReleaseDates {
    /// Picks the certification from the US release, else GB, else the first country listed
    pub fn certification(&self) -> Option<String> {
        let country = self
            .results
            .iter()
            .find(|r| r.iso_3166_1 == "US")
            .or_else(|| self.results.iter().find(|r| r.iso_3166_1 == "GB"))
            .or_else(|| self.results.first())?;

        country
            .release_dates
            .iter()
            .find(|rd| !rd.certification.is_empty())
            .map(|rd| rd.certification.clone())
    }
}
