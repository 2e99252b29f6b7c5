//! Catalog API response types and listing categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ParseCategoryError;

/// Base URL for poster images (w500).
const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Base URL for backdrop images (w1280).
const BACKDROP_BASE_URL: &str = "https://image.tmdb.org/t/p/w1280";

// --- Category ---

/// Movie listing bucket served by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Movies currently in theaters.
    NowPlaying,
    /// Most popular movies.
    Popular,
    /// Highest rated movies.
    TopRated,
    /// Movies about to be released.
    Upcoming,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Self; 4] = [Self::NowPlaying, Self::Popular, Self::TopRated, Self::Upcoming];

    /// Path segment used by the listing endpoint.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NowPlaying => "now_playing",
            Self::Popular => "popular",
            Self::TopRated => "top_rated",
            Self::Upcoming => "upcoming",
        }
    }

    /// Human readable section title.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::NowPlaying => "Now Playing",
            Self::Popular => "Popular",
            Self::TopRated => "Top Rated",
            Self::Upcoming => "Upcoming",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| ParseCategoryError(String::from(s)))
    }
}

// --- Movie ---

/// A single movie as returned by listing and detail endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Movie {
    /// Catalog movie ID.
    pub id: u64,
    /// Localized title.
    pub title: String,
    /// Synopsis.
    pub overview: String,
    /// Poster image path.
    pub poster_path: Option<String>,
    /// Backdrop image path.
    pub backdrop_path: Option<String>,
    /// Release date (YYYY-MM-DD, may be empty).
    pub release_date: String,
    /// Vote average (0-10).
    pub vote_average: f64,
    /// Vote count.
    pub vote_count: u32,
    /// Adult flag.
    pub adult: bool,
    /// Genre IDs.
    pub genre_ids: Vec<u32>,
}

impl Movie {
    /// Absolute poster URL, if the movie has a poster.
    #[must_use]
    pub fn poster_url(&self) -> Option<String> {
        self.poster_path
            .as_deref()
            .map(|path| format!("{POSTER_BASE_URL}{path}"))
    }

    /// Absolute backdrop URL, if the movie has a backdrop.
    #[must_use]
    pub fn backdrop_url(&self) -> Option<String> {
        self.backdrop_path
            .as_deref()
            .map(|path| format!("{BACKDROP_BASE_URL}{path}"))
    }
}

// --- Page Envelope ---

/// One page of listing results plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MoviePage {
    /// Current page number (1-based).
    pub page: u32,
    /// Movies on this page, in server order.
    pub results: Vec<Movie>,
    /// Total number of pages.
    pub total_pages: u32,
    /// Total number of results.
    pub total_results: u32,
}
