//! Shared fixtures and a scripted catalog for loader tests.
#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use cinelist_api::catalog::{CatalogApi, CatalogError, Category, Movie, MoviePage};

/// Scripted response for one fetch.
pub type Scripted = Result<MoviePage, CatalogError>;

/// Builds a minimal movie with the given ID.
pub fn movie(id: u64) -> Movie {
    Movie {
        id,
        title: format!("Movie {id}"),
        overview: String::new(),
        poster_path: None,
        backdrop_path: None,
        release_date: String::from("2024-01-01"),
        vote_average: 7.5,
        vote_count: 100,
        adult: false,
        genre_ids: vec![18],
    }
}

/// Builds a page envelope holding movies with the given IDs.
pub fn page_of(page: u32, ids: &[u64], total_pages: u32) -> MoviePage {
    let results: Vec<Movie> = ids.iter().copied().map(movie).collect();
    MoviePage {
        page,
        total_results: u32::try_from(results.len()).unwrap(),
        results,
        total_pages,
    }
}

/// Catalog that replays scripted responses per category, in order.
///
/// Each fetch optionally sleeps first so tests can observe in-flight state.
/// Unscripted fetches fail with `NoData`.
#[derive(Debug, Default)]
pub struct ScriptedCatalog {
    scripts: Mutex<HashMap<Category, VecDeque<Scripted>>>,
    requested: Mutex<Vec<(Category, u32)>>,
    calls: AtomicU32,
    latency: Duration,
}

impl ScriptedCatalog {
    /// Creates an empty catalog that answers after `latency`.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Queues responses for `category`.
    pub fn script(self, category: Category, responses: Vec<Scripted>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(category)
            .or_default()
            .extend(responses);
        self
    }

    /// Number of `fetch_page` calls so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Pages requested so far, in order.
    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested
            .lock()
            .unwrap()
            .iter()
            .map(|(_, page)| *page)
            .collect()
    }
}

impl CatalogApi for ScriptedCatalog {
    async fn fetch_page(&self, category: Category, page: u32) -> Result<MoviePage, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push((category, page));
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&category)
            .and_then(VecDeque::pop_front);
        next.unwrap_or(Err(CatalogError::NoData))
    }

    async fn fetch_detail(&self, _id: u64) -> Result<Movie, CatalogError> {
        Err(CatalogError::NoData)
    }
}
