//! `CatalogApi` trait definition.
#![allow(clippy::future_not_send)]

use super::error::CatalogError;
use super::types::{Category, Movie, MoviePage};

/// Movie catalog API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
/// Implementations are single-shot: they never retry.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(CatalogApi: Send)]
pub trait LocalCatalogApi {
    /// Fetches one page of a category listing.
    ///
    /// # Errors
    ///
    /// Returns a classified [`CatalogError`] if the request cannot be built,
    /// the transport fails, the status is not 2xx, or the body does not decode.
    async fn fetch_page(&self, category: Category, page: u32) -> Result<MoviePage, CatalogError>;

    /// Fetches a single movie by ID.
    ///
    /// # Errors
    ///
    /// Same classification as [`fetch_page`](Self::fetch_page); HTTP 404 maps
    /// to [`CatalogError::NoData`].
    async fn fetch_detail(&self, id: u64) -> Result<Movie, CatalogError>;
}
