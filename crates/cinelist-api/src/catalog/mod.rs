//! Movie catalog API client module.
//!
//! Handles HTTP requests to the catalog's movie listing and detail
//! endpoints and classifies every failure into [`CatalogError`].

mod api;
mod client;
mod error;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{CatalogApi, LocalCatalogApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{CatalogClient, CatalogClientBuilder};
pub use error::{CatalogError, ParseCategoryError};
pub use types::{Category, Movie, MoviePage};
