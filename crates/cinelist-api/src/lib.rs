//! API client library for cinelist.
//!
//! Provides the movie catalog client, its response types and the
//! error taxonomy shared with the loader layer.

/// Movie catalog API client.
pub mod catalog;
