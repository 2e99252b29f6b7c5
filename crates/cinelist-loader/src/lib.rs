//! Paginated category loader for cinelist.
//!
//! A [`CategoryLoader`] owns the pagination and retry state of one movie
//! listing. Its transitions live in [`LoaderState`], a synchronous state
//! machine; the loader itself is a tokio task that drives the machine,
//! performs fetches through a [`CatalogApi`](cinelist_api::catalog::CatalogApi)
//! and publishes [`LoaderSnapshot`]s through a `watch` channel.

mod feed;
mod loader;
mod policy;
mod state;
mod trigger;

#[cfg(test)]
mod test_support;

pub use feed::{HOME_CATEGORIES, HomeFeed};
#[allow(clippy::module_name_repetitions)]
pub use loader::{CategoryLoader, LoaderError};
pub use policy::RetryPolicy;
#[allow(clippy::module_name_repetitions)]
pub use state::{LoadPhase, LoaderSnapshot, LoaderState, ScheduledRetry};
pub use trigger::LoadMoreTrigger;
