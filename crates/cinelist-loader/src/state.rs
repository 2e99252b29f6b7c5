//! Pagination and retry state machine for one category.

use std::time::Duration;

use cinelist_api::catalog::{CatalogError, Category, Movie, MoviePage};

use super::policy::RetryPolicy;

/// Coarse phase of a loader, derived from its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Nothing requested yet.
    Idle,
    /// A request is in flight.
    Loading,
    /// A transient failure occurred; an automatic retry is pending.
    Retrying,
    /// The last request succeeded.
    Success,
    /// The last request failed terminally.
    Failed,
}

/// Observable state of a loader, as published to consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderSnapshot {
    /// Category this loader serves.
    pub category: Category,
    /// Items accumulated across pages, in arrival order.
    pub items: Vec<Movie>,
    /// Derived phase.
    pub phase: LoadPhase,
    /// A request is in flight.
    pub is_loading: bool,
    /// The last request failed terminally.
    pub has_error: bool,
    /// Human-readable message for the terminal error.
    pub error_message: Option<String>,
    /// An automatic retry is pending or in flight.
    pub is_retrying: bool,
    /// Automatic retries spent on the current page request.
    pub retry_count: u32,
    /// Last page successfully loaded (1 before any load).
    pub current_page: u32,
    /// Total pages reported by the catalog (1 before any load).
    pub total_pages: u32,
}

/// An automatic retry the driver must schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledRetry {
    /// Page to request again.
    pub page: u32,
    /// Backoff before the request.
    pub delay: Duration,
    /// Retry attempt number (1-based).
    pub attempt: u32,
}

/// Pagination and retry state of one category.
///
/// Every transition is synchronous. The caller performs the actual fetch
/// whenever a `begin_*` method returns a page, and reports the outcome with
/// [`complete`](Self::complete) or [`fail`](Self::fail).
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct LoaderState {
    category: Category,
    policy: RetryPolicy,
    items: Vec<Movie>,
    current_page: u32,
    total_pages: u32,
    is_loading: bool,
    is_retrying: bool,
    retry_count: u32,
    error: Option<CatalogError>,
    has_loaded: bool,
}

impl LoaderState {
    /// Creates an idle state with no items.
    #[must_use]
    pub const fn new(category: Category, policy: RetryPolicy) -> Self {
        Self {
            category,
            policy,
            items: Vec::new(),
            current_page: 1,
            total_pages: 1,
            is_loading: false,
            is_retrying: false,
            retry_count: 0,
            error: None,
            has_loaded: false,
        }
    }

    /// Category this state belongs to.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Items accumulated so far.
    #[must_use]
    pub fn items(&self) -> &[Movie] {
        &self.items
    }

    /// Last page successfully loaded.
    #[must_use]
    pub const fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Total pages reported by the catalog.
    #[must_use]
    pub const fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// A request is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// An automatic retry is pending or in flight.
    #[must_use]
    pub const fn is_retrying(&self) -> bool {
        self.is_retrying
    }

    /// Automatic retries spent on the current page request.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Terminal error of the last request, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&CatalogError> {
        self.error.as_ref()
    }

    /// Derived phase.
    #[must_use]
    pub const fn phase(&self) -> LoadPhase {
        if self.is_loading {
            LoadPhase::Loading
        } else if self.is_retrying {
            LoadPhase::Retrying
        } else if self.error.is_some() {
            LoadPhase::Failed
        } else if self.has_loaded {
            LoadPhase::Success
        } else {
            LoadPhase::Idle
        }
    }

    /// Marks `page` as in flight.
    ///
    /// Returns `false` without changing anything if a request is already in
    /// flight. Clears any previous terminal error.
    pub fn begin_page(&mut self, page: u32) -> bool {
        if self.is_loading {
            return false;
        }
        self.is_loading = true;
        self.error = None;
        tracing::debug!(category = %self.category, page, "page request started");
        true
    }

    /// Page the next `load_more` would request, if one is allowed now.
    ///
    /// `None` while loading, while a retry is pending, or on the last page.
    #[must_use]
    pub fn next_page(&self) -> Option<u32> {
        if self.is_loading || self.is_retrying || self.current_page >= self.total_pages {
            return None;
        }
        self.current_page.checked_add(1)
    }

    /// Starts the next page if allowed. Returns the page to fetch.
    pub fn begin_load_more(&mut self) -> Option<u32> {
        let page = self.next_page()?;
        self.begin_page(page).then_some(page)
    }

    /// Forgets the in-flight request after the driver dropped it.
    ///
    /// Its response will never be reported, so the loading flag is cleared
    /// to let a replacement request start.
    pub fn abandon_request(&mut self) {
        if self.is_loading {
            tracing::debug!(category = %self.category, "in-flight request abandoned");
        }
        self.is_loading = false;
    }

    /// Resets pagination and retry bookkeeping, then starts page 1.
    ///
    /// Returns `false` if a request was already in flight; the reset still
    /// applies.
    pub fn begin_refresh(&mut self) -> bool {
        self.current_page = 1;
        self.retry_count = 0;
        self.is_retrying = false;
        self.error = None;
        self.begin_page(1)
    }

    /// Clears the terminal error and retry counter, then refreshes.
    pub fn begin_retry(&mut self) -> bool {
        self.error = None;
        self.retry_count = 0;
        self.begin_refresh()
    }

    /// Re-issues `page` after a scheduled backoff elapsed.
    ///
    /// Returns `false` if the retry is stale (a refresh cleared it) or a
    /// request is already in flight.
    pub fn resume_retry(&mut self, page: u32) -> bool {
        if !self.is_retrying {
            return false;
        }
        self.begin_page(page)
    }

    /// Applies a successful response for `page`.
    ///
    /// Page 1 replaces the items; any other page appends. Items are not
    /// deduplicated by id.
    pub fn complete(&mut self, page: u32, envelope: MoviePage) {
        self.is_loading = false;
        self.is_retrying = false;
        self.retry_count = 0;
        self.error = None;
        self.has_loaded = true;

        let fetched = envelope.results.len();
        if page == 1 {
            self.items = envelope.results;
        } else {
            self.items.extend(envelope.results);
        }
        self.current_page = envelope.page;
        self.total_pages = envelope.total_pages;

        tracing::debug!(
            category = %self.category,
            page,
            fetched,
            total_items = self.items.len(),
            total_pages = self.total_pages,
            "page request completed"
        );
    }

    /// Applies a failed response for `page`.
    ///
    /// Returns the retry to schedule when the error is transient and the
    /// budget is not exhausted; otherwise records a terminal error.
    pub fn fail(&mut self, page: u32, error: CatalogError) -> Option<ScheduledRetry> {
        self.is_loading = false;

        if let Some(delay) = self.policy.backoff_for(&error)
            && self.retry_count < self.policy.max_retries
        {
            self.retry_count = self.retry_count.saturating_add(1);
            self.is_retrying = true;
            tracing::warn!(
                category = %self.category,
                page,
                retry = self.retry_count,
                max_retries = self.policy.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "transient catalog failure, retry scheduled"
            );
            return Some(ScheduledRetry {
                page,
                delay,
                attempt: self.retry_count,
            });
        }

        tracing::warn!(
            category = %self.category,
            page,
            retries = self.retry_count,
            error = %error,
            "catalog request failed"
        );
        self.is_retrying = false;
        self.error = Some(error);
        None
    }

    /// Builds the consumer-facing snapshot.
    #[must_use]
    pub fn snapshot(&self) -> LoaderSnapshot {
        LoaderSnapshot {
            category: self.category,
            items: self.items.clone(),
            phase: self.phase(),
            is_loading: self.is_loading,
            has_error: self.error.is_some(),
            error_message: self.error.as_ref().map(ToString::to_string),
            is_retrying: self.is_retrying,
            retry_count: self.retry_count,
            current_page: self.current_page,
            total_pages: self.total_pages,
        }
    }
}
