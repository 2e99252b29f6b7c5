//! `CategoryLoader` - async driver for [`LoaderState`].
//!
//! Each loader is one tokio task. Commands, fetch completions and retry
//! timers are all awaited in that task's `select!` loop, so the state is
//! mutated from a single timeline and never shared.

use std::future::Future;
use std::sync::Arc;

use cinelist_api::catalog::{CatalogApi, CatalogError, Category, MoviePage};
use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::policy::RetryPolicy;
use super::state::{LoaderSnapshot, LoaderState};

/// Errors returned by loader operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum LoaderError {
    /// The loader task is gone (aborted or panicked).
    #[error("loader for {0} has shut down")]
    Closed(Category),
}

/// Consumer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    LoadInitial,
    LoadMore,
    Refresh,
    Retry,
}

/// A command plus the channel that reports whether it issued a request.
#[derive(Debug)]
struct Request {
    command: Command,
    reply: oneshot::Sender<bool>,
}

/// Paginated loader for one category.
///
/// Operations return once the command has been applied (not once the
/// resulting fetch finished) and report whether a request was issued.
/// Observe progress through [`subscribe`](Self::subscribe) or
/// [`wait_until_settled`](Self::wait_until_settled).
///
/// Dropping the loader aborts its task: an in-flight request is abandoned
/// and a pending retry never fires.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct CategoryLoader {
    category: Category,
    requests: mpsc::UnboundedSender<Request>,
    snapshots: watch::Receiver<LoaderSnapshot>,
    task: JoinHandle<()>,
}

impl CategoryLoader {
    /// Spawns a loader task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn<A>(api: Arc<A>, category: Category, policy: RetryPolicy) -> Self
    where
        A: CatalogApi + Sync + 'static,
    {
        let state = LoaderState::new(category, policy);
        let (snapshot_tx, snapshots) = watch::channel(state.snapshot());
        let (requests, request_rx) = mpsc::unbounded_channel();
        let span = tracing::info_span!("loader", category = %category);
        let task = tokio::spawn(drive(api, state, request_rx, snapshot_tx).instrument(span));

        Self {
            category,
            requests,
            snapshots,
            task,
        }
    }

    /// Category this loader serves.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Loads page 1. No-op while a request is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Closed`] if the loader task is gone.
    pub async fn load_initial(&self) -> Result<bool, LoaderError> {
        self.send(Command::LoadInitial).await
    }

    /// Loads the next page.
    ///
    /// Safe to call redundantly: no-op while loading, while a retry is
    /// pending, or when the last page is already loaded.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Closed`] if the loader task is gone.
    pub async fn load_more(&self) -> Result<bool, LoaderError> {
        self.send(Command::LoadMore).await
    }

    /// Resets to page 1, cancels any pending retry and reloads.
    ///
    /// A request still in flight is abandoned; its response is never
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Closed`] if the loader task is gone.
    pub async fn refresh(&self) -> Result<bool, LoaderError> {
        self.send(Command::Refresh).await
    }

    /// Clears a terminal error and refreshes, abandoning any request still
    /// in flight.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Closed`] if the loader task is gone.
    pub async fn retry(&self) -> Result<bool, LoaderError> {
        self.send(Command::Retry).await
    }

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> LoaderSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LoaderSnapshot> {
        self.snapshots.clone()
    }

    /// Waits until nothing is in flight and no retry is pending.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Closed`] if the loader task is gone.
    pub async fn wait_until_settled(&self) -> Result<LoaderSnapshot, LoaderError> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(|s| !s.is_loading && !s.is_retrying)
            .await
            .map_err(|_| LoaderError::Closed(self.category))?;
        Ok(snapshot.clone())
    }

    async fn send(&self, command: Command) -> Result<bool, LoaderError> {
        let (reply, reply_rx) = oneshot::channel();
        self.requests
            .send(Request { command, reply })
            .map_err(|_| LoaderError::Closed(self.category))?;
        reply_rx.await.map_err(|_| LoaderError::Closed(self.category))
    }
}

impl Drop for CategoryLoader {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Outcome of a fetch, tagged with the page it was for.
type Fetched = (u32, Result<MoviePage, CatalogError>);

/// Awaits the future in `slot`, or never resolves if the slot is empty.
async fn poll_slot<F>(slot: &mut Option<F>) -> F::Output
where
    F: Future + Unpin,
{
    match slot.as_mut() {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

/// Starts fetching `page`, tagging the outcome with the page number.
fn fetch<A>(api: &A, category: Category, page: u32) -> BoxFuture<'_, Fetched>
where
    A: CatalogApi + Sync,
{
    Box::pin(async move { (page, api.fetch_page(category, page).await) })
}

/// Loader task body.
async fn drive<A>(
    api: Arc<A>,
    mut state: LoaderState,
    mut requests: mpsc::UnboundedReceiver<Request>,
    snapshots: watch::Sender<LoaderSnapshot>,
) where
    A: CatalogApi + Sync,
{
    let api: &A = &api;
    let category = state.category();

    let mut in_flight: Option<BoxFuture<'_, Fetched>> = None;
    let mut backoff: Option<BoxFuture<'static, u32>> = None;

    loop {
        tokio::select! {
            request = requests.recv() => {
                let Some(Request { command, reply }) = request else {
                    tracing::debug!("all handles dropped, loader stopping");
                    break;
                };
                let page = match command {
                    Command::LoadInitial => state.begin_page(1).then_some(1),
                    Command::LoadMore => state.begin_load_more(),
                    Command::Refresh | Command::Retry => {
                        backoff = None;
                        if in_flight.take().is_some() {
                            state.abandon_request();
                        }
                        let started = if command == Command::Retry {
                            state.begin_retry()
                        } else {
                            state.begin_refresh()
                        };
                        started.then_some(1)
                    }
                };
                if let Some(page) = page {
                    in_flight = Some(fetch(api, category, page));
                } else {
                    tracing::trace!(?command, "command dropped");
                }
                snapshots.send_replace(state.snapshot());
                // The caller may have stopped waiting for the reply.
                let _ = reply.send(page.is_some());
            }
            (page, result) = poll_slot(&mut in_flight) => {
                in_flight = None;
                match result {
                    Ok(envelope) => state.complete(page, envelope),
                    Err(error) => {
                        if let Some(retry) = state.fail(page, error) {
                            backoff = Some(Box::pin(async move {
                                tokio::time::sleep(retry.delay).await;
                                retry.page
                            }));
                        }
                    }
                }
                snapshots.send_replace(state.snapshot());
            }
            page = poll_slot(&mut backoff) => {
                backoff = None;
                if state.resume_retry(page) {
                    in_flight = Some(fetch(api, category, page));
                    snapshots.send_replace(state.snapshot());
                }
            }
        }
    }
}
