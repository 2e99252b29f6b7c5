//! Home feed: one independent loader per home-screen category.

use std::sync::Arc;

use cinelist_api::catalog::{CatalogApi, Category};
use futures::future::{join_all, try_join_all};

use super::loader::{CategoryLoader, LoaderError};
use super::policy::RetryPolicy;
use super::state::LoaderSnapshot;

/// Categories shown on the home screen, in display order.
pub const HOME_CATEGORIES: [Category; 3] =
    [Category::NowPlaying, Category::Upcoming, Category::TopRated];

/// A set of category loaders sharing one catalog client.
///
/// Loaders share nothing but the client: a failure or retry in one
/// category never changes another's state.
#[derive(Debug)]
pub struct HomeFeed {
    loaders: Vec<CategoryLoader>,
}

impl HomeFeed {
    /// Spawns loaders for [`HOME_CATEGORIES`].
    #[must_use]
    pub fn spawn<A>(api: Arc<A>, policy: RetryPolicy) -> Self
    where
        A: CatalogApi + Sync + 'static,
    {
        Self::with_categories(api, &HOME_CATEGORIES, policy)
    }

    /// Spawns one loader per category in `categories`.
    #[must_use]
    pub fn with_categories<A>(api: Arc<A>, categories: &[Category], policy: RetryPolicy) -> Self
    where
        A: CatalogApi + Sync + 'static,
    {
        let loaders = categories
            .iter()
            .map(|&category| CategoryLoader::spawn(Arc::clone(&api), category, policy))
            .collect();
        Self { loaders }
    }

    /// Loader for `category`, if the feed has one.
    #[must_use]
    pub fn loader(&self, category: Category) -> Option<&CategoryLoader> {
        self.loaders.iter().find(|l| l.category() == category)
    }

    /// All loaders, in feed order.
    #[must_use]
    pub fn loaders(&self) -> &[CategoryLoader] {
        &self.loaders
    }

    /// Issues `load_initial` on every loader concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Closed`] if any loader task is gone.
    pub async fn load_all(&self) -> Result<Vec<bool>, LoaderError> {
        tracing::debug!(loaders = self.loaders.len(), "loading home feed");
        try_join_all(self.loaders.iter().map(CategoryLoader::load_initial)).await
    }

    /// Waits for every loader to settle and returns their snapshots in
    /// feed order.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Closed`] if any loader task is gone.
    pub async fn wait_until_settled(&self) -> Result<Vec<LoaderSnapshot>, LoaderError> {
        join_all(self.loaders.iter().map(CategoryLoader::wait_until_settled))
            .await
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::time::Duration;

    use cinelist_api::catalog::CatalogError;

    use super::*;
    use crate::state::LoadPhase;
    use crate::test_support::{ScriptedCatalog, page_of};

    #[tokio::test(start_paused = true)]
    async fn test_spawn_covers_home_categories() {
        // Arrange
        let catalog = Arc::new(ScriptedCatalog::default());

        // Act
        let feed = HomeFeed::spawn(catalog, RetryPolicy::default());

        // Assert
        let categories: Vec<Category> = feed.loaders().iter().map(CategoryLoader::category).collect();
        assert_eq!(categories, HOME_CATEGORIES.to_vec());
        assert!(feed.loader(Category::Popular).is_none());
        assert!(feed.loader(Category::Upcoming).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_in_one_category_does_not_affect_others() {
        // Arrange
        let catalog = Arc::new(
            ScriptedCatalog::with_latency(Duration::from_millis(50))
                .script(Category::NowPlaying, vec![Ok(page_of(1, &[1, 2], 3))])
                .script(Category::Upcoming, vec![Err(CatalogError::RateLimited)])
                .script(Category::TopRated, vec![Ok(page_of(1, &[10], 1))]),
        );
        let feed = HomeFeed::spawn(Arc::clone(&catalog), RetryPolicy::default());

        // Act
        let started = feed.load_all().await.unwrap();
        let snapshots = feed.wait_until_settled().await.unwrap();

        // Assert
        assert_eq!(started, vec![true, true, true]);
        let phases: Vec<LoadPhase> = snapshots.iter().map(|s| s.phase).collect();
        assert_eq!(
            phases,
            vec![LoadPhase::Success, LoadPhase::Failed, LoadPhase::Success]
        );
        assert_eq!(snapshots[0].items.len(), 2);
        assert!(snapshots[1].items.is_empty());
        assert_eq!(snapshots[2].items.len(), 1);
        assert_eq!(catalog.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrying_category_does_not_block_others() {
        // Arrange
        let catalog = Arc::new(
            ScriptedCatalog::with_latency(Duration::from_millis(50))
                .script(
                    Category::NowPlaying,
                    vec![Err(CatalogError::ConnectionLost), Ok(page_of(1, &[1], 1))],
                )
                .script(Category::TopRated, vec![Ok(page_of(1, &[10], 1))]),
        );
        let feed = HomeFeed::with_categories(
            Arc::clone(&catalog),
            &[Category::NowPlaying, Category::TopRated],
            RetryPolicy::default(),
        );

        // Act
        feed.load_all().await.unwrap();
        let now_playing = feed.loader(Category::NowPlaying).unwrap();
        let mut rx = now_playing.subscribe();
        rx.wait_for(|s| s.is_retrying && !s.is_loading).await.unwrap();
        let top_rated = feed
            .loader(Category::TopRated)
            .unwrap()
            .wait_until_settled()
            .await
            .unwrap();

        // Assert
        assert_eq!(top_rated.phase, LoadPhase::Success);
        assert!(now_playing.snapshot().is_retrying);
    }
}
