use std::sync::Arc;

use tracing::{info, warn};

use crate::dao::store::{KeyValueStore, STARS_KEY};

/// Outcome of awarding one star.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointAward {
    /// Stars after the award.
    pub count: u64,
    /// Whether the reward modal should open.
    pub celebrate: bool,
}

/// Star counter persisted through a [`KeyValueStore`].
///
/// The in-memory count is authoritative; a failed write is logged and the session
/// carries on with the new value.
pub struct RewardTracker {
    store: Arc<dyn KeyValueStore>,
    count: u64,
    every: u64,
}

impl RewardTracker {
    /// Restore the counter from `store`, starting at zero when nothing was saved.
    pub async fn load(store: Arc<dyn KeyValueStore>, every: u64) -> Self {
        let count = match store.get(STARS_KEY).await {
            Ok(Some(value)) => u64::try_from(value).unwrap_or_default(),
            Ok(None) => 0,
            Err(err) => {
                warn!(error = %err, "failed to load stars; starting from zero");
                0
            }
        };
        info!(count, "stars loaded");
        Self {
            store,
            count,
            every: every.max(1),
        }
    }

    /// Current star count.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Award one star. Every `every`-th star asks for a celebration.
    pub async fn add_point(&mut self) -> PointAward {
        self.count += 1;
        self.persist().await;
        PointAward {
            count: self.count,
            celebrate: self.count % self.every == 0,
        }
    }

    /// Zero the counter. Confirmation is the caller's job.
    pub async fn reset(&mut self) {
        self.count = 0;
        self.persist().await;
    }

    async fn persist(&self) {
        let value = i64::try_from(self.count).unwrap_or(i64::MAX);
        if let Err(err) = self.store.set(STARS_KEY, value).await {
            warn!(count = self.count, error = %err, "failed to persist stars");
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::future::BoxFuture;

    use super::*;
    use crate::dao::{
        storage::{StorageError, StorageResult},
        store::MemoryStore,
    };

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> BoxFuture<'static, StorageResult<Option<i64>>> {
            Box::pin(async {
                Err(StorageError::unavailable(
                    "disk gone".into(),
                    std::io::Error::other("eio"),
                ))
            })
        }

        fn set(&self, _key: &str, _value: i64) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async {
                Err(StorageError::unavailable(
                    "disk gone".into(),
                    std::io::Error::other("eio"),
                ))
            })
        }
    }

    #[tokio::test]
    async fn celebrates_on_the_fifth_star_only() {
        let mut tracker = RewardTracker::load(Arc::new(MemoryStore::new()), 5).await;
        let mut celebrations = Vec::new();
        for _ in 0..5 {
            let award = tracker.add_point().await;
            if award.celebrate {
                celebrations.push(award.count);
            }
        }
        assert_eq!(celebrations, [5]);
    }

    #[tokio::test]
    async fn counter_survives_reload_and_reset_persists_zero() {
        let store = Arc::new(MemoryStore::with_value(STARS_KEY, 7));
        let mut tracker = RewardTracker::load(store.clone(), 5).await;
        assert_eq!(tracker.count(), 7);

        tracker.add_point().await;
        assert_eq!(store.get(STARS_KEY).await.unwrap(), Some(8));

        tracker.reset().await;
        assert_eq!(tracker.count(), 0);
        assert_eq!(store.get(STARS_KEY).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn negative_saved_value_starts_at_zero() {
        let store = Arc::new(MemoryStore::with_value(STARS_KEY, -3));
        let tracker = RewardTracker::load(store, 5).await;
        assert_eq!(tracker.count(), 0);
    }

    #[tokio::test]
    async fn storage_failures_keep_the_in_memory_count() {
        let mut tracker = RewardTracker::load(Arc::new(BrokenStore), 5).await;
        assert_eq!(tracker.count(), 0);
        let award = tracker.add_point().await;
        assert_eq!(award.count, 1);
        assert!(!award.celebrate);
    }
}
