//! In-memory cache of fetched image file bytes.
//!
//! The file endpoint is deterministic and cacheable, so the viewer can keep
//! recently shown images around and warm the focused item's neighbors ahead
//! of a next/previous move. Eviction is LRU by entry count.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::api::source::ImageSource;
use crate::api::types::ImageId;
use crate::error::SourceError;
use crate::gallery::collection::Gallery;

/// Default capacity of the cache (number of entries).
const DEFAULT_CACHE_ENTRIES: usize = 64;

/// LRU cache of raw file bytes keyed by image id.
pub struct FileCache {
    source: Arc<dyn ImageSource>,
    cache: Mutex<LruCache<ImageId, Arc<Vec<u8>>>>,
}

impl FileCache {
    pub fn new(source: Arc<dyn ImageSource>) -> Self {
        Self::with_capacity(
            source,
            NonZeroUsize::new(DEFAULT_CACHE_ENTRIES).unwrap(),
        )
    }

    pub fn with_capacity(source: Arc<dyn ImageSource>, capacity: NonZeroUsize) -> Self {
        Self {
            source,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the file bytes for an image, fetching on a cache miss.
    pub async fn fetch(&self, id: &ImageId) -> Result<Arc<Vec<u8>>, SourceError> {
        if let Some(hit) = self.cache.lock().get(id).cloned() {
            trace!(%id, "file cache hit");
            return Ok(hit);
        }
        debug!(%id, "file cache miss");
        let bytes = Arc::new(self.source.fetch_file(id).await?);
        self.cache.lock().put(id.clone(), Arc::clone(&bytes));
        Ok(bytes)
    }

    /// Warms the cache with the neighbors of the given record, so the next
    /// viewer move renders without a round-trip. Individual failures are
    /// logged and skipped. Returns how many neighbors were fetched.
    pub async fn warm_neighbors(&self, gallery: &Gallery, id: &ImageId) -> usize {
        let Some(index) = gallery.index_of(id) else {
            return 0;
        };

        let mut targets = Vec::with_capacity(2);
        if index > 0 {
            if let Some(previous) = gallery.get(index - 1) {
                targets.push(previous.id);
            }
        }
        if let Some(next) = gallery.get(index + 1) {
            targets.push(next.id);
        }

        let mut warmed = 0;
        for target in targets {
            if self.cache.lock().contains(&target) {
                continue;
            }
            match self.fetch(&target).await {
                Ok(_) => warmed += 1,
                Err(err) => warn!(id = %target, %err, "neighbor prefetch failed"),
            }
        }
        warmed
    }

    pub fn contains(&self, id: &ImageId) -> bool {
        self.cache.lock().contains(id)
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{record, records, FakeSource};
    use crate::gallery::collection::GalleryConfig;
    use std::sync::atomic::Ordering;

    fn cache_with_files(ids: &[usize]) -> (FileCache, Arc<FakeSource>) {
        let source = Arc::new(FakeSource::new());
        for n in ids {
            source.insert_file(record(*n).id, vec![*n as u8; 8]);
        }
        (FileCache::new(Arc::clone(&source) as Arc<dyn ImageSource>), source)
    }

    #[tokio::test]
    async fn fetch_hits_the_source_once_per_id() {
        let (cache, source) = cache_with_files(&[1]);
        let id = record(1).id;

        let first = cache.fetch(&id).await.unwrap();
        let second = cache.fetch(&id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.file_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_file_propagates_the_error() {
        let (cache, _source) = cache_with_files(&[]);
        let err = cache.fetch(&record(9).id).await.unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn warm_neighbors_fetches_both_sides_once() {
        let source = Arc::new(FakeSource::new());
        source.script_page(0, Ok(records(1..=3)));
        for n in 1..=3 {
            source.insert_file(record(n).id, vec![n as u8; 8]);
        }
        let (gallery, _events) =
            Gallery::new(Arc::clone(&source) as Arc<dyn ImageSource>, GalleryConfig::default());
        gallery.reset().await.unwrap();
        let cache = FileCache::new(Arc::clone(&source) as Arc<dyn ImageSource>);

        let warmed = cache.warm_neighbors(&gallery, &record(2).id).await;
        assert_eq!(warmed, 2);
        assert!(cache.contains(&record(1).id));
        assert!(cache.contains(&record(3).id));
        assert_eq!(source.file_calls.load(Ordering::SeqCst), 2);

        // Already warm: nothing refetched.
        assert_eq!(cache.warm_neighbors(&gallery, &record(2).id).await, 0);
        assert_eq!(source.file_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn warm_neighbors_at_the_tail_only_looks_back() {
        let source = Arc::new(FakeSource::new());
        source.script_page(0, Ok(records(1..=3)));
        for n in 1..=3 {
            source.insert_file(record(n).id, vec![n as u8; 8]);
        }
        let (gallery, _events) =
            Gallery::new(Arc::clone(&source) as Arc<dyn ImageSource>, GalleryConfig::default());
        gallery.reset().await.unwrap();
        let cache = FileCache::new(Arc::clone(&source) as Arc<dyn ImageSource>);

        assert_eq!(cache.warm_neighbors(&gallery, &record(3).id).await, 1);
        assert!(cache.contains(&record(2).id));
        assert!(!cache.contains(&record(1).id));
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let source = Arc::new(FakeSource::new());
        for n in 1..=3 {
            source.insert_file(record(n).id, vec![n as u8; 8]);
        }
        let cache = FileCache::with_capacity(
            Arc::clone(&source) as Arc<dyn ImageSource>,
            NonZeroUsize::new(2).unwrap(),
        );

        cache.fetch(&record(1).id).await.unwrap();
        cache.fetch(&record(2).id).await.unwrap();
        cache.fetch(&record(3).id).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&record(1).id));
        assert!(cache.contains(&record(2).id));
        assert!(cache.contains(&record(3).id));
    }
}
