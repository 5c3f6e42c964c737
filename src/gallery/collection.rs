//! Ordered, deduplicated collection of fetched image records.
//!
//! The `Gallery` owns the sequence a rendering layer displays:
//! - records stay in the order the remote returned them, page after page,
//!   with duplicates (by id) dropped on merge, first write wins
//! - the page cursor tracks the last successfully fetched page and only
//!   advances after a successful, non-empty fetch
//! - at most one page fetch (initial or load-more) is in flight at a time;
//!   a competing `load_next_page` is a no-op, while `reset` supersedes the
//!   outstanding fetch through a generation counter so its eventual result
//!   is discarded instead of merged out of order
//! - removals are optimistic: the record disappears locally before the
//!   remote delete resolves, and a remote failure does not reinsert it

use std::sync::Arc;

use async_channel::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::api::source::ImageSource;
use crate::api::types::{ImageId, ImageRecord};
use crate::error::{FetchPhase, GalleryError, MutationOp};

/// Records fetched per page.
pub const DEFAULT_PAGE_LEN: usize = 12;

/// Tuning for a gallery instance.
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    /// Fixed page length `L`; "more pages may exist" holds exactly when a
    /// fetch returns `L` records.
    pub page_len: usize,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            page_len: DEFAULT_PAGE_LEN,
        }
    }
}

/// Collection change notifications, in the order they were applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryEvent {
    /// A reset wiped the sequence ahead of refetching page 0.
    Cleared,
    /// A page merged into the sequence.
    PageLoaded {
        page: usize,
        appended: usize,
        has_more: bool,
    },
    /// A record was optimistically removed.
    Removed { id: ImageId },
    /// A freshly uploaded record was prepended.
    Inserted { id: ImageId },
}

/// Result of a `load_next_page` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and this many new records were appended.
    Appended(usize),
    /// Nothing was fetched: no more pages, a fetch was already in flight,
    /// or the result was superseded by a reset.
    Skipped,
}

struct GalleryState {
    records: Vec<ImageRecord>,
    /// Index of the last successfully fetched page; `None` until page 0
    /// lands, so a failed initial load retries page 0.
    cursor: Option<usize>,
    has_more: bool,
    in_flight: Option<FetchPhase>,
    /// Bumped by every reset; completions with a stale generation are
    /// discarded rather than merged.
    generation: u64,
}

/// Owner of the gallery sequence and its pagination state.
pub struct Gallery {
    source: Arc<dyn ImageSource>,
    config: GalleryConfig,
    state: Mutex<GalleryState>,
    events: Sender<GalleryEvent>,
}

impl Gallery {
    /// Creates an empty gallery and its event stream. Call [`reset`] to
    /// populate it.
    ///
    /// [`reset`]: Gallery::reset
    pub fn new(
        source: Arc<dyn ImageSource>,
        config: GalleryConfig,
    ) -> (Self, Receiver<GalleryEvent>) {
        debug_assert!(config.page_len > 0, "page length must be positive");
        let (events, receiver) = async_channel::unbounded();
        (
            Self {
                source,
                config,
                state: Mutex::new(GalleryState {
                    records: Vec::new(),
                    cursor: None,
                    has_more: true,
                    in_flight: None,
                    generation: 0,
                }),
                events,
            },
            receiver,
        )
    }

    /// Clears the sequence and fetches page 0.
    ///
    /// Any fetch still in flight is superseded: its eventual result is
    /// discarded. On failure the cleared state is kept and the error is
    /// returned with [`FetchPhase::Initial`], so callers render an error
    /// indicator rather than a stale list.
    pub async fn reset(&self) -> Result<usize, GalleryError> {
        let generation = {
            let mut st = self.state.lock();
            st.generation += 1;
            st.records.clear();
            st.cursor = None;
            st.has_more = true;
            st.in_flight = Some(FetchPhase::Initial);
            st.generation
        };
        self.emit(GalleryEvent::Cleared);
        debug!(generation, "resetting gallery");

        let fetched = self.source.fetch_page(self.config.page_len, 0).await;

        let mut st = self.state.lock();
        if st.generation != generation {
            debug!(generation, "initial fetch superseded by a newer reset");
            return Ok(0);
        }
        st.in_flight = None;
        match fetched {
            Ok(batch) => {
                let returned = batch.len();
                let appended = merge_tail(&mut st.records, batch);
                if returned > 0 {
                    st.cursor = Some(0);
                }
                st.has_more = returned == self.config.page_len;
                let event = GalleryEvent::PageLoaded {
                    page: 0,
                    appended,
                    has_more: st.has_more,
                };
                info!(appended, has_more = st.has_more, "initial page loaded");
                drop(st);
                self.emit(event);
                Ok(appended)
            }
            Err(err) => {
                drop(st);
                warn!(%err, "initial load failed");
                Err(GalleryError::fetch(FetchPhase::Initial, err))
            }
        }
    }

    /// Explicit refresh signal for mutators (e.g. the upload flow after a
    /// submission elsewhere). Equivalent to [`reset`].
    ///
    /// [`reset`]: Gallery::reset
    pub async fn invalidate(&self) -> Result<usize, GalleryError> {
        debug!("invalidate signal received");
        self.reset().await
    }

    /// Fetches the next page and appends its unseen records to the tail.
    ///
    /// A no-op ([`LoadOutcome::Skipped`]) when no more pages may exist or a
    /// fetch is already in flight in either direction. The cursor advances
    /// only after a successful, non-empty fetch; a failure leaves cursor and
    /// sequence untouched.
    pub async fn load_next_page(&self) -> Result<LoadOutcome, GalleryError> {
        let (generation, page) = {
            let mut st = self.state.lock();
            if st.in_flight.is_some() {
                debug!("page fetch already in flight");
                return Ok(LoadOutcome::Skipped);
            }
            if !st.has_more {
                debug!("no more pages to fetch");
                return Ok(LoadOutcome::Skipped);
            }
            let page = st.cursor.map_or(0, |cursor| cursor + 1);
            st.in_flight = Some(FetchPhase::More);
            (st.generation, page)
        };

        let page_len = self.config.page_len;
        let fetched = self.source.fetch_page(page_len, page * page_len).await;

        let mut st = self.state.lock();
        if st.generation != generation {
            debug!(page, "discarding page fetch superseded by a reset");
            return Ok(LoadOutcome::Skipped);
        }
        st.in_flight = None;
        match fetched {
            Ok(batch) => {
                let returned = batch.len();
                let appended = merge_tail(&mut st.records, batch);
                if returned > 0 {
                    st.cursor = Some(page);
                }
                st.has_more = returned == page_len;
                let event = GalleryEvent::PageLoaded {
                    page,
                    appended,
                    has_more: st.has_more,
                };
                debug!(page, returned, appended, "page appended");
                drop(st);
                self.emit(event);
                Ok(LoadOutcome::Appended(appended))
            }
            Err(err) => {
                drop(st);
                warn!(page, %err, "load more failed");
                Err(GalleryError::fetch(FetchPhase::More, err))
            }
        }
    }

    /// Optimistically removes the record, then issues the remote delete.
    ///
    /// The record disappears from the sequence (and a [`GalleryEvent::Removed`]
    /// fires) before the round-trip resolves. A remote failure surfaces as a
    /// [`MutationOp::Delete`] error but does not reinsert the record. The
    /// delete is issued even when the id is not present locally.
    pub async fn remove(&self, id: &ImageId) -> Result<(), GalleryError> {
        let removed = {
            let mut st = self.state.lock();
            match st.records.iter().position(|record| &record.id == id) {
                Some(index) => {
                    st.records.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            debug!(%id, "record optimistically removed");
            self.emit(GalleryEvent::Removed { id: id.clone() });
        } else {
            debug!(%id, "remove: id not in local sequence");
        }

        match self.source.delete(id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(%id, %err, "remote delete failed; local removal stands");
                Err(GalleryError::mutation(MutationOp::Delete, err))
            }
        }
    }

    /// Prepends a freshly uploaded record without touching cursor, the
    /// more-flag, or the network. Returns false when the id is already
    /// present.
    pub fn insert_most_recent(&self, record: ImageRecord) -> bool {
        let id = record.id.clone();
        {
            let mut st = self.state.lock();
            if st.records.iter().any(|existing| existing.id == id) {
                debug!(%id, "duplicate insert ignored");
                return false;
            }
            st.records.insert(0, record);
        }
        debug!(%id, "record prepended");
        self.emit(GalleryEvent::Inserted { id });
        true
    }

    /// Snapshot of the current sequence, in display order.
    pub fn records(&self) -> Vec<ImageRecord> {
        self.state.lock().records.clone()
    }

    pub fn get(&self, index: usize) -> Option<ImageRecord> {
        self.state.lock().records.get(index).cloned()
    }

    pub fn record(&self, id: &ImageId) -> Option<ImageRecord> {
        let st = self.state.lock();
        st.records.iter().find(|record| &record.id == id).cloned()
    }

    /// Live index of the record with the given id, if still present.
    pub fn index_of(&self, id: &ImageId) -> Option<usize> {
        let st = self.state.lock();
        st.records.iter().position(|record| &record.id == id)
    }

    pub fn contains(&self, id: &ImageId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().records.is_empty()
    }

    /// Whether another page may exist beyond the fetched ones.
    pub fn has_more(&self) -> bool {
        self.state.lock().has_more
    }

    /// Index of the last successfully fetched page.
    pub fn cursor(&self) -> Option<usize> {
        self.state.lock().cursor
    }

    /// True while the page-0 fetch of a reset is outstanding.
    pub fn is_loading(&self) -> bool {
        self.state.lock().in_flight == Some(FetchPhase::Initial)
    }

    /// True while a tail-append fetch is outstanding.
    pub fn is_loading_more(&self) -> bool {
        self.state.lock().in_flight == Some(FetchPhase::More)
    }

    fn emit(&self, event: GalleryEvent) {
        let _ = self.events.try_send(event);
    }
}

/// Appends records not already present, keeping first-seen order. Returns
/// how many were appended.
fn merge_tail(records: &mut Vec<ImageRecord>, batch: Vec<ImageRecord>) -> usize {
    let mut appended = 0;
    for record in batch {
        if records.iter().any(|existing| existing.id == record.id) {
            trace!(id = %record.id, "duplicate record dropped");
            continue;
        }
        records.push(record);
        appended += 1;
    }
    appended
}
