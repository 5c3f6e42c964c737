//! Full-screen focus cursor over the gallery sequence.
//!
//! The navigator never caches an index: the sequence can mutate while an
//! item is focused (another agent may delete records), so every move and
//! every availability predicate resolves the focused id against the live
//! sequence. A focused id that is no longer resolvable closes the focus.
//!
//! Input listening is modeled as a scoped resource: an [`InputGrip`] is
//! acquired from the [`InputBinder`] on entering the focused state and
//! released (dropped) on every exit path, including the close triggered by
//! a concurrent deletion.

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::types::{ImageId, ImageRecord};
use crate::gallery::collection::Gallery;

/// Handle on an acquired input-listening resource; releases it on drop.
pub struct InputGrip {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl InputGrip {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A grip with nothing to release.
    pub fn noop() -> Self {
        Self { release: None }
    }
}

impl Drop for InputGrip {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Source of the input-listening resource held while an item is focused
/// (e.g. a keyboard controller in a rendering layer).
pub trait InputBinder: Send + Sync {
    fn bind(&self) -> InputGrip;
}

/// Binder for callers with no input resource to manage.
pub struct NoopBinder;

impl InputBinder for NoopBinder {
    fn bind(&self) -> InputGrip {
        InputGrip::noop()
    }
}

enum FocusState {
    Unfocused,
    Focused { id: ImageId, grip: InputGrip },
}

/// Cursor for the single full-screen item, derived from the live gallery
/// sequence.
pub struct FocusNavigator {
    gallery: Arc<Gallery>,
    binder: Arc<dyn InputBinder>,
    state: FocusState,
}

impl FocusNavigator {
    pub fn new(gallery: Arc<Gallery>) -> Self {
        Self::with_binder(gallery, Arc::new(NoopBinder))
    }

    pub fn with_binder(gallery: Arc<Gallery>, binder: Arc<dyn InputBinder>) -> Self {
        Self {
            gallery,
            binder,
            state: FocusState::Unfocused,
        }
    }

    /// Focuses the record with the given id.
    ///
    /// # Panics
    ///
    /// The id must currently exist in the gallery sequence; focusing an
    /// unknown id is a programming error, not a recoverable condition.
    pub fn focus(&mut self, id: &ImageId) {
        assert!(
            self.gallery.contains(id),
            "focus target {id} is not in the gallery sequence"
        );
        match &mut self.state {
            FocusState::Focused { id: current, .. } => {
                *current = id.clone();
            }
            FocusState::Unfocused => {
                let grip = self.binder.bind();
                debug!(%id, "viewer opened");
                self.state = FocusState::Focused {
                    id: id.clone(),
                    grip,
                };
            }
        }
    }

    /// Returns to the unfocused state, releasing the input grip.
    pub fn close(&mut self) {
        if matches!(self.state, FocusState::Focused { .. }) {
            debug!("viewer closed");
        }
        self.state = FocusState::Unfocused;
    }

    /// Applies the deletion-while-focused policy: if the focused id has
    /// disappeared from the sequence, the focus closes. Returns whether an
    /// item is still focused afterwards.
    pub fn reconcile(&mut self) -> bool {
        let vanished = match &self.state {
            FocusState::Focused { id, .. } => !self.gallery.contains(id),
            FocusState::Unfocused => false,
        };
        if vanished {
            info!("focused record disappeared; closing viewer");
            self.state = FocusState::Unfocused;
        }
        matches!(self.state, FocusState::Focused { .. })
    }

    /// Moves to the next record in the live sequence. No-op (returns false)
    /// when unfocused or already at the tail; there is no wraparound.
    pub fn next(&mut self) -> bool {
        self.step(true)
    }

    /// Moves to the previous record in the live sequence. No-op (returns
    /// false) when unfocused or already at the head.
    pub fn previous(&mut self) -> bool {
        self.step(false)
    }

    fn step(&mut self, forward: bool) -> bool {
        if !self.reconcile() {
            return false;
        }
        let current = match &self.state {
            FocusState::Focused { id, .. } => id.clone(),
            FocusState::Unfocused => return false,
        };
        let Some(index) = self.gallery.index_of(&current) else {
            // Raced away between reconcile and lookup.
            self.state = FocusState::Unfocused;
            return false;
        };
        let target = if forward {
            if index + 1 >= self.gallery.len() {
                return false;
            }
            index + 1
        } else {
            if index == 0 {
                return false;
            }
            index - 1
        };
        match self.gallery.get(target) {
            Some(record) => {
                if let FocusState::Focused { id, .. } = &mut self.state {
                    *id = record.id.clone();
                }
                true
            }
            None => false,
        }
    }

    /// True iff the focused item has a predecessor in the live sequence.
    pub fn can_go_previous(&self) -> bool {
        match &self.state {
            FocusState::Focused { id, .. } => {
                self.gallery.index_of(id).is_some_and(|index| index > 0)
            }
            FocusState::Unfocused => false,
        }
    }

    /// True iff the focused item has a successor in the live sequence.
    pub fn can_go_next(&self) -> bool {
        match &self.state {
            FocusState::Focused { id, .. } => self
                .gallery
                .index_of(id)
                .is_some_and(|index| index + 1 < self.gallery.len()),
            FocusState::Unfocused => false,
        }
    }

    pub fn is_focused(&self) -> bool {
        matches!(self.state, FocusState::Focused { .. })
    }

    pub fn focused_id(&self) -> Option<ImageId> {
        match &self.state {
            FocusState::Focused { id, .. } => Some(id.clone()),
            FocusState::Unfocused => None,
        }
    }

    /// The focused record, resolved live. Closes the focus and returns None
    /// when the record has disappeared.
    pub fn current(&mut self) -> Option<ImageRecord> {
        if !self.reconcile() {
            return None;
        }
        match &self.state {
            FocusState::Focused { id, .. } => self.gallery.record(id),
            FocusState::Unfocused => None,
        }
    }

    /// One-based position of the focused item and the live sequence length,
    /// for an "n / total" counter.
    pub fn position(&mut self) -> Option<(usize, usize)> {
        if !self.reconcile() {
            return None;
        }
        match &self.state {
            FocusState::Focused { id, .. } => self
                .gallery
                .index_of(id)
                .map(|index| (index + 1, self.gallery.len())),
            FocusState::Unfocused => None,
        }
    }
}
