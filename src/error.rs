//! Error types for the gallery client.
//!
//! Remote failures are converted at the component boundary into one of four
//! user-facing kinds, carrying a human-readable message. Server-supplied
//! messages are preferred; generic defaults are used otherwise. None of these
//! are fatal to the caller.

use thiserror::Error;

/// Default message when a list fetch fails without a server message.
const FETCH_FALLBACK: &str = "Failed to load images";

/// Default message when a delete fails without a server message.
const DELETE_FALLBACK: &str = "Failed to delete image";

/// Default message when an upload fails without a server message.
const UPLOAD_FALLBACK: &str = "Failed to upload image";

/// Which direction of page fetch an error belongs to.
///
/// An initial-load failure blocks rendering the list; a load-more failure
/// keeps the existing list visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    /// The page-0 fetch triggered by a reset.
    Initial,
    /// A tail-append fetch triggered by `load_next_page`.
    More,
}

/// Which mutating operation an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    Delete,
    Upload,
}

/// User-facing error kinds of the gallery client.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// Client-side validation failure, raised before any network call.
    #[error("{0}")]
    Validation(String),

    /// A list/page fetch failed; prior collection state is untouched.
    #[error("{message}")]
    Fetch { phase: FetchPhase, message: String },

    /// A delete or upload failed. An optimistic local removal is not rolled
    /// back; an upload draft is retained for retry.
    #[error("{message}")]
    Mutation { op: MutationOp, message: String },

    /// The remote rejected the bearer credential; the session has been
    /// invalidated and the user must sign in again.
    #[error("Your session has expired. Please sign in again.")]
    Auth,
}

impl GalleryError {
    /// True for the fetch-failure variant that should block rendering the
    /// list (as opposed to a load-more failure, which leaves it visible).
    pub fn is_initial_fetch(&self) -> bool {
        matches!(
            self,
            GalleryError::Fetch {
                phase: FetchPhase::Initial,
                ..
            }
        )
    }

    pub(crate) fn fetch(phase: FetchPhase, err: SourceError) -> Self {
        match err {
            SourceError::Unauthorized => GalleryError::Auth,
            other => GalleryError::Fetch {
                phase,
                message: other.user_message(FETCH_FALLBACK),
            },
        }
    }

    pub(crate) fn mutation(op: MutationOp, err: SourceError) -> Self {
        let fallback = match op {
            MutationOp::Delete => DELETE_FALLBACK,
            MutationOp::Upload => UPLOAD_FALLBACK,
        };
        match err {
            SourceError::Unauthorized => GalleryError::Auth,
            other => GalleryError::Mutation {
                op,
                message: other.user_message(fallback),
            },
        }
    }
}

/// Transport-level failure reported by an [`ImageSource`] implementation.
///
/// [`ImageSource`]: crate::api::source::ImageSource
#[derive(Debug, Error)]
pub enum SourceError {
    /// The remote returned 401; the session is no longer valid.
    #[error("unauthorized")]
    Unauthorized,

    /// The remote returned a non-success status. `message` carries the
    /// server-supplied error message when one was parseable.
    #[error("server returned status {status}")]
    Status { status: u16, message: Option<String> },

    /// The request could not be completed (connection, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl SourceError {
    /// The message to surface to a user: the server-supplied one when
    /// present, the given fallback otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            SourceError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_mapping_prefers_server_message() {
        let err = GalleryError::fetch(
            FetchPhase::More,
            SourceError::Status {
                status: 500,
                message: Some("database offline".to_string()),
            },
        );
        assert_eq!(err.to_string(), "database offline");
        assert!(!err.is_initial_fetch());
    }

    #[test]
    fn fetch_mapping_falls_back_to_generic_message() {
        let err = GalleryError::fetch(
            FetchPhase::Initial,
            SourceError::Transport("connection refused".to_string()),
        );
        assert_eq!(err.to_string(), "Failed to load images");
        assert!(err.is_initial_fetch());
    }

    #[test]
    fn unauthorized_maps_to_auth_everywhere() {
        assert!(matches!(
            GalleryError::fetch(FetchPhase::Initial, SourceError::Unauthorized),
            GalleryError::Auth
        ));
        assert!(matches!(
            GalleryError::mutation(MutationOp::Upload, SourceError::Unauthorized),
            GalleryError::Auth
        ));
    }

    #[test]
    fn mutation_fallbacks_follow_the_operation() {
        let delete = GalleryError::mutation(
            MutationOp::Delete,
            SourceError::Transport("timeout".to_string()),
        );
        assert_eq!(delete.to_string(), "Failed to delete image");

        let upload = GalleryError::mutation(
            MutationOp::Upload,
            SourceError::Decode("truncated body".to_string()),
        );
        assert_eq!(upload.to_string(), "Failed to upload image");
    }
}
