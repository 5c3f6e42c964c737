//! Client-side core for a paginated image gallery.
//!
//! Users browse a feed of uploaded images fetched page by page, open a
//! full-screen viewer with next/previous navigation, upload new images with
//! optional metadata, and delete their own. This crate owns the state that
//! makes those flows coherent:
//!
//! - [`Gallery`] merges fetched pages into one ordered, deduplicated
//!   sequence and keeps cursor/"more pages" state consistent under
//!   concurrent mutation and re-fetch
//! - [`FocusNavigator`] derives the viewer cursor from the same live
//!   sequence, so navigation stays correct as records come and go
//! - [`Uploader`] validates a candidate file, derives a preview, and hands
//!   the created record back to the gallery
//! - [`ApiClient`] implements the [`ImageSource`] contract over HTTP, with
//!   bearer-credential handling through an explicit [`Session`]
//!
//! Rendering is out of scope: a view layer consumes snapshots, availability
//! predicates and the [`GalleryEvent`] stream.

pub mod api;
pub mod error;
pub mod gallery;
pub mod upload;

pub use api::client::{ApiClient, ApiConfig};
pub use api::session::{Session, SessionEvent};
pub use api::source::ImageSource;
pub use api::types::{CurrentUser, ImageId, ImageListResponse, ImageRecord, UploadPayload};
pub use error::{FetchPhase, GalleryError, MutationOp, SourceError};
pub use gallery::collection::{
    Gallery, GalleryConfig, GalleryEvent, LoadOutcome, DEFAULT_PAGE_LEN,
};
pub use gallery::focus::{FocusNavigator, InputBinder, InputGrip, NoopBinder};
pub use gallery::prefetch::FileCache;
pub use upload::draft::{UploadDraft, MAX_FILE_BYTES};
pub use upload::flow::{Uploader, DESCRIPTION_MAX, TITLE_MAX};
pub use upload::preview::{Preview, PREVIEW_EDGE};
