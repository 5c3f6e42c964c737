//! Contract of the remote image service.
//!
//! The gallery, viewer and upload flow only ever talk to this trait; the
//! HTTP implementation lives in [`client`](crate::api::client) and tests
//! substitute an in-memory source.

use async_trait::async_trait;

use crate::api::types::{CurrentUser, ImageId, ImageRecord, UploadPayload};
use crate::error::SourceError;

/// Remote image service: paged listing, single-record fetch, upload,
/// delete, raw file bytes and the current-user identity lookup.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetches up to `limit` records starting at `offset`, newest first.
    async fn fetch_page(&self, limit: usize, offset: usize)
        -> Result<Vec<ImageRecord>, SourceError>;

    /// Fetches a single record by id.
    async fn fetch_record(&self, id: &ImageId) -> Result<ImageRecord, SourceError>;

    /// Uploads a new image; returns the created record.
    async fn upload(&self, payload: UploadPayload) -> Result<ImageRecord, SourceError>;

    /// Deletes the image with the given id.
    async fn delete(&self, id: &ImageId) -> Result<(), SourceError>;

    /// Fetches the raw file bytes for an image.
    async fn fetch_file(&self, id: &ImageId) -> Result<Vec<u8>, SourceError>;

    /// Deterministic, cacheable URL of the raw file for an image.
    fn file_url(&self, id: &ImageId) -> String;

    /// Identity of the signed-in account.
    async fn current_user(&self) -> Result<CurrentUser, SourceError>;
}
