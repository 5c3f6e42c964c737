//! Upload submission flow.
//!
//! Drives one draft at a time: select a candidate file (validated before
//! any network call), optionally set a title and description, derive a
//! preview, then submit as a multipart payload. On success the created
//! record is handed to the gallery as its most recent entry and the draft
//! is cleared; on failure the draft survives so the user can retry without
//! re-selecting the file.

use std::path::Path;
use std::sync::Arc;

use tokio::task;
use tracing::{info, warn};

use crate::api::source::ImageSource;
use crate::api::types::{ImageRecord, UploadPayload};
use crate::error::{GalleryError, MutationOp};
use crate::gallery::collection::Gallery;
use crate::upload::draft::UploadDraft;
use crate::upload::preview::{render_preview, Preview};

/// Maximum length of an upload title, in characters.
pub const TITLE_MAX: usize = 255;

/// Maximum length of an upload description, in characters.
pub const DESCRIPTION_MAX: usize = 1000;

const NO_FILE_SELECTED: &str = "Please select an image";
const UNDECODABLE: &str = "The selected file is not a valid image";

/// Trims an optional text field and enforces its length ceiling.
fn normalize_field(raw: &str, max: usize, label: &str) -> Result<Option<String>, GalleryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > max {
        return Err(GalleryError::Validation(format!(
            "{label} must be at most {max} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

/// One-at-a-time upload flow over a remote image source.
pub struct Uploader {
    source: Arc<dyn ImageSource>,
    draft: Option<UploadDraft>,
}

impl Uploader {
    pub fn new(source: Arc<dyn ImageSource>) -> Self {
        Self {
            source,
            draft: None,
        }
    }

    /// Validates the candidate file and replaces any existing draft.
    pub async fn select_file(&mut self, path: &Path) -> Result<&UploadDraft, GalleryError> {
        let draft = UploadDraft::from_path(path).await?;
        info!(file = %draft.file_name(), size = draft.size(), "upload draft created");
        Ok(&*self.draft.insert(draft))
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        if let Some(draft) = self.draft.as_mut() {
            draft.title = title.into();
        }
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        if let Some(draft) = self.draft.as_mut() {
            draft.description = description.into();
        }
    }

    pub fn draft(&self) -> Option<&UploadDraft> {
        self.draft.as_ref()
    }

    /// Discards the current draft.
    pub fn cancel(&mut self) {
        if self.draft.take().is_some() {
            info!("upload draft discarded");
        }
    }

    /// Derives (and caches) the draft's preview.
    pub async fn prepare_preview(&mut self) -> Result<Preview, GalleryError> {
        let draft = self
            .draft
            .as_mut()
            .ok_or_else(|| GalleryError::Validation(NO_FILE_SELECTED.to_string()))?;

        if let Some(preview) = &draft.preview {
            return Ok(preview.clone());
        }

        let bytes = draft.load_bytes().await?.to_vec();
        let preview = task::spawn_blocking(move || render_preview(&bytes))
            .await
            .map_err(|err| {
                warn!(%err, "preview task panicked");
                GalleryError::Validation(UNDECODABLE.to_string())
            })?
            .map_err(|err| {
                warn!(%err, "preview rendering failed");
                GalleryError::Validation(UNDECODABLE.to_string())
            })?;

        draft.preview = Some(preview.clone());
        Ok(preview)
    }

    /// Submits the draft and, on success, hands the created record to the
    /// gallery as its most recent entry.
    pub async fn submit(&mut self, gallery: &Gallery) -> Result<ImageRecord, GalleryError> {
        let draft = self
            .draft
            .as_mut()
            .ok_or_else(|| GalleryError::Validation(NO_FILE_SELECTED.to_string()))?;

        let title = normalize_field(&draft.title, TITLE_MAX, "Title")?;
        let description = normalize_field(&draft.description, DESCRIPTION_MAX, "Description")?;
        let bytes = draft.load_bytes().await?.to_vec();

        let payload = UploadPayload {
            file_name: draft.file_name.clone(),
            mime_type: draft.mime_type.to_string(),
            bytes,
            title,
            description,
        };

        match self.source.upload(payload).await {
            Ok(record) => {
                info!(id = %record.id, "upload complete");
                gallery.insert_most_recent(record.clone());
                self.draft = None;
                Ok(record)
            }
            Err(err) => {
                warn!(%err, "upload failed; draft retained for retry");
                Err(GalleryError::mutation(MutationOp::Upload, err))
            }
        }
    }
}
