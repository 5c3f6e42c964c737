use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::GalleryError;
use crate::upload::preview::Preview;

/// Upper bound on an upload candidate's size.
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

const NOT_AN_IMAGE: &str = "The selected file must be an image";
const CANNOT_READ: &str = "The selected file cannot be read";
const EMPTY_FILE: &str = "The selected file is empty";

/// MIME type for a file extension, if it denotes a supported image format.
pub(crate) fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "tiff" | "tif" => Some("image/tiff"),
        _ => None,
    }
}

/// A validated upload candidate with its optional metadata.
///
/// Transient: discarded on successful submission or explicit cancel, kept
/// across failed submissions so the user can retry without re-selecting.
#[derive(Debug)]
pub struct UploadDraft {
    pub(crate) path: PathBuf,
    pub(crate) file_name: String,
    pub(crate) mime_type: &'static str,
    pub(crate) size: u64,
    pub(crate) bytes: Option<Vec<u8>>,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) preview: Option<Preview>,
}

impl UploadDraft {
    /// Validates the candidate file and builds a draft. All checks run
    /// before any network traffic: the file must be readable, non-empty,
    /// carry an image extension, and stay under [`MAX_FILE_BYTES`].
    pub(crate) async fn from_path(path: &Path) -> Result<Self, GalleryError> {
        let metadata = tokio::fs::metadata(path).await.map_err(|err| {
            warn!(?path, %err, "upload candidate not readable");
            GalleryError::Validation(CANNOT_READ.to_string())
        })?;
        if !metadata.is_file() {
            return Err(GalleryError::Validation(CANNOT_READ.to_string()));
        }

        let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
        let mime_type = mime_for_extension(ext)
            .ok_or_else(|| GalleryError::Validation(NOT_AN_IMAGE.to_string()))?;

        let size = metadata.len();
        if size == 0 {
            return Err(GalleryError::Validation(EMPTY_FILE.to_string()));
        }
        if size > MAX_FILE_BYTES {
            return Err(GalleryError::Validation(format!(
                "The file size must be under {} MB",
                MAX_FILE_BYTES / (1024 * 1024)
            )));
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| GalleryError::Validation(CANNOT_READ.to_string()))?;

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            mime_type,
            size,
            bytes: None,
            title: String::new(),
            description: String::new(),
            preview: None,
        })
    }

    /// Reads the candidate file once and caches its bytes on the draft.
    pub(crate) async fn load_bytes(&mut self) -> Result<&[u8], GalleryError> {
        if self.bytes.is_none() {
            let bytes = tokio::fs::read(&self.path).await.map_err(|err| {
                warn!(path = ?self.path, %err, "upload candidate vanished");
                GalleryError::Validation(CANNOT_READ.to_string())
            })?;
            self.bytes = Some(bytes);
        }
        Ok(self.bytes.as_deref().unwrap_or_default())
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }
}
