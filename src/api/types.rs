use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque, stable identifier for an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ImageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One uploaded image's metadata as known to the client.
///
/// Records are immutable once fetched; there is no in-place edit endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: ImageId,
    /// Identifier of the account that uploaded the image.
    #[serde(rename = "customerId")]
    pub uploader_id: String,
    /// Display name of the uploading account.
    #[serde(rename = "customerUsername")]
    pub uploader_name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub file_name: String,
    pub file_size: Option<u64>,
    pub mime_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ImageRecord {
    /// Title to render for this record, falling back to the file name.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.file_name)
    }

    /// True when the given account uploaded this image (drives the
    /// delete-affordance visibility in a rendering layer).
    pub fn uploaded_by(&self, user: &CurrentUser) -> bool {
        self.uploader_id == user.id
    }
}

/// Envelope returned by the paged listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageListResponse {
    pub images: Vec<ImageRecord>,
}

/// The signed-in account, as reported by the identity endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
}

/// File plus optional metadata packaged for an upload request.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub title: Option<String>,
    pub description: Option<String>,
}
