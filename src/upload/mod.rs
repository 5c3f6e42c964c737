//! Upload submission flow for the gallery.
//!
//! This module provides:
//! - `Uploader` - draft lifecycle and multipart submission
//! - `UploadDraft` - a validated candidate file with optional metadata
//! - `Preview` - decoded, downscaled preview of the candidate

pub mod draft;
pub mod flow;
pub mod preview;

pub use draft::*;
pub use flow::*;
pub use preview::*;
