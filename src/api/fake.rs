//! Scripted in-memory [`ImageSource`] for tests.
//!
//! Pages are scripted per offset, failures are injectable per operation, and
//! per-offset gates let tests park a fetch to drive exact interleavings.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::api::source::ImageSource;
use crate::api::types::{CurrentUser, ImageId, ImageRecord, UploadPayload};
use crate::error::SourceError;

/// Installs a fmt subscriber for tests that want log output.
pub(crate) fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("pinwall=debug")
        .with_test_writer()
        .try_init();
}

/// A minimal decodable PNG (1x1 pixel) for upload fixtures.
pub(crate) fn tiny_png() -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        1,
        1,
        image::Rgb([200, 60, 30]),
    ));
    let mut buffer = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// Builds the n-th record fixture (`img-{n}`).
pub(crate) fn record(n: usize) -> ImageRecord {
    ImageRecord {
        id: ImageId::new(format!("img-{n}")),
        uploader_id: "user-1".to_string(),
        uploader_name: "tester".to_string(),
        title: Some(format!("Image {n}")),
        description: None,
        uploaded_at: Utc::now(),
        file_name: format!("img-{n}.jpg"),
        file_size: None,
        mime_type: Some("image/jpeg".to_string()),
        width: None,
        height: None,
    }
}

/// Builds record fixtures for an inclusive range.
pub(crate) fn records(range: std::ops::RangeInclusive<usize>) -> Vec<ImageRecord> {
    range.map(record).collect()
}

#[derive(Default)]
pub(crate) struct FakeSource {
    pages: Mutex<HashMap<usize, VecDeque<Result<Vec<ImageRecord>, SourceError>>>>,
    gates: Mutex<HashMap<usize, async_channel::Receiver<()>>>,
    delete_results: Mutex<VecDeque<Result<(), SourceError>>>,
    upload_results: Mutex<VecDeque<Result<ImageRecord, SourceError>>>,
    files: Mutex<HashMap<ImageId, Vec<u8>>>,
    pub last_upload: Mutex<Option<UploadPayload>>,
    pub fetch_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub file_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the next result for a fetch at the given offset. Unscripted
    /// offsets return an empty page.
    pub fn script_page(&self, offset: usize, result: Result<Vec<ImageRecord>, SourceError>) {
        self.pages
            .lock()
            .entry(offset)
            .or_default()
            .push_back(result);
    }

    /// Parks the next fetch at the given offset until the returned sender
    /// fires (or is dropped).
    pub fn gate_page(&self, offset: usize) -> async_channel::Sender<()> {
        let (sender, receiver) = async_channel::bounded(1);
        self.gates.lock().insert(offset, receiver);
        sender
    }

    /// Queues the next delete result. Unscripted deletes succeed.
    pub fn script_delete(&self, result: Result<(), SourceError>) {
        self.delete_results.lock().push_back(result);
    }

    /// Queues the next upload result. Unscripted uploads fail with 500.
    pub fn script_upload(&self, result: Result<ImageRecord, SourceError>) {
        self.upload_results.lock().push_back(result);
    }

    /// Registers raw file bytes for an id.
    pub fn insert_file(&self, id: ImageId, bytes: Vec<u8>) {
        self.files.lock().insert(id, bytes);
    }
}

#[async_trait]
impl ImageSource for FakeSource {
    async fn fetch_page(
        &self,
        _limit: usize,
        offset: usize,
    ) -> Result<Vec<ImageRecord>, SourceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().remove(&offset);
        if let Some(gate) = gate {
            let _ = gate.recv().await;
        }
        self.pages
            .lock()
            .get_mut(&offset)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fetch_record(&self, _id: &ImageId) -> Result<ImageRecord, SourceError> {
        Err(SourceError::Status {
            status: 404,
            message: None,
        })
    }

    async fn upload(&self, payload: UploadPayload) -> Result<ImageRecord, SourceError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_upload.lock() = Some(payload);
        self.upload_results
            .lock()
            .pop_front()
            .unwrap_or(Err(SourceError::Status {
                status: 500,
                message: None,
            }))
    }

    async fn delete(&self, _id: &ImageId) -> Result<(), SourceError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.delete_results.lock().pop_front().unwrap_or(Ok(()))
    }

    async fn fetch_file(&self, id: &ImageId) -> Result<Vec<u8>, SourceError> {
        self.file_calls.fetch_add(1, Ordering::SeqCst);
        self.files
            .lock()
            .get(id)
            .cloned()
            .ok_or(SourceError::Status {
                status: 404,
                message: None,
            })
    }

    fn file_url(&self, id: &ImageId) -> String {
        format!("fake://images/{id}/file")
    }

    async fn current_user(&self) -> Result<CurrentUser, SourceError> {
        Ok(CurrentUser {
            id: "user-1".to_string(),
            username: "tester".to_string(),
            email: None,
        })
    }
}
