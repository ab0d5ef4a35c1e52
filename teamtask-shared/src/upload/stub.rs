//! Uploader that never leaves the process
//!
//! Records every upload and returns a predictable URL. Can be switched to
//! fail so callers' abort paths can be exercised.

use super::{ProofUploader, UploadError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Upload recorded by [`StubUploader`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub folder: String,
    pub payload: String,
    pub url: String,
}

#[derive(Debug, Default)]
pub struct StubUploader {
    uploads: Mutex<Vec<RecordedUpload>>,
    failing: AtomicBool,
}

impl StubUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent uploads fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every successful upload so far
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ProofUploader for StubUploader {
    async fn upload(&self, payload: &str, folder: &str) -> Result<String, UploadError> {
        if payload.trim().is_empty() {
            return Err(UploadError::EmptyPayload);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(UploadError::Rejected {
                status: 503,
                message: "stub uploader is failing".to_string(),
            });
        }

        let mut uploads = self
            .uploads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let url = format!("https://uploads.test/{folder}/{}", uploads.len() + 1);
        uploads.push(RecordedUpload {
            folder: folder.to_string(),
            payload: payload.to_string(),
            url: url.clone(),
        });
        Ok(url)
    }
}
