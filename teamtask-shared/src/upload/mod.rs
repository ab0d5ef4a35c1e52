//! Object store uploads for completion proofs and profile photos
//!
//! Payloads are base64 data URIs as sent by clients
//! (`data:image/png;base64,...`). An uploader stores one and returns the
//! public HTTPS URL of the stored object.

pub mod cloudinary;
pub mod stub;

use async_trait::async_trait;
use thiserror::Error;

pub use cloudinary::{CloudinaryConfig, CloudinaryUploader, SignatureAlgorithm};
pub use stub::StubUploader;

/// Folder for task completion proofs
pub const PROOF_FOLDER: &str = "task_proofs";

/// Folder for profile photos
pub const PROFILE_PHOTO_FOLDER: &str = "profile_photos";

/// Upload errors
#[derive(Debug, Error)]
pub enum UploadError {
    /// Nothing to upload
    #[error("upload payload is empty")]
    EmptyPayload,

    /// Transport failure (connect, timeout, decode)
    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The object store answered with an error status
    #[error("object store rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Success response without a URL
    #[error("object store response had no secure_url")]
    MissingUrl,
}

/// Stores a payload and returns its public URL
#[async_trait]
pub trait ProofUploader: Send + Sync {
    async fn upload(&self, payload: &str, folder: &str) -> Result<String, UploadError>;
}
