//! Cloudinary signed-upload client
//!
//! Uses the REST upload endpoint directly:
//!
//! ```text
//! POST {api_base}/{cloud_name}/image/upload
//! file=<data uri>&api_key=..&timestamp=..&folder=..&signature=..
//! ```
//!
//! The signature is the hex digest of the signed parameters, sorted by name
//! and joined as `k=v&k=v`, followed by the API secret. Accounts default to
//! SHA-1; SHA-256 must also be named in `signature_algorithm`.

use super::{ProofUploader, UploadError};
use async_trait::async_trait;
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default Cloudinary API base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Credentials and endpoint of a Cloudinary account
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
    pub timeout: Duration,
    pub signature_algorithm: SignatureAlgorithm,
}

impl CloudinaryConfig {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            signature_algorithm: SignatureAlgorithm::default(),
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.api_base.trim_end_matches('/'),
            self.cloud_name
        )
    }
}

/// Digest used for request signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    /// Cloudinary's default for every account
    #[default]
    Sha1,

    /// Must be enabled on the account
    Sha256,
}

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1 => "sha1",
            SignatureAlgorithm::Sha256 => "sha256",
        }
    }

    fn digest_hex(&self, input: &[u8]) -> String {
        match self {
            SignatureAlgorithm::Sha1 => hex::encode(Sha1::digest(input)),
            SignatureAlgorithm::Sha256 => hex::encode(Sha256::digest(input)),
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized signature algorithm name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown signature algorithm {0:?} (expected sha1 or sha256)")]
pub struct UnknownSignatureAlgorithm(pub String);

impl FromStr for SignatureAlgorithm {
    type Err = UnknownSignatureAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(SignatureAlgorithm::Sha1),
            "sha256" | "sha-256" => Ok(SignatureAlgorithm::Sha256),
            _ => Err(UnknownSignatureAlgorithm(s.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Uploader talking to Cloudinary over HTTPS
#[derive(Debug, Clone)]
pub struct CloudinaryUploader {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

impl CloudinaryUploader {
    /// Builds the uploader with an HTTP client using the configured timeout
    pub fn new(config: CloudinaryConfig) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }
}

/// Signs `params` with the API secret
///
/// `file`, `api_key` and `signature_algorithm` are never part of `params`.
pub fn sign(params: &[(&str, &str)], api_secret: &str, algorithm: SignatureAlgorithm) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    algorithm.digest_hex(format!("{joined}{api_secret}").as_bytes())
}

#[async_trait]
impl ProofUploader for CloudinaryUploader {
    async fn upload(&self, payload: &str, folder: &str) -> Result<String, UploadError> {
        if payload.trim().is_empty() {
            return Err(UploadError::EmptyPayload);
        }

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let algorithm = self.config.signature_algorithm;
        let signature = sign(
            &[("folder", folder), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
            algorithm,
        );

        let mut form = vec![
            ("file", payload),
            ("api_key", self.config.api_key.as_str()),
            ("timestamp", timestamp.as_str()),
            ("folder", folder),
            ("signature", signature.as_str()),
        ];
        if algorithm != SignatureAlgorithm::Sha1 {
            form.push(("signature_algorithm", algorithm.as_str()));
        }

        let response = self
            .client
            .post(self.config.upload_url())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            tracing::warn!(status = status.as_u16(), folder, "Upload rejected");
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response.json().await?;
        let url = body.secure_url.ok_or(UploadError::MissingUrl)?;

        tracing::debug!(folder, url = %url, "Uploaded object");
        Ok(url)
    }
}
