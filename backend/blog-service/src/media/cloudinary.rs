/// Cloudinary-backed media store
///
/// Uploads go to `image/upload`, deletions to `image/destroy`. Both carry a
/// SHA-1 request signature computed over the alphabetically sorted
/// parameters followed by the API secret, per the host's signing scheme.
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::config::MediaConfig;

use super::{MediaStore, MediaStoreError, StoredImage};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

pub struct CloudinaryStore {
    http: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    upload_folder: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            upload_folder: config.upload_folder.clone(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{}", API_BASE, self.cloud_name, action)
    }

    /// SHA-1 hex over `k1=v1&k2=v2...{secret}` with keys sorted.
    ///
    /// `file` and `api_key` are never part of the signed string.
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);

        let joined = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha1::new();
        hasher.update(joined.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn read_error_body(response: reqwest::Response) -> MediaStoreError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        MediaStoreError::Rejected { status, message }
    }
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn store(
        &self,
        data: Vec<u8>,
        original_filename: &str,
    ) -> Result<StoredImage, MediaStoreError> {
        let timestamp = Utc::now().timestamp().to_string();
        let public_id = format!("post-{}", Utc::now().timestamp_millis());

        let signed_params = [
            ("folder", self.upload_folder.clone()),
            ("public_id", public_id.clone()),
            ("timestamp", timestamp.clone()),
        ];
        let signature = self.sign(&signed_params);

        let file_part = reqwest::multipart::Part::bytes(data)
            .file_name(original_filename.to_string());

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("public_id", public_id)
            .text("folder", self.upload_folder.clone())
            .text("signature", signature);

        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::read_error_body(response).await);
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaStoreError::InvalidResponse(e.to_string()))?;

        Ok(StoredImage {
            url: body.secure_url,
            public_id: body.public_id,
        })
    }

    async fn release(&self, public_id: &str) -> Result<(), MediaStoreError> {
        let timestamp = Utc::now().timestamp().to_string();

        let signed_params = [
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp.clone()),
        ];
        let signature = self.sign(&signed_params);

        let form = [
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp),
            ("api_key", self.api_key.clone()),
            ("signature", signature),
        ];

        let response = self
            .http
            .post(self.endpoint("destroy"))
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::read_error_body(response).await);
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| MediaStoreError::InvalidResponse(e.to_string()))?;

        // "not found" is already-released; treat as success.
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(MediaStoreError::InvalidResponse(format!(
                "destroy returned '{}'",
                other
            ))),
        }
    }
}
