/// Media host integration
///
/// The media host stores binary image data and deletes it by reference id.
/// Services depend on the `MediaStore` trait so tests can substitute a
/// recording double; the production implementation speaks the Cloudinary
/// HTTP API.
use async_trait::async_trait;
use thiserror::Error;

pub mod cloudinary;

pub use cloudinary::CloudinaryStore;

/// Result of successfully storing an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Public URL the stored asset is served from
    pub url: String,
    /// Reference id needed to delete the asset later
    pub public_id: String,
}

#[derive(Debug, Error)]
pub enum MediaStoreError {
    #[error("media host request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("media host rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected media host response: {0}")]
    InvalidResponse(String),
}

/// Opaque image storage service.
///
/// `store` failures are fatal to the calling operation; `release` failures
/// are not - callers log them and move on, since a stray unreleased asset
/// is less harmful than blocking the user's mutation.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store binary image data, returning its URL and reference id.
    async fn store(
        &self,
        data: Vec<u8>,
        original_filename: &str,
    ) -> Result<StoredImage, MediaStoreError>;

    /// Delete a previously stored asset by reference id.
    async fn release(&self, public_id: &str) -> Result<(), MediaStoreError>;
}
