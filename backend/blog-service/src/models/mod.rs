/// Data models for the blog service
///
/// This module defines:
/// - `Post`: the persisted blog post entity
/// - `ImageRef`: tri-state image association (none / external URL / uploaded)
/// - `AuthenticatedUser`: the verified identity a request acts as
/// - validated input types and wire-compatible response DTOs
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Maximum accepted image upload size (5 MB)
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Verified identity extracted from a bearer token.
///
/// Always passed explicitly into service calls; there is no ambient
/// request-global identity state.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Image association of a post.
///
/// A post either has no image, references an externally hosted URL, or owns
/// an asset uploaded to the media host (tracked by its public id so it can
/// be released later). The type makes "never both" unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    None,
    Url(String),
    Stored { url: String, public_id: String },
}

impl ImageRef {
    /// The URL a client should display, regardless of mode.
    pub fn display_url(&self) -> Option<&str> {
        match self {
            ImageRef::None => None,
            ImageRef::Url(url) => Some(url),
            ImageRef::Stored { url, .. } => Some(url),
        }
    }

    /// Storage reference of an uploaded asset, if any.
    pub fn public_id(&self) -> Option<&str> {
        match self {
            ImageRef::Stored { public_id, .. } => Some(public_id),
            _ => None,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, ImageRef::Stored { .. })
    }

    /// Reassemble from the three storage columns.
    ///
    /// The table CHECK constraints keep the modes exclusive; an uploaded
    /// asset wins should a row ever carry both.
    pub fn from_columns(
        image_url: Option<String>,
        upload_url: Option<String>,
        public_id: Option<String>,
    ) -> Self {
        match (upload_url, public_id) {
            (Some(url), Some(public_id)) => ImageRef::Stored { url, public_id },
            _ => match image_url {
                Some(url) => ImageRef::Url(url),
                None => ImageRef::None,
            },
        }
    }

    /// Project onto the three storage columns.
    pub fn as_columns(&self) -> (Option<&str>, Option<&str>, Option<&str>) {
        match self {
            ImageRef::None => (None, None, None),
            ImageRef::Url(url) => (Some(url.as_str()), None, None),
            ImageRef::Stored { url, public_id } => {
                (None, Some(url.as_str()), Some(public_id.as_str()))
            }
        }
    }
}

/// A blog post as persisted.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image: ImageRef,
    pub author_id: Uuid,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated title/content/imageURL input shared by create and update.
#[derive(Debug, Clone, Validate)]
pub struct PostInput {
    #[validate(length(min = 5, max = 120, message = "Title must be 5-120 characters"))]
    pub title: String,
    #[validate(length(min = 50, message = "Content must be at least 50 characters"))]
    pub content: String,
    pub image_url: Option<String>,
}

impl PostInput {
    /// Normalize raw form fields and enforce the write-time invariants.
    ///
    /// Titles are trimmed before the length check; an empty or
    /// whitespace-only `imageURL` counts as absent.
    pub fn parse(
        title: &str,
        content: &str,
        image_url: Option<&str>,
    ) -> Result<Self, AppError> {
        let input = PostInput {
            title: title.trim().to_string(),
            content: content.to_string(),
            image_url: image_url
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        };

        input
            .validate()
            .map_err(|e| AppError::Validation(flatten_validation_errors(&e)))?;

        if let Some(url) = &input.image_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(AppError::Validation(
                    "imageURL: Please provide a valid URL".to_string(),
                ));
            }
        }

        Ok(input)
    }
}

fn flatten_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                format!("{}: {}", field, message)
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

/// An image file received as multipart data.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub data: Vec<u8>,
    pub filename: String,
    pub content_type: Option<String>,
}

impl UploadFile {
    /// Enforce the image-only / 5 MB constraints before the media host is
    /// ever contacted.
    pub fn validate(&self) -> Result<(), AppError> {
        match &self.content_type {
            Some(ct) if ct.starts_with("image/") => {}
            _ => {
                return Err(AppError::Validation(
                    "Only image files are allowed".to_string(),
                ))
            }
        }
        if self.data.is_empty() {
            return Err(AppError::Validation("Image file is empty".to_string()));
        }
        if self.data.len() > MAX_IMAGE_BYTES {
            return Err(AppError::Validation(
                "File too large. Maximum size is 5MB".to_string(),
            ));
        }
        Ok(())
    }
}

/// Create-post request resolved from the multipart form.
#[derive(Debug)]
pub struct NewPost {
    pub input: PostInput,
    pub file: Option<UploadFile>,
}

/// Update-post request resolved from the multipart form.
#[derive(Debug)]
pub struct PostUpdate {
    pub input: PostInput,
    pub remove_image: bool,
    pub file: Option<UploadFile>,
}

// ---------------------------------------------------------------------------
// Response DTOs (camelCase wire names, matching existing API clients)
// ---------------------------------------------------------------------------

/// Uploaded-image body as clients expect it.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedImage {
    pub url: String,
    #[serde(rename = "publicId")]
    pub public_id: String,
}

/// Resolved author reference.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthorRef {
    pub id: Uuid,
    pub username: String,
}

/// A post as serialized in API responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "imageURL", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<UploadedImage>,
    pub author: AuthorRef,
    #[serde(rename = "authorName")]
    pub author_name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        let (image_url, image) = match post.image {
            ImageRef::None => (None, None),
            ImageRef::Url(url) => (Some(url), None),
            ImageRef::Stored { url, public_id } => {
                (None, Some(UploadedImage { url, public_id }))
            }
        };

        PostResponse {
            id: post.id,
            title: post.title,
            content: post.content,
            image_url,
            image,
            author: AuthorRef {
                id: post.author_id,
                username: post.author_name.clone(),
            },
            author_name: post.author_name,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}
