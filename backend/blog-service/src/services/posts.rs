/// Post lifecycle service - creation, update, deletion
///
/// The only component with real branching logic: it validates input before
/// any side effect, enforces single-owner authorization, and reconciles the
/// two image modes (external URL vs. uploaded asset) so that at most one is
/// ever populated. Releasing a previously stored asset is best-effort by
/// policy - a stray unreleased image must never block a user's mutation.
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::post_repo;
use crate::error::{AppError, Result};
use crate::media::{MediaStore, StoredImage};
use crate::models::{AuthenticatedUser, ImageRef, NewPost, Post, PostUpdate, UploadFile};

pub struct PostService {
    pool: PgPool,
    media: Arc<dyn MediaStore>,
}

/// Outcome of a sequential batch delete. Nothing is rolled back on partial
/// failure; callers get told exactly which ids went through.
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkDeleteReport {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<BulkDeleteFailure>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkDeleteFailure {
    pub id: Uuid,
    pub reason: String,
}

impl PostService {
    pub fn new(pool: PgPool, media: Arc<dyn MediaStore>) -> Self {
        Self { pool, media }
    }

    /// Get a post by ID
    pub async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        Ok(post_repo::find_post_by_id(&self.pool, post_id).await?)
    }

    /// Create a new post for the requesting identity.
    ///
    /// An uploaded file takes precedence over an `imageURL` supplied in the
    /// same request. A failed store aborts the create; no record is written.
    pub async fn create_post(
        &self,
        requester: &AuthenticatedUser,
        req: NewPost,
    ) -> Result<Post> {
        let image = match req.file {
            Some(file) => self.store_file(&file).await?,
            None => match req.input.image_url.clone() {
                Some(url) => ImageRef::Url(url),
                None => ImageRef::None,
            },
        };

        let post = post_repo::insert_post(
            &self.pool,
            &req.input.title,
            &req.input.content,
            &image,
            requester.id,
            &requester.username,
        )
        .await?;

        tracing::info!(post_id = %post.id, author = %requester.username, "post created");
        Ok(post)
    }

    /// Update a post (owner only). Image-mode reconciliation, in precedence
    /// order: removal, then a newly uploaded file, then the URL field.
    pub async fn update_post(
        &self,
        requester: &AuthenticatedUser,
        post_id: Uuid,
        req: PostUpdate,
    ) -> Result<Post> {
        let post = self.fetch_owned(requester, post_id).await?;
        let PostUpdate {
            input,
            remove_image,
            file,
        } = req;

        // A replacement file must be validated before the old asset is
        // touched; otherwise a rejected upload would already have destroyed
        // the image the record still references.
        if let Some(file) = &file {
            file.validate()?;
        }

        let image = if remove_image {
            if let Some(public_id) = post.image.public_id() {
                self.release_best_effort(public_id).await;
            }
            ImageRef::None
        } else if let Some(file) = file {
            // The old asset is released before the new store; if the store
            // then fails, the update aborts and the record keeps its old
            // reference (the asset itself is already gone).
            if let Some(public_id) = post.image.public_id() {
                self.release_best_effort(public_id).await;
            }
            self.store_file(&file).await?
        } else {
            match input.image_url.clone() {
                Some(url) => {
                    // URL mode and stored mode are mutually exclusive.
                    if let Some(public_id) = post.image.public_id() {
                        self.release_best_effort(public_id).await;
                    }
                    ImageRef::Url(url)
                }
                // No URL supplied: a URL-mode image is cleared, a stored
                // asset is kept untouched.
                None if post.image.is_stored() => post.image.clone(),
                None => ImageRef::None,
            }
        };

        let updated = post_repo::update_post(
            &self.pool,
            post_id,
            &input.title,
            &input.content,
            &image,
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        tracing::info!(post_id = %updated.id, "post updated");
        Ok(updated)
    }

    /// Delete a post (owner only), releasing any stored image first.
    ///
    /// The record is removed even if the release fails.
    pub async fn delete_post(
        &self,
        requester: &AuthenticatedUser,
        post_id: Uuid,
    ) -> Result<()> {
        let post = self.fetch_owned(requester, post_id).await?;

        if let Some(public_id) = post.image.public_id() {
            self.release_best_effort(public_id).await;
        }

        if !post_repo::delete_post(&self.pool, post_id).await? {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        tracing::info!(%post_id, "post deleted");
        Ok(())
    }

    /// Delete several posts sequentially, reporting per-id outcomes.
    ///
    /// No transaction wraps the batch; earlier deletions stand even when a
    /// later one fails.
    pub async fn delete_posts(
        &self,
        requester: &AuthenticatedUser,
        post_ids: &[Uuid],
    ) -> BulkDeleteReport {
        let mut report = BulkDeleteReport {
            succeeded: Vec::new(),
            failed: Vec::new(),
        };

        for &post_id in post_ids {
            match self.delete_post(requester, post_id).await {
                Ok(()) => report.succeeded.push(post_id),
                Err(err) => report.failed.push(BulkDeleteFailure {
                    id: post_id,
                    reason: err.to_string(),
                }),
            }
        }

        report
    }

    /// Store an image without attaching it to any post.
    pub async fn upload_image(&self, file: UploadFile) -> Result<StoredImage> {
        file.validate()?;
        let stored = self.media.store(file.data.clone(), &file.filename).await?;
        tracing::info!(public_id = %stored.public_id, "image uploaded");
        Ok(stored)
    }

    async fn fetch_owned(
        &self,
        requester: &AuthenticatedUser,
        post_id: Uuid,
    ) -> Result<Post> {
        let post = post_repo::find_post_by_id(&self.pool, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        if post.author_id != requester.id {
            return Err(AppError::Forbidden("Not authorized".to_string()));
        }

        Ok(post)
    }

    async fn store_file(&self, file: &UploadFile) -> Result<ImageRef> {
        file.validate()?;
        let stored = self.media.store(file.data.clone(), &file.filename).await?;
        Ok(ImageRef::Stored {
            url: stored.url,
            public_id: stored.public_id,
        })
    }

    /// Release a stored asset; failure is logged and swallowed.
    async fn release_best_effort(&self, public_id: &str) {
        if let Err(err) = self.media.release(public_id).await {
            tracing::warn!(%public_id, "media release failed: {}", err);
        }
    }
}
