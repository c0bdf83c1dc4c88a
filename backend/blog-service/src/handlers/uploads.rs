/// Upload handlers - standalone image upload endpoint
use actix_multipart::form::{bytes::Bytes as MultipartBytes, MultipartForm};
use actix_web::{web, HttpResponse};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{AppError, Result};
use crate::media::MediaStore;
use crate::models::{AuthenticatedUser, UploadFile};
use crate::services::PostService;

#[derive(Debug, MultipartForm)]
pub struct UploadForm {
    #[multipart(limit = "5MB")]
    pub image: Option<MultipartBytes>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadImageResponse {
    pub message: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "publicId")]
    pub public_id: String,
}

/// Store an image on the media host without attaching it to a post
#[utoipa::path(
    post,
    path = "/api/posts/upload-image",
    tag = "posts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Stored image reference", body = UploadImageResponse),
        (status = 400, description = "Missing/invalid file or upload failure"),
        (status = 401, description = "Missing or invalid credential")
    )
)]
pub async fn upload_image(
    pool: web::Data<PgPool>,
    media: web::Data<Arc<dyn MediaStore>>,
    _user: AuthenticatedUser,
    MultipartForm(form): MultipartForm<UploadForm>,
) -> Result<HttpResponse> {
    let file = form
        .image
        .filter(|b| !b.data.is_empty())
        .map(|b| UploadFile {
            data: b.data.to_vec(),
            filename: b
                .file_name
                .clone()
                .unwrap_or_else(|| "upload".to_string()),
            content_type: b.content_type.as_ref().map(|m| m.to_string()),
        })
        .ok_or_else(|| AppError::BadRequest("No image file provided".to_string()))?;

    let service = PostService::new((**pool).clone(), media.get_ref().clone());
    let stored = service.upload_image(file).await?;

    Ok(HttpResponse::Ok().json(UploadImageResponse {
        message: "Image uploaded successfully".to_string(),
        image_url: stored.url,
        public_id: stored.public_id,
    }))
}
