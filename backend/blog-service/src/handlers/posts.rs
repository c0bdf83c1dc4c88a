/// Post handlers - HTTP endpoints for post operations
use actix_multipart::form::{bytes::Bytes as MultipartBytes, text::Text, MultipartForm};
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::Result;
use crate::media::MediaStore;
use crate::models::{NewPost, PostInput, PostResponse, PostUpdate, UploadFile};
use crate::models::AuthenticatedUser;
use crate::services::{BulkDeleteReport, ListingService, PostService};

/// Listing query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Case-insensitive substring to match against title or content
    pub search: Option<String>,
    /// 1-based page number
    pub page: Option<i64>,
    /// Page size (capped server-side)
    pub limit: Option<i64>,
}

/// Listing response envelope
#[derive(Debug, Serialize, ToSchema)]
pub struct ListPostsResponse {
    pub posts: Vec<PostResponse>,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
    #[serde(rename = "currentPage")]
    pub current_page: i64,
    pub total: i64,
}

/// Multipart body shared by create and update.
///
/// `image` is the uploaded file; `imageURL` references an externally hosted
/// image instead. A file wins if both arrive in one request.
#[derive(Debug, MultipartForm)]
pub struct PostForm {
    pub title: Text<String>,
    pub content: Text<String>,
    #[multipart(rename = "imageURL")]
    pub image_url: Option<Text<String>>,
    #[multipart(rename = "removeImage")]
    pub remove_image: Option<Text<String>>,
    #[multipart(limit = "5MB")]
    pub image: Option<MultipartBytes>,
}

impl PostForm {
    /// Validate the text fields and lift the file part into `UploadFile`.
    ///
    /// Browsers submit an empty file part when no file was picked; that
    /// counts as no file.
    fn into_parts(self) -> Result<(PostInput, Option<UploadFile>, bool)> {
        let input = PostInput::parse(
            &self.title,
            &self.content,
            self.image_url.as_ref().map(|t| t.as_str()),
        )?;

        let file = self
            .image
            .filter(|b| !b.data.is_empty())
            .map(|b| UploadFile {
                data: b.data.to_vec(),
                filename: b
                    .file_name
                    .clone()
                    .unwrap_or_else(|| "upload".to_string()),
                content_type: b.content_type.as_ref().map(|m| m.to_string()),
            });

        let remove_image = self
            .remove_image
            .map(|t| t.as_str() == "true")
            .unwrap_or(false);

        Ok((input, file, remove_image))
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchDeleteRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteConfirmation {
    pub message: String,
}

/// List posts with optional search and pagination
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of posts, newest first", body = ListPostsResponse)
    )
)]
pub async fn list_posts(
    pool: web::Data<PgPool>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let service = ListingService::new((**pool).clone());
    let page = service
        .list(
            query.search.as_deref(),
            query.page.unwrap_or(1),
            query.limit.unwrap_or(10),
        )
        .await?;

    Ok(HttpResponse::Ok().json(ListPostsResponse {
        posts: page.posts.into_iter().map(PostResponse::from).collect(),
        total_pages: page.total_pages,
        current_page: page.current_page,
        total: page.total,
    }))
}

/// Get a single post
#[utoipa::path(
    get,
    path = "/api/posts/{post_id}",
    tag = "posts",
    responses(
        (status = 200, description = "The post", body = PostResponse),
        (status = 404, description = "No such post")
    )
)]
pub async fn get_post(
    pool: web::Data<PgPool>,
    media: web::Data<Arc<dyn MediaStore>>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = PostService::new((**pool).clone(), media.get_ref().clone());
    match service.get_post(*post_id).await? {
        Some(post) => Ok(HttpResponse::Ok().json(PostResponse::from(post))),
        None => Err(crate::error::AppError::NotFound(
            "Post not found".to_string(),
        )),
    }
}

/// Get the calling user's posts, newest-first
#[utoipa::path(
    get,
    path = "/api/posts/user/me",
    tag = "posts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's posts", body = [PostResponse]),
        (status = 401, description = "Missing or invalid credential")
    )
)]
pub async fn my_posts(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let service = ListingService::new((**pool).clone());
    let posts = service.list_by_author(user.id).await?;

    Ok(HttpResponse::Ok().json(
        posts
            .into_iter()
            .map(PostResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// Create a post (multipart: title, content, imageURL?, image?)
#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Created post", body = PostResponse),
        (status = 400, description = "Validation or upload failure"),
        (status = 401, description = "Missing or invalid credential")
    )
)]
pub async fn create_post(
    pool: web::Data<PgPool>,
    media: web::Data<Arc<dyn MediaStore>>,
    user: AuthenticatedUser,
    MultipartForm(form): MultipartForm<PostForm>,
) -> Result<HttpResponse> {
    let (input, file, _) = form.into_parts()?;

    let service = PostService::new((**pool).clone(), media.get_ref().clone());
    let post = service.create_post(&user, NewPost { input, file }).await?;

    Ok(HttpResponse::Created().json(PostResponse::from(post)))
}

/// Update a post (owner only; multipart: title, content, imageURL?,
/// removeImage?, image?)
#[utoipa::path(
    put,
    path = "/api/posts/{post_id}",
    tag = "posts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated post", body = PostResponse),
        (status = 400, description = "Validation or upload failure"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such post")
    )
)]
pub async fn update_post(
    pool: web::Data<PgPool>,
    media: web::Data<Arc<dyn MediaStore>>,
    user: AuthenticatedUser,
    post_id: web::Path<Uuid>,
    MultipartForm(form): MultipartForm<PostForm>,
) -> Result<HttpResponse> {
    let (input, file, remove_image) = form.into_parts()?;

    let service = PostService::new((**pool).clone(), media.get_ref().clone());
    let post = service
        .update_post(
            &user,
            *post_id,
            PostUpdate {
                input,
                remove_image,
                file,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

/// Delete a post (owner only)
#[utoipa::path(
    delete,
    path = "/api/posts/{post_id}",
    tag = "posts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deleted", body = DeleteConfirmation),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such post")
    )
)]
pub async fn delete_post(
    pool: web::Data<PgPool>,
    media: web::Data<Arc<dyn MediaStore>>,
    user: AuthenticatedUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = PostService::new((**pool).clone(), media.get_ref().clone());
    service.delete_post(&user, *post_id).await?;

    Ok(HttpResponse::Ok().json(DeleteConfirmation {
        message: "Post deleted successfully".to_string(),
    }))
}

/// Delete several posts in one request, reporting per-id outcomes
#[utoipa::path(
    post,
    path = "/api/posts/batch-delete",
    tag = "posts",
    security(("bearer_auth" = [])),
    request_body = BatchDeleteRequest,
    responses(
        (status = 200, description = "Per-id outcome report", body = BulkDeleteReport)
    )
)]
pub async fn batch_delete_posts(
    pool: web::Data<PgPool>,
    media: web::Data<Arc<dyn MediaStore>>,
    user: AuthenticatedUser,
    req: web::Json<BatchDeleteRequest>,
) -> Result<HttpResponse> {
    let service = PostService::new((**pool).clone(), media.get_ref().clone());
    let report = service.delete_posts(&user, &req.ids).await;

    Ok(HttpResponse::Ok().json(report))
}
