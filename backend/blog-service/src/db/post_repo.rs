use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{ImageRef, Post};

/// Raw posts row; assembled into `Post` (with its `ImageRef`) on the way out.
#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    content: String,
    image_url: Option<String>,
    image_upload_url: Option<String>,
    image_public_id: Option<String>,
    author_id: Uuid,
    author_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            title: row.title,
            content: row.content,
            image: ImageRef::from_columns(
                row.image_url,
                row.image_upload_url,
                row.image_public_id,
            ),
            author_id: row.author_id,
            author_name: row.author_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Escape LIKE wildcards so a search term always matches literally.
pub fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Insert a new post, assigning id and timestamps.
pub async fn insert_post(
    pool: &PgPool,
    title: &str,
    content: &str,
    image: &ImageRef,
    author_id: Uuid,
    author_name: &str,
) -> Result<Post, sqlx::Error> {
    let (image_url, upload_url, public_id) = image.as_columns();

    let row = sqlx::query_as::<_, PostRow>(
        r#"
        INSERT INTO posts (title, content, image_url, image_upload_url, image_public_id, author_id, author_name)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, title, content, image_url, image_upload_url, image_public_id,
                  author_id, author_name, created_at, updated_at
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(image_url)
    .bind(upload_url)
    .bind(public_id)
    .bind(author_id)
    .bind(author_name)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

/// Find a post by ID
pub async fn find_post_by_id(pool: &PgPool, post_id: Uuid) -> Result<Option<Post>, sqlx::Error> {
    let row = sqlx::query_as::<_, PostRow>(
        r#"
        SELECT id, title, content, image_url, image_upload_url, image_public_id,
               author_id, author_name, created_at, updated_at
        FROM posts
        WHERE id = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Into::into))
}

/// Find all posts by an author, newest-first
pub async fn find_posts_by_author(
    pool: &PgPool,
    author_id: Uuid,
) -> Result<Vec<Post>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PostRow>(
        r#"
        SELECT id, title, content, image_url, image_upload_url, image_public_id,
               author_id, author_name, created_at, updated_at
        FROM posts
        WHERE author_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(author_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Page of posts, optionally filtered by a case-insensitive substring match
/// over title OR content, newest-first.
pub async fn search_posts(
    pool: &PgPool,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Post>, sqlx::Error> {
    let rows = match search {
        Some(term) => {
            let pattern = format!("%{}%", escape_like(term));
            sqlx::query_as::<_, PostRow>(
                r#"
                SELECT id, title, content, image_url, image_upload_url, image_public_id,
                       author_id, author_name, created_at, updated_at
                FROM posts
                WHERE title ILIKE $1 OR content ILIKE $1
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, PostRow>(
                r#"
                SELECT id, title, content, image_url, image_upload_url, image_public_id,
                       author_id, author_name, created_at, updated_at
                FROM posts
                ORDER BY created_at DESC
                LIMIT $1 OFFSET $2
                "#,
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Total matching count for the same filter as `search_posts`.
pub async fn count_posts(pool: &PgPool, search: Option<&str>) -> Result<i64, sqlx::Error> {
    let row = match search {
        Some(term) => {
            let pattern = format!("%{}%", escape_like(term));
            sqlx::query("SELECT COUNT(*) as count FROM posts WHERE title ILIKE $1 OR content ILIKE $1")
                .bind(pattern)
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query("SELECT COUNT(*) as count FROM posts")
                .fetch_one(pool)
                .await?
        }
    };

    Ok(row.get::<i64, _>("count"))
}

/// Full replace of the mutable fields; refreshes `updated_at`.
///
/// Returns `None` if the post no longer exists.
pub async fn update_post(
    pool: &PgPool,
    post_id: Uuid,
    title: &str,
    content: &str,
    image: &ImageRef,
) -> Result<Option<Post>, sqlx::Error> {
    let (image_url, upload_url, public_id) = image.as_columns();

    let row = sqlx::query_as::<_, PostRow>(
        r#"
        UPDATE posts
        SET title = $2, content = $3, image_url = $4, image_upload_url = $5,
            image_public_id = $6, updated_at = NOW()
        WHERE id = $1
        RETURNING id, title, content, image_url, image_upload_url, image_public_id,
                  author_id, author_name, created_at, updated_at
        "#,
    )
    .bind(post_id)
    .bind(title)
    .bind(content)
    .bind(image_url)
    .bind(upload_url)
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Into::into))
}

/// Delete a post record; returns whether a row was removed.
pub async fn delete_post(pool: &PgPool, post_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
