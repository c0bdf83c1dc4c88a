/// Listing/search service - filtered, paginated post queries
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::post_repo;
use crate::error::Result;
use crate::models::Post;

/// Hard cap on the caller-controlled page size.
pub const MAX_PAGE_SIZE: i64 = 100;

/// One page of listing results plus the pre-pagination totals.
#[derive(Debug)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

pub struct ListingService {
    pool: PgPool,
}

impl ListingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List posts newest-first, optionally filtered by a case-insensitive
    /// substring match over title OR content.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: i64,
        limit: i64,
    ) -> Result<PostPage> {
        let (page, limit) = normalize_page(page, limit);
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        let total = post_repo::count_posts(&self.pool, search).await?;
        let posts =
            post_repo::search_posts(&self.pool, search, limit, page_offset(page, limit)).await?;

        Ok(PostPage {
            posts,
            total,
            total_pages: total_pages(total, limit),
            current_page: page,
        })
    }

    /// All posts owned by an author, newest-first, unpaginated.
    pub async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Post>> {
        Ok(post_repo::find_posts_by_author(&self.pool, author_id).await?)
    }
}

/// Floor page at 1, clamp limit to [1, MAX_PAGE_SIZE].
fn normalize_page(page: i64, limit: i64) -> (i64, i64) {
    (page.max(1), limit.clamp(1, MAX_PAGE_SIZE))
}

/// OFFSET for a 1-based page; saturates so an absurd page number yields an
/// empty page instead of overflowing.
fn page_offset(page: i64, limit: i64) -> i64 {
    (page - 1).saturating_mul(limit)
}

fn total_pages(total: i64, limit: i64) -> i64 {
    (total + limit - 1) / limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_is_a_ceiling_division() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(10, 6), 2);
    }

    #[test]
    fn page_and_limit_are_normalized() {
        assert_eq!(normalize_page(0, 0), (1, 1));
        assert_eq!(normalize_page(-3, -10), (1, 1));
        assert_eq!(normalize_page(2, 6), (2, 6));
        assert_eq!(normalize_page(1, 10_000), (1, MAX_PAGE_SIZE));
    }

    #[test]
    fn page_offset_saturates_instead_of_overflowing() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(3, 6), 12);
        assert_eq!(page_offset(i64::MAX, MAX_PAGE_SIZE), i64::MAX);
    }
}
