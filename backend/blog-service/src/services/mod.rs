/// Business logic layer for the blog service
///
/// - Post lifecycle: validation, authorization, image-mode reconciliation,
///   persistence for create/update/delete
/// - Listing/search: filtered, paginated queries with totals
pub mod listing;
pub mod posts;

pub use listing::{ListingService, PostPage};
pub use posts::{BulkDeleteFailure, BulkDeleteReport, PostService};
