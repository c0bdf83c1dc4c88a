/// HTTP handlers for the blog REST API
///
/// - Posts: list/search, read, create, update, delete (single and batch)
/// - Uploads: standalone image upload to the media host
pub mod posts;
pub mod uploads;

pub use posts::{
    batch_delete_posts, create_post, delete_post, get_post, list_posts, my_posts, update_post,
};
pub use uploads::upload_image;
