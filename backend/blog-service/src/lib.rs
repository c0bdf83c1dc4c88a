/// Blog Service Library
///
/// REST backend for a single-collection blogging application: posts with
/// single-owner authorization and dual-mode image attachment (external URL
/// or uploaded asset on a media host).
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `models`: Post entity, image tri-state, input validation, DTOs
/// - `services`: Business logic (post lifecycle, listing/search)
/// - `db`: Database access layer
/// - `media`: Media host trait and Cloudinary adapter
/// - `middleware`: Authentication extractor and request timing
/// - `auth`: Bearer token (JWT) validation
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
