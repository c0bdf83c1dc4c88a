/// Database access layer
///
/// Repository functions over the shared `PgPool`. Raw SQL with explicit
/// column lists; row structs convert into the domain model.
pub mod post_repo;
