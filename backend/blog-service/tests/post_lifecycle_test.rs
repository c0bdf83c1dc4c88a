/// End-to-end service tests against a containerized Postgres.
///
/// These exercise the post lifecycle through the service layer: creation,
/// ownership checks, image-mode reconciliation, listing/search and batch
/// deletion, with the media host replaced by a recording double.
mod common;

use std::error::Error;
use std::sync::Arc;

use uuid::Uuid;

use blog_service::media::MediaStore;
use blog_service::models::{ImageRef, NewPost, PostInput, PostUpdate, UploadFile};
use blog_service::services::{ListingService, PostService};
use blog_service::AppError;

use common::mock_media_store::MockMediaStore;
use common::{identity, sample_content, setup_test_db};

fn services(pool: &sqlx::PgPool) -> (PostService, ListingService, Arc<MockMediaStore>) {
    let media = Arc::new(MockMediaStore::new());
    let posts = PostService::new(pool.clone(), media.clone() as Arc<dyn MediaStore>);
    let listing = ListingService::new(pool.clone());
    (posts, listing, media)
}

fn post_input(title: &str) -> PostInput {
    PostInput::parse(title, &sample_content(), None).unwrap()
}

fn png_file() -> UploadFile {
    UploadFile {
        data: vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a],
        filename: "photo.png".to_string(),
        content_type: Some("image/png".to_string()),
    }
}

fn plain_update(title: &str) -> PostUpdate {
    PostUpdate {
        input: post_input(title),
        remove_image: false,
        file: None,
    }
}

#[tokio::test]
async fn create_and_fetch_round_trip() -> Result<(), Box<dyn Error>> {
    let pool = setup_test_db().await?;
    let (posts, _, _) = services(&pool);
    let alice = identity("alice");

    let created = posts
        .create_post(
            &alice,
            NewPost {
                input: PostInput::parse(
                    "My first post",
                    &sample_content(),
                    Some("https://pics.example/cover.png"),
                )?,
                file: None,
            },
        )
        .await?;

    let fetched = posts.get_post(created.id).await?.ok_or("post missing")?;
    assert_eq!(fetched.title, "My first post");
    assert_eq!(fetched.content, sample_content());
    assert_eq!(fetched.author_id, alice.id);
    assert_eq!(fetched.author_name, "alice");
    assert_eq!(
        fetched.image,
        ImageRef::Url("https://pics.example/cover.png".to_string())
    );

    assert!(posts.get_post(Uuid::new_v4()).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn rejected_input_never_reaches_storage() -> Result<(), Box<dyn Error>> {
    let pool = setup_test_db().await?;
    let (posts, listing, media) = services(&pool);
    let alice = identity("alice");

    assert!(PostInput::parse("tiny", &sample_content(), None).is_err());
    assert!(PostInput::parse("a valid title", "too short", None).is_err());

    // A non-image upload is rejected by the service before any write.
    let err = posts
        .create_post(
            &alice,
            NewPost {
                input: post_input("a valid title"),
                file: Some(UploadFile {
                    content_type: Some("application/pdf".to_string()),
                    ..png_file()
                }),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let page = listing.list(None, 1, 10).await?;
    assert_eq!(page.total, 0);
    assert!(media.stored_ids().is_empty());
    Ok(())
}

#[tokio::test]
async fn uploaded_file_wins_over_url_on_create() -> Result<(), Box<dyn Error>> {
    let pool = setup_test_db().await?;
    let (posts, _, media) = services(&pool);
    let alice = identity("alice");

    let created = posts
        .create_post(
            &alice,
            NewPost {
                input: PostInput::parse(
                    "Post with both image inputs",
                    &sample_content(),
                    Some("https://pics.example/ignored.png"),
                )?,
                file: Some(png_file()),
            },
        )
        .await?;

    assert!(created.image.is_stored());
    assert_eq!(created.image.public_id(), Some("mock-0"));
    assert_eq!(media.stored_ids(), vec!["mock-0".to_string()]);
    Ok(())
}

#[tokio::test]
async fn image_modes_stay_exclusive_across_updates() -> Result<(), Box<dyn Error>> {
    let pool = setup_test_db().await?;
    let (posts, _, _) = services(&pool);
    let alice = identity("alice");

    let created = posts
        .create_post(
            &alice,
            NewPost {
                input: post_input("Exclusivity check post"),
                file: Some(png_file()),
            },
        )
        .await?;

    // Switch to URL mode, then back to an uploaded file. After each step
    // the row must carry exactly one image mode.
    let updated = posts
        .update_post(
            &alice,
            created.id,
            PostUpdate {
                input: PostInput::parse(
                    "Exclusivity check post",
                    &sample_content(),
                    Some("https://pics.example/new.png"),
                )?,
                remove_image: false,
                file: None,
            },
        )
        .await?;
    assert_eq!(
        updated.image,
        ImageRef::Url("https://pics.example/new.png".to_string())
    );

    let updated = posts
        .update_post(
            &alice,
            created.id,
            PostUpdate {
                input: post_input("Exclusivity check post"),
                remove_image: false,
                file: Some(png_file()),
            },
        )
        .await?;
    assert!(updated.image.is_stored());
    let (url_col, upload_col, _) = updated.image.as_columns();
    assert!(url_col.is_none() && upload_col.is_some());

    // A stored image survives an update that touches neither image field.
    let updated = posts
        .update_post(&alice, created.id, plain_update("Exclusivity check post"))
        .await?;
    assert!(updated.image.is_stored());
    Ok(())
}

#[tokio::test]
async fn only_the_owner_can_update_or_delete() -> Result<(), Box<dyn Error>> {
    let pool = setup_test_db().await?;
    let (posts, _, _) = services(&pool);
    let alice = identity("alice");
    let bob = identity("bob");

    let created = posts
        .create_post(
            &alice,
            NewPost {
                input: post_input("Alice owns this post"),
                file: None,
            },
        )
        .await?;

    let err = posts
        .update_post(&bob, created.id, plain_update("Bob was here instead"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = posts.delete_post(&bob, created.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let unchanged = posts.get_post(created.id).await?.ok_or("post missing")?;
    assert_eq!(unchanged.title, "Alice owns this post");

    posts.delete_post(&alice, created.id).await?;
    assert!(posts.get_post(created.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn pagination_reports_totals() -> Result<(), Box<dyn Error>> {
    let pool = setup_test_db().await?;
    let (posts, listing, _) = services(&pool);
    let alice = identity("alice");

    for i in 0..10 {
        posts
            .create_post(
                &alice,
                NewPost {
                    input: post_input(&format!("Pagination post number {i:02}")),
                    file: None,
                },
            )
            .await?;
    }

    let page = listing.list(None, 2, 6).await?;
    assert_eq!(page.posts.len(), 4);
    assert_eq!(page.total, 10);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.current_page, 2);

    // Newest-first ordering puts the four oldest posts on page two.
    let titles: Vec<&str> = page.posts.iter().map(|p| p.title.as_str()).collect();
    for i in 0..4 {
        assert!(titles.contains(&format!("Pagination post number {i:02}").as_str()));
    }

    // A page past the end is empty but keeps the totals, even at the
    // extreme end of the page range.
    let page = listing.list(None, 5, 6).await?;
    assert!(page.posts.is_empty());
    assert_eq!(page.total, 10);

    let page = listing.list(None, i64::MAX, 6).await?;
    assert!(page.posts.is_empty());
    assert_eq!(page.total, 10);
    Ok(())
}

#[tokio::test]
async fn search_matches_title_and_content_case_insensitively() -> Result<(), Box<dyn Error>> {
    let pool = setup_test_db().await?;
    let (posts, listing, _) = services(&pool);
    let alice = identity("alice");

    posts
        .create_post(
            &alice,
            NewPost {
                input: PostInput::parse("Alpha Release Notes", &sample_content(), None)?,
                file: None,
            },
        )
        .await?;
    posts
        .create_post(
            &alice,
            NewPost {
                input: PostInput::parse(
                    "Weekly digest",
                    "The ALPHA milestone came up repeatedly in this week's discussions here.",
                    None,
                )?,
                file: None,
            },
        )
        .await?;

    let page = listing.list(Some("alpha"), 1, 10).await?;
    assert_eq!(page.total, 2);

    let page = listing.list(Some("release"), 1, 10).await?;
    assert_eq!(page.total, 1);
    assert_eq!(page.posts[0].title, "Alpha Release Notes");

    // Blank search terms mean "no filter".
    let page = listing.list(Some("   "), 1, 10).await?;
    assert_eq!(page.total, 2);

    let page = listing.list(Some("no such phrase"), 1, 10).await?;
    assert_eq!(page.total, 0);
    Ok(())
}

#[tokio::test]
async fn my_posts_only_lists_the_requesting_author() -> Result<(), Box<dyn Error>> {
    let pool = setup_test_db().await?;
    let (posts, listing, _) = services(&pool);
    let alice = identity("alice");
    let bob = identity("bob");

    for title in ["Alice writes first", "Alice writes again"] {
        posts
            .create_post(
                &alice,
                NewPost {
                    input: post_input(title),
                    file: None,
                },
            )
            .await?;
    }
    posts
        .create_post(
            &bob,
            NewPost {
                input: post_input("Bob writes once"),
                file: None,
            },
        )
        .await?;

    let mine = listing.list_by_author(alice.id).await?;
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|p| p.author_id == alice.id));
    Ok(())
}

#[tokio::test]
async fn remove_image_releases_the_stored_asset_once() -> Result<(), Box<dyn Error>> {
    let pool = setup_test_db().await?;
    let (posts, _, media) = services(&pool);
    let alice = identity("alice");

    let created = posts
        .create_post(
            &alice,
            NewPost {
                input: post_input("Post losing its image"),
                file: Some(png_file()),
            },
        )
        .await?;
    let public_id = created.image.public_id().ok_or("expected stored image")?.to_string();

    let updated = posts
        .update_post(
            &alice,
            created.id,
            PostUpdate {
                input: post_input("Post losing its image"),
                remove_image: true,
                file: None,
            },
        )
        .await?;

    assert_eq!(updated.image, ImageRef::None);
    assert_eq!(media.released_ids(), vec![public_id]);

    let persisted = posts.get_post(created.id).await?.ok_or("post missing")?;
    assert_eq!(persisted.image, ImageRef::None);
    Ok(())
}

#[tokio::test]
async fn rejected_replacement_file_leaves_the_old_asset_alone() -> Result<(), Box<dyn Error>> {
    let pool = setup_test_db().await?;
    let (posts, _, media) = services(&pool);
    let alice = identity("alice");

    let created = posts
        .create_post(
            &alice,
            NewPost {
                input: post_input("Post keeping its image"),
                file: Some(png_file()),
            },
        )
        .await?;

    // A non-image replacement must fail before the stored asset is released.
    let err = posts
        .update_post(
            &alice,
            created.id,
            PostUpdate {
                input: post_input("Post keeping its image"),
                remove_image: false,
                file: Some(UploadFile {
                    content_type: Some("application/pdf".to_string()),
                    ..png_file()
                }),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(media.released_ids().is_empty());
    let unchanged = posts.get_post(created.id).await?.ok_or("post missing")?;
    assert_eq!(unchanged.image, created.image);
    Ok(())
}

#[tokio::test]
async fn remove_image_wins_over_a_new_file_in_the_same_request() -> Result<(), Box<dyn Error>> {
    let pool = setup_test_db().await?;
    let (posts, _, media) = services(&pool);
    let alice = identity("alice");

    let created = posts
        .create_post(
            &alice,
            NewPost {
                input: post_input("Removal precedence post"),
                file: Some(png_file()),
            },
        )
        .await?;

    let updated = posts
        .update_post(
            &alice,
            created.id,
            PostUpdate {
                input: post_input("Removal precedence post"),
                remove_image: true,
                file: Some(png_file()),
            },
        )
        .await?;

    // The accompanying file is ignored outright, not stored and discarded.
    assert_eq!(updated.image, ImageRef::None);
    assert_eq!(media.stored_ids().len(), 1);
    Ok(())
}

#[tokio::test]
async fn delete_removes_the_record_even_when_release_fails() -> Result<(), Box<dyn Error>> {
    let pool = setup_test_db().await?;
    let (posts, _, media) = services(&pool);
    let alice = identity("alice");

    let created = posts
        .create_post(
            &alice,
            NewPost {
                input: post_input("Doomed post with an image"),
                file: Some(png_file()),
            },
        )
        .await?;

    media.fail_release();
    posts.delete_post(&alice, created.id).await?;

    assert!(posts.get_post(created.id).await?.is_none());
    assert_eq!(media.released_ids().len(), 1);
    Ok(())
}

#[tokio::test]
async fn create_writes_nothing_when_the_store_fails() -> Result<(), Box<dyn Error>> {
    let pool = setup_test_db().await?;
    let (posts, listing, media) = services(&pool);
    let alice = identity("alice");

    media.fail_store();
    let err = posts
        .create_post(
            &alice,
            NewPost {
                input: post_input("Never persisted post"),
                file: Some(png_file()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Upload(_)));

    let page = listing.list(None, 1, 10).await?;
    assert_eq!(page.total, 0);
    Ok(())
}

#[tokio::test]
async fn batch_delete_reports_per_id_outcomes() -> Result<(), Box<dyn Error>> {
    let pool = setup_test_db().await?;
    let (posts, _, _) = services(&pool);
    let alice = identity("alice");
    let bob = identity("bob");

    let mut alice_ids = Vec::new();
    for title in ["Alice batch post one", "Alice batch post two"] {
        let post = posts
            .create_post(
                &alice,
                NewPost {
                    input: post_input(title),
                    file: None,
                },
            )
            .await?;
        alice_ids.push(post.id);
    }
    let bobs = posts
        .create_post(
            &bob,
            NewPost {
                input: post_input("Bob keeps this post"),
                file: None,
            },
        )
        .await?;
    let missing = Uuid::new_v4();

    let report = posts
        .delete_posts(&alice, &[alice_ids[0], bobs.id, alice_ids[1], missing])
        .await;

    assert_eq!(report.succeeded, alice_ids);
    assert_eq!(report.failed.len(), 2);

    let bob_failure = report.failed.iter().find(|f| f.id == bobs.id).unwrap();
    assert!(bob_failure.reason.contains("Not authorized"));
    let missing_failure = report.failed.iter().find(|f| f.id == missing).unwrap();
    assert!(missing_failure.reason.contains("Post not found"));

    // Earlier deletions stand despite later failures.
    assert!(posts.get_post(alice_ids[0]).await?.is_none());
    assert!(posts.get_post(bobs.id).await?.is_some());
    Ok(())
}
