//! Integration tests for the post repository.

mod common;

use chrono::{TimeZone, Utc};
use corkboard_core::post::{AttachmentInput, NewPost, PostRepository as _};
use corkboard_db::PostRepository;
use corkboard_db::entities::{post_attachments, posts};
use corkboard_shared::types::PostId;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

fn attachment(name: &str, mime: &str) -> AttachmentInput {
    AttachmentInput {
        file_url: format!("/api/v1/files/school-files/{name}"),
        file_key: format!("school-files/{name}"),
        file_name: name.to_string(),
        file_type: mime.to_string(),
        file_size: 42,
    }
}

#[tokio::test]
async fn test_create_and_list_with_author_and_attachments() {
    let db = common::test_db().await;
    let author = common::seed_user(&db, "open-a", "A").await;
    let repo = PostRepository::new(db.clone());

    let id = repo
        .create(NewPost {
            author_id: author,
            text: Some("hello".to_string()),
            attachments: vec![
                attachment("a.pdf", "application/pdf"),
                attachment("b.png", "image/png"),
            ],
        })
        .await
        .expect("Failed to create post");

    let feed = repo.list(100).await.expect("Failed to list");

    assert_eq!(feed.len(), 1);
    let post = &feed[0];
    assert_eq!(post.id, id);
    assert_eq!(post.text.as_deref(), Some("hello"));
    assert_eq!(post.author.id, author);
    assert_eq!(post.author.name.as_deref(), Some("A"));
    let names: Vec<&str> = post.attachments.iter().map(|a| a.file_name.as_str()).collect();
    assert_eq!(names, vec!["a.pdf", "b.png"]);
    assert_eq!(post.attachments[1].file_type, "image/png");
    assert_eq!(post.attachments[0].file_size, 42);
}

#[tokio::test]
async fn test_list_limit_returns_newest_first() {
    let db = common::test_db().await;
    let author = common::seed_user(&db, "open-a", "A").await;
    let repo = PostRepository::new(db.clone());

    let mut ids = Vec::new();
    for n in 0..3 {
        ids.push(
            repo.create(NewPost {
                author_id: author,
                text: Some(format!("post {n}")),
                attachments: Vec::new(),
            })
            .await
            .expect("Failed to create post"),
        );
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let listed: Vec<PostId> = repo
        .list(2)
        .await
        .expect("Failed to list")
        .into_iter()
        .map(|p| p.id)
        .collect();

    assert_eq!(listed, vec![ids[2], ids[1]]);
}

#[tokio::test]
async fn test_equal_timestamps_order_by_id_desc() {
    let db = common::test_db().await;
    let author = common::seed_user(&db, "open-a", "A").await;
    let at = Utc.with_ymd_and_hms(2026, 1, 8, 12, 0, 0).unwrap();

    let mut ids = Vec::new();
    for text in ["first", "second"] {
        let post = posts::ActiveModel {
            user_id: Set(author.into_inner()),
            text: Set(Some(text.to_string())),
            created_at: Set(at.into()),
            updated_at: Set(at.into()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .expect("Failed to insert post");
        ids.push(post.id);
    }

    let feed = PostRepository::new(db.clone())
        .list(10)
        .await
        .expect("Failed to list");

    assert_eq!(feed[0].id.into_inner(), ids[1]);
    assert_eq!(feed[1].id.into_inner(), ids[0]);
}

#[tokio::test]
async fn test_delete_removes_post_and_attachments() {
    let db = common::test_db().await;
    let author = common::seed_user(&db, "open-a", "A").await;
    let repo = PostRepository::new(db.clone());
    let keep = repo
        .create(NewPost {
            author_id: author,
            text: Some("keep".to_string()),
            attachments: vec![attachment("keep.pdf", "application/pdf")],
        })
        .await
        .unwrap();
    let gone = repo
        .create(NewPost {
            author_id: author,
            text: None,
            attachments: vec![attachment("gone.pdf", "application/pdf")],
        })
        .await
        .unwrap();

    assert!(repo.delete(gone).await.unwrap());

    let feed = repo.list(100).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].id, keep);
    assert_eq!(post_attachments::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_delete_missing_returns_false_and_changes_nothing() {
    let db = common::test_db().await;
    let author = common::seed_user(&db, "open-a", "A").await;
    let repo = PostRepository::new(db.clone());
    repo.create(NewPost {
        author_id: author,
        text: Some("stay".to_string()),
        attachments: Vec::new(),
    })
    .await
    .unwrap();
    let before = repo.list(100).await.unwrap();

    assert!(!repo.delete(PostId::new(9999)).await.unwrap());

    assert_eq!(repo.list(100).await.unwrap(), before);
}

#[tokio::test]
async fn test_create_with_unknown_author_rolls_back() {
    let db = common::test_db().await;
    let repo = PostRepository::new(db.clone());

    let result = repo
        .create(NewPost {
            author_id: corkboard_shared::types::UserId::new(404),
            text: Some("orphan".to_string()),
            attachments: vec![attachment("x.pdf", "application/pdf")],
        })
        .await;

    assert!(result.is_err());
    assert_eq!(posts::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(post_attachments::Entity::find().count(&db).await.unwrap(), 0);
}
