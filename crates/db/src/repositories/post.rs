//! Post repository for database operations.
//!
//! Implements the post store using SeaORM. A post and its attachments are
//! written and removed inside a single database transaction.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::error;

use corkboard_core::post::{
    Attachment, Author, NewPost, Post, PostError, PostRepository as PostRepoTrait,
};
use corkboard_shared::types::{AttachmentId, PostId, UserId};

use crate::entities::{post_attachments, posts, users};

/// Post repository implementation.
#[derive(Debug, Clone)]
pub struct PostRepository {
    db: DatabaseConnection,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl PostRepoTrait for PostRepository {
    async fn create(&self, input: NewPost) -> Result<PostId, PostError> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let txn = self.db.begin().await.map_err(repository_error)?;

        let post = posts::ActiveModel {
            user_id: Set(input.author_id.into_inner()),
            text: Set(input.text),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(repository_error)?;

        if !input.attachments.is_empty() {
            let rows = input
                .attachments
                .into_iter()
                .map(|a| post_attachments::ActiveModel {
                    post_id: Set(post.id),
                    file_url: Set(a.file_url),
                    file_key: Set(a.file_key),
                    file_name: Set(a.file_name),
                    file_type: Set(a.file_type),
                    file_size: Set(a.file_size),
                    created_at: Set(now),
                    ..Default::default()
                });
            post_attachments::Entity::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(repository_error)?;
        }

        txn.commit().await.map_err(repository_error)?;
        Ok(PostId::new(post.id))
    }

    async fn list(&self, limit: u64) -> Result<Vec<Post>, PostError> {
        let rows = posts::Entity::find()
            .find_also_related(users::Entity)
            .order_by_desc(posts::Column::CreatedAt)
            .order_by_desc(posts::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(repository_error)?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<i32> = rows.iter().map(|(post, _)| post.id).collect();
        let mut attachments: HashMap<i32, Vec<Attachment>> = HashMap::new();
        for model in post_attachments::Entity::find()
            .filter(post_attachments::Column::PostId.is_in(post_ids))
            .order_by_asc(post_attachments::Column::Id)
            .all(&self.db)
            .await
            .map_err(repository_error)?
        {
            attachments
                .entry(model.post_id)
                .or_default()
                .push(to_attachment(model));
        }

        Ok(rows
            .into_iter()
            .map(|(post, author)| Post {
                id: PostId::new(post.id),
                text: post.text,
                created_at: post.created_at.into(),
                author: Author {
                    id: UserId::new(post.user_id),
                    name: author.and_then(|user| user.name),
                },
                attachments: attachments.remove(&post.id).unwrap_or_default(),
            })
            .collect())
    }

    async fn delete(&self, id: PostId) -> Result<bool, PostError> {
        let txn = self.db.begin().await.map_err(repository_error)?;

        post_attachments::Entity::delete_many()
            .filter(post_attachments::Column::PostId.eq(id.into_inner()))
            .exec(&txn)
            .await
            .map_err(repository_error)?;

        let result = posts::Entity::delete_by_id(id.into_inner())
            .exec(&txn)
            .await
            .map_err(repository_error)?;

        txn.commit().await.map_err(repository_error)?;
        Ok(result.rows_affected > 0)
    }
}

fn to_attachment(model: post_attachments::Model) -> Attachment {
    Attachment {
        id: AttachmentId::new(model.id),
        file_url: model.file_url,
        file_key: model.file_key,
        file_name: model.file_name,
        file_type: model.file_type,
        file_size: model.file_size,
        created_at: model.created_at.into(),
    }
}

fn repository_error(err: DbErr) -> PostError {
    error!(error = %err, "Post query failed");
    PostError::Repository(err.to_string())
}
