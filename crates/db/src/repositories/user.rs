//! User repository for database operations.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};

use corkboard_shared::types::UserId;

use crate::entities::{sea_orm_active_enums::UserRole, users};

/// Identity fields reported by the external auth provider.
///
/// `None` fields leave an existing value untouched.
#[derive(Debug, Clone, Default)]
pub struct UpsertUser {
    /// External-auth identifier.
    pub open_id: String,
    /// Display name.
    pub name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// How the user signed in.
    pub login_method: Option<String>,
    /// Explicit role.
    pub role: Option<UserRole>,
    /// Sign-in time, defaults to now.
    pub last_signed_in: Option<DateTime<Utc>>,
}

/// User repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
    owner_open_id: Option<String>,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            owner_open_id: None,
        }
    }

    /// Promote `open_id` to admin whenever it is upserted without a role.
    #[must_use]
    pub fn with_owner(mut self, open_id: Option<String>) -> Self {
        self.owner_open_id = open_id;
        self
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id.into_inner()).one(&self.db).await
    }

    /// Finds a user by external-auth identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_open_id(&self, open_id: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::OpenId.eq(open_id))
            .one(&self.db)
            .await
    }

    /// Insert a user or update the one with the same `open_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `open_id` is empty or the database write fails.
    pub async fn upsert(&self, input: UpsertUser) -> Result<users::Model, DbErr> {
        if input.open_id.trim().is_empty() {
            return Err(DbErr::Custom("open_id is required for upsert".to_string()));
        }

        let now = Utc::now();
        let role = input.role.or_else(|| {
            (self.owner_open_id.as_deref() == Some(input.open_id.as_str())).then_some(UserRole::Admin)
        });

        let mut updated = vec![users::Column::UpdatedAt, users::Column::LastSignedIn];
        if input.name.is_some() {
            updated.push(users::Column::Name);
        }
        if input.email.is_some() {
            updated.push(users::Column::Email);
        }
        if input.login_method.is_some() {
            updated.push(users::Column::LoginMethod);
        }
        if role.is_some() {
            updated.push(users::Column::Role);
        }

        let model = users::ActiveModel {
            open_id: Set(input.open_id.clone()),
            name: Set(input.name),
            email: Set(input.email),
            login_method: Set(input.login_method),
            role: Set(role.unwrap_or(UserRole::User)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            last_signed_in: Set(input.last_signed_in.unwrap_or(now).into()),
            ..Default::default()
        };

        users::Entity::insert(model)
            .on_conflict(
                OnConflict::column(users::Column::OpenId)
                    .update_columns(updated)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        self.find_by_open_id(&input.open_id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("user {}", input.open_id)))
    }
}
