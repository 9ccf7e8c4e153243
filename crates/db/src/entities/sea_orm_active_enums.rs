//! Enums stored as constrained strings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum UserRole {
    /// Regular member.
    #[sea_orm(string_value = "user")]
    User,
    /// Board administrator.
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl UserRole {
    /// Role name as stored and as carried in access tokens.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}
