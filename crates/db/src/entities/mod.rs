//! `SeaORM` entities.

pub mod post_attachments;
pub mod posts;
pub mod sea_orm_active_enums;
pub mod users;
