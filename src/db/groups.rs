use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::group;
use crate::error::{AppError, Result};

pub async fn find_by_slug(db: &DatabaseConnection, slug: &str) -> Result<group::Model> {
    group::Entity::find()
        .filter(group::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or(AppError::NotFound("group"))
}

/// Choices offered by the post form.
pub async fn all(db: &DatabaseConnection) -> Result<Vec<group::Model>> {
    Ok(group::Entity::find()
        .order_by_asc(group::Column::Title)
        .all(db)
        .await?)
}
