use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::user;
use crate::error::Result;

pub async fn find_by_username(db: &DatabaseConnection, username: &str) -> Result<Option<user::Model>> {
    Ok(user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?)
}

pub async fn create(db: &DatabaseConnection, username: &str, password_hash: String) -> Result<user::Model> {
    let user = user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(password_hash),
        date_joined: Set(Utc::now()),
        ..Default::default()
    };
    Ok(user.insert(db).await?)
}
