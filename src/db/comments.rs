use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entities::{comment, user};
use crate::error::{AppError, Result};
use crate::models::CommentView;

/// Comments on a post, oldest first.
pub async fn for_post(db: &DatabaseConnection, post_id: i32) -> Result<Vec<CommentView>> {
    let rows = comment::Entity::find()
        .filter(comment::Column::PostId.eq(post_id))
        .order_by_asc(comment::Column::Created)
        .order_by_asc(comment::Column::Id)
        .find_also_related(user::Entity)
        .all(db)
        .await?;

    rows.into_iter()
        .map(|(comment, author)| {
            let author = author
                .ok_or_else(|| AppError::Internal(format!("comment {} has no author", comment.id)))?;
            Ok(CommentView::new(comment, &author))
        })
        .collect()
}

pub async fn create(db: &DatabaseConnection, post_id: i32, author: &user::Model, text: String) -> Result<comment::Model> {
    let comment = comment::ActiveModel {
        post_id: Set(post_id),
        author_id: Set(author.id),
        text: Set(text),
        created: Set(Utc::now()),
        ..Default::default()
    };
    Ok(comment.insert(db).await?)
}
