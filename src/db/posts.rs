//! Post queries. Listings are newest first, ties broken by id.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select,
    Set,
};
use std::collections::{BTreeSet, HashMap};

use crate::entities::{group, post, user};
use crate::error::{AppError, Result};
use crate::models::PostView;
use crate::pagination::{Page, paginate};

fn newest_first(query: Select<post::Entity>) -> Select<post::Entity> {
    query
        .order_by_desc(post::Column::PubDate)
        .order_by_desc(post::Column::Id)
}

pub async fn page_all(db: &DatabaseConnection, page: Option<&str>) -> Result<Page<PostView>> {
    page_of(db, post::Entity::find(), page).await
}

pub async fn page_for_group(db: &DatabaseConnection, group_id: i32, page: Option<&str>) -> Result<Page<PostView>> {
    page_of(db, post::Entity::find().filter(post::Column::GroupId.eq(group_id)), page).await
}

pub async fn page_for_author(db: &DatabaseConnection, author_id: i32, page: Option<&str>) -> Result<Page<PostView>> {
    page_of(db, post::Entity::find().filter(post::Column::AuthorId.eq(author_id)), page).await
}

async fn page_of(db: &DatabaseConnection, query: Select<post::Entity>, page: Option<&str>) -> Result<Page<PostView>> {
    let mut page = paginate(newest_first(query), db, page).await?;
    let posts = std::mem::take(&mut page.object_list);
    let views = with_related(db, posts).await?;
    Ok(page.with_items(views))
}

/// Attaches authors and groups with one query each.
async fn with_related(db: &DatabaseConnection, posts: Vec<post::Model>) -> Result<Vec<PostView>> {
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let author_ids: BTreeSet<i32> = posts.iter().map(|p| p.author_id).collect();
    let authors: HashMap<i32, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let group_ids: BTreeSet<i32> = posts.iter().filter_map(|p| p.group_id).collect();
    let groups: HashMap<i32, group::Model> = if group_ids.is_empty() {
        HashMap::new()
    } else {
        group::Entity::find()
            .filter(group::Column::Id.is_in(group_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|g| (g.id, g))
            .collect()
    };

    posts
        .into_iter()
        .map(|post| {
            let author = authors
                .get(&post.author_id)
                .ok_or_else(|| AppError::Internal(format!("post {} has no author", post.id)))?;
            let group = post.group_id.and_then(|id| groups.get(&id));
            Ok(PostView::new(post, author, group))
        })
        .collect()
}

pub async fn find(db: &DatabaseConnection, id: i32) -> Result<post::Model> {
    post::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound("post"))
}

pub async fn view(db: &DatabaseConnection, post: post::Model) -> Result<PostView> {
    with_related(db, vec![post])
        .await?
        .pop()
        .ok_or(AppError::NotFound("post"))
}

pub async fn count_for_author(db: &DatabaseConnection, author_id: i32) -> Result<u64> {
    Ok(post::Entity::find()
        .filter(post::Column::AuthorId.eq(author_id))
        .count(db)
        .await?)
}

pub async fn create(
    db: &DatabaseConnection,
    author: &user::Model,
    text: String,
    group_id: Option<i32>,
    image: Option<String>,
) -> Result<post::Model> {
    let post = post::ActiveModel {
        text: Set(text),
        pub_date: Set(Utc::now()),
        group_id: Set(group_id),
        author_id: Set(author.id),
        image: Set(image),
        ..Default::default()
    };
    Ok(post.insert(db).await?)
}

/// Text and group only; author, image and `pub_date` stay as they are.
pub async fn update(db: &DatabaseConnection, post: post::Model, text: String, group_id: Option<i32>) -> Result<post::Model> {
    let mut post: post::ActiveModel = post.into();
    post.text = Set(text);
    post.group_id = Set(group_id);
    Ok(post.update(db).await?)
}
