//! Shapes handed to the renderer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::{comment, group, post, user};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPublic {
    pub id: i32,
    pub username: String,
}

impl From<&user::Model> for UserPublic {
    fn from(user: &user::Model) -> Self {
        UserPublic {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub id: i32,
    pub title: String,
    pub slug: String,
}

impl From<&group::Model> for GroupSummary {
    fn from(group: &group::Model) -> Self {
        GroupSummary {
            id: group.id,
            title: group.title.clone(),
            slug: group.slug.clone(),
        }
    }
}

/// A post together with its author and group.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: i32,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: UserPublic,
    pub group: Option<GroupSummary>,
    pub image: Option<String>,
}

impl PostView {
    pub fn new(post: post::Model, author: &user::Model, group: Option<&group::Model>) -> Self {
        PostView {
            id: post.id,
            text: post.text,
            pub_date: post.pub_date,
            author: author.into(),
            group: group.map(GroupSummary::from),
            image: post.image,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i32,
    pub text: String,
    pub created: DateTime<Utc>,
    pub author: UserPublic,
}

impl CommentView {
    pub fn new(comment: comment::Model, author: &user::Model) -> Self {
        CommentView {
            id: comment.id,
            text: comment.text,
            created: comment.created,
            author: author.into(),
        }
    }
}
