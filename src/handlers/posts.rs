//! Post listings, detail, create/edit and comments.

use poem::web::{Data, Path, Query};
use poem::{Response, handler};
use serde::Serialize;

use super::{parse_post_id, post_detail_url, profile_url, redirect, render};
use crate::AppState;
use crate::auth::LoginRequired;
use crate::db;
use crate::entities::{group, post, user};
use crate::error::AppError;
use crate::forms::{CommentForm, FormErrors, PostForm, SubmittedForm};
use crate::models::{CommentView, PostView, UserPublic};
use crate::pagination::{Page, PageParams};

#[derive(Serialize)]
struct IndexContext {
    page_obj: Page<PostView>,
}

#[derive(Serialize)]
struct GroupContext {
    group: group::Model,
    page_obj: Page<PostView>,
}

#[derive(Serialize)]
struct ProfileContext {
    author: UserPublic,
    page_obj: Page<PostView>,
}

#[derive(Serialize)]
struct DetailContext {
    post: PostView,
    author_posts_count: u64,
    comments: Vec<CommentView>,
    form: CommentForm,
}

#[derive(Serialize)]
struct PostFormContext {
    form: PostForm,
    errors: FormErrors,
    groups: Vec<group::Model>,
    is_edit: bool,
    post_id: Option<i32>,
}

#[handler]
pub async fn index(Data(state): Data<&AppState>, Query(params): Query<PageParams>) -> poem::Result<Response> {
    let page_obj = db::posts::page_all(&state.db, params.page.as_deref()).await?;
    Ok(render("posts/index.html", IndexContext { page_obj }))
}

#[handler]
pub async fn group_posts(
    Data(state): Data<&AppState>,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> poem::Result<Response> {
    let group = db::groups::find_by_slug(&state.db, &slug).await?;
    let page_obj = db::posts::page_for_group(&state.db, group.id, params.page.as_deref()).await?;
    Ok(render("posts/group_list.html", GroupContext { group, page_obj }))
}

#[handler]
pub async fn profile(
    Data(state): Data<&AppState>,
    Path(username): Path<String>,
    Query(params): Query<PageParams>,
) -> poem::Result<Response> {
    let author = db::users::find_by_username(&state.db, &username)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    let page_obj = db::posts::page_for_author(&state.db, author.id, params.page.as_deref()).await?;
    Ok(render(
        "posts/profile.html",
        ProfileContext {
            author: (&author).into(),
            page_obj,
        },
    ))
}

#[handler]
pub async fn post_detail(Data(state): Data<&AppState>, Path(raw_id): Path<String>) -> poem::Result<Response> {
    let post = db::posts::find(&state.db, parse_post_id(&raw_id)?).await?;
    let author_posts_count = db::posts::count_for_author(&state.db, post.author_id).await?;
    let comments = db::comments::for_post(&state.db, post.id).await?;
    let post = db::posts::view(&state.db, post).await?;

    Ok(render(
        "posts/post_detail.html",
        DetailContext {
            post,
            author_posts_count,
            comments,
            form: CommentForm::default(),
        },
    ))
}

async fn render_post_form(
    state: &AppState,
    form: PostForm,
    errors: FormErrors,
    editing: Option<i32>,
) -> poem::Result<Response> {
    let groups = db::groups::all(&state.db).await?;
    Ok(render(
        "posts/create_post.html",
        PostFormContext {
            form,
            errors,
            groups,
            is_edit: editing.is_some(),
            post_id: editing,
        },
    ))
}

#[handler]
pub async fn post_create_form(LoginRequired(_user): LoginRequired, Data(state): Data<&AppState>) -> poem::Result<Response> {
    render_post_form(state, PostForm::default(), FormErrors::default(), None).await
}

#[handler]
pub async fn post_create(
    LoginRequired(user): LoginRequired,
    Data(state): Data<&AppState>,
    submitted: SubmittedForm,
) -> poem::Result<Response> {
    let form = PostForm::bind(&submitted);
    let cleaned = match form.clean(&state.db).await? {
        Ok(cleaned) => cleaned,
        Err(errors) => return render_post_form(state, form, errors, None).await,
    };

    let image = match &cleaned.image {
        Some(upload) => Some(state.media.save(upload).await?),
        None => None,
    };
    let created = match db::posts::create(&state.db, &user, cleaned.text, cleaned.group_id, image.clone()).await {
        Ok(created) => created,
        Err(err) => {
            if let Some(name) = &image {
                state.media.remove(name).await;
            }
            return Err(err.into());
        }
    };
    tracing::info!(
        post_id = created.id,
        author = %user.username,
        group_id = ?created.group_id,
        "post created"
    );

    Ok(redirect(&profile_url(&user.username)))
}

/// Loads the post for editing. Anyone but the author is turned away with a
/// redirect to the post page.
async fn own_post(state: &AppState, user: &user::Model, raw_id: &str) -> poem::Result<post::Model> {
    let post = db::posts::find(&state.db, parse_post_id(raw_id)?).await?;
    if post.author_id != user.id {
        tracing::warn!(post_id = post.id, user = %user.username, "edit refused: not the author");
        return Err(poem::Error::from_response(redirect(&post_detail_url(post.id))));
    }
    Ok(post)
}

#[handler]
pub async fn post_edit_form(
    LoginRequired(user): LoginRequired,
    Data(state): Data<&AppState>,
    Path(raw_id): Path<String>,
) -> poem::Result<Response> {
    let post = own_post(state, &user, &raw_id).await?;
    render_post_form(state, PostForm::initial(&post), FormErrors::default(), Some(post.id)).await
}

#[handler]
pub async fn post_edit(
    LoginRequired(user): LoginRequired,
    Data(state): Data<&AppState>,
    Path(raw_id): Path<String>,
    submitted: SubmittedForm,
) -> poem::Result<Response> {
    let post = own_post(state, &user, &raw_id).await?;

    let form = PostForm::bind(&submitted);
    let cleaned = match form.clean(&state.db).await? {
        Ok(cleaned) => cleaned,
        Err(errors) => return render_post_form(state, form, errors, Some(post.id)).await,
    };

    let updated = db::posts::update(&state.db, post, cleaned.text, cleaned.group_id).await?;
    tracing::info!(post_id = updated.id, group_id = ?updated.group_id, "post edited");

    Ok(redirect(&post_detail_url(updated.id)))
}

#[handler]
pub async fn add_comment(
    LoginRequired(user): LoginRequired,
    Data(state): Data<&AppState>,
    Path(raw_id): Path<String>,
    submitted: SubmittedForm,
) -> poem::Result<Response> {
    let post = db::posts::find(&state.db, parse_post_id(&raw_id)?).await?;

    match CommentForm::bind(&submitted).clean() {
        Ok(text) => {
            let comment = db::comments::create(&state.db, post.id, &user, text).await?;
            tracing::info!(comment_id = comment.id, post_id = post.id, author = %user.username, "comment added");
        }
        Err(errors) => {
            tracing::debug!(post_id = post.id, ?errors, "comment rejected");
        }
    }

    Ok(redirect(&post_detail_url(post.id)))
}

/// Comments are only posted; a GET here (e.g. a post-login `next`) lands on
/// the post page.
#[handler]
pub async fn comment_redirect(Path(raw_id): Path<String>, Data(state): Data<&AppState>) -> poem::Result<Response> {
    let post = db::posts::find(&state.db, parse_post_id(&raw_id)?).await?;
    Ok(redirect(&post_detail_url(post.id)))
}
