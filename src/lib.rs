//! yatube: a small blog service.
//!
//! Users publish posts, optionally in a group and with an image, comment on
//! them and browse paginated feeds. Pages are rendered as JSON documents
//! naming their template and context.

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod media;
pub mod migration;
pub mod models;
pub mod pagination;

use poem::endpoint::StaticFilesEndpoint;
use poem::middleware::{CookieJarManager, Tracing};
use poem::{Endpoint, EndpointExt, Route, get};
use sea_orm::DatabaseConnection;

use crate::auth::SessionKeys;
use crate::cache::PageCache;
use crate::config::Config;
use crate::handlers::{accounts, posts};
use crate::media::MediaStore;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub page_cache: PageCache,
    pub media: MediaStore,
    pub sessions: SessionKeys,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: &Config) -> Self {
        AppState {
            db,
            page_cache: PageCache::new(config.cache.index_ttl, config.cache.max_capacity),
            media: MediaStore::new(config.media.root.clone()),
            sessions: SessionKeys::new(&config.auth.secret, config.auth.session_ttl, config.auth.login_url.clone()),
        }
    }
}

pub fn app(state: AppState) -> impl Endpoint {
    let media = StaticFilesEndpoint::new(state.media.root().to_path_buf());

    Route::new()
        .at("/", get(posts::index).with(state.page_cache.middleware()))
        .at("/group/:slug/", get(posts::group_posts))
        .at("/profile/:username/", get(posts::profile))
        .at("/create/", get(posts::post_create_form).post(posts::post_create))
        .at("/posts/:post_id/", get(posts::post_detail))
        .at("/posts/:post_id/edit/", get(posts::post_edit_form).post(posts::post_edit))
        .at("/posts/:post_id/comment/", get(posts::comment_redirect).post(posts::add_comment))
        .at("/auth/signup/", get(accounts::signup_form).post(accounts::signup))
        .at("/auth/login/", get(accounts::login_form).post(accounts::login))
        .at("/auth/logout/", get(accounts::logout))
        .nest("/media", media)
        .with(CookieJarManager::new())
        .with(Tracing)
        .data(state)
}
