pub mod accounts;
pub mod posts;

use poem::http::{StatusCode, header};
use poem::web::Json;
use poem::{IntoResponse, Response};
use serde::Serialize;

use crate::error::AppError;

/// Rendered page: the template it belongs to plus its context.
#[derive(Serialize)]
struct Rendered<'a, C> {
    template: &'a str,
    context: C,
}

pub fn render<C: Serialize + Send>(template: &str, context: C) -> Response {
    Json(Rendered { template, context }).into_response()
}

pub fn redirect(location: &str) -> Response {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location)
        .finish()
}

/// Non-numeric ids are unknown posts, not bad requests.
fn parse_post_id(raw: &str) -> Result<i32, AppError> {
    raw.parse().map_err(|_| AppError::NotFound("post"))
}

pub fn post_detail_url(post_id: i32) -> String {
    format!("/posts/{post_id}/")
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}
