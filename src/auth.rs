//! Sessions and the login gate.
//!
//! A session is an HS256 token in the `sessionid` cookie. Handlers read it
//! through [`CurrentUser`] (anonymous allowed) or [`LoginRequired`]
//! (anonymous requests are redirected to the login page).

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, SaltString};
use poem::web::cookie::{Cookie, CookieJar};
use poem::{FromRequest, Request, RequestBody, Response};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::AppState;
use crate::entities::user;
use crate::error::{AppError, Result};
use crate::handlers::redirect;

pub const SESSION_COOKIE: &str = "sessionid";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i32,
    pub username: String,
    pub exp: usize,
}

/// Signing secret, lifetime and login location.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    login_url: String,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl: Duration, login_url: impl Into<String>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            login_url: login_url.into(),
        }
    }

    pub fn issue(&self, user: &user::Model) -> Result<String> {
        let ttl = chrono::Duration::from_std(self.ttl).map_err(|e| AppError::Internal(e.to_string()))?;
        let exp = (chrono::Utc::now() + ttl).timestamp() as usize;
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            exp,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }

    /// Redirect to the login page that comes back to `next` afterwards.
    pub fn login_redirect(&self, next: &str) -> Response {
        redirect(&format!("{}?next={}", self.login_url, urlencoding::encode(next)))
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn start_session(jar: &CookieJar, keys: &SessionKeys, user: &user::Model) -> Result<()> {
    let mut cookie = Cookie::new_with_str(SESSION_COOKIE, keys.issue(user)?);
    cookie.set_path("/");
    cookie.set_http_only(true);
    jar.add(cookie);
    Ok(())
}

pub fn end_session(jar: &CookieJar) {
    let mut cookie = Cookie::named(SESSION_COOKIE);
    cookie.set_path("/");
    cookie.make_removal();
    jar.add(cookie);
}

fn app_state(req: &Request) -> poem::Result<&AppState> {
    req.data::<AppState>()
        .ok_or_else(|| AppError::Internal("application state is not installed".into()).into())
}

/// The logged-in user, if the session cookie names one.
pub struct CurrentUser(pub Option<user::Model>);

impl<'a> FromRequest<'a> for CurrentUser {
    async fn from_request(req: &'a Request, _body: &mut RequestBody) -> poem::Result<Self> {
        let state = app_state(req)?;
        let Some(cookie) = req.cookie().get(SESSION_COOKIE) else {
            return Ok(CurrentUser(None));
        };

        let claims = match state.sessions.verify(cookie.value_str()) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::debug!(error = %err, "ignoring invalid session token");
                return Ok(CurrentUser(None));
            }
        };

        let user = user::Entity::find_by_id(claims.sub)
            .one(&state.db)
            .await
            .map_err(AppError::from)?;
        Ok(CurrentUser(user))
    }
}

/// Logged-in user; anonymous requests are answered with a redirect to the
/// login page before the handler runs.
pub struct LoginRequired(pub user::Model);

impl<'a> FromRequest<'a> for LoginRequired {
    async fn from_request(req: &'a Request, body: &mut RequestBody) -> poem::Result<Self> {
        match CurrentUser::from_request(req, body).await? {
            CurrentUser(Some(user)) => Ok(LoginRequired(user)),
            CurrentUser(None) => {
                let state = app_state(req)?;
                let next = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                Err(poem::Error::from_response(state.sessions.login_redirect(next)))
            }
        }
    }
}

/// Only local paths are accepted as post-login destinations.
pub fn safe_next(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") {
        next
    } else {
        "/"
    }
}
