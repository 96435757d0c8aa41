//! Signup, login and logout.

use poem::web::cookie::CookieJar;
use poem::web::{Data, Query};
use poem::{Response, handler};
use serde::{Deserialize, Serialize};

use super::{redirect, render};
use crate::AppState;
use crate::auth::{self, end_session, safe_next, start_session};
use crate::db;
use crate::forms::{FormErrors, LoginForm, NON_FIELD_ERRORS, SignupForm, SubmittedForm};

#[derive(Serialize)]
struct SignupContext {
    form: SignupForm,
    errors: FormErrors,
}

#[derive(Serialize)]
struct LoginContext {
    form: LoginForm,
    errors: FormErrors,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextParams {
    next: Option<String>,
}

#[handler]
pub async fn signup_form() -> Response {
    render(
        "users/signup.html",
        SignupContext {
            form: SignupForm::default(),
            errors: FormErrors::default(),
        },
    )
}

#[handler]
pub async fn signup(Data(state): Data<&AppState>, jar: &CookieJar, submitted: SubmittedForm) -> poem::Result<Response> {
    let form = SignupForm::bind(&submitted);
    let mut errors = match form.clean() {
        Ok(()) => FormErrors::default(),
        Err(errors) => errors,
    };
    if db::users::find_by_username(&state.db, &form.username).await?.is_some() {
        errors.add("username", "A user with that username already exists.");
    }
    if !errors.is_empty() {
        return Ok(render("users/signup.html", SignupContext { form, errors }));
    }

    let hash = auth::hash_password(&form.password1)?;
    let user = db::users::create(&state.db, &form.username, hash).await?;
    start_session(jar, &state.sessions, &user)?;
    tracing::info!(user_id = user.id, username = %user.username, "account created");

    Ok(redirect("/"))
}

#[handler]
pub async fn login_form(Query(params): Query<NextParams>) -> Response {
    let form = LoginForm {
        next: params.next.unwrap_or_default(),
        ..LoginForm::default()
    };
    render(
        "users/login.html",
        LoginContext {
            form,
            errors: FormErrors::default(),
        },
    )
}

#[handler]
pub async fn login(Data(state): Data<&AppState>, jar: &CookieJar, submitted: SubmittedForm) -> poem::Result<Response> {
    let form = LoginForm::bind(&submitted);
    let user = db::users::find_by_username(&state.db, &form.username)
        .await?
        .filter(|user| auth::verify_password(&form.password, &user.password_hash));

    let Some(user) = user else {
        tracing::debug!(username = %form.username, "login failed");
        let mut errors = FormErrors::default();
        errors.add(
            NON_FIELD_ERRORS,
            "Please enter a correct username and password. Note that both fields may be case-sensitive.",
        );
        return Ok(render("users/login.html", LoginContext { form, errors }));
    };

    start_session(jar, &state.sessions, &user)?;
    tracing::info!(user_id = user.id, "logged in");
    Ok(redirect(safe_next(&form.next)))
}

#[handler]
pub async fn logout(jar: &CookieJar) -> Response {
    end_session(jar);
    redirect("/")
}
