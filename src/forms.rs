//! Form binding and validation.
//!
//! [`SubmittedForm`] collects the raw fields of a urlencoded or multipart
//! body. The typed forms bind from it, validate with `validator`, and report
//! problems as [`FormErrors`] which are rendered back alongside the form.

use poem::web::{Form, Multipart};
use poem::{FromRequest, Request, RequestBody};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use validator::{Validate, ValidationErrors};

use crate::entities::{group, post};
use crate::error::Result;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Key for errors that belong to the form as a whole.
pub const NON_FIELD_ERRORS: &str = "__all__";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Raw fields of a submitted form body.
#[derive(Debug, Default)]
pub struct SubmittedForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl SubmittedForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }
}

impl<'a> FromRequest<'a> for SubmittedForm {
    async fn from_request(req: &'a Request, body: &mut RequestBody) -> poem::Result<Self> {
        let is_multipart = req
            .content_type()
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, body).await?;
            return Ok(SubmittedForm {
                fields,
                files: HashMap::new(),
            });
        }

        let mut multipart = Multipart::from_request(req, body).await?;
        let mut form = SubmittedForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(ToString::to_string) {
                // browsers send an empty part when no file was chosen
                Some(file_name) if file_name.is_empty() => {}
                Some(file_name) => {
                    let content_type = field.content_type().map(ToString::to_string);
                    let data = field.bytes().await.map_err(poem::error::BadRequest)?;
                    form.files.insert(
                        name,
                        UploadedFile {
                            file_name,
                            content_type,
                            data,
                        },
                    );
                }
                None => {
                    let value = field.text().await.map_err(poem::error::BadRequest)?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }
}

/// Field name -> messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Errors from a `validate()` call, or none.
    pub fn collect(result: std::result::Result<(), ValidationErrors>) -> Self {
        let mut errors = FormErrors::default();
        if let Err(e) = result {
            for (field, field_errors) in e.field_errors() {
                for err in field_errors {
                    let message = err
                        .message
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| err.code.to_string());
                    errors.add(field.to_string(), message);
                }
            }
        }
        errors
    }
}

fn trimmed(form: &SubmittedForm, name: &str) -> String {
    form.field(name).unwrap_or_default().trim().to_string()
}

/// Create/edit form for a post.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct PostForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    /// Raw group choice; empty means no group.
    pub group: String,
    #[serde(skip)]
    pub image: Option<UploadedFile>,
}

/// A post form that passed validation.
#[derive(Debug, Clone)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<i32>,
    pub image: Option<UploadedFile>,
}

impl PostForm {
    /// Binds `text`, `group` and `image`. Any other field, `author`
    /// included, is ignored.
    pub fn bind(form: &SubmittedForm) -> Self {
        PostForm {
            text: trimmed(form, "text"),
            group: trimmed(form, "group"),
            image: form.file("image").cloned(),
        }
    }

    pub fn initial(post: &post::Model) -> Self {
        PostForm {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
            image: None,
        }
    }

    pub async fn clean(&self, db: &DatabaseConnection) -> Result<std::result::Result<CleanedPost, FormErrors>> {
        let mut errors = FormErrors::collect(self.validate());

        let mut group_id = None;
        if !self.group.is_empty() {
            let found = match self.group.parse::<i32>() {
                Ok(id) => group::Entity::find_by_id(id).one(db).await?,
                Err(_) => None,
            };
            match found {
                Some(group) => group_id = Some(group.id),
                None => errors.add("group", INVALID_CHOICE),
            }
        }

        if self.image.as_ref().is_some_and(|upload| !is_image(&upload.data)) {
            errors.add("image", INVALID_IMAGE);
        }

        if !errors.is_empty() {
            return Ok(Err(errors));
        }
        Ok(Ok(CleanedPost {
            text: self.text.clone(),
            group_id,
            image: self.image.clone(),
        }))
    }
}

/// Sniffs the magic bytes; the extension the client sent is not trusted.
fn is_image(data: &[u8]) -> bool {
    image::guess_format(data).is_ok()
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct CommentForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
}

impl CommentForm {
    pub fn bind(form: &SubmittedForm) -> Self {
        CommentForm {
            text: trimmed(form, "text"),
        }
    }

    pub fn clean(&self) -> std::result::Result<String, FormErrors> {
        let errors = FormErrors::collect(self.validate());
        if errors.is_empty() {
            Ok(self.text.clone())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct SignupForm {
    #[validate(length(min = 1, max = 150, message = "Enter a username of at most 150 characters."))]
    pub username: String,
    #[serde(skip)]
    #[validate(length(min = 8, message = "This password is too short. It must contain at least 8 characters."))]
    pub password1: String,
    #[serde(skip)]
    pub password2: String,
}

impl SignupForm {
    pub fn bind(form: &SubmittedForm) -> Self {
        SignupForm {
            username: trimmed(form, "username"),
            password1: form.field("password1").unwrap_or_default().to_string(),
            password2: form.field("password2").unwrap_or_default().to_string(),
        }
    }

    /// Field rules plus the username charset and the password confirmation.
    /// Uniqueness needs the database and is checked by the handler.
    pub fn clean(&self) -> std::result::Result<(), FormErrors> {
        let mut errors = FormErrors::collect(self.validate());
        if !valid_username(&self.username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
        if self.password1 != self.password2 {
            errors.add(NON_FIELD_ERRORS, "The two password fields didn't match.");
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Letters, digits and `@ . + - _` only.
fn valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip)]
    pub password: String,
    pub next: String,
}

impl LoginForm {
    pub fn bind(form: &SubmittedForm) -> Self {
        LoginForm {
            username: trimmed(form, "username"),
            password: form.field("password").unwrap_or_default().to_string(),
            next: trimmed(form, "next"),
        }
    }
}
