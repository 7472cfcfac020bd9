//! Checks on client input, reported per field.
//!
//! Request bodies arrive as plain strings and are turned into domain values
//! here, so that every problem with a submission is reported at once.

use crate::model::{
    auth::PASSWORD_MIN_LEN,
    comment::CreateComment,
    post::{CreatePost, EditPost, POST_MAX_IMAGES},
    user::{CreateUser, EditProfile, Email, ProfileStatus, UserHandle},
};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

pub const POST_CONTENT_MAX_LEN: usize = 5000;
pub const COMMENT_CONTENT_MAX_LEN: usize = 2000;
pub const PROFILE_NAME_MAX_LEN: usize = 100;
pub const PROFILE_BIO_MAX_LEN: usize = 500;

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns `value` if nothing was recorded.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Invalid input: ")?;
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Clone, Eq, PartialEq, Hash, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Debug for RegisterRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(default)]
pub struct EditProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub status: Option<String>,
}

fn handle(errors: &mut ValidationErrors, username: String) -> Option<UserHandle> {
    UserHandle::new(username)
        .map_err(|_| {
            errors.push(
                "username",
                "must be 1 to 50 letters, digits, underscores or hyphens",
            );
        })
        .ok()
}

fn email(errors: &mut ValidationErrors, email: String) -> Option<Email> {
    Email::new(email)
        .map_err(|_| errors.push("email", "must be a valid email address"))
        .ok()
}

fn bounded(errors: &mut ValidationErrors, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.push(field, format!("must be at most {max} characters"));
    }
}

pub fn validate_registration(request: RegisterRequest) -> Result<CreateUser, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let handle = handle(&mut errors, request.username);
    let email = email(&mut errors, request.email);
    if request.password.chars().count() < PASSWORD_MIN_LEN {
        errors.push(
            "password",
            format!("must be at least {PASSWORD_MIN_LEN} characters"),
        );
    }

    match (handle, email) {
        (Some(handle), Some(email)) if errors.is_empty() => Ok(CreateUser {
            handle,
            email,
            password: request.password,
        }),
        _ => Err(errors),
    }
}

/// Blank name, bio and image values clear the field.
pub fn validate_profile_edit(request: EditProfileRequest) -> Result<EditProfile, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let handle = request.username.and_then(|username| handle(&mut errors, username));
    let email = request.email.and_then(|address| email(&mut errors, address));
    let status = request.status.and_then(|status| {
        status
            .parse::<ProfileStatus>()
            .map_err(|_| errors.push("status", "must be `public` or `private`"))
            .ok()
    });

    if let Some(name) = &request.name {
        bounded(&mut errors, "name", name.trim(), PROFILE_NAME_MAX_LEN);
    }
    if let Some(bio) = &request.bio {
        bounded(&mut errors, "bio", bio.trim(), PROFILE_BIO_MAX_LEN);
    }

    let trimmed = |value: Option<String>| value.map(|value| value.trim().to_owned());

    errors.finish(|| EditProfile {
        handle,
        email,
        name: trimmed(request.name),
        bio: trimmed(request.bio),
        image: trimmed(request.image),
        status,
    })
}

/// A post needs text, images, or both.
pub fn validate_post(post: CreatePost) -> Result<CreatePost, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let content = post.content.trim().to_owned();
    if content.is_empty() && post.images.is_empty() {
        errors.push("content", "must not be empty when no images are attached");
    }
    bounded(&mut errors, "content", &content, POST_CONTENT_MAX_LEN);

    if post.images.len() > POST_MAX_IMAGES {
        errors.push("images", format!("at most {POST_MAX_IMAGES} images are allowed"));
    }
    if post.images.iter().any(|path| path.trim().is_empty()) {
        errors.push("images", "image paths must not be empty");
    }

    errors.finish(|| CreatePost {
        content,
        status: post.status,
        images: post
            .images
            .into_iter()
            .map(|path| path.trim().to_owned())
            .collect(),
    })
}

/// Edits follow the creation rule, against the images the post already has.
pub fn validate_post_edit(edit: EditPost, has_images: bool) -> Result<EditPost, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let content = edit.content.trim().to_owned();
    if content.is_empty() && !has_images {
        errors.push("content", "must not be empty when no images are attached");
    }
    bounded(&mut errors, "content", &content, POST_CONTENT_MAX_LEN);

    errors.finish(|| EditPost { content })
}

pub fn validate_comment(comment: CreateComment) -> Result<CreateComment, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let content = comment.content.trim().to_owned();
    if content.is_empty() {
        errors.push("content", "must not be empty");
    }
    bounded(&mut errors, "content", &content, COMMENT_CONTENT_MAX_LEN);

    errors.finish(|| CreateComment {
        content,
        parent_id: comment.parent_id,
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{
            comment::CreateComment,
            post::{CreatePost, EditPost},
            user::ProfileStatus,
        },
        validation::{
            EditProfileRequest, RegisterRequest, validate_comment, validate_post,
            validate_post_edit, validate_profile_edit, validate_registration,
        },
    };

    fn fields(errors: &crate::validation::ValidationErrors) -> Vec<&'static str> {
        errors.errors.iter().map(|error| error.field).collect()
    }

    #[test]
    fn registration_reports_every_field() {
        let errors = validate_registration(RegisterRequest {
            username: "no spaces allowed".to_owned(),
            email: "nope".to_owned(),
            password: "short".to_owned(),
        })
        .unwrap_err();

        assert_eq!(fields(&errors), ["username", "email", "password"]);
        assert!(errors.to_string().starts_with("Invalid input: username:"));
    }

    #[test]
    fn registration_accepts_valid_input() {
        let user = validate_registration(RegisterRequest {
            username: "ada".to_owned(),
            email: "ada@example.org".to_owned(),
            password: "difference-engine".to_owned(),
        })
        .unwrap();

        assert_eq!(user.handle.get(), "ada");
        assert_eq!(user.email.get(), "ada@example.org");
    }

    #[test]
    fn profile_edit() {
        let edit = validate_profile_edit(EditProfileRequest {
            name: Some("  Ada  ".to_owned()),
            status: Some("private".to_owned()),
            ..EditProfileRequest::default()
        })
        .unwrap();
        assert_eq!(edit.name.as_deref(), Some("Ada"));
        assert_eq!(edit.status, Some(ProfileStatus::Private));
        assert_eq!(edit.handle, None);

        let errors = validate_profile_edit(EditProfileRequest {
            status: Some("friends-only".to_owned()),
            bio: Some("x".repeat(501)),
            ..EditProfileRequest::default()
        })
        .unwrap_err();
        assert_eq!(fields(&errors), ["status", "bio"]);
    }

    #[test]
    fn posts_need_content_or_images() {
        assert!(validate_post(CreatePost {
            content: "   ".to_owned(),
            ..CreatePost::default()
        })
        .is_err());

        let image_only = validate_post(CreatePost {
            content: " ".to_owned(),
            images: vec!["uploads/posts/a.png".to_owned()],
            ..CreatePost::default()
        })
        .unwrap();
        assert_eq!(image_only.content, "");

        let errors = validate_post(CreatePost {
            content: "hello".to_owned(),
            images: vec!["a.png".to_owned(); 6],
            ..CreatePost::default()
        })
        .unwrap_err();
        assert_eq!(fields(&errors), ["images"]);
    }

    #[test]
    fn comments_need_content() {
        assert!(validate_comment(CreateComment::default()).is_err());
        assert_eq!(
            validate_comment(CreateComment {
                content: " hi ".to_owned(),
                parent_id: None
            })
            .unwrap()
            .content,
            "hi"
        );
    }

    #[test]
    fn blank_edits_need_images() {
        let blank = || EditPost {
            content: "   ".to_owned(),
        };

        let errors = validate_post_edit(blank(), false).unwrap_err();
        assert_eq!(fields(&errors), ["content"]);
        assert_eq!(validate_post_edit(blank(), true).unwrap().content, "");
        assert_eq!(
            validate_post_edit(EditPost { content: " new ".to_owned() }, false)
                .unwrap()
                .content,
            "new"
        );
    }
}
