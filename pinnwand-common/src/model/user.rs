use crate::model::{Id, string_enum};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::{Debug, Formatter};
use thiserror::Error;

pub const USER_HANDLE_MAX_LEN: usize = 50;
pub const EMAIL_MAX_LEN: usize = 254;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

string_enum! {
    #[derive(Default)]
    Role ("role") {
        #[default]
        Member => "member",
        Admin => "admin",
    }
}

string_enum! {
    /// Who may see a profile and the posts on it.
    #[derive(Default)]
    ProfileStatus ("profile status") {
        #[default]
        Public => "public",
        Private => "private",
    }
}

/// The minimum a viewer needs to render an author.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct UserSummary {
    pub id: Id<UserMarker>,
    pub handle: UserHandle,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl UserSummary {
    /// The profile name when set, the handle otherwise.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.handle.get())
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Profile {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub status: ProfileStatus,
}

/// A profile as seen by somebody allowed to see it.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct User {
    pub id: Id<UserMarker>,
    pub handle: UserHandle,
    pub profile: Profile,
    pub followers_count: u64,
    pub following_count: u64,
    pub posts_count: u64,
    pub is_following: bool,
}

/// The caller's own account.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Account {
    pub id: Id<UserMarker>,
    pub handle: UserHandle,
    pub email: Email,
    pub role: Role,
    pub profile: Profile,
}

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct CreateUser {
    pub handle: UserHandle,
    pub email: Email,
    pub password: String,
}

/// Profile changes; absent fields are left untouched.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct EditProfile {
    pub handle: Option<UserHandle>,
    pub email: Option<Email>,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub status: Option<ProfileStatus>,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct UserHandle(String);

impl Debug for CreateUser {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUser")
            .field("handle", &self.handle)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The user handle is invalid: {0}")]
pub struct InvalidUserHandleError(String);

impl UserHandle {
    /// Handles are 1 to 50 ASCII letters, digits, `_` or `-`.
    pub fn new(handle: String) -> Result<Self, InvalidUserHandleError> {
        let valid = !handle.is_empty()
            && handle.len() <= USER_HANDLE_MAX_LEN
            && handle
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        if valid {
            Ok(UserHandle(handle))
        } else {
            Err(InvalidUserHandleError(handle))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for UserHandle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        UserHandle::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"UserHandle"))
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The email address is invalid: {0}")]
pub struct InvalidEmailError(String);

impl Email {
    /// Accepts `local@domain` with exactly one `@`, no whitespace and a dot
    /// somewhere inside the domain.
    pub fn new(email: String) -> Result<Self, InvalidEmailError> {
        let valid = email.len() <= EMAIL_MAX_LEN
            && !email.chars().any(char::is_whitespace)
            && match email.split_once('@') {
                Some((local, domain)) => {
                    !local.is_empty()
                        && !domain.contains('@')
                        && domain
                            .split_once('.')
                            .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty())
                }
                None => false,
            };

        if valid {
            Ok(Email(email))
        } else {
            Err(InvalidEmailError(email))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Email {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Email::new(inner).map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"Email"))
    }
}
