//! Who may see which posts and profiles.
//!
//! The rules are pure: callers gather the facts (owner, statuses) and hand
//! in the follow relation lazily, so it is only consulted when a private
//! profile actually makes it matter. A denial must reach clients as "not
//! found" so that the existence of hidden content is not confirmed.

use crate::model::{
    Id,
    post::PostStatus,
    user::{ProfileStatus, UserMarker},
};
use thiserror::Error;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum DenyReason {
    #[error("the post is archived")]
    Archived,
    #[error("the profile is private")]
    Private,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum Visibility {
    Allow,
    Deny(DenyReason),
}

impl Visibility {
    #[must_use]
    pub fn is_allowed(self) -> bool {
        self == Visibility::Allow
    }

    /// `Ok(())` on allow, the reason otherwise.
    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Visibility::Allow => Ok(()),
            Visibility::Deny(reason) => Err(reason),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct ProfileAccess {
    pub user_id: Id<UserMarker>,
    pub status: ProfileStatus,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct PostAccess {
    pub author_id: Id<UserMarker>,
    pub status: PostStatus,
    pub owner_status: ProfileStatus,
}

impl PostAccess {
    #[must_use]
    pub fn owner(&self) -> ProfileAccess {
        ProfileAccess {
            user_id: self.author_id,
            status: self.owner_status,
        }
    }
}

/// `is_following` answers whether the viewer follows the profile owner.
pub fn can_view_profile(
    viewer: Id<UserMarker>,
    profile: &ProfileAccess,
    is_following: impl FnOnce() -> bool,
) -> Visibility {
    if viewer == profile.user_id || profile.status == ProfileStatus::Public || is_following() {
        Visibility::Allow
    } else {
        Visibility::Deny(DenyReason::Private)
    }
}

/// Archive beats privacy: an archived post is hidden from everybody but the
/// author, followers included.
pub fn can_view_post(
    viewer: Id<UserMarker>,
    post: &PostAccess,
    is_following: impl FnOnce() -> bool,
) -> Visibility {
    if viewer == post.author_id {
        return Visibility::Allow;
    }
    if post.status == PostStatus::Archive {
        return Visibility::Deny(DenyReason::Archived);
    }
    can_view_profile(viewer, &post.owner(), is_following)
}
