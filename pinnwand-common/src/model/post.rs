use crate::model::{
    Id, string_enum,
    user::UserSummary,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Upper bound on images attached to one post.
pub const POST_MAX_IMAGES: usize = 5;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct ImageMarker;

string_enum! {
    /// `Archive` hides a post from everybody but its author.
    #[derive(Default)]
    PostStatus ("post status") {
        #[default]
        Public => "public",
        Archive => "archive",
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Image {
    pub id: Id<ImageMarker>,
    pub path: String,
}

/// A post annotated for one particular viewer.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author: UserSummary,
    pub content: String,
    pub status: PostStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub images: Vec<Image>,
    pub likes_count: u64,
    pub comments_count: u64,
    pub is_owner: bool,
    pub is_liked: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct CreatePost {
    pub content: String,
    #[serde(default)]
    pub status: PostStatus,
    /// Paths handed out by the media store, in display order.
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct EditPost {
    pub content: String,
}
