use pinnwand_common::{
    model::{
        Id, ModelValidationError,
        auth::{Authentication, TokenKind},
        comment::Comment,
        post::{Image, Post, PostStatus},
        report::ReportSummary,
        user::{Account, Email, Profile, User, UserHandle, UserMarker, UserSummary},
    },
    visibility::{PostAccess, ProfileAccess},
};
use sqlx::FromRow;
use time::{Duration, OffsetDateTime, UtcDateTime};

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct SummaryRecord {
    pub user_snowflake: i64,
    pub handle: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct AccountRecord {
    pub user_snowflake: i64,
    pub handle: String,
    pub email: String,
    pub role: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub profile_status: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub user_snowflake: i64,
    pub handle: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub profile_status: String,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
    pub viewer_follows: bool,
}

/// Everything the visibility rules need to know about one post.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct PostAccessRecord {
    pub user_snowflake: i64,
    pub status: String,
    pub profile_status: String,
    pub viewer_follows: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PostRecord {
    pub post_snowflake: i64,
    pub content: String,
    pub status: String,
    pub created_at: OffsetDateTime,
    #[sqlx(flatten)]
    pub author: SummaryRecord,
    pub profile_status: String,
    pub likes_count: i64,
    pub comments_count: i64,
    pub viewer_liked: bool,
    pub viewer_follows: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct ImageRecord {
    pub image_snowflake: i64,
    pub post_snowflake: i64,
    pub path: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct CommentRecord {
    pub comment_snowflake: i64,
    pub post_snowflake: i64,
    pub parent_snowflake: Option<i64>,
    pub content: String,
    pub created_at: OffsetDateTime,
    #[sqlx(flatten)]
    pub author: SummaryRecord,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct ThreadRecord {
    #[sqlx(flatten)]
    pub comment: CommentRecord,
    pub replies_count: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct ReportSummaryRecord {
    pub post_snowflake: i64,
    pub report_count: i64,
    pub content: String,
    #[sqlx(flatten)]
    pub author: SummaryRecord,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct AuthenticationRecord {
    pub user_snowflake: i64,
    pub kind: String,
    pub token_hash: Vec<u8>,
    pub created_at: OffsetDateTime,
    pub expires_after_seconds: Option<i64>,
}

impl TryFrom<SummaryRecord> for UserSummary {
    type Error = ModelValidationError;

    fn try_from(value: SummaryRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.user_snowflake),
            handle: UserHandle::new(value.handle)?,
            name: value.name,
            image: value.image,
        })
    }
}

impl TryFrom<AccountRecord> for Account {
    type Error = ModelValidationError;

    fn try_from(value: AccountRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.user_snowflake),
            handle: UserHandle::new(value.handle)?,
            email: Email::new(value.email)?,
            role: value.role.parse()?,
            profile: Profile {
                name: value.name,
                bio: value.bio,
                image: value.image,
                status: value.profile_status.parse()?,
            },
        })
    }
}

impl UserRecord {
    pub(crate) fn access(&self) -> Result<ProfileAccess, ModelValidationError> {
        Ok(ProfileAccess {
            user_id: Id::from_db(self.user_snowflake),
            status: self.profile_status.parse()?,
        })
    }
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.user_snowflake),
            handle: UserHandle::new(value.handle)?,
            profile: Profile {
                name: value.name,
                bio: value.bio,
                image: value.image,
                status: value.profile_status.parse()?,
            },
            followers_count: count(value.followers_count),
            following_count: count(value.following_count),
            posts_count: count(value.posts_count),
            is_following: value.viewer_follows,
        })
    }
}

impl PostAccessRecord {
    pub(crate) fn access(&self) -> Result<PostAccess, ModelValidationError> {
        Ok(PostAccess {
            author_id: Id::from_db(self.user_snowflake),
            status: self.status.parse()?,
            owner_status: self.profile_status.parse()?,
        })
    }
}

impl PostRecord {
    pub(crate) fn access(&self) -> Result<PostAccess, ModelValidationError> {
        Ok(PostAccess {
            author_id: Id::from_db(self.author.user_snowflake),
            status: self.status.parse()?,
            owner_status: self.profile_status.parse()?,
        })
    }

    /// Builds the viewer's rendition of the post.
    pub(crate) fn into_post(
        self,
        viewer: Id<UserMarker>,
        images: Vec<Image>,
    ) -> Result<Post, ModelValidationError> {
        let author = UserSummary::try_from(self.author)?;
        let status: PostStatus = self.status.parse()?;

        Ok(Post {
            id: Id::from_db(self.post_snowflake),
            is_owner: author.id == viewer,
            author,
            content: self.content,
            status,
            created_at: self.created_at,
            images,
            likes_count: count(self.likes_count),
            comments_count: count(self.comments_count),
            is_liked: self.viewer_liked,
        })
    }
}

impl From<ImageRecord> for Image {
    fn from(value: ImageRecord) -> Self {
        Self {
            id: Id::from_db(value.image_snowflake),
            path: value.path,
        }
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.comment_snowflake),
            post_id: Id::from_db(value.post_snowflake),
            parent_id: value.parent_snowflake.map(Id::from_db),
            author: value.author.try_into()?,
            content: value.content,
            created_at: value.created_at,
        })
    }
}

impl TryFrom<ReportSummaryRecord> for ReportSummary {
    type Error = ModelValidationError;

    fn try_from(value: ReportSummaryRecord) -> Result<Self, Self::Error> {
        let author = UserSummary::try_from(value.author)?;

        Ok(Self {
            post_id: Id::from_db(value.post_snowflake),
            report_count: count(value.report_count),
            content: value.content,
            author_display_name: author.display_name().to_owned(),
        })
    }
}

impl TryFrom<AuthenticationRecord> for Authentication {
    type Error = ModelValidationError;

    fn try_from(value: AuthenticationRecord) -> Result<Self, Self::Error> {
        let kind: TokenKind = value.kind.parse()?;

        Ok(Self {
            user: Id::from_db(value.user_snowflake),
            kind,
            token_hash: value.token_hash.try_into()?,
            created_at: UtcDateTime::from(value.created_at),
            expires_after: value
                .expires_after_seconds
                .map(|seconds| Duration::seconds(seconds).try_into())
                .transpose()?,
        })
    }
}
