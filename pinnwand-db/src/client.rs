use pinnwand_common::{
    model::{
        Id, ModelValidationError,
        auth::{AuthTokenHashError, PasswordHashError},
        comment::CommentMarker,
        post::PostMarker,
        user::UserMarker,
    },
    snowflake::{ProcessId, SnowflakeError, SnowflakeGenerator, WorkerId},
    validation::ValidationErrors,
    visibility::DenyReason,
};
use sqlx::{
    SqlitePool,
    migrate::{MigrateError, Migrator},
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{
    str::FromStr,
    sync::{Mutex, PoisonError},
};
use thiserror::Error;
use tracing::{debug, info};

pub type Result<T, E = DbError> = std::result::Result<T, E>;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// How a failure should be presented to a client.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    InvalidInput,
    Unauthorized,
    Internal,
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Post with id {0} was not found.")]
    PostNotFound(Id<PostMarker>),
    #[error("User with id {0} was not found.")]
    UserNotFound(Id<UserMarker>),
    #[error("Comment with id {0} was not found.")]
    CommentNotFound(Id<CommentMarker>),
    #[error("Parent comment with id {0} was not found on this post.")]
    ParentCommentNotFound(Id<CommentMarker>),
    #[error("Already following user {0}.")]
    AlreadyFollowing(Id<UserMarker>),
    #[error("Users cannot follow themselves.")]
    SelfFollow,
    #[error("Not following user {0}.")]
    NotFollowing(Id<UserMarker>),
    #[error("Post {0} is already liked.")]
    AlreadyLiked(Id<PostMarker>),
    #[error("Post {0} is not liked.")]
    NotLiked(Id<PostMarker>),
    #[error("Post {0} was already reported.")]
    AlreadyReported(Id<PostMarker>),
    #[error("Username is already taken.")]
    UsernameTaken,
    #[error("Email is already taken.")]
    EmailTaken,
    #[error("This action requires an admin.")]
    AdminRequired,
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error(transparent)]
    InvalidInput(#[from] ValidationErrors),
    #[error("Deleting post {post} failed and was rolled back: {source}")]
    Cascade {
        post: Id<PostMarker>,
        source: sqlx::Error,
    },
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("Could not mint an id: {0}")]
    Snowflake(#[from] SnowflakeError),
    #[error(transparent)]
    PasswordHash(#[from] PasswordHashError),
    #[error(transparent)]
    AuthTokenHash(#[from] AuthTokenHashError),
    #[error(transparent)]
    Migrate(#[from] MigrateError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::PostNotFound(_)
            | DbError::UserNotFound(_)
            | DbError::CommentNotFound(_)
            | DbError::ParentCommentNotFound(_)
            | DbError::NotFollowing(_)
            | DbError::NotLiked(_) => ErrorKind::NotFound,
            DbError::AdminRequired => ErrorKind::Forbidden,
            DbError::AlreadyFollowing(_)
            | DbError::SelfFollow
            | DbError::AlreadyLiked(_)
            | DbError::AlreadyReported(_)
            | DbError::UsernameTaken
            | DbError::EmailTaken => ErrorKind::Conflict,
            DbError::InvalidInput(_) => ErrorKind::InvalidInput,
            DbError::InvalidCredentials => ErrorKind::Unauthorized,
            DbError::Cascade { .. }
            | DbError::Data(_)
            | DbError::Snowflake(_)
            | DbError::PasswordHash(_)
            | DbError::AuthTokenHash(_)
            | DbError::Migrate(_)
            | DbError::Sqlx(_) => ErrorKind::Internal,
        }
    }

    /// A denied post reads exactly like a missing one.
    pub(crate) fn hidden_post(post_id: Id<PostMarker>, reason: DenyReason) -> Self {
        debug!(%post_id, %reason, "Hiding post from viewer");
        DbError::PostNotFound(post_id)
    }

    pub(crate) fn hidden_user(user_id: Id<UserMarker>, reason: DenyReason) -> Self {
        debug!(%user_id, %reason, "Hiding profile from viewer");
        DbError::UserNotFound(user_id)
    }
}

/// Whether `err` is a violation of a `UNIQUE` or primary key constraint.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Whether `err` is a reference to a row that does not exist.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// The message of a unique violation, for telling constraints apart.
pub(crate) fn unique_violation_message(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Some(db_err.message()),
        _ => None,
    }
}

pub struct DbClient {
    pub(crate) pool: SqlitePool,
    snowflake_generator: Mutex<SnowflakeGenerator>,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: SqlitePool, worker_id: WorkerId, process_id: ProcessId) -> Self {
        let snowflake_generator =
            Mutex::new(SnowflakeGenerator::new(worker_id, process_id));

        Self {
            pool,
            snowflake_generator,
        }
    }

    /// Opens (creating if needed) the database at `url` with foreign keys on.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        worker_id: WorkerId,
        process_id: ProcessId,
    ) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self::new(pool, worker_id, process_id))
    }

    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        info!("Database migrations complete");
        Ok(())
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn next_id<Marker>(&self) -> Result<Id<Marker>> {
        let snowflake = self
            .snowflake_generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate()?;

        Ok(snowflake.into())
    }
}
