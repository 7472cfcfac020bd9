use crate::{
    client::{DbClient, DbError, Result, unique_violation_message},
    record::{AccountRecord, SummaryRecord, UserRecord},
};
use pinnwand_common::{
    model::{
        Id,
        auth::hash_password,
        user::{Account, CreateUser, EditProfile, Role, User, UserMarker, UserSummary},
    },
    validation::{EditProfileRequest, RegisterRequest, validate_profile_edit, validate_registration},
    visibility::can_view_profile,
};
use sqlx::{query, query_as, query_scalar};
use time::OffsetDateTime;
use tracing::{info, instrument};

pub const SEARCH_USERS_LIMIT: i64 = 50;

/// Tells the two unique user columns apart.
fn taken(err: sqlx::Error) -> DbError {
    match unique_violation_message(&err) {
        Some(message) if message.contains("users.email") => DbError::EmailTaken,
        Some(message) if message.contains("users.handle") => DbError::UsernameTaken,
        _ => err.into(),
    }
}

/// Escapes `LIKE` wildcards so they match literally under `ESCAPE '\'`.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl DbClient {
    #[instrument(skip(self))]
    pub async fn register(&self, request: RegisterRequest) -> Result<Account> {
        let user = validate_registration(request)?;
        self.create_user(&user).await
    }

    #[instrument(skip(self))]
    pub async fn create_user(&self, user: &CreateUser) -> Result<Account> {
        let user_id: Id<UserMarker> = self.next_id()?;
        let password_hash = hash_password(&user.password)?;

        query(
            "
            INSERT INTO users (user_snowflake, handle, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(user_id.to_db())
        .bind(user.handle.get())
        .bind(user.email.get())
        .bind(password_hash)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await
        .map_err(taken)?;

        info!(%user_id, "User registered");
        self.fetch_account(user_id).await
    }

    /// The caller's own account, email and role included.
    #[instrument(skip(self))]
    pub async fn fetch_account(&self, user_id: Id<UserMarker>) -> Result<Account> {
        let record = query_as::<_, AccountRecord>(
            "
            SELECT
                user_snowflake,
                handle,
                email,
                role,
                name,
                bio,
                image,
                profile_status
            FROM
                users
            WHERE
                user_snowflake = $1
            ",
        )
        .bind(user_id.to_db())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::UserNotFound(user_id))?;

        Ok(record.try_into()?)
    }

    /// Someone else's profile; hidden and missing profiles look the same.
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self, viewer: Id<UserMarker>, user_id: Id<UserMarker>) -> Result<User> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                users.user_snowflake,
                users.handle,
                users.name,
                users.bio,
                users.image,
                users.profile_status,
                (SELECT COUNT(*) FROM follows WHERE followed_snowflake = users.user_snowflake) AS followers_count,
                (SELECT COUNT(*) FROM follows WHERE follower_snowflake = users.user_snowflake) AS following_count,
                (SELECT COUNT(*) FROM posts WHERE posts.user_snowflake = users.user_snowflake) AS posts_count,
                EXISTS (
                    SELECT 1 FROM follows
                    WHERE
                        follower_snowflake = $1
                        AND followed_snowflake = users.user_snowflake
                ) AS viewer_follows
            FROM
                users
            WHERE
                users.user_snowflake = $2
            ",
        )
        .bind(viewer.to_db())
        .bind(user_id.to_db())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::UserNotFound(user_id))?;

        let viewer_follows = record.viewer_follows;
        can_view_profile(viewer, &record.access()?, || viewer_follows)
            .into_result()
            .map_err(|reason| DbError::hidden_user(user_id, reason))?;

        Ok(record.try_into()?)
    }

    /// Resolves profile visibility without loading the profile.
    pub(crate) async fn ensure_profile_visible(
        &self,
        viewer: Id<UserMarker>,
        user_id: Id<UserMarker>,
    ) -> Result<()> {
        self.fetch_profile(viewer, user_id).await.map(drop)
    }

    #[instrument(skip(self))]
    pub async fn edit_profile(
        &self,
        user_id: Id<UserMarker>,
        request: EditProfileRequest,
    ) -> Result<Account> {
        let edit = validate_profile_edit(request)?;
        self.apply_profile_edit(user_id, &edit).await
    }

    /// Absent fields stay as they are; blank name, bio or image clear them.
    #[instrument(skip(self))]
    pub async fn apply_profile_edit(
        &self,
        user_id: Id<UserMarker>,
        edit: &EditProfile,
    ) -> Result<Account> {
        let result = query(
            "
            UPDATE users
            SET
                handle = COALESCE($2, handle),
                email = COALESCE($3, email),
                name = CASE WHEN $4 IS NULL THEN name ELSE NULLIF($4, '') END,
                bio = CASE WHEN $5 IS NULL THEN bio ELSE NULLIF($5, '') END,
                image = CASE WHEN $6 IS NULL THEN image ELSE NULLIF($6, '') END,
                profile_status = COALESCE($7, profile_status)
            WHERE
                user_snowflake = $1
            ",
        )
        .bind(user_id.to_db())
        .bind(edit.handle.as_ref().map(|handle| handle.get()))
        .bind(edit.email.as_ref().map(|email| email.get()))
        .bind(edit.name.as_deref())
        .bind(edit.bio.as_deref())
        .bind(edit.image.as_deref())
        .bind(edit.status.map(|status| status.as_str()))
        .execute(&self.pool)
        .await
        .map_err(taken)?;

        if result.rows_affected() == 0 {
            return Err(DbError::UserNotFound(user_id));
        }

        info!(%user_id, "Profile edited");
        self.fetch_account(user_id).await
    }

    /// Case-insensitive substring search on handles.
    #[instrument(skip(self))]
    pub async fn search_users(&self, term: &str) -> Result<Vec<UserSummary>> {
        let records = query_as::<_, SummaryRecord>(
            "
            SELECT
                user_snowflake,
                handle,
                name,
                image
            FROM
                users
            WHERE
                handle LIKE '%' || $1 || '%' ESCAPE '\\'
            ORDER BY
                handle
            LIMIT $2
            ",
        )
        .bind(escape_like(term))
        .bind(SEARCH_USERS_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let users = records
            .into_iter()
            .map(UserSummary::try_from)
            .collect::<Result<_, _>>()?;
        Ok(users)
    }

    /// Operator bootstrap for admins; not reachable by clients.
    #[instrument(skip(self))]
    pub async fn set_user_role(&self, user_id: Id<UserMarker>, role: Role) -> Result<()> {
        let result = query("UPDATE users SET role = $1 WHERE user_snowflake = $2")
            .bind(role.as_str())
            .bind(user_id.to_db())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::UserNotFound(user_id));
        }

        info!(%user_id, %role, "User role changed");
        Ok(())
    }

    pub(crate) async fn ensure_admin(&self, user_id: Id<UserMarker>) -> Result<()> {
        let role: Option<String> = query_scalar("SELECT role FROM users WHERE user_snowflake = $1")
            .bind(user_id.to_db())
            .fetch_optional(&self.pool)
            .await?;

        match role.as_deref().map(str::parse::<Role>).transpose()? {
            Some(Role::Admin) => Ok(()),
            Some(Role::Member) | None => Err(DbError::AdminRequired),
        }
    }
}
