use crate::{
    client::{DbClient, DbError, Result, is_foreign_key_violation, is_unique_violation},
    record::SummaryRecord,
};
use pinnwand_common::model::{
    Id,
    user::{UserMarker, UserSummary},
};
use sqlx::{query, query_as, query_scalar};
use time::OffsetDateTime;
use tracing::{debug, instrument};

impl DbClient {
    /// Fails if the edge exists already; the pair key decides, not a prior read.
    #[instrument(skip(self))]
    pub async fn follow(&self, follower: Id<UserMarker>, followed: Id<UserMarker>) -> Result<()> {
        if follower == followed {
            return Err(DbError::SelfFollow);
        }

        query(
            "
            INSERT INTO follows (follower_snowflake, followed_snowflake, created_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(follower.to_db())
        .bind(followed.to_db())
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                DbError::AlreadyFollowing(followed)
            } else if is_foreign_key_violation(&err) {
                DbError::UserNotFound(followed)
            } else {
                err.into()
            }
        })?;

        debug!("Follow edge created");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn unfollow(&self, follower: Id<UserMarker>, followed: Id<UserMarker>) -> Result<()> {
        let result = query(
            "
            DELETE FROM follows
            WHERE
                follower_snowflake = $1
                AND followed_snowflake = $2
            ",
        )
        .bind(follower.to_db())
        .bind(followed.to_db())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFollowing(followed));
        }

        debug!("Follow edge removed");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn is_following(
        &self,
        follower: Id<UserMarker>,
        followed: Id<UserMarker>,
    ) -> Result<bool> {
        let following = query_scalar(
            "
            SELECT EXISTS (
                SELECT 1 FROM follows
                WHERE
                    follower_snowflake = $1
                    AND followed_snowflake = $2
            )
            ",
        )
        .bind(follower.to_db())
        .bind(followed.to_db())
        .fetch_one(&self.pool)
        .await?;

        Ok(following)
    }

    /// Users following `user`.
    #[instrument(skip(self))]
    pub async fn list_followers(&self, user: Id<UserMarker>) -> Result<Vec<UserSummary>> {
        let records = query_as::<_, SummaryRecord>(
            "
            SELECT
                users.user_snowflake,
                users.handle,
                users.name,
                users.image
            FROM
                follows JOIN users ON users.user_snowflake = follows.follower_snowflake
            WHERE
                follows.followed_snowflake = $1
            ",
        )
        .bind(user.to_db())
        .fetch_all(&self.pool)
        .await?;

        let followers = records
            .into_iter()
            .map(UserSummary::try_from)
            .collect::<Result<_, _>>()?;
        Ok(followers)
    }

    /// Users `user` follows.
    #[instrument(skip(self))]
    pub async fn list_following(&self, user: Id<UserMarker>) -> Result<Vec<UserSummary>> {
        let records = query_as::<_, SummaryRecord>(
            "
            SELECT
                users.user_snowflake,
                users.handle,
                users.name,
                users.image
            FROM
                follows JOIN users ON users.user_snowflake = follows.followed_snowflake
            WHERE
                follows.follower_snowflake = $1
            ",
        )
        .bind(user.to_db())
        .fetch_all(&self.pool)
        .await?;

        let following = records
            .into_iter()
            .map(UserSummary::try_from)
            .collect::<Result<_, _>>()?;
        Ok(following)
    }

    pub(crate) async fn follows_anyone(&self, user: Id<UserMarker>) -> Result<bool> {
        let follows_anyone = query_scalar(
            "
            SELECT EXISTS (SELECT 1 FROM follows WHERE follower_snowflake = $1)
            ",
        )
        .bind(user.to_db())
        .fetch_one(&self.pool)
        .await?;

        Ok(follows_anyone)
    }
}
