use crate::{
    client::{DbClient, DbError, Result, is_unique_violation},
    posts::delete_post_cascade,
    record::ReportSummaryRecord,
};
use pinnwand_common::model::{Id, post::PostMarker, report::ReportSummary, user::UserMarker};
use sqlx::{query, query_as, query_scalar};
use time::OffsetDateTime;
use tracing::{debug, info, instrument};

impl DbClient {
    /// One report per user and post; the pair key rejects the second.
    #[instrument(skip(self))]
    pub async fn report_post(&self, reporter: Id<UserMarker>, post_id: Id<PostMarker>) -> Result<()> {
        self.ensure_post_visible(reporter, post_id).await?;

        query(
            "
            INSERT INTO reports (user_snowflake, post_snowflake, created_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(reporter.to_db())
        .bind(post_id.to_db())
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                DbError::AlreadyReported(post_id)
            } else {
                err.into()
            }
        })?;

        debug!("Post reported");
        Ok(())
    }

    /// Reported posts, most reported first.
    #[instrument(skip(self))]
    pub async fn list_reported_posts(&self, admin: Id<UserMarker>) -> Result<Vec<ReportSummary>> {
        self.ensure_admin(admin).await?;

        let records = query_as::<_, ReportSummaryRecord>(
            "
            SELECT
                posts.post_snowflake,
                COUNT(*) AS report_count,
                posts.content,
                users.user_snowflake,
                users.handle,
                users.name,
                users.image
            FROM
                reports
                JOIN posts ON posts.post_snowflake = reports.post_snowflake
                JOIN users ON users.user_snowflake = posts.user_snowflake
            GROUP BY
                posts.post_snowflake
            ORDER BY
                report_count DESC,
                posts.post_snowflake DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let summaries = records
            .into_iter()
            .map(ReportSummary::try_from)
            .collect::<Result<_, _>>()?;
        Ok(summaries)
    }

    /// Deletes a reported post the same way its author would.
    #[instrument(skip(self))]
    pub async fn resolve_report(&self, admin: Id<UserMarker>, post_id: Id<PostMarker>) -> Result<()> {
        self.ensure_admin(admin).await?;

        let mut tx = self.pool.begin().await?;

        let exists: bool = query_scalar("SELECT EXISTS (SELECT 1 FROM posts WHERE post_snowflake = $1)")
            .bind(post_id.to_db())
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(DbError::PostNotFound(post_id));
        }

        let counts = delete_post_cascade(&mut tx, post_id)
            .await
            .map_err(|source| DbError::Cascade { post: post_id, source })?;
        tx.commit()
            .await
            .map_err(|source| DbError::Cascade { post: post_id, source })?;

        info!(
            %post_id,
            %admin,
            reports = counts.reports,
            comments = counts.comments,
            "Report resolved by deleting post"
        );
        Ok(())
    }
}
