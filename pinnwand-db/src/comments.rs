use crate::{
    client::{DbClient, DbError, Result},
    record::{CommentRecord, ThreadRecord},
};
use pinnwand_common::{
    model::{
        Id,
        comment::{Comment, CommentMarker, CommentThread, CreateComment},
        post::PostMarker,
        user::UserMarker,
    },
    validation::validate_comment,
};
use sqlx::{FromRow, query, query_as, query_scalar};
use std::collections::HashMap;
use time::OffsetDateTime;
use tracing::{debug, instrument};

macro_rules! comment_query {
    ($($tail:expr),+ $(,)?) => {
        concat!(
            "
            SELECT
                comments.comment_snowflake,
                comments.post_snowflake,
                comments.parent_snowflake,
                comments.content,
                comments.created_at,
                users.user_snowflake,
                users.handle,
                users.name,
                users.image
            ",
            $($tail),+
        )
    };
}

#[derive(FromRow)]
struct ParentRecord {
    post_snowflake: i64,
    parent_snowflake: Option<i64>,
}

impl DbClient {
    /// A reply to a reply is attached to the top-level comment above it.
    #[instrument(skip(self))]
    pub async fn create_comment(
        &self,
        author: Id<UserMarker>,
        post_id: Id<PostMarker>,
        comment: CreateComment,
    ) -> Result<Comment> {
        let comment = validate_comment(comment)?;
        self.ensure_post_visible(author, post_id).await?;

        let parent = match comment.parent_id {
            Some(parent_id) => Some(self.resolve_parent(post_id, parent_id).await?),
            None => None,
        };

        let comment_id: Id<CommentMarker> = self.next_id()?;
        query(
            "
            INSERT INTO comments (comment_snowflake, post_snowflake, user_snowflake, parent_snowflake, content, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(comment_id.to_db())
        .bind(post_id.to_db())
        .bind(author.to_db())
        .bind(parent.map(Id::to_db))
        .bind(&comment.content)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await?;

        debug!(%comment_id, "Comment created");

        let record = query_as::<_, CommentRecord>(comment_query!(
            "
            FROM
                comments JOIN users ON users.user_snowflake = comments.user_snowflake
            WHERE
                comments.comment_snowflake = $1
            "
        ))
        .bind(comment_id.to_db())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::CommentNotFound(comment_id))?;

        Ok(record.try_into()?)
    }

    /// The top-level comment a new reply to `parent_id` belongs under.
    async fn resolve_parent(
        &self,
        post_id: Id<PostMarker>,
        parent_id: Id<CommentMarker>,
    ) -> Result<Id<CommentMarker>> {
        let parent = query_as::<_, ParentRecord>(
            "
            SELECT
                post_snowflake,
                parent_snowflake
            FROM
                comments
            WHERE
                comment_snowflake = $1
            ",
        )
        .bind(parent_id.to_db())
        .fetch_optional(&self.pool)
        .await?
        .filter(|parent| parent.post_snowflake == post_id.to_db())
        .ok_or(DbError::ParentCommentNotFound(parent_id))?;

        Ok(parent.parent_snowflake.map_or(parent_id, Id::from_db))
    }

    /// Top-level comments, oldest first, each with its latest reply.
    #[instrument(skip(self))]
    pub async fn list_top_level_comments(
        &self,
        viewer: Id<UserMarker>,
        post_id: Id<PostMarker>,
    ) -> Result<Vec<CommentThread>> {
        self.ensure_post_visible(viewer, post_id).await?;

        let threads = query_as::<_, ThreadRecord>(comment_query!(
            "
                , (
                    SELECT COUNT(*) FROM comments AS replies
                    WHERE replies.parent_snowflake = comments.comment_snowflake
                ) AS replies_count
            FROM
                comments JOIN users ON users.user_snowflake = comments.user_snowflake
            WHERE
                comments.post_snowflake = $1
                AND comments.parent_snowflake IS NULL
            ORDER BY
                comments.comment_snowflake
            "
        ))
        .bind(post_id.to_db())
        .fetch_all(&self.pool)
        .await?;

        let latest_replies = query_as::<_, CommentRecord>(concat!(
            "SELECT * FROM (",
            comment_query!(
                "
                    , ROW_NUMBER() OVER (
                        PARTITION BY comments.parent_snowflake
                        ORDER BY comments.comment_snowflake DESC
                    ) AS recency
                FROM
                    comments JOIN users ON users.user_snowflake = comments.user_snowflake
                WHERE
                    comments.post_snowflake = $1
                    AND comments.parent_snowflake IS NOT NULL
                "
            ),
            ") WHERE recency = 1",
        ))
        .bind(post_id.to_db())
        .fetch_all(&self.pool)
        .await?;

        let mut latest_by_parent = HashMap::with_capacity(latest_replies.len());
        for record in latest_replies {
            let reply = Comment::try_from(record)?;
            if let Some(parent_id) = reply.parent_id {
                latest_by_parent.insert(parent_id, reply);
            }
        }

        let threads = threads
            .into_iter()
            .map(|thread| -> Result<CommentThread> {
                let replies_count = u64::try_from(thread.replies_count).unwrap_or_default();
                let comment = Comment::try_from(thread.comment)?;
                Ok(CommentThread {
                    latest_reply: latest_by_parent.remove(&comment.id),
                    comment,
                    replies_count,
                })
            })
            .collect::<Result<_>>()?;
        Ok(threads)
    }

    /// Replies to one top-level comment, oldest first.
    #[instrument(skip(self))]
    pub async fn list_replies(
        &self,
        viewer: Id<UserMarker>,
        comment_id: Id<CommentMarker>,
    ) -> Result<Vec<Comment>> {
        let post_snowflake: i64 =
            query_scalar("SELECT post_snowflake FROM comments WHERE comment_snowflake = $1")
                .bind(comment_id.to_db())
                .fetch_optional(&self.pool)
                .await?
                .ok_or(DbError::CommentNotFound(comment_id))?;

        self.ensure_post_visible(viewer, Id::from_db(post_snowflake))
            .await?;

        let records = query_as::<_, CommentRecord>(comment_query!(
            "
            FROM
                comments JOIN users ON users.user_snowflake = comments.user_snowflake
            WHERE
                comments.parent_snowflake = $1
            ORDER BY
                comments.comment_snowflake
            "
        ))
        .bind(comment_id.to_db())
        .fetch_all(&self.pool)
        .await?;

        let replies = records
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<_, _>>()?;
        Ok(replies)
    }
}
