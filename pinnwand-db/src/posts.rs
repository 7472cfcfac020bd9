use crate::{
    client::{DbClient, DbError, Result, is_unique_violation},
    record::PostAccessRecord,
};
use pinnwand_common::{
    model::{
        Id,
        post::{CreatePost, EditPost, ImageMarker, Post, PostMarker},
        user::UserMarker,
    },
    validation::{validate_post, validate_post_edit},
    visibility::can_view_post,
};
use sqlx::{SqliteConnection, query, query_as, query_scalar};
use time::OffsetDateTime;
use tracing::{debug, info, instrument};

/// Rows removed together with a post.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub(crate) struct CascadeCounts {
    pub reports: u64,
    pub images: u64,
    pub comments: u64,
    pub likes: u64,
}

/// Deletes a post and everything hanging off it on `conn`.
///
/// Must run inside a transaction; replies go before the comments they
/// answer so the self reference never dangles.
pub(crate) async fn delete_post_cascade(
    conn: &mut SqliteConnection,
    post_id: Id<PostMarker>,
) -> Result<CascadeCounts, sqlx::Error> {
    let post = post_id.to_db();

    let reports = query("DELETE FROM reports WHERE post_snowflake = $1")
        .bind(post)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    let images = query("DELETE FROM images WHERE post_snowflake = $1")
        .bind(post)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    let replies = query(
        "DELETE FROM comments WHERE post_snowflake = $1 AND parent_snowflake IS NOT NULL",
    )
    .bind(post)
    .execute(&mut *conn)
    .await?
    .rows_affected();
    let top_level = query("DELETE FROM comments WHERE post_snowflake = $1")
        .bind(post)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    let likes = query("DELETE FROM likes WHERE post_snowflake = $1")
        .bind(post)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    query("DELETE FROM posts WHERE post_snowflake = $1")
        .bind(post)
        .execute(&mut *conn)
        .await?;

    Ok(CascadeCounts {
        reports,
        images,
        comments: replies + top_level,
        likes,
    })
}

impl DbClient {
    /// Writes the post and its images in one transaction.
    #[instrument(skip(self))]
    pub async fn create_post(&self, author: Id<UserMarker>, post: CreatePost) -> Result<Post> {
        let post = validate_post(post)?;
        let post_id: Id<PostMarker> = self.next_id()?;
        let now = OffsetDateTime::now_utc();

        let mut tx = self.pool.begin().await?;

        query(
            "
            INSERT INTO posts (post_snowflake, user_snowflake, content, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(post_id.to_db())
        .bind(author.to_db())
        .bind(&post.content)
        .bind(post.status.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for (position, path) in (0_i64..).zip(&post.images) {
            let image_id: Id<ImageMarker> = self.next_id()?;

            query(
                "
                INSERT INTO images (image_snowflake, post_snowflake, position, path)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(image_id.to_db())
            .bind(post_id.to_db())
            .bind(position)
            .bind(path)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(%post_id, images = post.images.len(), "Post created");
        self.fetch_post(author, post_id).await
    }

    /// Only the author may edit, and only the content.
    #[instrument(skip(self))]
    pub async fn edit_post(
        &self,
        author: Id<UserMarker>,
        post_id: Id<PostMarker>,
        edit: EditPost,
    ) -> Result<()> {
        let has_images: bool =
            query_scalar("SELECT EXISTS (SELECT 1 FROM images WHERE post_snowflake = $1)")
                .bind(post_id.to_db())
                .fetch_one(&self.pool)
                .await?;
        let edit = validate_post_edit(edit, has_images)?;

        let result = query(
            "
            UPDATE posts
            SET content = $1
            WHERE
                post_snowflake = $2
                AND user_snowflake = $3
            ",
        )
        .bind(&edit.content)
        .bind(post_id.to_db())
        .bind(author.to_db())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::PostNotFound(post_id));
        }

        debug!("Post edited");
        Ok(())
    }

    /// Someone else's post reads as missing.
    #[instrument(skip(self))]
    pub async fn delete_post(&self, author: Id<UserMarker>, post_id: Id<PostMarker>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let owner: Option<i64> = query_scalar("SELECT user_snowflake FROM posts WHERE post_snowflake = $1")
            .bind(post_id.to_db())
            .fetch_optional(&mut *tx)
            .await?;

        if owner != Some(author.to_db()) {
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
            reports = counts.reports,
            images = counts.images,
            comments = counts.comments,
            likes = counts.likes,
            "Post deleted"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn like_post(&self, user: Id<UserMarker>, post_id: Id<PostMarker>) -> Result<()> {
        self.ensure_post_visible(user, post_id).await?;

        query(
            "
            INSERT INTO likes (user_snowflake, post_snowflake, created_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(user.to_db())
        .bind(post_id.to_db())
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                DbError::AlreadyLiked(post_id)
            } else {
                err.into()
            }
        })?;

        debug!("Post liked");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn unlike_post(&self, user: Id<UserMarker>, post_id: Id<PostMarker>) -> Result<()> {
        self.ensure_post_visible(user, post_id).await?;

        let result = query("DELETE FROM likes WHERE user_snowflake = $1 AND post_snowflake = $2")
            .bind(user.to_db())
            .bind(post_id.to_db())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotLiked(post_id));
        }

        debug!("Post unliked");
        Ok(())
    }

    /// Fails with [`DbError::PostNotFound`] if the post is missing or hidden
    /// from `viewer`.
    pub(crate) async fn ensure_post_visible(
        &self,
        viewer: Id<UserMarker>,
        post_id: Id<PostMarker>,
    ) -> Result<()> {
        let record = query_as::<_, PostAccessRecord>(
            "
            SELECT
                posts.user_snowflake,
                posts.status,
                users.profile_status,
                EXISTS (
                    SELECT 1 FROM follows
                    WHERE
                        follower_snowflake = $1
                        AND followed_snowflake = posts.user_snowflake
                ) AS viewer_follows
            FROM
                posts JOIN users ON users.user_snowflake = posts.user_snowflake
            WHERE
                posts.post_snowflake = $2
            ",
        )
        .bind(viewer.to_db())
        .bind(post_id.to_db())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::PostNotFound(post_id))?;

        let viewer_follows = record.viewer_follows;
        can_view_post(viewer, &record.access()?, || viewer_follows)
            .into_result()
            .map_err(|reason| DbError::hidden_post(post_id, reason))
    }
}
