//! Paginated, viewer-annotated post listings.
//!
//! Counts and viewer flags are computed by the query. The listings that
//! cross authors also filter by visibility in SQL so pages stay full, and
//! every row still passes through the authorizer before it is returned.

use crate::{
    client::{DbClient, DbError, Result},
    record::{ImageRecord, PostRecord},
};
use pinnwand_common::{
    model::{
        Id,
        post::{Image, Post, PostMarker},
        user::UserMarker,
    },
    paging::{LONG_FEED_LIMIT, Page, PageQuery, Paginated, SHORT_FEED_LIMIT},
    visibility::can_view_post,
};
use sqlx::{QueryBuilder, Sqlite, query_as};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Posts with their author and viewer annotations; `$1` is the viewer.
macro_rules! post_query {
    ($($tail:expr),+ $(,)?) => {
        concat!(
            "
            SELECT
                posts.post_snowflake,
                posts.content,
                posts.status,
                posts.created_at,
                users.user_snowflake,
                users.handle,
                users.name,
                users.image,
                users.profile_status,
                (SELECT COUNT(*) FROM likes WHERE likes.post_snowflake = posts.post_snowflake) AS likes_count,
                (SELECT COUNT(*) FROM comments WHERE comments.post_snowflake = posts.post_snowflake) AS comments_count,
                EXISTS (
                    SELECT 1 FROM likes
                    WHERE
                        likes.post_snowflake = posts.post_snowflake
                        AND likes.user_snowflake = $1
                ) AS viewer_liked,
                EXISTS (
                    SELECT 1 FROM follows
                    WHERE
                        follows.followed_snowflake = posts.user_snowflake
                        AND follows.follower_snowflake = $1
                ) AS viewer_follows
            FROM
                posts JOIN users ON users.user_snowflake = posts.user_snowflake
            ",
            $($tail),+
        )
    };
}

/// The author is public, the viewer, or followed by the viewer.
macro_rules! visible_author {
    () => {
        "
        (
            users.profile_status = 'public'
            OR posts.user_snowflake = $1
            OR EXISTS (
                SELECT 1 FROM follows
                WHERE
                    follows.follower_snowflake = $1
                    AND follows.followed_snowflake = posts.user_snowflake
            )
        )
        "
    };
}

/// Snowflakes lead with their millisecond timestamp, so id order is creation order.
macro_rules! newest_first {
    ($limit:literal, $offset:literal) => {
        concat!(
            "
            ORDER BY
                posts.post_snowflake DESC
            LIMIT ",
            $limit,
            " OFFSET ",
            $offset
        )
    };
}

impl DbClient {
    /// One post as `viewer` sees it.
    #[instrument(skip(self))]
    pub async fn fetch_post(&self, viewer: Id<UserMarker>, post_id: Id<PostMarker>) -> Result<Post> {
        let record = query_as::<_, PostRecord>(post_query!("WHERE posts.post_snowflake = $2"))
            .bind(viewer.to_db())
            .bind(post_id.to_db())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::PostNotFound(post_id))?;

        let viewer_follows = record.viewer_follows;
        can_view_post(viewer, &record.access()?, || viewer_follows)
            .into_result()
            .map_err(|reason| DbError::hidden_post(post_id, reason))?;

        let mut posts = self.annotate(viewer, vec![record]).await?;
        posts.pop().ok_or(DbError::PostNotFound(post_id))
    }

    /// The viewer's own posts, archived ones included.
    #[instrument(skip(self))]
    pub async fn personal_feed(
        &self,
        viewer: Id<UserMarker>,
        query: PageQuery,
    ) -> Result<Paginated<Post>> {
        let page = Page::new(query, LONG_FEED_LIMIT);
        let records = query_as::<_, PostRecord>(post_query!(
            "WHERE posts.user_snowflake = $1",
            newest_first!("$2", "$3"),
        ))
        .bind(viewer.to_db())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        self.paginate(viewer, page, records).await
    }

    /// Public posts of everybody the viewer may see.
    #[instrument(skip(self))]
    pub async fn explore_feed(
        &self,
        viewer: Id<UserMarker>,
        query: PageQuery,
    ) -> Result<Paginated<Post>> {
        let page = Page::new(query, SHORT_FEED_LIMIT);
        let records = query_as::<_, PostRecord>(post_query!(
            "WHERE posts.status = 'public' AND ",
            visible_author!(),
            newest_first!("$2", "$3"),
        ))
        .bind(viewer.to_db())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        self.paginate(viewer, page, records).await
    }

    /// Public posts of followed users.
    #[instrument(skip(self))]
    pub async fn following_feed(
        &self,
        viewer: Id<UserMarker>,
        query: PageQuery,
    ) -> Result<Paginated<Post>> {
        let page = Page::new(query, SHORT_FEED_LIMIT);
        if !self.follows_anyone(viewer).await? {
            debug!("Viewer follows nobody");
            return Ok(Paginated::new(page, Vec::new()));
        }

        let records = query_as::<_, PostRecord>(post_query!(
            "
            WHERE
                posts.status = 'public'
                AND posts.user_snowflake IN (
                    SELECT followed_snowflake FROM follows WHERE follower_snowflake = $1
                )
            ",
            newest_first!("$2", "$3"),
        ))
        .bind(viewer.to_db())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        self.paginate(viewer, page, records).await
    }

    /// Public posts the viewer liked and may still see.
    #[instrument(skip(self))]
    pub async fn liked_feed(
        &self,
        viewer: Id<UserMarker>,
        query: PageQuery,
    ) -> Result<Paginated<Post>> {
        let page = Page::new(query, LONG_FEED_LIMIT);
        let records = query_as::<_, PostRecord>(post_query!(
            "
            WHERE
                posts.status = 'public'
                AND EXISTS (
                    SELECT 1 FROM likes
                    WHERE
                        likes.user_snowflake = $1
                        AND likes.post_snowflake = posts.post_snowflake
                )
                AND
            ",
            visible_author!(),
            newest_first!("$2", "$3"),
        ))
        .bind(viewer.to_db())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        self.paginate(viewer, page, records).await
    }

    /// Public posts of one author, if the viewer may see the author.
    #[instrument(skip(self))]
    pub async fn user_posts(
        &self,
        viewer: Id<UserMarker>,
        author: Id<UserMarker>,
        query: PageQuery,
    ) -> Result<Paginated<Post>> {
        self.ensure_profile_visible(viewer, author).await?;

        let page = Page::new(query, LONG_FEED_LIMIT);
        let records = query_as::<_, PostRecord>(post_query!(
            "WHERE posts.user_snowflake = $2 AND posts.status = 'public'",
            newest_first!("$3", "$4"),
        ))
        .bind(viewer.to_db())
        .bind(author.to_db())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        self.paginate(viewer, page, records).await
    }

    async fn paginate(
        &self,
        viewer: Id<UserMarker>,
        page: Page,
        records: Vec<PostRecord>,
    ) -> Result<Paginated<Post>> {
        let mut visible = Vec::with_capacity(records.len());
        for record in records {
            let viewer_follows = record.viewer_follows;
            if can_view_post(viewer, &record.access()?, || viewer_follows).is_allowed() {
                visible.push(record);
            }
        }

        let posts = self.annotate(viewer, visible).await?;
        Ok(Paginated::new(page, posts))
    }

    /// Attaches images, in the order they were uploaded.
    async fn annotate(&self, viewer: Id<UserMarker>, records: Vec<PostRecord>) -> Result<Vec<Post>> {
        let mut images = self
            .fetch_images(records.iter().map(|record| record.post_snowflake).collect::<Vec<_>>())
            .await?;

        let posts = records
            .into_iter()
            .map(|record| {
                let post_images = images.remove(&record.post_snowflake).unwrap_or_default();
                record.into_post(viewer, post_images)
            })
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    async fn fetch_images(
        &self,
        post_snowflakes: impl IntoIterator<Item = i64>,
    ) -> Result<HashMap<i64, Vec<Image>>> {
        let mut post_snowflakes = post_snowflakes.into_iter().peekable();
        if post_snowflakes.peek().is_none() {
            return Ok(HashMap::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT image_snowflake, post_snowflake, path FROM images WHERE post_snowflake IN (",
        );
        let mut separated = builder.separated(", ");
        for post_snowflake in post_snowflakes {
            separated.push_bind(post_snowflake);
        }
        separated.push_unseparated(") ORDER BY post_snowflake, position");

        let records = builder
            .build_query_as::<ImageRecord>()
            .fetch_all(&self.pool)
            .await?;

        let mut images: HashMap<i64, Vec<Image>> = HashMap::new();
        for record in records {
            images
                .entry(record.post_snowflake)
                .or_default()
                .push(record.into());
        }
        Ok(images)
    }
}
