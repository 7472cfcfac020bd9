mod common;

use common::{client, post, register};
use pinnwand_common::model::{
    comment::CreateComment,
    post::{CreatePost, EditPost, PostStatus},
};
use pinnwand_db::{DbClient, DbError, ErrorKind};
use sqlx::{query, query_scalar};

async fn rows(client: &DbClient, table: &str, post_snowflake: i64) -> i64 {
    query_scalar(&format!(
        "SELECT COUNT(*) FROM {table} WHERE post_snowflake = $1"
    ))
    .bind(post_snowflake)
    .fetch_one(client.pool())
    .await
    .unwrap()
}

#[tokio::test]
async fn create_returns_the_enriched_post() {
    let client = client().await;
    let ada = register(&client, "ada").await;

    let created = client
        .create_post(
            ada,
            CreatePost {
                content: "  with a picture  ".to_owned(),
                status: PostStatus::Public,
                images: vec!["uploads/posts/1.png".to_owned()],
            },
        )
        .await
        .unwrap();

    assert_eq!(created.content, "with a picture");
    assert_eq!(created.author.id, ada);
    assert_eq!(created.images.len(), 1);
    assert!(created.is_owner);
    assert_eq!((created.likes_count, created.comments_count), (0, 0));
}

#[tokio::test]
async fn invalid_posts_write_nothing() {
    let client = client().await;
    let ada = register(&client, "ada").await;

    let err = client
        .create_post(
            ada,
            CreatePost {
                content: "too many".to_owned(),
                status: PostStatus::Public,
                images: vec!["a.png".to_owned(); 6],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let posts: i64 = query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(client.pool())
        .await
        .unwrap();
    let images: i64 = query_scalar("SELECT COUNT(*) FROM images")
        .fetch_one(client.pool())
        .await
        .unwrap();
    assert_eq!((posts, images), (0, 0));
}

#[tokio::test]
async fn only_the_author_edits() {
    let client = client().await;
    let ada = register(&client, "ada").await;
    let bob = register(&client, "bob").await;
    let p1 = post(&client, ada, "first draft").await;

    let err = client
        .edit_post(
            bob,
            p1.id,
            EditPost {
                content: "vandalised".to_owned(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::PostNotFound(_)));

    client
        .edit_post(
            ada,
            p1.id,
            EditPost {
                content: "second draft".to_owned(),
            },
        )
        .await
        .unwrap();
    assert_eq!(
        client.fetch_post(bob, p1.id).await.unwrap().content,
        "second draft"
    );
}

#[tokio::test]
async fn delete_cascades_to_every_child() {
    let client = client().await;
    let ada = register(&client, "ada").await;
    let bob = register(&client, "bob").await;

    let doomed = client
        .create_post(
            ada,
            CreatePost {
                content: "doomed".to_owned(),
                status: PostStatus::Public,
                images: vec!["a.png".to_owned(), "b.png".to_owned()],
            },
        )
        .await
        .unwrap();
    let survivor = post(&client, ada, "survivor").await;

    client.like_post(bob, doomed.id).await.unwrap();
    client.like_post(bob, survivor.id).await.unwrap();
    client.report_post(bob, doomed.id).await.unwrap();
    let top = client
        .create_comment(
            bob,
            doomed.id,
            CreateComment {
                content: "first".to_owned(),
                parent_id: None,
            },
        )
        .await
        .unwrap();
    client
        .create_comment(
            ada,
            doomed.id,
            CreateComment {
                content: "reply".to_owned(),
                parent_id: Some(top.id),
            },
        )
        .await
        .unwrap();

    let err = client.delete_post(bob, doomed.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(rows(&client, "comments", doomed.id.to_db()).await, 2);

    client.delete_post(ada, doomed.id).await.unwrap();

    for table in ["posts", "images", "likes", "comments", "reports"] {
        assert_eq!(rows(&client, table, doomed.id.to_db()).await, 0, "{table}");
    }
    assert_eq!(rows(&client, "likes", survivor.id.to_db()).await, 1);
    assert!(client.fetch_post(ada, survivor.id).await.is_ok());

    let err = client.delete_post(ada, doomed.id).await.unwrap_err();
    assert!(matches!(err, DbError::PostNotFound(_)));
}

#[tokio::test]
async fn delete_without_children() {
    let client = client().await;
    let ada = register(&client, "ada").await;
    let p1 = post(&client, ada, "lonely").await;

    client.delete_post(ada, p1.id).await.unwrap();
    assert_eq!(rows(&client, "posts", p1.id.to_db()).await, 0);
}

async fn count(client: &DbClient, table: &str) -> i64 {
    query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(client.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn failed_image_insert_rolls_back_the_post() {
    let client = client().await;
    let ada = register(&client, "ada").await;

    // The second image of any post fails after the post and first image are written.
    query(
        "
        CREATE TRIGGER single_image BEFORE INSERT ON images
        WHEN EXISTS (SELECT 1 FROM images WHERE post_snowflake = NEW.post_snowflake)
        BEGIN
            SELECT RAISE(ABORT, 'one image per post');
        END
        ",
    )
    .execute(client.pool())
    .await
    .unwrap();

    let err = client
        .create_post(
            ada,
            CreatePost {
                content: "two pictures".to_owned(),
                status: PostStatus::Public,
                images: vec!["a.png".to_owned(), "b.png".to_owned()],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);

    assert_eq!((count(&client, "posts").await, count(&client, "images").await), (0, 0));
}

#[tokio::test]
async fn failed_cascade_keeps_every_child() {
    let client = client().await;
    let ada = register(&client, "ada").await;
    let bob = register(&client, "bob").await;

    let p1 = client
        .create_post(
            ada,
            CreatePost {
                content: "sturdy".to_owned(),
                status: PostStatus::Public,
                images: vec!["a.png".to_owned()],
            },
        )
        .await
        .unwrap();
    client.report_post(bob, p1.id).await.unwrap();
    client
        .create_comment(
            bob,
            p1.id,
            CreateComment {
                content: "nice".to_owned(),
                parent_id: None,
            },
        )
        .await
        .unwrap();
    client.like_post(bob, p1.id).await.unwrap();

    // Reports, images and comments go first, then the likes refuse.
    query(
        "
        CREATE TRIGGER permanent_likes BEFORE DELETE ON likes
        BEGIN
            SELECT RAISE(ABORT, 'likes are permanent');
        END
        ",
    )
    .execute(client.pool())
    .await
    .unwrap();

    let err = client.delete_post(ada, p1.id).await.unwrap_err();
    assert!(matches!(err, DbError::Cascade { .. }));
    assert_eq!(err.kind(), ErrorKind::Internal);

    for table in ["posts", "images", "likes", "comments", "reports"] {
        assert_eq!(rows(&client, table, p1.id.to_db()).await, 1, "{table}");
    }
}

#[tokio::test]
async fn blank_edits_need_images() {
    let client = client().await;
    let ada = register(&client, "ada").await;
    let text_only = post(&client, ada, "words").await;
    let pictured = client
        .create_post(
            ada,
            CreatePost {
                content: "caption".to_owned(),
                status: PostStatus::Public,
                images: vec!["a.png".to_owned()],
            },
        )
        .await
        .unwrap();

    let blank = || EditPost {
        content: "  ".to_owned(),
    };

    let err = client.edit_post(ada, text_only.id, blank()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(
        client.fetch_post(ada, text_only.id).await.unwrap().content,
        "words"
    );

    client.edit_post(ada, pictured.id, blank()).await.unwrap();
    assert_eq!(client.fetch_post(ada, pictured.id).await.unwrap().content, "");
}
