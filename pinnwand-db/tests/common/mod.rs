#![allow(dead_code)]

use pinnwand_common::{
    model::{
        Id,
        post::{CreatePost, Post, PostStatus},
        user::{Account, UserMarker},
    },
    snowflake::{ProcessId, WorkerId},
    validation::{EditProfileRequest, RegisterRequest},
};
use pinnwand_db::DbClient;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// A migrated in-memory database.
///
/// Every connection to `:memory:` is its own database, so the pool holds
/// exactly one connection for the lifetime of the test.
pub async fn client() -> DbClient {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();

    let client = DbClient::new(
        pool,
        WorkerId::new(1).unwrap(),
        ProcessId::new(1).unwrap(),
    );
    client.migrate().await.unwrap();
    client
}

pub async fn register(client: &DbClient, username: &str) -> Id<UserMarker> {
    register_account(client, username).await.id
}

pub async fn register_account(client: &DbClient, username: &str) -> Account {
    client
        .register(RegisterRequest {
            username: username.to_owned(),
            email: format!("{username}@example.org"),
            password: "correct horse".to_owned(),
        })
        .await
        .unwrap()
}

pub async fn make_private(client: &DbClient, user: Id<UserMarker>) {
    client
        .edit_profile(
            user,
            EditProfileRequest {
                status: Some("private".to_owned()),
                ..EditProfileRequest::default()
            },
        )
        .await
        .unwrap();
}

pub async fn post(client: &DbClient, author: Id<UserMarker>, content: &str) -> Post {
    post_with_status(client, author, content, PostStatus::Public).await
}

pub async fn post_with_status(
    client: &DbClient,
    author: Id<UserMarker>,
    content: &str,
    status: PostStatus,
) -> Post {
    client
        .create_post(
            author,
            CreatePost {
                content: content.to_owned(),
                status,
                images: Vec::new(),
            },
        )
        .await
        .unwrap()
}
