use crate::server::{Result, ServerError, ServerRouter, auth::AuthenticatedUser, extract::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use pinnwand_common::model::{
    Id,
    user::{UserMarker, UserSummary},
};
use pinnwand_db::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(follow)
        .typed_delete(unfollow)
        .typed_get(followers)
        .typed_get(following)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/follows/{id}", rejection(ServerError))]
struct FollowPath {
    id: Id<UserMarker>,
}

async fn follow(
    FollowPath { id }: FollowPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    db.follow(user.user_id(), id).await?;

    Ok(StatusCode::CREATED)
}

async fn unfollow(
    FollowPath { id }: FollowPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    db.unfollow(user.user_id(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/follows/followers", rejection(ServerError))]
struct FollowersPath();

async fn followers(
    FollowersPath(): FollowersPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<UserSummary>>> {
    let followers = db.list_followers(user.user_id()).await?;

    Ok(Json(followers))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/follows/following", rejection(ServerError))]
struct FollowingPath();

async fn following(
    FollowingPath(): FollowingPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<UserSummary>>> {
    let following = db.list_following(user.user_id()).await?;

    Ok(Json(following))
}
