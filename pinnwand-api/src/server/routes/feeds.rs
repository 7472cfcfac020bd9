use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Json, Query},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use pinnwand_common::{
    model::post::Post,
    paging::{PageQuery, Paginated},
};
use pinnwand_db::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(personal)
        .typed_get(explore)
        .typed_get(following)
        .typed_get(liked)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/feeds/personal", rejection(ServerError))]
struct PersonalPath();

async fn personal(
    PersonalPath(): PersonalPath,
    State(db): State<Arc<DbClient>>,
    viewer: AuthenticatedUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<Post>>> {
    Ok(Json(db.personal_feed(viewer.user_id(), page).await?))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/feeds/explore", rejection(ServerError))]
struct ExplorePath();

async fn explore(
    ExplorePath(): ExplorePath,
    State(db): State<Arc<DbClient>>,
    viewer: AuthenticatedUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<Post>>> {
    Ok(Json(db.explore_feed(viewer.user_id(), page).await?))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/feeds/following", rejection(ServerError))]
struct FollowingPath();

async fn following(
    FollowingPath(): FollowingPath,
    State(db): State<Arc<DbClient>>,
    viewer: AuthenticatedUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<Post>>> {
    Ok(Json(db.following_feed(viewer.user_id(), page).await?))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/feeds/liked", rejection(ServerError))]
struct LikedPath();

async fn liked(
    LikedPath(): LikedPath,
    State(db): State<Arc<DbClient>>,
    viewer: AuthenticatedUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<Post>>> {
    Ok(Json(db.liked_feed(viewer.user_id(), page).await?))
}
