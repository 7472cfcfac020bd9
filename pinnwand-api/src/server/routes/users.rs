use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    extract::{Json, Query},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use pinnwand_common::{
    model::{
        Id,
        post::Post,
        user::{Account, User, UserMarker, UserSummary},
    },
    paging::{PageQuery, Paginated},
    validation::EditProfileRequest,
};
use pinnwand_db::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_me)
        .typed_put(edit_me)
        .typed_get(get_user)
        .typed_get(search_users)
        .typed_get(get_user_posts)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/me", rejection(ServerError))]
struct MePath();

async fn get_me(
    MePath(): MePath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<Json<Account>> {
    let account = db.fetch_account(user.user_id()).await?;

    Ok(Json(account))
}

async fn edit_me(
    MePath(): MePath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(request): Json<EditProfileRequest>,
) -> Result<Json<Account>> {
    let account = db.edit_profile(user.user_id(), request).await?;

    Ok(Json(account))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}", rejection(ServerError))]
struct GetUserPath {
    id: Id<UserMarker>,
}

async fn get_user(
    GetUserPath { id }: GetUserPath,
    State(db): State<Arc<DbClient>>,
    viewer: AuthenticatedUser,
) -> Result<Json<User>> {
    let user = db.fetch_profile(viewer.user_id(), id).await?;

    Ok(Json(user))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/search/{term}", rejection(ServerError))]
struct SearchUsersPath {
    term: String,
}

async fn search_users(
    SearchUsersPath { term }: SearchUsersPath,
    State(db): State<Arc<DbClient>>,
    _viewer: AuthenticatedUser,
) -> Result<Json<Vec<UserSummary>>> {
    let users = db.search_users(&term).await?;

    Ok(Json(users))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}/posts", rejection(ServerError))]
struct GetUserPostsPath {
    id: Id<UserMarker>,
}

async fn get_user_posts(
    GetUserPostsPath { id }: GetUserPostsPath,
    State(db): State<Arc<DbClient>>,
    viewer: AuthenticatedUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<Post>>> {
    let posts = db.user_posts(viewer.user_id(), id, page).await?;

    Ok(Json(posts))
}
