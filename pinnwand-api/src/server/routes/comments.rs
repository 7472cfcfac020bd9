use crate::server::{Result, ServerError, ServerRouter, auth::AuthenticatedUser, extract::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use pinnwand_common::model::{
    Id,
    comment::{Comment, CommentMarker, CommentThread, CreateComment},
    post::PostMarker,
};
use pinnwand_db::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_comments)
        .typed_post(create_comment)
        .typed_get(list_replies)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/comments", rejection(ServerError))]
struct PostCommentsPath {
    id: Id<PostMarker>,
}

async fn list_comments(
    PostCommentsPath { id }: PostCommentsPath,
    State(db): State<Arc<DbClient>>,
    viewer: AuthenticatedUser,
) -> Result<Json<Vec<CommentThread>>> {
    let threads = db.list_top_level_comments(viewer.user_id(), id).await?;

    Ok(Json(threads))
}

/// `parent_id` in the body makes this a reply.
async fn create_comment(
    PostCommentsPath { id }: PostCommentsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(comment): Json<CreateComment>,
) -> Result<(StatusCode, Json<Comment>)> {
    let comment = db.create_comment(user.user_id(), id, comment).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/comments/{id}/replies", rejection(ServerError))]
struct RepliesPath {
    id: Id<CommentMarker>,
}

async fn list_replies(
    RepliesPath { id }: RepliesPath,
    State(db): State<Arc<DbClient>>,
    viewer: AuthenticatedUser,
) -> Result<Json<Vec<Comment>>> {
    let replies = db.list_replies(viewer.user_id(), id).await?;

    Ok(Json(replies))
}
