use crate::server::{Result, ServerError, ServerRouter, extract::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use pinnwand_common::{
    model::{
        auth::{AccessToken, AuthToken, Credentials, TokenPair},
        user::Account,
    },
    validation::RegisterRequest,
};
use pinnwand_db::{DbClient, auth::TokenLifetimes};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(register)
        .typed_post(login)
        .typed_post(refresh)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/auth/register", rejection(ServerError))]
struct RegisterPath();

async fn register(
    RegisterPath(): RegisterPath,
    State(db): State<Arc<DbClient>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Account>)> {
    let account = db.register(request).await?;

    Ok((StatusCode::CREATED, Json(account)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/auth/login", rejection(ServerError))]
struct LoginPath();

async fn login(
    LoginPath(): LoginPath,
    State(db): State<Arc<DbClient>>,
    State(lifetimes): State<TokenLifetimes>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<TokenPair>> {
    let tokens = db.login(&credentials, lifetimes).await?;

    Ok(Json(tokens))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/auth/refresh", rejection(ServerError))]
struct RefreshPath();

#[derive(Deserialize)]
struct RefreshRequest {
    refresh_token: String,
}

async fn refresh(
    RefreshPath(): RefreshPath,
    State(db): State<Arc<DbClient>>,
    State(lifetimes): State<TokenLifetimes>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<AccessToken>> {
    let refresh_token: AuthToken = request
        .refresh_token
        .parse()
        .map_err(|_| ServerError::InvalidToken)?;

    let access_token = db
        .refresh_access_token(&refresh_token, lifetimes.access)
        .await?;

    Ok(Json(access_token))
}
