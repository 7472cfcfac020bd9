use crate::server::ServerRouter;
use axum::Router;

mod auth;
mod comments;
mod feeds;
mod follows;
mod posts;
mod reports;
mod users;

pub fn routes() -> ServerRouter {
    Router::new()
        .merge(auth::routes())
        .merge(users::routes())
        .merge(follows::routes())
        .merge(posts::routes())
        .merge(comments::routes())
        .merge(feeds::routes())
        .merge(reports::routes())
}
