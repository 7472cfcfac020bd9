pub mod auth;
pub mod client;
mod comments;
mod feeds;
mod follows;
mod moderation;
mod posts;
mod record;
mod users;

pub use client::{DbClient, DbError, ErrorKind, Result};
