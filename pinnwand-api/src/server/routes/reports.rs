use crate::server::{Result, ServerError, ServerRouter, auth::AuthenticatedUser, extract::Json};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use pinnwand_common::model::{Id, post::PostMarker, report::ReportSummary};
use pinnwand_db::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(report_post)
        .typed_get(list_reports)
        .typed_delete(resolve_report)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/report", rejection(ServerError))]
struct ReportPostPath {
    id: Id<PostMarker>,
}

async fn report_post(
    ReportPostPath { id }: ReportPostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    db.report_post(user.user_id(), id).await?;

    Ok(StatusCode::CREATED)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/reports", rejection(ServerError))]
struct ReportsPath();

async fn list_reports(
    ReportsPath(): ReportsPath,
    State(db): State<Arc<DbClient>>,
    admin: AuthenticatedUser,
) -> Result<Json<Vec<ReportSummary>>> {
    let reports = db.list_reported_posts(admin.user_id()).await?;

    Ok(Json(reports))
}

/// Resolving a report deletes the reported post.
#[derive(TypedPath, Deserialize)]
#[typed_path("/reports/{id}", rejection(ServerError))]
struct ResolveReportPath {
    id: Id<PostMarker>,
}

async fn resolve_report(
    ResolveReportPath { id }: ResolveReportPath,
    State(db): State<Arc<DbClient>>,
    admin: AuthenticatedUser,
) -> Result<StatusCode> {
    db.resolve_report(admin.user_id(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}
