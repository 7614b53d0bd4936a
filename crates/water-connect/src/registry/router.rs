use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::domain::{IssueId, SourceId};
use super::export::OPEN_ISSUES_FILENAME;
use super::forms::{IssueReportForm, RepairLogForm, WaterSourceForm};
use super::service::SourceRegistryService;
use crate::http::{ActorId, FormBody, IdPath};
use crate::store::RegistryStore;

type Service<S> = State<Arc<SourceRegistryService<S>>>;

/// Router builder for sources, issue reports, and repair logs.
pub fn registry_router<S>(service: Arc<SourceRegistryService<S>>) -> Router
where
    S: RegistryStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/sources",
            get(list_sources_handler::<S>).post(create_source_handler::<S>),
        )
        .route(
            "/api/v1/sources/:source_id",
            get(source_detail_handler::<S>)
                .put(update_source_handler::<S>)
                .delete(delete_source_handler::<S>),
        )
        .route(
            "/api/v1/sources/:source_id/repairs",
            post(log_repair_handler::<S>),
        )
        .route(
            "/api/v1/issues",
            get(open_issues_handler::<S>).post(submit_issue_handler::<S>),
        )
        .route("/api/v1/issues/export", get(export_issues_handler::<S>))
        .route(
            "/api/v1/issues/:issue_id/resolve",
            post(toggle_resolved_handler::<S>),
        )
        .with_state(service)
}

async fn list_sources_handler<S>(State(service): Service<S>) -> Response
where
    S: RegistryStore + 'static,
{
    match service.list_sources() {
        Ok(sources) => (StatusCode::OK, Json(sources)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn source_detail_handler<S>(
    State(service): Service<S>,
    IdPath(source_id): IdPath,
) -> Response
where
    S: RegistryStore + 'static,
{
    match service.source_detail(SourceId(source_id)) {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn create_source_handler<S>(
    State(service): Service<S>,
    ActorId(actor): ActorId,
    FormBody(form): FormBody<WaterSourceForm>,
) -> Response
where
    S: RegistryStore + 'static,
{
    match service.create_source(actor, form) {
        Ok(source) => (StatusCode::CREATED, Json(source)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn update_source_handler<S>(
    State(service): Service<S>,
    ActorId(actor): ActorId,
    IdPath(source_id): IdPath,
    FormBody(form): FormBody<WaterSourceForm>,
) -> Response
where
    S: RegistryStore + 'static,
{
    match service.update_source(actor, SourceId(source_id), form) {
        Ok(source) => (StatusCode::OK, Json(source)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn delete_source_handler<S>(
    State(service): Service<S>,
    ActorId(actor): ActorId,
    IdPath(source_id): IdPath,
) -> Response
where
    S: RegistryStore + 'static,
{
    match service.delete_source(actor, SourceId(source_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn log_repair_handler<S>(
    State(service): Service<S>,
    ActorId(actor): ActorId,
    IdPath(source_id): IdPath,
    FormBody(form): FormBody<RepairLogForm>,
) -> Response
where
    S: RegistryStore + 'static,
{
    match service.log_repair(actor, SourceId(source_id), form) {
        Ok(repair) => (StatusCode::CREATED, Json(repair)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn submit_issue_handler<S>(
    State(service): Service<S>,
    ActorId(actor): ActorId,
    FormBody(form): FormBody<IssueReportForm>,
) -> Response
where
    S: RegistryStore + 'static,
{
    match service.submit_issue(actor, form) {
        Ok(issue) => (StatusCode::CREATED, Json(issue)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn open_issues_handler<S>(State(service): Service<S>, ActorId(actor): ActorId) -> Response
where
    S: RegistryStore + 'static,
{
    match service.open_issues(actor) {
        Ok(issues) => (StatusCode::OK, Json(issues)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn toggle_resolved_handler<S>(
    State(service): Service<S>,
    ActorId(actor): ActorId,
    IdPath(issue_id): IdPath,
) -> Response
where
    S: RegistryStore + 'static,
{
    match service.toggle_issue_resolved(actor, IssueId(issue_id)) {
        Ok(issue) => (StatusCode::OK, Json(issue)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn export_issues_handler<S>(State(service): Service<S>, ActorId(actor): ActorId) -> Response
where
    S: RegistryStore + 'static,
{
    match service.export_open_issues(actor) {
        Ok(csv) => {
            let disposition = format!("attachment; filename=\"{OPEN_ISSUES_FILENAME}\"");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, mime::TEXT_CSV.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                csv,
            )
                .into_response()
        }
        Err(err) => err.into_response(),
    }
}
