use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::service::ReportService;
use crate::http::ActorId;
use crate::store::EntityStore;

type Service<S> = State<Arc<ReportService<S>>>;

pub fn reports_router<S>(service: Arc<ReportService<S>>) -> Router
where
    S: EntityStore + 'static,
{
    Router::new()
        .route("/api/v1/overview", get(overview_handler::<S>))
        .route("/api/v1/dashboard", get(dashboard_handler::<S>))
        .route("/api/map-data", get(map_data_handler::<S>))
        .with_state(service)
}

async fn overview_handler<S>(State(service): Service<S>) -> Response
where
    S: EntityStore + 'static,
{
    match service.overview() {
        Ok(overview) => (StatusCode::OK, Json(overview)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn dashboard_handler<S>(State(service): Service<S>, ActorId(actor): ActorId) -> Response
where
    S: EntityStore + 'static,
{
    match service.dashboard(actor) {
        Ok(dashboard) => (StatusCode::OK, Json(dashboard)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn map_data_handler<S>(State(service): Service<S>) -> Response
where
    S: EntityStore + 'static,
{
    match service.map_data() {
        Ok(points) => (StatusCode::OK, Json(points)).into_response(),
        Err(err) => err.into_response(),
    }
}
