use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::forms::{ProfileUpdateForm, SignUpForm};
use super::service::AccountService;
use crate::http::{ActorId, FormBody};
use crate::store::AccountRepository;

/// Router builder for sign-up and profile endpoints.
pub fn account_router<R>(service: Arc<AccountService<R>>) -> Router
where
    R: AccountRepository + 'static,
{
    Router::new()
        .route("/api/v1/accounts", post(signup_handler::<R>))
        .route(
            "/api/v1/accounts/me",
            get(profile_handler::<R>).put(update_profile_handler::<R>),
        )
        .with_state(service)
}

async fn signup_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    FormBody(form): FormBody<SignUpForm>,
) -> Response
where
    R: AccountRepository + 'static,
{
    match service.signup(form) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn profile_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    ActorId(actor): ActorId,
) -> Response
where
    R: AccountRepository + 'static,
{
    match service.profile(actor) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn update_profile_handler<R>(
    State(service): State<Arc<AccountService<R>>>,
    ActorId(actor): ActorId,
    FormBody(form): FormBody<ProfileUpdateForm>,
) -> Response
where
    R: AccountRepository + 'static,
{
    match service.update_profile(actor, form) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}
