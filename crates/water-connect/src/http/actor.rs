use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::accounts::AccountId;

/// Header carrying the caller's account id.
pub const ACCOUNT_HEADER: &str = "x-account-id";

/// Account id claimed by the caller, `None` for anonymous requests.
///
/// Only the header's shape is checked here; services resolve the id against
/// the store and reject unknown accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActorId(pub Option<AccountId>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(ACCOUNT_HEADER) else {
            return Ok(Self(None));
        };
        value
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map(|id| Self(Some(AccountId(id))))
            .ok_or_else(|| {
                let payload = json!({ "error": format!("{ACCOUNT_HEADER} must be a numeric account id") });
                (StatusCode::BAD_REQUEST, Json(payload)).into_response()
            })
    }
}
