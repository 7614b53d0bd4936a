use axum::async_trait;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::ServiceError;

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";
const NON_FIELD: &str = "non_field_errors";

/// JSON request body whose rejections render like every other API error.
///
/// A value of the wrong type becomes a 422 field error keyed by the offending
/// field; unreadable bodies keep axum's status with an `{"error": ...}` body.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for FormBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

/// Numeric record id taken from the single path parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPath(pub u64);

#[async_trait]
impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<u64>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(rejection) => Err(path_rejection(&rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ServiceError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let text = err.body_text();
            let detail = text.strip_prefix(DATA_ERROR_PREFIX).unwrap_or(&text);
            let (field, message) = split_field(detail);
            ServiceError::MalformedField {
                field: field.to_string(),
                message: message.to_string(),
            }
        }
        other => ServiceError::Unreadable {
            status: other.status(),
            message: other.body_text(),
        },
    }
}

fn path_rejection(rejection: &PathRejection) -> ServiceError {
    ServiceError::Unreadable {
        status: rejection.status(),
        message: rejection.body_text(),
    }
}

/// Splits `field: message` as reported by the JSON deserializer.
fn split_field(detail: &str) -> (&str, &str) {
    match detail.split_once(": ") {
        Some((field, message))
            if !field.is_empty() && !field.contains(char::is_whitespace) =>
        {
            (field, message)
        }
        _ => (NON_FIELD, detail),
    }
}
