use crate::api::v1::handler::ApiResponse;
use crate::application_port::AuthError;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

/// External failure vocabulary. Everything token-shaped collapses into
/// `InvalidToken` with one generic message; the reasons only exist in logs,
/// so callers can never use the response as an oracle.
#[derive(Debug, Clone, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("refresh_token required")]
    MissingRefreshToken,
    #[error("invalid request body")]
    BadRequest,
    #[error("invalid or expired credentials")]
    InvalidCredentials,
    #[error("invalid or expired credentials")]
    InvalidToken,
    #[error("service temporarily unavailable")]
    StoreUnavailable,
    #[error("internal error")]
    InternalError,
    #[error("not found")]
    NotFound,
}

impl ApiErrorCode {
    fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::MissingRefreshToken | ApiErrorCode::BadRequest => {
                StatusCode::BAD_REQUEST
            }
            ApiErrorCode::InvalidCredentials | ApiErrorCode::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiErrorCode::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
        }
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::MalformedToken
            | AuthError::ExpiredToken
            | AuthError::TypeMismatch
            | AuthError::ReuseDetected
            | AuthError::UnknownPrincipal => ApiErrorCode::InvalidToken,
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::Store(e) => {
                // Fail closed: a store outage must never read as authorized.
                warn!("store unavailable: {}", e);
                ApiErrorCode::StoreUnavailable
            }
            AuthError::Internal(e) => ApiErrorCode::internal(e),
        }
    }
}

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        code.clone()
    } else if err.is_not_found() {
        ApiErrorCode::NotFound
    } else if err
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
    {
        ApiErrorCode::BadRequest
    } else {
        warn!("Unhandled rejection: {:?}", err);
        ApiErrorCode::InternalError
    };

    let status = code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(code.clone(), code.to_string()));
    Ok(warp::reply::with_status(json, status))
}
