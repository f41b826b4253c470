use super::error::*;
use crate::application_port::{AuthError, RotationService, TokenPair};
use crate::domain_model::{Principal, Role, SubjectId};
use crate::domain_port::{CredentialHasher, PrincipalDirectory};
use crate::logger::*;
use crate::server::{EventPublisher, SESSION_TOPIC, SessionEvent, SessionEventKind};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PrincipalSummary {
    pub subject: SubjectId,
    pub role: Role,
    pub email: Option<String>,
}

impl From<Principal> for PrincipalSummary {
    fn from(p: Principal) -> Self {
        PrincipalSummary {
            subject: p.subject,
            role: p.role,
            email: p.email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub principal: PrincipalSummary,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Credential verification happens here, against the external directory; the
/// rotation protocol itself never sees a password.
pub async fn login(
    body: LoginRequest,
    directory: Arc<dyn PrincipalDirectory>,
    hasher: Arc<dyn CredentialHasher>,
    rotation: Arc<dyn RotationService>,
    publisher: Arc<dyn EventPublisher>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let record = directory
        .find_by_email(&body.email)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?
        .ok_or_else(|| reject::custom(ApiErrorCode::from(AuthError::InvalidCredentials)))?;

    if !record.is_active {
        return Err(reject::custom(ApiErrorCode::InvalidCredentials));
    }

    let ok = hasher
        .verify_password(&body.password, &record.password_hash)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    if !ok {
        return Err(reject::custom(ApiErrorCode::InvalidCredentials));
    }

    let principal = Principal {
        subject: record.subject,
        role: record.role,
        email: Some(record.email),
    };
    let tokens = rotation
        .login(&principal)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    publish_session_event(&publisher, principal.subject, SessionEventKind::SessionStarted).await;

    Ok(warp::reply::json(&ApiResponse::ok(LoginResponse {
        principal: principal.into(),
        tokens,
    })))
}

/// Body for refresh and logout. The field is optional so its absence is a
/// 400 with a pointed message rather than a generic deserialize failure.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

pub async fn refresh(
    body: RefreshRequest,
    rotation: Arc<dyn RotationService>,
    publisher: Arc<dyn EventPublisher>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let presented = body
        .refresh_token
        .ok_or_else(|| reject::custom(ApiErrorCode::MissingRefreshToken))?;

    let rotated = rotation
        .refresh(&presented)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    publish_session_event(&publisher, rotated.subject, SessionEventKind::SessionRotated).await;

    Ok(warp::reply::json(&ApiResponse::ok(rotated.tokens)))
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse;

/// Idempotent by contract: once the body parses, the answer is success.
/// Whatever goes wrong underneath is logged, not surfaced, so the endpoint
/// leaks nothing about whether a session existed.
pub async fn logout(
    body: RefreshRequest,
    rotation: Arc<dyn RotationService>,
    publisher: Arc<dyn EventPublisher>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let presented = body
        .refresh_token
        .ok_or_else(|| reject::custom(ApiErrorCode::MissingRefreshToken))?;

    if let Some(subject) = rotation.logout(&presented).await {
        publish_session_event(&publisher, subject, SessionEventKind::SessionEnded).await;
    }

    Ok(warp::reply::json(&ApiResponse::ok(LogoutResponse)))
}

pub async fn me(principal: Principal) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(PrincipalSummary::from(
        principal,
    ))))
}

async fn publish_session_event(
    publisher: &Arc<dyn EventPublisher>,
    subject: SubjectId,
    kind: SessionEventKind,
) {
    let event = SessionEvent {
        event: kind,
        subject: subject.to_string(),
        at: Utc::now(),
    };
    let payload = match serde_json::to_vec(&event) {
        Ok(payload) => payload,
        Err(e) => {
            error!("failed to encode session event: {e}");
            return;
        }
    };
    if let Err(e) = publisher
        .publish(SESSION_TOPIC, event.subject.as_bytes(), &payload)
        .await
    {
        warn!(subject = %event.subject, "session event not published: {e}");
    }
}
