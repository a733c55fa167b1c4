use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_backend_error, ApiError, ApiResponse, AppState};

const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Deserialize)]
pub(super) struct SignUpBody {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SignInBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub(super) struct UserInfo {
    id: String,
    email: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SessionInfo {
    access_token: String,
    token_type: String,
    expires_in: u64,
    refresh_token: String,
    user: UserInfo,
}

impl From<&souq_backend::AuthUser> for UserInfo {
    fn from(user: &souq_backend::AuthUser) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name().map(ToOwned::to_owned),
        }
    }
}

fn validate_credentials(req_id: &str, email: &str, password: &str) -> Result<(), ApiError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "a valid email address is required",
        ));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("password must be at least {MIN_PASSWORD_CHARS} characters"),
        ));
    }
    Ok(())
}

pub(super) async fn sign_up(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SignUpBody>,
) -> Result<(StatusCode, Json<ApiResponse<UserInfo>>), ApiError> {
    validate_credentials(&req_id.0, &body.email, &body.password)?;

    let display_name = body
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let user = state
        .sessions
        .sign_up(body.email.trim(), &body.password, display_name)
        .await
        .map_err(|e| map_backend_error(req_id.0.clone(), &e))?;

    tracing::info!(user_id = %user.id, "seller signed up");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(UserInfo::from(&user), req_id.0)),
    ))
}

pub(super) async fn sign_in(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SignInBody>,
) -> Result<Json<ApiResponse<SessionInfo>>, ApiError> {
    validate_credentials(&req_id.0, &body.email, &body.password)?;

    let session = state
        .sessions
        .sign_in_with_password(body.email.trim(), &body.password)
        .await
        .map_err(|e| map_backend_error(req_id.0.clone(), &e))?;

    let data = SessionInfo {
        user: UserInfo::from(&session.user),
        access_token: session.access_token,
        token_type: session.token_type,
        expires_in: session.expires_in,
        refresh_token: session.refresh_token,
    };

    Ok(Json(ApiResponse::new(data, req_id.0)))
}
