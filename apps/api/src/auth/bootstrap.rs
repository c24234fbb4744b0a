use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use hearth_core::{AppError, SessionIdentity};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tower_sessions::Session;
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;

use super::{SESSION_CREATED_AT_KEY, SESSION_USER_KEY};

/// Development identity producer: trades the shared bootstrap token for a
/// session bound to an existing family member.
#[derive(Deserialize)]
pub struct BootstrapRequest {
    pub email: String,
    pub token: String,
}

pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<StatusCode> {
    if !token_matches(&payload.token, &state.bootstrap_token) {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let identity = SessionIdentity::new(payload.email);
    let principal = state
        .access_control_service
        .require_principal(Some(&identity))
        .await?;

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })?;

    info!(member_id = %principal.id, family_id = %principal.family_id, "session bootstrapped");

    Ok(StatusCode::NO_CONTENT)
}

fn token_matches(presented: &str, expected: &str) -> bool {
    bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}
