use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use hearth_core::{AppError, SessionIdentity};
use tower_sessions::Session;
use tracing::info;

use crate::dto::MeResponse;
use crate::error::ApiResult;
use crate::state::AppState;

use super::SESSION_USER_KEY;

async fn session_identity(session: &Session) -> ApiResult<Option<SessionIdentity>> {
    Ok(session
        .get::<SessionIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?)
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    let had_identity = session_identity(&session).await?.is_some();

    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    info!(had_identity, "session closed");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<MeResponse>> {
    let identity = session_identity(&session).await?;
    let principal = state
        .access_control_service
        .require_principal(identity.as_ref())
        .await?;

    Ok(Json(MeResponse::from(principal)))
}
