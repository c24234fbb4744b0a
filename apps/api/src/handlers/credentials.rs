use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use hearth_core::{AppError, SessionIdentity};

use crate::dto::{CredentialsRequest, CredentialsResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{resolve_actor, resource_from_path};

pub async fn get_credentials_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path((resource_type, resource_id)): Path<(String, String)>,
) -> ApiResult<Json<CredentialsResponse>> {
    let actor = resolve_actor(&state, &identity).await?;
    let resource = resource_from_path(&resource_type, &resource_id)?;

    let view = state
        .credential_service
        .read_credentials(&actor, &resource)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no credentials stored for '{resource}'")))?;

    Ok(Json(view.into()))
}

pub async fn update_credentials_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path((resource_type, resource_id)): Path<(String, String)>,
    Json(payload): Json<CredentialsRequest>,
) -> ApiResult<StatusCode> {
    let actor = resolve_actor(&state, &identity).await?;
    let resource = resource_from_path(&resource_type, &resource_id)?;

    state
        .credential_service
        .update_credentials(&actor, &resource, payload.into_patch())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
