use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use hearth_core::SessionIdentity;
use hearth_domain::{MemberId, PermissionAction};

use crate::dto::{GrantPermissionRequest, GrantSummaryResponse, PermissionGrantResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{resolve_actor, resource_from_path};

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path((resource_type, resource_id)): Path<(String, String)>,
) -> ApiResult<Json<Vec<GrantSummaryResponse>>> {
    let actor = resolve_actor(&state, &identity).await?;
    let resource = resource_from_path(&resource_type, &resource_id)?;
    state
        .access_control_service
        .require_access(&actor, &resource, PermissionAction::View)
        .await?;

    let now = Utc::now();
    let grants = state
        .access_control_service
        .list_grants(&actor, &resource)
        .await?;

    Ok(Json(
        grants
            .into_iter()
            .map(|summary| GrantSummaryResponse::from_summary(summary, now))
            .collect(),
    ))
}

pub async fn grant_permission_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path((resource_type, resource_id)): Path<(String, String)>,
    Json(payload): Json<GrantPermissionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionGrantResponse>)> {
    let actor = resolve_actor(&state, &identity).await?;
    let resource = resource_from_path(&resource_type, &resource_id)?;
    state
        .access_control_service
        .require_access(&actor, &resource, PermissionAction::Share)
        .await?;

    let grant = state
        .access_control_service
        .grant(&actor, payload.into_input(resource)?)
        .await?;

    Ok((StatusCode::CREATED, Json(grant.into())))
}

pub async fn revoke_permission_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path((resource_type, resource_id, member_id)): Path<(String, String, String)>,
) -> ApiResult<StatusCode> {
    let actor = resolve_actor(&state, &identity).await?;
    let resource = resource_from_path(&resource_type, &resource_id)?;
    let member_id = MemberId::parse(&member_id)?;
    state
        .access_control_service
        .require_access(&actor, &resource, PermissionAction::Share)
        .await?;

    state
        .access_control_service
        .revoke(&actor, &resource, member_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
