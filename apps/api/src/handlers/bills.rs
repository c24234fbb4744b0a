use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use hearth_core::SessionIdentity;
use hearth_domain::BillId;
use uuid::Uuid;

use crate::dto::{
    BillDetailResponse, BillListItemResponse, BillListQueryRequest, BillResponse,
    CreateBillRequest, UpdateBillRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

use super::resolve_actor;

pub async fn list_bills_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Query(query): Query<BillListQueryRequest>,
) -> ApiResult<Json<Vec<BillListItemResponse>>> {
    let actor = resolve_actor(&state, &identity).await?;
    let items = state
        .bill_service
        .list_bills(&actor, &query.into())
        .await?;

    Ok(Json(items.into_iter().map(Into::into).collect()))
}

pub async fn create_bill_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Json(payload): Json<CreateBillRequest>,
) -> ApiResult<(StatusCode, Json<BillResponse>)> {
    let actor = resolve_actor(&state, &identity).await?;
    let bill = state
        .bill_service
        .create_bill(&actor, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(bill.into())))
}

pub async fn get_bill_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(bill_id): Path<Uuid>,
) -> ApiResult<Json<BillDetailResponse>> {
    let actor = resolve_actor(&state, &identity).await?;
    let detail = state
        .bill_service
        .get_bill(&actor, BillId::from_uuid(bill_id))
        .await?;

    Ok(Json(detail.into()))
}

pub async fn update_bill_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(bill_id): Path<Uuid>,
    Json(payload): Json<UpdateBillRequest>,
) -> ApiResult<Json<BillResponse>> {
    let actor = resolve_actor(&state, &identity).await?;
    let (patch, credentials) = payload.into_patches()?;
    let bill = state
        .bill_service
        .update_bill(&actor, BillId::from_uuid(bill_id), patch, credentials)
        .await?;

    Ok(Json(bill.into()))
}

pub async fn delete_bill_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(bill_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let actor = resolve_actor(&state, &identity).await?;
    state
        .bill_service
        .deactivate_bill(&actor, BillId::from_uuid(bill_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
