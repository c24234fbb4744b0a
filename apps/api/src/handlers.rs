use hearth_core::SessionIdentity;
use hearth_domain::{Principal, ResourceRef};

use crate::error::ApiResult;
use crate::state::AppState;

pub mod bills;
pub mod credentials;
pub mod health;
pub mod permissions;


/// Resolves the acting family member for an authenticated request.
async fn resolve_actor(state: &AppState, identity: &SessionIdentity) -> ApiResult<Principal> {
    Ok(state
        .access_control_service
        .require_principal(Some(identity))
        .await?)
}

/// Parses the `{resource_type}/{resource_id}` path segments.
fn resource_from_path(resource_type: &str, resource_id: &str) -> ApiResult<ResourceRef> {
    Ok(ResourceRef::parse(resource_type, resource_id)?)
}
