use chrono::{DateTime, Utc};
use hearth_application::{GrantPermissionInput, GrantSummary};
use hearth_core::{AppError, AppResult};
use hearth_domain::{MemberId, PermissionGrant, ResourceRef};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::MemberSummaryResponse;

/// Incoming payload for granting access to a resource.
///
/// Omitted flags default to view-only; a re-grant replaces every flag.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/grant-permission-request.ts"
)]
pub struct GrantPermissionRequest {
    pub member_id: String,
    #[serde(default)]
    pub can_view: Option<bool>,
    #[serde(default)]
    pub can_edit: Option<bool>,
    #[serde(default)]
    pub can_delete: Option<bool>,
    #[serde(default)]
    pub can_share: Option<bool>,
    /// RFC 3339 timestamp after which the grant denies everything.
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl GrantPermissionRequest {
    /// Validates the payload against the addressed resource.
    pub fn into_input(self, resource: ResourceRef) -> AppResult<GrantPermissionInput> {
        let expires_at = self
            .expires_at
            .filter(|value| !value.trim().is_empty())
            .map(|value| {
                DateTime::parse_from_rfc3339(value.as_str())
                    .map(|timestamp| timestamp.with_timezone(&Utc))
                    .map_err(|error| {
                        AppError::Validation(format!("invalid expires_at '{value}': {error}"))
                    })
            })
            .transpose()?;

        Ok(GrantPermissionInput {
            resource,
            granted_to: MemberId::parse(self.member_id.as_str())?,
            can_view: self.can_view,
            can_edit: self.can_edit,
            can_delete: self.can_delete,
            can_share: self.can_share,
            expires_at,
            notes: self.notes,
        })
    }
}

/// API representation of a stored grant.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-grant-response.ts"
)]
pub struct PermissionGrantResponse {
    pub resource_type: String,
    pub resource_id: String,
    pub granted_to: String,
    pub granted_by: String,
    pub can_view: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_share: bool,
    pub expires_at: Option<String>,
    pub notes: Option<String>,
}

impl From<PermissionGrant> for PermissionGrantResponse {
    fn from(grant: PermissionGrant) -> Self {
        Self {
            resource_type: grant.resource.resource_type().as_str().to_owned(),
            resource_id: grant.resource.resource_id().to_owned(),
            granted_to: grant.granted_to.to_string(),
            granted_by: grant.granted_by.to_string(),
            can_view: grant.capabilities.can_view,
            can_edit: grant.capabilities.can_edit,
            can_delete: grant.capabilities.can_delete,
            can_share: grant.capabilities.can_share,
            expires_at: grant.expires_at.map(|timestamp| timestamp.to_rfc3339()),
            notes: grant.notes,
        }
    }
}

/// One entry of a resource's sharing list.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/grant-summary-response.ts"
)]
pub struct GrantSummaryResponse {
    pub granted_to: MemberSummaryResponse,
    pub granted_by: MemberSummaryResponse,
    pub can_view: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_share: bool,
    pub expires_at: Option<String>,
    pub is_expired: bool,
    pub notes: Option<String>,
    pub created_at: String,
}

impl GrantSummaryResponse {
    /// Builds the response, judging expiry against `now`.
    #[must_use]
    pub fn from_summary(summary: GrantSummary, now: DateTime<Utc>) -> Self {
        let is_expired = summary.grant.is_expired_at(now);
        let capabilities = summary.grant.capabilities;

        Self {
            granted_to: summary.granted_to.into(),
            granted_by: summary.granted_by.into(),
            can_view: capabilities.can_view,
            can_edit: capabilities.can_edit,
            can_delete: capabilities.can_delete,
            can_share: capabilities.can_share,
            expires_at: summary.grant.expires_at.map(|timestamp| timestamp.to_rfc3339()),
            is_expired,
            notes: summary.grant.notes,
            created_at: summary.created_at.to_rfc3339(),
        }
    }
}
