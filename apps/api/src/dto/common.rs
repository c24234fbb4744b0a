use hearth_domain::{MemberSummary, Principal};
use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// API representation of the resolved family member behind a session.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/me-response.ts"
)]
pub struct MeResponse {
    pub member_id: String,
    pub family_id: String,
    pub role: String,
    pub email: String,
    pub display_name: String,
}

impl From<Principal> for MeResponse {
    fn from(principal: Principal) -> Self {
        Self {
            member_id: principal.id.to_string(),
            family_id: principal.family_id.to_string(),
            role: principal.role.as_str().to_owned(),
            email: principal.email,
            display_name: principal.display_name,
        }
    }
}

/// Display fields of a family member referenced by another payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/member-summary-response.ts"
)]
pub struct MemberSummaryResponse {
    pub id: String,
    pub display_name: String,
    pub initials: Option<String>,
    pub color: Option<String>,
}

impl From<MemberSummary> for MemberSummaryResponse {
    fn from(member: MemberSummary) -> Self {
        Self {
            id: member.id.to_string(),
            display_name: member.display_name,
            initials: member.initials,
            color: member.color,
        }
    }
}
