use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_core::{AppResult, FamilyId};
use hearth_domain::{
    AuditAction, MemberId, MemberSummary, PermissionGrant, Principal, ResourceRef,
};

/// Repository port for resolving session identities to family members.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Finds the active member registered under `email`.
    ///
    /// Inactive members must be reported as `None`.
    async fn find_active_member_by_email(&self, email: &str) -> AppResult<Option<Principal>>;

    /// Finds an active member by id, restricted to one family.
    async fn find_active_member(
        &self,
        family_id: FamilyId,
        member_id: MemberId,
    ) -> AppResult<Option<Principal>>;
}

/// Port answering whether a resource address names a record of a family.
#[async_trait]
pub trait ResourceDirectory: Send + Sync {
    /// Returns whether `resource` belongs to `family_id`.
    ///
    /// Kinds whose records are not stored by this service report `true`;
    /// their family is pinned by the first grant or bundle written for them.
    async fn resource_in_family(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
    ) -> AppResult<bool>;
}

/// Repository port for explicit permission grants.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Finds the grant for one `(resource, member)` pair inside a family.
    async fn find_grant(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
        member_id: MemberId,
    ) -> AppResult<Option<PermissionGrant>>;

    /// Inserts or replaces the grant keyed on
    /// `(resource_type, resource_id, granted_to)`.
    async fn upsert_grant(&self, grant: PermissionGrant) -> AppResult<()>;

    /// Deletes the grant for one `(resource, member)` pair. Returns whether a
    /// row was removed.
    async fn delete_grant(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
        member_id: MemberId,
    ) -> AppResult<bool>;

    /// Lists every grant on a resource with member display attributes.
    async fn list_grants(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
    ) -> AppResult<Vec<GrantSummary>>;
}

/// Grant joined with display attributes of both members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantSummary {
    /// The grant record.
    pub grant: PermissionGrant,
    /// Grantee display attributes.
    pub granted_to: MemberSummary,
    /// Grantor display attributes.
    pub granted_by: MemberSummary,
    /// When the grant row was first created.
    pub created_at: DateTime<Utc>,
}

/// Input payload for explicit grants.
///
/// Omitted flags default to view-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantPermissionInput {
    /// Resource to grant access to.
    pub resource: ResourceRef,
    /// Grantee.
    pub granted_to: MemberId,
    /// View flag.
    pub can_view: Option<bool>,
    /// Edit flag.
    pub can_edit: Option<bool>,
    /// Delete flag.
    pub can_delete: Option<bool>,
    /// Share flag.
    pub can_share: Option<bool>,
    /// Optional exclusive expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Optional notes.
    pub notes: Option<String>,
}

/// Audit event payload for append-only storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Family scope for the event.
    pub family_id: FamilyId,
    /// Member that performed the action.
    pub actor: MemberId,
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Resource the action targeted.
    pub resource: ResourceRef,
    /// Optional audit detail payload.
    pub detail: Option<String>,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
