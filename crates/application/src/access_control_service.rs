use std::sync::Arc;

use hearth_core::{AppError, AppResult, SessionIdentity};
use hearth_domain::{
    AccessDecision, AuditAction, CapabilitySet, GrantState, MemberId, PermissionAction,
    PermissionGrant, Principal, ResourceRef, ResourceType,
};

use crate::access_control_ports::{
    AuditEvent, AuditRepository, GrantPermissionInput, GrantSummary, MemberRepository,
    PermissionRepository, ResourceDirectory,
};

mod authorize;
mod grants;
#[cfg(test)]
mod tests;

/// Application service answering "may this member do that to this resource?"
/// and managing the grants the answer depends on.
#[derive(Clone)]
pub struct AccessControlService {
    member_repository: Arc<dyn MemberRepository>,
    permission_repository: Arc<dyn PermissionRepository>,
    resource_directory: Arc<dyn ResourceDirectory>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl AccessControlService {
    /// Creates a new access control service from repository implementations.
    #[must_use]
    pub fn new(
        member_repository: Arc<dyn MemberRepository>,
        permission_repository: Arc<dyn PermissionRepository>,
        resource_directory: Arc<dyn ResourceDirectory>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            member_repository,
            permission_repository,
            resource_directory,
            audit_repository,
        }
    }

    /// Resolves the active member behind an authenticated session identity.
    ///
    /// Missing identities, unknown emails and inactive members all yield
    /// `Ok(None)`; only persistence failures are errors.
    pub async fn resolve_principal(
        &self,
        identity: Option<&SessionIdentity>,
    ) -> AppResult<Option<Principal>> {
        let Some(identity) = identity else {
            return Ok(None);
        };

        self.member_repository
            .find_active_member_by_email(identity.email())
            .await
    }

    /// Resolves the principal or fails with [`AppError::Unauthorized`].
    pub async fn require_principal(
        &self,
        identity: Option<&SessionIdentity>,
    ) -> AppResult<Principal> {
        self.resolve_principal(identity)
            .await?
            .ok_or_else(|| AppError::Unauthorized("no active family member for session".to_owned()))
    }
}
