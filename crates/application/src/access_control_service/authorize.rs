use chrono::Utc;
use hearth_domain::decide_access;
use tracing::debug;

use super::*;

impl AccessControlService {
    /// Returns whether `principal` may perform `action` on the resource.
    ///
    /// A failed grant lookup is returned as an error and never falls back to
    /// the role-based path.
    pub async fn authorize(
        &self,
        principal: &Principal,
        resource_type: ResourceType,
        resource_id: &str,
        action: PermissionAction,
    ) -> AppResult<bool> {
        let resource = ResourceRef::new(resource_type, resource_id)?;
        Ok(self.evaluate(principal, &resource, action).await?.is_allowed())
    }

    /// Ensures `principal` may perform `action` on the resource.
    ///
    /// Denials carry a generic message that does not reveal grant structure.
    pub async fn require_access(
        &self,
        principal: &Principal,
        resource: &ResourceRef,
        action: PermissionAction,
    ) -> AppResult<()> {
        let decision = self.evaluate(principal, resource, action).await?;
        if decision.is_allowed() {
            return Ok(());
        }

        debug!(
            member_id = %principal.id,
            %resource,
            action = action.as_str(),
            ?decision,
            "access denied"
        );
        Err(AppError::Forbidden("access denied".to_owned()))
    }

    /// Ensures the resource is a record of the actor's family.
    pub async fn require_resource(
        &self,
        actor: &Principal,
        resource: &ResourceRef,
    ) -> AppResult<()> {
        if self
            .resource_directory
            .resource_in_family(actor.family_id, resource)
            .await?
        {
            return Ok(());
        }

        debug!(member_id = %actor.id, %resource, "resource outside actor family");
        Err(AppError::NotFound(format!("resource '{resource}' not found")))
    }

    /// Evaluates access and reports which rule decided.
    pub async fn evaluate(
        &self,
        principal: &Principal,
        resource: &ResourceRef,
        action: PermissionAction,
    ) -> AppResult<AccessDecision> {
        let grant = self
            .permission_repository
            .find_grant(principal.family_id, resource, principal.id)
            .await?;

        Ok(decide_access(
            principal.role,
            grant.as_ref(),
            action,
            Utc::now(),
        ))
    }

    /// Reports whether the grant for a member is absent, active or expired.
    pub async fn grant_state(
        &self,
        actor: &Principal,
        resource: &ResourceRef,
        member_id: MemberId,
    ) -> AppResult<GrantState> {
        let grant = self
            .permission_repository
            .find_grant(actor.family_id, resource, member_id)
            .await?;

        Ok(GrantState::of(grant.as_ref(), Utc::now()))
    }
}
