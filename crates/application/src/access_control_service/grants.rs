use tracing::info;

use super::*;

impl AccessControlService {
    /// Creates or replaces the grant of `input.granted_to` on a resource.
    ///
    /// The stored flag set is replaced as a whole; omitted flags fall back to
    /// view-only defaults rather than to the previous grant's values. The
    /// grantee and the resource must both belong to the actor's family.
    pub async fn grant(
        &self,
        actor: &Principal,
        input: GrantPermissionInput,
    ) -> AppResult<PermissionGrant> {
        self.member_repository
            .find_active_member(actor.family_id, input.granted_to)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("member '{}' not found", input.granted_to))
            })?;
        self.require_resource(actor, &input.resource).await?;

        let capabilities = CapabilitySet::with_defaults(
            input.can_view,
            input.can_edit,
            input.can_delete,
            input.can_share,
        );
        let grant = PermissionGrant {
            family_id: actor.family_id,
            resource: input.resource,
            granted_to: input.granted_to,
            granted_by: actor.id,
            capabilities,
            expires_at: input.expires_at,
            notes: input.notes.filter(|notes| !notes.trim().is_empty()),
        };

        self.store_grant(actor, grant).await
    }

    /// Grants every capability on a freshly created resource to its creator.
    pub async fn grant_creator_access(
        &self,
        actor: &Principal,
        resource: ResourceRef,
    ) -> AppResult<PermissionGrant> {
        let grant = PermissionGrant {
            family_id: actor.family_id,
            resource,
            granted_to: actor.id,
            granted_by: actor.id,
            capabilities: CapabilitySet::full(),
            expires_at: None,
            notes: None,
        };

        self.store_grant(actor, grant).await
    }

    /// Removes the grant of `member_id` on a resource. Revoking a grant that
    /// does not exist succeeds.
    pub async fn revoke(
        &self,
        actor: &Principal,
        resource: &ResourceRef,
        member_id: MemberId,
    ) -> AppResult<()> {
        let removed = self
            .permission_repository
            .delete_grant(actor.family_id, resource, member_id)
            .await?;

        info!(
            actor_id = %actor.id,
            %resource,
            %member_id,
            removed,
            "permission revoked"
        );

        self.audit_repository
            .append_event(AuditEvent {
                family_id: actor.family_id,
                actor: actor.id,
                action: AuditAction::PermissionRevoked,
                resource: resource.clone(),
                detail: Some(if removed {
                    format!("revoked access of member '{member_id}'")
                } else {
                    format!("member '{member_id}' had no grant to revoke")
                }),
            })
            .await
    }

    /// Lists every grant on a resource within the actor's family.
    pub async fn list_grants(
        &self,
        actor: &Principal,
        resource: &ResourceRef,
    ) -> AppResult<Vec<GrantSummary>> {
        self.permission_repository
            .list_grants(actor.family_id, resource)
            .await
    }

    async fn store_grant(
        &self,
        actor: &Principal,
        grant: PermissionGrant,
    ) -> AppResult<PermissionGrant> {
        self.permission_repository.upsert_grant(grant.clone()).await?;

        info!(
            actor_id = %actor.id,
            resource = %grant.resource,
            granted_to = %grant.granted_to,
            "permission granted"
        );

        self.audit_repository
            .append_event(AuditEvent {
                family_id: actor.family_id,
                actor: actor.id,
                action: AuditAction::PermissionGranted,
                resource: grant.resource.clone(),
                detail: Some(describe_grant(&grant)),
            })
            .await?;

        Ok(grant)
    }
}

fn describe_grant(grant: &PermissionGrant) -> String {
    let flags = PermissionAction::all()
        .iter()
        .filter(|action| grant.capabilities.allows(**action))
        .map(|action| action.as_str())
        .collect::<Vec<_>>();
    let flags = if flags.is_empty() {
        "none".to_owned()
    } else {
        flags.join(",")
    };

    match grant.expires_at {
        Some(expires_at) => format!(
            "granted '{flags}' to member '{}' until '{}'",
            grant.granted_to,
            expires_at.to_rfc3339()
        ),
        None => format!("granted '{flags}' to member '{}'", grant.granted_to),
    }
}
