use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use hearth_core::{AppError, AppResult, FamilyId, SessionIdentity};
use hearth_domain::{
    AccessDecision, AuditAction, CapabilitySet, GrantState, MemberId, MemberRole, MemberSummary,
    PermissionAction, PermissionGrant, Principal, ResourceRef, ResourceType,
};
use tokio::sync::Mutex;

use crate::access_control_ports::{
    AuditEvent, AuditRepository, GrantPermissionInput, GrantSummary, MemberRepository,
    PermissionRepository, ResourceDirectory,
};

use super::AccessControlService;

#[derive(Default)]
struct FakeAuditRepository {
    events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

#[derive(Default)]
struct FakeMemberRepository {
    members: HashMap<String, Principal>,
}

#[async_trait]
impl MemberRepository for FakeMemberRepository {
    async fn find_active_member_by_email(&self, email: &str) -> AppResult<Option<Principal>> {
        Ok(self.members.get(email).cloned())
    }

    async fn find_active_member(
        &self,
        family_id: FamilyId,
        member_id: MemberId,
    ) -> AppResult<Option<Principal>> {
        Ok(self
            .members
            .values()
            .find(|member| member.id == member_id && member.family_id == family_id)
            .cloned())
    }
}

#[derive(Default)]
struct FakeResourceDirectory {
    foreign: Mutex<HashSet<ResourceRef>>,
}

#[async_trait]
impl ResourceDirectory for FakeResourceDirectory {
    async fn resource_in_family(
        &self,
        _family_id: FamilyId,
        resource: &ResourceRef,
    ) -> AppResult<bool> {
        Ok(!self.foreign.lock().await.contains(resource))
    }
}

type GrantKey = (FamilyId, ResourceRef, MemberId);

#[derive(Default)]
struct FakePermissionRepository {
    grants: Mutex<HashMap<GrantKey, PermissionGrant>>,
    fail_lookups: bool,
}

#[async_trait]
impl PermissionRepository for FakePermissionRepository {
    async fn find_grant(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
        member_id: MemberId,
    ) -> AppResult<Option<PermissionGrant>> {
        if self.fail_lookups {
            return Err(AppError::Internal("permission store unavailable".to_owned()));
        }

        Ok(self
            .grants
            .lock()
            .await
            .get(&(family_id, resource.clone(), member_id))
            .cloned())
    }

    async fn upsert_grant(&self, grant: PermissionGrant) -> AppResult<()> {
        self.grants.lock().await.insert(
            (grant.family_id, grant.resource.clone(), grant.granted_to),
            grant,
        );
        Ok(())
    }

    async fn delete_grant(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
        member_id: MemberId,
    ) -> AppResult<bool> {
        Ok(self
            .grants
            .lock()
            .await
            .remove(&(family_id, resource.clone(), member_id))
            .is_some())
    }

    async fn list_grants(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
    ) -> AppResult<Vec<GrantSummary>> {
        let grants = self.grants.lock().await;
        let mut summaries = grants
            .values()
            .filter(|grant| grant.family_id == family_id && &grant.resource == resource)
            .map(|grant| GrantSummary {
                grant: grant.clone(),
                granted_to: summary(grant.granted_to),
                granted_by: summary(grant.granted_by),
                created_at: Utc::now(),
            })
            .collect::<Vec<_>>();
        summaries.sort_by_key(|summary| summary.grant.granted_to);
        Ok(summaries)
    }
}

fn summary(id: MemberId) -> MemberSummary {
    MemberSummary {
        id,
        display_name: id.to_string(),
        initials: None,
        color: None,
    }
}

fn principal(family_id: FamilyId, role: MemberRole, email: &str) -> Principal {
    Principal {
        id: MemberId::new(),
        family_id,
        role,
        email: email.to_owned(),
        display_name: email.to_owned(),
    }
}

fn bill_resource() -> ResourceRef {
    ResourceRef::from_uuid(ResourceType::Bill, uuid::Uuid::new_v4())
}

struct Fixture {
    service: AccessControlService,
    permissions: Arc<FakePermissionRepository>,
    directory: Arc<FakeResourceDirectory>,
    audit: Arc<FakeAuditRepository>,
}

fn fixture(members: Vec<Principal>, permissions: FakePermissionRepository) -> Fixture {
    let members = FakeMemberRepository {
        members: members
            .into_iter()
            .map(|member| (member.email.clone(), member))
            .collect(),
    };
    let permissions = Arc::new(permissions);
    let directory = Arc::new(FakeResourceDirectory::default());
    let audit = Arc::new(FakeAuditRepository::default());
    let service = AccessControlService::new(
        Arc::new(members),
        permissions.clone(),
        directory.clone(),
        audit.clone(),
    );

    Fixture {
        service,
        permissions,
        directory,
        audit,
    }
}

fn grant_input(resource: &ResourceRef, granted_to: MemberId) -> GrantPermissionInput {
    GrantPermissionInput {
        resource: resource.clone(),
        granted_to,
        can_view: None,
        can_edit: None,
        can_delete: None,
        can_share: None,
        expires_at: None,
        notes: None,
    }
}

#[tokio::test]
async fn resolve_principal_returns_none_without_identity() {
    let fixture = fixture(Vec::new(), FakePermissionRepository::default());

    let resolved = fixture.service.resolve_principal(None).await;
    assert!(matches!(resolved, Ok(None)));
}

#[tokio::test]
async fn resolve_principal_returns_none_for_unknown_email() {
    let family_id = FamilyId::new();
    let fixture = fixture(
        vec![principal(family_id, MemberRole::Owner, "owner@example.com")],
        FakePermissionRepository::default(),
    );
    let identity = SessionIdentity::new("stranger@example.com");

    let resolved = fixture.service.resolve_principal(Some(&identity)).await;
    assert!(matches!(resolved, Ok(None)));
}

#[tokio::test]
async fn resolve_principal_matches_normalized_email() {
    let family_id = FamilyId::new();
    let owner = principal(family_id, MemberRole::Owner, "owner@example.com");
    let fixture = fixture(vec![owner.clone()], FakePermissionRepository::default());
    let identity = SessionIdentity::new("  Owner@Example.com ");

    let resolved = fixture.service.resolve_principal(Some(&identity)).await;
    assert_eq!(resolved.ok().flatten(), Some(owner));
}

#[tokio::test]
async fn require_principal_rejects_missing_member() {
    let fixture = fixture(Vec::new(), FakePermissionRepository::default());
    let identity = SessionIdentity::new("ghost@example.com");

    let result = fixture.service.require_principal(Some(&identity)).await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn roles_decide_access_when_no_grant_exists() {
    let family_id = FamilyId::new();
    let fixture = fixture(Vec::new(), FakePermissionRepository::default());
    let resource = bill_resource();

    for (role, expected) in [
        (MemberRole::Owner, true),
        (MemberRole::Admin, true),
        (MemberRole::Member, false),
        (MemberRole::Child, false),
    ] {
        let member = principal(family_id, role, "member@example.com");
        for action in PermissionAction::all() {
            let allowed = fixture
                .service
                .authorize(
                    &member,
                    resource.resource_type(),
                    resource.resource_id(),
                    *action,
                )
                .await;
            assert_eq!(allowed.ok(), Some(expected), "{role:?} {action:?}");
        }
    }
}

#[tokio::test]
async fn explicit_grant_overrides_owner_role() {
    let family_id = FamilyId::new();
    let owner = principal(family_id, MemberRole::Owner, "owner@example.com");
    let grantor = principal(family_id, MemberRole::Admin, "admin@example.com");
    let fixture = fixture(vec![owner.clone()], FakePermissionRepository::default());
    let resource = bill_resource();

    let granted = fixture
        .service
        .grant(&grantor, grant_input(&resource, owner.id))
        .await;
    assert!(granted.is_ok());

    let view = fixture
        .service
        .evaluate(&owner, &resource, PermissionAction::View)
        .await;
    let edit = fixture
        .service
        .evaluate(&owner, &resource, PermissionAction::Edit)
        .await;
    assert_eq!(view.ok(), Some(AccessDecision::AllowedByGrant));
    assert_eq!(edit.ok(), Some(AccessDecision::DeniedByGrant));
}

#[tokio::test]
async fn expired_grant_denies_every_action_even_for_owner() {
    let family_id = FamilyId::new();
    let owner = principal(family_id, MemberRole::Owner, "owner@example.com");
    let fixture = fixture(vec![owner.clone()], FakePermissionRepository::default());
    let resource = bill_resource();

    let mut input = grant_input(&resource, owner.id);
    input.can_edit = Some(true);
    input.can_delete = Some(true);
    input.can_share = Some(true);
    input.expires_at = Some(Utc::now() - Duration::minutes(5));
    assert!(fixture.service.grant(&owner, input).await.is_ok());

    for action in PermissionAction::all() {
        let decision = fixture.service.evaluate(&owner, &resource, *action).await;
        assert_eq!(decision.ok(), Some(AccessDecision::DeniedExpired));
    }
    let state = fixture
        .service
        .grant_state(&owner, &resource, owner.id)
        .await;
    assert_eq!(state.ok(), Some(GrantState::Expired));
}

#[tokio::test]
async fn future_expiry_keeps_grant_active() {
    let family_id = FamilyId::new();
    let owner = principal(family_id, MemberRole::Owner, "owner@example.com");
    let child = principal(family_id, MemberRole::Child, "child@example.com");
    let fixture = fixture(vec![child.clone()], FakePermissionRepository::default());
    let resource = bill_resource();

    let mut input = grant_input(&resource, child.id);
    input.expires_at = Some(Utc::now() + Duration::days(1));
    assert!(fixture.service.grant(&owner, input).await.is_ok());

    let allowed = fixture
        .service
        .authorize(
            &child,
            resource.resource_type(),
            resource.resource_id(),
            PermissionAction::View,
        )
        .await;
    assert_eq!(allowed.ok(), Some(true));
    let state = fixture
        .service
        .grant_state(&owner, &resource, child.id)
        .await;
    assert_eq!(state.ok(), Some(GrantState::Active));
}

#[tokio::test]
async fn grant_defaults_to_view_only_and_is_audited() {
    let family_id = FamilyId::new();
    let owner = principal(family_id, MemberRole::Owner, "owner@example.com");
    let member = principal(family_id, MemberRole::Member, "member@example.com");
    let fixture = fixture(vec![member.clone()], FakePermissionRepository::default());
    let resource = bill_resource();

    let granted = fixture
        .service
        .grant(&owner, grant_input(&resource, member.id))
        .await;
    let Ok(granted) = granted else {
        panic!("grant should succeed");
    };
    assert_eq!(granted.capabilities, CapabilitySet::view_only());
    assert_eq!(granted.granted_by, owner.id);

    let events = fixture.audit.events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::PermissionGranted);
    assert_eq!(events[0].actor, owner.id);
    assert_eq!(events[0].resource, resource);
}

#[tokio::test]
async fn regrant_replaces_previous_flags() {
    let family_id = FamilyId::new();
    let owner = principal(family_id, MemberRole::Owner, "owner@example.com");
    let member = principal(family_id, MemberRole::Member, "member@example.com");
    let fixture = fixture(vec![member.clone()], FakePermissionRepository::default());
    let resource = bill_resource();

    let mut first = grant_input(&resource, member.id);
    first.can_edit = Some(true);
    first.can_delete = Some(true);
    assert!(fixture.service.grant(&owner, first).await.is_ok());
    assert!(
        fixture
            .service
            .require_access(&member, &resource, PermissionAction::Delete)
            .await
            .is_ok()
    );

    assert!(
        fixture
            .service
            .grant(&owner, grant_input(&resource, member.id))
            .await
            .is_ok()
    );

    let delete = fixture
        .service
        .require_access(&member, &resource, PermissionAction::Delete)
        .await;
    assert!(matches!(delete, Err(AppError::Forbidden(message)) if message == "access denied"));
    assert_eq!(fixture.permissions.grants.lock().await.len(), 1);
}

#[tokio::test]
async fn revoke_restores_role_fallback_and_is_idempotent() {
    let family_id = FamilyId::new();
    let owner = principal(family_id, MemberRole::Owner, "owner@example.com");
    let fixture = fixture(vec![owner.clone()], FakePermissionRepository::default());
    let resource = bill_resource();

    let mut input = grant_input(&resource, owner.id);
    input.can_view = Some(false);
    assert!(fixture.service.grant(&owner, input).await.is_ok());
    assert_eq!(
        fixture
            .service
            .authorize(
                &owner,
                resource.resource_type(),
                resource.resource_id(),
                PermissionAction::View
            )
            .await
            .ok(),
        Some(false)
    );

    assert!(fixture.service.revoke(&owner, &resource, owner.id).await.is_ok());
    assert!(fixture.service.revoke(&owner, &resource, owner.id).await.is_ok());

    let decision = fixture
        .service
        .evaluate(&owner, &resource, PermissionAction::View)
        .await;
    assert_eq!(decision.ok(), Some(AccessDecision::AllowedByRole));

    let events = fixture.audit.events.lock().await;
    let revocations = events
        .iter()
        .filter(|event| event.action == AuditAction::PermissionRevoked)
        .count();
    assert_eq!(revocations, 2);
}

#[tokio::test]
async fn grants_do_not_leak_across_families() {
    let owner = principal(FamilyId::new(), MemberRole::Owner, "owner@example.com");
    let outsider = principal(FamilyId::new(), MemberRole::Admin, "admin@example.net");
    let fixture = fixture(vec![owner.clone()], FakePermissionRepository::default());
    let resource = bill_resource();

    let mut input = grant_input(&resource, owner.id);
    input.can_view = Some(false);
    assert!(fixture.service.grant(&owner, input).await.is_ok());

    let listed = fixture.service.list_grants(&outsider, &resource).await;
    assert_eq!(listed.map(|grants| grants.len()).ok(), Some(0));
    let listed = fixture.service.list_grants(&owner, &resource).await;
    assert_eq!(listed.map(|grants| grants.len()).ok(), Some(1));
}

#[tokio::test]
async fn grant_creator_access_grants_every_capability() {
    let family_id = FamilyId::new();
    let member = principal(family_id, MemberRole::Member, "member@example.com");
    let fixture = fixture(Vec::new(), FakePermissionRepository::default());
    let resource = bill_resource();

    let granted = fixture
        .service
        .grant_creator_access(&member, resource.clone())
        .await;
    assert_eq!(
        granted.map(|grant| grant.capabilities).ok(),
        Some(CapabilitySet::full())
    );

    for action in PermissionAction::all() {
        assert!(
            fixture
                .service
                .require_access(&member, &resource, *action)
                .await
                .is_ok()
        );
    }
}

#[tokio::test]
async fn lookup_failure_propagates_instead_of_falling_back_to_role() {
    let owner = principal(FamilyId::new(), MemberRole::Owner, "owner@example.com");
    let fixture = fixture(
        Vec::new(),
        FakePermissionRepository {
            fail_lookups: true,
            ..FakePermissionRepository::default()
        },
    );
    let resource = bill_resource();

    let allowed = fixture
        .service
        .authorize(
            &owner,
            resource.resource_type(),
            resource.resource_id(),
            PermissionAction::View,
        )
        .await;
    assert!(matches!(allowed, Err(AppError::Internal(_))));

    let required = fixture
        .service
        .require_access(&owner, &resource, PermissionAction::View)
        .await;
    assert!(matches!(required, Err(AppError::Internal(_))));
}

#[tokio::test]
async fn authorize_rejects_blank_resource_id() {
    let owner = principal(FamilyId::new(), MemberRole::Owner, "owner@example.com");
    let fixture = fixture(Vec::new(), FakePermissionRepository::default());

    let result = fixture
        .service
        .authorize(&owner, ResourceType::Bill, "   ", PermissionAction::View)
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn grant_rejects_members_outside_the_family() {
    let owner = principal(FamilyId::new(), MemberRole::Owner, "owner@example.com");
    let stranger = principal(FamilyId::new(), MemberRole::Member, "stranger@example.net");
    let fixture = fixture(
        vec![owner.clone(), stranger.clone()],
        FakePermissionRepository::default(),
    );
    let resource = bill_resource();

    let foreign = fixture
        .service
        .grant(&owner, grant_input(&resource, stranger.id))
        .await;
    assert!(matches!(foreign, Err(AppError::NotFound(_))));
    let unknown = fixture
        .service
        .grant(&owner, grant_input(&resource, MemberId::new()))
        .await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));

    assert!(fixture.permissions.grants.lock().await.is_empty());
    assert!(fixture.audit.events.lock().await.is_empty());
    let listed = fixture.service.list_grants(&owner, &resource).await;
    assert_eq!(listed.map(|grants| grants.len()).ok(), Some(0));
}

#[tokio::test]
async fn grant_rejects_resources_outside_the_family() {
    let family_id = FamilyId::new();
    let admin = principal(family_id, MemberRole::Admin, "admin@example.com");
    let member = principal(family_id, MemberRole::Member, "member@example.com");
    let fixture = fixture(
        vec![admin.clone(), member.clone()],
        FakePermissionRepository::default(),
    );
    let resource = bill_resource();
    fixture.directory.foreign.lock().await.insert(resource.clone());

    let granted = fixture
        .service
        .grant(&admin, grant_input(&resource, member.id))
        .await;
    assert!(matches!(granted, Err(AppError::NotFound(_))));
    assert!(fixture.permissions.grants.lock().await.is_empty());

    let required = fixture.service.require_resource(&admin, &resource).await;
    assert!(matches!(required, Err(AppError::NotFound(_))));
}
