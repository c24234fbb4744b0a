use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hearth_application::{
    AuditEvent, AuditRepository, BillListQuery, BillRepository, CredentialRepository,
    GrantSummary, MemberRepository, PermissionRepository, ResourceDirectory,
};
use hearth_core::{AppError, AppResult, FamilyId};
use hearth_domain::{
    Bill, BillId, EncryptedCredentialBundle, MemberId, MemberSummary, PermissionGrant, Principal,
    ResourceRef, ResourceType,
};
use tokio::sync::RwLock;

type GrantKey = (ResourceRef, MemberId);

#[derive(Debug, Clone)]
struct MemberRecord {
    principal: Principal,
    is_active: bool,
}

#[derive(Debug, Clone)]
struct StoredGrant {
    grant: PermissionGrant,
    created_at: DateTime<Utc>,
}

/// In-memory implementation of every family data port.
#[derive(Debug, Default)]
pub struct InMemoryFamilyStore {
    members: RwLock<HashMap<MemberId, MemberRecord>>,
    grants: RwLock<HashMap<GrantKey, StoredGrant>>,
    bundles: RwLock<HashMap<ResourceRef, EncryptedCredentialBundle>>,
    bills: RwLock<HashMap<BillId, Bill>>,
    audit_events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryFamilyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an active family member.
    pub async fn insert_member(&self, principal: Principal) {
        self.members.write().await.insert(
            principal.id,
            MemberRecord {
                principal,
                is_active: true,
            },
        );
    }

    /// Marks a member inactive so its sessions stop resolving.
    pub async fn deactivate_member(&self, member_id: MemberId) -> AppResult<()> {
        let mut members = self.members.write().await;
        let record = members
            .get_mut(&member_id)
            .ok_or_else(|| AppError::NotFound(format!("member '{member_id}' not found")))?;
        record.is_active = false;
        Ok(())
    }

    /// Returns a snapshot of the appended audit events.
    pub async fn audit_events(&self) -> Vec<AuditEvent> {
        self.audit_events.read().await.clone()
    }

    async fn member_summary(&self, family_id: FamilyId, member_id: MemberId) -> MemberSummary {
        let members = self.members.read().await;
        let display_name = members
            .get(&member_id)
            .filter(|record| record.principal.family_id == family_id)
            .map(|record| record.principal.display_name.clone())
            .unwrap_or_default();
        let initials = display_name.chars().next().map(String::from);

        MemberSummary {
            id: member_id,
            display_name,
            initials,
            color: None,
        }
    }
}

#[async_trait]
impl MemberRepository for InMemoryFamilyStore {
    async fn find_active_member_by_email(&self, email: &str) -> AppResult<Option<Principal>> {
        let members = self.members.read().await;

        Ok(members
            .values()
            .find(|record| record.is_active && record.principal.email.eq_ignore_ascii_case(email))
            .map(|record| record.principal.clone()))
    }

    async fn find_active_member(
        &self,
        family_id: FamilyId,
        member_id: MemberId,
    ) -> AppResult<Option<Principal>> {
        Ok(self
            .members
            .read()
            .await
            .get(&member_id)
            .filter(|record| record.is_active && record.principal.family_id == family_id)
            .map(|record| record.principal.clone()))
    }
}

#[async_trait]
impl ResourceDirectory for InMemoryFamilyStore {
    async fn resource_in_family(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
    ) -> AppResult<bool> {
        if resource.resource_type() != ResourceType::Bill {
            return Ok(true);
        }

        let Some(bill_id) = BillId::from_resource(resource) else {
            return Ok(false);
        };
        Ok(self
            .bills
            .read()
            .await
            .get(&bill_id)
            .is_some_and(|bill| bill.family_id == family_id))
    }
}

#[async_trait]
impl PermissionRepository for InMemoryFamilyStore {
    async fn find_grant(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
        member_id: MemberId,
    ) -> AppResult<Option<PermissionGrant>> {
        let grants = self.grants.read().await;

        Ok(grants
            .get(&(resource.clone(), member_id))
            .filter(|stored| stored.grant.family_id == family_id)
            .map(|stored| stored.grant.clone()))
    }

    async fn upsert_grant(&self, grant: PermissionGrant) -> AppResult<()> {
        let key = (grant.resource.clone(), grant.granted_to);
        let mut grants = self.grants.write().await;

        match grants.get_mut(&key) {
            Some(stored) if stored.grant.family_id != grant.family_id => {
                return Err(AppError::Conflict(format!(
                    "resource '{}' belongs to another family",
                    grant.resource
                )));
            }
            Some(stored) => stored.grant = grant,
            None => {
                grants.insert(
                    key,
                    StoredGrant {
                        grant,
                        created_at: Utc::now(),
                    },
                );
            }
        }

        Ok(())
    }

    async fn delete_grant(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
        member_id: MemberId,
    ) -> AppResult<bool> {
        let key = (resource.clone(), member_id);
        let mut grants = self.grants.write().await;

        let owned = grants
            .get(&key)
            .is_some_and(|stored| stored.grant.family_id == family_id);
        if owned {
            grants.remove(&key);
        }

        Ok(owned)
    }

    async fn list_grants(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
    ) -> AppResult<Vec<GrantSummary>> {
        let mut stored: Vec<StoredGrant> = self
            .grants
            .read()
            .await
            .values()
            .filter(|stored| {
                stored.grant.family_id == family_id && &stored.grant.resource == resource
            })
            .cloned()
            .collect();
        stored.sort_by_key(|stored| stored.created_at);

        let mut summaries = Vec::with_capacity(stored.len());
        for stored in stored {
            let granted_to = self.member_summary(family_id, stored.grant.granted_to).await;
            let granted_by = self.member_summary(family_id, stored.grant.granted_by).await;
            summaries.push(GrantSummary {
                grant: stored.grant,
                granted_to,
                granted_by,
                created_at: stored.created_at,
            });
        }

        Ok(summaries)
    }
}

#[async_trait]
impl CredentialRepository for InMemoryFamilyStore {
    async fn find_bundle(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
    ) -> AppResult<Option<EncryptedCredentialBundle>> {
        Ok(self
            .bundles
            .read()
            .await
            .get(resource)
            .filter(|bundle| bundle.family_id == family_id)
            .cloned())
    }

    async fn upsert_bundle(
        &self,
        bundle: EncryptedCredentialBundle,
        _actor: MemberId,
    ) -> AppResult<()> {
        let mut bundles = self.bundles.write().await;

        if bundles
            .get(&bundle.resource)
            .is_some_and(|existing| existing.family_id != bundle.family_id)
        {
            return Err(AppError::Conflict(format!(
                "resource '{}' belongs to another family",
                bundle.resource
            )));
        }

        bundles.insert(bundle.resource.clone(), bundle);
        Ok(())
    }
}

#[async_trait]
impl BillRepository for InMemoryFamilyStore {
    async fn insert_bill(&self, bill: Bill) -> AppResult<()> {
        let mut bills = self.bills.write().await;

        if bills.contains_key(&bill.id) {
            return Err(AppError::Conflict(format!(
                "bill '{}' already exists",
                bill.id
            )));
        }

        bills.insert(bill.id, bill);
        Ok(())
    }

    async fn find_bill(&self, family_id: FamilyId, bill_id: BillId) -> AppResult<Option<Bill>> {
        Ok(self
            .bills
            .read()
            .await
            .get(&bill_id)
            .filter(|bill| bill.family_id == family_id)
            .cloned())
    }

    async fn list_active_bills(
        &self,
        family_id: FamilyId,
        query: &BillListQuery,
    ) -> AppResult<Vec<Bill>> {
        let mut bills: Vec<Bill> = self
            .bills
            .read()
            .await
            .values()
            .filter(|bill| bill.family_id == family_id && bill.is_active && query.matches(bill))
            .cloned()
            .collect();
        bills.sort_by(|left, right| left.name.as_str().cmp(right.name.as_str()));

        Ok(bills)
    }

    async fn update_bill(&self, bill: Bill) -> AppResult<()> {
        let mut bills = self.bills.write().await;

        let stored = bills
            .get_mut(&bill.id)
            .filter(|stored| stored.family_id == bill.family_id)
            .ok_or_else(|| AppError::NotFound(format!("bill '{}' not found", bill.id)))?;
        *stored = bill;

        Ok(())
    }

    async fn deactivate_bill(
        &self,
        family_id: FamilyId,
        bill_id: BillId,
        actor: MemberId,
    ) -> AppResult<bool> {
        let mut bills = self.bills.write().await;

        let Some(bill) = bills
            .get_mut(&bill_id)
            .filter(|bill| bill.family_id == family_id)
        else {
            return Ok(false);
        };
        bill.is_active = false;
        bill.updated_by = Some(actor);

        Ok(true)
    }
}

#[async_trait]
impl AuditRepository for InMemoryFamilyStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.audit_events.write().await.push(event);
        Ok(())
    }
}
