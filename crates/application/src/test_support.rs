//! Shared in-test port implementations.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use hearth_core::{AppResult, FamilyId};
use hearth_domain::{
    Bill, BillId, EncryptedCredentialBundle, Envelope, MemberId, MemberRole, MemberSummary,
    PermissionGrant, Principal, ResourceRef, ResourceType,
};
use tokio::sync::Mutex;

use crate::access_control_ports::{
    AuditEvent, AuditRepository, GrantSummary, MemberRepository, PermissionRepository,
    ResourceDirectory,
};
use crate::bill_service::{BillListQuery, BillRepository, BillService};
use crate::credential_service::{CredentialRepository, CredentialService};
use crate::field_encryption_service::{FieldCipher, FieldEncryptionService, OpenFailure};
use crate::AccessControlService;

/// Reversible cipher whose envelopes embed a sequence number, so every seal
/// yields a distinct envelope.
#[derive(Default)]
pub(crate) struct SequenceCipher {
    sealed: AtomicU64,
}

impl FieldCipher for SequenceCipher {
    fn seal(&self, plaintext: &str) -> AppResult<Envelope> {
        let sequence = self.sealed.fetch_add(1, Ordering::Relaxed);
        Ok(Envelope::new(format!("sealed:{sequence}:{plaintext}")))
    }

    fn open(&self, envelope: &Envelope) -> Result<String, OpenFailure> {
        envelope
            .as_str()
            .strip_prefix("sealed:")
            .and_then(|rest| rest.split_once(':'))
            .map(|(_, plaintext)| plaintext.to_owned())
            .ok_or(OpenFailure::Authentication)
    }
}

/// One store implementing every repository port.
#[derive(Default)]
pub(crate) struct FakeStore {
    pub(crate) members: Mutex<HashMap<String, Principal>>,
    pub(crate) grants: Mutex<HashMap<(FamilyId, ResourceRef, MemberId), PermissionGrant>>,
    pub(crate) bundles: Mutex<HashMap<(FamilyId, ResourceRef), EncryptedCredentialBundle>>,
    pub(crate) bills: Mutex<HashMap<BillId, Bill>>,
    pub(crate) events: Mutex<Vec<AuditEvent>>,
}

impl FakeStore {
    /// Registers members so they can receive grants.
    pub(crate) async fn enroll(&self, members: &[&Principal]) {
        let mut stored = self.members.lock().await;
        for member in members {
            stored.insert(member.email.clone(), (*member).clone());
        }
    }
}

#[async_trait]
impl MemberRepository for FakeStore {
    async fn find_active_member_by_email(&self, email: &str) -> AppResult<Option<Principal>> {
        Ok(self.members.lock().await.get(email).cloned())
    }

    async fn find_active_member(
        &self,
        family_id: FamilyId,
        member_id: MemberId,
    ) -> AppResult<Option<Principal>> {
        Ok(self
            .members
            .lock()
            .await
            .values()
            .find(|member| member.id == member_id && member.family_id == family_id)
            .cloned())
    }
}

#[async_trait]
impl ResourceDirectory for FakeStore {
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
            .lock()
            .await
            .get(&bill_id)
            .is_some_and(|bill| bill.family_id == family_id))
    }
}

#[async_trait]
impl PermissionRepository for FakeStore {
    async fn find_grant(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
        member_id: MemberId,
    ) -> AppResult<Option<PermissionGrant>> {
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
        let summary = |id: MemberId| MemberSummary {
            id,
            display_name: id.to_string(),
            initials: None,
            color: None,
        };
        Ok(self
            .grants
            .lock()
            .await
            .values()
            .filter(|grant| grant.family_id == family_id && &grant.resource == resource)
            .map(|grant| GrantSummary {
                grant: grant.clone(),
                granted_to: summary(grant.granted_to),
                granted_by: summary(grant.granted_by),
                created_at: chrono::Utc::now(),
            })
            .collect())
    }
}

#[async_trait]
impl CredentialRepository for FakeStore {
    async fn find_bundle(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
    ) -> AppResult<Option<EncryptedCredentialBundle>> {
        Ok(self
            .bundles
            .lock()
            .await
            .get(&(family_id, resource.clone()))
            .cloned())
    }

    async fn upsert_bundle(
        &self,
        bundle: EncryptedCredentialBundle,
        _actor: MemberId,
    ) -> AppResult<()> {
        self.bundles
            .lock()
            .await
            .insert((bundle.family_id, bundle.resource.clone()), bundle);
        Ok(())
    }
}

#[async_trait]
impl BillRepository for FakeStore {
    async fn insert_bill(&self, bill: Bill) -> AppResult<()> {
        self.bills.lock().await.insert(bill.id, bill);
        Ok(())
    }

    async fn find_bill(&self, family_id: FamilyId, bill_id: BillId) -> AppResult<Option<Bill>> {
        Ok(self
            .bills
            .lock()
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
        let mut bills = self
            .bills
            .lock()
            .await
            .values()
            .filter(|bill| bill.family_id == family_id && bill.is_active && query.matches(bill))
            .cloned()
            .collect::<Vec<_>>();
        bills.sort_by(|left, right| left.name.as_str().cmp(right.name.as_str()));
        Ok(bills)
    }

    async fn update_bill(&self, bill: Bill) -> AppResult<()> {
        self.bills.lock().await.insert(bill.id, bill);
        Ok(())
    }

    async fn deactivate_bill(
        &self,
        family_id: FamilyId,
        bill_id: BillId,
        actor: MemberId,
    ) -> AppResult<bool> {
        let mut bills = self.bills.lock().await;
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
impl AuditRepository for FakeStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

/// Services wired against one [`FakeStore`].
pub(crate) struct Services {
    pub(crate) store: Arc<FakeStore>,
    pub(crate) access_control: AccessControlService,
    pub(crate) credentials: CredentialService,
    pub(crate) bills: BillService,
}

pub(crate) fn services() -> Services {
    let store = Arc::new(FakeStore::default());
    let access_control =
        AccessControlService::new(store.clone(), store.clone(), store.clone(), store.clone());
    let field_encryption = FieldEncryptionService::new(Arc::new(SequenceCipher::default()));
    let credentials = CredentialService::new(
        access_control.clone(),
        field_encryption,
        store.clone(),
        store.clone(),
    );
    let bills = BillService::new(
        access_control.clone(),
        credentials.clone(),
        store.clone(),
        store.clone(),
    );

    Services {
        store,
        access_control,
        credentials,
        bills,
    }
}

pub(crate) fn member(family_id: FamilyId, role: MemberRole) -> Principal {
    let id = MemberId::new();
    Principal {
        id,
        family_id,
        role,
        email: format!("{id}@example.com"),
        display_name: role.as_str().to_owned(),
    }
}
