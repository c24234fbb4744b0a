//! Recurring household bills with attached credentials.

use std::sync::Arc;

use async_trait::async_trait;
use hearth_core::{AppError, AppResult, FamilyId, NonEmptyString};
use hearth_domain::{
    AuditAction, Bill, BillId, BillPatch, CredentialBundleView, CredentialMetadata,
    CredentialPatch, MemberId, PermissionAction, Principal, validate_amount_cents,
};
use tracing::info;

use crate::access_control_ports::{AuditEvent, AuditRepository};
use crate::access_control_service::AccessControlService;
use crate::credential_service::{CredentialInput, CredentialService};

mod commands;
mod queries;

/// Repository port for bills.
#[async_trait]
pub trait BillRepository: Send + Sync {
    /// Inserts a new bill.
    async fn insert_bill(&self, bill: Bill) -> AppResult<()>;

    /// Finds a bill by id inside a family, active or not.
    async fn find_bill(&self, family_id: FamilyId, bill_id: BillId) -> AppResult<Option<Bill>>;

    /// Lists active bills of a family ordered by name.
    async fn list_active_bills(
        &self,
        family_id: FamilyId,
        query: &BillListQuery,
    ) -> AppResult<Vec<Bill>>;

    /// Persists an edited bill.
    async fn update_bill(&self, bill: Bill) -> AppResult<()>;

    /// Marks a bill inactive. Returns whether a bill was found.
    async fn deactivate_bill(
        &self,
        family_id: FamilyId,
        bill_id: BillId,
        actor: MemberId,
    ) -> AppResult<bool>;
}

/// Input payload for bill creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBillInput {
    /// Display name.
    pub name: String,
    /// Optional category.
    pub category: Option<String>,
    /// Optional payee.
    pub payee_name: Option<String>,
    /// Optional expected amount in cents.
    pub anticipated_amount_cents: Option<i64>,
    /// Optional notes.
    pub notes: Option<String>,
    /// Credentials stored alongside the bill when not blank.
    pub credentials: CredentialInput,
}

/// Filters for bill listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillListQuery {
    /// Exact category match.
    pub category: Option<String>,
    /// Case-insensitive substring of name or payee.
    pub search: Option<String>,
}

impl BillListQuery {
    /// Returns whether a bill passes the filters.
    #[must_use]
    pub fn matches(&self, bill: &Bill) -> bool {
        let category_matches = self
            .category
            .as_deref()
            .is_none_or(|category| bill.category.as_deref() == Some(category));
        let search_matches = self.search.as_deref().is_none_or(|search| {
            let needle = search.to_lowercase();
            bill.name.as_str().to_lowercase().contains(&needle)
                || bill
                    .payee_name
                    .as_deref()
                    .is_some_and(|payee| payee.to_lowercase().contains(&needle))
        });

        category_matches && search_matches
    }
}

/// Row of a bill listing. Secrets are never decrypted for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillListItem {
    /// The bill.
    pub bill: Bill,
    /// Plaintext credential metadata, when a bundle exists.
    pub credential_metadata: Option<CredentialMetadata>,
}

/// A bill with its decrypted credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillDetail {
    /// The bill.
    pub bill: Bill,
    /// Decrypted credential bundle, when one exists.
    pub credentials: Option<CredentialBundleView>,
}

/// Application service for bill use-cases.
#[derive(Clone)]
pub struct BillService {
    access_control: AccessControlService,
    credentials: CredentialService,
    bill_repository: Arc<dyn BillRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl BillService {
    /// Creates a new bill service.
    #[must_use]
    pub fn new(
        access_control: AccessControlService,
        credentials: CredentialService,
        bill_repository: Arc<dyn BillRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            access_control,
            credentials,
            bill_repository,
            audit_repository,
        }
    }

    async fn audit(&self, actor: &Principal, bill_id: BillId, action: AuditAction) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                family_id: actor.family_id,
                actor: actor.id,
                action,
                resource: bill_id.resource(),
                detail: None,
            })
            .await
    }
}
