use super::*;

impl BillService {
    /// Creates a bill in the actor's family.
    ///
    /// The creator receives every capability on the new bill before any
    /// credentials are stored. Bill, grant and bundle are separate writes.
    pub async fn create_bill(&self, actor: &Principal, input: NewBillInput) -> AppResult<Bill> {
        let bill = Bill {
            id: BillId::new(),
            family_id: actor.family_id,
            name: NonEmptyString::new(input.name)?,
            category: non_blank(input.category),
            payee_name: non_blank(input.payee_name),
            anticipated_amount_cents: validate_amount_cents(input.anticipated_amount_cents)?,
            notes: non_blank(input.notes),
            is_active: true,
            created_by: actor.id,
            updated_by: None,
        };

        self.bill_repository.insert_bill(bill.clone()).await?;
        let resource = bill.id.resource();
        self.access_control
            .grant_creator_access(actor, resource.clone())
            .await?;

        if !input.credentials.is_blank() {
            self.credentials
                .store_credentials(actor, &resource, input.credentials)
                .await?;
        }

        info!(actor_id = %actor.id, bill_id = %bill.id, "bill created");
        self.audit(actor, bill.id, AuditAction::BillCreated).await?;

        Ok(bill)
    }

    /// Applies a partial update to a bill and, optionally, its credentials.
    /// Requires `edit`.
    pub async fn update_bill(
        &self,
        actor: &Principal,
        bill_id: BillId,
        patch: BillPatch,
        credentials: Option<CredentialPatch>,
    ) -> AppResult<Bill> {
        let resource = bill_id.resource();
        self.access_control
            .require_access(actor, &resource, PermissionAction::Edit)
            .await?;

        let bill = self.require_bill(actor.family_id, bill_id).await?;
        let bill = patch.apply(bill, actor.id)?;
        self.bill_repository.update_bill(bill.clone()).await?;

        if let Some(credentials) = credentials {
            self.credentials
                .update_credentials(actor, &resource, credentials)
                .await?;
        }

        info!(actor_id = %actor.id, %bill_id, "bill updated");
        self.audit(actor, bill_id, AuditAction::BillUpdated).await?;

        Ok(bill)
    }

    /// Soft-deletes a bill. Requires `delete`.
    ///
    /// Grants and credentials attached to the bill are kept.
    pub async fn deactivate_bill(&self, actor: &Principal, bill_id: BillId) -> AppResult<()> {
        self.access_control
            .require_access(actor, &bill_id.resource(), PermissionAction::Delete)
            .await?;

        let found = self
            .bill_repository
            .deactivate_bill(actor.family_id, bill_id, actor.id)
            .await?;
        if !found {
            return Err(AppError::NotFound(format!("bill '{bill_id}' not found")));
        }

        info!(actor_id = %actor.id, %bill_id, "bill deactivated");
        self.audit(actor, bill_id, AuditAction::BillDeactivated)
            .await
    }

    pub(super) async fn require_bill(&self, family_id: FamilyId, bill_id: BillId) -> AppResult<Bill> {
        self.bill_repository
            .find_bill(family_id, bill_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("bill '{bill_id}' not found")))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
