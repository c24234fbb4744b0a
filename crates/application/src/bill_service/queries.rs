use super::*;

impl BillService {
    /// Lists the active bills of the actor's family that the actor may view.
    pub async fn list_bills(
        &self,
        actor: &Principal,
        query: &BillListQuery,
    ) -> AppResult<Vec<BillListItem>> {
        let bills = self
            .bill_repository
            .list_active_bills(actor.family_id, query)
            .await?;

        let mut items = Vec::with_capacity(bills.len());
        for bill in bills {
            let resource = bill.id.resource();
            let decision = self
                .access_control
                .evaluate(actor, &resource, PermissionAction::View)
                .await?;
            if !decision.is_allowed() {
                continue;
            }

            let credential_metadata = self
                .credentials
                .find_metadata(actor.family_id, &resource)
                .await?;
            items.push(BillListItem {
                bill,
                credential_metadata,
            });
        }

        Ok(items)
    }

    /// Returns one bill with its decrypted credentials. Requires `view`.
    ///
    /// Inactive bills are still returned.
    pub async fn get_bill(&self, actor: &Principal, bill_id: BillId) -> AppResult<BillDetail> {
        let resource = bill_id.resource();
        self.access_control
            .require_access(actor, &resource, PermissionAction::View)
            .await?;

        let bill = self.require_bill(actor.family_id, bill_id).await?;
        let credentials = self.credentials.read_credentials(actor, &resource).await?;

        Ok(BillDetail { bill, credentials })
    }
}
