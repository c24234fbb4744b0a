use hearth_application::{BillDetail, BillListItem, BillListQuery, NewBillInput};
use hearth_core::{AppResult, NonEmptyString};
use hearth_domain::{Bill, BillPatch, CredentialPatch, FieldChange};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::credentials::{CredentialMetadataResponse, CredentialsRequest, CredentialsResponse};

/// Incoming payload for bill creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-bill-request.ts"
)]
pub struct CreateBillRequest {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub payee_name: Option<String>,
    #[serde(default)]
    pub anticipated_amount_cents: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub credentials: Option<CredentialsRequest>,
}

impl From<CreateBillRequest> for NewBillInput {
    fn from(value: CreateBillRequest) -> Self {
        Self {
            name: value.name,
            category: value.category,
            payee_name: value.payee_name,
            anticipated_amount_cents: value.anticipated_amount_cents,
            notes: value.notes,
            credentials: value
                .credentials
                .map(CredentialsRequest::into_input)
                .unwrap_or_default(),
        }
    }
}

/// Incoming payload for partial bill updates. Missing keys keep the stored
/// value; an empty string clears an optional text field.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-bill-request.ts"
)]
pub struct UpdateBillRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub payee_name: Option<String>,
    #[serde(default)]
    pub anticipated_amount_cents: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub credentials: Option<CredentialsRequest>,
}

impl UpdateBillRequest {
    /// Splits the payload into a bill patch and an optional credential patch.
    pub fn into_patches(self) -> AppResult<(BillPatch, Option<CredentialPatch>)> {
        let name = self.name.map(NonEmptyString::new).transpose()?;
        let patch = BillPatch {
            name,
            category: FieldChange::from_transport(self.category),
            payee_name: FieldChange::from_transport(self.payee_name),
            anticipated_amount_cents: self.anticipated_amount_cents,
            notes: FieldChange::from_transport(self.notes),
        };

        Ok((patch, self.credentials.map(CredentialsRequest::into_patch)))
    }
}

/// Query string accepted by the bill listing.
#[derive(Debug, Default, Deserialize)]
pub struct BillListQueryRequest {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl From<BillListQueryRequest> for BillListQuery {
    fn from(value: BillListQueryRequest) -> Self {
        let non_blank = |value: Option<String>| value.filter(|value| !value.trim().is_empty());

        Self {
            category: non_blank(value.category),
            search: non_blank(value.search),
        }
    }
}

/// API representation of a bill.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/bill-response.ts"
)]
pub struct BillResponse {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub payee_name: Option<String>,
    pub anticipated_amount_cents: Option<i64>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_by: String,
    pub updated_by: Option<String>,
}

impl From<Bill> for BillResponse {
    fn from(bill: Bill) -> Self {
        Self {
            id: bill.id.to_string(),
            name: bill.name.into(),
            category: bill.category,
            payee_name: bill.payee_name,
            anticipated_amount_cents: bill.anticipated_amount_cents,
            notes: bill.notes,
            is_active: bill.is_active,
            created_by: bill.created_by.to_string(),
            updated_by: bill.updated_by.map(|member_id| member_id.to_string()),
        }
    }
}

/// One row of the bill listing.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/bill-list-item-response.ts"
)]
pub struct BillListItemResponse {
    pub bill: BillResponse,
    pub credential_metadata: Option<CredentialMetadataResponse>,
}

impl From<BillListItem> for BillListItemResponse {
    fn from(item: BillListItem) -> Self {
        Self {
            bill: item.bill.into(),
            credential_metadata: item.credential_metadata.map(Into::into),
        }
    }
}

/// A bill with its decrypted credentials.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/bill-detail-response.ts"
)]
pub struct BillDetailResponse {
    pub bill: BillResponse,
    pub credentials: Option<CredentialsResponse>,
}

impl From<BillDetail> for BillDetailResponse {
    fn from(detail: BillDetail) -> Self {
        Self {
            bill: detail.bill.into(),
            credentials: detail.credentials.map(Into::into),
        }
    }
}
