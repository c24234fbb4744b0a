use hearth_core::{AppError, AppResult, FamilyId, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{FieldChange, MemberId, ResourceRef, ResourceType};

/// Bill identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillId(Uuid);

impl BillId {
    /// Creates a new random bill identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a bill identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a transport value into a bill identifier.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| AppError::Validation(format!("invalid bill id '{value}'")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Recovers the bill addressed by a resource reference, if any.
    #[must_use]
    pub fn from_resource(resource: &ResourceRef) -> Option<Self> {
        if resource.resource_type() != ResourceType::Bill {
            return None;
        }

        Uuid::parse_str(resource.resource_id()).ok().map(Self)
    }

    /// Returns the permission and credential address of the bill.
    #[must_use]
    pub fn resource(&self) -> ResourceRef {
        ResourceRef::from_uuid(ResourceType::Bill, self.0)
    }
}

impl Default for BillId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BillId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Household bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    /// Bill identifier.
    pub id: BillId,
    /// Family partition.
    pub family_id: FamilyId,
    /// Display name.
    pub name: NonEmptyString,
    /// Budget category.
    pub category: Option<String>,
    /// Who gets paid.
    pub payee_name: Option<String>,
    /// Expected amount per occurrence, in cents.
    pub anticipated_amount_cents: Option<i64>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Creator.
    pub created_by: MemberId,
    /// Last editor.
    pub updated_by: Option<MemberId>,
}

/// Validates an amount in cents.
pub fn validate_amount_cents(amount: Option<i64>) -> AppResult<Option<i64>> {
    match amount {
        Some(value) if value < 0 => Err(AppError::Validation(
            "anticipated_amount_cents must not be negative".to_owned(),
        )),
        other => Ok(other),
    }
}

/// Partial bill update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillPatch {
    /// New display name.
    pub name: Option<NonEmptyString>,
    /// Category change.
    pub category: FieldChange,
    /// Payee change.
    pub payee_name: FieldChange,
    /// New amount in cents.
    pub anticipated_amount_cents: Option<i64>,
    /// Notes change.
    pub notes: FieldChange,
}

impl BillPatch {
    /// Applies the patch to a stored bill.
    pub fn apply(self, mut bill: Bill, editor: MemberId) -> AppResult<Bill> {
        if let Some(name) = self.name {
            bill.name = name;
        }
        bill.category = self.category.apply(bill.category);
        bill.payee_name = self.payee_name.apply(bill.payee_name);
        if let Some(amount) = validate_amount_cents(self.anticipated_amount_cents)? {
            bill.anticipated_amount_cents = Some(amount);
        }
        bill.notes = self.notes.apply(bill.notes);
        bill.updated_by = Some(editor);
        Ok(bill)
    }
}
