use std::str::FromStr;

use chrono::{DateTime, Utc};
use hearth_core::{AppError, FamilyId};
use serde::{Deserialize, Serialize};

use crate::{MemberId, MemberRole, ResourceRef};

/// Actions gated by permission checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    /// Read the resource.
    View,
    /// Mutate the resource.
    Edit,
    /// Soft-delete the resource.
    Delete,
    /// Grant or revoke access to the resource.
    Share,
}

impl PermissionAction {
    /// Returns a stable transport value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Share => "share",
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[PermissionAction] = &[
            PermissionAction::View,
            PermissionAction::Edit,
            PermissionAction::Delete,
            PermissionAction::Share,
        ];

        ALL
    }
}

impl FromStr for PermissionAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "view" | "can_view" => Ok(Self::View),
            "edit" | "can_edit" => Ok(Self::Edit),
            "delete" | "can_delete" => Ok(Self::Delete),
            "share" | "can_share" => Ok(Self::Share),
            _ => Err(AppError::Validation(format!(
                "unknown permission action '{value}'"
            ))),
        }
    }
}

/// Independent capability flags carried by a grant.
///
/// The flags do not imply each other: `can_edit` without `can_view` is a
/// valid (if odd) grant and is evaluated literally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilitySet {
    /// View access.
    pub can_view: bool,
    /// Edit access.
    pub can_edit: bool,
    /// Delete access.
    pub can_delete: bool,
    /// Share access.
    pub can_share: bool,
}

impl CapabilitySet {
    /// All four capabilities, as given to a resource creator.
    #[must_use]
    pub fn full() -> Self {
        Self {
            can_view: true,
            can_edit: true,
            can_delete: true,
            can_share: true,
        }
    }

    /// View only, the default for explicit grants.
    #[must_use]
    pub fn view_only() -> Self {
        Self {
            can_view: true,
            can_edit: false,
            can_delete: false,
            can_share: false,
        }
    }

    /// Builds a set from optional flags, falling back to [`Self::view_only`].
    #[must_use]
    pub fn with_defaults(
        can_view: Option<bool>,
        can_edit: Option<bool>,
        can_delete: Option<bool>,
        can_share: Option<bool>,
    ) -> Self {
        let defaults = Self::view_only();
        Self {
            can_view: can_view.unwrap_or(defaults.can_view),
            can_edit: can_edit.unwrap_or(defaults.can_edit),
            can_delete: can_delete.unwrap_or(defaults.can_delete),
            can_share: can_share.unwrap_or(defaults.can_share),
        }
    }

    /// Returns the flag matching `action`.
    #[must_use]
    pub fn allows(&self, action: PermissionAction) -> bool {
        match action {
            PermissionAction::View => self.can_view,
            PermissionAction::Edit => self.can_edit,
            PermissionAction::Delete => self.can_delete,
            PermissionAction::Share => self.can_share,
        }
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::view_only()
    }
}

/// Explicit capability grant of one member over one resource.
///
/// Unique per `(resource_type, resource_id, granted_to)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    /// Family partition.
    pub family_id: FamilyId,
    /// Resource the grant applies to.
    pub resource: ResourceRef,
    /// Grantee.
    pub granted_to: MemberId,
    /// Grantor.
    pub granted_by: MemberId,
    /// Capability flags.
    pub capabilities: CapabilitySet,
    /// Exclusive expiry; a grant expiring strictly before now is inert.
    pub expires_at: Option<DateTime<Utc>>,
    /// Free-text notes.
    pub notes: Option<String>,
}

impl PermissionGrant {
    /// Returns whether the grant has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

/// Observable lifecycle state of a grant triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantState {
    /// No record.
    Absent,
    /// Record without expiry, or expiring in the future.
    Active,
    /// Record whose expiry has passed.
    Expired,
}

impl GrantState {
    /// Derives the state from an optional grant record.
    #[must_use]
    pub fn of(grant: Option<&PermissionGrant>, now: DateTime<Utc>) -> Self {
        match grant {
            None => Self::Absent,
            Some(grant) if grant.is_expired_at(now) => Self::Expired,
            Some(_) => Self::Active,
        }
    }
}

/// Outcome of an access evaluation, with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The grant record carries the requested capability.
    AllowedByGrant,
    /// No grant record; the role has implicit access.
    AllowedByRole,
    /// The grant record exists but has expired.
    DeniedExpired,
    /// The grant record exists but lacks the requested capability.
    DeniedByGrant,
    /// No grant record and the role has no implicit access.
    DeniedNoGrant,
}

impl AccessDecision {
    /// Returns whether access is allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::AllowedByGrant | Self::AllowedByRole)
    }
}

/// Evaluates an existing grant record. Expiry overrides every flag.
#[must_use]
pub fn explicit_grant_decision(
    grant: &PermissionGrant,
    action: PermissionAction,
    now: DateTime<Utc>,
) -> AccessDecision {
    if grant.is_expired_at(now) {
        return AccessDecision::DeniedExpired;
    }

    if grant.capabilities.allows(action) {
        AccessDecision::AllowedByGrant
    } else {
        AccessDecision::DeniedByGrant
    }
}

/// Evaluates the role fallback used when no grant record exists.
#[must_use]
pub fn implicit_role_decision(role: MemberRole) -> AccessDecision {
    if role.has_implicit_access() {
        AccessDecision::AllowedByRole
    } else {
        AccessDecision::DeniedNoGrant
    }
}

/// Composes the two strategies: explicit grant first, role fallback only
/// when no record exists at all.
#[must_use]
pub fn decide_access(
    role: MemberRole,
    grant: Option<&PermissionGrant>,
    action: PermissionAction,
    now: DateTime<Utc>,
) -> AccessDecision {
    match grant {
        Some(grant) => explicit_grant_decision(grant, action, now),
        None => implicit_role_decision(role),
    }
}

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A grant was created or replaced.
    PermissionGranted,
    /// A grant was revoked.
    PermissionRevoked,
    /// A credential bundle was created or replaced.
    CredentialsStored,
    /// Some fields of a credential bundle changed.
    CredentialsUpdated,
    /// A bill was created.
    BillCreated,
    /// A bill was updated.
    BillUpdated,
    /// A bill was soft-deleted.
    BillDeactivated,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionGranted => "permission.granted",
            Self::PermissionRevoked => "permission.revoked",
            Self::CredentialsStored => "credentials.stored",
            Self::CredentialsUpdated => "credentials.updated",
            Self::BillCreated => "bill.created",
            Self::BillUpdated => "bill.updated",
            Self::BillDeactivated => "bill.deactivated",
        }
    }
}
