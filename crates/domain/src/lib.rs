//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod bill;
mod credential;
mod member;
mod resource;
mod security;

pub use bill::{Bill, BillId, BillPatch, validate_amount_cents};
pub use credential::{
    CredentialBundleView, CredentialField, CredentialFields, CredentialMetadata, CredentialPatch,
    EncryptedCredentialBundle, Envelope, FieldChange,
};
pub use member::{MemberId, MemberRole, MemberSummary, Principal};
pub use resource::{ResourceRef, ResourceType};
pub use security::{
    AccessDecision, AuditAction, CapabilitySet, GrantState, PermissionAction, PermissionGrant,
    decide_access, explicit_grant_decision, implicit_role_decision,
};
