//! Application services and ports.

#![forbid(unsafe_code)]

mod access_control_ports;
mod access_control_service;
mod bill_service;
mod credential_service;
mod field_encryption_service;
#[cfg(test)]
mod test_support;

pub use access_control_ports::{
    AuditEvent, AuditRepository, GrantPermissionInput, GrantSummary, MemberRepository,
    PermissionRepository, ResourceDirectory,
};
pub use access_control_service::AccessControlService;
pub use bill_service::{
    BillDetail, BillListItem, BillListQuery, BillRepository, BillService, NewBillInput,
};
pub use credential_service::{CredentialInput, CredentialRepository, CredentialService};
pub use field_encryption_service::{
    FieldCipher, FieldDecryption, FieldEncryptionService, OpenFailure,
};
