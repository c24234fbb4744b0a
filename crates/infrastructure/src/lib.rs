//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod aes_field_cipher;
mod in_memory_family_store;
mod postgres_audit_repository;
mod postgres_bill_repository;
mod postgres_credential_repository;
mod postgres_member_repository;
mod postgres_permission_repository;
#[cfg(test)]
mod postgres_test_support;

pub use aes_field_cipher::AesGcmFieldCipher;
pub use in_memory_family_store::InMemoryFamilyStore;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_bill_repository::PostgresBillRepository;
pub use postgres_credential_repository::PostgresCredentialRepository;
pub use postgres_member_repository::PostgresMemberRepository;
pub use postgres_permission_repository::PostgresPermissionRepository;
