use std::sync::Arc;

use hearth_application::{
    AccessControlService, AuditRepository, BillRepository, BillService, CredentialRepository,
    CredentialService, FieldCipher, FieldEncryptionService, MemberRepository,
    PermissionRepository, ResourceDirectory,
};
use hearth_core::AppError;
use hearth_infrastructure::{
    AesGcmFieldCipher, PostgresAuditRepository, PostgresBillRepository,
    PostgresCredentialRepository, PostgresMemberRepository, PostgresPermissionRepository,
};
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

/// Port implementations the services are assembled from.
pub(crate) struct FamilyPorts {
    pub(crate) member_repository: Arc<dyn MemberRepository>,
    pub(crate) permission_repository: Arc<dyn PermissionRepository>,
    pub(crate) credential_repository: Arc<dyn CredentialRepository>,
    pub(crate) bill_repository: Arc<dyn BillRepository>,
    pub(crate) resource_directory: Arc<dyn ResourceDirectory>,
    pub(crate) audit_repository: Arc<dyn AuditRepository>,
}

impl FamilyPorts {
    fn postgres(pool: &PgPool) -> Self {
        Self {
            member_repository: Arc::new(PostgresMemberRepository::new(pool.clone())),
            permission_repository: Arc::new(PostgresPermissionRepository::new(pool.clone())),
            credential_repository: Arc::new(PostgresCredentialRepository::new(pool.clone())),
            bill_repository: Arc::new(PostgresBillRepository::new(pool.clone())),
            resource_directory: Arc::new(PostgresBillRepository::new(pool.clone())),
            audit_repository: Arc::new(PostgresAuditRepository::new(pool.clone())),
        }
    }

    #[cfg(test)]
    pub(crate) fn in_memory(store: Arc<hearth_infrastructure::InMemoryFamilyStore>) -> Self {
        Self {
            member_repository: store.clone(),
            permission_repository: store.clone(),
            credential_repository: store.clone(),
            bill_repository: store.clone(),
            resource_directory: store.clone(),
            audit_repository: store,
        }
    }
}

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let cipher = AesGcmFieldCipher::from_secret(&config.encryption_secret)?;

    Ok(assemble_state(
        FamilyPorts::postgres(&pool),
        Arc::new(cipher),
        config.frontend_url.clone(),
        config.bootstrap_token.clone(),
    ))
}

pub(crate) fn assemble_state(
    ports: FamilyPorts,
    cipher: Arc<dyn FieldCipher>,
    frontend_url: String,
    bootstrap_token: String,
) -> AppState {
    let access_control_service = AccessControlService::new(
        ports.member_repository,
        ports.permission_repository,
        ports.resource_directory,
        ports.audit_repository.clone(),
    );
    let credential_service = CredentialService::new(
        access_control_service.clone(),
        FieldEncryptionService::new(cipher),
        ports.credential_repository,
        ports.audit_repository.clone(),
    );
    let bill_service = BillService::new(
        access_control_service.clone(),
        credential_service.clone(),
        ports.bill_repository,
        ports.audit_repository,
    );

    AppState {
        access_control_service,
        credential_service,
        bill_service,
        frontend_url,
        bootstrap_token,
    }
}
