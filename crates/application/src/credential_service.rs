//! Encrypted credential bundles attached to family resources.

use std::sync::Arc;

use async_trait::async_trait;
use hearth_core::{AppResult, FamilyId};
use hearth_domain::{
    AuditAction, CredentialBundleView, CredentialField, CredentialFields, CredentialMetadata,
    CredentialPatch, EncryptedCredentialBundle, Envelope, FieldChange, MemberId,
    PermissionAction, Principal, ResourceRef,
};
use tracing::{info, warn};

use crate::access_control_ports::{AuditEvent, AuditRepository};
use crate::access_control_service::AccessControlService;
use crate::field_encryption_service::{FieldDecryption, FieldEncryptionService};

/// Repository port for encrypted credential bundles.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Finds the bundle attached to a resource.
    async fn find_bundle(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
    ) -> AppResult<Option<EncryptedCredentialBundle>>;

    /// Inserts or replaces the bundle keyed on `(resource_type, resource_id)`.
    async fn upsert_bundle(
        &self,
        bundle: EncryptedCredentialBundle,
        actor: MemberId,
    ) -> AppResult<()>;
}

/// Plaintext credential payload supplied on creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialInput {
    /// Sensitive fields; empty strings count as absent.
    pub fields: CredentialFields<String>,
    /// Plaintext metadata.
    pub metadata: CredentialMetadata,
}

impl CredentialInput {
    /// Returns whether the input carries nothing worth storing.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.fields.clone().normalized().is_empty() && self.metadata == CredentialMetadata::default()
    }
}

/// Application service for reading and writing credential bundles.
#[derive(Clone)]
pub struct CredentialService {
    access_control: AccessControlService,
    field_encryption: FieldEncryptionService,
    credential_repository: Arc<dyn CredentialRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl CredentialService {
    /// Creates a new credential service.
    #[must_use]
    pub fn new(
        access_control: AccessControlService,
        field_encryption: FieldEncryptionService,
        credential_repository: Arc<dyn CredentialRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            access_control,
            field_encryption,
            credential_repository,
            audit_repository,
        }
    }

    /// Encrypts and stores a full credential bundle, replacing any
    /// existing one. Requires `edit` on a resource of the actor's family.
    pub async fn store_credentials(
        &self,
        actor: &Principal,
        resource: &ResourceRef,
        input: CredentialInput,
    ) -> AppResult<()> {
        self.access_control
            .require_access(actor, resource, PermissionAction::Edit)
            .await?;
        self.access_control
            .require_resource(actor, resource)
            .await?;

        let fields = self
            .field_encryption
            .encrypt_credentials(input.fields.normalized())?;
        let bundle = EncryptedCredentialBundle {
            family_id: actor.family_id,
            resource: resource.clone(),
            fields,
            metadata: input.metadata,
        };

        self.credential_repository
            .upsert_bundle(bundle, actor.id)
            .await?;
        info!(actor_id = %actor.id, %resource, "credentials stored");

        self.audit(actor, resource, AuditAction::CredentialsStored)
            .await
    }

    /// Applies a partial update. Requires `edit` on a resource of the
    /// actor's family.
    ///
    /// Untouched fields keep their stored envelope unchanged; only fields set
    /// by the patch are re-encrypted.
    pub async fn update_credentials(
        &self,
        actor: &Principal,
        resource: &ResourceRef,
        patch: CredentialPatch,
    ) -> AppResult<()> {
        self.access_control
            .require_access(actor, resource, PermissionAction::Edit)
            .await?;
        self.access_control
            .require_resource(actor, resource)
            .await?;

        if patch.is_noop() {
            return Ok(());
        }

        let current = self
            .credential_repository
            .find_bundle(actor.family_id, resource)
            .await?;
        let (current_fields, current_metadata) = match current {
            Some(bundle) => (bundle.fields, bundle.metadata),
            None => (CredentialFields::empty(), CredentialMetadata::default()),
        };

        let fields = CredentialFields {
            account_number: self.apply_secret_change(
                patch.secret_change(CredentialField::AccountNumber),
                current_fields.account_number,
            )?,
            username: self.apply_secret_change(
                patch.secret_change(CredentialField::Username),
                current_fields.username,
            )?,
            password: self.apply_secret_change(
                patch.secret_change(CredentialField::Password),
                current_fields.password,
            )?,
            pin: self.apply_secret_change(
                patch.secret_change(CredentialField::Pin),
                current_fields.pin,
            )?,
        };
        let bundle = EncryptedCredentialBundle {
            family_id: actor.family_id,
            resource: resource.clone(),
            fields,
            metadata: patch.apply_metadata(current_metadata),
        };

        self.credential_repository
            .upsert_bundle(bundle, actor.id)
            .await?;
        info!(actor_id = %actor.id, %resource, "credentials updated");

        self.audit(actor, resource, AuditAction::CredentialsUpdated)
            .await
    }

    /// Returns the decrypted bundle of a resource. Requires `view`.
    ///
    /// Fields that cannot be decrypted are returned as `None`.
    pub async fn read_credentials(
        &self,
        actor: &Principal,
        resource: &ResourceRef,
    ) -> AppResult<Option<CredentialBundleView>> {
        self.access_control
            .require_access(actor, resource, PermissionAction::View)
            .await?;

        let Some(bundle) = self
            .credential_repository
            .find_bundle(actor.family_id, resource)
            .await?
        else {
            return Ok(None);
        };

        let fields = self
            .field_encryption
            .try_decrypt_credentials(&bundle.fields)
            .map(|field, outcome| match outcome {
                FieldDecryption::Plaintext(plaintext) => Some(plaintext),
                FieldDecryption::Absent => None,
                FieldDecryption::Unrecoverable(failure) => {
                    warn!(
                        %resource,
                        field = field.as_str(),
                        %failure,
                        "credential field could not be decrypted"
                    );
                    None
                }
            })
            .flatten();

        Ok(Some(CredentialBundleView {
            fields,
            metadata: bundle.metadata,
        }))
    }

    /// Returns the plaintext metadata of a bundle without decrypting any
    /// secret. Callers are expected to have checked `view` already.
    pub(crate) async fn find_metadata(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
    ) -> AppResult<Option<CredentialMetadata>> {
        Ok(self
            .credential_repository
            .find_bundle(family_id, resource)
            .await?
            .map(|bundle| bundle.metadata))
    }

    fn apply_secret_change(
        &self,
        change: &FieldChange,
        current: Option<Envelope>,
    ) -> AppResult<Option<Envelope>> {
        match change {
            FieldChange::Keep => Ok(current),
            FieldChange::Clear => Ok(None),
            FieldChange::Set(value) => self.field_encryption.encrypt_field(Some(value)),
        }
    }

    async fn audit(
        &self,
        actor: &Principal,
        resource: &ResourceRef,
        action: AuditAction,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                family_id: actor.family_id,
                actor: actor.id,
                action,
                resource: resource.clone(),
                detail: None,
            })
            .await
    }
}
