//! PostgreSQL-backed encrypted credential bundles.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::warn;

use hearth_application::CredentialRepository;
use hearth_core::{AppError, AppResult, FamilyId};
use hearth_domain::{
    CredentialFields, CredentialMetadata, EncryptedCredentialBundle, Envelope, MemberId,
    ResourceRef,
};

use crate::postgres_permission_repository::decode_resource;

/// PostgreSQL implementation of the credential repository port.
#[derive(Clone)]
pub struct PostgresCredentialRepository {
    pool: PgPool,
}

impl PostgresCredentialRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct BundleRow {
    family_id: uuid::Uuid,
    resource_type: String,
    resource_id: String,
    account_number_encrypted: Option<String>,
    username_encrypted: Option<String>,
    password_encrypted: Option<String>,
    pin_encrypted: Option<String>,
    website: Option<String>,
    phone: Option<String>,
    notes: Option<String>,
}

impl TryFrom<BundleRow> for EncryptedCredentialBundle {
    type Error = AppError;

    fn try_from(row: BundleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            family_id: FamilyId::from_uuid(row.family_id),
            resource: decode_resource(row.resource_type.as_str(), row.resource_id.as_str())?,
            fields: CredentialFields {
                account_number: row.account_number_encrypted.map(Envelope::new),
                username: row.username_encrypted.map(Envelope::new),
                password: row.password_encrypted.map(Envelope::new),
                pin: row.pin_encrypted.map(Envelope::new),
            },
            metadata: CredentialMetadata {
                website: row.website,
                phone: row.phone,
                notes: row.notes,
            },
        })
    }
}

#[async_trait]
impl CredentialRepository for PostgresCredentialRepository {
    async fn find_bundle(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
    ) -> AppResult<Option<EncryptedCredentialBundle>> {
        let row = sqlx::query_as::<_, BundleRow>(
            r#"
            SELECT
                family_id,
                resource_type,
                resource_id,
                account_number_encrypted,
                username_encrypted,
                password_encrypted,
                pin_encrypted,
                website,
                phone,
                notes
            FROM encrypted_credentials
            WHERE family_id = $1
                AND resource_type = $2
                AND resource_id = $3
            "#,
        )
        .bind(family_id.as_uuid())
        .bind(resource.resource_type().as_str())
        .bind(resource.resource_id())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find credential bundle: {error}"))
        })?;

        row.map(EncryptedCredentialBundle::try_from).transpose()
    }

    async fn upsert_bundle(
        &self,
        bundle: EncryptedCredentialBundle,
        actor: MemberId,
    ) -> AppResult<()> {
        let fields = bundle.fields;
        let family_id = bundle.family_id;
        let resource = bundle.resource.clone();
        let result = sqlx::query(
            r#"
            INSERT INTO encrypted_credentials (
                family_id,
                resource_type,
                resource_id,
                account_number_encrypted,
                username_encrypted,
                password_encrypted,
                pin_encrypted,
                website,
                phone,
                notes,
                created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (resource_type, resource_id) DO UPDATE
            SET account_number_encrypted = EXCLUDED.account_number_encrypted,
                username_encrypted = EXCLUDED.username_encrypted,
                password_encrypted = EXCLUDED.password_encrypted,
                pin_encrypted = EXCLUDED.pin_encrypted,
                website = EXCLUDED.website,
                phone = EXCLUDED.phone,
                notes = EXCLUDED.notes,
                updated_by = EXCLUDED.created_by,
                updated_at = now()
            WHERE encrypted_credentials.family_id = EXCLUDED.family_id
            "#,
        )
        .bind(bundle.family_id.as_uuid())
        .bind(bundle.resource.resource_type().as_str())
        .bind(bundle.resource.resource_id())
        .bind(fields.account_number.map(String::from))
        .bind(fields.username.map(String::from))
        .bind(fields.password.map(String::from))
        .bind(fields.pin.map(String::from))
        .bind(bundle.metadata.website)
        .bind(bundle.metadata.phone)
        .bind(bundle.metadata.notes)
        .bind(actor.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to upsert credential bundle: {error}"))
        })?;

        if result.rows_affected() == 0 {
            warn!(%family_id, %resource, "credential upsert hit a resource of another family");
            return Err(AppError::Conflict(format!(
                "resource '{resource}' belongs to another family"
            )));
        }

        Ok(())
    }
}
