//! PostgreSQL-backed permission grants.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::warn;

use hearth_application::{GrantSummary, PermissionRepository};
use hearth_core::{AppError, AppResult, FamilyId};
use hearth_domain::{CapabilitySet, MemberId, MemberSummary, PermissionGrant, ResourceRef};

/// PostgreSQL implementation of the permission repository port.
#[derive(Clone)]
pub struct PostgresPermissionRepository {
    pool: PgPool,
}

impl PostgresPermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GrantRow {
    family_id: uuid::Uuid,
    resource_type: String,
    resource_id: String,
    granted_to: uuid::Uuid,
    granted_by: uuid::Uuid,
    can_view: bool,
    can_edit: bool,
    can_delete: bool,
    can_share: bool,
    expires_at: Option<DateTime<Utc>>,
    notes: Option<String>,
}

impl TryFrom<GrantRow> for PermissionGrant {
    type Error = AppError;

    fn try_from(row: GrantRow) -> Result<Self, Self::Error> {
        let resource = decode_resource(row.resource_type.as_str(), row.resource_id.as_str())?;

        Ok(Self {
            family_id: FamilyId::from_uuid(row.family_id),
            resource,
            granted_to: MemberId::from_uuid(row.granted_to),
            granted_by: MemberId::from_uuid(row.granted_by),
            capabilities: CapabilitySet {
                can_view: row.can_view,
                can_edit: row.can_edit,
                can_delete: row.can_delete,
                can_share: row.can_share,
            },
            expires_at: row.expires_at,
            notes: row.notes,
        })
    }
}

#[derive(Debug, FromRow)]
struct GrantSummaryRow {
    #[sqlx(flatten)]
    grant: GrantRow,
    created_at: DateTime<Utc>,
    grantee_name: String,
    grantee_initials: Option<String>,
    grantee_color: Option<String>,
    grantor_name: String,
    grantor_initials: Option<String>,
    grantor_color: Option<String>,
}

impl TryFrom<GrantSummaryRow> for GrantSummary {
    type Error = AppError;

    fn try_from(row: GrantSummaryRow) -> Result<Self, Self::Error> {
        let grant = PermissionGrant::try_from(row.grant)?;
        let granted_to = MemberSummary {
            id: grant.granted_to,
            display_name: row.grantee_name,
            initials: row.grantee_initials,
            color: row.grantee_color,
        };
        let granted_by = MemberSummary {
            id: grant.granted_by,
            display_name: row.grantor_name,
            initials: row.grantor_initials,
            color: row.grantor_color,
        };

        Ok(Self {
            grant,
            granted_to,
            granted_by,
            created_at: row.created_at,
        })
    }
}

pub(crate) fn decode_resource(resource_type: &str, resource_id: &str) -> AppResult<ResourceRef> {
    ResourceRef::parse(resource_type, resource_id).map_err(|error| {
        AppError::Internal(format!(
            "failed to decode resource '{resource_type}/{resource_id}': {error}"
        ))
    })
}

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    async fn find_grant(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
        member_id: MemberId,
    ) -> AppResult<Option<PermissionGrant>> {
        let row = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT
                family_id,
                resource_type,
                resource_id,
                granted_to,
                granted_by,
                can_view,
                can_edit,
                can_delete,
                can_share,
                expires_at,
                notes
            FROM permissions
            WHERE family_id = $1
                AND resource_type = $2
                AND resource_id = $3
                AND granted_to = $4
            "#,
        )
        .bind(family_id.as_uuid())
        .bind(resource.resource_type().as_str())
        .bind(resource.resource_id())
        .bind(member_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find permission grant: {error}")))?;

        row.map(PermissionGrant::try_from).transpose()
    }

    async fn upsert_grant(&self, grant: PermissionGrant) -> AppResult<()> {
        let family_id = grant.family_id;
        let resource = grant.resource.clone();
        let result = sqlx::query(
            r#"
            INSERT INTO permissions (
                family_id,
                resource_type,
                resource_id,
                granted_to,
                granted_by,
                can_view,
                can_edit,
                can_delete,
                can_share,
                expires_at,
                notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (resource_type, resource_id, granted_to) DO UPDATE
            SET granted_by = EXCLUDED.granted_by,
                can_view = EXCLUDED.can_view,
                can_edit = EXCLUDED.can_edit,
                can_delete = EXCLUDED.can_delete,
                can_share = EXCLUDED.can_share,
                expires_at = EXCLUDED.expires_at,
                notes = EXCLUDED.notes,
                updated_at = now()
            WHERE permissions.family_id = EXCLUDED.family_id
            "#,
        )
        .bind(grant.family_id.as_uuid())
        .bind(grant.resource.resource_type().as_str())
        .bind(grant.resource.resource_id())
        .bind(grant.granted_to.as_uuid())
        .bind(grant.granted_by.as_uuid())
        .bind(grant.capabilities.can_view)
        .bind(grant.capabilities.can_edit)
        .bind(grant.capabilities.can_delete)
        .bind(grant.capabilities.can_share)
        .bind(grant.expires_at)
        .bind(grant.notes)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to upsert permission grant: {error}"))
        })?;

        if result.rows_affected() == 0 {
            warn!(%family_id, %resource, "grant upsert hit a resource of another family");
            return Err(AppError::Conflict(format!(
                "resource '{resource}' belongs to another family"
            )));
        }

        Ok(())
    }

    async fn delete_grant(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
        member_id: MemberId,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM permissions
            WHERE family_id = $1
                AND resource_type = $2
                AND resource_id = $3
                AND granted_to = $4
            "#,
        )
        .bind(family_id.as_uuid())
        .bind(resource.resource_type().as_str())
        .bind(resource.resource_id())
        .bind(member_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to delete permission grant: {error}"))
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_grants(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
    ) -> AppResult<Vec<GrantSummary>> {
        let rows = sqlx::query_as::<_, GrantSummaryRow>(
            r#"
            SELECT
                permissions.family_id,
                permissions.resource_type,
                permissions.resource_id,
                permissions.granted_to,
                permissions.granted_by,
                permissions.can_view,
                permissions.can_edit,
                permissions.can_delete,
                permissions.can_share,
                permissions.expires_at,
                permissions.notes,
                permissions.created_at,
                grantee.display_name AS grantee_name,
                grantee.initials AS grantee_initials,
                grantee.color AS grantee_color,
                grantor.display_name AS grantor_name,
                grantor.initials AS grantor_initials,
                grantor.color AS grantor_color
            FROM permissions
            INNER JOIN family_members AS grantee
                ON grantee.id = permissions.granted_to
                AND grantee.family_id = permissions.family_id
            INNER JOIN family_members AS grantor
                ON grantor.id = permissions.granted_by
                AND grantor.family_id = permissions.family_id
            WHERE permissions.family_id = $1
                AND permissions.resource_type = $2
                AND permissions.resource_id = $3
            ORDER BY permissions.created_at ASC
            "#,
        )
        .bind(family_id.as_uuid())
        .bind(resource.resource_type().as_str())
        .bind(resource.resource_id())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list permission grants: {error}"))
        })?;

        rows.into_iter().map(GrantSummary::try_from).collect()
    }
}
