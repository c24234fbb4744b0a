//! PostgreSQL-backed bills.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use hearth_application::{BillListQuery, BillRepository, ResourceDirectory};
use hearth_core::{AppError, AppResult, FamilyId, NonEmptyString};
use hearth_domain::{Bill, BillId, MemberId, ResourceRef, ResourceType};

/// PostgreSQL implementation of the bill repository port.
#[derive(Clone)]
pub struct PostgresBillRepository {
    pool: PgPool,
}

impl PostgresBillRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct BillRow {
    id: uuid::Uuid,
    family_id: uuid::Uuid,
    name: String,
    category: Option<String>,
    payee_name: Option<String>,
    anticipated_amount_cents: Option<i64>,
    notes: Option<String>,
    is_active: bool,
    created_by: uuid::Uuid,
    updated_by: Option<uuid::Uuid>,
}

impl TryFrom<BillRow> for Bill {
    type Error = AppError;

    fn try_from(row: BillRow) -> Result<Self, Self::Error> {
        let name = NonEmptyString::new(row.name).map_err(|error| {
            AppError::Internal(format!("failed to decode name of bill '{}': {error}", row.id))
        })?;

        Ok(Self {
            id: BillId::from_uuid(row.id),
            family_id: FamilyId::from_uuid(row.family_id),
            name,
            category: row.category,
            payee_name: row.payee_name,
            anticipated_amount_cents: row.anticipated_amount_cents,
            notes: row.notes,
            is_active: row.is_active,
            created_by: MemberId::from_uuid(row.created_by),
            updated_by: row.updated_by.map(MemberId::from_uuid),
        })
    }
}

#[async_trait]
impl BillRepository for PostgresBillRepository {
    async fn insert_bill(&self, bill: Bill) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bills (
                id,
                family_id,
                name,
                category,
                payee_name,
                anticipated_amount_cents,
                notes,
                is_active,
                created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(bill.id.as_uuid())
        .bind(bill.family_id.as_uuid())
        .bind(bill.name.as_str())
        .bind(bill.category)
        .bind(bill.payee_name)
        .bind(bill.anticipated_amount_cents)
        .bind(bill.notes)
        .bind(bill.is_active)
        .bind(bill.created_by.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert bill: {error}")))?;

        Ok(())
    }

    async fn find_bill(&self, family_id: FamilyId, bill_id: BillId) -> AppResult<Option<Bill>> {
        let row = sqlx::query_as::<_, BillRow>(
            r#"
            SELECT
                id,
                family_id,
                name,
                category,
                payee_name,
                anticipated_amount_cents,
                notes,
                is_active,
                created_by,
                updated_by
            FROM bills
            WHERE family_id = $1
                AND id = $2
            "#,
        )
        .bind(family_id.as_uuid())
        .bind(bill_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find bill: {error}")))?;

        row.map(Bill::try_from).transpose()
    }

    async fn list_active_bills(
        &self,
        family_id: FamilyId,
        query: &BillListQuery,
    ) -> AppResult<Vec<Bill>> {
        let search = query
            .search
            .as_deref()
            .map(|search| format!("%{}%", search.to_lowercase()));
        let rows = sqlx::query_as::<_, BillRow>(
            r#"
            SELECT
                id,
                family_id,
                name,
                category,
                payee_name,
                anticipated_amount_cents,
                notes,
                is_active,
                created_by,
                updated_by
            FROM bills
            WHERE family_id = $1
                AND is_active = TRUE
                AND ($2::TEXT IS NULL OR category = $2)
                AND (
                    $3::TEXT IS NULL
                    OR lower(name) LIKE $3
                    OR lower(coalesce(payee_name, '')) LIKE $3
                )
            ORDER BY name ASC
            "#,
        )
        .bind(family_id.as_uuid())
        .bind(query.category.as_deref())
        .bind(search)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list bills: {error}")))?;

        rows.into_iter().map(Bill::try_from).collect()
    }

    async fn update_bill(&self, bill: Bill) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bills
            SET name = $3,
                category = $4,
                payee_name = $5,
                anticipated_amount_cents = $6,
                notes = $7,
                updated_by = $8,
                updated_at = now()
            WHERE family_id = $1
                AND id = $2
            "#,
        )
        .bind(bill.family_id.as_uuid())
        .bind(bill.id.as_uuid())
        .bind(bill.name.as_str())
        .bind(bill.category)
        .bind(bill.payee_name)
        .bind(bill.anticipated_amount_cents)
        .bind(bill.notes)
        .bind(bill.updated_by.map(|member_id| member_id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update bill: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("bill '{}' not found", bill.id)));
        }

        Ok(())
    }

    async fn deactivate_bill(
        &self,
        family_id: FamilyId,
        bill_id: BillId,
        actor: MemberId,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bills
            SET is_active = FALSE,
                updated_by = $3,
                updated_at = now()
            WHERE family_id = $1
                AND id = $2
            "#,
        )
        .bind(family_id.as_uuid())
        .bind(bill_id.as_uuid())
        .bind(actor.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to deactivate bill: {error}")))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ResourceDirectory for PostgresBillRepository {
    async fn resource_in_family(
        &self,
        family_id: FamilyId,
        resource: &ResourceRef,
    ) -> AppResult<bool> {
        if resource.resource_type() != ResourceType::Bill {
            return Ok(true);
        }

        let Some(bill_id) = BillId::from_resource(resource) else {
            return Ok(false);
        };
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM bills
                WHERE family_id = $1
                    AND id = $2
            )
            "#,
        )
        .bind(family_id.as_uuid())
        .bind(bill_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to check bill ownership: {error}")))
    }
}
