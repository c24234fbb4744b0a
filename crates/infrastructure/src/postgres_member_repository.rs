//! PostgreSQL-backed family member lookups.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use hearth_application::MemberRepository;
use hearth_core::{AppError, AppResult, FamilyId};
use hearth_domain::{MemberId, MemberRole, Principal};

/// PostgreSQL implementation of the member repository port.
#[derive(Clone)]
pub struct PostgresMemberRepository {
    pool: PgPool,
}

impl PostgresMemberRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct MemberRow {
    id: uuid::Uuid,
    family_id: uuid::Uuid,
    role: String,
    email: String,
    display_name: String,
}

impl TryFrom<MemberRow> for Principal {
    type Error = AppError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        let role = MemberRole::from_str(row.role.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode role '{}' of member '{}': {error}",
                row.role, row.id
            ))
        })?;

        Ok(Self {
            id: MemberId::from_uuid(row.id),
            family_id: FamilyId::from_uuid(row.family_id),
            role,
            email: row.email,
            display_name: row.display_name,
        })
    }
}

#[async_trait]
impl MemberRepository for PostgresMemberRepository {
    async fn find_active_member_by_email(&self, email: &str) -> AppResult<Option<Principal>> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, family_id, role, email, display_name
            FROM family_members
            WHERE lower(email) = lower($1)
                AND is_active = TRUE
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find family member: {error}")))?;

        row.map(Principal::try_from).transpose()
    }

    async fn find_active_member(
        &self,
        family_id: FamilyId,
        member_id: MemberId,
    ) -> AppResult<Option<Principal>> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, family_id, role, email, display_name
            FROM family_members
            WHERE family_id = $1
                AND id = $2
                AND is_active = TRUE
            "#,
        )
        .bind(family_id.as_uuid())
        .bind(member_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find family member: {error}")))?;

        row.map(Principal::try_from).transpose()
    }
}
