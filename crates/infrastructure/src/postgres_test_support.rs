//! Database fixtures for PostgreSQL repository tests.
//!
//! Tests are skipped when `DATABASE_URL` is not set.

use hearth_core::FamilyId;
use hearth_domain::{MemberId, MemberRole, Principal};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub(crate) async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres repository tests: {error}");
    }

    Some(pool)
}

pub(crate) async fn ensure_family(pool: &PgPool, family_id: FamilyId, name: &str) {
    let insert = sqlx::query(
        r#"
            INSERT INTO families (id, name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
    )
    .bind(family_id.as_uuid())
    .bind(name)
    .execute(pool)
    .await;

    assert!(insert.is_ok());
}

pub(crate) async fn insert_member(
    pool: &PgPool,
    family_id: FamilyId,
    role: MemberRole,
    display_name: &str,
) -> Principal {
    let id = MemberId::new();
    let email = format!("{id}@hearth.test");
    let insert = sqlx::query(
        r#"
            INSERT INTO family_members (id, family_id, email, display_name, role, initials)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
    )
    .bind(id.as_uuid())
    .bind(family_id.as_uuid())
    .bind(email.as_str())
    .bind(display_name)
    .bind(role.as_str())
    .bind(display_name.get(..1))
    .execute(pool)
    .await;

    assert!(insert.is_ok());

    Principal {
        id,
        family_id,
        role,
        email,
        display_name: display_name.to_owned(),
    }
}
