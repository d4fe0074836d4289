use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, never exposed in JSON
    pub created_at: OffsetDateTime,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new user. Returns the raw sqlx error so callers can map a
    /// unique-constraint violation on email to a conflict. Generic over the
    /// executor so registration can run it inside a transaction.
    pub async fn insert<'e, E>(
        db: E,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> sqlx::Result<User>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }
}

/// Put a token on the denylist. `ON CONFLICT DO NOTHING` keeps logout
/// idempotent; `expires_at` lets expired rows be purged later.
pub async fn revoke_token(
    db: &PgPool,
    jti: Uuid,
    expires_at: OffsetDateTime,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO revoked_tokens (jti, expires_at)
        VALUES ($1, $2)
        ON CONFLICT (jti) DO NOTHING
        "#,
    )
    .bind(jti)
    .bind(expires_at)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn is_token_revoked(db: &PgPool, jti: Uuid) -> anyhow::Result<bool> {
    let revoked = sqlx::query_scalar::<_, bool>(
        r#"SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE jti = $1)"#,
    )
    .bind(jti)
    .fetch_one(db)
    .await?;
    Ok(revoked)
}
