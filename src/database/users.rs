use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::Database;
use crate::models::{User, UserRole};

impl Database {
    /// Creates the profile row for an authenticated user, or refreshes it.
    /// An existing admin keeps the admin role, and a user who owns a provider
    /// profile stays a provider.
    pub async fn upsert_user(
        &self,
        id: Uuid,
        email: &str,
        full_name: &str,
        phone: Option<&str>,
        avatar_url: Option<&str>,
        role: UserRole,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, full_name, phone, avatar_url, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                full_name = EXCLUDED.full_name,
                phone = EXCLUDED.phone,
                avatar_url = EXCLUDED.avatar_url,
                role = CASE
                    WHEN users.role = 'admin' THEN users.role
                    WHEN EXISTS (SELECT 1 FROM providers p WHERE p.user_id = users.id)
                        THEN 'provider'::user_role
                    ELSE EXCLUDED.role
                END,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(full_name)
        .bind(phone)
        .bind(avatar_url)
        .bind(role)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn update_user_profile(
        &self,
        user_id: Uuid,
        full_name: &str,
        phone: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET full_name = $2, phone = $3, avatar_url = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(full_name)
        .bind(phone)
        .bind(avatar_url)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_users(
        &self,
        role: Option<UserRole>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(role)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    pub(super) async fn promote_to_provider_with_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET role = 'provider', updated_at = NOW()
            WHERE id = $1 AND role = 'customer'
            "#,
        )
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}
