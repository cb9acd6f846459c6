use uuid::Uuid;

use super::Database;
use crate::models::{NewNotification, NewProvider, Provider, VerificationStatus};

impl Database {
    /// Inserts the provider profile and promotes a customer to the provider role.
    pub async fn create_provider(&self, provider: NewProvider) -> Result<Provider, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let NewProvider {
            id,
            user_id,
            business_name,
            description,
            phone,
            email,
            address,
            city,
            experience_years,
        } = provider;

        let record = sqlx::query_as::<_, Provider>(
            r#"
            INSERT INTO providers (
                id,
                user_id,
                business_name,
                description,
                phone,
                email,
                address,
                city,
                experience_years,
                verification_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(business_name)
        .bind(description)
        .bind(phone)
        .bind(email)
        .bind(address)
        .bind(city)
        .bind(experience_years)
        .fetch_one(&mut *tx)
        .await?;

        Self::promote_to_provider_with_tx(&mut tx, user_id).await?;

        tx.commit().await?;

        Ok(record)
    }

    pub async fn get_provider(&self, provider_id: Uuid) -> Result<Option<Provider>, sqlx::Error> {
        sqlx::query_as::<_, Provider>("SELECT * FROM providers WHERE id = $1")
            .bind(provider_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_provider_by_user(&self, user_id: Uuid) -> Result<Option<Provider>, sqlx::Error> {
        sqlx::query_as::<_, Provider>("SELECT * FROM providers WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Persists profile fields. Verification and rating columns are owned by
    /// their own workflows and are not touched here.
    pub async fn update_provider_profile(&self, provider: Provider) -> Result<Provider, sqlx::Error> {
        sqlx::query_as::<_, Provider>(
            r#"
            UPDATE providers
            SET
                business_name = $2,
                description = $3,
                phone = $4,
                email = $5,
                address = $6,
                city = $7,
                experience_years = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(provider.id)
        .bind(provider.business_name)
        .bind(provider.description)
        .bind(provider.phone)
        .bind(provider.email)
        .bind(provider.address)
        .bind(provider.city)
        .bind(provider.experience_years)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_approved_providers(
        &self,
        city: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Provider>, sqlx::Error> {
        sqlx::query_as::<_, Provider>(
            r#"
            SELECT * FROM providers
            WHERE verification_status = 'approved'
              AND ($1::text IS NULL OR city ILIKE $1)
            ORDER BY rating_average DESC, business_name ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(city)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_pending_providers(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Provider>, sqlx::Error> {
        sqlx::query_as::<_, Provider>(
            r#"
            SELECT * FROM providers
            WHERE verification_status = 'pending'
            ORDER BY created_at ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    /// Applies an admin verification decision and notifies the provider.
    pub async fn record_verification(
        &self,
        provider_id: Uuid,
        status: VerificationStatus,
        notes: Option<String>,
        admin_id: Uuid,
        notification: NewNotification,
    ) -> Result<Provider, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, Provider>(
            r#"
            UPDATE providers
            SET
                verification_status = $2,
                verification_notes = $3,
                verified_by = $4,
                verified_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(provider_id)
        .bind(status)
        .bind(notes)
        .bind(admin_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_notification_with_tx(&mut tx, notification).await?;

        tx.commit().await?;

        Ok(record)
    }
}
