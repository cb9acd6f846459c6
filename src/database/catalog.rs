use uuid::Uuid;

use super::Database;
use crate::models::{NewService, Service, ServiceCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceRemoval {
    Deleted,
    Deactivated,
}

impl Database {
    // ========================================================================
    // CATEGORIES
    // ========================================================================

    pub async fn list_categories(&self) -> Result<Vec<ServiceCategory>, sqlx::Error> {
        sqlx::query_as::<_, ServiceCategory>("SELECT * FROM service_categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
        icon: Option<&str>,
    ) -> Result<ServiceCategory, sqlx::Error> {
        sqlx::query_as::<_, ServiceCategory>(
            r#"
            INSERT INTO service_categories (id, name, description, icon)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(icon)
        .fetch_one(&self.pool)
        .await
    }

    // ========================================================================
    // SERVICES
    // ========================================================================

    /// Active services of approved providers, for the public catalog.
    pub async fn list_public_services(
        &self,
        category_id: Option<Uuid>,
        provider_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"
            SELECT s.*
            FROM services s
            JOIN providers p ON p.id = s.provider_id
            WHERE s.is_active = TRUE
              AND p.verification_status = 'approved'
              AND ($1::uuid IS NULL OR s.category_id = $1)
              AND ($2::uuid IS NULL OR s.provider_id = $2)
            ORDER BY s.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(category_id)
        .bind(provider_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    /// A service as the public catalog shows it: active, offered by an
    /// approved provider.
    pub async fn get_public_service(&self, service_id: Uuid) -> Result<Option<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"
            SELECT s.*
            FROM services s
            JOIN providers p ON p.id = s.provider_id
            WHERE s.id = $1
              AND s.is_active = TRUE
              AND p.verification_status = 'approved'
            "#,
        )
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_service(&self, service_id: Uuid) -> Result<Option<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1")
            .bind(service_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list_services_for_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<Service>, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE provider_id = $1 ORDER BY created_at DESC",
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn create_service(&self, service: NewService) -> Result<Service, sqlx::Error> {
        let NewService {
            id,
            provider_id,
            category_id,
            title,
            description,
            hourly_rate,
        } = service;

        sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (id, provider_id, category_id, title, description, hourly_rate)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(provider_id)
        .bind(category_id)
        .bind(title)
        .bind(description)
        .bind(hourly_rate)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn update_service(&self, service: Service) -> Result<Service, sqlx::Error> {
        sqlx::query_as::<_, Service>(
            r#"
            UPDATE services
            SET
                category_id = $2,
                title = $3,
                description = $4,
                hourly_rate = $5,
                is_active = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(service.id)
        .bind(service.category_id)
        .bind(service.title)
        .bind(service.description)
        .bind(service.hourly_rate)
        .bind(service.is_active)
        .fetch_one(&self.pool)
        .await
    }

    /// Removes a service. Services already referenced by bookings are kept for
    /// history and deactivated instead; the return value tells which happened.
    pub async fn delete_service(&self, service_id: Uuid) -> Result<ServiceRemoval, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let has_bookings = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM bookings WHERE service_id = $1)",
        )
        .bind(service_id)
        .fetch_one(&mut *tx)
        .await?;

        let (statement, outcome) = if has_bookings {
            (
                "UPDATE services SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
                ServiceRemoval::Deactivated,
            )
        } else {
            ("DELETE FROM services WHERE id = $1", ServiceRemoval::Deleted)
        };

        let result = sqlx::query(statement)
            .bind(service_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        tx.commit().await?;

        Ok(outcome)
    }
}
