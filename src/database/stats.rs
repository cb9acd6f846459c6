use uuid::Uuid;

use super::Database;
use crate::models::{AdminStats, BookingStatusCount, Provider, ProviderStats, RoleCount};

impl Database {
    pub async fn get_provider_stats(&self, provider: &Provider) -> Result<ProviderStats, sqlx::Error> {
        let bookings = self.count_bookings_by_status(Some(provider.id)).await?;

        let total_earnings = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(p.provider_amount), 0)::BIGINT
            FROM payments p
            JOIN bookings b ON b.id = p.booking_id
            WHERE p.provider_id = $1
              AND p.status = 'completed'
              AND b.status = 'completed'
            "#,
        )
        .bind(provider.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ProviderStats {
            bookings,
            total_earnings,
            rating_average: provider.rating_average,
            rating_count: provider.rating_count,
        })
    }

    pub async fn get_admin_stats(&self) -> Result<AdminStats, sqlx::Error> {
        let users = sqlx::query_as::<_, RoleCount>(
            "SELECT role, COUNT(*) AS count FROM users GROUP BY role ORDER BY role",
        )
        .fetch_all(&self.pool)
        .await?;

        let pending_providers = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM providers WHERE verification_status = 'pending'",
        )
        .fetch_one(&self.pool)
        .await?;

        let bookings = self.count_bookings_by_status(None).await?;

        let total_commission = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(commission), 0)::BIGINT FROM payments WHERE status = 'completed'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AdminStats {
            users,
            pending_providers,
            bookings,
            total_commission,
        })
    }

    async fn count_bookings_by_status(
        &self,
        provider_id: Option<Uuid>,
    ) -> Result<Vec<BookingStatusCount>, sqlx::Error> {
        sqlx::query_as::<_, BookingStatusCount>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM bookings
            WHERE ($1::uuid IS NULL OR provider_id = $1)
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await
    }
}
