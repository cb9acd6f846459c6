use uuid::Uuid;

use super::Database;
use crate::models::{NewNotification, NewReview, Review};

impl Database {
    /// Stores a review, folds its rating into the provider's running average
    /// and notifies the provider.
    pub async fn create_review(
        &self,
        review: NewReview,
        notification: NewNotification,
    ) -> Result<Review, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let NewReview {
            id,
            booking_id,
            customer_id,
            provider_id,
            rating,
            comment,
        } = review;

        let record = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (id, booking_id, customer_id, provider_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(booking_id)
        .bind(customer_id)
        .bind(provider_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE providers
            SET
                rating_average = (rating_average * rating_count + $2) / (rating_count + 1),
                rating_count = rating_count + 1,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(provider_id)
        .bind(f64::from(rating))
        .execute(&mut *tx)
        .await?;

        Self::insert_notification_with_tx(&mut tx, notification).await?;

        tx.commit().await?;

        Ok(record)
    }

    pub async fn list_reviews_for_provider(
        &self,
        provider_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as::<_, Review>(
            r#"
            SELECT * FROM reviews
            WHERE provider_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(provider_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }
}
