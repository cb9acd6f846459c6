use uuid::Uuid;

use super::Database;
use crate::models::{Booking, NewNotification, NewPayment, Payment, PaymentReceipt};

impl Database {
    /// Stores the single payment of an open booking with its commission split,
    /// confirms the booking if it was still pending and notifies the provider,
    /// all in one transaction.
    ///
    /// Returns `None` when the booking is finished or already paid.
    pub async fn record_payment(
        &self,
        payment: NewPayment,
        notification: NewNotification,
    ) -> Result<Option<PaymentReceipt>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET
                status = CASE WHEN status = 'pending' THEN 'confirmed'::booking_status ELSE status END,
                updated_at = NOW()
            WHERE id = $1
              AND status IN ('pending', 'confirmed', 'in_progress')
              AND NOT EXISTS (SELECT 1 FROM payments WHERE booking_id = $1)
            RETURNING *
            "#,
        )
        .bind(payment.booking_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(booking) = booking else {
            tx.rollback().await?;
            return Ok(None);
        };

        let NewPayment {
            id,
            booking_id,
            customer_id,
            provider_id,
            split,
            payment_method,
        } = payment;

        let record = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (
                id,
                booking_id,
                customer_id,
                provider_id,
                amount,
                commission,
                provider_amount,
                payment_method,
                status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'completed')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(booking_id)
        .bind(customer_id)
        .bind(provider_id)
        .bind(split.amount)
        .bind(split.commission)
        .bind(split.provider_amount)
        .bind(payment_method)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_notification_with_tx(&mut tx, notification).await?;

        tx.commit().await?;

        Ok(Some(PaymentReceipt {
            payment: record,
            booking,
        }))
    }

    pub async fn list_payments_for_customer(
        &self,
        customer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            SELECT * FROM payments
            WHERE customer_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(customer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_payments_for_provider(
        &self,
        provider_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            SELECT * FROM payments
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
