use uuid::Uuid;

use super::Database;
use crate::models::{Booking, BookingStatus, NewBooking, NewNotification};

impl Database {
    /// Inserts a pending booking and the provider's notification atomically.
    pub async fn create_booking(
        &self,
        booking: NewBooking,
        notification: NewNotification,
    ) -> Result<Booking, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let NewBooking {
            id,
            customer_id,
            provider_id,
            service_id,
            booking_date,
            start_time,
            end_time,
            duration_hours,
            hourly_rate,
            total_amount,
            notes,
            address,
        } = booking;

        let record = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                id,
                customer_id,
                provider_id,
                service_id,
                booking_date,
                start_time,
                end_time,
                duration_hours,
                hourly_rate,
                total_amount,
                status,
                notes,
                address
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending', $11, $12)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(customer_id)
        .bind(provider_id)
        .bind(service_id)
        .bind(booking_date)
        .bind(start_time)
        .bind(end_time)
        .bind(duration_hours)
        .bind(hourly_rate)
        .bind(total_amount)
        .bind(notes)
        .bind(address)
        .fetch_one(&mut *tx)
        .await?;

        Self::insert_notification_with_tx(&mut tx, notification).await?;

        tx.commit().await?;

        Ok(record)
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list_bookings_for_customer(
        &self,
        customer_id: Uuid,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE customer_id = $1
              AND ($2::booking_status IS NULL OR status = $2)
            ORDER BY booking_date DESC, start_time DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(customer_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_bookings_for_provider(
        &self,
        provider_id: Uuid,
        status: Option<BookingStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE provider_id = $1
              AND ($2::booking_status IS NULL OR status = $2)
            ORDER BY booking_date DESC, start_time DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(provider_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    /// Moves a booking from `from` to `to` and notifies the counter-party.
    /// Cancelling also marks the booking's payment, if any, as refunded.
    ///
    /// The update is guarded on the current status, so `None` means another
    /// request changed the booking first.
    pub async fn transition_booking(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
        actor_id: Uuid,
        reason: Option<String>,
        notification: NewNotification,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let cancelling = to == BookingStatus::Cancelled;
        let record = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET
                status = $3,
                cancellation_reason = CASE WHEN $4 THEN $5 ELSE cancellation_reason END,
                cancelled_by = CASE WHEN $4 THEN $6 ELSE cancelled_by END,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .bind(from)
        .bind(to)
        .bind(cancelling)
        .bind(reason)
        .bind(actor_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(record) = record else {
            tx.rollback().await?;
            return Ok(None);
        };

        if cancelling {
            let refunded = sqlx::query(
                "UPDATE payments SET status = 'refunded' WHERE booking_id = $1 AND status = 'completed'",
            )
            .bind(booking_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if refunded > 0 {
                log::info!("Payment for cancelled booking {} marked refunded", booking_id);
            }
        }

        Self::insert_notification_with_tx(&mut tx, notification).await?;

        tx.commit().await?;

        Ok(Some(record))
    }
}
