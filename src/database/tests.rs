//! Tests against a live Postgres. Each `#[sqlx::test]` gets a fresh database
//! with `migrations/` applied.

use chrono::{Duration, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Database, ServiceRemoval};
use crate::errors::ApiError;
use crate::models::{
    Booking, BookingStatus, NewBooking, NewNotification, NewPayment, NewProvider, NewReview,
    NewService, PaymentReceipt, PaymentStatus, Provider, Service, User, UserRole,
    VerificationStatus,
};
use crate::pricing::{self, CommissionRate};

pub(crate) struct Marketplace {
    pub admin: User,
    pub customer: User,
    pub provider_user: User,
    pub provider: Provider,
    pub service: Service,
}

pub(crate) async fn seed_user(db: &Database, role: UserRole) -> User {
    let id = Uuid::new_v4();
    db.upsert_user(id, &format!("{id}@example.com"), "Test User", None, None, role)
        .await
        .unwrap()
}

/// Admin, customer and a provider offering one service at 1000 per hour.
pub(crate) async fn seed_marketplace(db: &Database, verification: VerificationStatus) -> Marketplace {
    let admin = seed_user(db, UserRole::Customer).await;
    sqlx::query("UPDATE users SET role = 'admin' WHERE id = $1")
        .bind(admin.id)
        .execute(&db.pool)
        .await
        .unwrap();
    let admin = db.get_user(admin.id).await.unwrap().unwrap();

    let customer = seed_user(db, UserRole::Customer).await;
    let provider_user = seed_user(db, UserRole::Customer).await;

    let mut provider = db
        .create_provider(NewProvider {
            id: Uuid::new_v4(),
            user_id: provider_user.id,
            business_name: "Spotless Cleaning".into(),
            description: None,
            phone: Some("+15550100".into()),
            email: Some("hello@spotless.example".into()),
            address: Some("1 Main Street".into()),
            city: Some("Springfield".into()),
            experience_years: 4,
        })
        .await
        .unwrap();

    if verification != VerificationStatus::Pending {
        let notes = (verification == VerificationStatus::Rejected).then(|| "incomplete documents".to_string());
        provider = db
            .record_verification(
                provider.id,
                verification,
                notes.clone(),
                admin.id,
                NewNotification::verification_decided(provider_user.id, verification, notes.as_deref()),
            )
            .await
            .unwrap();
    }

    let category = db
        .create_category(&format!("Cleaning {}", Uuid::new_v4()), None, None)
        .await
        .unwrap();
    let service = db
        .create_service(NewService {
            id: Uuid::new_v4(),
            provider_id: provider.id,
            category_id: category.id,
            title: "Deep clean".into(),
            description: None,
            hourly_rate: 1000,
        })
        .await
        .unwrap();

    let provider_user = db.get_user(provider_user.id).await.unwrap().unwrap();

    Marketplace {
        admin,
        customer,
        provider_user,
        provider,
        service,
    }
}

/// 09:00-11:30 next week: 3 billable hours, 3000 total.
pub(crate) async fn seed_booking(db: &Database, market: &Marketplace) -> Booking {
    let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    let end = NaiveTime::from_hms_opt(11, 30, 0).unwrap();
    let quote = pricing::quote(start, end, market.service.hourly_rate, CommissionRate::default()).unwrap();

    let booking = NewBooking {
        id: Uuid::new_v4(),
        customer_id: market.customer.id,
        provider_id: market.provider.id,
        service_id: market.service.id,
        booking_date: Utc::now().date_naive() + Duration::days(7),
        start_time: start,
        end_time: end,
        duration_hours: quote.duration_hours,
        hourly_rate: quote.hourly_rate,
        total_amount: quote.total_amount,
        notes: None,
        address: None,
    };
    let notification =
        NewNotification::booking_created(market.provider_user.id, &booking, &market.service.title);

    db.create_booking(booking, notification).await.unwrap()
}

pub(crate) async fn pay(db: &Database, market: &Marketplace, booking: &Booking) -> Option<PaymentReceipt> {
    let split = CommissionRate::default().split(booking.total_amount).unwrap();
    let payment = NewPayment {
        id: Uuid::new_v4(),
        booking_id: booking.id,
        customer_id: booking.customer_id,
        provider_id: booking.provider_id,
        split,
        payment_method: "card".into(),
    };
    let notification = NewNotification::payment_received(market.provider_user.id, booking.id, &split);
    db.record_payment(payment, notification).await.unwrap()
}

async fn transition(
    db: &Database,
    market: &Marketplace,
    booking_id: Uuid,
    from: BookingStatus,
    to: BookingStatus,
) -> Option<Booking> {
    db.transition_booking(
        booking_id,
        from,
        to,
        market.provider_user.id,
        None,
        NewNotification::booking_status_changed(market.customer.id, booking_id, to),
    )
    .await
    .unwrap()
}

// ============================================================================
// BOOKINGS AND PAYMENTS
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn booking_snapshot_and_provider_notification(pool: PgPool) {
    let db = Database::from_pool(pool);
    let market = seed_marketplace(&db, VerificationStatus::Approved).await;

    let booking = seed_booking(&db, &market).await;
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.duration_hours, 3);
    assert_eq!(booking.total_amount, 3000);

    let unread = db.count_unread_notifications(market.provider_user.id).await.unwrap();
    // verification decision + new booking
    assert_eq!(unread, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn stale_transition_changes_nothing(pool: PgPool) {
    let db = Database::from_pool(pool);
    let market = seed_marketplace(&db, VerificationStatus::Approved).await;
    let booking = seed_booking(&db, &market).await;

    let confirmed = transition(&db, &market, booking.id, BookingStatus::Pending, BookingStatus::Confirmed).await;
    assert_eq!(confirmed.unwrap().status, BookingStatus::Confirmed);

    // A second request still believing the booking is pending loses.
    let stale = transition(&db, &market, booking.id, BookingStatus::Pending, BookingStatus::Cancelled).await;
    assert!(stale.is_none());

    let current = db.get_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(current.status, BookingStatus::Confirmed);
    assert!(current.cancelled_by.is_none());
    assert_eq!(db.count_unread_notifications(market.customer.id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn cancelling_records_reason_and_actor(pool: PgPool) {
    let db = Database::from_pool(pool);
    let market = seed_marketplace(&db, VerificationStatus::Approved).await;
    let booking = seed_booking(&db, &market).await;

    let cancelled = db
        .transition_booking(
            booking.id,
            BookingStatus::Pending,
            BookingStatus::Cancelled,
            market.customer.id,
            Some("plans changed".into()),
            NewNotification::booking_status_changed(market.provider_user.id, booking.id, BookingStatus::Cancelled),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("plans changed"));
    assert_eq!(cancelled.cancelled_by, Some(market.customer.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn paying_a_pending_booking_confirms_it_and_splits_commission(pool: PgPool) {
    let db = Database::from_pool(pool);
    let market = seed_marketplace(&db, VerificationStatus::Approved).await;
    let booking = seed_booking(&db, &market).await;

    let receipt = pay(&db, &market, &booking).await.unwrap();
    assert_eq!(receipt.booking.status, BookingStatus::Confirmed);
    assert_eq!(receipt.payment.amount, 3000);
    assert_eq!(receipt.payment.commission, 300);
    assert_eq!(receipt.payment.provider_amount, 2700);
    assert_eq!(receipt.payment.status, PaymentStatus::Completed);

    // One payment per booking.
    assert!(pay(&db, &market, &booking).await.is_none());
    let payments = db.list_payments_for_customer(market.customer.id, 10, 0).await.unwrap();
    assert_eq!(payments.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn booking_confirmed_by_provider_can_still_be_paid(pool: PgPool) {
    let db = Database::from_pool(pool);
    let market = seed_marketplace(&db, VerificationStatus::Approved).await;
    let booking = seed_booking(&db, &market).await;

    transition(&db, &market, booking.id, BookingStatus::Pending, BookingStatus::Confirmed)
        .await
        .unwrap();

    let receipt = pay(&db, &market, &booking).await.unwrap();
    assert_eq!(receipt.booking.status, BookingStatus::Confirmed);
    assert_eq!(receipt.payment.provider_amount, 2700);
}

#[sqlx::test(migrations = "./migrations")]
async fn finished_bookings_cannot_be_paid(pool: PgPool) {
    let db = Database::from_pool(pool);
    let market = seed_marketplace(&db, VerificationStatus::Approved).await;

    let booking = seed_booking(&db, &market).await;
    transition(&db, &market, booking.id, BookingStatus::Pending, BookingStatus::Cancelled)
        .await
        .unwrap();
    assert!(pay(&db, &market, &booking).await.is_none());

    let payments = db.list_payments_for_provider(market.provider.id, 10, 0).await.unwrap();
    assert!(payments.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn cancelling_a_paid_booking_refunds_the_payment(pool: PgPool) {
    let db = Database::from_pool(pool);
    let market = seed_marketplace(&db, VerificationStatus::Approved).await;
    let booking = seed_booking(&db, &market).await;

    pay(&db, &market, &booking).await.unwrap();
    assert_eq!(db.get_admin_stats().await.unwrap().total_commission, 300);

    let cancelled = transition(&db, &market, booking.id, BookingStatus::Confirmed, BookingStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    let payments = db.list_payments_for_customer(market.customer.id, 10, 0).await.unwrap();
    assert_eq!(payments[0].status, PaymentStatus::Refunded);
    assert_eq!(db.get_admin_stats().await.unwrap().total_commission, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn provider_earnings_count_completed_paid_bookings(pool: PgPool) {
    let db = Database::from_pool(pool);
    let market = seed_marketplace(&db, VerificationStatus::Approved).await;

    let done = seed_booking(&db, &market).await;
    pay(&db, &market, &done).await.unwrap();
    transition(&db, &market, done.id, BookingStatus::Confirmed, BookingStatus::InProgress)
        .await
        .unwrap();
    transition(&db, &market, done.id, BookingStatus::InProgress, BookingStatus::Completed)
        .await
        .unwrap();

    // Paid but not yet delivered.
    let open = seed_booking(&db, &market).await;
    pay(&db, &market, &open).await.unwrap();

    let stats = db.get_provider_stats(&market.provider).await.unwrap();
    assert_eq!(stats.total_earnings, 2700);

    let completed = stats
        .bookings
        .iter()
        .find(|row| row.status == BookingStatus::Completed)
        .map(|row| row.count);
    assert_eq!(completed, Some(1));
}

// ============================================================================
// REVIEWS
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn reviews_update_the_running_average_once_per_booking(pool: PgPool) {
    let db = Database::from_pool(pool);
    let market = seed_marketplace(&db, VerificationStatus::Approved).await;

    let mut reviewed = Vec::new();
    for rating in [5, 4] {
        let booking = seed_booking(&db, &market).await;
        let review = NewReview {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            customer_id: market.customer.id,
            provider_id: market.provider.id,
            rating,
            comment: None,
        };
        db.create_review(
            review,
            NewNotification::review_received(market.provider_user.id, booking.id, rating),
        )
        .await
        .unwrap();
        reviewed.push(booking);
    }

    let provider = db.get_provider(market.provider.id).await.unwrap().unwrap();
    assert_eq!(provider.rating_count, 2);
    assert!((provider.rating_average - 4.5).abs() < f64::EPSILON);

    let duplicate = NewReview {
        id: Uuid::new_v4(),
        booking_id: reviewed[0].id,
        customer_id: market.customer.id,
        provider_id: market.provider.id,
        rating: 1,
        comment: None,
    };
    let err = db
        .create_review(
            duplicate,
            NewNotification::review_received(market.provider_user.id, reviewed[0].id, 1),
        )
        .await
        .unwrap_err();
    assert!(matches!(ApiError::from(err), ApiError::Conflict(_)));

    // The failed insert left the aggregate untouched.
    let provider = db.get_provider(market.provider.id).await.unwrap().unwrap();
    assert_eq!(provider.rating_count, 2);
    assert_eq!(db.list_reviews_for_provider(provider.id, 10, 0).await.unwrap().len(), 2);
}

// ============================================================================
// CATALOG
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn booked_services_are_deactivated_instead_of_deleted(pool: PgPool) {
    let db = Database::from_pool(pool);
    let market = seed_marketplace(&db, VerificationStatus::Approved).await;
    seed_booking(&db, &market).await;

    let outcome = db.delete_service(market.service.id).await.unwrap();
    assert_eq!(outcome, ServiceRemoval::Deactivated);
    let kept = db.get_service(market.service.id).await.unwrap().unwrap();
    assert!(!kept.is_active);

    let unbooked = db
        .create_service(NewService {
            id: Uuid::new_v4(),
            provider_id: market.provider.id,
            category_id: market.service.category_id,
            title: "Window cleaning".into(),
            description: None,
            hourly_rate: 800,
        })
        .await
        .unwrap();
    assert_eq!(db.delete_service(unbooked.id).await.unwrap(), ServiceRemoval::Deleted);
    assert!(db.get_service(unbooked.id).await.unwrap().is_none());

    assert!(matches!(
        db.delete_service(unbooked.id).await,
        Err(sqlx::Error::RowNotFound)
    ));
}

#[sqlx::test(migrations = "./migrations")]
async fn catalog_only_exposes_services_of_approved_providers(pool: PgPool) {
    let db = Database::from_pool(pool);
    let pending = seed_marketplace(&db, VerificationStatus::Pending).await;
    let approved = seed_marketplace(&db, VerificationStatus::Approved).await;

    assert!(db.get_public_service(pending.service.id).await.unwrap().is_none());
    assert!(db.get_public_service(approved.service.id).await.unwrap().is_some());

    let listed = db.list_public_services(None, None, 50, 0).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, approved.service.id);

    let providers = db.list_approved_providers(Some("springfield"), 50, 0).await.unwrap();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].id, approved.provider.id);
}

// ============================================================================
// USERS AND PROVIDERS
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn registration_never_downgrades_admins_or_providers(pool: PgPool) {
    let db = Database::from_pool(pool);
    let market = seed_marketplace(&db, VerificationStatus::Pending).await;
    assert_eq!(market.provider_user.role, UserRole::Provider);

    let admin = db
        .upsert_user(market.admin.id, &market.admin.email, "Renamed Admin", None, None, UserRole::Customer)
        .await
        .unwrap();
    assert_eq!(admin.role, UserRole::Admin);
    assert_eq!(admin.full_name, "Renamed Admin");

    let provider_user = db
        .upsert_user(
            market.provider_user.id,
            &market.provider_user.email,
            "Provider Again",
            None,
            None,
            UserRole::Customer,
        )
        .await
        .unwrap();
    assert_eq!(provider_user.role, UserRole::Provider);

    let customer = db
        .upsert_user(market.customer.id, &market.customer.email, "Now Providing", None, None, UserRole::Provider)
        .await
        .unwrap();
    assert_eq!(customer.role, UserRole::Provider);
}

#[sqlx::test(migrations = "./migrations")]
async fn verification_is_recorded_with_the_deciding_admin(pool: PgPool) {
    let db = Database::from_pool(pool);
    let market = seed_marketplace(&db, VerificationStatus::Rejected).await;

    assert_eq!(market.provider.verification_status, VerificationStatus::Rejected);
    assert_eq!(market.provider.verified_by, Some(market.admin.id));
    assert!(market.provider.verified_at.is_some());
    assert_eq!(
        market.provider.verification_notes.as_deref(),
        Some("incomplete documents")
    );

    assert!(db.list_pending_providers(50, 0).await.unwrap().is_empty());
    assert_eq!(db.get_admin_stats().await.unwrap().pending_providers, 0);
}
