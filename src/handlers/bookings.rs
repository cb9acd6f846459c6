use actix_web::{get, post, put, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{current_provider, current_user, PaginationQuery};
use crate::auth::AuthUser;
use crate::config::AppConfig;
use crate::database::Database;
use crate::errors::ApiError;
use crate::models::{
    ApiResponse, Booking, BookingActor, BookingStatus, CancelBookingRequest, CreateBookingRequest,
    CreateReviewRequest, NewNotification, NewPayment, NewReview, PaymentRequest, Perspective,
    QuoteRequest, Service, UpdateBookingStatusRequest, User,
};
use crate::pricing;

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    #[serde(rename = "as", default)]
    pub perspective: Perspective,
    pub status: Option<BookingStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentListQuery {
    #[serde(rename = "as", default)]
    pub perspective: Perspective,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

async fn bookable_service(db: &Database, service_id: Uuid) -> Result<Service, ApiError> {
    db.get_public_service(service_id)
        .await?
        .ok_or(ApiError::NotFound("Service"))
}

/// Loads a booking together with the caller's role on it; strangers get 404.
async fn booking_for_actor(
    db: &Database,
    user: &User,
    booking_id: Uuid,
) -> Result<(Booking, BookingActor, Uuid), ApiError> {
    let booking = db
        .get_booking(booking_id)
        .await?
        .ok_or(ApiError::NotFound("Booking"))?;
    let provider = db
        .get_provider(booking.provider_id)
        .await?
        .ok_or(ApiError::NotFound("Provider"))?;

    let actor = BookingActor::resolve(user, &booking, provider.user_id)
        .ok_or(ApiError::NotFound("Booking"))?;

    Ok((booking, actor, provider.user_id))
}

async fn apply_transition(
    db: &Database,
    user: &User,
    booking_id: Uuid,
    target: BookingStatus,
    reason: Option<String>,
) -> Result<Booking, ApiError> {
    let (booking, actor, provider_user_id) = booking_for_actor(db, user, booking_id).await?;

    if !actor.may_request(target) {
        return Err(ApiError::Forbidden(format!(
            "You cannot mark this booking as {}",
            target.as_str()
        )));
    }
    booking.status.ensure_transition(target).map_err(ApiError::Conflict)?;

    let recipient = match actor {
        BookingActor::Customer => provider_user_id,
        BookingActor::Provider | BookingActor::Admin => booking.customer_id,
    };
    let notification = NewNotification::booking_status_changed(recipient, booking.id, target);

    let updated = db
        .transition_booking(booking.id, booking.status, target, user.id, reason, notification)
        .await?
        .ok_or_else(|| ApiError::Conflict("Booking was modified by another request".into()))?;

    log::info!(
        "Booking {} moved {} -> {} by {:?} {}",
        updated.id,
        booking.status.as_str(),
        target.as_str(),
        actor,
        user.id
    );
    Ok(updated)
}

// ============================================================================
// BOOKING SERVICE
// ============================================================================

#[post("/booking-service/quote")]
pub async fn quote_booking(
    _auth: AuthUser,
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    payload: web::Json<QuoteRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate_business_rules(Utc::now().date_naive())
        .map_err(ApiError::Validation)?;

    let service = bookable_service(&db, body.service_id).await?;
    let quote = pricing::quote(
        body.start_time,
        body.end_time,
        service.hourly_rate,
        config.commission_rate,
    )?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(quote)))
}

#[post("/booking-service/create")]
pub async fn create_booking(
    auth: AuthUser,
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    payload: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()?;
    body.validate_business_rules(Utc::now().date_naive())
        .map_err(ApiError::Validation)?;

    let customer = current_user(&db, &auth).await?;
    let service = bookable_service(&db, body.service_id).await?;
    let provider = db
        .get_provider(service.provider_id)
        .await?
        .ok_or(ApiError::NotFound("Provider"))?;

    if provider.user_id == customer.id {
        return Err(ApiError::Validation("You cannot book your own service".into()));
    }

    let quote = pricing::quote(
        body.start_time,
        body.end_time,
        service.hourly_rate,
        config.commission_rate,
    )?;
    let new_booking = body.into_new_booking(customer.id, &service, &quote);
    let notification = NewNotification::booking_created(provider.user_id, &new_booking, &service.title);

    let booking = db.create_booking(new_booking, notification).await?;
    log::info!(
        "Booking {} created by {} for service {} ({} h, amount {})",
        booking.id,
        customer.id,
        service.id,
        booking.duration_hours,
        booking.total_amount
    );
    Ok(HttpResponse::Created().json(ApiResponse::success(booking)))
}

#[get("/booking-service/list")]
pub async fn list_bookings(
    auth: AuthUser,
    db: web::Data<Database>,
    query: web::Query<BookingListQuery>,
) -> Result<HttpResponse, ApiError> {
    let (limit, offset) = PaginationQuery::new(query.limit, query.offset).normalize();

    let bookings = match query.perspective {
        Perspective::Customer => {
            db.list_bookings_for_customer(auth.id, query.status, limit, offset)
                .await?
        }
        Perspective::Provider => {
            let provider = current_provider(&db, &auth).await?;
            db.list_bookings_for_provider(provider.id, query.status, limit, offset)
                .await?
        }
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(bookings)))
}

#[get("/booking-service/payments")]
pub async fn list_payments(
    auth: AuthUser,
    db: web::Data<Database>,
    query: web::Query<PaymentListQuery>,
) -> Result<HttpResponse, ApiError> {
    let (limit, offset) = PaginationQuery::new(query.limit, query.offset).normalize();

    let payments = match query.perspective {
        Perspective::Customer => db.list_payments_for_customer(auth.id, limit, offset).await?,
        Perspective::Provider => {
            let provider = current_provider(&db, &auth).await?;
            db.list_payments_for_provider(provider.id, limit, offset).await?
        }
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(payments)))
}

#[get("/booking-service/reviews/{provider_id}")]
pub async fn list_provider_reviews(
    _auth: AuthUser,
    db: web::Data<Database>,
    provider_id: web::Path<Uuid>,
    query: web::Query<PaginationQuery>,
) -> Result<HttpResponse, ApiError> {
    let (limit, offset) = query.normalize();
    let reviews = db
        .list_reviews_for_provider(provider_id.into_inner(), limit, offset)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(reviews)))
}

#[get("/booking-service/{booking_id}")]
pub async fn get_booking(
    auth: AuthUser,
    db: web::Data<Database>,
    booking_id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let user = current_user(&db, &auth).await?;
    let (booking, _actor, _) = booking_for_actor(&db, &user, booking_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(booking)))
}

#[put("/booking-service/{booking_id}/status")]
pub async fn update_booking_status(
    auth: AuthUser,
    db: web::Data<Database>,
    booking_id: web::Path<Uuid>,
    payload: web::Json<UpdateBookingStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()?;

    let user = current_user(&db, &auth).await?;
    let booking = apply_transition(&db, &user, booking_id.into_inner(), body.status, body.reason).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(booking)))
}

#[post("/booking-service/{booking_id}/cancel")]
pub async fn cancel_booking(
    auth: AuthUser,
    db: web::Data<Database>,
    booking_id: web::Path<Uuid>,
    payload: Option<web::Json<CancelBookingRequest>>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.map(|p| p.into_inner()).unwrap_or_default();
    body.validate()?;

    let user = current_user(&db, &auth).await?;
    let booking = apply_transition(
        &db,
        &user,
        booking_id.into_inner(),
        BookingStatus::Cancelled,
        body.reason,
    )
    .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(booking)))
}

#[post("/booking-service/{booking_id}/pay")]
pub async fn pay_booking(
    auth: AuthUser,
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    booking_id: web::Path<Uuid>,
    payload: web::Json<PaymentRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()?;

    let booking = db
        .get_booking(booking_id.into_inner())
        .await?
        .filter(|b| b.customer_id == auth.id)
        .ok_or(ApiError::NotFound("Booking"))?;

    if !booking.status.accepts_payment() {
        return Err(ApiError::Conflict(format!(
            "A {} booking can no longer be paid",
            booking.status.as_str()
        )));
    }

    let provider = db
        .get_provider(booking.provider_id)
        .await?
        .ok_or(ApiError::NotFound("Provider"))?;

    let split = config.commission_rate.split(booking.total_amount)?;
    let notification = NewNotification::payment_received(provider.user_id, booking.id, &split);
    let payment = NewPayment {
        id: Uuid::new_v4(),
        booking_id: booking.id,
        customer_id: booking.customer_id,
        provider_id: booking.provider_id,
        split,
        payment_method: body.payment_method,
    };

    let receipt = db
        .record_payment(payment, notification)
        .await?
        .ok_or_else(|| ApiError::Conflict("Booking has already been paid or is closed".into()))?;

    log::info!(
        "Payment {} recorded for booking {}: amount {}, commission {}, provider {}",
        receipt.payment.id,
        booking.id,
        split.amount,
        split.commission,
        split.provider_amount
    );
    Ok(HttpResponse::Created().json(ApiResponse::success(receipt)))
}

#[post("/booking-service/{booking_id}/review")]
pub async fn review_booking(
    auth: AuthUser,
    db: web::Data<Database>,
    booking_id: web::Path<Uuid>,
    payload: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()?;

    let booking = db
        .get_booking(booking_id.into_inner())
        .await?
        .filter(|b| b.customer_id == auth.id)
        .ok_or(ApiError::NotFound("Booking"))?;

    if booking.status != BookingStatus::Completed {
        return Err(ApiError::Conflict("Only completed bookings can be reviewed".into()));
    }

    let provider = db
        .get_provider(booking.provider_id)
        .await?
        .ok_or(ApiError::NotFound("Provider"))?;

    let notification = NewNotification::review_received(provider.user_id, booking.id, body.rating);
    let review = NewReview {
        id: Uuid::new_v4(),
        booking_id: booking.id,
        customer_id: booking.customer_id,
        provider_id: booking.provider_id,
        rating: body.rating,
        comment: body.comment,
    };

    let review = db.create_review(review, notification).await.map_err(|err| {
        match ApiError::from(err) {
            ApiError::Conflict(_) => ApiError::Conflict("This booking has already been reviewed".into()),
            other => other,
        }
    })?;

    Ok(HttpResponse::Created().json(ApiResponse::success(review)))
}
