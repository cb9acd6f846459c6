use actix_web::{get, web, HttpResponse, Responder};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::database::Database;
use crate::errors::ApiError;
use crate::models::{Provider, User, UserRole};

pub mod admin;
pub mod bookings;
pub mod catalog;
pub mod notifications;
pub mod providers;
pub mod users;


const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationQuery {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self { limit, offset }
    }

    /// `(limit, offset)` with the limit clamped to 1..=100 and the offset floored at 0.
    pub fn normalize(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Profile row of the authenticated caller.
pub(crate) async fn current_user(db: &Database, auth: &AuthUser) -> Result<User, ApiError> {
    db.get_user(auth.id)
        .await?
        .ok_or(ApiError::NotFound("User profile"))
}

pub(crate) async fn require_admin(db: &Database, auth: &AuthUser) -> Result<User, ApiError> {
    let user = current_user(db, auth).await?;
    if user.role != UserRole::Admin {
        return Err(ApiError::Forbidden("Admin access required".into()));
    }
    Ok(user)
}

/// Provider profile owned by the authenticated caller.
pub(crate) async fn current_provider(db: &Database, auth: &AuthUser) -> Result<Provider, ApiError> {
    db.get_provider_by_user(auth.id)
        .await?
        .ok_or(ApiError::NotFound("Provider profile"))
}

// ============================================================================
// HEALTH CHECK
// ============================================================================

#[get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "instaserve-api",
        "timestamp": chrono::Utc::now()
    }))
}

/// Registers every route under the caller's scope. Static segments are
/// registered before `{id}` captures that would otherwise shadow them.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Health
        .service(health_check)
        // Users
        .service(users::register_profile)
        .service(users::get_profile)
        .service(users::update_profile)
        // Catalog
        .service(catalog::list_categories)
        .service(catalog::list_services)
        .service(catalog::get_service)
        .service(catalog::list_providers)
        .service(catalog::get_provider)
        // booking-service
        .service(bookings::quote_booking)
        .service(bookings::create_booking)
        .service(bookings::list_bookings)
        .service(bookings::list_payments)
        .service(bookings::list_provider_reviews)
        .service(bookings::get_booking)
        .service(bookings::update_booking_status)
        .service(bookings::cancel_booking)
        .service(bookings::pay_booking)
        .service(bookings::review_booking)
        // notification-service
        .service(notifications::list_notifications)
        .service(notifications::unread_count)
        .service(notifications::mark_all_read)
        .service(notifications::send_notification)
        .service(notifications::mark_read)
        .service(notifications::delete_notification)
        // provider-service
        .service(providers::create_profile)
        .service(providers::get_profile)
        .service(providers::update_profile)
        .service(providers::list_own_services)
        .service(providers::create_service)
        .service(providers::update_service)
        .service(providers::delete_service)
        .service(providers::get_stats)
        // Admin
        .service(admin::list_pending_providers)
        .service(admin::verify_provider)
        .service(admin::list_users)
        .service(admin::get_stats)
        .service(admin::create_category);
}
