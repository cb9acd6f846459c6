use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{require_admin, PaginationQuery};
use crate::auth::AuthUser;
use crate::database::Database;
use crate::errors::ApiError;
use crate::models::{
    ApiResponse, CreateCategoryRequest, NewNotification, UserRole, VerifyProviderRequest,
};

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<UserRole>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ============================================================================
// PROVIDER VERIFICATION
// ============================================================================

#[get("/admin/providers/pending")]
pub async fn list_pending_providers(
    auth: AuthUser,
    db: web::Data<Database>,
    query: web::Query<PaginationQuery>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&db, &auth).await?;
    let (limit, offset) = query.normalize();
    let providers = db.list_pending_providers(limit, offset).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(providers)))
}

#[post("/admin/providers/{provider_id}/verify")]
pub async fn verify_provider(
    auth: AuthUser,
    db: web::Data<Database>,
    provider_id: web::Path<Uuid>,
    payload: web::Json<VerifyProviderRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()?;
    body.validate_business_rules().map_err(ApiError::Validation)?;

    let admin = require_admin(&db, &auth).await?;
    let provider = db
        .get_provider(provider_id.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Provider"))?;

    let notification =
        NewNotification::verification_decided(provider.user_id, body.status, body.notes.as_deref());
    let updated = db
        .record_verification(provider.id, body.status, body.notes, admin.id, notification)
        .await?;

    log::info!(
        "Provider {} marked {:?} by admin {}",
        updated.id,
        updated.verification_status,
        admin.id
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
}

// ============================================================================
// USERS, STATS, CATEGORIES
// ============================================================================

#[get("/admin/users")]
pub async fn list_users(
    auth: AuthUser,
    db: web::Data<Database>,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&db, &auth).await?;
    let (limit, offset) = PaginationQuery::new(query.limit, query.offset).normalize();
    let users = db.list_users(query.role, limit, offset).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(users)))
}

#[get("/admin/stats")]
pub async fn get_stats(auth: AuthUser, db: web::Data<Database>) -> Result<HttpResponse, ApiError> {
    require_admin(&db, &auth).await?;
    let stats = db.get_admin_stats().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(stats)))
}

#[post("/admin/categories")]
pub async fn create_category(
    auth: AuthUser,
    db: web::Data<Database>,
    payload: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()?;

    require_admin(&db, &auth).await?;
    let category = db
        .create_category(&body.name, body.description.as_deref(), body.icon.as_deref())
        .await
        .map_err(|err| match ApiError::from(err) {
            ApiError::Conflict(_) => ApiError::Conflict(format!("Category '{}' already exists", body.name)),
            other => other,
        })?;
    Ok(HttpResponse::Created().json(ApiResponse::success(category)))
}
