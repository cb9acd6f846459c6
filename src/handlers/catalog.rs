use actix_web::{get, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::PaginationQuery;
use crate::database::Database;
use crate::errors::ApiError;
use crate::models::{ApiResponse, PublicProvider, VerificationStatus};

// ============================================================================
// PUBLIC CATALOG
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServiceFilterQuery {
    pub category_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderFilterQuery {
    pub city: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[get("/categories")]
pub async fn list_categories(db: web::Data<Database>) -> Result<HttpResponse, ApiError> {
    let categories = db.list_categories().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(categories)))
}

#[get("/services")]
pub async fn list_services(
    db: web::Data<Database>,
    query: web::Query<ServiceFilterQuery>,
) -> Result<HttpResponse, ApiError> {
    let (limit, offset) = PaginationQuery::new(query.limit, query.offset).normalize();
    let services = db
        .list_public_services(query.category_id, query.provider_id, limit, offset)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(services)))
}

#[get("/services/{service_id}")]
pub async fn get_service(
    db: web::Data<Database>,
    service_id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let service = db
        .get_public_service(service_id.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Service"))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(service)))
}

#[get("/providers")]
pub async fn list_providers(
    db: web::Data<Database>,
    query: web::Query<ProviderFilterQuery>,
) -> Result<HttpResponse, ApiError> {
    let (limit, offset) = PaginationQuery::new(query.limit, query.offset).normalize();
    let providers: Vec<PublicProvider> = db
        .list_approved_providers(query.city.as_deref(), limit, offset)
        .await?
        .into_iter()
        .map(PublicProvider::from)
        .collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(providers)))
}

#[get("/providers/{provider_id}")]
pub async fn get_provider(
    db: web::Data<Database>,
    provider_id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let provider = db
        .get_provider(provider_id.into_inner())
        .await?
        .filter(|p| p.verification_status != VerificationStatus::Rejected)
        .ok_or(ApiError::NotFound("Provider"))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(PublicProvider::from(provider))))
}
