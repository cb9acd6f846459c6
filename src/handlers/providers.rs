use actix_web::{delete, get, post, put, web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use super::{current_provider, current_user};
use crate::auth::AuthUser;
use crate::database::{Database, ServiceRemoval};
use crate::errors::ApiError;
use crate::models::{
    ApiResponse, CreateServiceRequest, Provider, ProviderProfileRequest, Service,
    UpdateServiceRequest,
};

async fn owned_service(db: &Database, provider: &Provider, service_id: Uuid) -> Result<Service, ApiError> {
    let service = db
        .get_service(service_id)
        .await?
        .ok_or(ApiError::NotFound("Service"))?;

    if service.provider_id != provider.id {
        return Err(ApiError::Forbidden("This service belongs to another provider".into()));
    }

    Ok(service)
}

// ============================================================================
// PROVIDER PROFILE
// ============================================================================

#[post("/provider-service/profile")]
pub async fn create_profile(
    auth: AuthUser,
    db: web::Data<Database>,
    payload: web::Json<ProviderProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()?;

    let user = current_user(&db, &auth).await?;
    if db.get_provider_by_user(user.id).await?.is_some() {
        return Err(ApiError::Conflict("Provider profile already exists".into()));
    }

    let provider = db.create_provider(body.into_new_provider(user.id)).await?;
    log::info!("Provider profile {} created for user {}", provider.id, user.id);
    Ok(HttpResponse::Created().json(ApiResponse::success(provider)))
}

#[get("/provider-service/profile")]
pub async fn get_profile(auth: AuthUser, db: web::Data<Database>) -> Result<HttpResponse, ApiError> {
    let provider = current_provider(&db, &auth).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(provider)))
}

#[put("/provider-service/profile")]
pub async fn update_profile(
    auth: AuthUser,
    db: web::Data<Database>,
    payload: web::Json<ProviderProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()?;

    let mut provider = current_provider(&db, &auth).await?;
    body.apply_to_existing(&mut provider);

    let updated = db.update_provider_profile(provider).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
}

#[get("/provider-service/stats")]
pub async fn get_stats(auth: AuthUser, db: web::Data<Database>) -> Result<HttpResponse, ApiError> {
    let provider = current_provider(&db, &auth).await?;
    let stats = db.get_provider_stats(&provider).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(stats)))
}

// ============================================================================
// PROVIDER SERVICES
// ============================================================================

#[get("/provider-service/services")]
pub async fn list_own_services(
    auth: AuthUser,
    db: web::Data<Database>,
) -> Result<HttpResponse, ApiError> {
    let provider = current_provider(&db, &auth).await?;
    let services = db.list_services_for_provider(provider.id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(services)))
}

#[post("/provider-service/services")]
pub async fn create_service(
    auth: AuthUser,
    db: web::Data<Database>,
    payload: web::Json<CreateServiceRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()?;

    let provider = current_provider(&db, &auth).await?;
    let service = db.create_service(body.into_new_service(provider.id)).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(service)))
}

#[put("/provider-service/services/{service_id}")]
pub async fn update_service(
    auth: AuthUser,
    db: web::Data<Database>,
    service_id: web::Path<Uuid>,
    payload: web::Json<UpdateServiceRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()?;

    let provider = current_provider(&db, &auth).await?;
    let mut service = owned_service(&db, &provider, service_id.into_inner()).await?;
    body.apply_to_existing(&mut service);

    let updated = db.update_service(service).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
}

#[delete("/provider-service/services/{service_id}")]
pub async fn delete_service(
    auth: AuthUser,
    db: web::Data<Database>,
    service_id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let provider = current_provider(&db, &auth).await?;
    let service = owned_service(&db, &provider, service_id.into_inner()).await?;

    match db.delete_service(service.id).await {
        Ok(ServiceRemoval::Deleted) => Ok(HttpResponse::NoContent().finish()),
        Ok(ServiceRemoval::Deactivated) => {
            log::info!("Service {} has bookings; deactivated instead of deleted", service.id);
            Ok(HttpResponse::NoContent().finish())
        }
        Err(sqlx::Error::RowNotFound) => Err(ApiError::NotFound("Service")),
        Err(err) => Err(err.into()),
    }
}
