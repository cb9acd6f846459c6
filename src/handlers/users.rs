use actix_web::{get, post, put, web, HttpResponse};
use validator::Validate;

use super::current_user;
use crate::auth::AuthUser;
use crate::database::Database;
use crate::errors::ApiError;
use crate::models::{ApiResponse, RegisterProfileRequest, UpdateProfileRequest};

// ============================================================================
// USER PROFILE
// ============================================================================

#[post("/users/me")]
pub async fn register_profile(
    auth: AuthUser,
    db: web::Data<Database>,
    payload: web::Json<RegisterProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()?;

    let email = auth
        .email
        .clone()
        .ok_or_else(|| ApiError::Validation("Token carries no email address".into()))?;

    let user = db
        .upsert_user(
            auth.id,
            &email,
            &body.full_name,
            body.phone.as_deref(),
            body.avatar_url.as_deref(),
            body.role.into(),
        )
        .await?;

    log::info!("Profile registered for user {} as {:?}", user.id, user.role);
    Ok(HttpResponse::Ok().json(ApiResponse::success(user)))
}

#[get("/users/me")]
pub async fn get_profile(auth: AuthUser, db: web::Data<Database>) -> Result<HttpResponse, ApiError> {
    let user = current_user(&db, &auth).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(user)))
}

#[put("/users/me")]
pub async fn update_profile(
    auth: AuthUser,
    db: web::Data<Database>,
    payload: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()?;

    let user = db
        .update_user_profile(
            auth.id,
            &body.full_name,
            body.phone.as_deref(),
            body.avatar_url.as_deref(),
        )
        .await?
        .ok_or(ApiError::NotFound("User profile"))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(user)))
}
