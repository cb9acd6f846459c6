use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{require_admin, PaginationQuery};
use crate::auth::AuthUser;
use crate::database::Database;
use crate::errors::ApiError;
use crate::models::{ApiResponse, SendNotificationRequest};

#[derive(Debug, Deserialize)]
pub struct NotificationListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(default)]
    pub unread: bool,
}

// ============================================================================
// NOTIFICATION SERVICE
// ============================================================================

#[get("/notification-service/list")]
pub async fn list_notifications(
    auth: AuthUser,
    db: web::Data<Database>,
    query: web::Query<NotificationListQuery>,
) -> Result<HttpResponse, ApiError> {
    let (limit, offset) = PaginationQuery::new(query.limit, query.offset).normalize();
    let notifications = db
        .list_notifications(auth.id, query.unread, limit, offset)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(notifications)))
}

#[get("/notification-service/unread-count")]
pub async fn unread_count(auth: AuthUser, db: web::Data<Database>) -> Result<HttpResponse, ApiError> {
    let count = db.count_unread_notifications(auth.id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({ "count": count }))))
}

#[put("/notification-service/read-all")]
pub async fn mark_all_read(auth: AuthUser, db: web::Data<Database>) -> Result<HttpResponse, ApiError> {
    let updated = db.mark_all_notifications_read(auth.id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({ "updated": updated }))))
}

#[post("/notification-service/send")]
pub async fn send_notification(
    auth: AuthUser,
    db: web::Data<Database>,
    payload: web::Json<SendNotificationRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = payload.into_inner();
    body.validate()?;

    let admin = require_admin(&db, &auth).await?;
    if db.get_user(body.user_id).await?.is_none() {
        return Err(ApiError::NotFound("User"));
    }

    let notification = db.create_notification(body.into_new_notification()).await?;
    log::info!(
        "Admin {} sent notification {} to {}",
        admin.id,
        notification.id,
        notification.user_id
    );
    Ok(HttpResponse::Created().json(ApiResponse::success(notification)))
}

#[put("/notification-service/{notification_id}/read")]
pub async fn mark_read(
    auth: AuthUser,
    db: web::Data<Database>,
    notification_id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let notification = db
        .mark_notification_read(notification_id.into_inner(), auth.id)
        .await?
        .ok_or(ApiError::NotFound("Notification"))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(notification)))
}

#[delete("/notification-service/{notification_id}")]
pub async fn delete_notification(
    auth: AuthUser,
    db: web::Data<Database>,
    notification_id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    match db
        .delete_notification(notification_id.into_inner(), auth.id)
        .await
    {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(sqlx::Error::RowNotFound) => Err(ApiError::NotFound("Notification")),
        Err(err) => Err(err.into()),
    }
}
