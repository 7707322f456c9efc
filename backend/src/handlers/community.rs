use actix_web::{web, HttpResponse, Result};
use uuid::Uuid;

use crate::models::AppState;
use crate::services::progress::ProgressError;
use crate::services::store::{self, StoreError};
use shared::{AddNotificationRequest, ApiError, ApiSuccess, JoinGroupResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users/{user_id}")
            .route("/groups/{group_id}/toggle", web::post().to(toggle_group))
            .route("/notifications", web::post().to(add_notification))
            .route(
                "/notifications/{notification_id}/read",
                web::post().to(mark_notification_read),
            ),
    );
}

fn invalid_id(what: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError {
        error: "invalid_id".to_string(),
        message: format!("Invalid {} format", what),
    })
}

fn store_error_response(context: &str, e: StoreError) -> HttpResponse {
    match e {
        StoreError::NotFound => HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "User not found".to_string(),
        }),
        StoreError::Progress(ProgressError::GroupNotFound) => {
            HttpResponse::NotFound().json(ApiError {
                error: "not_found".to_string(),
                message: "Study group not found".to_string(),
            })
        }
        StoreError::Progress(ProgressError::NotificationNotFound) => {
            HttpResponse::NotFound().json(ApiError {
                error: "not_found".to_string(),
                message: "Notification not found".to_string(),
            })
        }
        StoreError::Conflict => HttpResponse::Conflict().json(ApiError {
            error: "conflict".to_string(),
            message: "User data was modified concurrently".to_string(),
        }),
        e => {
            log::error!("Error {}: {:?}", context, e);
            HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: format!("Failed while {}", context),
            })
        }
    }
}

async fn toggle_group(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (raw_user_id, group_id) = path.into_inner();
    let user_id = match Uuid::parse_str(&raw_user_id) {
        Ok(id) => id,
        Err(_) => return Ok(invalid_id("user ID")),
    };

    match store::toggle_study_group(&state.db, &user_id, &group_id).await {
        Ok(joined) => Ok(HttpResponse::Ok().json(ApiSuccess::new(JoinGroupResponse { joined }))),
        Err(e) => Ok(store_error_response("toggling study group", e)),
    }
}

async fn add_notification(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<AddNotificationRequest>,
) -> Result<HttpResponse> {
    let user_id = match Uuid::parse_str(&path.into_inner()) {
        Ok(id) => id,
        Err(_) => return Ok(invalid_id("user ID")),
    };

    match store::add_notification(&state.db, &user_id, &body).await {
        Ok(notification_id) => Ok(HttpResponse::Created().json(ApiSuccess::new(
            serde_json::json!({ "id": notification_id }),
        ))),
        Err(e) => Ok(store_error_response("adding notification", e)),
    }
}

async fn mark_notification_read(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (raw_user_id, raw_notification_id) = path.into_inner();
    let user_id = match Uuid::parse_str(&raw_user_id) {
        Ok(id) => id,
        Err(_) => return Ok(invalid_id("user ID")),
    };
    let notification_id = match Uuid::parse_str(&raw_notification_id) {
        Ok(id) => id,
        Err(_) => return Ok(invalid_id("notification ID")),
    };

    match store::mark_notification_read(&state.db, &user_id, &notification_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiSuccess::new(serde_json::json!({
            "read": true
        })))),
        Err(e) => Ok(store_error_response("marking notification read", e)),
    }
}
