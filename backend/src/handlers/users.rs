use actix_web::{web, HttpResponse, Result};
use uuid::Uuid;

use crate::models::AppState;
use crate::services::store::StoreError;
use crate::services::users::{self as user_service, UserError};
use shared::{ApiError, ApiSuccess, CreateUserRequest, UpdateProfileRequest};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::post().to(create_user))
            .route("/{user_id}", web::get().to(get_user_data))
            .route("/{user_id}/profile", web::put().to(update_profile))
            .route("/{user_id}/reset", web::post().to(reset_user_data)),
    );
}

fn parse_user_id(raw: &str) -> Result<Uuid, HttpResponse> {
    Uuid::parse_str(raw).map_err(|_| {
        HttpResponse::BadRequest().json(ApiError {
            error: "invalid_id".to_string(),
            message: "Invalid user ID format".to_string(),
        })
    })
}

async fn create_user(
    state: web::Data<AppState>,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse> {
    match user_service::create_user(&state.db, &body).await {
        Ok(data) => Ok(HttpResponse::Created().json(ApiSuccess::new(data))),
        Err(UserError::Validation(e)) => Ok(HttpResponse::BadRequest().json(ApiError {
            error: "validation_error".to_string(),
            message: e.to_string(),
        })),
        Err(UserError::Store(StoreError::DuplicateEmail)) => {
            Ok(HttpResponse::Conflict().json(ApiError {
                error: "duplicate_email".to_string(),
                message: "A user with this email already exists".to_string(),
            }))
        }
        Err(e) => {
            log::error!("Error creating user: {:?}", e);
            Ok(HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Failed to create user".to_string(),
            }))
        }
    }
}

async fn get_user_data(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = match parse_user_id(&path.into_inner()) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match user_service::get_user_data(&state.db, &user_id).await {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiSuccess::new(data))),
        Err(UserError::Store(StoreError::NotFound)) => {
            Ok(HttpResponse::NotFound().json(ApiError {
                error: "not_found".to_string(),
                message: "User not found".to_string(),
            }))
        }
        Err(e) => {
            log::error!("Error loading user data: {:?}", e);
            Ok(HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Failed to load user data".to_string(),
            }))
        }
    }
}

async fn update_profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    let user_id = match parse_user_id(&path.into_inner()) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match user_service::update_profile(&state.db, &user_id, &body).await {
        Ok(user) => Ok(HttpResponse::Ok().json(ApiSuccess::new(user))),
        Err(UserError::Store(StoreError::NotFound)) => {
            Ok(HttpResponse::NotFound().json(ApiError {
                error: "not_found".to_string(),
                message: "User not found".to_string(),
            }))
        }
        Err(e) => {
            log::error!("Error updating profile: {:?}", e);
            Ok(HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Failed to update profile".to_string(),
            }))
        }
    }
}

async fn reset_user_data(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = match parse_user_id(&path.into_inner()) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match user_service::reset_user_data(&state.db, &user_id).await {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiSuccess::new(data))),
        Err(UserError::Store(StoreError::NotFound)) => {
            Ok(HttpResponse::NotFound().json(ApiError {
                error: "not_found".to_string(),
                message: "User not found".to_string(),
            }))
        }
        Err(e) => {
            log::error!("Error resetting user data: {:?}", e);
            Ok(HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Failed to reset user data".to_string(),
            }))
        }
    }
}
