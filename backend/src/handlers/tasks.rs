use actix_web::{web, HttpResponse, Result};
use uuid::Uuid;

use crate::models::AppState;
use crate::services::progress::ProgressError;
use crate::services::store::{self, StoreError};
use shared::{ApiError, ApiSuccess, CreateTaskRequest, ToggleTaskResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users/{user_id}/tasks")
            .route("", web::post().to(create_task))
            .route("/generate", web::post().to(generate_tasks))
            .route("/{task_id}", web::delete().to(delete_task))
            .route("/{task_id}/toggle", web::post().to(toggle_task)),
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
        StoreError::Progress(ProgressError::TaskNotFound) => {
            HttpResponse::NotFound().json(ApiError {
                error: "not_found".to_string(),
                message: "Task not found".to_string(),
            })
        }
        StoreError::Progress(ProgressError::Validation(e)) => {
            HttpResponse::BadRequest().json(ApiError {
                error: "validation_error".to_string(),
                message: e.to_string(),
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

async fn create_task(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CreateTaskRequest>,
) -> Result<HttpResponse> {
    let user_id = match Uuid::parse_str(&path.into_inner()) {
        Ok(id) => id,
        Err(_) => return Ok(invalid_id("user ID")),
    };

    match store::create_task(&state.db, &user_id, &body).await {
        Ok(task) => Ok(HttpResponse::Created().json(ApiSuccess::new(task))),
        Err(e) => Ok(store_error_response("creating task", e)),
    }
}

async fn generate_tasks(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = match Uuid::parse_str(&path.into_inner()) {
        Ok(id) => id,
        Err(_) => return Ok(invalid_id("user ID")),
    };

    match store::generate_new_tasks(&state.db, &user_id).await {
        Ok(tasks) => Ok(HttpResponse::Ok().json(ApiSuccess::new(tasks))),
        Err(e) => Ok(store_error_response("generating tasks", e)),
    }
}

async fn delete_task(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (raw_user_id, raw_task_id) = path.into_inner();
    let user_id = match Uuid::parse_str(&raw_user_id) {
        Ok(id) => id,
        Err(_) => return Ok(invalid_id("user ID")),
    };
    let task_id = match Uuid::parse_str(&raw_task_id) {
        Ok(id) => id,
        Err(_) => return Ok(invalid_id("task ID")),
    };

    match store::delete_task(&state.db, &user_id, &task_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiSuccess::new(serde_json::json!({
            "deleted": true
        })))),
        Err(e) => Ok(store_error_response("deleting task", e)),
    }
}

async fn toggle_task(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (raw_user_id, raw_task_id) = path.into_inner();
    let user_id = match Uuid::parse_str(&raw_user_id) {
        Ok(id) => id,
        Err(_) => return Ok(invalid_id("user ID")),
    };
    let task_id = match Uuid::parse_str(&raw_task_id) {
        Ok(id) => id,
        Err(_) => return Ok(invalid_id("task ID")),
    };

    let behavior = state.config.uncomplete_behavior;
    match store::toggle_task(&state.db, &user_id, &task_id, behavior).await {
        Ok(outcome) => {
            let message = if outcome.completed {
                format!("Task completed! +{} points", outcome.points_delta)
            } else {
                "Task uncompleted".to_string()
            };
            Ok(HttpResponse::Ok().json(ApiSuccess::new(ToggleTaskResponse {
                success: true,
                points_earned: outcome.completed.then_some(outcome.points_delta),
                message,
            })))
        }
        Err(e) => Ok(store_error_response("toggling task", e)),
    }
}
