// src/api/handlers/users.rs
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Result};
use serde::{Deserialize, Serialize};
use crate::api::AppState;
use crate::models::{FailureKind, ListQuery, RegistrationForm, SubmissionResult};

/// Raw registration fields; missing ones arrive as empty and fail validation.
#[derive(Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

fn status_for<T>(result: &SubmissionResult<T>, on_success: StatusCode) -> StatusCode {
    match result.kind() {
        None => on_success,
        Some(FailureKind::InvalidInput) => StatusCode::BAD_REQUEST,
        Some(FailureKind::RemoteRejection) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(FailureKind::TransportFailure) => StatusCode::BAD_GATEWAY,
    }
}

fn respond<T: Serialize>(result: SubmissionResult<T>, on_success: StatusCode) -> HttpResponse {
    HttpResponse::build(status_for(&result, on_success)).json(result)
}

pub async fn register_user(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let result = match RegistrationForm::new(&req.name, &req.email) {
        Ok(form) => state.service.submit(&form).await,
        Err(e) => {
            log::info!("Rejected registration before submitting: {}", e);
            SubmissionResult::from_error(&e)
        }
    };

    Ok(respond(result, StatusCode::CREATED))
}

pub async fn list_users(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let result = state.service.list_cached(&query).await;
    Ok(respond(result, StatusCode::OK))
}
