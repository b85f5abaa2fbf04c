// src/api/routes.rs
use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use super::handlers;
use crate::models::{FailureKind, SubmissionResult};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::QueryConfig::default().error_handler(query_error))
            .route("/health", web::get().to(handlers::health_check))
            .service(
                web::scope("/users")
                    .route("", web::post().to(handlers::register_user))
                    .route("", web::get().to(handlers::list_users))
            )
    );
}

/// Unreadable request bodies still answer with a result the renderer understands.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> Error {
    let body: SubmissionResult<()> = SubmissionResult::failure(FailureKind::InvalidInput, err.to_string());
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> Error {
    let body: SubmissionResult<()> = SubmissionResult::failure(FailureKind::InvalidInput, err.to_string());
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}
