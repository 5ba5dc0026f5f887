use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

use crate::core::{InteractionEngine, InteractionError};
use crate::models::{BlockRequest, ErrorResponse, ExclusionsResponse, HealthResponse, SendMessageRequest, SignalRequest};
use crate::routes::auth::AuthenticatedUser;
use crate::services::{RelationshipStore, StoreError};

/// Application state shared across all handlers
pub struct AppState<S> {
    pub engine: InteractionEngine<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

/// Configure all interaction routes
pub fn configure<S: RelationshipStore>(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check::<S>))
        .route("/like", web::post().to(record_like::<S>))
        .route("/dislike", web::post().to(record_dislike::<S>))
        .route("/matches", web::get().to(list_matches::<S>))
        .route("/message", web::post().to(send_message::<S>))
        .route("/messages/{match_id}", web::get().to(list_messages::<S>))
        .route("/block", web::post().to(record_block::<S>))
        .route("/blocks", web::get().to(list_blocks::<S>))
        .route("/exclusions", web::get().to(list_exclusions::<S>));
}

/// HTTP status for each interaction error
pub fn status_for(err: &InteractionError) -> StatusCode {
    match err {
        InteractionError::SelfTarget => StatusCode::BAD_REQUEST,
        InteractionError::Duplicate(_) | InteractionError::ConflictingSignal { .. } => StatusCode::CONFLICT,
        InteractionError::Blocked | InteractionError::NotParticipant => StatusCode::FORBIDDEN,
        InteractionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: InteractionError) -> HttpResponse {
    let status = status_for(&err);

    if let InteractionError::Store(e) = &err {
        tracing::error!("Relationship store failure: {}", e);
    }

    HttpResponse::build(status).json(ErrorResponse {
        error: err.kind().to_string(),
        message: err.to_string(),
        status_code: status.as_u16(),
    })
}

fn validation_failed(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

fn store_status(result: Result<bool, StoreError>) -> &'static str {
    match result {
        Ok(true) => "healthy",
        Ok(false) => "degraded",
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            "degraded"
        }
    }
}

/// Health check endpoint
async fn health_check<S: RelationshipStore>(state: web::Data<AppState<S>>) -> impl Responder {
    let status = store_status(state.engine.store().health_check().await);

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Like a user
///
/// POST /api/v1/like
///
/// Request body:
/// ```json
/// { "target_id": "uuid" }
/// ```
///
/// Creates a match when the target already likes the caller.
async fn record_like<S: RelationshipStore>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    req: web::Json<SignalRequest>,
) -> impl Responder {
    match state.engine.record_like(user.id(), req.target_id).await {
        Ok(like) => HttpResponse::Created().json(like),
        Err(e) => error_response(e),
    }
}

/// Dislike a user
///
/// POST /api/v1/dislike
async fn record_dislike<S: RelationshipStore>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    req: web::Json<SignalRequest>,
) -> impl Responder {
    match state.engine.record_dislike(user.id(), req.target_id).await {
        Ok(dislike) => HttpResponse::Created().json(dislike),
        Err(e) => error_response(e),
    }
}

/// GET /api/v1/matches
async fn list_matches<S: RelationshipStore>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
) -> impl Responder {
    match state.engine.list_matches(user.id()).await {
        Ok(matches) => HttpResponse::Ok().json(matches),
        Err(e) => error_response(e),
    }
}

/// Send a message on a match
///
/// POST /api/v1/message
///
/// Request body:
/// ```json
/// { "match_id": "uuid", "content": "string" }
/// ```
async fn send_message<S: RelationshipStore>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    req: web::Json<SendMessageRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let SendMessageRequest { match_id, content } = req.into_inner();

    match state.engine.send_message(user.id(), match_id, content).await {
        Ok(message) => HttpResponse::Created().json(message),
        Err(e) => error_response(e),
    }
}

/// GET /api/v1/messages/{match_id}
async fn list_messages<S: RelationshipStore>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    match_id: web::Path<Uuid>,
) -> impl Responder {
    match state.engine.list_messages(user.id(), match_id.into_inner()).await {
        Ok(messages) => HttpResponse::Ok().json(messages),
        Err(e) => error_response(e),
    }
}

/// Block a user
///
/// POST /api/v1/block
///
/// Request body:
/// ```json
/// { "blocked_id": "uuid", "reason": "optional string" }
/// ```
///
/// Removes every like, dislike, match and message between the two users.
async fn record_block<S: RelationshipStore>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
    req: web::Json<BlockRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let BlockRequest { blocked_id, reason } = req.into_inner();

    match state.engine.record_block(user.id(), blocked_id, reason).await {
        Ok(block) => HttpResponse::Created().json(block),
        Err(e) => error_response(e),
    }
}

/// GET /api/v1/blocks
async fn list_blocks<S: RelationshipStore>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
) -> impl Responder {
    match state.engine.list_blocks(user.id()).await {
        Ok(blocks) => HttpResponse::Ok().json(blocks),
        Err(e) => error_response(e),
    }
}

/// Users the caller should no longer be shown
///
/// GET /api/v1/exclusions
async fn list_exclusions<S: RelationshipStore>(
    state: web::Data<AppState<S>>,
    user: AuthenticatedUser,
) -> impl Responder {
    match state.engine.list_exclusions(user.id()).await {
        Ok(ids) => HttpResponse::Ok().json(ExclusionsResponse {
            user_id: user.id(),
            count: ids.len(),
            excluded_user_ids: ids,
        }),
        Err(e) => error_response(e),
    }
}
