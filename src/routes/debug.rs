use actix_web::{web, HttpResponse, Responder};

use crate::models::ErrorResponse;
use crate::routes::interactions::AppState;
use crate::services::{RelationshipStore, StoreError};

/// Unauthenticated inspection routes, mounted only when
/// `server.enable_debug_routes` is set
pub fn configure<S: RelationshipStore>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/debug")
            .route("/likes", web::get().to(dump_likes::<S>))
            .route("/matches", web::get().to(dump_matches::<S>))
            .route("/blocks", web::get().to(dump_blocks::<S>))
            .route("/clear", web::post().to(clear::<S>)),
    );
}

fn store_failure(e: StoreError) -> HttpResponse {
    tracing::error!("Debug route store failure: {}", e);
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: "store_error".to_string(),
        message: e.to_string(),
        status_code: 500,
    })
}

async fn dump_likes<S: RelationshipStore>(state: web::Data<AppState<S>>) -> impl Responder {
    match state.engine.store().all_likes().await {
        Ok(likes) => HttpResponse::Ok().json(likes),
        Err(e) => store_failure(e),
    }
}

async fn dump_matches<S: RelationshipStore>(state: web::Data<AppState<S>>) -> impl Responder {
    match state.engine.store().all_matches().await {
        Ok(matches) => HttpResponse::Ok().json(matches),
        Err(e) => store_failure(e),
    }
}

async fn dump_blocks<S: RelationshipStore>(state: web::Data<AppState<S>>) -> impl Responder {
    match state.engine.store().all_blocks().await {
        Ok(blocks) => HttpResponse::Ok().json(blocks),
        Err(e) => store_failure(e),
    }
}

async fn clear<S: RelationshipStore>(state: web::Data<AppState<S>>) -> impl Responder {
    match state.engine.store().clear().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "status": "cleared" })),
        Err(e) => store_failure(e),
    }
}
