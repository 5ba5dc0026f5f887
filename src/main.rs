use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpServer};
use lume_interactions::config::{LoggingSettings, ServerSettings, Settings, StorageBackend};
use lume_interactions::routes::{self, AppState, JwtVerifier};
use lume_interactions::{InMemoryStore, InteractionEngine, PostgresStore, RelationshipStore};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

fn build_cors(allowed_origins: &[String]) -> Cors {
    if allowed_origins.is_empty() {
        return Cors::permissive();
    }

    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers(vec![header::CONTENT_LENGTH])
        .supports_credentials()
        .max_age(12 * 60 * 60)
}

async fn serve<S: RelationshipStore>(
    store: Arc<S>,
    verifier: JwtVerifier,
    server: ServerSettings,
) -> std::io::Result<()> {
    let app_state = AppState {
        engine: InteractionEngine::new(store),
    };
    let verifier = web::Data::new(verifier);

    let host = server.host.clone();
    let port = server.port;
    let workers = server.workers.unwrap_or(4);
    let allowed_origins = server.allowed_origins.clone();
    let enable_debug = server.enable_debug_routes;

    if enable_debug {
        warn!("Debug routes enabled; /debug is unauthenticated");
    }

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(verifier.clone())
            .wrap(build_cors(&allowed_origins))
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(|cfg| routes::configure_routes::<S>(cfg, enable_debug))
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            init_logging(&LoggingSettings::default());
            error!("Failed to load configuration: {}", e);
            panic!("Configuration error: {}", e);
        }
    };

    init_logging(&settings.logging);

    info!("Starting Lume Interactions service...");

    let verifier = JwtVerifier::new(&settings.auth.jwt_secret);

    match settings.database.backend {
        StorageBackend::Postgres => {
            let db = &settings.database;
            let store = PostgresStore::from_settings(
                &db.url,
                db.max_connections,
                db.min_connections,
                db.acquire_timeout_secs,
                db.idle_timeout_secs,
            )
            .await
            .unwrap_or_else(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                panic!("PostgreSQL connection error: {}", e);
            });

            info!(
                "PostgreSQL store initialized (max: {} connections)",
                db.max_connections.unwrap_or(10)
            );

            serve(Arc::new(store), verifier, settings.server).await
        }
        StorageBackend::Memory => {
            warn!("Using in-memory store; interactions are lost on restart");
            serve(Arc::new(InMemoryStore::new()), verifier, settings.server).await
        }
    }
}
