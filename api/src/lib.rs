use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::{Env, ServerConfig},
    store::Store,
};

pub mod config;
pub mod error;
pub mod extract;
pub mod identity;
pub mod json;
pub mod news;
pub mod schema;
pub mod store;
pub mod utils;

#[derive(Clone)]
pub struct App {
    pub store: Arc<dyn Store>,
    pub config: Arc<ServerConfig>,
}

impl App {
    pub fn new(store: Arc<dyn Store>, config: ServerConfig) -> Self {
        App {
            store,
            config: Arc::new(config),
        }
    }
}

pub fn router(app: App) -> Router {
    let cors = cors_layer(&app.config);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(news::routes::pages())
        .nest("/comments", news::routes::comments())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_allowed_origins.is_empty() {
        return match config.env {
            Env::Dev => CorsLayer::permissive(),
            Env::Staging | Env::Production => CorsLayer::new(),
        };
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(%error, origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}
