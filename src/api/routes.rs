//! Shared handler state and router setup used by the binary and the tests.
use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::api::handlers;
use crate::config::Config;
use crate::error::AppError;
use crate::openai::client::OpenAIClient;

pub struct AppState {
    pub openai_client: OpenAIClient,
    pub enhance_prompt: bool,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        AppState {
            openai_client: OpenAIClient::new(config),
            enhance_prompt: config.enhance_prompt,
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/", get(handlers::root))
        .route("/generate-image", post(handlers::generate_image));
    with_common_layers(router).with_state(state)
}

/// CORS plus conversion of handler panics into a generic 500.
fn with_common_layers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!("Handler panicked: {}", detail);
    AppError::Unexpected(detail).into_response()
}
