//! Prompt relay library
//!
//! Modules:
//! - `api`: Axum handlers and router setup used by the binary.
//! - `openai`: Client and wire types for the completion and image endpoints.
//! - `prompt`: The rewrite instruction used for prompt enhancement.
//! - `config`: Env-driven configuration loader.
//! - `error`: Common error type, alias, and HTTP mapping.
//!
//! Re-exports are provided for common types: `Config`, `OpenAIClient`,
//! `AppState`, `ImageResult`, and `create_router`.
pub mod api;
pub mod config;
pub mod error;
pub mod openai;
pub mod prompt;

pub use api::models::ImageResult;
pub use api::routes::{create_router, AppState};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use openai::client::OpenAIClient;
