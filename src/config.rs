//! Env-driven configuration for the relay.
//!
//! Values are read from the process environment once at startup; `dotenv` is
//! loaded on demand by the binary. Only the API key is mandatory.
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const DEFAULT_PORT: u16 = 8082;
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4-turbo";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";
pub const DEFAULT_IMAGE_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub api_host: IpAddr,
    pub api_port: u16,
    pub enhance_prompt: bool,
    pub chat_model: String,
    pub image_model: String,
    pub image_size: String,
    pub image_timeout: Duration,
}

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. Missing optional
    /// values take their defaults; unparsable ones log a warning and do too.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::Config("OPENAI_API_KEY is not set".to_string()))?;

        let api_host = match lookup("API_HOST") {
            Some(host) => host.parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid API_HOST '{}', falling back to {}", host, DEFAULT_HOST);
                DEFAULT_HOST
            }),
            None => DEFAULT_HOST,
        };
        let api_port = match lookup("PORT") {
            Some(port) => port.parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid PORT '{}', falling back to {}", port, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };
        let image_timeout_secs = match lookup("IMAGE_TIMEOUT_SECS") {
            Some(secs) => secs.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "Invalid IMAGE_TIMEOUT_SECS '{}', falling back to {}",
                    secs,
                    DEFAULT_IMAGE_TIMEOUT_SECS
                );
                DEFAULT_IMAGE_TIMEOUT_SECS
            }),
            None => DEFAULT_IMAGE_TIMEOUT_SECS,
        };

        Ok(Config {
            api_key,
            base_url: lookup("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_host,
            api_port,
            enhance_prompt: lookup("ENHANCE_PROMPT").map(|v| parse_flag(&v)).unwrap_or(true),
            chat_model: lookup("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            image_model: lookup("IMAGE_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            image_size: lookup("IMAGE_SIZE").unwrap_or_else(|| DEFAULT_IMAGE_SIZE.to_string()),
            image_timeout: Duration::from_secs(image_timeout_secs),
        })
    }

    pub fn socket_address(&self) -> SocketAddr {
        SocketAddr::new(self.api_host, self.api_port)
    }

    /// Log the effective configuration with the key redacted.
    pub fn log_summary(&self) {
        tracing::info!(
            base_url = %self.base_url,
            listen = %self.socket_address(),
            enhance_prompt = self.enhance_prompt,
            chat_model = %self.chat_model,
            image_model = %self.image_model,
            image_size = %self.image_size,
            image_timeout_secs = self.image_timeout.as_secs(),
            api_key = %redact(&self.api_key),
            "Loaded configuration"
        );
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Keys shorter than this are never partially shown.
const MIN_KEY_LEN_FOR_TAIL: usize = 8;

fn redact(key: &str) -> String {
    if key.chars().count() < MIN_KEY_LEN_FOR_TAIL {
        return "***".to_string();
    }
    let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("***{}", tail)
}
