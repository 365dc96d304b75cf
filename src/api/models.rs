//! Bodies exchanged with the relay's own callers.
use serde::{Deserialize, Serialize};

/// Success body of `POST /generate-image`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageResult {
    pub image_url: String,
}
