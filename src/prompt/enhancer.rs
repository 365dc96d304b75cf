//! Rewrite instruction sent to the completion endpoint.
//!
//! The instruction is always two messages: a fixed system role describing the
//! rewriting task and a user role quoting the raw prompt.
use crate::openai::models::ChatMessage;

pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant that rewrites image prompts \
to be more detailed and visually descriptive for DALL·E 3.";

pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 300;

pub fn build_messages(prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_INSTRUCTION),
        ChatMessage::user(format!(
            "Rewrite this prompt to be more detailed and vivid for image generation: '{}'",
            prompt
        )),
    ]
}
