use super::history::{Speaker, Turn};
use crate::llm::provider::{ChatMessage, ChatRole};
use crate::persona::PersonaBundle;

/// Everything sent to the model for a single turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub system_blocks: Vec<String>,
    pub history: Vec<Turn>,
    pub user_input: String,
}

impl PromptRequest {
    /// Flattens the request into role-tagged blocks in send order.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.system_blocks.len() + self.history.len() + 1);

        messages.extend(self.system_blocks.iter().map(|block| ChatMessage {
            role: ChatRole::System,
            content: block.clone(),
        }));
        messages.extend(self.history.iter().map(|turn| ChatMessage {
            role: match turn.speaker() {
                Speaker::User => ChatRole::User,
                Speaker::Assistant => ChatRole::Assistant,
            },
            content: turn.text().to_string(),
        }));
        messages.push(ChatMessage {
            role: ChatRole::User,
            content: self.user_input.clone(),
        });

        messages
    }
}

pub fn assemble_prompt(
    persona: &PersonaBundle,
    history: Vec<Turn>,
    user_input: &str,
) -> PromptRequest {
    PromptRequest {
        system_blocks: persona.system_blocks(),
        history,
        user_input: user_input.to_string(),
    }
}
