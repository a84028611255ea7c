pub mod history;
pub mod prompt;

pub use history::{History, Speaker, Turn};
pub use prompt::{PromptRequest, assemble_prompt};
