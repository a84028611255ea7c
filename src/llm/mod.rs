pub mod openai;
pub mod provider;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
