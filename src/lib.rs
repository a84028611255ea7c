pub mod chef;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod http;
pub mod llm;
pub mod persona;
pub mod trace;

use anyhow::{Result, anyhow};
use chef::ChefAssistant;
use cli::{CliArgs, run_chat_loop};
use config::AppConfig;
use http::HttpClient;
use llm::openai::OpenAiProvider;
use llm::provider::LlmError;
use persona::PersonaBundle;
use rustyline::DefaultEditor;
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};
use trace::{SessionTrace, TraceKind};

pub async fn run(args: CliArgs) -> Result<()> {
    let config = AppConfig::load_with_path(args.config.as_deref())?;
    let session_id = generate_session_id();
    let trace = SessionTrace::open(&session_id)?;
    trace.record(
        TraceKind::Session,
        &format!(
            "session {session_id} model={} stream={} config={}",
            config.openai_model,
            config.stream,
            config.config_path.display()
        ),
    );

    let http = HttpClient::new(reqwest::Client::new())
        .verbose(args.verbose)
        .with_trace(trace.clone());
    let provider = OpenAiProvider::new(http, config.openai_settings()).map_err(|err| match err {
        LlmError::MissingApiKey => anyhow!(
            "Missing OPENAI_API_KEY. Configure it in your shell or .env file (example: OPENAI_API_KEY=your_key)."
        ),
        other => anyhow!(other),
    })?;

    let mut chef = ChefAssistant::new(provider, PersonaBundle::chef());
    let mut editor = DefaultEditor::new()?;
    let mut stdout = io::stdout();

    run_chat_loop(&mut chef, &mut editor, &mut stdout, Some(&trace)).await
}

fn generate_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis());
    format!("{millis:x}-{:x}", std::process::id())
}
