mod args;
mod repl;

pub use args::CliArgs;
pub use repl::{LineSource, ReadOutcome, is_exit_phrase, run_chat_loop};
