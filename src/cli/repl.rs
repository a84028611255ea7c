use crate::chef::ChefAssistant;
use crate::llm::provider::LlmProvider;
use crate::persona::{FAREWELL, INPUT_PROMPT, WELCOME_BANNER, failure_notice};
use crate::trace::{SessionTrace, TraceKind};
use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;
use tokio::sync::watch;

const EXIT_PHRASES: [&str; 3] = ["quit", "exit", "bye"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    Interrupted,
    Eof,
}

/// Where the chat loop gets its lines from.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome>;
}

impl LineSource for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        match self.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.add_history_entry(line.as_str());
                }
                Ok(ReadOutcome::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputAction<'a> {
    Exit,
    Skip,
    Ask(&'a str),
}

fn classify_input(line: &str) -> InputAction<'_> {
    let line = line.trim();
    if line.is_empty() {
        InputAction::Skip
    } else if is_exit_phrase(line) {
        InputAction::Exit
    } else {
        InputAction::Ask(line)
    }
}

pub fn is_exit_phrase(line: &str) -> bool {
    let line = line.trim();
    EXIT_PHRASES
        .iter()
        .any(|phrase| line.eq_ignore_ascii_case(phrase))
}

/// Counts SIGINTs from the moment the loop starts. Tokio keeps its handler
/// installed once registered, so a single listener serves both the prompt
/// and in-flight requests.
struct Interrupts {
    seen: watch::Receiver<u64>,
}

impl Interrupts {
    fn listen() -> Self {
        let (tx, rx) = watch::channel(0u64);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                tx.send_modify(|count| *count += 1);
            }
        });
        Self { seen: rx }
    }

    /// Whether an interrupt arrived since the last check.
    fn take(&mut self) -> bool {
        let pending = self.seen.has_changed().unwrap_or(false);
        if pending {
            self.seen.borrow_and_update();
        }
        pending
    }

    async fn next(&mut self) {
        if self.seen.changed().await.is_err() {
            // No signal support: never fires.
            std::future::pending::<()>().await;
        }
    }
}

/// Drives the conversation until an exit phrase, Ctrl-C or end of input.
///
/// Provider failures are reported and absorbed; the loop keeps going.
pub async fn run_chat_loop<P, S, W>(
    chef: &mut ChefAssistant<P>,
    input: &mut S,
    out: &mut W,
    trace: Option<&SessionTrace>,
) -> Result<()>
where
    P: LlmProvider,
    S: LineSource,
    W: Write + Send,
{
    writeln!(out, "{WELCOME_BANNER}")?;
    let mut interrupts = Interrupts::listen();

    loop {
        writeln!(out)?;
        out.flush()?;

        let line = match input.read_line(INPUT_PROMPT)? {
            ReadOutcome::Line(_) if interrupts.take() => return say_farewell(out, trace),
            ReadOutcome::Line(line) => line,
            ReadOutcome::Interrupted | ReadOutcome::Eof => {
                return say_farewell(out, trace);
            }
        };

        let question = match classify_input(&line) {
            InputAction::Skip => continue,
            InputAction::Exit => {
                if let Some(trace) = trace {
                    trace.record(TraceKind::UserIn, line.trim());
                }
                return say_farewell(out, trace);
            }
            InputAction::Ask(question) => question,
        };
        if let Some(trace) = trace {
            trace.record(TraceKind::UserIn, question);
        }

        let outcome = {
            let mut on_delta = |chunk: &str| {
                let _ = out.write_all(chunk.as_bytes());
                let _ = out.flush();
            };
            tokio::select! {
                result = chef.process_input(question, &mut on_delta) => Some(result),
                _ = interrupts.next() => None,
            }
        };

        writeln!(out)?;
        match outcome {
            Some(Ok(answer)) => {
                if let Some(trace) = trace {
                    trace.record(TraceKind::ChefOut, &answer);
                }
            }
            Some(Err(err)) => {
                let notice = failure_notice(&err.to_string());
                writeln!(out, "{notice}")?;
                if let Some(trace) = trace {
                    trace.record(TraceKind::ChefErr, &notice);
                }
            }
            None => return say_farewell(out, trace),
        }
    }
}

fn say_farewell<W: Write>(out: &mut W, trace: Option<&SessionTrace>) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{FAREWELL}")?;
    out.flush()?;
    if let Some(trace) = trace {
        trace.record(TraceKind::Session, "stopped");
    }
    Ok(())
}
