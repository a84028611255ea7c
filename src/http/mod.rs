mod client;
pub mod redact;

pub use client::{DebugSink, HttpClient};
