//! Authenticated JSON POSTs to the chat endpoint, mirrored to the session
//! trace and, with `--verbose`, to a masked debug sink.

use super::redact::{self, BODY_LOG_LIMIT};
use crate::trace::{SessionTrace, TraceKind};
use reqwest::header::HeaderMap;
use reqwest::{Client, Request, Response};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

pub type DebugSink = Arc<Mutex<dyn Write + Send>>;

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    debug: Option<DebugSink>,
    trace: Option<SessionTrace>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("verbose", &self.debug.is_some())
            .field("traced", &self.trace.is_some())
            .finish()
    }
}

impl HttpClient {
    pub fn new(inner: Client) -> Self {
        Self {
            inner,
            debug: None,
            trace: None,
        }
    }

    /// With `enabled`, masked traffic goes to stderr.
    pub fn verbose(self, enabled: bool) -> Self {
        if enabled {
            self.with_debug_sink(Arc::new(Mutex::new(io::stderr())))
        } else {
            self
        }
    }

    pub fn with_debug_sink(mut self, sink: DebugSink) -> Self {
        self.debug = Some(sink);
        self
    }

    pub fn with_trace(mut self, trace: SessionTrace) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Sends `payload` with bearer auth and returns as soon as the response
    /// head is in. The caller owns the body and reports what it read through
    /// [`HttpClient::record_body`].
    pub async fn post_chat<T: Serialize + ?Sized>(
        &self,
        url: &str,
        api_key: &str,
        payload: &T,
    ) -> Result<Response, reqwest::Error> {
        let request = self
            .inner
            .post(url)
            .bearer_auth(api_key)
            .json(payload)
            .build()?;
        self.note_request(&request);

        match self.inner.execute(request).await {
            Ok(response) => {
                self.note_response_head(response.status().as_u16(), response.headers());
                Ok(response)
            }
            Err(err) => {
                self.record_failure(&err.to_string());
                Err(err)
            }
        }
    }

    /// Logs a response body: the whole JSON document, or the text a stream
    /// produced once it is over.
    pub fn record_body(&self, body: &str) {
        self.emit(body_lines('<', body));
        if let Some(trace) = &self.trace {
            trace.record(TraceKind::ApiResponse, body);
        }
    }

    pub fn record_failure(&self, message: &str) {
        self.emit(vec![format!("! {message}")]);
        if let Some(trace) = &self.trace {
            trace.record(TraceKind::ApiError, message);
        }
    }

    fn note_request(&self, request: &Request) {
        let body = request
            .body()
            .and_then(|body| body.as_bytes())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();

        if self.debug.is_some() {
            self.emit(request_lines(request, &body));
        }
        if let Some(trace) = &self.trace {
            let mut entry = format!("{} {}\n", request.method(), request.url());
            push_raw_headers(&mut entry, request.headers());
            entry.push_str(&body);
            trace.record(TraceKind::ApiRequest, &entry);
        }
    }

    fn note_response_head(&self, status: u16, headers: &HeaderMap) {
        if self.debug.is_some() {
            let mut lines = vec![format!("< HTTP {status}")];
            lines.extend(redact::header_lines(headers).into_iter().map(|h| format!("< {h}")));
            lines.push("<".to_string());
            self.emit(lines);
        }
        if let Some(trace) = &self.trace {
            let mut entry = format!("HTTP {status}\n");
            push_raw_headers(&mut entry, headers);
            trace.record(TraceKind::ApiResponse, &entry);
        }
    }

    fn emit(&self, lines: Vec<String>) {
        let Some(sink) = &self.debug else {
            return;
        };
        if let Ok(mut out) = sink.lock() {
            for line in lines {
                let _ = writeln!(out, "[http-debug] {line}");
            }
            let _ = out.flush();
        }
    }
}

fn request_lines(request: &Request, body: &str) -> Vec<String> {
    let mut lines = vec![format!(
        "> {} {}",
        request.method(),
        redact::mask_url(request.url())
    )];
    lines.extend(
        redact::header_lines(request.headers())
            .into_iter()
            .map(|h| format!("> {h}")),
    );
    lines.push(">".to_string());
    lines.extend(body_lines('>', body));
    lines
}

fn body_lines(direction: char, body: &str) -> Vec<String> {
    let shown = redact::clip(&redact::mask_body(body), BODY_LOG_LIMIT);
    if shown.is_empty() {
        return vec![format!("{direction} <empty body>")];
    }
    shown
        .lines()
        .map(|line| format!("{direction} {line}"))
        .collect()
}

fn push_raw_headers(entry: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        entry.push_str(&format!("{}: {value}\n", name.as_str()));
    }
}
