//! Masking for the `--verbose` view of provider traffic.

use reqwest::Url;
use reqwest::header::HeaderMap;
use serde_json::Value;

pub const MASK: &str = "***REDACTED***";
pub const BODY_LOG_LIMIT: usize = 4_000;

fn is_secret_header(name: &str) -> bool {
    matches!(
        name,
        "authorization"
            | "proxy-authorization"
            | "cookie"
            | "set-cookie"
            | "x-api-key"
            | "openai-organization"
            | "openai-project"
    )
}

fn is_secret_field(key: &str) -> bool {
    matches!(
        key.to_ascii_lowercase().as_str(),
        "key" | "api_key" | "apikey" | "token" | "access_token" | "secret" | "password"
    )
}

/// `name: value` lines with credentials replaced by [`MASK`].
pub fn header_lines(headers: &HeaderMap) -> Vec<String> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if is_secret_header(name.as_str()) {
                MASK
            } else {
                value.to_str().unwrap_or("<binary>")
            };
            format!("{}: {shown}", name.as_str())
        })
        .collect()
}

pub fn mask_url(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }

    let pairs = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if is_secret_field(&key) {
                MASK.into()
            } else {
                value
            };
            (key, value)
        })
        .collect::<Vec<_>>();
    let mut masked = url.clone();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}

/// Masks secret fields at any depth of a JSON body. Anything that is not
/// JSON, such as an SSE transcript or a plain-text error, passes through.
pub fn mask_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(mut json) => {
            scrub(&mut json);
            json.to_string()
        }
        Err(_) => body.to_string(),
    }
}

fn scrub(value: &mut Value) {
    if let Some(map) = value.as_object_mut() {
        for (key, item) in map.iter_mut() {
            if is_secret_field(key) {
                *item = Value::from(MASK);
            } else {
                scrub(item);
            }
        }
    } else if let Some(items) = value.as_array_mut() {
        items.iter_mut().for_each(scrub);
    }
}

pub fn clip(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        None => text.to_string(),
        Some((cut, _)) => format!(
            "{}... <{} more chars>",
            &text[..cut],
            text[cut..].chars().count()
        ),
    }
}
