//! Diagnostic strings for request logging
//!
//! Every logged attempt is rendered as a copy-pasteable curl command
//! followed by a compact view of the response body.

use crate::types::Method;
use std::borrow::Cow;
use std::collections::HashMap;

/// Build a curl command reproducing a request
///
/// Headers are emitted sorted by name so the output is stable.
/// A `log_body_size` of 0 keeps the whole body.
pub fn build_curl(
    method: Method,
    url: &str,
    headers: &HashMap<String, String>,
    body: Option<&[u8]>,
    log_body_size: usize,
) -> String {
    let mut curl = format!("curl -X {method} '{url}'");

    let mut names: Vec<&String> = headers.keys().collect();
    names.sort();
    for name in names {
        curl.push_str(&format!(" -H '{}: {}'", name, headers[name]));
    }

    if let Some(body) = body {
        curl.push_str(&format!(" -d '{}'", truncate(body, log_body_size)));
    }

    curl
}

/// Render a response body for a log line
///
/// Whitespace runs are collapsed to single spaces after truncation.
pub fn body_snippet(body: &[u8], log_body_size: usize) -> String {
    truncate(body, log_body_size)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(body: &[u8], log_body_size: usize) -> Cow<'_, str> {
    if log_body_size == 0 || body.len() < log_body_size {
        return String::from_utf8_lossy(body);
    }
    let head = String::from_utf8_lossy(&body[..log_body_size - 1]);
    Cow::Owned(format!("{head}..."))
}
