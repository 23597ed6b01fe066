//! HTTP plumbing shared by the hosted vendor backends.

use std::time::Duration;

use agent_core::AgentError;
use agent_core::error::Result;

/// Build the per-agent HTTP client. This is the only I/O-adjacent work done
/// at construction time.
pub(crate) fn client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))
}

/// Map a transport failure onto the agent error taxonomy.
pub(crate) fn transport(vendor: &str, err: &reqwest::Error) -> AgentError {
    if err.is_connect() || err.is_timeout() {
        AgentError::ProviderUnavailable(format!("{vendor}: {err}"))
    } else {
        AgentError::Provider(format!("{vendor}: {err}"))
    }
}

/// Turn a non-success HTTP status into a typed error, passing success through.
pub(crate) async fn check_status(vendor: &str, resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let detail = format!("{vendor} error {status}: {body}");
    tracing::warn!(vendor, status = status.as_u16(), "provider request rejected");

    Err(match status.as_u16() {
        401 | 403 => AgentError::Auth(detail),
        429 => AgentError::RateLimited(detail),
        500..=599 => AgentError::ProviderUnavailable(detail),
        _ => AgentError::Provider(detail),
    })
}

/// Drain every complete line from `buf` and return the SSE `data:` payloads.
///
/// A trailing partial line stays in `buf` until the next network chunk
/// completes it.
pub(crate) fn drain_sse_data(buf: &mut String) -> Vec<String> {
    let mut payloads = Vec::new();
    while let Some(nl) = buf.find('\n') {
        let line: String = buf.drain(..=nl).collect();
        let line = line.trim_end_matches(['\n', '\r']);
        if let Some(data) = line.strip_prefix("data:") {
            let data = data.trim();
            if !data.is_empty() {
                payloads.push(data.to_string());
            }
        }
    }
    payloads
}

/// Join a base URL and a path without doubling the slash
pub(crate) fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
