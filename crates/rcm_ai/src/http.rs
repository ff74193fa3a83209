use std::fmt;
use std::time::Duration;

use rcm_core::error::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Blocking JSON client for a hosted model API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    api_key: String,
    agent: ureq::Agent,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// How the API key is presented to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    Bearer,
    GoogApiKey,
}

impl ApiClient {
    /// Plain HTTP is only accepted for loopback proxies; everything else must be https.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();

        let remote_ok = base_url
            .strip_prefix("https://")
            .and_then(|rest| rest.split('/').next())
            .is_some_and(|host| !host.is_empty() && !host.contains('@'));
        let loopback_ok = ["http://127.0.0.1", "http://localhost"]
            .iter()
            .filter_map(|p| base_url.strip_prefix(p))
            .any(valid_port_suffix);
        if !remote_ok && !loopback_ok {
            return Err(AppError::new(
                "AI_PROVIDER_URL_INVALID",
                "Provider base URL must use https (or http on loopback)",
            )
            .with_details(format!("base_url={base_url}")));
        }
        if api_key.trim().is_empty() {
            return Err(AppError::new("AI_PROVIDER_KEY_MISSING", "Provider API key is empty"));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build();

        Ok(Self {
            base_url,
            api_key: api_key.trim().to_string(),
            agent,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` to `{base_url}/{path}` and decode the JSON response.
    ///
    /// HTTP 429 maps to `AI_RATE_LIMITED`; other failures map to `code`.
    pub fn post_json<Req, Resp>(
        &self,
        path: &str,
        auth: AuthStyle,
        body: &Req,
        code: &str,
        what: &str,
    ) -> Result<Resp, AppError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let req = self.agent.post(&url);
        let req = match auth {
            AuthStyle::Bearer => req.set("Authorization", &format!("Bearer {}", self.api_key)),
            AuthStyle::GoogApiKey => req.set("x-goog-api-key", &self.api_key),
        };

        match req.send_json(body) {
            Ok(r) => r.into_json::<Resp>().map_err(|e| {
                AppError::new(code, format!("Failed to decode {what} response"))
                    .with_details(e.to_string())
            }),
            Err(ureq::Error::Status(429, r)) => Err(AppError::new(
                "AI_RATE_LIMITED",
                format!("{what} request was rate limited"),
            )
            .with_details(format!("status=429; body={}", body_excerpt(r)))
            .with_retryable(true)),
            Err(ureq::Error::Status(status, r)) => Err(AppError::new(
                code,
                format!("{what} request failed"),
            )
            .with_details(format!("status={status}; body={}", body_excerpt(r)))
            .with_retryable(status >= 500)),
            Err(ureq::Error::Transport(t)) => Err(AppError::new(
                code,
                format!("Failed to call {what} endpoint"),
            )
            .with_details(t.to_string())
            .with_retryable(true)),
        }
    }
}

/// Accepts "", "/path..." or ":port[/path...]" with a port in 1..=65535.
fn valid_port_suffix(rest: &str) -> bool {
    if rest.is_empty() || rest.starts_with('/') {
        return true;
    }
    let Some(after) = rest.strip_prefix(':') else {
        return false;
    };
    let port = after.split('/').next().unwrap_or_default();
    !port.is_empty()
        && port.chars().all(|c| c.is_ascii_digit())
        && port.parse::<u16>().is_ok_and(|p| p > 0)
}

fn body_excerpt(resp: ureq::Response) -> String {
    let body = resp.into_string().unwrap_or_default();
    let body = body.trim();
    match body.char_indices().nth(500) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
