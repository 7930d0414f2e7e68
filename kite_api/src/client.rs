//! HTTP client for the Kite Connect historical candles API.

use std::time::Duration;

use url::Url;

use crate::{
    query::{HistoricalQuery, Query},
    types::{Candle, Envelope, HistoricalData, Interval},
    Error,
};

/// Production endpoint of the Kite Connect REST API.
pub const DEFAULT_BASE_URL: &str = "https://api.kite.trade";

/// Per-request timeout for historical calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// API key and session access token. Obtaining the access token (the login
/// flow) happens outside this crate.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub access_token: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            access_token: access_token.into(),
        }
    }

    fn authorization(&self) -> String {
        format!("token {}:{}", self.api_key, self.access_token)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// HTTP client for the Kite Connect API.
///
/// One `reqwest::Client` is built up front and reused; every request carries
/// the `X-Kite-Version: 3` header and the `token key:secret` authorization.
pub struct Client {
    /// Base URL for the API. Defaults to [`DEFAULT_BASE_URL`].
    base_api_url: String,
    credentials: Credentials,
    http: reqwest::Client,
}

impl Client {
    /// Creates a new client pointing at the production Kite API.
    pub fn new(credentials: Credentials) -> Result<Self, Error> {
        Self::with_base_url(DEFAULT_BASE_URL, credentials)
    }

    /// Creates a new client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str, credentials: Credentials) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("kitehistory/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed(e.to_string())
            })?;
        Ok(Self {
            base_api_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_api_url
    }

    fn get_url(&self, path: &str, query: &impl Query) -> Result<Url, Error> {
        let url = Url::parse(format!("{}{}", &self.base_api_url, path).as_str()).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::RequestFailed(format!("invalid URL: {}", e))
        })?;
        Ok(query.add_to_url(&url))
    }

    /// Fetches candles for one instrument over the query's window.
    ///
    /// The server rejects windows wider than its per-interval limit with an
    /// `InputException`; callers are expected to chunk before calling.
    pub async fn get_historical(
        &self,
        instrument_token: u64,
        interval: Interval,
        query: &HistoricalQuery,
    ) -> Result<Vec<Candle>, Error> {
        let path = format!("/instruments/historical/{}/{}", instrument_token, interval);
        let url = self.get_url(&path, query)?;

        let resp = self
            .http
            .get(url)
            .header("X-Kite-Version", "3")
            .header("Authorization", self.credentials.authorization())
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get resource: {}", e);
                Error::RequestFailed(e.to_string())
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed(e.to_string())
        })?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Rate limited on {}", path);
            return Err(Error::RateLimited);
        }

        let envelope = serde_json::from_str::<Envelope<HistoricalData>>(&body);

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(match envelope {
                Ok(env) if !env.is_success() => Error::Api {
                    status: status.as_u16(),
                    error_type: env.error_type.unwrap_or_else(|| "GeneralException".to_string()),
                    message: env.message.unwrap_or_default(),
                },
                _ => Error::HttpStatus {
                    status: status.as_u16(),
                    body: snippet,
                },
            });
        }

        let envelope = envelope.map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse resource: {} | body: {}", e, snippet);
            Error::Parse(format!("{} | body: {}", e, snippet))
        })?;

        if !envelope.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                error_type: envelope
                    .error_type
                    .unwrap_or_else(|| "GeneralException".to_string()),
                message: envelope.message.unwrap_or_default(),
            });
        }

        envelope
            .data
            .map(|d| d.candles)
            .ok_or_else(|| Error::Parse("response has no data field".to_string()))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
