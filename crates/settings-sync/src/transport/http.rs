//! REST transport built on `reqwest`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::{RequestBuilder, Response, StatusCode};
use settings_core::{EffectiveDocument, Etag, PatchOp};
use tracing::{debug, instrument};

use super::wire::DocumentPayload;
use super::{FetchOutcome, SettingsTransport};
use crate::auth::{NoAuth, StaticToken, TokenProvider};
use crate::cache::ScopeKey;
use crate::config::SyncConfig;
use crate::error::{Problem, SyncError};
use crate::metrics::SyncMetrics;

/// Talks to `GET /settings/effective` and `PATCH /settings`.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    tokens: Arc<dyn TokenProvider>,
    metrics: SyncMetrics,
}

impl HttpTransport {
    /// Creates a transport from configuration. The configured token, if
    /// any, is sent as a bearer token.
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SyncError::transport(format!("failed to build HTTP client: {e}")))?;

        let tokens: Arc<dyn TokenProvider> = match config.auth_token() {
            Some(token) => Arc::new(StaticToken::new(token)),
            None => Arc::new(NoAuth),
        };

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            timeout: config.request_timeout(),
            tokens,
            metrics: SyncMetrics::default(),
        })
    }

    /// Replaces the token source.
    pub fn with_token_provider(mut self, tokens: impl TokenProvider + 'static) -> Self {
        self.tokens = Arc::new(tokens);
        self
    }

    /// Records request timings into `metrics`.
    pub fn with_metrics(mut self, metrics: SyncMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Returns the API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.tokens.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<Response, SyncError> {
        let started = Instant::now();
        let result = self.authorize(request).send().await;
        self.metrics.record_request_duration(operation, started.elapsed());

        result.map_err(|e| self.map_send_error(e))
    }

    fn map_send_error(&self, err: reqwest::Error) -> SyncError {
        if err.is_timeout() {
            SyncError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            SyncError::transport(err.to_string())
        }
    }
}

/// Reads a success body into a document.
async fn read_document(response: Response) -> Result<EffectiveDocument, SyncError> {
    let header_etag = response
        .headers()
        .get(ETAG)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| SyncError::transport(format!("failed to read body: {e}")))?;

    let payload: DocumentPayload = serde_json::from_slice(&bytes)
        .map_err(|e| SyncError::invalid_response(format!("malformed document: {e}")))?;

    payload.into_document(header_etag.as_deref())
}

/// Maps a non-success response to an error, keeping the problem body.
async fn read_error(response: Response) -> SyncError {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return SyncError::Unauthorized;
    }

    let body = response.text().await.unwrap_or_default();
    let problem = serde_json::from_str::<Problem>(&body).ok();
    SyncError::http(status.as_u16(), problem)
}

#[async_trait]
impl SettingsTransport for HttpTransport {
    #[instrument(skip(self, key, known_etag), fields(key = %key))]
    async fn fetch_effective(
        &self,
        key: &ScopeKey,
        known_etag: Option<&Etag>,
    ) -> Result<FetchOutcome, SyncError> {
        let url = format!("{}/settings/effective", self.base_url);
        let mut request = self.client.get(&url).query(key.query_pairs());
        if let Some(etag) = known_etag {
            request = request.header(IF_NONE_MATCH, etag.as_str());
        }

        let response = self.send("fetch_effective", request).await?;
        let status = response.status();
        debug!(status = status.as_u16(), "Effective settings response");

        if status == StatusCode::NOT_MODIFIED {
            Ok(FetchOutcome::NotModified)
        } else if status.is_success() {
            read_document(response).await.map(FetchOutcome::Modified)
        } else {
            Err(read_error(response).await)
        }
    }

    #[instrument(skip(self, key, ops), fields(key = %key, ops = ops.len()))]
    async fn submit_patch(
        &self,
        key: &ScopeKey,
        ops: &[PatchOp],
    ) -> Result<EffectiveDocument, SyncError> {
        let url = format!("{}/settings", self.base_url);
        let body: Vec<PatchOp> = ops
            .iter()
            .cloned()
            .map(|op| op.or_scope(key.scope()))
            .collect();
        let request = self.client.patch(&url).json(&body);

        let response = self.send("submit_patch", request).await?;
        let status = response.status();
        debug!(status = status.as_u16(), "Patch response");

        if status.is_success() {
            read_document(response).await
        } else {
            Err(read_error(response).await)
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}
