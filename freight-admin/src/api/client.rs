// Backend HTTP client.
//
// Every call goes through `send`: one request, raced against the caller's
// cancellation token, decoded from the `{ success, data, message, error,
// pagination }` envelope. No retries and no caching for backend calls.

use log::{debug, warn};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use super::error::{ApiError, GENERIC_FAILURE};
use crate::config::ApiSettings;
use crate::models::responses::{ApiResponse, Pagination};
use crate::models::state::Session;

/// Per-call context: who is calling and whether the caller still cares.
#[derive(Debug, Clone)]
pub struct RequestContext {
    session: Option<Session>,
    cancel: CancellationToken,
    correlation_id: String,
}

impl RequestContext {
    pub fn new(session: Option<Session>, cancel: CancellationToken) -> Self {
        Self {
            session,
            cancel,
            correlation_id: Uuid::new_v4().simple().to_string(),
        }
    }

    /// No session, never cancelled. Used for sign-in calls.
    pub fn anonymous() -> Self {
        Self::new(None, CancellationToken::new())
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Decoded success envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub pagination: Option<Pagination>,
    pub message: Option<String>,
}

impl<T> Fetched<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched {
            data: f(self.data),
            pagination: self.pagination,
            message: self.message,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let mut base = Url::parse(settings.base_url.trim())?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .user_agent(concat!("freight-admin/", env!("CARGO_PKG_VERSION")));
        if !settings.use_system_proxy {
            builder = builder.no_proxy();
        }
        Ok(Self {
            http: builder.build()?,
            base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Base URL plus percent-encoded path segments and query pairs.
    pub fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Fetched<T>, ApiError> {
        let url = self.endpoint(segments, query)?;
        self.send(ctx, Method::GET, url, None::<&()>).await
    }

    pub async fn post<B, T>(&self, ctx: &RequestContext, segments: &[&str], body: &B) -> Result<Fetched<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments, &[])?;
        self.send(ctx, Method::POST, url, Some(body)).await
    }

    pub async fn put<B, T>(&self, ctx: &RequestContext, segments: &[&str], body: &B) -> Result<Fetched<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments, &[])?;
        self.send(ctx, Method::PUT, url, Some(body)).await
    }

    pub async fn patch<B, T>(&self, ctx: &RequestContext, segments: &[&str], body: &B) -> Result<Fetched<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments, &[])?;
        self.send(ctx, Method::PATCH, url, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        segments: &[&str],
    ) -> Result<Fetched<T>, ApiError> {
        let url = self.endpoint(segments, &[])?;
        self.send(ctx, Method::DELETE, url, None::<&()>).await
    }

    async fn send<B, T>(
        &self,
        ctx: &RequestContext,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Fetched<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        if ctx.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header("X-Request-Id", ctx.correlation_id());
        if let Some(session) = ctx.session() {
            request = request.bearer_auth(&session.token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(
            "[PHASE: api] [STEP: request] {} {} (correlation_id={})",
            method,
            url.path(),
            ctx.correlation_id()
        );

        let call = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let bytes = response.bytes().await?;
            Ok::<_, ApiError>((status, bytes))
        };

        let (status, bytes) = tokio::select! {
            biased;
            _ = ctx.cancel_token().cancelled() => {
                debug!(
                    "[PHASE: api] [STEP: cancel] {} {} abandoned (correlation_id={})",
                    method,
                    url.path(),
                    ctx.correlation_id()
                );
                return Err(ApiError::Cancelled);
            }
            result = call => result?,
        };

        let decoded = decode_envelope(status, &bytes);
        match &decoded {
            Ok(_) => debug!(
                "[PHASE: api] [STEP: response] {} {} -> {} (correlation_id={})",
                method,
                url.path(),
                status,
                ctx.correlation_id()
            ),
            Err(e) => warn!(
                "[PHASE: api] [STEP: response] {} {} failed: {} (correlation_id={})",
                method,
                url.path(),
                e,
                ctx.correlation_id()
            ),
        }
        decoded
    }
}

/// Maps a raw HTTP status and body onto the envelope contract.
pub fn decode_envelope<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<Fetched<T>, ApiError> {
    if status == 401 {
        return Err(ApiError::Unauthorized);
    }
    if !(200..300).contains(&status) {
        let message = serde_json::from_slice::<ApiResponse<serde_json::Value>>(body)
            .ok()
            .and_then(|envelope| envelope.failure_message())
            .unwrap_or_default();
        return Err(ApiError::Server { status, message });
    }

    // 204 / empty body: only payload types that accept null (e.g. `()`) succeed.
    if body.iter().all(u8::is_ascii_whitespace) {
        let data = serde_json::from_value(serde_json::Value::Null)
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
        return Ok(Fetched {
            data,
            pagination: None,
            message: None,
        });
    }

    let envelope: ApiResponse<serde_json::Value> =
        serde_json::from_slice(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
    if !envelope.success {
        return Err(ApiError::Rejected {
            message: envelope
                .failure_message()
                .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
        });
    }
    let data = serde_json::from_value(envelope.data.unwrap_or(serde_json::Value::Null))
        .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
    Ok(Fetched {
        data,
        pagination: envelope.pagination,
        message: envelope.message,
    })
}
