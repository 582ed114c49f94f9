// Location picker backed by a GeoNames-style geocoding service.
//
// Lookups are idempotent GETs against a third party, so unlike backend calls
// they are retried with jittered exponential backoff, on transport errors only.

use log::{debug, warn};
use serde::Deserialize;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use url::Url;

use super::client::RequestContext;
use super::error::ApiError;
use crate::config::GeocodingSettings;
use crate::utils::logging::mask_query_param;

/// One selectable place.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationOption {
    /// Country code for countries, geoname id for everything else.
    pub value: String,
    pub label: String,
    pub geoname_id: i64,
    pub country_code: String,
    pub admin_code: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct GeoEnvelope {
    #[serde(default)]
    geonames: Vec<GeoName>,
    status: Option<GeoStatus>,
}

#[derive(Debug, Deserialize)]
struct GeoStatus {
    #[serde(default)]
    message: String,
    #[serde(default)]
    value: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeoName {
    geoname_id: i64,
    name: Option<String>,
    country_name: Option<String>,
    country_code: Option<String>,
    #[serde(rename = "adminCode1")]
    admin_code1: Option<String>,
    #[serde(rename = "adminName1")]
    admin_name1: Option<String>,
    // Strings in most responses, numbers in a few.
    lat: Option<serde_json::Value>,
    lng: Option<serde_json::Value>,
}

fn coordinate(value: &Option<serde_json::Value>) -> Option<f64> {
    match value.as_ref()? {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

impl GeoName {
    fn country_option(&self) -> Option<LocationOption> {
        let code = self.country_code.clone().filter(|c| !c.is_empty())?;
        Some(LocationOption {
            value: code.clone(),
            label: self
                .country_name
                .clone()
                .or_else(|| self.name.clone())
                .unwrap_or_else(|| code.clone()),
            geoname_id: self.geoname_id,
            country_code: code,
            admin_code: None,
            lat: coordinate(&self.lat),
            lng: coordinate(&self.lng),
        })
    }

    fn place_option(&self, detailed_label: bool) -> LocationOption {
        let name = self.name.clone().unwrap_or_default();
        let label = if detailed_label {
            [Some(name.as_str()), self.admin_name1.as_deref(), self.country_name.as_deref()]
                .into_iter()
                .flatten()
                .filter(|part| !part.trim().is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            name
        };
        LocationOption {
            value: self.geoname_id.to_string(),
            label,
            geoname_id: self.geoname_id,
            country_code: self.country_code.clone().unwrap_or_default(),
            admin_code: self.admin_code1.clone().filter(|c| !c.is_empty()),
            lat: coordinate(&self.lat),
            lng: coordinate(&self.lng),
        }
    }
}

fn sort_by_label(options: &mut [LocationOption]) {
    options.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
}

/// Parses a geocoding response body. A `status` object is a service error.
fn decode_geonames(body: &[u8]) -> Result<Vec<GeoName>, ApiError> {
    let envelope: GeoEnvelope =
        serde_json::from_slice(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
    if let Some(status) = envelope.status {
        return Err(ApiError::Geocoding {
            code: status.value,
            message: status.message,
        });
    }
    Ok(envelope.geonames)
}

#[derive(Debug, Clone)]
pub struct GeoClient {
    http: reqwest::Client,
    base: Url,
    username: String,
    max_attempts: usize,
}

impl GeoClient {
    pub fn new(settings: &GeocodingSettings) -> Result<Self, ApiError> {
        let mut base = Url::parse(settings.base_url.trim())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(settings.timeout_secs.max(1)));
        if !settings.use_system_proxy {
            builder = builder.no_proxy();
        }
        Ok(Self {
            http: builder.build()?,
            base,
            username: settings.username.clone(),
            max_attempts: settings.max_attempts.max(1),
        })
    }

    fn url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self.base.join(endpoint)?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .append_pair("username", &self.username);
        Ok(url)
    }

    /// All countries, sorted by name.
    pub async fn countries(&self, ctx: &RequestContext) -> Result<Vec<LocationOption>, ApiError> {
        let names = self.fetch(ctx, "countryInfoJSON", &[]).await?;
        let mut options: Vec<LocationOption> = names.iter().filter_map(GeoName::country_option).collect();
        sort_by_label(&mut options);
        Ok(options)
    }

    /// First-level divisions of a country, sorted by name.
    pub async fn states(&self, ctx: &RequestContext, country_geoname_id: i64) -> Result<Vec<LocationOption>, ApiError> {
        let names = self.children(ctx, country_geoname_id).await?;
        let mut options: Vec<LocationOption> = names.iter().map(|n| n.place_option(false)).collect();
        sort_by_label(&mut options);
        Ok(options)
    }

    /// Places below a state, in service order.
    pub async fn cities(&self, ctx: &RequestContext, state_geoname_id: i64) -> Result<Vec<LocationOption>, ApiError> {
        let names = self.children(ctx, state_geoname_id).await?;
        Ok(names.iter().map(|n| n.place_option(false)).collect())
    }

    /// Free-text place search, optionally restricted to one country.
    pub async fn search(
        &self,
        ctx: &RequestContext,
        query: &str,
        country_code: Option<&str>,
    ) -> Result<Vec<LocationOption>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let mut params = vec![("q", query.to_string()), ("maxRows", "10".to_string())];
        if let Some(code) = country_code.filter(|c| !c.trim().is_empty()) {
            params.push(("country", code.trim().to_string()));
        }
        let names = self.fetch(ctx, "searchJSON", &params).await?;
        Ok(names.iter().map(|n| n.place_option(true)).collect())
    }

    async fn children(&self, ctx: &RequestContext, geoname_id: i64) -> Result<Vec<GeoName>, ApiError> {
        self.fetch(ctx, "childrenJSON", &[("geonameId", geoname_id.to_string())])
            .await
    }

    async fn fetch(
        &self,
        ctx: &RequestContext,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<GeoName>, ApiError> {
        let url = self.url(endpoint, params)?;
        let retry_strategy = ExponentialBackoff::from_millis(150)
            .factor(2)
            .max_delay(Duration::from_secs(2))
            .map(jitter)
            .take(self.max_attempts - 1);

        RetryIf::spawn(
            retry_strategy,
            || self.fetch_once(ctx, url.clone()),
            |e: &ApiError| {
                let retry = e.is_transient() && !ctx.is_cancelled();
                if retry {
                    warn!(
                        "[PHASE: geocoding] [STEP: retry] {} failed, retrying: {}",
                        mask_query_param(url.as_str(), "username"),
                        e
                    );
                }
                retry
            },
        )
        .await
    }

    async fn fetch_once(&self, ctx: &RequestContext, url: Url) -> Result<Vec<GeoName>, ApiError> {
        debug!(
            "[PHASE: geocoding] [STEP: request] GET {} (correlation_id={})",
            mask_query_param(url.as_str(), "username"),
            ctx.correlation_id()
        );
        let call = async {
            let response = self.http.get(url).send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, ApiError>((status, bytes))
        };
        let (status, bytes) = tokio::select! {
            biased;
            _ = ctx.cancel_token().cancelled() => return Err(ApiError::Cancelled),
            result = call => result?,
        };
        if !status.is_success() {
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: String::new(),
            });
        }
        decode_geonames(&bytes)
    }
}
