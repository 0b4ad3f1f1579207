//! Lookup gateway client for waybill.
//!
//! This crate provides the HTTP client for the two pincode endpoints the
//! booking form consumes: pincode→location detail and pincode→area list.
//! Both are form-encoded `POST`s carrying a session bearer token.
//!
//! # Example
//!
//! ```no_run
//! use waybill_lookup::{LocationDirectory, LookupClient};
//!
//! let client = LookupClient::new("https://api.example.com");
//!
//! let detail = client.pincode_detail("session-token", "400001");
//! let areas = client.area_list("session-token", "400001");
//! ```

use std::time::Duration;

use serde::Deserialize;
use waybill_types::{AreaOption, LookupError, PincodeDetail};

/// Default timeout for gateway requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent for gateway requests
pub const USER_AGENT: &str = concat!("waybill/", env!("CARGO_PKG_VERSION"));

/// Path of the pincode-detail endpoint
pub const PINCODE_DETAIL_PATH: &str = "/api/pincode/detail";

/// Path of the area-list endpoint
pub const AREA_LIST_PATH: &str = "/api/pincode/areas";

/// Envelope status value marking a successful lookup
const STATUS_SUCCESS: &str = "success";

/// Resolver seam the form engine consumes.
///
/// `LookupClient` is the production implementation; tests substitute
/// scripted directories.
pub trait LocationDirectory: Send + Sync {
    /// Resolve a 6-digit pincode to its location detail.
    fn pincode_detail(&self, token: &str, pincode: &str) -> Result<PincodeDetail, LookupError>;

    /// List the selectable areas for a 6-digit pincode.
    fn area_list(&self, token: &str, pincode: &str) -> Result<Vec<AreaOption>, LookupError>;
}

/// Gateway API client
#[derive(Debug, Clone)]
pub struct LookupClient {
    base_url: String,
    timeout: Duration,
    client: reqwest::blocking::Client,
}

impl LookupClient {
    /// Create a new client for the given gateway base URL
    pub fn new(base_url: &str) -> Self {
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client: build_client(timeout),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = build_client(timeout);
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post_pincode(
        &self,
        path: &str,
        token: &str,
        pincode: &str,
    ) -> Result<reqwest::blocking::Response, LookupError> {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .post(&url)
            .header("Authorization", format!("Bearer {token}"))
            .form(&[("pincode", pincode)])
            .send()
            .map_err(|err| LookupError::Rejected(format!("lookup request failed: {err}")))
    }
}

impl LocationDirectory for LookupClient {
    fn pincode_detail(&self, token: &str, pincode: &str) -> Result<PincodeDetail, LookupError> {
        let response = self.post_pincode(PINCODE_DETAIL_PATH, token, pincode)?;
        let body = read_success_body(response)?;

        let envelope: DetailEnvelope = serde_json::from_str(&body)
            .map_err(|_| LookupError::Rejected(unexpected_body_message()))?;

        if envelope.status != STATUS_SUCCESS {
            return Err(LookupError::Rejected(envelope.failure_message()));
        }

        Ok(PincodeDetail {
            area_id: envelope.area_id.unwrap_or_default(),
            area_name: envelope.area_name.unwrap_or_default(),
            city_id: envelope.city_id.unwrap_or_default(),
            city_name: envelope.city_name.unwrap_or_default(),
            state_id: envelope.state_id.unwrap_or_default(),
            state_name: envelope.state_name.unwrap_or_default(),
            country_id: envelope.country_id.unwrap_or_default(),
            country_name: envelope.country_name.unwrap_or_default(),
        })
    }

    fn area_list(&self, token: &str, pincode: &str) -> Result<Vec<AreaOption>, LookupError> {
        let response = self.post_pincode(AREA_LIST_PATH, token, pincode)?;
        let body = read_success_body(response)?;

        let envelope: AreaEnvelope = serde_json::from_str(&body)
            .map_err(|_| LookupError::Rejected(unexpected_body_message()))?;

        if envelope.status != STATUS_SUCCESS {
            return Err(LookupError::Rejected(envelope.failure_message()));
        }

        Ok(envelope.area)
    }
}

fn build_client(timeout: Duration) -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| reqwest::blocking::Client::new())
}

/// Turn a non-2xx response into a `LookupError`, preferring the gateway's
/// own `message` field over the bare status code.
fn read_success_body(response: reqwest::blocking::Response) -> Result<String, LookupError> {
    let status = response.status();
    let body = response.text().unwrap_or_default();

    if status.is_success() {
        return Ok(body);
    }

    if let Some(message) = parse_failure_message(&body) {
        return Err(LookupError::Rejected(message));
    }
    Err(LookupError::Http(status.as_u16()))
}

fn parse_failure_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct FailureBody {
        message: Option<String>,
    }

    serde_json::from_str::<FailureBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
}

fn unexpected_body_message() -> String {
    "unexpected response from the lookup gateway".to_string()
}

/// Response from the pincode-detail endpoint
#[derive(Debug, Deserialize)]
struct DetailEnvelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    area_id: Option<String>,
    area_name: Option<String>,
    city_id: Option<String>,
    city_name: Option<String>,
    state_id: Option<String>,
    state_name: Option<String>,
    country_id: Option<String>,
    country_name: Option<String>,
}

impl DetailEnvelope {
    fn failure_message(&self) -> String {
        self.message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "pincode lookup was rejected by the gateway".to_string())
    }
}

/// Response from the area-list endpoint
#[derive(Debug, Deserialize)]
struct AreaEnvelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "Area")]
    area: Vec<AreaOption>,
}

impl AreaEnvelope {
    fn failure_message(&self) -> String {
        self.message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "area lookup was rejected by the gateway".to_string())
    }
}
