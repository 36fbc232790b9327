//! External content records HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required). Each call checks for
//! exactly one success status; anything else becomes a [`ClientError`] that
//! carries the server's decoded error payload and is logged before returning.

use std::fmt;
use std::time::Duration;

use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

use crate::api::RecordsApi;
use crate::error::{floor_char_boundary, ClientError, ErrorBody, Operation};
use crate::model::{RecordEnvelope, RecordPage, RecordPayload};

const RECORDS_PATH: &str = "/api/v2/guide/external_content/records";
const USER_AGENT: &str = concat!("guidesync/", env!("CARGO_PKG_VERSION"));

// ── Credential ──────────────────────────────────────────────────────

/// Basic-scheme credential, held already base64-encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Use a value that is already `base64(user:secret)`.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into().trim().to_string())
    }

    /// Encode `user:secret` (e.g. `agent@example.com/token:API_TOKEN`).
    pub fn from_user_secret(user: &str, secret: &str) -> Self {
        let raw = format!("{user}:{secret}");
        Self(base64::engine::general_purpose::STANDARD.encode(raw))
    }

    pub fn header_value(&self) -> String {
        format!("Basic {}", self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

// ── Options ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API host, e.g. `https://example.zendesk.com`.
    pub api_base_url: String,
    pub credential: Credential,
    pub timeout: Duration,
    /// Sent as `page[size]` on list calls when set.
    pub page_size: Option<u32>,
}

impl ClientOptions {
    pub fn new(api_base_url: impl Into<String>, credential: Credential) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            credential,
            timeout: Duration::from_secs(60),
            page_size: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }
}

// ── Client ──────────────────────────────────────────────────────────

/// External content records API client (blocking).
#[derive(Clone)]
pub struct HttpRecordsClient {
    http: reqwest::blocking::Client,
    records_url: String,
    page_size: Option<u32>,
}

impl HttpRecordsClient {
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        let base = options.api_base_url.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "API base URL must start with http:// or https://, got '{}'",
                options.api_base_url
            )));
        }
        if options.credential.is_empty() {
            return Err(ClientError::Config("credential is empty".into()));
        }

        let mut auth = HeaderValue::from_str(&options.credential.header_value())
            .map_err(|_| ClientError::Config("credential contains invalid header characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(options.timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            records_url: format!("{base}{RECORDS_PATH}"),
            page_size: options.page_size,
        })
    }

    fn record_url(&self, id: &str) -> String {
        format!("{}/{}", self.records_url, encode_path_segment(id))
    }

    // ── Internal helpers ────────────────────────────────────────────

    /// Send and require exactly the operation's success status.
    fn send(
        &self,
        operation: Operation,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<reqwest::blocking::Response, ClientError> {
        let response = request.send().map_err(|e| {
            logged(ClientError::Transport {
                operation,
                message: e.to_string(),
            })
        })?;

        let status = response.status().as_u16();
        let expected = operation.expected_status();
        if status != expected {
            let text = response.text().unwrap_or_default();
            return Err(logged(ClientError::Status {
                operation,
                status,
                expected,
                body: ErrorBody::parse(&text),
            }));
        }

        Ok(response)
    }
}

impl RecordsApi for HttpRecordsClient {
    fn create_record(&self, payload: &RecordPayload) -> Result<(), ClientError> {
        let request = self
            .http
            .post(&self.records_url)
            .json(&RecordEnvelope { record: payload });
        self.send(Operation::Create, request)?;
        Ok(())
    }

    fn update_record(&self, id: &str, payload: &RecordPayload) -> Result<(), ClientError> {
        let request = self
            .http
            .put(self.record_url(id))
            .json(&RecordEnvelope { record: payload });
        self.send(Operation::Update, request)?;
        Ok(())
    }

    fn delete_record(&self, id: &str) -> Result<(), ClientError> {
        let request = self.http.delete(self.record_url(id));
        self.send(Operation::Delete, request)?;
        Ok(())
    }

    fn list_records(&self, cursor: Option<&str>) -> Result<RecordPage, ClientError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(cursor) = cursor {
            query.push(("page[after]", cursor.to_string()));
        }
        if let Some(size) = self.page_size {
            query.push(("page[size]", size.to_string()));
        }

        let request = self.http.get(&self.records_url).query(&query);
        let response = self.send(Operation::List, request)?;

        let text = response.text().map_err(|e| {
            logged(ClientError::Decode {
                operation: Operation::List,
                message: format!("cannot read body: {e}"),
            })
        })?;
        serde_json::from_str(&text).map_err(|e| {
            logged(ClientError::Decode {
                operation: Operation::List,
                message: format!("{e} (body: {})", &text[..floor_char_boundary(&text, 200)]),
            })
        })
    }
}

// ── Free functions ──────────────────────────────────────────────────

pub(crate) fn logged(err: ClientError) -> ClientError {
    match &err {
        ClientError::Status { operation, status, body, .. } => {
            tracing::error!(%operation, status, body = %body, "remote API rejected request");
        }
        other => tracing::error!(error = %other, "remote API request failed"),
    }
    err
}

/// Percent-encode an opaque id for use as one path segment.
fn encode_path_segment(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
