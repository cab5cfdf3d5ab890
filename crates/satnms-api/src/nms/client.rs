// NMS API HTTP client
//
// Wraps `reqwest::Client` with NMS-specific URL construction and envelope
// unwrapping. Endpoint groups (objects, config snapshots, auth) are
// implemented as inherent methods in sibling files to keep this module
// focused on transport mechanics.

use std::sync::Arc;

use reqwest::cookie::Jar;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::nms::codes;
use crate::nms::models::NmsResponse;
use crate::transport::TransportConfig;

/// Raw HTTP client for the NMS management API.
///
/// Handles the `{ error_code, error_desc, data }` envelope and URL
/// construction under `/api/`. All methods return the unwrapped `data`
/// payload.
pub struct NmsClient {
    http: reqwest::Client,
    base_url: Url,
    /// Cookie jar holding the session cookie after login.
    cookie_jar: Option<Arc<Jar>>,
}

impl NmsClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// A cookie jar is created if the config doesn't carry one, because
    /// NMS sessions are cookie based. `base_url` is the NMS root
    /// (e.g. `http://10.0.0.10`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let cookie_jar = config.cookie_jar.clone();
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            cookie_jar,
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            cookie_jar: None,
        }
    }

    /// The underlying HTTP client (for auth flows that need direct access).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The NMS base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether a session cookie is currently held for the NMS.
    pub fn has_session_cookie(&self) -> bool {
        use reqwest::cookie::CookieStore;

        self.cookie_jar
            .as_ref()
            .and_then(|jar| jar.cookies(&self.base_url))
            .is_some()
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}/api/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and unwrap the envelope.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        Self::parse_envelope(resp).await
    }

    /// Send a POST request with a JSON body and unwrap the envelope.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).json(body).send().await?;
        Self::parse_envelope(resp).await
    }

    /// GET a raw (non-enveloped) body.
    pub(crate) async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, Error> {
        debug!("GET {} (raw)", url);
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::status_error(status, resp).await);
        }
        Ok(resp.bytes().await?.to_vec())
    }

    /// POST a raw body and unwrap the envelope of the reply.
    pub(crate) async fn post_bytes<T: DeserializeOwned>(
        &self,
        url: Url,
        body: Vec<u8>,
    ) -> Result<T, Error> {
        debug!("POST {} ({} bytes)", url, body.len());
        let resp = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await?;
        Self::parse_envelope(resp).await
    }

    /// Parse the `{ error_code, error_desc, data }` envelope, returning
    /// `data` on success or `Error::Nms` when `error_code != 0`.
    pub(crate) async fn parse_envelope<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "session expired or invalid credentials".into(),
            });
        }

        if !status.is_success() {
            return Err(Self::status_error(status, resp).await);
        }

        let body = resp.text().await?;
        trace!(body_len = body.len(), "envelope received");

        let envelope: NmsResponse = serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })?;

        if envelope.error_code != codes::OK {
            return Err(Error::Nms {
                code: envelope.error_code,
                message: envelope
                    .error_desc
                    .unwrap_or_else(|| format!("error_code={}", envelope.error_code)),
            });
        }

        serde_json::from_value(envelope.data).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Build an error from a non-success HTTP status, preferring the
    /// envelope's description when the body carries one.
    async fn status_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let body = resp.text().await.unwrap_or_default();
        if let Ok(envelope) = serde_json::from_str::<NmsResponse>(&body) {
            if envelope.error_code != codes::OK {
                return Error::Nms {
                    code: envelope.error_code,
                    message: envelope.error_desc.unwrap_or_default(),
                };
            }
        }
        Error::Http {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        }
    }
}
