//! Single-attempt HTTP delivery to the collector endpoint.
//!
//! Each publish call serializes one snapshot, signs it, and performs one
//! `POST {collector}/api/logs?api-version=2016-04-01`. The response status
//! and body are logged for observability; a non-2xx status is reported in
//! the receipt, not as an error. Only transport-level failures (connect,
//! TLS, request, timeout) surface as errors.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, info, warn};

use crate::error::{TelemetryError, TelemetryResult};
use crate::signer::{CONTENT_TYPE, rfc1123_gmt, sign};
use crate::snapshot::Snapshot;

/// Resource path of the ingestion API, part of the signed canonical string.
const RESOURCE_PATH: &str = "/api/logs";

/// API version sent as a query parameter on every request.
const API_VERSION: &str = "2016-04-01";

/// Value of the `Log-Type` header, naming the target custom log table.
const LOG_TYPE: &str = "MinecraftStats";

/// Domain suffix of the hosted collector service.
const COLLECTOR_DOMAIN: &str = "ods.opinsights.azure.com";

/// Transport scheme for the collector connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    Http,
    Https,
}

/// Where telemetry is delivered: scheme, host, and port of the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorEndpoint {
    scheme: Scheme,
    host: String,
    port: u16,
}

impl CollectorEndpoint {
    /// The hosted collector endpoint derived from a customer id.
    pub fn for_customer(customer_id: &str) -> Self {
        Self {
            scheme: Scheme::Https,
            host: format!("{customer_id}.{COLLECTOR_DOMAIN}"),
            port: 443,
        }
    }

    /// Parse an endpoint override like `https://collector.example:8443`.
    ///
    /// The override must be a base URL: scheme and authority only, no path
    /// or query. Plain `http` is accepted for non-TLS collectors.
    pub fn parse(raw: &str) -> TelemetryResult<Self> {
        let uri: http::Uri = raw
            .parse()
            .map_err(|e| TelemetryError::Endpoint(format!("{raw}: {e}")))?;

        let scheme = match uri.scheme_str() {
            Some("https") => Scheme::Https,
            Some("http") => Scheme::Http,
            other => {
                return Err(TelemetryError::Endpoint(format!(
                    "{raw}: unsupported scheme {other:?}"
                )));
            }
        };

        let host = uri
            .host()
            .ok_or_else(|| TelemetryError::Endpoint(format!("{raw}: missing host")))?
            .to_string();

        if !uri.path().is_empty() && uri.path() != "/" || uri.query().is_some() {
            return Err(TelemetryError::Endpoint(format!(
                "{raw}: endpoint must not carry a path or query"
            )));
        }

        let port = uri.port_u16().unwrap_or(match scheme {
            Scheme::Https => 443,
            Scheme::Http => 80,
        });

        Ok(Self { scheme, host, port })
    }

    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `Host` header value: the port is included only when non-default.
    fn host_header(&self) -> String {
        let default_port = match self.scheme {
            Scheme::Https => 443,
            Scheme::Http => 80,
        };
        if self.port == default_port {
            self.host.clone()
        } else {
            self.address()
        }
    }
}

/// Outcome of one delivery: the collector's response, whatever it was.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    /// HTTP status returned by the collector.
    pub status: http::StatusCode,
    /// Response body, usually empty on acceptance.
    pub body: String,
}

/// Delivers signed snapshots to the collector.
pub struct Publisher {
    customer_id: String,
    /// Decoded shared key bytes (validated at startup).
    shared_key: Vec<u8>,
    endpoint: CollectorEndpoint,
    /// Bound on one whole delivery: connect, TLS, request, response.
    timeout: Duration,
    tls: Arc<rustls::ClientConfig>,
}

impl Publisher {
    /// Create a publisher for the given credentials and endpoint.
    pub fn new(
        customer_id: impl Into<String>,
        shared_key: Vec<u8>,
        endpoint: CollectorEndpoint,
        timeout: Duration,
    ) -> TelemetryResult<Self> {
        Ok(Self {
            customer_id: customer_id.into(),
            shared_key,
            endpoint,
            timeout,
            tls: tls_client_config()?,
        })
    }

    /// Serialize, sign, and deliver one snapshot.
    ///
    /// Exactly one POST is attempted; there is no retry on any failure.
    pub async fn publish(&self, snapshot: &Snapshot) -> TelemetryResult<DeliveryReceipt> {
        let body = serde_json::to_vec(snapshot)?;
        let date = rfc1123_gmt(Utc::now());
        let signature = sign(
            &self.customer_id,
            &self.shared_key,
            &date,
            body.len(),
            "POST",
            RESOURCE_PATH,
        );

        match tokio::time::timeout(self.timeout, self.deliver(body, &date, &signature)).await {
            Ok(result) => result,
            Err(_) => Err(TelemetryError::Timeout(self.timeout)),
        }
    }

    async fn deliver(
        &self,
        body: Vec<u8>,
        date: &str,
        signature: &str,
    ) -> TelemetryResult<DeliveryReceipt> {
        let addr = self.endpoint.address();
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| TelemetryError::Connect {
                addr: addr.clone(),
                source,
            })?;
        debug!(%addr, "collector connection established");

        match self.endpoint.scheme {
            Scheme::Https => {
                let server_name = rustls::pki_types::ServerName::try_from(
                    self.endpoint.host.clone(),
                )
                .map_err(|e| {
                    TelemetryError::Endpoint(format!("{}: {e}", self.endpoint.host))
                })?;
                let connector = TlsConnector::from(self.tls.clone());
                let tls_stream = connector
                    .connect(server_name, stream)
                    .await
                    .map_err(|e| TelemetryError::Tls(e.to_string()))?;
                self.send_request(TokioIo::new(tls_stream), body, date, signature)
                    .await
            }
            Scheme::Http => {
                self.send_request(TokioIo::new(stream), body, date, signature)
                    .await
            }
        }
    }

    async fn send_request<T>(
        &self,
        io: T,
        body: Vec<u8>,
        date: &str,
        signature: &str,
    ) -> TelemetryResult<DeliveryReceipt>
    where
        T: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
    {
        let (mut sender, conn) = http1::handshake(io).await?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = http::Request::builder()
            .method(http::Method::POST)
            .uri(format!("{RESOURCE_PATH}?api-version={API_VERSION}"))
            .header(http::header::HOST, self.endpoint.host_header())
            .header(http::header::CONTENT_TYPE, CONTENT_TYPE)
            .header(http::header::AUTHORIZATION, signature)
            .header("Log-Type", LOG_TYPE)
            .header("x-ms-date", date)
            .body(Full::new(Bytes::from(body)))?;

        let resp = sender.send_request(req).await?;
        let status = resp.status();
        let body_bytes = resp.into_body().collect().await?.to_bytes();
        let body = String::from_utf8_lossy(&body_bytes).into_owned();

        if status.is_success() {
            info!(%status, body = %body, "collector accepted telemetry");
        } else {
            warn!(%status, body = %body, "collector rejected telemetry");
        }

        Ok(DeliveryReceipt { status, body })
    }
}

/// Build the rustls client configuration with the Mozilla root store.
fn tls_client_config() -> TelemetryResult<Arc<rustls::ClientConfig>> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder_with_provider(
        rustls::crypto::ring::default_provider().into(),
    )
    .with_safe_default_protocol_versions()
    .map_err(|e| TelemetryError::Tls(format!("tls protocol version error: {e}")))?
    .with_root_certificates(roots)
    .with_no_client_auth();

    Ok(Arc::new(config))
}
