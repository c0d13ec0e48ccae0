//! Blocking `Transport` for `resource-core`, built on `ureq`.
//!
//! # Overview
//! `UreqTransport` sends an `HttpResource` the way a scanner needs it sent:
//! redirects are returned instead of followed, every exchange is bounded by
//! a timeout, 4xx/5xx statuses come back as data, and failures turn into
//! "no response" so a scan keeps going past dead endpoints.
//!
//! # Design
//! - Override precedence and body selection come from
//!   `PreparedRequest::new`; this crate only maps the result onto `ureq`.
//! - The agent is rebuilt whenever a setting it owns changes (timeout, TLS
//!   verification, proxy). Headers are applied per request.
//! - A TLS failure is logged at `warn` once per transport; later ones drop
//!   to `debug` so a target with a bad certificate cannot flood the log.

pub mod encode;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, warn};
use resource_core::{
    FileParameter, HttpMethod, HttpResource, Parameter, PreparedRequest, RequestBody, Response, SendOverrides,
    Transport, TransportError,
};
use ureq::typestate::WithBody;
use ureq::{Agent, RequestBuilder};
use uuid::Uuid;

pub use encode::{encode, quote};

/// Settings for a `UreqTransport`.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub verify_tls: bool,
    /// `http://host:port` or `https://host:port`. Other schemes are ignored.
    pub proxy: Option<String>,
    pub user_agent: String,
    /// Sent with every request, before per-call headers.
    pub base_headers: Vec<(String, String)>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(6),
            verify_tls: true,
            proxy: None,
            user_agent: "Mozilla/4.0 (compatible; MSIE 5.5; Windows NT)".to_string(),
            base_headers: Vec::new(),
        }
    }
}

pub struct UreqTransport {
    agent: Agent,
    config: TransportConfig,
    tls_warned: AtomicBool,
}

impl UreqTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(TransportConfig::default())
    }

    pub fn with_config(config: TransportConfig) -> Result<Self, TransportError> {
        let agent = build_agent(&config)?;
        Ok(Self {
            agent,
            config,
            tls_warned: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> Result<(), TransportError> {
        self.config.timeout = timeout;
        self.rebuild()
    }

    pub fn set_verify_tls(&mut self, verify: bool) -> Result<(), TransportError> {
        self.config.verify_tls = verify;
        self.rebuild()
    }

    pub fn set_proxy(&mut self, proxy: Option<String>) -> Result<(), TransportError> {
        self.config.proxy = proxy;
        self.rebuild()
    }

    /// Add a header sent with every request.
    pub fn add_custom_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.config.base_headers.push((name.into(), value.into()));
    }

    /// Whether a TLS failure has already been reported.
    pub fn tls_error_occurred(&self) -> bool {
        self.tls_warned.load(Ordering::Relaxed)
    }

    fn rebuild(&mut self) -> Result<(), TransportError> {
        self.agent = build_agent(&self.config)?;
        Ok(())
    }

    fn execute(&self, prepared: PreparedRequest) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        let mut headers = vec![("user-agent".to_string(), self.config.user_agent.clone())];
        headers.extend(self.config.base_headers.iter().cloned());

        let body = match prepared.body {
            RequestBody::Empty => None,
            RequestBody::Form(encoded) => Some(encoded.into_bytes()),
            RequestBody::Multipart { fields, files } => {
                let boundary = Uuid::new_v4().simple().to_string();
                headers.push((
                    "content-type".to_string(),
                    format!("multipart/form-data; boundary={boundary}"),
                ));
                Some(multipart_body(&fields, &files, &boundary))
            }
        };
        headers.extend(prepared.headers);

        let url = prepared.url.as_str();
        let agent = &self.agent;
        match prepared.method {
            HttpMethod::Get => with_headers(agent.get(url), &headers).call(),
            HttpMethod::Head => with_headers(agent.head(url), &headers).call(),
            HttpMethod::Options => with_headers(agent.options(url), &headers).call(),
            HttpMethod::Trace => with_headers(agent.trace(url), &headers).call(),
            HttpMethod::Connect => with_headers(agent.connect(url), &headers).call(),
            HttpMethod::Delete => match body {
                Some(bytes) => with_headers(agent.delete(url).force_send_body(), &headers).send(&bytes[..]),
                None => with_headers(agent.delete(url), &headers).call(),
            },
            HttpMethod::Post => send(with_headers(agent.post(url), &headers), body),
            HttpMethod::Put => send(with_headers(agent.put(url), &headers), body),
            HttpMethod::Patch => send(with_headers(agent.patch(url), &headers), body),
        }
    }

    fn report(&self, resource: &HttpResource, err: &TransportError) {
        match err {
            TransportError::Tls(msg) => {
                if !self.tls_warned.swap(true, Ordering::Relaxed) {
                    warn!("a TLS error occurred during the scan: {msg}");
                } else {
                    debug!("TLS error on {}: {msg}", resource.url());
                }
            }
            other => warn!("no response for {}: {other}", resource.url()),
        }
    }
}

impl Transport for UreqTransport {
    fn try_send(&self, resource: &mut HttpResource, overrides: &SendOverrides) -> Result<Response, TransportError> {
        let prepared = PreparedRequest::new(resource, overrides);
        debug!("{} {}", prepared.method, prepared.url);

        resource.record_start();
        let mut response = self.execute(prepared).map_err(classify)?;
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| TransportError::Body(e.to_string()))?;
        resource.record_elapsed();

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        resource.set_headers(headers.clone());
        resource.set_size(body.len());

        Ok(Response::new(response.status().as_u16(), headers, body))
    }

    fn send(&self, resource: &mut HttpResource, overrides: &SendOverrides) -> Option<Response> {
        match self.try_send(resource, overrides) {
            Ok(response) => Some(response),
            Err(err) => {
                self.report(resource, &err);
                None
            }
        }
    }
}

fn build_agent(config: &TransportConfig) -> Result<Agent, TransportError> {
    let proxy = match config.proxy.as_deref() {
        Some(uri) if uri.starts_with("http://") || uri.starts_with("https://") => {
            Some(ureq::Proxy::new(uri).map_err(|e| TransportError::InvalidUrl(e.to_string()))?)
        }
        Some(uri) => {
            warn!("ignoring proxy with unsupported scheme: {uri}");
            None
        }
        None => None,
    };

    let tls = ureq::tls::TlsConfig::builder()
        .disable_verification(!config.verify_tls)
        .build();

    Ok(Agent::config_builder()
        .http_status_as_error(false)
        .max_redirects(0)
        .timeout_global(Some(config.timeout))
        .proxy(proxy)
        .tls_config(tls)
        .build()
        .new_agent())
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send(
    builder: RequestBuilder<WithBody>,
    body: Option<Vec<u8>>,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(bytes) => builder.send(&bytes[..]),
        None => builder.send_empty(),
    }
}

/// Encode upload fields as `multipart/form-data`.
pub fn multipart_body(fields: &[Parameter], files: &[FileParameter], boundary: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for field in fields {
        out.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                field.key,
                field.value.as_deref().unwrap_or_default()
            )
            .as_bytes(),
        );
    }
    for file in files {
        out.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                file.key,
                file.filename()
            )
            .as_bytes(),
        );
        out.extend_from_slice(&file.file.content);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    out
}

fn classify(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::BadUri(msg) => TransportError::InvalidUrl(msg),
        ureq::Error::Rustls(e) => TransportError::Tls(e.to_string()),
        ureq::Error::Tls(msg) => TransportError::Tls(msg.to_string()),
        ureq::Error::Io(e) if caused_by_tls(&e) => TransportError::Tls(e.to_string()),
        other => TransportError::Connection(other.to_string()),
    }
}

/// A failed handshake surfaces as an I/O error wrapping a `rustls::Error`.
fn caused_by_tls(err: &std::io::Error) -> bool {
    let mut cause: Option<&(dyn std::error::Error + 'static)> =
        err.get_ref().map(|inner| inner as &(dyn std::error::Error + 'static));
    while let Some(e) = cause {
        if e.is::<rustls::Error>() {
            return true;
        }
        cause = match e.downcast_ref::<std::io::Error>() {
            Some(io) => io.get_ref().map(|inner| inner as &(dyn std::error::Error + 'static)),
            None => e.source(),
        };
    }
    false
}
