//! The seam between resources and whatever sends them over the network.
//!
//! # Design
//! A transport receives a resource plus optional overrides, and
//! `PreparedRequest::new` turns the pair into plain data: method, target
//! URL, headers, body. Override precedence lives here rather than in each
//! transport, so every implementation sends the same bytes for the same
//! inputs and the rules stay testable without a network.
//!
//! Failures are never fatal to a scan. `try_send` reports why a request
//! failed; `send` logs that reason and yields `None`.

use log::warn;

use crate::error::TransportError;
use crate::http::{HttpMethod, Response};
use crate::repr;
use crate::resource::HttpResource;
use crate::types::{FileParameter, Parameter, ParameterInput};

/// Per-call replacements for what the resource itself carries.
#[derive(Debug, Clone, Default)]
pub struct SendOverrides {
    /// Extra headers, applied after the transport's base headers.
    pub headers: Vec<(String, String)>,
    pub get_params: ParameterInput,
    pub post_params: ParameterInput,
    pub file_params: Option<Vec<FileParameter>>,
}

impl SendOverrides {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn get_params(mut self, params: impl Into<ParameterInput>) -> Self {
        self.get_params = params.into();
        self
    }

    pub fn post_params(mut self, params: impl Into<ParameterInput>) -> Self {
        self.post_params = params.into();
        self
    }

    pub fn file_params(mut self, files: Vec<FileParameter>) -> Self {
        self.file_params = Some(files);
        self
    }
}

/// Body of a prepared request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    /// Already `application/x-www-form-urlencoded`.
    Form(String),
    Multipart {
        fields: Vec<Parameter>,
        files: Vec<FileParameter>,
    },
}

/// A request reduced to plain data, ready for a transport to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    /// Target including the query string.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl PreparedRequest {
    pub fn new(resource: &HttpResource, overrides: &SendOverrides) -> Self {
        let query = match &overrides.get_params {
            ParameterInput::Absent => resource.encoded_params().to_string(),
            ParameterInput::List(params) => repr::encode_params(params),
            ParameterInput::Encoded(raw) => raw.clone(),
        };
        let url = if query.is_empty() {
            resource.path().to_string()
        } else {
            format!("{}?{}", resource.path(), query)
        };

        let mut headers = Vec::new();
        if !resource.referer().is_empty() {
            headers.push(("referer".to_string(), resource.referer().to_string()));
        }

        let method = resource.method();
        let body = if method.is_bodyless() {
            RequestBody::Empty
        } else {
            let files = overrides
                .file_params
                .clone()
                .unwrap_or_else(|| resource.file_params().to_vec());
            if !files.is_empty() {
                let fields = match &overrides.post_params {
                    ParameterInput::Absent => resource.post_params().to_vec(),
                    other => other.clone().into_params(),
                };
                RequestBody::Multipart { fields, files }
            } else {
                // An encoded override is sent byte for byte.
                let encoded = match &overrides.post_params {
                    ParameterInput::Absent => resource.encoded_data().to_string(),
                    ParameterInput::List(params) => repr::encode_params(params),
                    ParameterInput::Encoded(raw) => raw.clone(),
                };
                if encoded.is_empty() {
                    RequestBody::Empty
                } else {
                    headers.push((
                        "content-type".to_string(),
                        "application/x-www-form-urlencoded".to_string(),
                    ));
                    RequestBody::Form(encoded)
                }
            }
        };

        headers.extend(overrides.headers.iter().cloned());
        Self {
            method,
            url,
            headers,
            body,
        }
    }
}

/// Something that can dispatch a resource.
///
/// Implementations must not follow redirects, must bound each exchange
/// with a timeout, and on success must write headers, elapsed time, and
/// body size back onto `resource`.
pub trait Transport {
    fn try_send(&self, resource: &mut HttpResource, overrides: &SendOverrides) -> Result<Response, TransportError>;

    fn send(&self, resource: &mut HttpResource, overrides: &SendOverrides) -> Option<Response> {
        match self.try_send(resource, overrides) {
            Ok(response) => Some(response),
            Err(err) => {
                warn!("no response for {}: {err}", resource.url());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header<'a>(req: &'a PreparedRequest, name: &str) -> Option<&'a str> {
        req.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn get_uses_resource_url() {
        let res = HttpResource::new("http://example.com/s?q=a b");
        let req = PreparedRequest::new(&res, &SendOverrides::default());
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://example.com/s?q=a%20b");
        assert_eq!(req.body, RequestBody::Empty);
        assert!(req.headers.is_empty());
    }

    #[test]
    fn get_override_replaces_query() {
        let res = HttpResource::new("http://example.com/s?q=1");
        let overrides = SendOverrides::default().get_params("q=<script>");
        let req = PreparedRequest::new(&res, &overrides);
        assert_eq!(req.url, "http://example.com/s?q=<script>");

        let overrides = SendOverrides::default().get_params(vec![Parameter::new("q", "'")]);
        let req = PreparedRequest::new(&res, &overrides);
        assert_eq!(req.url, "http://example.com/s?q=%27");
    }

    #[test]
    fn post_is_form_encoded_with_referer() {
        let res = HttpResource::builder("http://example.com/login?next=home")
            .post_params("user=admin&pass=x")
            .referer("http://example.com/")
            .build();
        let req = PreparedRequest::new(&res, &SendOverrides::default());
        assert_eq!(req.url, "http://example.com/login?next=home");
        assert_eq!(req.body, RequestBody::Form("user=admin&pass=x".to_string()));
        assert_eq!(header(&req, "referer"), Some("http://example.com/"));
        assert_eq!(header(&req, "content-type"), Some("application/x-www-form-urlencoded"));
    }

    #[test]
    fn post_override_wins_over_stored_body() {
        let res = HttpResource::builder("http://example.com/login")
            .post_params("user=admin")
            .build();
        let overrides = SendOverrides::default()
            .post_params("user=' or 1=1")
            .header("x-scan", "1");
        let req = PreparedRequest::new(&res, &overrides);
        assert_eq!(req.body, RequestBody::Form("user=' or 1=1".to_string()));
        assert_eq!(req.headers.last().map(|(k, _)| k.as_str()), Some("x-scan"));
    }

    #[test]
    fn files_switch_to_multipart() {
        let res = HttpResource::builder("http://example.com/upload")
            .post_params("title=cv")
            .file_params(vec![FileParameter::new("doc", "cv.pdf", "%PDF")])
            .build();
        let req = PreparedRequest::new(&res, &SendOverrides::default());
        match &req.body {
            RequestBody::Multipart { fields, files } => {
                assert_eq!(fields, &vec![Parameter::new("title", "cv")]);
                assert_eq!(files[0].filename(), "cv.pdf");
            }
            other => panic!("expected multipart, got {other:?}"),
        }
        assert_eq!(header(&req, "content-type"), None);
    }

    #[test]
    fn post_list_override_is_encoded() {
        let res = HttpResource::builder("http://example.com/login")
            .post_params("user=admin")
            .build();
        let overrides = SendOverrides::default().post_params(vec![Parameter::new("user", "' or 1=1")]);
        let req = PreparedRequest::new(&res, &overrides);
        assert_eq!(req.body, RequestBody::Form("user=%27%20or%201%3D1".to_string()));
    }

    #[test]
    fn encoded_post_override_is_split_for_uploads() {
        let res = HttpResource::builder("http://example.com/upload")
            .post_params("title=cv")
            .file_params(vec![FileParameter::new("doc", "cv.pdf", "%PDF")])
            .build();
        let overrides = SendOverrides::default().post_params("title=' or 1=1&flag");
        let req = PreparedRequest::new(&res, &overrides);
        assert_eq!(
            req.body,
            RequestBody::Multipart {
                fields: vec![Parameter::new("title", "' or 1=1"), Parameter::flag("flag")],
                files: vec![FileParameter::new("doc", "cv.pdf", "%PDF")],
            }
        );
    }

    #[test]
    fn bodyless_method_drops_body() {
        let res = HttpResource::builder("http://example.com/x")
            .method(HttpMethod::Head)
            .post_params("a=1")
            .build();
        let req = PreparedRequest::new(&res, &SendOverrides::default());
        assert_eq!(req.body, RequestBody::Empty);
    }

    struct Unreachable;

    impl Transport for Unreachable {
        fn try_send(&self, _: &mut HttpResource, _: &SendOverrides) -> Result<Response, TransportError> {
            Err(TransportError::Connection("refused".to_string()))
        }
    }

    #[test]
    fn send_degrades_failures_to_none() {
        let mut res = HttpResource::new("http://127.0.0.1:1/");
        assert!(Unreachable.send(&mut res, &SendOverrides::default()).is_none());
        assert!(res.headers().is_empty());
    }
}
