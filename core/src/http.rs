//! HTTP method and response types shared by the core and its transports.
//!
//! # Design
//! `Response` is plain owned data. A transport fills it in after the network
//! exchange and the scanner reads it back; nothing here performs I/O.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::SystemTime;

use encoding_rs::{Encoding, UTF_8};
use serde::{Deserialize, Serialize};

use crate::error::UnknownMethod;

/// HTTP method of a resource.
///
/// The declaration order is the order used to break ties between resources
/// that render to the same URL and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// Methods whose request carries no body; the transport puts everything
    /// in the URL for these.
    pub fn is_bodyless(&self) -> bool {
        matches!(
            self,
            HttpMethod::Get | HttpMethod::Head | HttpMethod::Options | HttpMethod::Trace | HttpMethod::Connect
        )
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "CONNECT" => Ok(HttpMethod::Connect),
            "OPTIONS" => Ok(HttpMethod::Options),
            "TRACE" => Ok(HttpMethod::Trace),
            "PATCH" => Ok(HttpMethod::Patch),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// A response produced by a `Transport`.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Address of the server that answered, when the transport knows it.
    pub peer: Option<SocketAddr>,
    pub timestamp: SystemTime,
    encoding: Option<String>,
}

impl Response {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        let encoding = charset_of(&headers);
        Self {
            status,
            headers,
            body,
            peer: None,
            timestamp: SystemTime::now(),
            encoding,
        }
    }

    pub fn with_peer(mut self, peer: Option<SocketAddr>) -> Self {
        self.peer = peer;
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// Body decoded with `encoding()`, or UTF-8 when no known charset is set.
    /// Malformed sequences are replaced.
    pub fn page(&self) -> String {
        let encoding = self
            .encoding()
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        let (text, _, _) = encoding.decode(&self.body);
        text.into_owned()
    }

    pub fn raw_page(&self) -> &[u8] {
        &self.body
    }

    /// Charset declared by the server in `Content-Type`, upper-cased, or the
    /// value last passed to `set_encoding`.
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    pub fn set_encoding(&mut self, encoding: &str) {
        self.encoding = Some(encoding.to_ascii_uppercase());
    }

    /// Encoding guessed from the body bytes alone.
    pub fn apparent_encoding(&self) -> Option<&'static str> {
        if self.body.is_empty() {
            None
        } else if self.body.is_ascii() {
            Some("ASCII")
        } else if std::str::from_utf8(&self.body).is_ok() {
            Some("UTF-8")
        } else {
            Some("ISO-8859-1")
        }
    }
}

fn charset_of(headers: &[(String, String)]) -> Option<String> {
    let content_type = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-type"))
        .map(|(_, value)| value)?;
    content_type.split(';').skip(1).find_map(|part| {
        let (name, value) = part.trim().split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').to_ascii_uppercase())
        } else {
            None
        }
    })
}
