//! `HttpResource`: one request candidate found while crawling.
//!
//! # Design
//! Everything that feeds the resource's identity (method, path, the three
//! parameter lists) is fixed when `build()` returns. Derived strings are
//! computed on first use and kept in `OnceLock` cells, so a resource shared
//! between scanner threads renders each form once and readers never observe
//! a half-built value.
//!
//! The only fields that change later are the dispatch results. Writing them
//! takes `&mut self`, which keeps a resource to a single in-flight dispatch.

use std::fmt;
use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime};

use crate::http::HttpMethod;
use crate::path::PathModel;
use crate::repr;
use crate::types::{parse_query, split_query, FileParameter, ParamList, Parameter, ParameterInput};

/// A request candidate with a stable identity.
///
/// Equality, hashing, and ordering are implemented in `identity`.
#[derive(Debug, Clone)]
pub struct HttpResource {
    pub(crate) method: HttpMethod,
    pub(crate) path: String,
    pub(crate) get_params: ParamList<Parameter>,
    pub(crate) post_params: ParamList<Parameter>,
    pub(crate) file_params: ParamList<FileParameter>,
    encoding: String,
    referer: String,
    link_depth: u32,
    location: PathModel,
    pub(crate) cache: DerivedCache,
    dispatch: DispatchInfo,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct DerivedCache {
    pub(crate) hash: OnceLock<u64>,
    url: OnceLock<String>,
    encoded_params: OnceLock<String>,
    encoded_data: OnceLock<String>,
    encoded_files: OnceLock<String>,
    get_keys: OnceLock<String>,
    post_keys: OnceLock<String>,
    file_keys: OnceLock<String>,
}

/// What a transport learned while dispatching the resource.
#[derive(Debug, Clone, Default)]
pub struct DispatchInfo {
    pub headers: Vec<(String, String)>,
    pub start_time: Option<SystemTime>,
    pub elapsed: Option<Duration>,
    pub size: usize,
    started: Option<Instant>,
}

impl HttpResource {
    /// A resource with no explicit parameters. A query string in `path` is
    /// split off into get parameters.
    pub fn new(path: impl Into<String>) -> Self {
        HttpResourceBuilder::new(path).build()
    }

    pub fn builder(path: impl Into<String>) -> HttpResourceBuilder {
        HttpResourceBuilder::new(path)
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Base path, without the query string that was split off.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn get_params(&self) -> &[Parameter] {
        self.get_params.as_slice()
    }

    pub fn post_params(&self) -> &[Parameter] {
        self.post_params.as_slice()
    }

    pub fn file_params(&self) -> &[FileParameter] {
        self.file_params.as_slice()
    }

    pub fn get_keys(&self) -> Vec<&str> {
        self.get_params().iter().map(|p| p.key.as_str()).collect()
    }

    pub fn post_keys(&self) -> Vec<&str> {
        self.post_params().iter().map(|p| p.key.as_str()).collect()
    }

    pub fn file_keys(&self) -> Vec<&str> {
        self.file_params().iter().map(|f| f.key.as_str()).collect()
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn referer(&self) -> &str {
        &self.referer
    }

    pub fn link_depth(&self) -> u32 {
        self.link_depth
    }

    pub fn path_model(&self) -> &PathModel {
        &self.location
    }

    pub fn hostname(&self) -> &str {
        self.location.hostname()
    }

    pub fn port(&self) -> u16 {
        self.location.port()
    }

    pub fn file_path(&self) -> &str {
        self.location.file_path()
    }

    pub fn file_name(&self) -> &str {
        self.location.file_name()
    }

    pub fn file_extension(&self) -> &str {
        self.location.file_extension()
    }

    pub fn is_root(&self) -> bool {
        self.location.is_root()
    }

    pub fn directory_name(&self) -> String {
        self.location.directory_name()
    }

    pub fn parent_directory(&self) -> String {
        self.location.parent_directory()
    }

    /// Base path plus the encoded query string, if any.
    pub fn url(&self) -> &str {
        self.cache.url.get_or_init(|| {
            if self.get_params.is_empty() {
                self.path.clone()
            } else {
                format!("{}?{}", self.path, self.encoded_params())
            }
        })
    }

    pub fn encoded_params(&self) -> &str {
        self.cache
            .encoded_params
            .get_or_init(|| repr::encode_params(self.get_params()))
    }

    /// Post parameters as an `application/x-www-form-urlencoded` body.
    pub fn encoded_data(&self) -> &str {
        self.cache
            .encoded_data
            .get_or_init(|| repr::encode_params(self.post_params()))
    }

    pub fn encoded_files(&self) -> &str {
        self.cache
            .encoded_files
            .get_or_init(|| repr::encode_files(self.file_params()))
    }

    pub fn encoded_get_keys(&self) -> &str {
        self.cache
            .get_keys
            .get_or_init(|| repr::encode_keys(self.get_keys()))
    }

    pub fn encoded_post_keys(&self) -> &str {
        self.cache
            .post_keys
            .get_or_init(|| repr::encode_keys(self.post_keys()))
    }

    pub fn encoded_file_keys(&self) -> &str {
        self.cache
            .file_keys
            .get_or_init(|| repr::encode_keys(self.file_keys()))
    }

    /// A `curl` command line reproducing this request.
    pub fn curl_repr(&self) -> String {
        repr::curl(self)
    }

    /// An approximate raw HTTP request, for display. Upload contents are
    /// replaced with a placeholder.
    pub fn http_repr(&self) -> String {
        repr::http_wire(self)
    }

    pub fn dispatch_info(&self) -> &DispatchInfo {
        &self.dispatch
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.dispatch.headers
    }

    pub fn start_time(&self) -> Option<SystemTime> {
        self.dispatch.start_time
    }

    pub fn elapsed_time(&self) -> Option<Duration> {
        self.dispatch.elapsed
    }

    pub fn size(&self) -> usize {
        self.dispatch.size
    }

    pub fn record_start(&mut self) {
        self.dispatch.start_time = Some(SystemTime::now());
        self.dispatch.started = Some(Instant::now());
    }

    /// Store the time since `record_start`. Does nothing if the dispatch
    /// was never started.
    pub fn record_elapsed(&mut self) {
        if let Some(started) = self.dispatch.started {
            self.dispatch.elapsed = Some(started.elapsed());
        }
    }

    pub fn set_headers(&mut self, headers: Vec<(String, String)>) {
        self.dispatch.headers = headers;
    }

    pub fn set_size(&mut self, size: usize) {
        self.dispatch.size = size;
    }
}

impl fmt::Display for HttpResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url())?;
        if !self.post_params.is_empty() {
            write!(f, "\n\tdata = {}", self.encoded_data())?;
        }
        if !self.file_params.is_empty() {
            write!(f, "\n\tfiles = {}", self.encoded_files())?;
        }
        Ok(())
    }
}

/// Collects the pieces of an `HttpResource`.
///
/// Get parameters resolve with this precedence: an explicit list, then an
/// explicit encoded string, then a query string embedded in the path.
#[derive(Debug, Clone)]
pub struct HttpResourceBuilder {
    path: String,
    method: Option<HttpMethod>,
    get_params: ParameterInput,
    post_params: ParameterInput,
    file_params: Vec<FileParameter>,
    encoding: String,
    referer: String,
    link_depth: u32,
}

impl HttpResourceBuilder {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: None,
            get_params: ParameterInput::Absent,
            post_params: ParameterInput::Absent,
            file_params: Vec::new(),
            encoding: "UTF-8".to_string(),
            referer: String::new(),
            link_depth: 0,
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
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
        self.file_params = files;
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }

    pub fn link_depth(mut self, depth: u32) -> Self {
        self.link_depth = depth;
        self
    }

    pub fn build(self) -> HttpResource {
        let (path, get_params) = if self.get_params.is_absent() {
            match split_query(&self.path) {
                (base, Some(query)) => (base.to_string(), parse_query(query)),
                (_, None) => (self.path.clone(), Vec::new()),
            }
        } else {
            (self.path, self.get_params.into_params())
        };
        let post_params = self.post_params.into_params();

        let method = self.method.unwrap_or(if post_params.is_empty() && self.file_params.is_empty() {
            HttpMethod::Get
        } else {
            HttpMethod::Post
        });

        HttpResource {
            method,
            location: PathModel::new(&path),
            path,
            get_params: get_params.into(),
            post_params: post_params.into(),
            file_params: self.file_params.into(),
            encoding: self.encoding,
            referer: self.referer,
            link_depth: self.link_depth,
            cache: DerivedCache::default(),
            dispatch: DispatchInfo::default(),
        }
    }
}
