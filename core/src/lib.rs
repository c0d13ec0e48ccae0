//! Request identity layer for a web scanner.
//!
//! # Overview
//! An `HttpResource` is one request candidate discovered while crawling: a
//! method, a base path, and ordered get, post, and upload parameters. The
//! crate gives it a canonical identity (equality, hash, ordering) and the
//! string forms a scanner needs to log, diff, and reproduce it. It performs
//! no I/O; a `Transport` implementation sends resources and writes the
//! results back.
//!
//! # Design
//! - Parameters are fixed at construction and exposed as read-only slices.
//! - Derived strings and the identity hash are memoized in `OnceLock`s.
//! - Ordering is by URL, then encoded body, so sorted collections of
//!   resources diff cleanly between scans.
//! - Transport failures degrade to "no response" instead of aborting.

pub mod error;
pub mod http;
mod identity;
pub mod path;
pub mod repr;
pub mod resource;
pub mod transport;
pub mod types;

pub use error::{TransportError, UnknownMethod};
pub use http::{HttpMethod, Response};
pub use path::PathModel;
pub use repr::shell_escape;
pub use resource::{DispatchInfo, HttpResource, HttpResourceBuilder};
pub use transport::{PreparedRequest, RequestBody, SendOverrides, Transport};
pub use types::{parse_query, FileParameter, Parameter, ParameterInput, UploadFile};
