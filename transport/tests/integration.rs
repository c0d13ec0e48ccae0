//! Dispatch resources against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port in a background thread, then sends
//! resources through `UreqTransport` over real HTTP and checks both the
//! returned `Response` and the metadata written back onto each resource.

use std::net::SocketAddr;
use std::time::Duration;

use mock_server::Echo;
use resource_core::{FileParameter, HttpMethod, HttpResource, Parameter, SendOverrides, Transport, TransportError};
use resource_transport::{TransportConfig, UreqTransport};

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn echo_of(response: &resource_core::Response) -> Echo {
    serde_json::from_slice(response.raw_page()).unwrap()
}

#[test]
fn get_sends_query_and_records_metadata() {
    let addr = start_server();
    let transport = UreqTransport::new().unwrap();

    let mut res = HttpResource::new(format!("http://{addr}/echo?var1=a b&flag"));
    let response = transport.send(&mut res, &SendOverrides::default()).unwrap();

    assert_eq!(response.status_code(), 200);
    let echo = echo_of(&response);
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.query.as_deref(), Some("var1=a%20b&flag"));
    assert_eq!(
        echo.headers["user-agent"],
        "Mozilla/4.0 (compatible; MSIE 5.5; Windows NT)"
    );

    assert_eq!(res.size(), response.body.len());
    assert!(res.elapsed_time().is_some());
    assert!(res.start_time().is_some());
    assert!(res
        .headers()
        .iter()
        .any(|(k, v)| k == "content-type" && v.starts_with("application/json")));
}

#[test]
fn post_sends_form_body_and_referer() {
    let addr = start_server();
    let transport = UreqTransport::new().unwrap();

    let mut res = HttpResource::builder(format!("http://{addr}/echo?var1=a"))
        .post_params(vec![Parameter::new("post1", "c"), Parameter::new("post2", "d")])
        .referer("http://example.com/start")
        .build();
    let echo = echo_of(&transport.send(&mut res, &SendOverrides::default()).unwrap());

    assert_eq!(echo.method, "POST");
    assert_eq!(echo.query.as_deref(), Some("var1=a"));
    assert_eq!(echo.body, "post1=c&post2=d");
    assert_eq!(echo.headers["content-type"], "application/x-www-form-urlencoded");
    assert_eq!(echo.headers["referer"], "http://example.com/start");
}

#[test]
fn overrides_take_precedence() {
    let addr = start_server();
    let mut transport = UreqTransport::new().unwrap();
    transport.add_custom_header("x-scanner", "base");

    let mut res = HttpResource::builder(format!("http://{addr}/echo?id=1"))
        .post_params("user=admin")
        .build();
    let overrides = SendOverrides::default()
        .get_params("id=1'")
        .post_params(vec![Parameter::new("user", "<script>")])
        .header("x-fuzz", "1");
    let echo = echo_of(&transport.send(&mut res, &overrides).unwrap());

    assert_eq!(echo.query.as_deref(), Some("id=1'"));
    assert_eq!(echo.body, "user=%3Cscript%3E");
    assert_eq!(echo.headers["x-scanner"], "base");
    assert_eq!(echo.headers["x-fuzz"], "1");
}

#[test]
fn upload_is_sent_as_multipart() {
    let addr = start_server();
    let transport = UreqTransport::new().unwrap();

    let mut res = HttpResource::builder(format!("http://{addr}/echo"))
        .post_params("title=cv")
        .file_params(vec![FileParameter::new("doc", "cv.txt", "hello upload")])
        .build();
    let echo = echo_of(&transport.send(&mut res, &SendOverrides::default()).unwrap());

    assert!(echo.headers["content-type"].starts_with("multipart/form-data; boundary="));
    assert!(echo.body.contains("name=\"title\"\r\n\r\ncv\r\n"));
    assert!(echo.body.contains("filename=\"cv.txt\""));
    assert!(echo.body.contains("hello upload"));
}

#[test]
fn explicit_method_is_used() {
    let addr = start_server();
    let transport = UreqTransport::new().unwrap();

    let mut res = HttpResource::builder(format!("http://{addr}/echo"))
        .method(HttpMethod::Put)
        .post_params("name=x")
        .build();
    let echo = echo_of(&transport.send(&mut res, &SendOverrides::default()).unwrap());
    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.body, "name=x");
}

#[test]
fn redirects_are_not_followed() {
    let addr = start_server();
    let transport = UreqTransport::new().unwrap();

    let mut res = HttpResource::new(format!("http://{addr}/redirect"));
    let response = transport.send(&mut res, &SendOverrides::default()).unwrap();
    assert_eq!(response.status_code(), 302);
    assert_eq!(response.location(), Some("/echo"));
}

#[test]
fn error_statuses_are_data() {
    let addr = start_server();
    let transport = UreqTransport::new().unwrap();

    let mut res = HttpResource::new(format!("http://{addr}/status/500"));
    let response = transport.send(&mut res, &SendOverrides::default()).unwrap();
    assert_eq!(response.status_code(), 500);
}

#[test]
fn timeout_yields_no_response() {
    let addr = start_server();
    let transport = UreqTransport::with_config(TransportConfig {
        timeout: Duration::from_millis(300),
        ..TransportConfig::default()
    })
    .unwrap();

    let mut res = HttpResource::new(format!("http://{addr}/slow"));
    let err = transport.try_send(&mut res, &SendOverrides::default()).unwrap_err();
    assert!(matches!(err, TransportError::Timeout), "got {err}");

    assert!(transport.send(&mut res, &SendOverrides::default()).is_none());
    assert!(res.headers().is_empty());
}

#[test]
fn failed_handshake_degrades_to_no_response() {
    let addr = start_server();
    let transport = UreqTransport::new().unwrap();

    // The mock server speaks plain HTTP, so the handshake fails.
    let mut res = HttpResource::new(format!("https://{addr}/echo"));
    let err = transport.try_send(&mut res, &SendOverrides::default()).unwrap_err();
    assert!(matches!(err, TransportError::Tls(_)), "got {err}");
    assert!(!transport.tls_error_occurred());

    assert!(transport.send(&mut res, &SendOverrides::default()).is_none());
    assert!(transport.tls_error_occurred());
    assert!(transport.send(&mut res, &SendOverrides::default()).is_none());
    assert_eq!(res.size(), 0);
}
