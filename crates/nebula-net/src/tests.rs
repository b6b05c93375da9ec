//! Requests against a local fixture server.

use std::thread;

use nebula_config::HttpConfig;
use tiny_http::{Header, Method, Request, Response, Server};

use crate::{HttpRequest, RequestObserver};

const ASSET_LEN: usize = 96 * 1024;

#[derive(Default)]
struct Recorder {
    progress: Vec<f32>,
    errors: Vec<(u16, String)>,
    completed: Vec<Vec<u8>>,
}

impl RequestObserver for Recorder {
    fn on_progress(&mut self, progress: f32) {
        self.progress.push(progress);
    }

    fn on_error(&mut self, code: u16, message: &str) {
        self.errors.push((code, message.to_owned()));
    }

    fn on_complete(&mut self, body: &[u8]) {
        self.completed.push(body.to_vec());
    }
}

fn asset() -> Vec<u8> {
    (0..ASSET_LEN).map(|i| (i % 251) as u8).collect()
}

fn header<'a>(request: &'a Request, name: &'static str) -> Option<&'a str> {
    request
        .headers()
        .iter()
        .find(|header| header.field.equiv(name))
        .map(|header| header.value.as_str())
}

fn respond(request: Request) {
    let response = match (request.method(), request.url()) {
        (&Method::Get | &Method::Head, "/models/ship.glb") => {
            // Keep a Content-Length header instead of chunked encoding.
            Response::from_data(asset()).with_chunked_threshold(usize::MAX)
        }
        (&Method::Get, "/models/range.glb") => Response::from_data(b"partial".to_vec()).with_status_code(206),
        (&Method::Get, "/models/empty.glb") => Response::from_data(Vec::new()).with_status_code(204),
        (&Method::Get, "/private.glb") => {
            // "streamer:secret"
            if header(&request, "Authorization") == Some("Basic c3RyZWFtZXI6c2VjcmV0") {
                Response::from_data(b"granted".to_vec())
            } else {
                Response::from_data(Vec::new()).with_status_code(401)
            }
        }
        (&Method::Get, "/echo-header") => {
            let value = header(&request, "X-Nebula-Tile").unwrap_or_default().to_owned();
            Response::from_data(value.into_bytes())
        }
        (&Method::Get, "/models/a%20b.glb") => Response::from_data(b"spaced".to_vec()),
        _ => Response::from_data(Vec::new()).with_status_code(404),
    };
    let _ = request.respond(response.with_header(
        Header::from_bytes(&b"Content-Type"[..], &b"application/octet-stream"[..]).unwrap(),
    ));
}

/// Start a fixture server on an OS-assigned port and return its base URL.
fn serve() -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    thread::spawn(move || {
        for request in server.incoming_requests() {
            respond(request);
        }
    });
    format!("http://127.0.0.1:{port}")
}

#[test]
fn test_not_found_reports_error_only() {
    let base = serve();
    let mut recorder = Recorder::default();

    let result = HttpRequest::new(format!("{base}/missing.glb")).run(&mut recorder);

    let error = result.unwrap_err();
    assert_eq!(error.code(), 404);
    assert_eq!(recorder.errors.len(), 1);
    assert_eq!(recorder.errors[0].0, 404);
    assert!(recorder.errors[0].1.contains("404"));
    assert!(recorder.completed.is_empty());
    assert_eq!(recorder.progress, vec![0.0]);
}

#[test]
fn test_successful_fetch_reports_progress_then_completes() {
    let base = serve();
    let mut recorder = Recorder::default();

    let body = HttpRequest::new(format!("{base}/models/ship.glb")).run(&mut recorder).unwrap();

    assert_eq!(body, asset());
    assert_eq!(recorder.completed, vec![asset()]);
    assert!(recorder.errors.is_empty());
    assert_eq!(recorder.progress.first(), Some(&0.0));
    assert_eq!(recorder.progress.last(), Some(&1.0));
    assert!(recorder.progress.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(recorder.progress.iter().any(|&p| p > 0.0 && p < 1.0));
}

#[test]
fn test_partial_content_is_success() {
    let base = serve();
    let body = HttpRequest::new(format!("{base}/models/range.glb")).run(&mut ()).unwrap();
    assert_eq!(body, b"partial");
}

#[test]
fn test_other_success_codes_fail() {
    let base = serve();
    let mut recorder = Recorder::default();
    let error = HttpRequest::new(format!("{base}/models/empty.glb"))
        .run(&mut recorder)
        .unwrap_err();
    assert_eq!(error.code(), 204);
    assert_eq!(recorder.errors, vec![(204, "status: 204".to_owned())]);
}

#[test]
fn test_basic_auth() {
    let base = serve();
    let url = format!("{base}/private.glb");

    assert_eq!(HttpRequest::new(&url).run(&mut ()).unwrap_err().code(), 401);
    let body = HttpRequest::new(&url)
        .with_credentials("streamer", "secret")
        .run(&mut ())
        .unwrap();
    assert_eq!(body, b"granted");
}

#[test]
fn test_additional_headers_are_sent() {
    let base = serve();
    let body = HttpRequest::new(format!("{base}/echo-header"))
        .with_header("X-Nebula-Tile", "12/4/7")
        .run(&mut ())
        .unwrap();
    assert_eq!(body, b"12/4/7");
}

#[test]
fn test_url_is_encoded_before_sending() {
    let base = serve();
    let body = HttpRequest::new(format!("{base}/models/a b.glb")).run(&mut ()).unwrap();
    assert_eq!(body, b"spaced");
}

#[test]
fn test_connection_failure_has_code_zero() {
    // Bind and release a port so nothing is listening on it.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let config = HttpConfig {
        timeout_seconds: 2,
        ..HttpConfig::default()
    };
    let mut recorder = Recorder::default();

    let error = HttpRequest::new(format!("http://127.0.0.1:{port}/models/ship.glb"))
        .with_config(config)
        .run(&mut recorder)
        .unwrap_err();

    assert_eq!(error.code(), 0);
    assert_eq!(recorder.errors.len(), 1);
    assert!(recorder.errors[0].1.starts_with("status: 0, error: "));
    assert!(recorder.completed.is_empty());
}

#[test]
fn test_file_exists_uses_head() {
    let base = serve();
    assert!(HttpRequest::file_exists(&format!("{base}/models/ship.glb")));
    assert!(!HttpRequest::file_exists(&format!("{base}/models/missing.glb")));
}

#[test]
fn test_peer_verification_defaults_on() {
    let base = serve();
    let request = HttpRequest::new(format!("{base}/models/range.glb"));
    assert!(request.verify_peer());

    let relaxed = request.with_verify_peer(false);
    assert!(!relaxed.verify_peer());
    assert_eq!(relaxed.run(&mut ()).unwrap(), b"partial");
}
