// crates/console-sso/tests/common/server.rs
// ============================================================================
// Module: Stub HTTP Server
// Description: Scripted tiny_http server answering replies in order.
// ============================================================================

use std::io::Read;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

/// Canned response served for one request.
pub struct StubReply {
    pub status: u16,
    pub body: String,
    pub location: Option<String>,
}

impl StubReply {
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            location: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            location: None,
        }
    }

    pub fn redirect(location: &str) -> Self {
        Self {
            status: 302,
            body: String::new(),
            location: Some(location.to_string()),
        }
    }
}

/// Request observed by the stub.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn json_body(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Stub server answering replies in order, then shutting down.
pub struct StubServer {
    pub base_url: String,
    handle: Option<JoinHandle<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub fn start(replies: Vec<StubReply>) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let handle = thread::spawn(move || {
            let mut recorded = Vec::new();
            for reply in replies {
                let Ok(Some(mut request)) = server.recv_timeout(Duration::from_secs(5)) else {
                    break;
                };
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                recorded.push(RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    body,
                });
                let content_type =
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
                let mut response = Response::from_string(reply.body)
                    .with_status_code(reply.status)
                    .with_header(content_type);
                if let Some(location) = reply.location {
                    response = response
                        .with_header(Header::from_bytes(&b"Location"[..], location.as_bytes()).unwrap());
                }
                let _ = request.respond(response);
            }
            recorded
        });
        Self {
            base_url: format!("http://{addr}"),
            handle: Some(handle),
        }
    }

    /// Waits for the scripted exchange to finish and returns what was seen.
    pub fn finish(mut self) -> Vec<RecordedRequest> {
        self.handle.take().unwrap().join().unwrap()
    }
}
