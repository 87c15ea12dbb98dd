// crates/pingone-client/tests/common/mod.rs
// ============================================================================
// Module: Identity API Stub Server
// Description: Scripted tiny_http server for PingOne client tests.
// Purpose: Record outbound requests and answer with canned responses.
// ============================================================================

#![allow(dead_code, reason = "Not every test binary uses every helper.")]

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
}

impl StubReply {
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

/// Request observed by the stub.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
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
                    authorization: header_value(request.headers(), "Authorization"),
                    content_type: header_value(request.headers(), "Content-Type"),
                    body,
                });
                let header =
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
                let response = Response::from_string(reply.body)
                    .with_status_code(reply.status)
                    .with_header(header);
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

fn header_value(headers: &[Header], name: &'static str) -> Option<String> {
    headers
        .iter()
        .find(|header| header.field.equiv(name))
        .map(|header| header.value.as_str().to_string())
}
