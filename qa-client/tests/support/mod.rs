//! One-shot HTTP stub: accepts a single connection, records the request and
//! answers with a canned response.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub struct StubServer {
    pub base_url: String,
    handle: JoinHandle<CapturedRequest>,
}

impl StubServer {
    pub fn respond(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        let declared = body.len();
        Self::respond_declaring(status, content_type, body, declared)
    }

    /// Like [`StubServer::respond`], but announces `declared_len` bytes and
    /// closes the connection after writing `body`, so a longer declaration
    /// leaves the client with a truncated body.
    pub fn respond_declaring(status: u16, content_type: &str, body: Vec<u8>, declared_len: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
        let addr = listener.local_addr().expect("stub has a local address");
        let content_type = content_type.to_string();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("client connects");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let captured = read_request(&mut reader);
            let head = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                reason(status),
                content_type,
                declared_len
            );
            let mut writer = stream;
            writer.write_all(head.as_bytes()).expect("write head");
            writer.write_all(&body).expect("write body");
            writer.flush().expect("flush response");
            captured
        });
        Self { base_url: format!("http://{addr}"), handle }
    }

    pub fn json(status: u16, value: serde_json::Value) -> Self {
        Self::respond(status, "application/json", value.to_string())
    }

    /// Waits for the stub to finish and returns what the client sent.
    pub fn finish(self) -> CapturedRequest {
        self.handle.join().expect("stub thread completes")
    }
}

/// A base URL on which nothing is listening.
pub fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe listener");
    let addr = listener.local_addr().expect("probe has a local address");
    drop(listener);
    format!("http://{addr}")
}

fn read_request<R: BufRead>(reader: &mut R) -> CapturedRequest {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read request line");
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    loop {
        let mut raw = String::new();
        reader.read_line(&mut raw).expect("read header line");
        let raw = raw.trim_end();
        if raw.is_empty() {
            break;
        }
        if let Some((k, v)) = raw.split_once(':') {
            headers.push((k.trim().to_string(), v.trim().to_string()));
        }
    }

    let len = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).expect("read request body");

    CapturedRequest { method, target, headers, body }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
