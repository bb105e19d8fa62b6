//! One-shot client transport.
//!
//! Each call opens a fresh connection, sends one terminated request, reads
//! until the response terminator or end-of-stream, and closes. Transport
//! faults (connect, send, read, decode, parse) all yield `None`; reporting
//! to the user is the caller's job.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::io::{Read, Write};
use std::net::TcpStream;

use crate::framing::{strip_terminator, terminated};
use crate::protocol::{RECV_CHUNK, TERMINATOR};
use crate::router::Reply;

pub struct Client {
    addr: String,
}

impl Client {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            addr: format!("{host}:{port}"),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Send one request, return the parsed reply, or `None` on any
    /// transport-level failure.
    pub fn exchange(&self, request: &str) -> Option<Reply> {
        let mut stream = TcpStream::connect(&self.addr).ok()?;
        let outgoing = terminated(request.to_string());
        stream.write_all(outgoing.as_bytes()).ok()?;

        let mut buf = Vec::new();
        let mut chunk = [0u8; RECV_CHUNK];
        loop {
            let n = stream.read(&mut chunk).ok()?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if buf.windows(TERMINATOR.len()).any(|w| w == TERMINATOR) {
                break;
            }
        }

        let text = String::from_utf8(buf).ok()?;
        serde_json::from_str(strip_terminator(&text)).ok()
    }

    pub fn list(&self) -> Option<Reply> {
        self.exchange("LIST")
    }

    pub fn get(&self, name: &str) -> Option<Reply> {
        let quoted = shlex::try_quote(name).ok()?;
        self.exchange(&format!("GET {quoted}"))
    }

    pub fn delete(&self, name: &str) -> Option<Reply> {
        let quoted = shlex::try_quote(name).ok()?;
        self.exchange(&format!("DELETE {quoted}"))
    }

    pub fn upload(&self, name: &str, content: &[u8]) -> Option<Reply> {
        let envelope = serde_json::json!({
            "command": "upload",
            "filename": name,
            "filedata": BASE64.encode(content),
        });
        self.exchange(&envelope.to_string())
    }
}
