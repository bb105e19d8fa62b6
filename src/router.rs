//! Request classification and dispatch.
//!
//! A fully framed message is either a JSON upload envelope or a tokenized
//! command line. Decoding tries the structured form first and falls back to
//! shell-style tokenization, producing an explicit two-variant [`Request`].
//! Every internal fault is converted into an ERROR reply here; nothing is
//! allowed to propagate to the transport layer.

use anyhow::{bail, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::storage::Storage;

/// One decoded inbound message.
#[derive(Debug, PartialEq)]
pub enum Request {
    /// JSON envelope: `{"command":"upload","filename":...,"filedata":<base64>}`
    Upload { filename: String, payload: Vec<u8> },
    /// Tokenized line: `VERB [argument]`, verb normalized to uppercase.
    Command { verb: String, args: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ERROR")]
    Error,
}

/// Wire reply envelope. `data` is a message string, except for LIST where it
/// is the name array. `data_file` is present only on a successful GET.
#[derive(Debug, Serialize, Deserialize)]
pub struct Reply {
    pub status: Status,
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data_file: Option<String>,
}

impl Reply {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            data: serde_json::Value::String(message.into()),
            data_file: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            data: serde_json::Value::String(message.into()),
            data_file: None,
        }
    }
}

/// Decode a framed message into a [`Request`].
///
/// JSON that parses but is not an upload envelope falls through to the
/// tokenized path, so stray braces in a command line stay harmless.
pub fn decode(text: &str) -> Result<Request> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        if value.get("command").and_then(|c| c.as_str()) == Some("upload") {
            let filename = value
                .get("filename")
                .and_then(|f| f.as_str())
                .unwrap_or_default()
                .to_string();
            let filedata = value
                .get("filedata")
                .and_then(|f| f.as_str())
                .unwrap_or_default();
            let payload = BASE64.decode(filedata)?;
            return Ok(Request::Upload { filename, payload });
        }
    }

    let Some(tokens) = shlex::split(text) else {
        bail!("perintah tidak dapat diurai");
    };
    let Some((verb, args)) = tokens.split_first() else {
        bail!("perintah kosong");
    };
    Ok(Request::Command {
        verb: verb.to_uppercase(),
        args: args.to_vec(),
    })
}

/// Stateless request-to-reply mapper around a shared storage root.
///
/// Constructed once at startup and handed by `Arc` to every connection
/// worker; it carries no per-session state.
pub struct Router {
    storage: Arc<Storage>,
}

impl Router {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Map one framed message to a serialized reply. Infallible by contract:
    /// decode and dispatch faults become `terjadi kesalahan: ...` replies.
    pub fn handle(&self, text: &str) -> String {
        let reply = self
            .process(text)
            .unwrap_or_else(|e| Reply::error(format!("terjadi kesalahan: {e}")));
        serde_json::to_string(&reply).unwrap_or_else(|_| {
            r#"{"status":"ERROR","data":"terjadi kesalahan: gagal menyusun respons"}"#.to_string()
        })
    }

    fn process(&self, text: &str) -> Result<Reply> {
        match decode(text)? {
            Request::Upload { filename, payload } => {
                Ok(match self.storage.upload(&filename, &payload) {
                    Ok(()) => Reply::ok(format!("File {filename} berhasil disimpan")),
                    Err(e) => Reply::error(e.to_string()),
                })
            }
            Request::Command { verb, args } => Ok(self.dispatch(&verb, &args)),
        }
    }

    fn dispatch(&self, verb: &str, args: &[String]) -> Reply {
        match verb {
            "LIST" => match self.storage.list() {
                Ok(names) => Reply {
                    status: Status::Ok,
                    data: serde_json::json!(names),
                    data_file: None,
                },
                Err(e) => Reply::error(e.to_string()),
            },
            "GET" => {
                let Some(name) = args.first() else {
                    return Reply::error("Nama file tidak disebutkan");
                };
                match self.storage.get(name) {
                    Ok(content) => Reply {
                        status: Status::Ok,
                        data: serde_json::Value::String(format!("File {name} berhasil diambil")),
                        data_file: Some(BASE64.encode(content)),
                    },
                    Err(e) => Reply::error(e.to_string()),
                }
            }
            "DELETE" => {
                let Some(name) = args.first() else {
                    return Reply::error("Nama file tidak disebutkan");
                };
                match self.storage.delete(name) {
                    Ok(()) => Reply::ok(format!("File {name} berhasil dihapus")),
                    Err(e) => Reply::error(e.to_string()),
                }
            }
            _ => Reply::error("request tidak dikenali"),
        }
    }
}
