use anyhow::Result;
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Mutex;

pub trait Logger: Send + Sync {
    fn listening(&self, _addr: &str) {}
    fn connection(&self, _peer: SocketAddr) {}
    fn request(&self, _peer: SocketAddr, _bytes: usize) {}
    fn reply(&self, _peer: SocketAddr, _bytes: usize) {}
    fn closed(&self, _peer: SocketAddr) {}
    fn error(&self, _context: &str, _msg: &str) {}
    fn shutdown(&self) {}
}

pub struct NoopLogger;
impl Logger for NoopLogger {}

/// Timestamped lines on stderr; the server's default.
pub struct StderrLogger;

impl StderrLogger {
    fn line(&self, level: &str, s: &str) {
        eprintln!("[{}] {} {}", Utc::now().to_rfc3339(), level, s);
    }
}

impl Logger for StderrLogger {
    fn listening(&self, addr: &str) {
        self.line("INFO", &format!("listening on {addr}"));
    }
    fn connection(&self, peer: SocketAddr) {
        self.line("INFO", &format!("connection from {peer}"));
    }
    fn request(&self, peer: SocketAddr, bytes: usize) {
        self.line("INFO", &format!("request from {peer}: {bytes} bytes"));
    }
    fn reply(&self, peer: SocketAddr, bytes: usize) {
        self.line("INFO", &format!("reply to {peer}: {bytes} bytes"));
    }
    fn closed(&self, peer: SocketAddr) {
        self.line("INFO", &format!("connection from {peer} closed"));
    }
    fn error(&self, context: &str, msg: &str) {
        self.line("ERROR", &format!("{context}: {msg}"));
    }
    fn shutdown(&self) {
        self.line("INFO", "server stopped");
    }
}

/// Appends the same events to a log file.
pub struct TextLogger {
    file: Mutex<File>,
}

impl TextLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(f),
        })
    }

    fn line(&self, s: &str) {
        if let Ok(mut f) = self.file.lock() {
            let _ = writeln!(f, "[{}] {}", Utc::now().to_rfc3339(), s);
        }
    }
}

impl Logger for TextLogger {
    fn listening(&self, addr: &str) {
        self.line(&format!("LISTEN addr={addr}"));
    }
    fn connection(&self, peer: SocketAddr) {
        self.line(&format!("ACCEPT peer={peer}"));
    }
    fn request(&self, peer: SocketAddr, bytes: usize) {
        self.line(&format!("REQUEST peer={peer} bytes={bytes}"));
    }
    fn reply(&self, peer: SocketAddr, bytes: usize) {
        self.line(&format!("REPLY peer={peer} bytes={bytes}"));
    }
    fn closed(&self, peer: SocketAddr) {
        self.line(&format!("CLOSE peer={peer}"));
    }
    fn error(&self, context: &str, msg: &str) {
        self.line(&format!("ERROR ctx={context} msg={msg}"));
    }
    fn shutdown(&self) {
        self.line("STOP");
    }
}
