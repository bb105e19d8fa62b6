//! Connection dispatcher: accept loop plus one worker thread per connection.
//!
//! Workers own their connection exclusively. The accept loop never blocks on
//! worker completion and never dies because one accept or one worker failed;
//! finished worker handles are pruned each iteration for bookkeeping only.

use anyhow::Result;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::framing::{terminated, FrameBuffer};
use crate::logger::Logger;
use crate::protocol::{timeouts, RECV_CHUNK};
use crate::router::Router;

pub struct Dispatcher {
    router: Arc<Router>,
    logger: Arc<dyn Logger>,
}

impl Dispatcher {
    pub fn new(router: Arc<Router>, logger: Arc<dyn Logger>) -> Self {
        Self { router, logger }
    }

    /// Bind the given address and serve until the process is interrupted.
    pub fn serve(&self, bind: &str) -> Result<()> {
        let listener = TcpListener::bind(bind)?;
        self.run(listener)
    }

    /// Accept loop over an already-bound listener.
    pub fn run(&self, listener: TcpListener) -> Result<()> {
        let addr = listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "<unknown>".to_string());
        self.logger.listening(&addr);

        let mut workers: Vec<JoinHandle<()>> = Vec::new();
        loop {
            match listener.accept() {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_read_timeout(Some(timeouts::IDLE_READ)) {
                        self.logger.error("accept", &format!("{peer}: {e}"));
                        continue;
                    }
                    let router = Arc::clone(&self.router);
                    let logger = Arc::clone(&self.logger);
                    workers.push(thread::spawn(move || {
                        logger.connection(peer);
                        if let Err(e) = serve_connection(stream, peer, &router, &*logger) {
                            logger.error("worker", &format!("{peer}: {e}"));
                        }
                        logger.closed(peer);
                    }));
                }
                Err(e) => self.logger.error("accept", &e.to_string()),
            }
            workers.retain(|h| !h.is_finished());
        }
    }
}

/// One request, one response, then the connection closes.
///
/// EOF before a complete message discards the partial data and produces no
/// response; a read timeout or decode failure surfaces as the worker's error.
fn serve_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    router: &Router,
    logger: &dyn Logger,
) -> Result<()> {
    let mut frame = FrameBuffer::new();
    let mut chunk = [0u8; RECV_CHUNK];
    let message = loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Ok(());
        }
        frame.extend(&chunk[..n]);
        if let Some(message) = frame.try_complete()? {
            break message;
        }
    };

    logger.request(peer, message.len());
    let reply = terminated(router.handle(&message));
    stream.write_all(reply.as_bytes())?;
    logger.reply(peer, reply.len());
    Ok(())
}
