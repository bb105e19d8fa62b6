//! Filebox library
//!
//! Flat-namespace file server and client over a plain TCP text/JSON protocol

pub mod cli;
pub mod client;
pub mod framing;
pub mod logger;
pub mod protocol;
pub mod router;
pub mod server;
pub mod storage;
