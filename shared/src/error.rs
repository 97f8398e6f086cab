//! Error taxonomy shared by the relay and the client

use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// A wire record that does not match the protocol's line format
///
/// Decoders never substitute defaults for a bad field; the caller decides
/// whether to drop the record or log it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRecord {
    /// The record did not split into the expected number of fields
    #[error("expected {expected} fields, found {found} in {record:?}")]
    FieldCount {
        expected: usize,
        found: usize,
        record: String,
    },
    /// A coordinate was not a finite decimal number
    #[error("invalid position field {value:?}")]
    Position { value: String },
    /// The facing field was not one of the codes 0..=3
    #[error("invalid facing code {value:?}")]
    Facing { value: String },
    /// The movement flag was neither `true` nor `false`
    #[error("invalid movement flag {value:?}")]
    Movement { value: String },
    /// The identity prefix was empty or contained a reserved character
    #[error("invalid participant identity {value:?}")]
    Identity { value: String },
}

/// Failures of the stream transport
///
/// Fatal to the single connection they affect. The client has exactly one
/// connection, so for it every transport error ends the process.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("read failed: {0}")]
    Read(#[source] io::Error),
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
    #[error("no data from {peer} within {timeout:?}")]
    ReadTimeout { peer: SocketAddr, timeout: Duration },
    #[error("write to {peer} did not complete within {timeout:?}")]
    WriteTimeout { peer: SocketAddr, timeout: Duration },
    #[error("connection closed by peer")]
    Closed,
}
