//! Relay network layer: accept loop, per-connection read/write tasks and fan-out

use crate::registry::ConnectionRegistry;
use log::{debug, error, info, warn};
use shared::{
    decode, encode_relay, frame, read_line_bounded, unframe, LineRead, ParticipantId,
    RelayMessage, TransportError, FIELD_SEPARATOR, MAX_LINE_LEN,
};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};
use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep, timeout};

/// Registry shared by every connection task of one relay
pub type SharedRegistry = Arc<Mutex<ConnectionRegistry>>;

/// Tunables for a relay instance
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Connections beyond this count are closed right after accept
    pub max_participants: usize,
    /// Lines buffered per connection before fan-out starts dropping for it
    pub queue_capacity: usize,
    /// Deadline for writing one line to a peer
    pub write_timeout: Duration,
    /// Idle deadline for reads; None waits forever
    pub read_timeout: Option<Duration>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_participants: 64,
            queue_capacity: 64,
            write_timeout: Duration::from_secs(5),
            read_timeout: None,
        }
    }
}

/// Outcome of a single fan-out
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanOut {
    pub delivered: usize,
    pub dropped: usize,
}

/// Relay server accepting participant connections
pub struct Server {
    listener: TcpListener,
    registry: SharedRegistry,
    config: RelayConfig,
}

impl Server {
    pub async fn bind(addr: &str, config: RelayConfig) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        info!("Relay listening on {}", addr);

        Ok(Server {
            listener,
            registry: Arc::new(Mutex::new(ConnectionRegistry::new(config.max_participants))),
            config,
        })
    }

    /// Address actually bound, useful when binding port 0
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    /// Accepts connections forever, one task per connection
    ///
    /// Accept errors are logged and never end the relay.
    pub async fn run(self) {
        info!("Relay started successfully");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let registry = Arc::clone(&self.registry);
                    let config = self.config.clone();
                    tokio::spawn(async move {
                        handle_connection(stream, addr, registry, config).await;
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

/// Runs one connection from registration to removal
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    registry: SharedRegistry,
    config: RelayConfig,
) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Could not disable Nagle for {}: {}", addr, e);
    }

    let (reader, writer) = stream.into_split();
    let (outbound, queue) = mpsc::channel(config.queue_capacity.max(1));

    let identity = {
        let mut registry = registry.lock().await;
        registry.register(addr, outbound)
    };
    let Some(identity) = identity else {
        warn!("Relay full, refusing connection from {}", addr);
        return;
    };

    let write_timeout = config.write_timeout;
    let writer_identity = identity.clone();
    tokio::spawn(async move {
        if let Err(e) = write_loop(writer, queue, addr, write_timeout).await {
            warn!("Stopped writing to {}: {}", writer_identity, e);
        }
    });

    match read_loop(reader, addr, &identity, &registry, config.read_timeout).await {
        Err(TransportError::Closed) => info!("{} closed the connection", identity),
        Err(e) => warn!("Dropping {}: {}", identity, e),
        Ok(()) => {}
    }

    let removed = {
        let mut registry = registry.lock().await;
        registry.unregister(&identity)
    };
    if removed.is_some() {
        announce_leave(&registry, identity, config.write_timeout).await;
    }
}

/// Reads newline-terminated records and fans each valid one out
///
/// Only returns on EOF, read error or read timeout. Malformed records and
/// lines longer than [`MAX_LINE_LEN`] are logged and skipped.
pub async fn read_loop<R>(
    reader: R,
    addr: SocketAddr,
    identity: &ParticipantId,
    registry: &Mutex<ConnectionRegistry>,
    read_timeout: Option<Duration>,
) -> Result<(), TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::with_capacity(64);

    loop {
        let read = read_line_bounded(&mut reader, &mut buffer, MAX_LINE_LEN);
        let outcome = match read_timeout {
            Some(limit) => timeout(limit, read)
                .await
                .map_err(|_| TransportError::ReadTimeout {
                    peer: addr,
                    timeout: limit,
                })?,
            None => read.await,
        }
        .map_err(TransportError::Read)?;

        match outcome {
            LineRead::Line => {}
            LineRead::Overlong => {
                warn!("Dropping record over {} bytes from {}", MAX_LINE_LEN, identity);
                continue;
            }
            // An unterminated tail at EOF is not a complete message
            LineRead::Eof => return Err(TransportError::Closed),
        }

        let Ok(line) = std::str::from_utf8(&buffer) else {
            warn!("Dropping non-UTF-8 record from {}", identity);
            continue;
        };
        let record = unframe(line);

        if let Err(e) = decode(record) {
            warn!("Dropping malformed record from {}: {}", identity, e);
            continue;
        }

        let message = frame(&format!("{}{}{}", identity, FIELD_SEPARATOR, record));
        let result = fan_out(registry, Some(identity), message).await;
        debug!(
            "Relayed update from {} to {} peers ({} dropped)",
            identity, result.delivered, result.dropped
        );
    }
}

/// Queues one line for every registered connection except `exclude`
///
/// The membership is copied under the lock and the lock is released before
/// any queueing. A full or closed queue is logged and skipped; the affected
/// connection stays registered until its own read loop ends.
pub async fn fan_out(
    registry: &Mutex<ConnectionRegistry>,
    exclude: Option<&ParticipantId>,
    line: String,
) -> FanOut {
    let peers = {
        let registry = registry.lock().await;
        registry.snapshot()
    };

    let mut result = FanOut::default();
    for peer in peers.into_iter().filter(|peer| Some(&peer.identity) != exclude) {
        match peer.outbound.try_send(line.clone()) {
            Ok(()) => result.delivered += 1,
            Err(TrySendError::Full(_)) => {
                warn!("Outbound queue for {} is full, dropping update", peer.identity);
                result.dropped += 1;
            }
            Err(TrySendError::Closed(_)) => {
                warn!("Writer for {} has stopped, dropping update", peer.identity);
                result.dropped += 1;
            }
        }
    }
    result
}

/// Tells every remaining connection that `identity` has left
///
/// Unlike state updates, which are superseded by the next tick, a missed
/// leave notice leaves a stale entry in the peer's cache for good. Each peer
/// therefore gets up to `wait` for room in its queue before the notice is
/// given up on.
pub async fn announce_leave(
    registry: &Mutex<ConnectionRegistry>,
    identity: ParticipantId,
    wait: Duration,
) -> FanOut {
    let peers = {
        let registry = registry.lock().await;
        registry.snapshot()
    };
    let line = frame(&encode_relay(&RelayMessage::Leave {
        identity: identity.clone(),
    }));

    let mut result = FanOut::default();
    for peer in peers.into_iter().filter(|peer| peer.identity != identity) {
        match peer.outbound.send_timeout(line.clone(), wait).await {
            Ok(()) => result.delivered += 1,
            Err(SendTimeoutError::Timeout(_)) => {
                error!(
                    "Could not tell {} that {} left: queue stayed full for {:?}",
                    peer.identity, identity, wait
                );
                result.dropped += 1;
            }
            Err(SendTimeoutError::Closed(_)) => {
                debug!("Writer for {} has stopped, skipping leave notice", peer.identity);
                result.dropped += 1;
            }
        }
    }
    result
}

/// Drains a connection's queue onto its socket
///
/// Ends when the queue closes (the endpoint was unregistered) or on the
/// first failed or timed-out write.
pub async fn write_loop<W>(
    mut writer: W,
    mut queue: mpsc::Receiver<String>,
    addr: SocketAddr,
    write_timeout: Duration,
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = queue.recv().await {
        match timeout(write_timeout, writer.write_all(line.as_bytes())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(TransportError::Write(e)),
            Err(_) => {
                return Err(TransportError::WriteTimeout {
                    peer: addr,
                    timeout: write_timeout,
                })
            }
        }
    }
    Ok(())
}
