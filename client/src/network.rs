use crate::cache::{RemoteStateCache, SharedCache};
use crate::input::LocalStateProvider;
use crate::publisher::Publisher;
use crate::rendering::FrameConsumer;
use log::{debug, info, trace, warn};
use shared::{
    decode_relay_batch, read_line_bounded, unframe, LineRead, RelayMessage, TransportError,
    MAX_LINE_LEN,
};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, BufReader};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Highest update loop frequency, in Hz
pub const MAX_TICK_RATE: u32 = 1000;

/// Update loop period for `tick_rate`, clamped to `1..=MAX_TICK_RATE` Hz
pub fn tick_interval(tick_rate: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(tick_rate.clamp(1, MAX_TICK_RATE)))
}

/// A connection to the relay plus the shared cache its receive loop fills
pub struct Client {
    stream: TcpStream,
    server_addr: SocketAddr,
    tick: Duration,
    cache: SharedCache,
}

impl Client {
    /// Connects to the relay; `tick_rate` is the update loop frequency in Hz
    pub async fn connect(server_addr: &str, tick_rate: u32) -> Result<Self, TransportError> {
        let connect_error = |source| TransportError::Connect {
            addr: server_addr.to_string(),
            source,
        };
        let stream = TcpStream::connect(server_addr)
            .await
            .map_err(connect_error)?;
        let server_addr = stream.peer_addr().map_err(connect_error)?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle: {}", e);
        }
        info!("Connected to relay at {}", server_addr);

        Ok(Client {
            stream,
            server_addr,
            tick: tick_interval(tick_rate),
            cache: RemoteStateCache::shared(),
        })
    }

    /// Handle to the remote state cache, usable by other readers
    pub fn cache(&self) -> SharedCache {
        Arc::clone(&self.cache)
    }

    /// Runs the receive loop and the update loop until the connection fails
    ///
    /// Every tick samples `provider`, publishes the result and hands a cache
    /// snapshot to `consumer`. Only returns with the error that ended the
    /// session.
    pub async fn run<P, F>(self, mut provider: P, mut consumer: F) -> Result<(), TransportError>
    where
        P: LocalStateProvider,
        F: FrameConsumer,
    {
        let (reader, writer) = self.stream.into_split();
        let mut receiver: JoinHandle<Result<(), TransportError>> =
            tokio::spawn(receive_loop(reader, Arc::clone(&self.cache)));
        let mut publisher = Publisher::new(writer);

        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let dt = self.tick.as_secs_f64();

        let result = loop {
            tokio::select! {
                joined = &mut receiver => {
                    break match joined {
                        Ok(Ok(())) => Err(TransportError::Closed),
                        Ok(Err(e)) => Err(e),
                        Err(e) => Err(TransportError::Read(io::Error::new(io::ErrorKind::Other, e))),
                    };
                },

                _ = ticker.tick() => {
                    let local = provider.sample(dt);
                    if let Err(e) = publisher.publish(&local).await {
                        break Err(e);
                    }

                    let remote = {
                        let cache = self.cache.lock().await;
                        cache.snapshot_all()
                    };
                    consumer.frame(&local, &remote);
                },
            }
        };

        receiver.abort();
        if let Err(e) = &result {
            warn!("Lost connection to {}: {}", self.server_addr, e);
        }
        result
    }
}

/// Reads relay lines into the cache until the connection ends
///
/// Malformed records and overlong lines are logged and skipped. Messages
/// carrying the self-echo sentinel are discarded before they reach the cache.
pub async fn receive_loop<R>(reader: R, cache: SharedCache) -> Result<(), TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::with_capacity(128);

    loop {
        match read_line_bounded(&mut reader, &mut buffer, MAX_LINE_LEN)
            .await
            .map_err(TransportError::Read)?
        {
            LineRead::Line => {}
            LineRead::Overlong => {
                warn!("Dropping relay line over {} bytes", MAX_LINE_LEN);
                continue;
            }
            LineRead::Eof => return Err(TransportError::Closed),
        }

        let Ok(line) = std::str::from_utf8(&buffer) else {
            warn!("Dropping non-UTF-8 line from relay");
            continue;
        };

        let messages: Vec<RelayMessage> = decode_relay_batch(unframe(line))
            .into_iter()
            .filter_map(|decoded| match decoded {
                Ok(message) if message.identity().is_self_echo() => {
                    trace!("Discarding self-echo");
                    None
                }
                Ok(message) => Some(message),
                Err(e) => {
                    warn!("Dropping malformed relay record: {}", e);
                    None
                }
            })
            .collect();

        if messages.is_empty() {
            continue;
        }

        let mut cache = cache.lock().await;
        for message in messages {
            if let RelayMessage::Leave { identity } = &message {
                info!("{} left", identity);
            }
            cache.handle(message);
        }
    }
}
