use clap::Parser;
use log::info;
use server::network::{RelayConfig, Server};
use shared::DEFAULT_PORT;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Maximum number of concurrent participants
    #[arg(short, long, default_value = "64")]
    max_participants: usize,

    /// Updates buffered per participant before they start being dropped
    #[arg(short, long, default_value = "64")]
    queue_capacity: usize,

    /// Deadline for delivering one update to a participant
    #[arg(long, default_value = "5000")]
    write_timeout_ms: u64,

    /// Disconnect participants silent for this long (0 disables)
    #[arg(long, default_value = "0")]
    read_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = RelayConfig {
        max_participants: args.max_participants,
        queue_capacity: args.queue_capacity,
        write_timeout: Duration::from_millis(args.write_timeout_ms),
        read_timeout: (args.read_timeout_secs > 0)
            .then(|| Duration::from_secs(args.read_timeout_secs)),
    };

    let address = format!("{}:{}", args.host, args.port);
    info!("Starting relay on {}", address);
    info!(
        "Up to {} participants, {} queued updates each",
        config.max_participants, config.queue_capacity
    );

    let server = Server::bind(&address, config).await?;

    tokio::select! {
        _ = server.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
