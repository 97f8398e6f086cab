use clap::Parser;
use client::input::Wanderer;
use client::network::{Client, MAX_TICK_RATE};
use client::rendering::LogRenderer;
use log::info;
use shared::{Position, DEFAULT_PORT};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay address to connect to
    #[arg(short = 's', long, default_value_t = format!("127.0.0.1:{}", DEFAULT_PORT))]
    server: String,

    /// Updates published per second
    #[arg(
        short = 't',
        long,
        default_value_t = 60,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_TICK_RATE))
    )]
    tick_rate: u32,

    /// Starting x coordinate
    #[arg(short = 'x', long, default_value = "400", allow_negative_numbers = true)]
    start_x: f64,

    /// Starting y coordinate
    #[arg(short = 'y', long, default_value = "300", allow_negative_numbers = true)]
    start_y: f64,

    /// Seed for the wandering input, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    info!("Publishing at {}Hz", args.tick_rate);

    let client = Client::connect(&args.server, args.tick_rate).await?;
    let provider = Wanderer::new(Position::new(args.start_x, args.start_y), args.seed);
    let renderer = LogRenderer::new(u64::from(args.tick_rate));

    client.run(provider, renderer).await?;

    Ok(())
}
