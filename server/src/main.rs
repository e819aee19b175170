use clap::Parser;
use log::info;
use server::identity::HostIdentity;
use server::network::Server;
use server::scoreboard::ScoreboardService;
use server::store::{FileStore, KeyValueStore, MemoryStore};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Snapshot file for scores and comments (in-memory when omitted)
    #[arg(short, long)]
    store: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);

    match args.store {
        Some(path) => serve(&address, FileStore::open(path)?).await,
        None => {
            info!("No --store given, scores will not survive a restart");
            serve(&address, MemoryStore::new()).await
        }
    }
}

async fn serve<S: KeyValueStore + 'static>(
    address: &str,
    store: S,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = ScoreboardService::new(store, HostIdentity);
    let server = Server::bind(address, service).await?;

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
            Ok(())
        }
    }
}
