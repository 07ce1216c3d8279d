//! Server binary: parse flags, set up logging, run the accept loop.

use callout_server::{GameServer, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }
    let config = match ServerConfig::from_args(args.drain(..)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            std::process::exit(2);
        }
    };

    let server = GameServer::builder().bind(&config.bind_addr()).build().await?;
    tracing::info!(addr = %server.local_addr()?, "waiting for three players");

    server.run().await?;
    Ok(())
}

fn print_usage() {
    println!("Usage: callout-server [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --host <HOST>   Listen host (default: 127.0.0.1)");
    println!("  --port <PORT>   Listen port (default: 12345)");
    println!("  --help, -h      Show this help");
}
