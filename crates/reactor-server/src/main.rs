use clap::Parser;
use reactor_server::{logging, AppConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "reactor.toml")]
    config: String,

    /// Override the configured listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(&args.config)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    logging::init_logging(&config.logging)?;
    tracing::info!(config = %args.config, "Starting reactor server");

    reactor_server::run(config).await
}
