use anyhow::Result;
use clap::{Parser, Subcommand};
use itemscribe::{server, Config};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "itemscribe", version, about = "Item catalog and audio transcription API")]
struct Cli {
    /// Config file, without extension (toml, yaml and json are all tried)
    #[arg(long, default_value = "config/itemscribe")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Override service.http.port
        #[arg(long)]
        port: Option<u16>,

        /// Override service.http.bind
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::load(&cli.config)?;

    match cli.command.unwrap_or(Command::Serve {
        port: None,
        bind: None,
    }) {
        Command::Serve { port, bind } => {
            if let Some(port) = port {
                cfg.service.http.port = port;
            }
            if let Some(bind) = bind {
                cfg.service.http.bind = bind;
            }

            info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
            server::serve(cfg).await
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&redacted(cfg))?);
            Ok(())
        }
    }
}

/// Hide everything after the scheme of the connection string
fn redacted(mut cfg: Config) -> Config {
    if let Some(url) = cfg.database.url.as_mut() {
        let scheme = url.split(':').next().unwrap_or_default().to_string();
        *url = format!("{}:***", scheme);
    }
    cfg
}
