//! ncprobe CLI binary entry point.

use ncprobe::cli::{commands, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ncprobe=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    let config = match cli.global.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };
    tracing::debug!(?config, "resolved configuration");

    let result = match &cli.command {
        Commands::Health => commands::handle_health(&config).await,
        Commands::Tools(args) => commands::handle_tools(&config, args).await,
        Commands::Resources => commands::handle_resources(&config).await,
        Commands::Call(args) => commands::handle_call(&config, args).await,
        Commands::Smoke(args) => commands::handle_smoke(&config, args).await,
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error [{}]: {e}", e.category());
            std::process::exit(1);
        }
    }
}
