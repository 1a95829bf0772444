//! authbridge CLI binary entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use authbridge::cli::{Cli, Commands};
use authbridge::error::BridgeError;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    authbridge::runtime::init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Verify(args) => authbridge::cli::verify::handle_verify(config, args).await,
        Commands::Mode(args) => authbridge::cli::verify::handle_mode(config, args),
    };

    authbridge::runtime::deinit();

    if let Err(e) = result {
        eprintln!("Error: {e}");
        let usage = e
            .downcast_ref::<BridgeError>()
            .is_some_and(BridgeError::is_usage_error);
        std::process::exit(if usage { 2 } else { 1 });
    }
}
