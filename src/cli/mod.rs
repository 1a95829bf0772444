//! CLI entry point for authbridge.

pub mod verify;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// authbridge CLI
#[derive(Parser, Debug)]
#[command(name = "authbridge", version, about = "Serialized token authentication bridge")]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate one or more tokens and print each outcome in order
    Verify(VerifyArgs),
    /// Show which authentication mode the configuration resolves to
    Mode(ModeArgs),
}

/// Arguments for `authbridge verify`.
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Static endpoint token (overrides config and AUTHBRIDGE_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Accepted token and the session it maps to, as TOKEN=SESSION (repeatable)
    #[arg(long = "accept", value_parser = parse_accept)]
    pub accept: Vec<(String, String)>,

    /// Tokens to authenticate
    #[arg(required = true)]
    pub tokens: Vec<String>,
}

/// Arguments for `authbridge mode`.
#[derive(Parser, Debug)]
pub struct ModeArgs {
    /// Static endpoint token (overrides config and AUTHBRIDGE_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Pretend a callback authenticator is installed
    #[arg(long)]
    pub callback: bool,
}

fn parse_accept(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((token, session)) if !token.is_empty() && !session.is_empty() => {
            Ok((token.to_string(), session.to_string()))
        }
        _ => Err(format!("expected TOKEN=SESSION, got '{raw}'")),
    }
}
