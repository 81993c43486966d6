use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "quill", about = "Quill blogging backend", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Print the effective configuration as TOML
    Config,
    /// Generate a new session signing key
    Keygen,
    /// Mint a session token for a user id
    Token(TokenArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Override the bind address
    #[arg(short, long)]
    pub bind: Option<String>,
}

#[derive(Args)]
pub struct TokenArgs {
    /// User id to issue the token for
    pub user: String,

    /// Token lifetime in seconds (defaults to the configured session TTL)
    #[arg(long)]
    pub ttl: Option<i64>,
}
