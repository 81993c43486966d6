use anyhow::{anyhow, Context};
use colored::Colorize;
use tracing::{debug, info};

use quill_auth::TokenSigner;
use quill_server::{QuillServer, ServerConfig};
use quill_types::UserId;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = ServerConfig::load(cli.config.as_deref()).context("loading configuration")?;
    debug!(path = ?cli.config, bind = %config.bind_addr, "configuration loaded");
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args),
        Command::Config => cmd_config(&config),
        Command::Keygen => cmd_keygen(&config),
        Command::Token(args) => cmd_token(&config, args),
    }
}

fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address {bind:?}"))?;
    }
    println!("Quill server on {}", config.bind_addr.to_string().bold());
    if let Some(origin) = &config.frontend_url {
        println!("  Frontend: {}", origin.blue());
    }
    info!(
        keyed = config.signing_key.is_some(),
        ttl = config.session_ttl_secs,
        "starting server"
    );
    let server = QuillServer::new(config)?;
    let runtime = tokio::runtime::Runtime::new().context("starting runtime")?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn cmd_config(config: &ServerConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

fn cmd_keygen(config: &ServerConfig) -> anyhow::Result<()> {
    let signer = TokenSigner::generate(config.session_ttl_secs);
    println!("{} New signing key", "✓".green().bold());
    println!("  {}", signer.seed_hex().yellow());
    println!("Set {} or `signing_key` in the config file.", "QUILL_SIGNING_KEY".bold());
    Ok(())
}

fn cmd_token(config: &ServerConfig, args: TokenArgs) -> anyhow::Result<()> {
    let token = mint_token(config, &args)?;
    println!("{}", token);
    Ok(())
}

fn mint_token(config: &ServerConfig, args: &TokenArgs) -> anyhow::Result<String> {
    let seed = config
        .signing_key
        .as_deref()
        .ok_or_else(|| anyhow!("no signing key configured; run `quill keygen` first"))?;
    let user: UserId = args.user.parse().context("invalid user id")?;
    let signer = TokenSigner::from_hex(seed, args.ttl.unwrap_or(config.session_ttl_secs))?;
    debug!(user = %user, ttl = signer.ttl_secs(), "minting session token");
    Ok(signer.issue(user)?)
}
