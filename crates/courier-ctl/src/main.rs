//! courier-ctl — command-line driver for the attachment exchange.
//!
//! Runs one side of the exchange against a ledger node's RPC API:
//!
//!   courier-ctl --role sender --file prospectus.pdf
//!   courier-ctl --role recipient --digest <hex>

use std::path::PathBuf;

use anyhow::{Context, Result};
use bytes::Bytes;

use courier_core::config::CourierConfig;
use courier_core::crypto::Keypair;
use courier_core::Digest;
use courier_exchange::{ExchangeCoordinator, Role};
use courier_ledger::RpcNode;

fn print_usage() {
    println!("Usage: courier-ctl --role <sender|recipient> [options]");
    println!();
    println!("Options:");
    println!("  --role <role>     Which side of the exchange to run (required)");
    println!("  --file <path>     Artifact to send (sender only)");
    println!("  --digest <hex>    Expected artifact digest (recipient; optional for sender)");
    println!("  --node <url>      Ledger node RPC address (overrides config)");
    println!("  --config <path>   Config file (default: $COURIER_CONFIG or XDG location)");
}

struct Args {
    role: Role,
    file: Option<PathBuf>,
    digest: Option<Digest>,
    node: Option<String>,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Option<Args>> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut role = None;
    let mut file = None;
    let mut digest = None;
    let mut node = None;
    let mut config = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--role" => {
                i += 1;
                let value = args.get(i).context("--role requires a value")?;
                role = Some(value.parse::<Role>().map_err(anyhow::Error::msg)?);
            }
            "--file" => {
                i += 1;
                file = Some(PathBuf::from(
                    args.get(i).context("--file requires a value")?,
                ));
            }
            "--digest" => {
                i += 1;
                let value = args.get(i).context("--digest requires a value")?;
                digest = Some(value.parse::<Digest>().context("--digest must be 64 hex characters")?);
            }
            "--node" => {
                i += 1;
                node = Some(args.get(i).context("--node requires a value")?.clone());
            }
            "--config" => {
                i += 1;
                config = Some(PathBuf::from(
                    args.get(i).context("--config requires a value")?,
                ));
            }
            "help" | "--help" | "-h" => return Ok(None),
            other => {
                eprintln!("Unknown argument: {other}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(role) = role else {
        eprintln!("Missing required --role");
        eprintln!();
        print_usage();
        std::process::exit(1);
    };

    Ok(Some(Args {
        role,
        file,
        digest,
        node,
        config,
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Some(args) = parse_args()? else {
        print_usage();
        return Ok(());
    };

    let mut config = match &args.config {
        Some(path) => CourierConfig::load_from(path)?,
        None => {
            if let Err(e) = CourierConfig::write_default_if_missing() {
                tracing::warn!(error = %e, "failed to write default config");
            }
            CourierConfig::load().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to load config, using defaults");
                CourierConfig::default()
            })
        }
    };
    if let Some(node) = args.node {
        config.node.rpc_address = node;
    }

    let keypair = Keypair::load_or_generate(&config.identity.keypair_path)
        .context("failed to load or generate keypair")?;
    tracing::info!(public_key = %keypair.public(), node = %config.node.rpc_address, "courier-ctl starting");

    let node = RpcNode::new(config.node.rpc_address.clone());
    let coordinator = ExchangeCoordinator::new(node, keypair, config.exchange.observer_policy);

    let delivered = match args.role {
        Role::Sender => {
            let path = args
                .file
                .context("--role sender requires --file <path>")?;
            let content = std::fs::read(&path)
                .with_context(|| format!("failed to read artifact: {}", path.display()))?;
            let expected = args.digest.or(config.exchange.expected_digest);
            coordinator.run_sender(Bytes::from(content), expected).await?
        }
        Role::Recipient => {
            let expected = args
                .digest
                .or(config.exchange.expected_digest)
                .context("--role recipient requires --digest <hex> (or expected_digest in config)")?;
            coordinator.run_recipient(expected).await?
        }
    };

    if delivered {
        println!("Exchange complete — attachment delivered and transaction finalized.");
        Ok(())
    } else {
        println!("Exchange finished without the expected attachment.");
        std::process::exit(1);
    }
}
