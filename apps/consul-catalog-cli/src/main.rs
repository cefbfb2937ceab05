mod config;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{AppConfig, CliOverrides};
use consul_catalog::{Consul, Options};
use serde_json::{Value, json};
use std::path::PathBuf;

/// Query and update the Consul service catalog
#[derive(Parser)]
#[command(name = "consul-catalog")]
#[command(about = "Query and update the Consul service catalog")]
#[command(version)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Agent host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Agent HTTP port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Talk to the agent over HTTPS
    #[arg(long)]
    secure: bool,

    /// ACL token (overrides config)
    #[arg(long)]
    token: Option<String>,

    /// Default datacenter (overrides config)
    #[arg(long)]
    dc: Option<String>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the services of a datacenter
    Services {
        /// Datacenter to query
        datacenter: Option<String>,
        /// Allow any server to answer, not only the leader
        #[arg(long)]
        stale: bool,
    },
    /// List the nodes providing a service
    Nodes {
        service: String,
        /// Only nodes whose service instance carries this tag
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        stale: bool,
    },
    /// Register a service instance on a node
    Register {
        /// Service name
        name: String,
        /// Service instance id (defaults to the name)
        #[arg(long)]
        id: Option<String>,
        /// Node to register on
        #[arg(long)]
        node: String,
        /// Node address
        #[arg(long)]
        address: String,
        #[arg(long)]
        port: Option<u16>,
        /// Service tag; repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// HTTP health check URL (needs --interval)
        #[arg(long)]
        http_check: Option<String>,
        /// TCP health check `host:port` (needs --interval)
        #[arg(long)]
        tcp_check: Option<String>,
        /// Health check interval, e.g. 10s
        #[arg(long)]
        interval: Option<String>,
        /// TTL health check, e.g. 30s
        #[arg(long)]
        ttl: Option<String>,
    },
    /// Remove a node and everything registered on it
    Deregister {
        /// Node id
        node: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (CONSUL_CATALOG__*) -> 4) CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(CliOverrides {
        host: cli.host,
        port: cli.port,
        secure: cli.secure,
        token: cli.token,
        datacenter: cli.dc,
    });

    logging::init(&config.logging, cli.verbose);

    if cli.print_config {
        println!("{}", config.to_redacted_yaml()?);
        return Ok(());
    }

    let Some(command) = cli.command else {
        anyhow::bail!("no command given; see --help");
    };

    tracing::debug!(base_url = %config.consul.base_url(), "connecting to agent");
    let consul = Consul::from_config(&config.consul).context("failed to create client")?;

    run(&consul, command).await
}

async fn run(consul: &Consul, command: Commands) -> Result<()> {
    let service = consul.catalog().service();
    match command {
        Commands::Services { datacenter, stale } => {
            let mut opts = Options::new();
            if let Some(dc) = datacenter {
                opts.insert("dc".to_owned(), Value::String(dc));
            }
            opts.insert("stale".to_owned(), Value::Bool(stale));
            print_json(&service.list(opts).await?)
        }
        Commands::Nodes {
            service: name,
            tag,
            stale,
        } => {
            let opts = json!({"service": name, "tag": tag, "stale": stale});
            print_json(&service.nodes(opts).await?)
        }
        Commands::Register {
            name,
            id,
            node,
            address,
            port,
            tags,
            http_check,
            tcp_check,
            interval,
            ttl,
        } => {
            let mut opts = json!({
                "node": node,
                "address": address,
                "service": {
                    "ID": id.unwrap_or_else(|| name.clone()),
                    "Service": name,
                    "Tags": tags,
                    "Port": port,
                },
            });
            let check = json!({"http": http_check, "tcp": tcp_check, "interval": interval, "ttl": ttl});
            if check.as_object().is_some_and(|c| c.values().any(|v| !v.is_null())) {
                opts["check"] = check;
            }
            service.register(opts).await?;
            tracing::info!("registered");
            Ok(())
        }
        Commands::Deregister { node } => {
            service.deregister(node).await?;
            tracing::info!("deregistered");
            Ok(())
        }
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
