//! PoSH CLI: query PoSH identities, proofs, scores and events over JSON-RPC.

mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use posh_sdk::{
    get_deployment, list_deployments, EventFilter, HumanId, ImpactType, JsonRpcConfig,
    JsonRpcProvider, PoshClient, PoshConfig, ProofQueryOptions, ProofTier, ProviderBinding,
};

/// PoSH CLI: Proof of Sustainable Humanity queries
#[derive(Parser, Debug)]
#[command(name = "posh", version)]
#[command(about = "Query PoSH identities, proofs, scores and events")]
struct Args {
    /// JSON configuration file
    #[arg(short, long, conflicts_with = "deployment")]
    config: Option<PathBuf>,

    /// Known deployment name (e.g. human0-base-sepolia)
    #[arg(short, long)]
    deployment: Option<String>,

    /// JSON-RPC endpoint, overrides the configuration
    #[arg(long, env = "POSH_RPC_URL")]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List known deployments
    Deployments {
        /// Only deployments on this chain
        #[arg(long)]
        chain_id: Option<u64>,
    },
    /// Print the effective configuration
    Config,
    /// Whether a wallet owns an identity
    IsRegistered { address: String },
    /// Human id owned by a wallet
    HumanId { address: String },
    /// Identity record of a human id
    Identity { human_id: String },
    /// Score and level of a human id
    Score { human_id: String },
    /// Proofs of a human id
    Proofs {
        human_id: String,
        /// renewable_energy, carbon_avoidance, sustainable_transport, waste_reduction, water_conservation
        #[arg(long, value_parser = parse_impact_type)]
        impact_type: Option<ImpactType>,
        /// A, B or C
        #[arg(long, value_parser = parse_tier)]
        tier: Option<ProofTier>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        offset: Option<usize>,
    },
    /// Impact totals of a human id
    Impact { human_id: String },
    /// Historical events
    Events {
        #[arg(value_enum)]
        kind: EventKind,
        #[arg(long)]
        from_block: Option<u64>,
        #[arg(long)]
        to_block: Option<u64>,
        #[arg(long)]
        human_id: Option<String>,
    },
    /// Stream live events until Ctrl-C
    Watch {
        #[arg(value_enum)]
        kind: EventKind,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EventKind {
    Registered,
    Proofs,
    Linked,
}

fn parse_impact_type(value: &str) -> Result<ImpactType, String> {
    ImpactType::ALL
        .iter()
        .copied()
        .find(|t| t.as_str() == value)
        .ok_or_else(|| format!("unknown impact type: {}", value))
}

fn parse_tier(value: &str) -> Result<ProofTier, String> {
    match value.to_ascii_uppercase().as_str() {
        "A" => Ok(ProofTier::A),
        "B" => Ok(ProofTier::B),
        "C" => Ok(ProofTier::C),
        _ => Err(format!("unknown tier: {}", value)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    telemetry::init(&telemetry::TelemetryConfig::from_env())?;

    match &args.command {
        Command::Deployments { chain_id } => {
            let deployments: Vec<_> = list_deployments()
                .into_iter()
                .filter(|d| chain_id.map_or(true, |c| d.chain_id == c))
                .collect();
            return print(&deployments);
        }
        Command::Config => return print(&load_config(&args)?),
        _ => {}
    }

    let client = build_client(&args)?;
    run(&client, args.command).await
}

fn load_config(args: &Args) -> anyhow::Result<PoshConfig> {
    let mut config = match (&args.config, &args.deployment) {
        (Some(path), _) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            PoshConfig::from_json(&raw)?
        }
        (None, Some(name)) => PoshConfig::from_deployment(name)?,
        (None, None) => PoshConfig::default(),
    };
    if let Some(url) = &args.rpc_url {
        config.rpc_url = Some(url.clone());
    }
    Ok(config)
}

fn build_client(args: &Args) -> anyhow::Result<PoshClient> {
    let config = load_config(args)?;

    let not_deployed = args
        .deployment
        .as_deref()
        .and_then(get_deployment)
        .map_or(false, |d| !d.deployed);

    let binding = if not_deployed {
        ProviderBinding::NotDeployed
    } else {
        match &config.rpc_url {
            Some(url) => {
                let provider = JsonRpcProvider::new(JsonRpcConfig::new(url.clone(), config.chain_id))?;
                ProviderBinding::Live(Arc::new(provider))
            }
            None => ProviderBinding::Unbound,
        }
    };

    tracing::debug!(chain_id = config.chain_id, binding = ?binding, "Client ready");
    Ok(PoshClient::with_binding(config, binding)?)
}

async fn run(client: &PoshClient, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Deployments { .. } | Command::Config => Ok(()),
        Command::IsRegistered { address } => {
            let registered = client.identity().is_registered(&address).await?;
            print(&json!({ "address": address, "registered": registered }))
        }
        Command::HumanId { address } => {
            let human_id = client.identity().get_human_id(&address).await?;
            print(&json!({ "address": address, "humanId": human_id }))
        }
        Command::Identity { human_id } => match client.identity().get_identity(&human_id).await? {
            Some(identity) => print(&identity),
            None => bail!("no identity for {}", human_id),
        },
        Command::Score { human_id } => {
            let score = client.score().get_score(&human_id).await?;
            let level = client.score().level_from_score(score);
            print(&json!({ "humanId": human_id, "score": score.to_string(), "level": level }))
        }
        Command::Proofs {
            human_id,
            impact_type,
            tier,
            limit,
            offset,
        } => {
            let options = ProofQueryOptions {
                impact_type,
                tier,
                limit,
                offset,
                ..ProofQueryOptions::default()
            };
            print(&client.proofs().get_human_proofs(&human_id, &options).await?)
        }
        Command::Impact { human_id } => print(&client.proofs().get_impact_summary(&human_id).await?),
        Command::Events {
            kind,
            from_block,
            to_block,
            human_id,
        } => {
            let filter = EventFilter {
                from_block,
                to_block,
                human_id: human_id.map(|h| h.parse::<HumanId>()).transpose()?,
            };
            let events = client.events();
            match kind {
                EventKind::Registered => print(&events.get_human_registered_events(&filter).await?),
                EventKind::Proofs => print(&events.get_proof_registered_events(&filter).await?),
                EventKind::Linked => print(&events.get_identity_linked_events(&filter).await?),
            }
        }
        Command::Watch { kind } => watch(client, kind).await,
    }
}

async fn watch(client: &PoshClient, kind: EventKind) -> anyhow::Result<()> {
    let events = client.events();
    let subscription = match kind {
        EventKind::Registered => events.on_human_registered(|e| emit(&e)).await?,
        EventKind::Proofs => events.on_proof_registered(|e| emit(&e)).await?,
        EventKind::Linked => events.on_identity_linked(|e| emit(&e)).await?,
    };
    tracing::info!(kind = ?kind, "Watching, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    subscription.unsubscribe();
    Ok(())
}

fn emit<T: serde::Serialize>(event: &T) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{}", line),
        Err(e) => tracing::warn!(error = %e, "Failed to serialize event"),
    }
}

fn print<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
