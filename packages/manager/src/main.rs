//! Command line front-end for managing ENS names.

use clap::{Parser, Subcommand};
use ens::utils::{parse_search_term, SearchTerm};
use ens::{parse_address, Address, B256};
use ens_manager::{
    DomainDetails, Ens, ManagerConfig, ManagerError, ReverseRecord, SubDomain, TxReceipt,
};
use serde::Serialize;
use std::fmt::Display;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ens-manager")]
#[command(about = "Look up and manage ENS names", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint of the node
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Registry contract address
    #[arg(long, global = true, value_parser = parse_address)]
    registry: Option<Address>,

    /// Account transactions are sent from
    #[arg(long, global = true, value_parser = parse_address)]
    from: Option<Address>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a search term and look it up when it is a name or an address
    Search { term: String },
    /// Owner, resolver, addr and content of a name
    Details { name: String },
    /// Owner of a name
    Owner { name: String },
    /// Resolver of a name
    Resolver { name: String },
    /// Address record of a name
    Addr { name: String },
    /// Content hash record of a name
    Content { name: String },
    /// Children of a name that still have an owner
    Subdomains { name: String },
    /// Reverse record of an address
    Name {
        #[arg(value_parser = parse_address)]
        address: Address,
    },
    /// Transfer a name
    SetOwner {
        name: String,
        #[arg(value_parser = parse_address)]
        owner: Address,
    },
    /// Set the owner of label.parent
    SetSubnodeOwner {
        label: String,
        parent: String,
        #[arg(value_parser = parse_address)]
        owner: Address,
    },
    /// Point a name at a resolver
    SetResolver {
        name: String,
        #[arg(value_parser = parse_address)]
        resolver: Address,
    },
    /// Set the address record of a name
    SetAddr {
        name: String,
        #[arg(value_parser = parse_address)]
        address: Address,
    },
    /// Set the content hash record of a name
    SetContent { name: String, hash: B256 },
    /// Create label.parent owned by the sender
    CreateSubdomain { label: String, parent: String },
    /// Clear and release label.parent
    DeleteSubdomain { label: String, parent: String },
    /// Give the sender's reverse node to an owner
    Claim {
        #[arg(value_parser = parse_address)]
        owner: Address,
    },
    /// Claim the sender's reverse node with a resolver
    ClaimReverse {
        #[arg(value_parser = parse_address)]
        resolver: Address,
    },
    /// Set the name on the sender's claimed reverse node
    SetReverseName { name: String },
    /// Claim the reverse node and set its name in one transaction
    ClaimAndSetReverseName { name: String },
    /// JSON schema of the config and output types
    Schema,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Manager(#[from] ManagerError),

    #[error("cannot encode output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct SearchResult {
    term: String,
    kind: SearchTerm,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<DomainDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reverse: Option<ReverseRecord>,
}

fn load_config(cli: &Cli) -> Result<ManagerConfig, ManagerError> {
    let config = match &cli.config {
        Some(path) => ManagerConfig::load(path)?,
        None => ManagerConfig::default(),
    };
    let mut config = config.apply_env()?;
    if let Some(rpc_url) = &cli.rpc_url {
        config.rpc_url = rpc_url.clone();
    }
    if let Some(registry) = cli.registry {
        config.registry_address = registry;
    }
    if let Some(from) = cli.from {
        config.from = Some(from);
    }
    Ok(config)
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl Display) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text);
    }
    Ok(())
}

fn emit_receipt(json: bool, receipt: &TxReceipt) -> Result<(), CliError> {
    let value = serde_json::json!({
        "transaction_hash": receipt.transaction_hash,
        "block_number": receipt.block_number,
    });
    emit(json, &value, receipt.transaction_hash)
}

fn details_text(details: &DomainDetails) -> String {
    let optional = |value: Option<String>| value.unwrap_or_else(|| String::from("-"));
    format!(
        "name      {}\nnode      {}\nowner     {}\nresolver  {}\naddr      {}\ncontent   {}",
        details.name,
        details.node,
        details.owner,
        details.resolver,
        optional(details.addr.map(|a| a.to_string())),
        optional(details.content.map(|c| c.to_string())),
    )
}

fn subdomains_text(subdomains: &[SubDomain]) -> String {
    subdomains
        .iter()
        .map(|s| format!("{}  {}", s.name, s.owner))
        .collect::<Vec<_>>()
        .join("\n")
}

fn reverse_text(record: &ReverseRecord) -> String {
    record.name.clone().unwrap_or_else(|| String::from("-"))
}

async fn search(
    ens: &Ens,
    config: &ManagerConfig,
    term: String,
    json: bool,
) -> Result<(), CliError> {
    let kind = parse_search_term(&term, &config.supported_tlds);
    let mut result = SearchResult {
        term: term.trim().to_string(),
        kind,
        details: None,
        reverse: None,
    };
    let text = match kind {
        SearchTerm::Supported | SearchTerm::Short => {
            let name = match (kind, config.supported_tlds.first()) {
                (SearchTerm::Short, Some(tld)) => format!("{}.{}", result.term, tld),
                _ => result.term.clone(),
            };
            let details = ens.get_domain_details(&name).await?;
            let text = details_text(&details);
            result.details = Some(details);
            text
        }
        SearchTerm::Address => {
            let address = parse_address(&result.term).map_err(ManagerError::from)?;
            let record = ens.get_name(address).await?;
            let text = reverse_text(&record);
            result.reverse = Some(record);
            text
        }
        other => format!("{}: {:?}", result.term, other),
    };
    emit(json, &result, text)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let json = cli.json;
    if let Commands::Schema = cli.command {
        let schemas = serde_json::json!({
            "config": schemars::schema_for!(ManagerConfig),
            "domain_details": schemars::schema_for!(DomainDetails),
            "sub_domain": schemars::schema_for!(SubDomain),
            "reverse_record": schemars::schema_for!(ReverseRecord),
        });
        println!("{}", serde_json::to_string_pretty(&schemas)?);
        return Ok(());
    }

    let config = load_config(&cli)?;
    let ens = Ens::from_config(&config)?;

    match cli.command {
        Commands::Search { term } => search(&ens, &config, term, json).await?,
        Commands::Details { name } => {
            let details = ens.get_domain_details(&name).await?;
            emit(json, &details, details_text(&details))?
        }
        Commands::Owner { name } => {
            let owner = ens.get_owner(&name).await?;
            emit(json, &owner, owner)?
        }
        Commands::Resolver { name } => {
            let resolver = ens.get_resolver(&name).await?;
            emit(json, &resolver, resolver)?
        }
        Commands::Addr { name } => {
            let addr = ens.get_addr(&name).await?;
            emit(json, &addr, addr)?
        }
        Commands::Content { name } => {
            let content = ens.get_content(&name).await?;
            emit(json, &content, content)?
        }
        Commands::Subdomains { name } => {
            let subdomains = ens.get_subdomains(&name).await?;
            emit(json, &subdomains, subdomains_text(&subdomains))?
        }
        Commands::Name { address } => {
            let record = ens.get_name(address).await?;
            emit(json, &record, reverse_text(&record))?
        }
        Commands::SetOwner { name, owner } => {
            emit_receipt(json, &ens.set_owner(&name, owner).await?)?
        }
        Commands::SetSubnodeOwner {
            label,
            parent,
            owner,
        } => emit_receipt(json, &ens.set_subnode_owner(&label, &parent, owner).await?)?,
        Commands::SetResolver { name, resolver } => {
            emit_receipt(json, &ens.set_resolver(&name, resolver).await?)?
        }
        Commands::SetAddr { name, address } => {
            emit_receipt(json, &ens.set_address(&name, address).await?)?
        }
        Commands::SetContent { name, hash } => {
            emit_receipt(json, &ens.set_content(&name, hash).await?)?
        }
        Commands::CreateSubdomain { label, parent } => {
            emit_receipt(json, &ens.create_subdomain(&label, &parent).await?)?
        }
        Commands::DeleteSubdomain { label, parent } => {
            emit_receipt(json, &ens.delete_subdomain(&label, &parent).await?)?
        }
        Commands::Claim { owner } => emit_receipt(json, &ens.claim(owner).await?)?,
        Commands::ClaimReverse { resolver } => {
            emit_receipt(json, &ens.claim_reverse_record(resolver).await?)?
        }
        Commands::SetReverseName { name } => {
            emit_receipt(json, &ens.set_reverse_record_name(&name).await?)?
        }
        Commands::ClaimAndSetReverseName { name } => {
            emit_receipt(json, &ens.claim_and_set_reverse_record_name(&name).await?)?
        }
        Commands::Schema => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
