//! srvctl - application server instance manager
//!
//! Usage:
//!   srvctl create was --server-id was-8080 --service-port 8080
//!   srvctl clone web --server-id web-80 --clone-id web-81 --clone-port 81
//!   srvctl delete was --server-id was-8080
//!   srvctl modify-engine was --server-id was-8080 --version 9.0.07
//!   srvctl list-engines was
//!   srvctl list

mod interactive;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use srvctl_core::context::AppContext;
use srvctl_core::dispatch::{OperationInput, Request, build_request};
use srvctl_core::installer::{InstallReport, Operation};
use srvctl_core::prelude::InstallerConfig;
use srvctl_core::registry::ServerRecord;
use srvctl_core::types::{CommandKind, ServerType};

use crate::interactive::{InteractiveFlow, PromptDefaults, confirm_delete};

#[derive(Parser)]
#[command(name = "srvctl")]
#[command(about = "Create, clone, delete and re-engine application server instances", long_about = None)]
struct Cli {
    /// Product home (overrides SRVCTL_HOME)
    #[arg(long, global = true, value_name = "DIR")]
    home: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short = 'o', long, global = true, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an instance from the depot template
    Create(ServerArgs),

    /// Clone a registered instance under a new id and port
    Clone(ServerArgs),

    /// Delete a stopped instance and its install directory
    #[command(alias = "rm")]
    Delete(ServerArgs),

    /// Switch an instance to another installed engine version
    Modify(ServerArgs),

    /// Same as `modify`
    ModifyEngine(ServerArgs),

    /// List locally installed engine versions
    ListEngines {
        /// Server type (web, was, session)
        server_type: String,
    },

    /// Download an engine archive (not supported; install engines manually)
    DownloadEngine {
        /// Server type (web, was, session)
        server_type: String,
    },

    /// List registered instances
    List,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
    /// No output on success
    Quiet,
}

#[derive(Args)]
struct ServerArgs {
    /// Server type (web, was, session)
    server_type: String,

    /// Prompt for missing fields
    #[arg(short, long)]
    interactive: bool,

    /// Skip confirmation prompts
    #[arg(short = 'y', long)]
    yes: bool,

    #[command(flatten)]
    fields: FieldArgs,
}

#[derive(Args, Default)]
struct FieldArgs {
    /// Server id (the source id for clone)
    #[arg(long, short = 's')]
    server_id: Option<String>,
    #[arg(long, short = 'p')]
    service_port: Option<String>,
    #[arg(long)]
    run_user: Option<String>,
    /// Parent directory of the instance
    #[arg(long)]
    install_root: Option<String>,
    /// Log root; the instance logs under <LOG_HOME>/<server id>
    #[arg(long)]
    log_home: Option<String>,
    /// Web only
    #[arg(long)]
    document_root: Option<String>,
    /// Web only; defaults to the latest installed httpd
    #[arg(long)]
    engine_home: Option<String>,
    /// Was only
    #[arg(long)]
    ajp_address: Option<String>,
    /// Was only
    #[arg(long)]
    jvm_route: Option<String>,
    /// Session only
    #[arg(long)]
    secondary_host: Option<String>,
    /// Session only
    #[arg(long)]
    secondary_port: Option<String>,
    #[arg(long)]
    clone_id: Option<String>,
    #[arg(long)]
    clone_port: Option<String>,
    /// Target engine version for modify
    #[arg(long)]
    version: Option<String>,
}

impl From<FieldArgs> for OperationInput {
    fn from(f: FieldArgs) -> Self {
        OperationInput {
            server_id: f.server_id,
            service_port: f.service_port,
            run_user: f.run_user,
            install_root: f.install_root,
            log_home: f.log_home,
            document_root: f.document_root,
            engine_home: f.engine_home,
            ajp_address: f.ajp_address,
            jvm_route: f.jvm_route,
            secondary_host: f.secondary_host,
            secondary_port: f.secondary_port,
            clone_id: f.clone_id,
            clone_port: f.clone_port,
            version: f.version,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "srvctl=debug,srvctl_core=debug,info"
    } else {
        "srvctl=info,srvctl_core=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = InstallerConfig::load(cli.home.clone())
        .context("Failed to load installer configuration")?;
    tracing::debug!(home = %config.home().display(), layout = ?config.depot_layout(), "configuration loaded");
    let ctx = AppContext::new(config);

    run_cli(&ctx, cli.command, cli.format)
}

fn run_cli(ctx: &AppContext, command: Commands, format: OutputFormat) -> Result<()> {
    match command {
        Commands::Create(args) => run_operation(ctx, CommandKind::Create, args, format),
        Commands::Clone(args) => run_operation(ctx, CommandKind::Clone, args, format),
        Commands::Delete(args) => run_operation(ctx, CommandKind::Delete, args, format),
        Commands::Modify(args) => run_operation(ctx, CommandKind::Modify, args, format),
        Commands::ModifyEngine(args) => {
            run_operation(ctx, CommandKind::ModifyEngine, args, format)
        }
        Commands::ListEngines { server_type } => {
            let request = build_request(
                CommandKind::ListEngines,
                server_type.parse()?,
                OperationInput::default(),
            )?;
            match request {
                Request::ListEngines(ty) => run_list_engines(ctx, ty, format),
                Request::Execute(_) => anyhow::bail!("list-engines resolved to a mutation"),
            }
        }
        Commands::DownloadEngine { server_type } => {
            build_request(
                CommandKind::DownloadEngine,
                server_type.parse()?,
                OperationInput::default(),
            )?;
            Ok(())
        }
        Commands::List => run_list(ctx, format),
    }
}

fn run_operation(
    ctx: &AppContext,
    command: CommandKind,
    args: ServerArgs,
    format: OutputFormat,
) -> Result<()> {
    let server_type: ServerType = args.server_type.parse()?;
    let mut input = OperationInput::from(args.fields);

    if args.interactive {
        let engine_version = ctx.engine_catalog().latest(server_type)?;
        let defaults = PromptDefaults::from_config(ctx.config(), server_type, engine_version);
        let mut flow = InteractiveFlow::new(command, server_type, input, defaults, args.yes);
        let result = flow.collect()?;
        if !result.confirmed {
            println!("{command} cancelled.");
            return Ok(());
        }
        input = result.input;
    }

    let op = match build_request(command, server_type, input)? {
        Request::Execute(op) => op,
        Request::ListEngines(ty) => return run_list_engines(ctx, ty, format),
    };

    // Interactive runs already confirmed through the summary.
    if let Operation::Delete(p) = &op
        && !args.interactive
        && !confirm_delete(&p.server_id, args.yes)?
    {
        println!("delete cancelled.");
        return Ok(());
    }

    let report = ctx
        .installer()
        .execute(op)
        .with_context(|| format!("{command} {server_type} failed"))?;
    print_report(&report, format)
}

fn print_report(report: &InstallReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let verb = match report.operation {
                "create" => "Created",
                "clone" => "Cloned",
                "delete" => "Deleted",
                _ => "Updated",
            };
            println!(
                "✓ {} {} server '{}'",
                verb, report.server_type, report.server_id
            );
            println!("  Path:    {}", report.path.display());
            if let Some(port) = &report.port {
                println!("  Port:    {port}");
            }
            if let Some(version) = &report.version {
                println!("  Version: {version}");
            }
            for warning in &report.warnings {
                println!("  ⚠ {warning}");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn run_list_engines(ctx: &AppContext, server_type: ServerType, format: OutputFormat) -> Result<()> {
    let catalog = ctx.engine_catalog();
    let versions = catalog.installed_versions(server_type)?;

    match format {
        OutputFormat::Table => {
            if versions.is_empty() {
                println!("No {} engines installed.", server_type.engine_name());
                println!(
                    "Unpack one under: {}",
                    catalog.engine_root(server_type).display()
                );
                return Ok(());
            }
            println!("{:<16} Path", "Version");
            println!("{}", "-".repeat(60));
            for version in &versions {
                println!(
                    "{:<16} {}",
                    version,
                    catalog.engine_dir(server_type, version).display()
                );
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "type": server_type,
                "engine": server_type.engine_name(),
                "versions": versions,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn run_list(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let records = ctx.registry_store().list()?;
    match format {
        OutputFormat::Table => print_record_table(&records),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn print_record_table(records: &[ServerRecord]) {
    if records.is_empty() {
        println!("No servers registered.");
        println!("Create one with: srvctl create <web|was|session> --server-id <id>");
        return;
    }

    println!(
        "{:<20} {:<8} {:<7} {:<14} Path",
        "ID", "Type", "Port", "Version"
    );
    println!("{}", "-".repeat(80));
    for record in records {
        println!(
            "{:<20} {:<8} {:<7} {:<14} {}",
            record.id,
            record.server_type,
            record.port,
            record.version.as_deref().unwrap_or("-"),
            record.path.display()
        );
    }
}
