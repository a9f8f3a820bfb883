//! Portmap - Locate IP addresses on switch ports
//!
//! Reads the core router's ARP table and every access switch's MAC address
//! table, then writes which switch port each IP address lives on.

mod config;

use anyhow::{bail, Context, Result};
use clap::Parser;
use portmap_core::{CsvSink, JsonLinesSink, MappingSink};
use portmap_discovery::{
    CommandCatalog, Collector, Connector, PortMapper, ReplayConnector, RunSummary, SshConnector,
    SwitchOutcome,
};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::{Config, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "portmap")]
#[command(about = "Map IP addresses to the switch ports they are connected to")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "portmap.toml")]
    config: PathBuf,

    /// Router holding the ARP table (overrides config)
    #[arg(short, long)]
    router: Option<String>,

    /// Switch to read, may be repeated (replaces configured switches)
    #[arg(short, long = "switch")]
    switches: Vec<String>,

    /// Interface to ignore, may be repeated (added to configured exclusions)
    #[arg(short, long = "exclude")]
    excludes: Vec<String>,

    /// Output file, `-` for stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Append to the output file
    #[arg(long)]
    append: bool,

    /// Read device output from capture files in this directory instead of SSH
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write an example configuration to the config path and exit
    #[arg(long)]
    write_default_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Portmap v{}", env!("CARGO_PKG_VERSION"));

    if args.write_default_config {
        config::save_default_config(&args.config)
            .with_context(|| format!("writing {}", args.config.display()))?;
        info!(path = %args.config.display(), "Wrote example configuration");
        return Ok(());
    }

    let mut config = config::load_config(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    info!(
        router = %config.devices.router,
        switches = config.devices.switches.len(),
        platform = %config.devices.platform,
        "Configuration loaded"
    );

    let summary = match args.replay {
        Some(ref dir) => {
            let connector = ReplayConnector::from_dir(dir)
                .with_context(|| format!("loading captures from {}", dir.display()))?;
            if connector.is_empty() {
                bail!("No device captures found in {}", dir.display());
            }
            execute(connector, &config).await?
        }
        None => execute(SshConnector::new(config.ssh.clone()), &config).await?,
    };

    report(&summary);
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(ref router) = args.router {
        config.devices.router = router.clone();
    }
    if !args.switches.is_empty() {
        config.devices.switches = args.switches.clone();
    }
    config.devices.exclude_interfaces.extend(args.excludes.iter().cloned());
    if let Some(ref output) = args.output {
        config.output.path = output.clone();
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if args.append {
        config.output.append = true;
    }
}

async fn execute<C: Connector>(connector: C, config: &Config) -> Result<RunSummary> {
    let collector = Collector::new(connector, CommandCatalog::new(config.devices.platform))
        .with_concurrency(config.collection.concurrency);
    let mapper = PortMapper::new(collector, config.to_plan());

    let mut sink = open_sink(&config.output.path, config.output.format, config.output.append)?;
    let summary = mapper.run(sink.as_mut()).await?;
    Ok(summary)
}

fn open_sink(path: &Path, format: OutputFormat, append: bool) -> Result<Box<dyn MappingSink>> {
    if path == Path::new("-") {
        let stdout = BufWriter::new(io::stdout());
        let sink: Box<dyn MappingSink> = match format {
            OutputFormat::Csv => Box::new(CsvSink::new(stdout)?),
            OutputFormat::Jsonl => Box::new(JsonLinesSink::new(stdout)),
        };
        return Ok(sink);
    }

    let sink: Box<dyn MappingSink> = match format {
        OutputFormat::Csv => Box::new(CsvSink::create(path, append)?),
        OutputFormat::Jsonl => Box::new(JsonLinesSink::create(path, append)?),
    };
    info!(path = %path.display(), format = ?format, "Writing mappings");
    Ok(sink)
}

fn report(summary: &RunSummary) {
    eprintln!("Run {}", summary.run_id);
    eprintln!(
        "Router {} ({}): {} ARP entries",
        summary.router_name, summary.router_address, summary.resolution_entries
    );
    for switch in &summary.switches {
        match &switch.outcome {
            SwitchOutcome::Mapped {
                name,
                entries,
                mappings,
            } => eprintln!(
                "  - {} ({}): {} MAC entries, {} mapped",
                name, switch.address, entries, mappings
            ),
            SwitchOutcome::Failed { error } => {
                eprintln!("  - {}: FAILED ({})", switch.address, error)
            }
        }
    }
    eprintln!(
        "Wrote {} mappings in {} ms",
        summary.mappings_written,
        (summary.finished_at - summary.started_at).num_milliseconds()
    );
}
