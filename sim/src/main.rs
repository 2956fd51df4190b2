//! Puddel simulator: replay a TOML scenario through the exchange core.

use anyhow::Context;
use clap::Parser;
use puddel_protocol::Protocol;
use puddel_sim::{Scenario, Simulation};
use puddel_store_lmdb::LmdbStateStore;
use puddel_utils::{format_amount, format_duration, init_tracing, LogFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "puddel-sim", about = "Puddel vote-escrowed exchange simulator")]
struct Cli {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "PUDDEL_LOG_LEVEL")]
    log_level: String,

    /// Log output: "human" or "json".
    #[arg(long, default_value = "human", env = "PUDDEL_LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Replay a scenario and print the JSON report.
    Run {
        /// Path to the TOML scenario.
        #[arg(long, env = "PUDDEL_SCENARIO")]
        config: PathBuf,

        /// Overrides the scenario's epoch count.
        #[arg(long)]
        epochs: Option<u64>,

        /// Write the report here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Save the final state into this directory.
        #[arg(long, env = "PUDDEL_SNAPSHOT_DIR")]
        snapshot: Option<PathBuf>,
    },
    /// Print the built-in example scenario as TOML.
    Defaults,
    /// Load a saved snapshot and check its conservation rules.
    Inspect {
        /// Directory written by `run --snapshot`.
        snapshot: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format, &cli.log_level).context("installing the log subscriber")?;

    match cli.command {
        Command::Run {
            config,
            epochs,
            output,
            snapshot,
        } => {
            let mut scenario = Scenario::load(&config)
                .with_context(|| format!("loading scenario {}", config.display()))?;
            if let Some(epochs) = epochs {
                scenario.epochs = epochs;
            }
            let (protocol, report) = Simulation::new(scenario)?.run()?;

            if let Some(dir) = snapshot {
                let store = LmdbStateStore::open(&dir)?;
                protocol.save(&store)?;
                tracing::info!(target: "sim", dir = %dir.display(), "snapshot written");
            }

            let json = report.to_json()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
                    tracing::info!(target: "sim", path = %path.display(), "report written");
                }
                None => println!("{json}"),
            }
        }
        Command::Defaults => {
            print!("{}", toml::to_string_pretty(&Scenario::example())?);
        }
        Command::Inspect { snapshot } => {
            let store = LmdbStateStore::open(&snapshot)?;
            let protocol = Protocol::load(&store)
                .with_context(|| format!("loading snapshot {}", snapshot.display()))?;
            let state = protocol.state();
            println!("epoch length:   {}", format_duration(state.params.epoch_length_secs));
            println!("pairs:          {}", state.registry.all_pairs_length());
            println!("gauges:         {}", state.gauges.iter().count());
            println!("total locked:   {}", format_amount(state.escrow.total_locked()));
            println!("total minted:   {}", format_amount(state.minter.total_minted()));
            println!("total burned:   {}", format_amount(state.fees.total_burned()));
            protocol.check_invariants()?;
            println!("invariants:     ok");
        }
    }
    Ok(())
}
