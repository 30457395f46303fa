use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ordbench::config::{DEFAULT_COUNT, DEFAULT_DEGREE};
use ordbench::{BenchConfig, MemoryMode, PhaseGroups};

// Memory figures read jemalloc's allocation counters.
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Benchmark ordered key-value containers against each other.
#[derive(Debug, Parser)]
#[command(name = "ordbench", version, about)]
struct Cli {
    /// Number of distinct keys, and operations per phase.
    #[arg(short = 'n', long, default_value_t = DEFAULT_COUNT)]
    count: usize,

    /// Fanout for tree-shaped candidates.
    #[arg(short, long, default_value_t = DEFAULT_DEGREE)]
    degree: usize,

    /// Seed for dataset and orderings. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Source of the memory column.
    #[arg(long, value_enum, default_value_t = MemoryMode::Jemalloc)]
    memory: MemoryMode,

    /// Only run these candidates (comma separated labels).
    #[arg(short, long, value_delimiter = ',')]
    candidates: Vec<String>,

    /// Sweep these degrees instead of running the phase sequence.
    #[arg(long, value_delimiter = ',')]
    sweep: Vec<usize>,

    #[arg(long)]
    no_seq: bool,
    #[arg(long)]
    no_rand: bool,
    #[arg(long)]
    no_delete: bool,
    #[arg(long)]
    no_hints: bool,
    #[arg(long)]
    no_pivot: bool,
    #[arg(long)]
    no_scan: bool,

    /// List the registered candidates and exit.
    #[arg(long)]
    list: bool,
}

impl From<Cli> for BenchConfig {
    fn from(cli: Cli) -> Self {
        BenchConfig {
            count: cli.count,
            degree: cli.degree,
            seed: cli.seed,
            memory: cli.memory,
            candidates: cli.candidates,
            sweep: cli.sweep,
            groups: PhaseGroups {
                sequential: !cli.no_seq,
                random: !cli.no_rand,
                delete: !cli.no_delete,
                hints: !cli.no_hints,
                pivot: !cli.no_pivot,
                scan: !cli.no_scan,
            },
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.list {
        let registry = ordbench::Registry::standard();
        let mut out = io::stdout().lock();
        for reg in registry.iter() {
            writeln!(out, "{:<12} {:?}", reg.label(), reg.capabilities())?;
        }
        return Ok(());
    }

    let config = BenchConfig::from(cli);
    let g = config.groups;
    if config.sweep.is_empty() && !(g.sequential || g.random || g.pivot || g.scan) {
        bail!("every phase group is switched off");
    }

    let registry = ordbench::select(&config)?;
    let output = ordbench::execute(&config, &registry).context("dataset generation failed")?;

    // Rows measured before a fatal error are still printed.
    let mut out = io::stdout().lock();
    output
        .reporter
        .render(&mut out)
        .context("failed to write report")?;

    if let Some(err) = output.error {
        return Err(err).context(format!("benchmark aborted (seed {})", output.seed));
    }
    Ok(())
}
