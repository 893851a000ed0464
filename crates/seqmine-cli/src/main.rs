//! seqmine CLI - constraint-based sequential pattern mining from the
//! command line.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use seqmine_cli::input;
use seqmine_core::api::{Attribute, AttributeHandle, Constraint, PatternMiner};

#[derive(Parser)]
#[command(name = "seqmine")]
#[command(version = "0.1.0")]
#[command(about = "Mine frequent sequential patterns under attribute constraints", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v: info, -vv: debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mine maximal patterns from a sequence file
    Mine {
        /// Sequence file: one sequence per line, whitespace-separated items
        #[arg(short, long)]
        sequences: PathBuf,

        /// Attribute matrix, NAME=FILE; repeatable
        #[arg(long = "attr", value_name = "NAME=FILE")]
        attrs: Vec<String>,

        /// Gap constraint, NAME:LO..HI (either bound optional); repeatable
        #[arg(long, value_name = "NAME:LO..HI")]
        gap: Vec<String>,

        /// Span constraint, NAME:LO..HI; repeatable
        #[arg(long, value_name = "NAME:LO..HI")]
        span: Vec<String>,

        /// Average constraint, NAME:LO..HI; repeatable
        #[arg(long, value_name = "NAME:LO..HI")]
        average: Vec<String>,

        /// Median constraint, NAME:LO..HI; repeatable
        #[arg(long, value_name = "NAME:LO..HI")]
        median: Vec<String>,

        /// Minimum frequency: a row count (2) or a fraction (0.3)
        #[arg(short, long, default_value = "2")]
        min_frequency: String,

        /// Emit a JSON array instead of text rows
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).context("installing log subscriber")?;

    match cli.command {
        Commands::Mine {
            sequences,
            attrs,
            gap,
            span,
            average,
            median,
            min_frequency,
            json,
        } => run_mine(sequences, attrs, gap, span, average, median, min_frequency, json),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_mine(
    sequences: PathBuf,
    attrs: Vec<String>,
    gap: Vec<String>,
    span: Vec<String>,
    average: Vec<String>,
    median: Vec<String>,
    min_frequency: String,
    json: bool,
) -> Result<()> {
    let rows = input::read_sequences(&sequences)?;
    info!(sequences = rows.len(), "loaded sequence database");
    let mut miner = PatternMiner::new(rows).context("building the sequence database")?;

    let mut handles: HashMap<String, AttributeHandle> = HashMap::new();
    for arg in &attrs {
        let (name, file) = input::parse_attr_arg(arg)?;
        let values = input::read_attribute(&PathBuf::from(file))?;
        let handle = miner
            .add_attribute(Attribute::new(values).context("building attribute")?)
            .with_context(|| format!("attribute {name:?} does not match the sequences"))?;
        handles.insert(name.to_string(), handle);
    }

    let families: [(&[String], fn(AttributeHandle) -> Constraint); 4] = [
        (&gap, AttributeHandle::gap),
        (&span, AttributeHandle::span),
        (&average, AttributeHandle::average),
        (&median, AttributeHandle::median),
    ];
    for (specs, family) in families {
        for spec in specs {
            let (name, lower, upper) = input::parse_bounds(spec)?;
            let Some(&handle) = handles.get(name) else {
                bail!("constraint {spec:?} references unknown attribute {name:?}");
            };
            let mut constraint = family(handle);
            if let Some(bound) = lower {
                constraint = constraint.ge(bound);
            }
            if let Some(bound) = upper {
                constraint = constraint.le(bound);
            }
            miner.add_constraint(constraint)?;
        }
    }

    let threshold = input::parse_min_frequency(&min_frequency)?;
    let patterns = miner.mine(threshold)?;
    info!(patterns = patterns.len(), "mining finished");

    if json {
        println!("{}", serde_json::to_string_pretty(&patterns)?);
    } else {
        for pattern in &patterns {
            println!("{} -> {}", pattern.items.join(" "), pattern.frequency);
        }
    }
    Ok(())
}
