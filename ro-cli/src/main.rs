//! `ro`: leg-odds calculator.
//!
//! Usage:
//!   ro calc --scenario board.yaml [--config cfg.yaml] [--json] [--top N] [--records out.ndjson]
//!   ro sample --scenario board.yaml --trials 100000 --seed 7 [--json]
//!   ro count --remaining 5
//!   ro resolve --scenario board.yaml --racer red --die 2

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use ro_core::{
    apply, combination_count, finish_order, ordinal, records, CalcRequest, Calculator, Config,
    Coverage, Move, ProbabilityTable, Racer, Scenario,
};
use ro_logging::{hash_bytes, CalcEventV1, CombinationEventV1, NdjsonWriter};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "ro", author, version, about = "Leg-odds calculator for stacked dice races")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enumerate every remaining roll and print the finish probabilities.
    Calc(CalcArgs),
    /// Estimate the finish probabilities from seeded random trials.
    Sample(SampleArgs),
    /// Print how many combinations K remaining racers produce.
    Count(CountArgs),
    /// Apply a single move and print the resulting board.
    Resolve(ResolveArgs),
}

#[derive(Args, Debug)]
struct ScenarioArgs {
    /// Scenario file (YAML, or JSON with a `.json` extension).
    #[arg(long)]
    scenario: PathBuf,

    /// Optional YAML config; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CalcArgs {
    #[command(flatten)]
    input: ScenarioArgs,

    /// Print the table as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Number of finish orders to list.
    #[arg(long, default_value = "5")]
    top: usize,

    /// Write one NDJSON line per combination to this file.
    #[arg(long)]
    records: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SampleArgs {
    #[command(flatten)]
    input: ScenarioArgs,

    #[arg(long, default_value = "100000")]
    trials: u64,

    #[arg(long, default_value = "0")]
    seed: u64,

    #[arg(long)]
    json: bool,

    #[arg(long, default_value = "5")]
    top: usize,
}

#[derive(Args, Debug)]
struct CountArgs {
    #[arg(long)]
    remaining: u32,
}

#[derive(Args, Debug)]
struct ResolveArgs {
    #[command(flatten)]
    input: ScenarioArgs,

    #[arg(long)]
    racer: Racer,

    #[arg(long)]
    die: u8,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Calc(args) => cmd_calc(args),
        Command::Sample(args) => cmd_sample(args),
        Command::Count(args) => cmd_count(args),
        Command::Resolve(args) => cmd_resolve(args),
    }
}

struct Loaded {
    config: Config,
    scenario_hash: String,
    request: CalcRequest,
}

fn load(input: &ScenarioArgs) -> Result<Loaded> {
    let config = match &input.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    // A second subscriber (e.g. under a test harness) is not fatal.
    if let Err(e) = ro_logging::init_tracing(&config.logging.level) {
        eprintln!("warning: {e}");
    }

    let bytes = std::fs::read(&input.scenario)
        .with_context(|| format!("failed to read scenario {}", input.scenario.display()))?;
    let scenario = Scenario::load(&input.scenario)
        .with_context(|| format!("failed to parse scenario {}", input.scenario.display()))?;
    let request = scenario
        .request(config.rules.track_len)
        .context("invalid board")?;
    debug!(
        racers = request.board.racer_count(),
        remaining = request.remaining.len(),
        "scenario loaded"
    );
    Ok(Loaded {
        config,
        scenario_hash: hash_bytes(&bytes),
        request,
    })
}

fn cmd_calc(args: CalcArgs) -> Result<()> {
    let loaded = load(&args.input)?;
    let calc = Calculator::new(loaded.config.clone());

    let start = Instant::now();
    let table = calc.calculate(&loaded.request)?;
    let elapsed_ms = start.elapsed().as_millis() as u64;
    info!(combinations = table.combinations, elapsed_ms, "calculation finished");

    write_calc_event(&loaded, &table, elapsed_ms)?;

    let records_path = args
        .records
        .clone()
        .or_else(|| loaded.config.logging.records_path.as_ref().map(PathBuf::from));
    if let Some(path) = records_path {
        // Records always cover the full enumeration, independent of sampling.
        let enumerator = calc.validate(&loaded.request)?;
        let mut w = NdjsonWriter::create(&path)
            .with_context(|| format!("failed to create records file {}", path.display()))?;
        for record in records(&loaded.request.board, &enumerator) {
            w.write_event(&CombinationEventV1::new(&record?))?;
        }
        w.flush()?;
        info!(path = %path.display(), count = enumerator.total(), "records written");
    }

    print_table(&table, args.json, args.top)
}

fn cmd_sample(args: SampleArgs) -> Result<()> {
    let loaded = load(&args.input)?;
    let calc = Calculator::new(loaded.config.clone());

    let start = Instant::now();
    let table = calc.sample_with(&loaded.request, args.trials, args.seed)?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    write_calc_event(&loaded, &table, elapsed_ms)?;
    print_table(&table, args.json, args.top)
}

fn cmd_count(args: CountArgs) -> Result<()> {
    let k = args.remaining;
    let total = combination_count(k as usize)
        .ok_or_else(|| anyhow!("{k}!·3^{k} does not fit in 64 bits"))?;
    println!("{total}");
    Ok(())
}

fn cmd_resolve(args: ResolveArgs) -> Result<()> {
    let loaded = load(&args.input)?;
    let board = &loaded.request.board;
    let next = apply(board, Move::new(args.racer, args.die))?;
    print!("{next}");
    println!("order: {}", finish_order(&next));
    Ok(())
}

fn write_calc_event(loaded: &Loaded, table: &ProbabilityTable, elapsed_ms: u64) -> Result<()> {
    let Some(path) = loaded.config.logging.events_path.as_deref() else {
        return Ok(());
    };
    let mut w = NdjsonWriter::open_append(Path::new(path))
        .with_context(|| format!("failed to open events file {path}"))?;
    w.write_event(&CalcEventV1::from_table(
        table,
        Some(loaded.scenario_hash.clone()),
        elapsed_ms,
    ))?;
    w.flush()?;
    Ok(())
}

fn coverage_line(table: &ProbabilityTable) -> String {
    match table.coverage {
        Coverage::Exact => format!("exact ({} combinations)", table.combinations),
        Coverage::Partial { processed, total } => {
            format!("PARTIAL ({processed} of {total} combinations, time budget exhausted)")
        }
        Coverage::Sampled { trials, seed } => format!("sampled ({trials} trials, seed {seed})"),
    }
}

fn print_table(table: &ProbabilityTable, json: bool, top: usize) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(table)?);
        return Ok(());
    }

    println!("coverage: {}", coverage_line(table));

    let ranks = table.ranks.len();
    let mut header = format!("{:<8}", "racer");
    for rank in 1..=ranks {
        header.push_str(&format!("{:>9}", ordinal(rank)));
    }
    println!("{header}");
    for row in &table.ranks {
        let mut line = format!("{:<8}", row.racer.name());
        for p in &row.percent {
            line.push_str(&format!("{:>8.2}%", p));
        }
        println!("{line}");
    }

    if !table.orders.is_empty() {
        println!();
        println!("most likely finish orders:");
        for (i, o) in table.orders.iter().take(top).enumerate() {
            println!("{:>3}. {:<40} {:>7.2}% ({})", i + 1, o.order.to_string(), o.percent, o.count);
        }
    }
    Ok(())
}
