//! cpfdedup CLI
//!
//! Deduplicates customer datasets keyed by CPF using a separate-chaining hash table

mod config;
mod progress;
mod session;
mod shell;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use cpfdedup_core::dataset::{create_dataset, DatasetConfig};
use cpfdedup_core::pipeline::{Deduplicator, ProcessingStats};
use cpfdedup_core::Customer;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::AppConfig;
use progress::ProgressReporter;
use session::Session;

#[derive(Parser)]
#[command(name = "cpfdedup")]
#[command(version, about = "Deduplicate customer records by CPF", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output reports in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Config file (YAML or TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

/// Dataset synthesis options shared by several subcommands
#[derive(clap::Args, Debug)]
struct DatasetArgs {
    /// Number of records to generate
    #[arg(short = 'n', long)]
    records: Option<usize>,

    /// Share of duplicate records, 0.0 to 0.99
    #[arg(short, long)]
    duplicates: Option<f64>,

    /// Seed for reproducible datasets
    #[arg(long)]
    seed: Option<u64>,
}

impl DatasetArgs {
    fn apply(&self, mut config: DatasetConfig) -> Result<DatasetConfig> {
        if let Some(records) = self.records {
            config.records = records;
        }
        if let Some(ratio) = self.duplicates {
            config.duplicate_ratio = ratio;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic dataset, deduplicate it and export the unique records
    Run {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Output file (.csv or .jsonl)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Initial hash table capacity
        #[arg(long)]
        capacity: Option<usize>,

        /// Show statistics without writing output
        #[arg(long)]
        dry_run: bool,
    },

    /// Deduplicate an existing dataset file
    Dedup {
        /// Input file (.csv, .jsonl or .jsonl.gz)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (.csv or .jsonl)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Initial hash table capacity
        #[arg(long)]
        capacity: Option<usize>,

        /// Show statistics without writing output
        #[arg(long)]
        dry_run: bool,
    },

    /// Write a synthetic dataset, duplicates included
    Generate {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Output file (.csv or .jsonl)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Look up a customer by CPF in a dataset file
    Lookup {
        /// Dataset file
        #[arg(short, long)]
        input: PathBuf,

        /// CPF, formatted or plain
        cpf: String,
    },

    /// Remove a customer by CPF and rewrite the file without duplicates
    Remove {
        /// Dataset file (.csv, .jsonl or .jsonl.gz), rewritten in place only when the CPF is found
        #[arg(short, long)]
        input: PathBuf,

        /// CPF, formatted or plain
        cpf: String,
    },

    /// Show random unique customers from a dataset file
    Sample {
        /// Dataset file
        #[arg(short, long)]
        input: PathBuf,

        /// Number of customers to show
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,

        /// Seed for the random pick
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show hash table statistics for a dataset file
    Stats {
        /// Dataset file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Launch the interactive shell
    Shell {
        /// Export file kept in sync with the shell session
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_ansi(!cli.json) // Disable colors if JSON output
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let app_config = AppConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            dataset,
            output,
            capacity,
            dry_run,
        } => {
            let dataset = dataset.apply(app_config.dataset.clone())?;
            let output = output.unwrap_or_else(|| app_config.output.path.clone());
            let capacity = capacity.unwrap_or(app_config.table.initial_capacity);
            run(&dataset, output, capacity, dry_run, cli.json)?;
        }
        Commands::Dedup {
            input,
            output,
            capacity,
            dry_run,
        } => {
            let output = output.unwrap_or_else(|| app_config.output.path.clone());
            let capacity = capacity.unwrap_or(app_config.table.initial_capacity);
            dedup_file(&input, &output, capacity, dry_run, cli.json)?;
        }
        Commands::Generate { dataset, output } => {
            let dataset = dataset.apply(app_config.dataset.clone())?;
            generate_dataset(&dataset, &output)?;
        }
        Commands::Lookup { input, cpf } => {
            let mut session = Session::new(None, app_config.table.initial_capacity);
            session.load(&input)?;
            match session.lookup(&cpf)? {
                Some(customer) => print_customer(customer, cli.json)?,
                None => println!("No customer with CPF {}", cpf),
            }
        }
        Commands::Remove { input, cpf } => {
            let mut session = Session::new(None, app_config.table.initial_capacity);
            session.load(&input)?;
            session.set_export_path(Some(input.clone()));
            match session.remove(&cpf)? {
                Some(customer) => println!("Removed {} and rewrote {}", customer.cpf, input.display()),
                None => println!("No customer with CPF {}", cpf),
            }
        }
        Commands::Sample { input, count, seed } => {
            let mut session = Session::new(None, app_config.table.initial_capacity);
            session.load(&input)?;
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            for (i, customer) in session.sample(count, &mut rng)?.iter().enumerate() {
                println!(
                    "{}. {} | {} | {} | {}",
                    i + 1,
                    customer.cpf,
                    customer.name,
                    customer.age,
                    customer.city
                );
            }
        }
        Commands::Stats { input } => {
            let mut session = Session::new(None, app_config.table.initial_capacity);
            let stats = session.load(&input)?;
            print_report(Some(&input), None, &stats, cli.json)?;
        }
        Commands::Shell { output } => {
            let output = output.or_else(|| Some(app_config.output.path.clone()));
            let mut session = Session::new(output, app_config.table.initial_capacity);
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            let mut rng = StdRng::from_entropy();
            shell::run_shell(&mut session, &app_config.dataset, stdin.lock(), &mut stdout, &mut rng)?;
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
    }

    Ok(())
}

fn run(dataset: &DatasetConfig, output: PathBuf, capacity: usize, dry_run: bool, json_output: bool) -> Result<()> {
    info!("Generating and deduplicating dataset");
    info!("  Records: {}", dataset.records);
    info!("  Duplicate ratio: {}", dataset.duplicate_ratio);
    info!("  Capacity: {}", capacity);
    if !dry_run {
        info!("  Output: {:?}", output);
    }

    let export = if dry_run { None } else { Some(output) };
    let mut session = Session::new(export, capacity);
    let stats = session.generate_and_process(dataset)?;

    print_report(None, session.export_path(), &stats, json_output)
}

fn dedup_file(input: &Path, output: &Path, capacity: usize, dry_run: bool, json_output: bool) -> Result<()> {
    info!("Starting deduplication");
    info!("  Input: {:?}", input);
    if !dry_run {
        info!("  Output: {:?}", output);
    }
    info!("  Capacity: {}", capacity);

    let mut reader = cpfdedup_formats::open_dataset(input)
        .with_context(|| format!("Failed to open dataset: {}", input.display()))?;

    let progress = ProgressReporter::new(reader.total_bytes().unwrap_or(0));
    let mut dedup = Deduplicator::<Customer>::with_capacity(capacity);

    while let Some(result) = reader.next() {
        dedup.push(result?);

        if dedup.total() % 1000 == 0 {
            progress.update(reader.bytes_processed(), dedup.total(), dedup.duplicates(), dedup.malformed());
        }
    }

    progress.update(reader.bytes_processed(), dedup.total(), dedup.duplicates(), dedup.malformed());
    progress.finish();

    let outcome = dedup.finish();

    if !dry_run {
        cpfdedup_formats::write_records(output, outcome.unique_records())
            .with_context(|| format!("Failed to write output: {}", output.display()))?;
    }

    print_report(
        Some(input),
        if dry_run { None } else { Some(output) },
        &outcome.stats,
        json_output,
    )
}

fn generate_dataset(config: &DatasetConfig, output: &Path) -> Result<()> {
    info!("Generating dataset: {:?}", output);

    let records = create_dataset(config)?;
    let progress = ProgressReporter::new_record_based(records.len() as u64);

    let mut writer = cpfdedup_formats::create_writer(output)
        .with_context(|| format!("Failed to create output: {}", output.display()))?;
    for (i, record) in records.iter().enumerate() {
        writer.write_record(record)?;
        if (i + 1) % 1000 == 0 {
            progress.update(0, i + 1, 0, 0);
        }
    }
    writer.finish()?;
    progress.update(0, records.len(), 0, 0);
    progress.finish();

    println!(
        "Wrote {} records ({} unique) to {}",
        writer.rows_written(),
        config.unique_target(),
        output.display()
    );
    Ok(())
}

fn print_report(input: Option<&Path>, output: Option<&Path>, stats: &ProcessingStats, json_output: bool) -> Result<()> {
    if json_output {
        let report = serde_json::json!({
            "input": input.map(|p| p.to_string_lossy().to_string()),
            "output": output.map(|p| p.to_string_lossy().to_string()),
            "total_records": stats.total_records,
            "unique_records": stats.unique_records,
            "duplicates_removed": stats.duplicates_removed,
            "malformed_records": stats.malformed_records,
            "deduplication_rate": stats.dedup_rate(),
            "table": stats.table,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        progress::print_summary_report(input, output, stats);
    }
    Ok(())
}

fn print_customer(customer: &Customer, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(customer)?);
    } else {
        println!("CPF:  {}", customer.cpf);
        println!("Name: {}", customer.name);
        println!("Age:  {}", customer.age);
        println!("City: {}", customer.city);
    }
    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
}
