//! Interactive line-oriented shell over a [`Session`]
//!
//! Errors from individual commands are printed and the shell keeps running;
//! only I/O failures on the terminal itself end it.

use crate::session::{Session, SessionError};
use anyhow::Result;
use cpfdedup_core::dataset::DatasetConfig;
use cpfdedup_core::Customer;
use rand::Rng;
use std::io::{BufRead, Write};
use std::path::Path;

const HELP: &str = "\
Commands:
  run [records] [duplicate_ratio]   generate, deduplicate and export a dataset
  load <file>                       deduplicate an existing .csv/.jsonl file
  lookup <cpf>                      find a customer by CPF
  remove <cpf>                      remove a customer and rewrite the export
  sample [n]                        show n random unique customers (default 10)
  stats                             show hash table statistics
  help                              show this message
  quit                              leave the shell";

/// Run the shell until `quit` or end of input
pub fn run_shell<I, O, G>(session: &mut Session, defaults: &DatasetConfig, input: I, out: &mut O, rng: &mut G) -> Result<()>
where
    I: BufRead,
    O: Write,
    G: Rng,
{
    writeln!(out, "cpfdedup shell - type 'help' for commands")?;
    prompt(out)?;

    for line in input.lines() {
        let line = line?;
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            prompt(out)?;
            continue;
        };
        let args: Vec<&str> = words.collect();

        match command {
            "quit" | "exit" => break,
            "help" => writeln!(out, "{}", HELP)?,
            "run" => match parse_run_args(&args, defaults) {
                Ok(config) => report(out, session.generate_and_process(&config).map(|stats| {
                    format!(
                        "{} records, {} unique, {} duplicates removed, {} collisions, load factor {:.2}",
                        stats.total_records,
                        stats.unique_records,
                        stats.duplicates_removed,
                        stats.table.collisions,
                        stats.table.load_factor
                    )
                }))?,
                Err(msg) => writeln!(out, "error: {}", msg)?,
            },
            "load" => match args.first() {
                Some(path) => report(out, session.load(Path::new(path)).map(|stats| {
                    format!(
                        "{} records, {} unique, {} duplicates removed",
                        stats.total_records, stats.unique_records, stats.duplicates_removed
                    )
                }))?,
                None => writeln!(out, "usage: load <file>")?,
            },
            "lookup" => match args.first() {
                Some(cpf) => {
                    let result = session.lookup(cpf).map(|found| match found {
                        Some(customer) => describe(customer),
                        None => "no customer with that CPF".to_string(),
                    });
                    report(out, result)?
                }
                None => writeln!(out, "usage: lookup <cpf>")?,
            },
            "remove" => match args.first() {
                Some(cpf) => {
                    let result = session.remove(cpf).map(|removed| match removed {
                        Some(customer) => format!("removed {}", customer.cpf),
                        None => "no customer with that CPF".to_string(),
                    });
                    report(out, result)?
                }
                None => writeln!(out, "usage: remove <cpf>")?,
            },
            "sample" => {
                let n = args.first().and_then(|s| s.parse().ok()).unwrap_or(10);
                let result = session.sample(n, rng).map(|sample| {
                    sample
                        .iter()
                        .enumerate()
                        .map(|(i, c)| format!("{}. {} | {} | {} | {}", i + 1, c.cpf, c.name, c.age, c.city))
                        .collect::<Vec<_>>()
                        .join("\n")
                });
                report(out, result)?
            }
            "stats" => report(out, session.table_stats().map(|s| {
                format!(
                    "size {} | records {} | collisions {} | load factor {:.2} | mean per bucket {:.2}",
                    s.size, s.count, s.collisions, s.load_factor, s.mean_per_bucket
                )
            }))?,
            other => writeln!(out, "unknown command '{}', try 'help'", other)?,
        }

        prompt(out)?;
    }

    Ok(())
}

fn prompt<O: Write>(out: &mut O) -> Result<()> {
    write!(out, "> ")?;
    out.flush()?;
    Ok(())
}

fn report<O: Write>(out: &mut O, result: Result<String, SessionError>) -> Result<()> {
    match result {
        Ok(msg) => writeln!(out, "{}", msg)?,
        Err(e) => writeln!(out, "error: {}", e)?,
    }
    Ok(())
}

fn describe(customer: &Customer) -> String {
    format!(
        "CPF: {}\nName: {}\nAge: {}\nCity: {}",
        customer.cpf, customer.name, customer.age, customer.city
    )
}

fn parse_run_args(args: &[&str], defaults: &DatasetConfig) -> Result<DatasetConfig, String> {
    let mut config = defaults.clone();
    if let Some(records) = args.first() {
        config.records = records
            .parse()
            .map_err(|_| format!("invalid record count '{}'", records))?;
    }
    if let Some(ratio) = args.get(1) {
        config.duplicate_ratio = ratio
            .parse()
            .map_err(|_| format!("invalid duplicate ratio '{}'", ratio))?;
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}
