//! Progress reporting and summary output for the CLI

use std::path::Path;

use cpfdedup_core::pipeline::ProcessingStats;
use cpfdedup_core::TableStats;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress reporter with a main bar and a stats line
pub struct ProgressReporter {
    _multi: MultiProgress,
    main_bar: ProgressBar,
    stats_bar: ProgressBar,
    mode: ProgressMode,
}

/// Progress tracking mode
enum ProgressMode {
    /// Track progress by bytes processed
    Bytes,
    /// Track progress by records processed
    Records,
}

impl ProgressReporter {
    /// Create a new progress reporter tracking bytes
    pub fn new(total_bytes: u64) -> Self {
        Self::build(
            total_bytes,
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}",
            ProgressMode::Bytes,
        )
    }

    /// Create a new progress reporter tracking records
    pub fn new_record_based(total_records: u64) -> Self {
        Self::build(
            total_records,
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {human_pos}/{human_len} ({per_sec}) {msg}",
            ProgressMode::Records,
        )
    }

    fn build(total: u64, template: &str, mode: ProgressMode) -> Self {
        let multi = MultiProgress::new();

        let main_bar = multi.add(ProgressBar::new(total));
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            main_bar.set_style(style.progress_chars("█▓▒░-"));
        }

        // Stats bar for duplicate counts
        let stats_bar = multi.add(ProgressBar::new(0));
        if let Ok(style) = ProgressStyle::default_bar().template("Stats: {msg}") {
            stats_bar.set_style(style);
        }

        Self {
            _multi: multi,
            main_bar,
            stats_bar,
            mode,
        }
    }

    /// Update progress with current counters
    pub fn update(&self, bytes: u64, total: usize, duplicates: usize, malformed: usize) {
        match self.mode {
            ProgressMode::Bytes => self.main_bar.set_position(bytes),
            ProgressMode::Records => self.main_bar.set_position(total as u64),
        }

        self.main_bar.set_message("Processing...");

        let mut stats_msg = format!("{} total", Self::format_number(total));
        if duplicates > 0 {
            stats_msg.push_str(&format!(
                " | {} duplicates ({:.1}%)",
                Self::format_number(duplicates),
                percent(duplicates, total)
            ));
        }
        if malformed > 0 {
            stats_msg.push_str(&format!(" | {} malformed", Self::format_number(malformed)));
        }

        self.stats_bar.set_message(stats_msg);
    }

    /// Finish progress reporting
    pub fn finish(&self) {
        self.main_bar.finish_with_message("Complete!");
        self.stats_bar.finish();
    }

    /// Format large numbers with K/M suffixes
    fn format_number(n: usize) -> String {
        if n >= 1_000_000 {
            format!("{:.1}M", n as f64 / 1_000_000.0)
        } else if n >= 1_000 {
            format!("{:.1}K", n as f64 / 1_000.0)
        } else {
            n.to_string()
        }
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Print a formatted summary report
pub fn print_summary_report(input: Option<&Path>, output: Option<&Path>, stats: &ProcessingStats) {
    println!("\n{}", "═".repeat(60));
    println!("Deduplication Complete");
    println!("{}", "═".repeat(60));

    match input {
        Some(path) => println!("Input:              {}", path.display()),
        None => println!("Input:              (synthetic dataset)"),
    }
    match output {
        Some(path) => println!("Output:             {}", path.display()),
        None => println!("Output:             (dry run - no output written)"),
    }

    let total = stats.total_records;
    println!("Total records:      {}", format_with_commas(total));
    println!(
        "Unique records:     {} ({:.1}%)",
        format_with_commas(stats.unique_records),
        percent(stats.unique_records, total)
    );
    println!(
        "Duplicates removed: {} ({:.1}%)",
        format_with_commas(stats.duplicates_removed),
        stats.dedup_rate()
    );
    if stats.malformed_records > 0 {
        println!(
            "Malformed keys:     {} ({:.1}%)",
            format_with_commas(stats.malformed_records),
            percent(stats.malformed_records, total)
        );
    }

    print_table_stats(&stats.table);
    println!("{}", "═".repeat(60));
}

/// Print the hash table diagnostics block
pub fn print_table_stats(table: &TableStats) {
    println!("Table size:         {}", format_with_commas(table.size));
    println!("Stored records:     {}", format_with_commas(table.count));
    println!("Collisions:         {}", format_with_commas(table.collisions));
    println!("Load factor:        {:.2}", table.load_factor);
    println!("Mean per bucket:    {:.2}", table.mean_per_bucket);
    println!("Longest chain:      {}", table.max_bucket_len);
    println!("Resizes:            {}", table.resizes);
}

/// Format number with thousand separators
pub fn format_with_commas(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
