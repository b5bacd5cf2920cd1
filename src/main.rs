//! qconc: query concurrency statistics
//!
//! Usage: qconc [OPTIONS]

use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use query_concurrency::commands::ConcurrencyCommand;
use query_concurrency::config::Config;
use query_concurrency::engine::CancellationToken;
use query_concurrency::error::CommandError;
use query_concurrency::records::{LineSelection, StartPosition};
use query_concurrency::report::OutputFormat;

#[derive(Parser)]
#[command(name = "qconc")]
#[command(version)]
#[command(about = "Concurrency stats for query logs of start|end timestamp pairs", long_about = None)]
struct Cli {
    /// Input file to parse for concurrency stats (use - for stdin)
    #[arg(short = 'f', long, default_value = "csv/output.csv")]
    input_file: PathBuf,

    /// Number of lines to read from the input file
    #[arg(short = 'n', long)]
    num_lines: Option<usize>,

    /// Position in the file to read lines from: beginning, end, random (default: end)
    #[arg(short = 's', long)]
    start_position: Option<String>,

    /// Output format type: text or json (default: config file, then text)
    #[arg(short = 't', long)]
    format_type: Option<String>,

    /// Do not show live progress in console
    #[arg(short = 'x', long)]
    no_preview: bool,

    /// Path to config file (default: ./config.toml)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Seed for random line selection
    #[arg(long)]
    seed: Option<u64>,

    /// Skip start-order validation (faster for pre-sorted input)
    #[arg(long)]
    assume_sorted: bool,

    /// Print scan statistics to stderr
    #[arg(long)]
    stats: bool,
}

/// Exit status after a Ctrl-C that left nothing to report.
const INTERRUPTED_EXIT_CODE: i32 = 130;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        if e.is_interrupted() {
            eprintln!("{}", e);
            process::exit(INTERRUPTED_EXIT_CODE);
        }
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CommandError> {
    let selection = line_selection(cli.num_lines, cli.start_position.as_deref(), cli.seed)?;

    let config = Config::load(cli.config.as_deref())?;
    let cli_format = cli
        .format_type
        .as_deref()
        .map(|s| {
            OutputFormat::from_str(s).ok_or_else(|| {
                CommandError::InvalidArguments(format!(
                    "Invalid format type '{}'. Use: text, json",
                    s
                ))
            })
        })
        .transpose()?;
    let format = config.output_format(cli_format);

    let mut cmd = ConcurrencyCommand::new()
        .with_format(format)
        .with_templates(config.format_strings)
        .with_progress(!cli.no_preview)
        .with_assume_sorted(cli.assume_sorted);
    if let Some(selection) = selection {
        cmd = cmd.with_selection(selection);
    }

    let scan_finished = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(cmd.cancellation(), Arc::clone(&scan_finished))?;

    let result = if cli.input_file.to_string_lossy() == "-" {
        cmd.calculate_stdin()
    } else {
        cmd.calculate(&cli.input_file)
    };
    scan_finished.store(true, Ordering::SeqCst);
    let result = result?;

    if result.is_cancelled() {
        eprintln!(
            "Interrupted: user cancelled the scan after {} of {} records",
            result.scan.records_scanned, result.scan.records_total
        );
    }
    if cli.stats {
        eprintln!("Scan stats: {}", result.scan);
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    cmd.write_report(&result, &mut handle)
}

/// Build the line window from `-n`, `-s` and `--seed`.
fn line_selection(
    num_lines: Option<usize>,
    start_position: Option<&str>,
    seed: Option<u64>,
) -> Result<Option<LineSelection>, CommandError> {
    let num_lines = match num_lines {
        Some(0) => {
            return Err(CommandError::InvalidArguments(
                "Number of lines must be greater than zero.".to_string(),
            ))
        }
        Some(n) => n,
        None => {
            if start_position.is_some() || seed.is_some() {
                return Err(CommandError::InvalidArguments(
                    "Number of lines not specified. Use -n option to specify number of lines to read."
                        .to_string(),
                ));
            }
            return Ok(None);
        }
    };

    let position = match start_position {
        Some(s) => StartPosition::from_str(s).ok_or_else(|| {
            CommandError::InvalidArguments(format!(
                "Invalid start position '{}'. Use: beginning, end, random",
                s
            ))
        })?,
        None => StartPosition::End,
    };

    let mut selection = LineSelection::new(num_lines, position);
    if let Some(seed) = seed {
        if position != StartPosition::Random {
            return Err(CommandError::InvalidArguments(
                "--seed only applies to random line selection. Use -s random.".to_string(),
            ));
        }
        selection = selection.with_seed(seed);
    }
    Ok(Some(selection))
}

/// Route Ctrl-C to the cancellation token.
///
/// The first Ctrl-C cancels reading or scanning. A second one, or any
/// Ctrl-C once the scan has finished, exits right away.
fn install_interrupt_handler(
    token: CancellationToken,
    scan_finished: Arc<AtomicBool>,
) -> Result<(), CommandError> {
    ctrlc::set_handler(move || {
        if token.is_cancelled() || scan_finished.load(Ordering::SeqCst) {
            process::exit(INTERRUPTED_EXIT_CODE);
        }
        token.cancel();
    })?;
    Ok(())
}
