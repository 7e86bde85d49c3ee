use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use takeout_organizer_core::{CancellationToken, ProcessControl, ProcessOptions, TransferMode};

#[derive(Parser)]
#[command(
    name = "takeout-organizer",
    version,
    about = "Sort a Google Photos Takeout export into YEAR/MONTH folders"
)]
struct Cli {
    /// Extracted Takeout directory
    source: PathBuf,

    /// Library root (created if missing)
    destination: PathBuf,

    /// Copy files, or move them out of the source
    #[arg(short, long, value_enum, default_value_t = TransferMode::Copy)]
    mode: TransferMode,

    /// Number of parallel transfers
    #[arg(short = 'j', long, default_value_t = 1)]
    workers: usize,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    let t_total = std::time::Instant::now();

    let token = CancellationToken::new();
    {
        let token = token.clone();
        ctrlc::set_handler(move || {
            eprintln!("\nStopping after the current file...");
            token.cancel();
        })?;
    }

    let options = ProcessOptions {
        source: cli.source,
        destination: cli.destination,
        mode: cli.mode,
        workers: cli.workers.max(1),
    };
    let control = ProcessControl::new().with_cancel_token(token);

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {prefix:>8} [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let result = takeout_organizer_core::process_with_control(&options, &control, &|stage, current, total, message| {
        bar.set_prefix(stage.to_string());
        bar.set_length(total);
        bar.set_position(current);
        bar.set_message(message.to_string());
    });
    bar.finish_and_clear();
    let result = result?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("JSON matches: {}", result.json_match);
        println!("Fallbacks:    {}", result.fallback);
        println!("Errors:       {}", result.errors);
    }

    eprintln!(
        "{} ({}): {} media files, {} sidecars indexed, {} skipped ({:.2}s)",
        if result.cancelled { "Cancelled" } else { "Done" },
        options.mode.as_str(),
        result.total_media,
        result.sidecars_indexed,
        result.sidecars_skipped.total(),
        t_total.elapsed().as_secs_f64()
    );

    Ok(())
}
