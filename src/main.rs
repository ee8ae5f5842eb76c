//! Command-line driver: select and categorize a file of events

use clap::Parser;
use eyre::WrapErr;
use hhww_select::{
    config::Configuration, evgen::EventGenerator, output, run_selection, Channel, EventTable,
};
use std::{path::PathBuf, time::Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Select and categorize HH → WWγγ events
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML configuration file (built-in defaults if absent)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file of event records
    #[arg(long, conflicts_with = "generate")]
    events: Option<PathBuf>,

    /// Generate this many toy events instead of reading a file
    #[arg(long, default_value_t = 10_000)]
    generate: usize,

    /// Seed of the toy event generator
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Analysis channel
    #[arg(long, default_value_t = Channel::Semileptonic)]
    channel: Channel,

    /// Directory where reports are written
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

/// This will act as our main function, with suitable error handling
fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    // ### CONFIGURATION READOUT ###

    let cfg = match &args.config {
        Some(path) => Configuration::load(path)
            .wrap_err_with(|| format!("Failed to load the configuration {}", path.display()))?,
        None => Configuration::default(),
    };
    let tagger = args
        .channel
        .tagger(&cfg)
        .wrap_err("Failed to set up the channel")?;

    // ### EVENT INPUT ###

    let events = match &args.events {
        Some(path) => EventTable::from_json_file(path).wrap_err("Failed to load the events")?,
        None => {
            let with_truth = !cfg.is_data;
            info!(num_events = args.generate, seed = args.seed, "Generating toy events");
            let records = EventGenerator::new(args.seed)
                .with_truth(with_truth)
                .generate(args.generate);
            EventTable::from_records(&records)
        }
    };

    // ### SELECTION ###

    // The clock starts after input I/O, to avoid IO-induced timing fluctuations
    let saved_time = Instant::now();
    let result = run_selection(tagger.as_ref(), events, cfg.chunk_size)
        .wrap_err_with(|| format!("Failed to run the {} selection", args.channel))?;
    let elapsed_time = saved_time.elapsed();

    // ### RESULTS DISPLAY AND STORAGE ###

    output::dump_results(&args.output_dir, args.channel, &result, elapsed_time)
        .wrap_err("Failed to output the results")?;

    // ...and we're done
    Ok(())
}
