use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;
use std::time::Instant;

use dupsample::utils::{format_elapsed, format_percent};
use dupsample::{Args, run_downsample};

#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let command_line = std::env::args().collect::<Vec<_>>().join(" ");

    let total_start = Instant::now();
    let counters = run_downsample(&args, &command_line)?;

    info!("Wrote {} reads", counters.reads_written);
    info!("Wrote {} duplicate sets", counters.sets_written);
    info!(
        "  (examined={}, duplex_filtered={}, sampled_out={}, kept={})",
        counters.sets_examined,
        counters.duplex_sets_filtered,
        counters.sets_sampled_out,
        format_percent(counters.sets_written, counters.sets_examined)
    );

    info!("done in {}", format_elapsed(total_start.elapsed()));

    Ok(())
}
