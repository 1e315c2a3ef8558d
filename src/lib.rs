//! dupsample - downsample a UMI-grouped BAM by duplicate set
//!
//! Reads sharing a molecule (MI tag without its `/A` or `/B` strand suffix) are
//! kept or dropped together. A set can be filtered out for being duplex, and the
//! remaining sets are sampled with one draw each from a seeded sequence, so a
//! given seed always yields the same output for the same input.
//!
//! # Example
//!
//! ```ignore
//! use dupsample::{Args, run_downsample};
//!
//! let args = Args {
//!     input: "grouped.bam".to_string(),
//!     output: "downsampled.bam".to_string(),
//!     downsampling_rate: 0.5,
//!     keep_only_simplex: true,
//!     seed: 142,
//! };
//!
//! let counters = run_downsample(&args, "dupsample -i grouped.bam -o downsampled.bam --ds 0.5")?;
//! ```

pub mod algorithm;
pub mod args;
pub mod duplicate_set;
pub mod error;
pub mod header;
pub mod io;
pub mod utils;

use anyhow::{Context, Result};
use log::{info, warn};
use noodles::bam;
use std::fs;
use std::io::Read;

// Re-export commonly used items
pub use algorithm::{
    Decision, RandomSequence, ReadSink, RetentionEngine, RetentionPolicy, RunCounters,
    Strandedness, classify, seeded_sequence,
};
pub use args::Args;
pub use duplicate_set::{DuplicateSet, DuplicateSets, MolecularTagged};
pub use error::DownsampleError;
pub use io::{BamSink, MI_TAG};

/// Stream the input BAM through the retention engine into the output BAM
///
/// `command_line` is recorded in the output's @PG entry. Returns the run's
/// counters once the output has been finalized. Any invalid duplicate set or
/// write failure aborts the run and removes the partial output.
pub fn run_downsample(args: &Args, command_line: &str) -> Result<RunCounters> {
    let mut engine = RetentionEngine::new(args.retention_policy()?);

    info!("Input: {}", args.input);
    info!("Output: {}", args.output);
    info!("Downsampling rate: {}", engine.policy().sampling_rate());
    info!("Keep only simplex: {}", engine.policy().simplex_only());
    info!("Random seed: {}", args.seed);

    let mut reader = bam::io::reader::Builder::default()
        .build_from_path(&args.input)
        .with_context(|| format!("failed to open input BAM {}", args.input))?;
    let header = reader
        .read_header()
        .with_context(|| format!("failed to read header of {}", args.input))?;
    let header = header::add_program_record(header, command_line)?;

    let sink = BamSink::create(&args.output, header)?;
    if let Err(e) = downsample_into(&mut reader, sink, &mut engine, args.seed) {
        // The BGZF writer appends an EOF block on drop; don't leave a valid-looking BAM.
        if let Err(rm) = fs::remove_file(&args.output) {
            warn!("could not remove partial output {}: {rm}", args.output);
        }
        return Err(e)
            .with_context(|| format!("failed to downsample {} into {}", args.input, args.output));
    }

    Ok(engine.into_counters())
}

fn downsample_into<R: Read>(
    reader: &mut bam::io::Reader<R>,
    mut sink: BamSink,
    engine: &mut RetentionEngine,
    seed: u64,
) -> std::result::Result<(), DownsampleError> {
    let mut rng = seeded_sequence(seed);
    for set in DuplicateSets::new(reader.records()) {
        engine.decide(&set?, &mut rng, &mut sink)?;
    }
    sink.finish()
}
