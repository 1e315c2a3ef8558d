//! Duplicate-set classification and the retention decision
//!
//! A set is first classified as simplex or duplex from its distinct MI values,
//! then optionally filtered by class, then sampled with a single draw from the
//! run's random sequence.

use bstr::BString;
use log::debug;
use std::collections::BTreeSet;
use std::io;

use crate::duplicate_set::{DuplicateSet, MolecularTagged, required_molecular_id};
use crate::error::DownsampleError;

/// Seed used when none is given on the command line
pub const DEFAULT_SEED: u64 = 142;

/// Number of strands observed for a duplicate set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strandedness {
    Simplex,
    Duplex,
}

/// Source of uniform draws in [0, 1)
pub trait RandomSequence {
    fn next_unit(&mut self) -> f64;
}

impl RandomSequence for fastrand::Rng {
    #[inline]
    fn next_unit(&mut self) -> f64 {
        self.f64()
    }
}

/// Build the run's random sequence. Seed it once and never reseed.
pub fn seeded_sequence(seed: u64) -> fastrand::Rng {
    fastrand::Rng::with_seed(seed)
}

/// Destination for retained reads
pub trait ReadSink<R> {
    /// Write every read of one set, in order
    fn write_reads(&mut self, reads: &[R]) -> io::Result<()>;
}

impl<R: Clone> ReadSink<R> for Vec<R> {
    fn write_reads(&mut self, reads: &[R]) -> io::Result<()> {
        self.extend_from_slice(reads);
        Ok(())
    }
}

/// Classify a duplicate set by the number of distinct MI values it carries
///
/// One value is simplex, two is duplex. Any other count means the tags are
/// malformed or the upstream grouping is broken.
pub fn classify<R: MolecularTagged>(set: &DuplicateSet<R>) -> Result<Strandedness, DownsampleError> {
    let mut ids: BTreeSet<BString> = BTreeSet::new();
    for read in set.reads() {
        ids.insert(required_molecular_id(read)?);
    }

    match ids.len() {
        1 => Ok(Strandedness::Simplex),
        2 => Ok(Strandedness::Duplex),
        _ => Err(DownsampleError::InvalidMolecularIds {
            ids: ids.iter().map(|id| id.to_string()).collect(),
        }),
    }
}

/// Sampling configuration, fixed for the run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionPolicy {
    sampling_rate: f64,
    simplex_only: bool,
}

impl RetentionPolicy {
    pub fn new(sampling_rate: f64, simplex_only: bool) -> Result<Self, DownsampleError> {
        if !(0.0..=1.0).contains(&sampling_rate) {
            return Err(DownsampleError::InvalidRate {
                value: sampling_rate,
            });
        }
        Ok(Self {
            sampling_rate,
            simplex_only,
        })
    }

    #[inline]
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    #[inline]
    pub fn simplex_only(&self) -> bool {
        self.simplex_only
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            sampling_rate: 1.0,
            simplex_only: false,
        }
    }
}

/// Running totals for one run
///
/// `reads_written` and `sets_written` change only when a set is retained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub reads_written: u64,
    pub sets_written: u64,
    pub sets_examined: u64,
    pub duplex_sets_filtered: u64,
    pub sets_sampled_out: u64,
}

/// Outcome for one duplicate set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Duplex set dropped by `simplex_only`, no draw consumed
    FilteredDuplex,
    /// Draw did not exceed the sampling rate
    SampledOut,
    /// Reads written to the sink
    Retained,
}

/// Per-set keep/drop logic with the run's counters
#[derive(Debug, Default)]
pub struct RetentionEngine {
    policy: RetentionPolicy,
    counters: RunCounters,
}

impl RetentionEngine {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            policy,
            counters: RunCounters::default(),
        }
    }

    #[inline]
    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    #[inline]
    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    pub fn into_counters(self) -> RunCounters {
        self.counters
    }

    /// Decide the fate of one duplicate set
    ///
    /// Order matters for reproducibility: classify, then the duplex filter
    /// (which never draws), then exactly one draw. A set is retained when the
    /// draw is strictly greater than the sampling rate, so a rate of 1.0 keeps
    /// nothing and 0.0 keeps everything.
    pub fn decide<R, G, S>(
        &mut self,
        set: &DuplicateSet<R>,
        rng: &mut G,
        sink: &mut S,
    ) -> Result<Decision, DownsampleError>
    where
        R: MolecularTagged,
        G: RandomSequence + ?Sized,
        S: ReadSink<R> + ?Sized,
    {
        let strandedness = classify(set)?;
        self.counters.sets_examined += 1;

        if self.policy.simplex_only && strandedness == Strandedness::Duplex {
            self.counters.duplex_sets_filtered += 1;
            debug!("dropped duplex set of {} reads", set.len());
            return Ok(Decision::FilteredDuplex);
        }

        let draw = rng.next_unit();
        if draw > self.policy.sampling_rate {
            sink.write_reads(set.reads())
                .map_err(DownsampleError::SinkWrite)?;
            self.counters.sets_written += 1;
            self.counters.reads_written += set.len() as u64;
            Ok(Decision::Retained)
        } else {
            self.counters.sets_sampled_out += 1;
            debug!("sampled out {strandedness:?} set of {} reads (draw {draw:.4})", set.len());
            Ok(Decision::SampledOut)
        }
    }
}
