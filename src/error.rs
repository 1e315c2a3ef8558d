//! Error types for duplicate-set downsampling.

use std::io;
use thiserror::Error;

/// Errors raised while classifying, sampling or writing duplicate sets.
///
/// Every variant is fatal for the run: the tool is a single-pass stream
/// transformer and nothing is retried.
#[derive(Error, Debug)]
pub enum DownsampleError {
    /// A duplicate set did not carry exactly one or two distinct molecular identifiers
    #[error("Invalid molecular identifiers {ids:?}: expected 1 or 2 distinct values per duplicate set")]
    InvalidMolecularIds {
        /// Distinct MI values observed, in first-seen order
        ids: Vec<String>,
    },

    /// A read had no MI tag
    #[error("Read '{read}' is missing required MI tag")]
    MissingMolecularId {
        /// Name of the offending read
        read: String,
    },

    /// The MI tag of a read could not be decoded
    #[error("Read '{read}' has a malformed MI tag")]
    MalformedTag {
        /// Name of the offending read
        read: String,
        #[source]
        source: io::Error,
    },

    /// Sampling rate outside [0, 1]
    #[error("Invalid downsampling rate: {value} (must be between 0 and 1)")]
    InvalidRate {
        /// The rejected value
        value: f64,
    },

    /// The input stream failed
    #[error("Failed to read input record")]
    Input(#[source] io::Error),

    /// The output could not accept a read or could not be finalized
    #[error("Failed to write output")]
    SinkWrite(#[source] io::Error),
}
