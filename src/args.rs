// Command-line argument parsing
use clap::Parser;

use crate::algorithm::{DEFAULT_SEED, RetentionPolicy};
use crate::error::DownsampleError;

#[derive(Parser, Debug)]
#[command(
    name = "dupsample",
    about = "Downsample a UMI-grouped BAM by duplicate set (Rust)"
)]
pub struct Args {
    /// Grouped input BAM (MI tags, reads of a molecule consecutive)
    #[arg(short, long)]
    pub input: String,
    #[arg(short, long)]
    pub output: String,
    /// Sampling rate in [0, 1]; a set is kept when its draw exceeds this value
    #[arg(short = 'd', long = "ds", default_value_t = 1.0)]
    pub downsampling_rate: f64,
    /// Only keep simplex duplicate sets
    #[arg(long)]
    pub keep_only_simplex: bool,
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

impl Args {
    /// Validated retention policy for this run
    pub fn retention_policy(&self) -> Result<RetentionPolicy, DownsampleError> {
        RetentionPolicy::new(self.downsampling_rate, self.keep_only_simplex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["dupsample", "-i", "in.bam", "-o", "out.bam"]);
        assert_eq!(args.input, "in.bam");
        assert_eq!(args.downsampling_rate, 1.0);
        assert!(!args.keep_only_simplex);
        assert_eq!(args.seed, 142);
    }

    #[test]
    fn test_args_all_options() {
        let args = Args::parse_from([
            "dupsample",
            "--input",
            "in.bam",
            "--output",
            "out.bam",
            "--ds",
            "0.25",
            "--keep-only-simplex",
            "--seed",
            "7",
        ]);
        let policy = args.retention_policy().unwrap();
        assert_eq!(policy.sampling_rate(), 0.25);
        assert!(policy.simplex_only());
        assert_eq!(args.seed, 7);
    }

    #[test]
    fn test_out_of_range_rate_rejected() {
        let args = Args::parse_from(["dupsample", "-i", "a", "-o", "b", "-d", "2"]);
        assert!(matches!(
            args.retention_policy(),
            Err(DownsampleError::InvalidRate { .. })
        ));
    }
}
