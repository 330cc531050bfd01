// src/defaults.rs

// Scoring Constants
pub const MATCH_SCORE: i32 = 1;
pub const MISMATCH_PENALTY: i32 = 4;
pub const SNP_COST: i32 = MATCH_SCORE + MISMATCH_PENALTY;
pub const UNPAIRED_PENALTY: i32 = 80; // phred scale
pub const MIN_SCORE: i32 = 22;
pub const MAPQ_MIN_LEN: u32 = 50;

// Insert Size Constants
pub const ORIENTATION: &str = "fr";
pub const INSERT_STDDEV_FRACTION: f64 = 0.1; // stddev when only the mean is given
pub const MAX_STDDEV: f64 = 4.0; // proper-pair bound in standard deviations

// Other Constants
pub const VERBOSITY: u8 = 3;
