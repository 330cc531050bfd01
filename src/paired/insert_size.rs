// Insert size model
//
// This module holds the configured insert-size expectations for a library:
// - Expected relative orientation of the two ends (FF, RR, FR, RF)
// - Mean insert size and the 4.12 fixed-point "sigma factor" used to address
//   the pairing penalty ROM
// - Proper-pair bounds
//
// Parameters are normally configured (or overridden with -I); they can also be
// derived from a sample of confidently paired insert sizes.

use crate::defaults::MAX_STDDEV;
use crate::pair_opt::InsertSizeOverride;

const MIN_DIR_CNT: usize = 10; // Minimum samples for an estimate
const OUTLIER_BOUND: f64 = 2.0; // IQR multiplier for outliers
const MAPPING_BOUND: f64 = 3.0; // IQR multiplier for proper-pair bounds

/// 47.125 in 4.12 fixed point: the ROM address of one standard deviation.
const SIGMA_FACTOR_NUMERATOR: f64 = 0x2F200 as f64;
const SIGMA_FACTOR_MAX: u32 = 0xFFFF;

/// Expected relative orientation of the two read ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    Ff,
    Rr,
    #[default]
    Fr,
    Rf,
}

impl Orientation {
    /// Both ends are expected on the same strand.
    pub fn is_same_strand(self) -> bool {
        matches!(self, Orientation::Ff | Orientation::Rr)
    }
}

impl std::str::FromStr for Orientation {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ff" => Ok(Self::Ff),
            "rr" => Ok(Self::Rr),
            "fr" => Ok(Self::Fr),
            "rf" => Ok(Self::Rf),
            _ => Err(format!(
                "unknown orientation '{s}'; expected one of ff, rr, fr, rf"
            )),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ff => write!(f, "ff"),
            Self::Rr => write!(f, "rr"),
            Self::Fr => write!(f, "fr"),
            Self::Rf => write!(f, "rf"),
        }
    }
}

/// Insert-size expectations for one library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertSizeParameters {
    pub orientation: Orientation,
    /// Mean insert size
    pub mean: i32,
    /// Reciprocal standard deviation, 4.12 fixed point
    pub sigma_factor: u32,
    /// Smallest insert size of a proper pair
    pub min: i32,
    /// Largest insert size of a proper pair
    pub max: i32,
}

/// `min(0xFFFF, round(0x2F200 / sigma))`: scales a deviation so that 10.84
/// standard deviations land on the last ROM address (511).
pub fn sigma_factor_from_stddev(stddev: f64) -> u32 {
    if stddev.is_nan() || stddev <= 0.0 {
        return SIGMA_FACTOR_MAX;
    }
    let factor = (SIGMA_FACTOR_NUMERATOR / stddev).round();
    if factor >= SIGMA_FACTOR_MAX as f64 {
        SIGMA_FACTOR_MAX
    } else {
        factor as u32
    }
}

/// Outer span `[begin, end]` of a pair for the given orientation.
///
/// For same-strand libraries the span is the union of both extents. For
/// opposite-strand libraries it starts at the end that leads under the
/// configured orientation and stops at the far end of its mate.
pub fn insert_span(
    orientation: Orientation,
    a: (i64, i64),
    a_is_rev: bool,
    b: (i64, i64),
) -> (i64, i64) {
    let (a_begin, a_end) = a;
    let (b_begin, b_end) = b;
    if orientation.is_same_strand() {
        (a_begin.min(b_begin), a_end.max(b_end))
    } else if (orientation == Orientation::Fr) ^ a_is_rev {
        (a_begin, b_end)
    } else {
        (b_begin, a_end)
    }
}

impl InsertSizeParameters {
    /// Parameters for a library with the given mean and standard deviation.
    /// Proper-pair bounds are `mean ± 4·stddev`, the lower bound floored at 1.
    pub fn new(orientation: Orientation, mean: f64, stddev: f64) -> Self {
        let min = ((mean - MAX_STDDEV * stddev + 0.499) as i32).max(1);
        let max = (mean + MAX_STDDEV * stddev + 0.499) as i32;
        Self {
            orientation,
            mean: mean.round() as i32,
            sigma_factor: sigma_factor_from_stddev(stddev),
            min,
            max,
        }
    }

    pub fn with_bounds(mut self, min: i32, max: i32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Parameters from a user override (`-I mean,std,max,min`).
    pub fn from_override(orientation: Orientation, isz: &InsertSizeOverride) -> Self {
        Self::new(orientation, isz.mean, isz.stddev).with_bounds(isz.min, isz.max)
    }

    /// Estimate parameters from observed insert sizes of confident pairs.
    ///
    /// Samples outside `[p25 - 2·IQR, p75 + 2·IQR]` are ignored for the mean
    /// and standard deviation. Proper-pair bounds start at `3·IQR` around the
    /// quartiles and are widened to at least `mean ± 4·stddev`.
    ///
    /// Returns `None` when fewer than 10 positive samples are available.
    pub fn from_insert_sizes(orientation: Orientation, sizes: &[i64]) -> Option<Self> {
        let mut sizes: Vec<i64> = sizes.iter().copied().filter(|&s| s > 0).collect();
        if sizes.len() < MIN_DIR_CNT {
            log::info!(
                "[PE] skip orientation {orientation} as there are not enough pairs ({})",
                sizes.len()
            );
            return None;
        }

        log::info!("[PE] analyzing insert size distribution for orientation {orientation}...");
        sizes.sort_unstable();

        let quantile = |q: f64| sizes[(q * sizes.len() as f64 + 0.499) as usize];
        let p25 = quantile(0.25);
        let p50 = quantile(0.50);
        let p75 = quantile(0.75);
        let iqr = (p75 - p25) as f64;

        let low_outlier = ((p25 as f64 - OUTLIER_BOUND * iqr + 0.499) as i64).max(1);
        let high_outlier = (p75 as f64 + OUTLIER_BOUND * iqr + 0.499) as i64;

        log::info!("[PE] (25, 50, 75) percentile: ({p25}, {p50}, {p75})");
        log::info!(
            "[PE] low and high boundaries for computing mean and std.dev: ({low_outlier}, {high_outlier})"
        );

        let kept: Vec<f64> = sizes
            .iter()
            .filter(|&&s| s >= low_outlier && s <= high_outlier)
            .map(|&s| s as f64)
            .collect();
        if kept.is_empty() {
            log::warn!("[PE] no valid samples for orientation {orientation} within bounds");
            return None;
        }

        let avg = kept.iter().sum::<f64>() / kept.len() as f64;
        let std = (kept.iter().map(|s| (s - avg) * (s - avg)).sum::<f64>() / kept.len() as f64)
            .sqrt();

        log::info!("[PE] mean and std.dev: ({avg:.2}, {std:.2})");

        let mut low = (p25 as f64 - MAPPING_BOUND * iqr + 0.499) as i32;
        let mut high = (p75 as f64 + MAPPING_BOUND * iqr + 0.499) as i32;
        low = low.min((avg - MAX_STDDEV * std + 0.499) as i32).max(1);
        high = high.max((avg + MAX_STDDEV * std + 0.499) as i32);

        log::info!("[PE] low and high boundaries for proper pairs: ({low}, {high})");

        Some(Self {
            orientation,
            mean: avg.round() as i32,
            sigma_factor: sigma_factor_from_stddev(std),
            min: low,
            max: high,
        })
    }

    pub fn is_within_bounds(&self, insert_len: i64) -> bool {
        insert_len >= self.min as i64 && insert_len <= self.max as i64
    }

    /// Whether the strands of two placements agree with the orientation.
    pub fn strands_compatible(&self, a_is_rev: bool, b_is_rev: bool) -> bool {
        self.orientation.is_same_strand() == (a_is_rev == b_is_rev)
    }

    pub fn insert_span(&self, a: (i64, i64), a_is_rev: bool, b: (i64, i64)) -> (i64, i64) {
        insert_span(self.orientation, a, a_is_rev, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigma_factor() {
        assert_eq!(sigma_factor_from_stddev(50.0), 3860);
        assert_eq!(sigma_factor_from_stddev(100.0), 1930);
        // saturates below sigma ~= 2.95
        assert_eq!(sigma_factor_from_stddev(2.0), 0xFFFF);
        assert_eq!(sigma_factor_from_stddev(0.0), 0xFFFF);
        assert_eq!(sigma_factor_from_stddev(-1.0), 0xFFFF);
    }

    #[test]
    fn test_orientation_parse_and_display() {
        assert_eq!("FR".parse::<Orientation>().unwrap(), Orientation::Fr);
        assert_eq!("rr".parse::<Orientation>().unwrap(), Orientation::Rr);
        assert!("xy".parse::<Orientation>().is_err());
        assert_eq!(Orientation::Rf.to_string(), "rf");
        assert_eq!(Orientation::default(), Orientation::Fr);
    }

    #[test]
    fn test_insert_span_forward_reverse() {
        // forward chain first: begin from it, end from the mate
        assert_eq!(
            insert_span(Orientation::Fr, (1000, 1100), false, (1300, 1400)),
            (1000, 1400)
        );
        // reverse chain first: begin from the mate, end from it
        assert_eq!(
            insert_span(Orientation::Fr, (1300, 1400), true, (1000, 1100)),
            (1000, 1400)
        );
    }

    #[test]
    fn test_insert_span_reverse_forward() {
        assert_eq!(
            insert_span(Orientation::Rf, (1000, 1100), true, (1300, 1400)),
            (1000, 1400)
        );
        assert_eq!(
            insert_span(Orientation::Rf, (1000, 1100), false, (1300, 1400)),
            (1300, 1100)
        );
    }

    #[test]
    fn test_insert_span_same_strand_is_union() {
        for orientation in [Orientation::Ff, Orientation::Rr] {
            assert_eq!(
                insert_span(orientation, (1300, 1400), false, (1000, 1100)),
                (1000, 1400)
            );
        }
    }

    #[test]
    fn test_new_bounds() {
        let params = InsertSizeParameters::new(Orientation::Fr, 500.0, 50.0);
        assert_eq!(params.mean, 500);
        assert_eq!(params.sigma_factor, 3860);
        assert_eq!(params.min, 300);
        assert_eq!(params.max, 700);

        let narrow = InsertSizeParameters::new(Orientation::Fr, 100.0, 50.0);
        assert_eq!(narrow.min, 1);
    }

    #[test]
    fn test_strands_compatible() {
        let fr = InsertSizeParameters::new(Orientation::Fr, 500.0, 50.0);
        assert!(fr.strands_compatible(false, true));
        assert!(!fr.strands_compatible(true, true));
        let ff = InsertSizeParameters::new(Orientation::Ff, 500.0, 50.0);
        assert!(ff.strands_compatible(true, true));
        assert!(!ff.strands_compatible(false, true));
    }

    #[test]
    fn test_from_insert_sizes() {
        let sizes: Vec<i64> = (0..200).map(|i| 450 + (i % 101)).collect();
        let params = InsertSizeParameters::from_insert_sizes(Orientation::Fr, &sizes).unwrap();
        assert!((params.mean - 500).abs() <= 1, "mean {}", params.mean);
        assert!(params.min < 450 && params.max > 550);
        assert!(params.is_within_bounds(500));
        assert!(!params.is_within_bounds(10_000));
    }

    #[test]
    fn test_from_insert_sizes_ignores_outliers() {
        let mut sizes: Vec<i64> = (0..100).map(|i| 480 + (i % 41)).collect();
        sizes.push(50_000);
        sizes.push(-3);
        let params = InsertSizeParameters::from_insert_sizes(Orientation::Fr, &sizes).unwrap();
        assert!((params.mean - 500).abs() <= 3, "mean {}", params.mean);
        assert!(params.max < 1000);
    }

    #[test]
    fn test_from_insert_sizes_needs_samples() {
        assert!(InsertSizeParameters::from_insert_sizes(Orientation::Fr, &[500; 9]).is_none());
    }
}
