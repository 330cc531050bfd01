use clap::Args;

use crate::alignment::Score;
use crate::defaults;
use crate::paired::{InsertSizeParameters, Orientation};

/// Options controlling pair scoring and MAPQ assignment
#[derive(Debug, Clone)]
pub struct PairOpt {
    pub snp_cost: Score,         // Match score + mismatch penalty
    pub unpaired_penalty: i32,   // Phred-scaled penalty for an unpaired placement
    pub min_score: Score,        // Minimum valid alignment score
    pub mapq_min_len: u32,       // Read length floor for MAPQ scaling
    pub orientation: Orientation, // Expected orientation of the two ends
    pub insert_size_override: Option<InsertSizeOverride>, // Manual insert size specification
}

/// Manual insert size specification (overrides estimation)
#[derive(Debug, Clone, PartialEq)]
pub struct InsertSizeOverride {
    pub mean: f64,   // Mean insert size
    pub stddev: f64, // Standard deviation (default: 10% of mean)
    pub max: i32,    // Maximum insert size (default: mean + 4*stddev)
    pub min: i32,    // Minimum insert size (default: 0)
}

#[derive(Debug, Clone, Args)]
pub struct PairCliOptions {
    /// Score for a sequence match
    #[arg(short = 'A', long, value_name = "INT", default_value_t = defaults::MATCH_SCORE)]
    pub match_score: i32,

    /// Penalty for a mismatch
    #[arg(short = 'B', long, value_name = "INT", default_value_t = defaults::MISMATCH_PENALTY)]
    pub mismatch_penalty: i32,

    /// Phred-scaled penalty for pairing ends that are not a proper pair
    #[arg(short = 'U', long, value_name = "INT", default_value_t = defaults::UNPAIRED_PENALTY)]
    pub unpaired_penalty: i32,

    /// Minimum valid alignment score
    #[arg(short = 'T', long, value_name = "INT", default_value_t = defaults::MIN_SCORE)]
    pub min_score: i32,

    /// Read length floor used when scaling MAPQ
    #[arg(long, value_name = "INT", default_value_t = defaults::MAPQ_MIN_LEN)]
    pub mapq_min_len: u32,

    /// Expected orientation of the two ends (ff, rr, fr, rf)
    #[arg(long, value_name = "STR", default_value = defaults::ORIENTATION)]
    pub orientation: Orientation,

    /// Specify the mean, standard deviation (10% of the mean if absent), max
    /// (4 sigma from the mean if absent) and min of the insert size distribution.
    #[arg(short = 'I', long, value_name = "FLOAT[,FLOAT[,INT[,INT]]]")]
    pub insert_size: Option<String>,
}

impl Default for PairOpt {
    fn default() -> Self {
        PairOpt {
            snp_cost: defaults::SNP_COST,
            unpaired_penalty: defaults::UNPAIRED_PENALTY,
            min_score: defaults::MIN_SCORE,
            mapq_min_len: defaults::MAPQ_MIN_LEN,
            orientation: Orientation::Fr,
            insert_size_override: None,
        }
    }
}

impl TryFrom<&PairCliOptions> for PairOpt {
    type Error = String;

    fn try_from(cli: &PairCliOptions) -> Result<Self, Self::Error> {
        let insert_size_override = cli
            .insert_size
            .as_deref()
            .map(PairOpt::parse_insert_size)
            .transpose()?;
        Ok(PairOpt {
            snp_cost: cli.match_score + cli.mismatch_penalty,
            unpaired_penalty: cli.unpaired_penalty,
            min_score: cli.min_score,
            mapq_min_len: cli.mapq_min_len,
            orientation: cli.orientation,
            insert_size_override,
        })
    }
}

impl PairOpt {
    /// Validate parameters
    /// Returns Ok(()) if valid, or Err listing every issue found
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.snp_cost < 1 {
            errors.push(format!("snp_cost must be >= 1, got {}", self.snp_cost));
        }
        if !(0..=255).contains(&self.unpaired_penalty) {
            errors.push(format!(
                "unpaired_penalty must be in [0, 255], got {}",
                self.unpaired_penalty
            ));
        }
        if self.min_score < 0 {
            errors.push(format!("min_score must be >= 0, got {}", self.min_score));
        }
        if self.mapq_min_len < 1 {
            errors.push(format!(
                "mapq_min_len must be >= 1, got {}",
                self.mapq_min_len
            ));
        }

        if let Some(isz) = &self.insert_size_override {
            if isz.stddev <= 0.0 {
                errors.push(format!(
                    "insert size stddev must be positive, got {}",
                    isz.stddev
                ));
            }
            if isz.min > isz.max {
                errors.push(format!(
                    "insert size min ({}) must not exceed max ({})",
                    isz.min, isz.max
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Insert size parameters from the manual override, if one was given
    pub fn insert_size_parameters(&self) -> Option<InsertSizeParameters> {
        self.insert_size_override
            .as_ref()
            .map(|isz| InsertSizeParameters::from_override(self.orientation, isz))
    }

    /// Parse an insert size override, `mean[,stddev[,max[,min]]]`.
    ///
    /// Missing fields default to stddev = 10% of the mean, max = mean + 4
    /// stddev and min = 0. The mean and stddev must be positive and the
    /// bounds ordered.
    pub fn parse_insert_size(s: &str) -> Result<InsertSizeOverride, String> {
        fn field<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, String> {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| format!("Invalid insert size {name}: {value}"))
        }

        let parts: Vec<&str> = s.split(',').collect();
        let [mean, rest @ ..] = parts.as_slice() else {
            return Err(format!("Insert size must be FLOAT[,FLOAT[,INT[,INT]]]: {s}"));
        };
        if rest.len() > 3 {
            return Err(format!("Insert size must be FLOAT[,FLOAT[,INT[,INT]]]: {s}"));
        }

        let mean: f64 = field("mean", mean)?;
        if !(mean.is_finite() && mean > 0.0) {
            return Err(format!("Insert size mean must be positive: {mean}"));
        }

        let stddev: f64 = match rest.first() {
            Some(p) => field("stddev", p)?,
            None => mean * defaults::INSERT_STDDEV_FRACTION,
        };
        if !(stddev.is_finite() && stddev > 0.0) {
            return Err(format!("Insert size stddev must be positive: {stddev}"));
        }

        let max: i32 = match rest.get(1) {
            Some(p) => field("max", p)?,
            None => (mean + defaults::MAX_STDDEV * stddev) as i32,
        };
        let min: i32 = match rest.get(2) {
            Some(p) => field("min", p)?,
            None => 0,
        };
        if min > max {
            return Err(format!("Insert size min ({min}) exceeds max ({max})"));
        }

        Ok(InsertSizeOverride {
            mean,
            stddev,
            max,
            min,
        })
    }
}
