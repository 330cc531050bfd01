//! Paired-end scoring
//!
//! - `insert_size` - library orientation, insert-size mean/sigma and bounds
//! - `penalty` - pairing penalty ROM and its conversion to score units
//! - `pair_builder` - pair construction, best-pair selection, MAPQ update
//! - `second_best` - competing placements and near-suboptimal counts

pub mod insert_size;
pub mod pair_builder;
pub mod penalty;
pub mod second_best;

pub use insert_size::{InsertSizeParameters, Orientation, sigma_factor_from_stddev};
pub use pair_builder::PairBuilder;
pub use penalty::PAIR_PENALTY_TABLE;
pub use second_best::SecondBest;
