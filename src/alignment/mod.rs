//! Candidate data model consumed by the pair selector.
//!
//! - `types` - `Alignment`, `AlignmentPair`, `ReadPair`, `UnpairedAlignments`
//! - `seed_chain` - seed evidence behind a candidate

mod seed_chain;
mod types;

pub use seed_chain::{SeedChain, SeedHit};
pub use types::{
    Alignment, AlignmentId, AlignmentPair, INVALID_SCORE, ReadPair, Score, UnpairedAlignments,
};
