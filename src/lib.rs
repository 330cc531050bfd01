pub mod alignment;
pub mod defaults;
pub mod mapq; // Fixed-point log2 and score <-> MAPQ scaling
pub mod pair_opt;
pub mod paired; // Pair construction, penalty, second-best search, MAPQ update

pub use alignment::{Alignment, AlignmentPair, ReadPair, SeedChain, UnpairedAlignments};
pub use pair_opt::PairOpt;
pub use paired::{InsertSizeParameters, Orientation, PairBuilder};
