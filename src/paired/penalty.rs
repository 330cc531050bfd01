//! Pairing penalty model
//!
//! Converts the deviation of a pair's insert size from the library mean into
//! a phred penalty with a 512-entry Gaussian tail ROM, then into alignment
//! score units. Pairs that are not proper (or lack seed chains) are charged
//! the flat unpaired penalty instead.

use super::insert_size::InsertSizeParameters;
use super::pair_builder::PairBuilder;
use crate::alignment::{ReadPair, Score, SeedChain};
use crate::mapq::mapq_to_score_scale;

/// Fraction bits of the sigma factor
pub const SIGMA_FACTOR_FRAC_BITS: u32 = 12;

/// Width of the penalty ROM address
pub const PENALTY_ADDR_BITS: u32 = 9;

const PENALTY_ADDR_MAX: u64 = (1 << PENALTY_ADDR_BITS) - 1;

/// `-10·log10(2·Φ(-addr / 47.125))` rounded and capped at 255: the phred
/// probability of a deviation at least `addr / 47.125` standard deviations
/// from the mean.
#[rustfmt::skip]
pub static PAIR_PENALTY_TABLE: [u8; 512] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    0x01, 0x01, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x03, 0x03, 0x03, 0x03,
    0x03, 0x03, 0x03, 0x03, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x05, 0x05, 0x05, 0x05,
    0x05, 0x05, 0x05, 0x06, 0x06, 0x06, 0x06, 0x06, 0x06, 0x06, 0x07, 0x07, 0x07, 0x07, 0x07, 0x07,
    0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x09, 0x09, 0x09, 0x09, 0x09, 0x0A, 0x0A, 0x0A, 0x0A, 0x0A,
    0x0A, 0x0B, 0x0B, 0x0B, 0x0B, 0x0B, 0x0C, 0x0C, 0x0C, 0x0C, 0x0D, 0x0D, 0x0D, 0x0D, 0x0D, 0x0E,
    0x0E, 0x0E, 0x0E, 0x0E, 0x0F, 0x0F, 0x0F, 0x0F, 0x10, 0x10, 0x10, 0x10, 0x11, 0x11, 0x11, 0x11,
    0x12, 0x12, 0x12, 0x12, 0x13, 0x13, 0x13, 0x13, 0x14, 0x14, 0x14, 0x14, 0x15, 0x15, 0x15, 0x16,
    0x16, 0x16, 0x16, 0x17, 0x17, 0x17, 0x18, 0x18, 0x18, 0x18, 0x19, 0x19, 0x19, 0x1A, 0x1A, 0x1A,
    0x1A, 0x1B, 0x1B, 0x1B, 0x1C, 0x1C, 0x1C, 0x1D, 0x1D, 0x1D, 0x1E, 0x1E, 0x1E, 0x1F, 0x1F, 0x1F,
    0x20, 0x20, 0x20, 0x21, 0x21, 0x21, 0x22, 0x22, 0x22, 0x23, 0x23, 0x23, 0x24, 0x24, 0x25, 0x25,
    0x25, 0x26, 0x26, 0x26, 0x27, 0x27, 0x27, 0x28, 0x28, 0x29, 0x29, 0x29, 0x2A, 0x2A, 0x2B, 0x2B,
    0x2B, 0x2C, 0x2C, 0x2D, 0x2D, 0x2D, 0x2E, 0x2E, 0x2F, 0x2F, 0x2F, 0x30, 0x30, 0x31, 0x31, 0x32,
    0x32, 0x32, 0x33, 0x33, 0x34, 0x34, 0x35, 0x35, 0x35, 0x36, 0x36, 0x37, 0x37, 0x38, 0x38, 0x39,
    0x39, 0x39, 0x3A, 0x3A, 0x3B, 0x3B, 0x3C, 0x3C, 0x3D, 0x3D, 0x3E, 0x3E, 0x3F, 0x3F, 0x40, 0x40,
    0x41, 0x41, 0x42, 0x42, 0x42, 0x43, 0x43, 0x44, 0x44, 0x45, 0x45, 0x46, 0x46, 0x47, 0x48, 0x48,
    0x49, 0x49, 0x4A, 0x4A, 0x4B, 0x4B, 0x4C, 0x4C, 0x4D, 0x4D, 0x4E, 0x4E, 0x4F, 0x4F, 0x50, 0x51,
    0x51, 0x52, 0x52, 0x53, 0x53, 0x54, 0x54, 0x55, 0x55, 0x56, 0x57, 0x57, 0x58, 0x58, 0x59, 0x59,
    0x5A, 0x5B, 0x5B, 0x5C, 0x5C, 0x5D, 0x5E, 0x5E, 0x5F, 0x5F, 0x60, 0x61, 0x61, 0x62, 0x62, 0x63,
    0x64, 0x64, 0x65, 0x65, 0x66, 0x67, 0x67, 0x68, 0x68, 0x69, 0x6A, 0x6A, 0x6B, 0x6C, 0x6C, 0x6D,
    0x6E, 0x6E, 0x6F, 0x6F, 0x70, 0x71, 0x71, 0x72, 0x73, 0x73, 0x74, 0x75, 0x75, 0x76, 0x77, 0x77,
    0x78, 0x79, 0x79, 0x7A, 0x7B, 0x7B, 0x7C, 0x7D, 0x7D, 0x7E, 0x7F, 0x7F, 0x80, 0x81, 0x82, 0x82,
    0x83, 0x84, 0x84, 0x85, 0x86, 0x86, 0x87, 0x88, 0x89, 0x89, 0x8A, 0x8B, 0x8B, 0x8C, 0x8D, 0x8E,
    0x8E, 0x8F, 0x90, 0x91, 0x91, 0x92, 0x93, 0x94, 0x94, 0x95, 0x96, 0x97, 0x97, 0x98, 0x99, 0x9A,
    0x9A, 0x9B, 0x9C, 0x9D, 0x9D, 0x9E, 0x9F, 0xA0, 0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA4, 0xA5, 0xA6,
    0xA7, 0xA8, 0xA8, 0xA9, 0xAA, 0xAB, 0xAC, 0xAC, 0xAD, 0xAE, 0xAF, 0xB0, 0xB0, 0xB1, 0xB2, 0xB3,
    0xB4, 0xB5, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xBA, 0xBA, 0xBB, 0xBC, 0xBD, 0xBE, 0xBF, 0xBF, 0xC0,
    0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xCA, 0xCB, 0xCC, 0xCC, 0xCD, 0xCE,
    0xCF, 0xD0, 0xD1, 0xD2, 0xD3, 0xD4, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xDB, 0xDC, 0xDD,
    0xDD, 0xDE, 0xDF, 0xE0, 0xE1, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA, 0xEA, 0xEB,
    0xEC, 0xED, 0xEE, 0xEF, 0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA, 0xFB,
    0xFC, 0xFD, 0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
];

/// ROM address for an absolute insert-size deviation.
///
/// `(deviation · sigma_factor) >> 12`, saturating at the last entry.
#[inline]
pub fn penalty_address(deviation: u64, sigma_factor: u32) -> usize {
    let prod = deviation.saturating_mul(sigma_factor as u64) >> SIGMA_FACTOR_FRAC_BITS;
    prod.min(PENALTY_ADDR_MAX) as usize
}

/// Signed insert length of two chains under the given parameters.
pub fn chain_insert_length(
    params: &InsertSizeParameters,
    chain_a: &SeedChain,
    chain_b: &SeedChain,
) -> i64 {
    let (begin, end) = params.insert_span(
        (chain_a.first_reference_position(), chain_a.last_reference_position()),
        chain_a.is_reverse_complement(),
        (chain_b.first_reference_position(), chain_b.last_reference_position()),
    );
    end - begin + 1
}

impl PairBuilder {
    /// Phred-scaled penalty for a proper pair with the given insert length.
    pub fn phred_pair_penalty(&self, params: &InsertSizeParameters, insert_len: i64) -> i32 {
        let deviation = (insert_len - params.mean as i64).unsigned_abs();
        let addr = penalty_address(deviation, params.sigma_factor);
        // addr is already capped at 511; the fallback only guards the table length
        PAIR_PENALTY_TABLE
            .get(addr)
            .map_or(self.unpaired_penalty, |&p| p as i32)
    }

    /// Penalty subtracted from the summed end scores of a pair, in score units.
    ///
    /// Missing chains or a pair that is not proper get the unpaired penalty.
    pub fn compute_pair_penalty(
        &self,
        params: &InsertSizeParameters,
        read_pair: &ReadPair,
        chain_a: Option<&SeedChain>,
        chain_b: Option<&SeedChain>,
        proper: bool,
    ) -> Score {
        let phred = match (chain_a, chain_b) {
            (Some(a), Some(b)) if proper => {
                let insert_len = chain_insert_length(params, a, b);
                let phred = self.phred_pair_penalty(params, insert_len);
                log::trace!(
                    "pair penalty: insert_len={} mean={} phred={}",
                    insert_len,
                    params.mean,
                    phred
                );
                phred
            }
            _ => self.unpaired_penalty,
        };
        self.phred_to_score(read_pair.length(), phred)
    }

    /// Unpaired penalty in score units for the given average read length.
    pub fn scaled_unpaired_penalty(&self, read_len: u32) -> Score {
        self.phred_to_score(read_len, self.unpaired_penalty)
    }

    /// Phred penalty expressed in score units, truncated toward zero.
    pub fn phred_to_score(&self, read_len: u32, phred: i32) -> Score {
        (mapq_to_score_scale(self.snp_cost, read_len as f64) * phred as f64) as Score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paired::insert_size::Orientation;
    use crate::pair_opt::PairOpt;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn builder() -> PairBuilder {
        PairBuilder::new(&PairOpt::default())
    }

    fn fr_params() -> InsertSizeParameters {
        InsertSizeParameters::new(Orientation::Fr, 500.0, 50.0)
    }

    #[test]
    fn test_table_shape() {
        assert_eq!(PAIR_PENALTY_TABLE[0], 0);
        assert_eq!(PAIR_PENALTY_TABLE[7], 1);
        assert_eq!(PAIR_PENALTY_TABLE[93], 13);
        assert_eq!(PAIR_PENALTY_TABLE[498], 254);
        assert!(PAIR_PENALTY_TABLE[499..].iter().all(|&p| p == 255));
        assert!(PAIR_PENALTY_TABLE.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_penalty_address() {
        assert_eq!(penalty_address(0, 3860), 0);
        assert_eq!(penalty_address(99, 3860), 93);
        assert_eq!(penalty_address(1_000_000, 3860), 511);
        assert_eq!(penalty_address(u64::MAX, 0xFFFF), 511);
    }

    #[test]
    fn test_forward_reverse_scenario() {
        let pb = builder();
        let a = SeedChain::spanning(1000, 1100, 0, false);
        let b = SeedChain::spanning(1300, 1400, 0, true);
        let params = fr_params();
        assert_eq!(chain_insert_length(&params, &a, &b), 401);
        assert_eq!(pb.phred_pair_penalty(&params, 401), 13);
        let read_pair = ReadPair::new(150, 150);
        assert_eq!(
            pb.compute_pair_penalty(&params, &read_pair, Some(&a), Some(&b), true),
            4
        );
    }

    #[test]
    fn test_unpaired_penalty() {
        let pb = builder();
        let params = fr_params();
        let read_pair = ReadPair::new(150, 150);
        let a = SeedChain::spanning(1000, 1100, 0, false);
        let b = SeedChain::spanning(1300, 1400, 0, true);
        assert_eq!(pb.scaled_unpaired_penalty(150), 27);
        assert_eq!(
            pb.compute_pair_penalty(&params, &read_pair, Some(&a), Some(&b), false),
            27
        );
        assert_eq!(
            pb.compute_pair_penalty(&params, &read_pair, None, Some(&b), true),
            27
        );
        assert_eq!(
            pb.compute_pair_penalty(&params, &read_pair, Some(&a), None, true),
            27
        );
    }

    #[test]
    fn test_exact_mean_is_free() {
        let pb = builder();
        let params = fr_params();
        let a = SeedChain::spanning(1000, 1099, 0, false);
        let b = SeedChain::spanning(1400, 1499, 0, true);
        let read_pair = ReadPair::new(100, 100);
        assert_eq!(
            pb.compute_pair_penalty(&params, &read_pair, Some(&a), Some(&b), true),
            0
        );
    }

    #[test]
    fn test_penalty_saturates() {
        let pb = builder();
        let params = fr_params();
        assert_eq!(pb.phred_pair_penalty(&params, 100_000), 255);
        assert_eq!(pb.phred_pair_penalty(&params, -100_000), 255);
    }

    #[test]
    fn test_penalty_monotone_in_deviation() {
        let pb = builder();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let sigma: f64 = rng.gen_range(3.0..300.0);
            let params = InsertSizeParameters::new(Orientation::Fr, 400.0, sigma);
            let mut last = 0;
            for deviation in 0..2000i64 {
                let phred = pb.phred_pair_penalty(&params, 400 + deviation);
                assert!(phred >= last, "sigma {sigma} deviation {deviation}");
                assert_eq!(phred, pb.phred_pair_penalty(&params, 400 - deviation));
                last = phred;
            }
        }
    }
}
