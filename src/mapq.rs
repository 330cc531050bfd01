//! Mapping-quality arithmetic.
//!
//! Everything here mirrors the mapper hardware's fixed-point datapath:
//! - `fixed_point_log2`: log2 with 7 fractional bits from a 128-entry ROM
//! - `score_to_mapq_scale`: alignment-score delta -> MAPQ scale (2^20 fixed point)
//! - `mapq_to_score_scale`: phred/MAPQ units -> alignment-score units (float)
//! - `compute_mapq`: the unclamped base MAPQ for a best/second-best score pair

use crate::alignment::Score;

pub type Mapq = i32;

/// Conventional software MAPQ ceiling.
pub const MAPQ_MAX: Mapq = 60;
/// Largest MAPQ the hardware pipeline can emit.
pub const HW_MAPQ_MAX: Mapq = 250;

/// Hardware coefficient register, 38912 in 8.8 fixed point.
pub const MAPQ_COEFF: f64 = (38912 >> 8) as f64;

/// Fractional bits produced by `fixed_point_log2`.
pub const LOG2_FRAC_BITS: u32 = 7;

/// Right shift applied to `delta * scale`: removes the 2^20 scale and the 2^7
/// folded into the squared log.
const MAPQ_SCALE_SHIFT: u32 = 13;

/// `round(log2(1 + i/128) * 128)` as burned into the hardware ROM, i = 0..127.
static LOG2_FRAC_TABLE: [u8; 128] = [
    0b0000000, 0b0000001, 0b0000011, 0b0000100, 0b0000110, 0b0000111, 0b0001000, 0b0001010,
    0b0001011, 0b0001101, 0b0001110, 0b0001111, 0b0010001, 0b0010010, 0b0010011, 0b0010100,
    0b0010110, 0b0010111, 0b0011000, 0b0011010, 0b0011011, 0b0011100, 0b0011101, 0b0011111,
    0b0100000, 0b0100001, 0b0100010, 0b0100011, 0b0100101, 0b0100110, 0b0100111, 0b0101000,
    0b0101001, 0b0101010, 0b0101100, 0b0101101, 0b0101110, 0b0101111, 0b0110000, 0b0110001,
    0b0110010, 0b0110011, 0b0110100, 0b0110101, 0b0110111, 0b0111000, 0b0111001, 0b0111010,
    0b0111011, 0b0111100, 0b0111101, 0b0111110, 0b0111111, 0b1000000, 0b1000001, 0b1000010,
    0b1000011, 0b1000100, 0b1000101, 0b1000110, 0b1000111, 0b1001000, 0b1001001, 0b1001010,
    0b1001011, 0b1001100, 0b1001101, 0b1001110, 0b1001111, 0b1010000, 0b1010001, 0b1010001,
    0b1010010, 0b1010011, 0b1010100, 0b1010101, 0b1010110, 0b1010111, 0b1011000, 0b1011001,
    0b1011010, 0b1011011, 0b1011011, 0b1011100, 0b1011101, 0b1011110, 0b1011111, 0b1100000,
    0b1100001, 0b1100001, 0b1100010, 0b1100011, 0b1100100, 0b1100101, 0b1100110, 0b1100111,
    0b1100111, 0b1101000, 0b1101001, 0b1101010, 0b1101011, 0b1101011, 0b1101100, 0b1101101,
    0b1101110, 0b1101111, 0b1101111, 0b1110000, 0b1110001, 0b1110010, 0b1110011, 0b1110011,
    0b1110100, 0b1110101, 0b1110110, 0b1110110, 0b1110111, 0b1111000, 0b1111001, 0b1111001,
    0b1111010, 0b1111011, 0b1111100, 0b1111100, 0b1111101, 0b1111110, 0b1111111, 0b1111111,
];

/// Coefficient normalised to the configured SNP cost (5 is the reference cost).
#[inline]
pub fn mapq_coeff_scaled(snp_cost: Score) -> f64 {
    MAPQ_COEFF * (5.0 / snp_cost as f64)
}

/// Hardware approximation of `log2(x) * 128`.
///
/// The integer part is the index of the most significant set bit. The value
/// is then normalised into [1, 2) by shifting, truncated to seven fractional
/// bits and those bits address `LOG2_FRAC_TABLE`.
///
/// The hardware leaves a zero input to the integrator; we return 0, which is
/// what the downstream scaling expects for "no length".
#[inline]
pub fn fixed_point_log2(x: u32) -> u32 {
    if x == 0 {
        return 0;
    }
    let log_int = 31 - x.leading_zeros();
    // (x << 7) >> log_int without widening
    let norm = if log_int >= LOG2_FRAC_BITS {
        x >> (log_int - LOG2_FRAC_BITS)
    } else {
        x << (LOG2_FRAC_BITS - log_int)
    };
    let log_frac = LOG2_FRAC_TABLE[(norm & 0x7f) as usize] as u32;
    (log_int << LOG2_FRAC_BITS) + log_frac
}

/// Scale factor turning an alignment-score difference into MAPQ units.
///
/// Returned in 2^20 fixed point. `read_len` is truncated to an integer before
/// the log lookup, as the hardware length register is integral.
pub fn score_to_mapq_scale(snp_cost: Score, read_len: f64) -> i32 {
    let log2_len = fixed_point_log2(read_len.max(0.0) as u32) as i64;
    let log2_len_sq = (log2_len * log2_len) >> LOG2_FRAC_BITS;
    let scale = mapq_coeff_scaled(snp_cost) / log2_len_sq as f64;
    // float -> int saturates, so a zero denominator pins the scale at i32::MAX
    (scale * (1u32 << 20) as f64) as i32
}

/// Inverse direction of `score_to_mapq_scale`, in plain floating point.
///
/// Used to express phred-scaled penalties in alignment-score units.
pub fn mapq_to_score_scale(snp_cost: Score, read_len: f64) -> f64 {
    let log2_len = read_len.max(1.0).ln() / std::f64::consts::LN_2;
    log2_len * log2_len / mapq_coeff_scaled(snp_cost)
}

/// Base MAPQ for a best/second-best score pair.
///
/// No clamping is applied: negative values come out when `second > best` and
/// values above `HW_MAPQ_MAX` are possible for large gaps. Use
/// `saturate_mapq` where a bounded value is required.
pub fn compute_mapq(snp_cost: Score, best: Score, second: Score, avg_read_len: f64) -> Mapq {
    let scale = score_to_mapq_scale(snp_cost, avg_read_len) as i64;
    let delta = best as i64 - second as i64;
    let mapq = (delta * scale) >> MAPQ_SCALE_SHIFT;
    mapq.clamp(i32::MIN as i64, i32::MAX as i64) as Mapq
}

/// Clamp a MAPQ into `[0, max]`.
#[inline]
pub fn saturate_mapq(mapq: Mapq, max: Mapq) -> Mapq {
    mapq.clamp(0, max)
}

#[cfg(test)]
#[path = "mapq_test.rs"]
mod mapq_test;
