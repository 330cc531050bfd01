// Pair construction and selection module
//
// This module turns per-end candidates into scored pairs and picks the best:
// - Pair construction: every end-0 x end-1 combination, scored as the sum of
//   both ends minus the pairing penalty
// - Pair selection: first pair with the maximal combined score
// - MAPQ update: per-end MAPQ and XS written onto the chosen alignments
//
// Pairs refer to alignments by index into `UnpairedAlignments`, so MAPQ/XS
// written for the chosen pair is visible through every pair sharing them.

use super::insert_size::InsertSizeParameters;
use crate::alignment::{AlignmentPair, INVALID_SCORE, ReadPair, Score, UnpairedAlignments};
use crate::mapq::{Mapq, compute_mapq};
use crate::pair_opt::PairOpt;

/// Scoring configuration for pairing and MAPQ assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairBuilder {
    /// Cost of one mismatch in score units (match + mismatch penalty)
    pub snp_cost: Score,
    /// Phred-scaled penalty for pairing two ends that are not a proper pair
    pub unpaired_penalty: i32,
    /// Minimum valid alignment score; floor for second-best scores
    pub min_score: Score,
    /// Read length floor used when scaling MAPQ
    pub mapq_min_len: u32,
}

impl Default for PairBuilder {
    fn default() -> Self {
        Self::new(&PairOpt::default())
    }
}

impl PairBuilder {
    pub fn new(opt: &PairOpt) -> Self {
        Self {
            snp_cost: opt.snp_cost,
            unpaired_penalty: opt.unpaired_penalty,
            min_score: opt.min_score,
            mapq_min_len: opt.mapq_min_len,
        }
    }

    /// Score every combination of one end-0 and one end-1 candidate.
    ///
    /// Pairs come out in end-0-major order. A combination is a proper pair
    /// when both ends are mapped on the same reference, their strands agree
    /// with the library orientation and the insert length is within bounds.
    pub fn build_pairs(
        &self,
        params: &InsertSizeParameters,
        read_pair: &ReadPair,
        unpaired: &UnpairedAlignments,
    ) -> Vec<AlignmentPair> {
        let mut pairs = Vec::with_capacity(unpaired[0].len() * unpaired[1].len());

        for (i, a) in unpaired[0].iter().enumerate() {
            for (j, b) in unpaired[1].iter().enumerate() {
                let proper = !a.unmapped
                    && !b.unmapped
                    && a.ref_id == b.ref_id
                    && params.strands_compatible(a.is_rev, b.is_rev)
                    && {
                        let (begin, end) =
                            params.insert_span((a.pos, a.ref_end), a.is_rev, (b.pos, b.ref_end));
                        params.is_within_bounds(end - begin + 1)
                    };

                let penalty = self.compute_pair_penalty(
                    params,
                    read_pair,
                    a.chain.as_ref(),
                    b.chain.as_ref(),
                    proper,
                );
                let mut pair = AlignmentPair::new(i, j, a.score + b.score - penalty);
                pair.proper = proper;
                pairs.push(pair);
            }
        }

        log::debug!(
            "built {} pairs from {}x{} candidates ({} proper)",
            pairs.len(),
            unpaired[0].len(),
            unpaired[1].len(),
            pairs.iter().filter(|p| p.proper).count()
        );
        pairs
    }

    /// Compute and store MAPQ and XS for one end of the best pair.
    ///
    /// An unmapped end gets MAPQ 0 and no XS. The MAPQ is not clamped.
    pub fn update_end_mapq(
        &self,
        avg_read_len: u32,
        pairs: &[AlignmentPair],
        unpaired: &mut UnpairedAlignments,
        best: usize,
        end: usize,
    ) {
        let id = pairs[best].id(end);
        let Some(aln) = unpaired.get(id) else {
            return;
        };

        if aln.unmapped {
            if let Some(aln) = unpaired.get_mut(id) {
                aln.mapq = 0;
                aln.xs = INVALID_SCORE;
            }
            return;
        }

        let second = self.find_second_best_score(avg_read_len, pairs, unpaired, best, end);
        let base: Mapq = compute_mapq(
            self.snp_cost,
            pairs[best].score,
            self.min_score.max(second.pair_score),
            self.mapq_min_len.max(avg_read_len) as f64,
        );
        let sub_penalty = if second.sub_count > 0 {
            (3.0 * (second.sub_count as f64).log2()) as Mapq
        } else {
            0
        };
        let xs = if second.score >= self.min_score {
            second.score
        } else {
            INVALID_SCORE
        };

        log::trace!(
            "end {}: best={} second_pair={} second={} sub_count={} mapq={}-{}",
            end,
            pairs[best].score,
            second.pair_score,
            second.score,
            second.sub_count,
            base,
            sub_penalty
        );

        if let Some(aln) = unpaired.get_mut(id) {
            aln.mapq = base.saturating_sub(sub_penalty);
            aln.xs = xs;
        }
    }

    /// Update MAPQ and XS for both ends of the best pair.
    pub fn update_mapq(
        &self,
        avg_read_len: u32,
        pairs: &[AlignmentPair],
        unpaired: &mut UnpairedAlignments,
        best: usize,
    ) {
        self.update_end_mapq(avg_read_len, pairs, unpaired, best, 0);
        self.update_end_mapq(avg_read_len, pairs, unpaired, best, 1);
    }

    /// Pick the first pair with the highest combined score and assign MAPQ/XS
    /// to both of its ends.
    ///
    /// Returns `None` when there are no pairs or both ends of the best pair
    /// are ineligible; nothing is written in that case.
    pub fn pick_best(
        &self,
        read_pair: &ReadPair,
        pairs: &[AlignmentPair],
        unpaired: &mut UnpairedAlignments,
    ) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, pair) in pairs.iter().enumerate() {
            if best.map_or(true, |b| pair.score > pairs[b].score) {
                best = Some(i);
            }
        }
        let best = best?;

        let pair = &pairs[best];
        let ineligible = |end: usize| unpaired.get(pair.id(end)).is_some_and(|a| a.ineligible);
        if ineligible(0) && ineligible(1) {
            log::trace!("best pair #{best} (score {}) has no eligible end", pair.score);
            return None;
        }

        self.update_mapq(read_pair.length(), pairs, unpaired, best);
        log::trace!(
            "best pair #{best}: ends={:?} score={} proper={}",
            pair.ends,
            pair.score,
            pair.proper
        );
        Some(best)
    }
}
