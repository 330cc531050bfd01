//! Second-best search
//!
//! For one end of the chosen pair, find the strongest competing placement
//! and count candidates within one SNP of it. Both feed the MAPQ of that end:
//! the competing score sets the score gap, the count becomes a log-scaled
//! penalty.

use super::pair_builder::PairBuilder;
use crate::alignment::{Alignment, AlignmentPair, INVALID_SCORE, Score, UnpairedAlignments};

/// Result of the second-best search for one end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondBest {
    /// Candidates within one SNP of the second-best pair or its single-end window
    pub sub_count: u32,
    /// Combined score of the second-best pair, `INVALID_SCORE` if none
    pub pair_score: Score,
    /// Best competing score for this end, `INVALID_SCORE` if none
    pub score: Score,
}

#[inline]
fn pair_alignment<'a>(
    unpaired: &'a UnpairedAlignments,
    pair: &AlignmentPair,
    end: usize,
) -> &'a Alignment {
    &unpaired[end][pair.ends[end]]
}

impl PairBuilder {
    /// Best pair whose `end` alignment competes with (overlaps but is not a
    /// duplicate of) the best pair's, plus the near-suboptimal count.
    ///
    /// Ties go to the pair seen first. The count is zero when no competing
    /// pair exists.
    pub fn find_second_best(
        &self,
        avg_read_len: u32,
        pairs: &[AlignmentPair],
        unpaired: &UnpairedAlignments,
        best: usize,
        end: usize,
    ) -> (Option<usize>, u32) {
        let best_pair = &pairs[best];
        let best_aln = pair_alignment(unpaired, best_pair, end);

        let mut second: Option<usize> = None;
        for (i, pair) in pairs.iter().enumerate() {
            if second.is_some_and(|s| pairs[s].score >= pair.score) {
                continue;
            }
            let aln = pair_alignment(unpaired, pair, end);
            if !best_aln.is_duplicate(aln) && best_aln.is_overlap(aln) {
                second = Some(i);
            }
        }

        let Some(second_idx) = second else {
            return (None, 0);
        };

        let snp = self.snp_cost;
        let pe_max = pairs[second_idx].score;
        let pe_min = pe_max.saturating_sub(snp);
        let mut sub_count = pairs
            .iter()
            .filter(|p| p.score > pe_min && p.score <= pe_max)
            .count() as u32;

        let other = 1 - end;
        let other_best = unpaired[other]
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != best_pair.ends[other])
            .fold(self.min_score, |acc, (_, a)| acc.max(a.score));

        let se_max = pe_max
            .saturating_sub(other_best)
            .saturating_add(self.scaled_unpaired_penalty(avg_read_len));
        let se_min = se_max.saturating_sub(snp);
        sub_count += unpaired[end]
            .iter()
            .filter(|a| !a.unmapped && a.score > se_min && a.score <= se_max)
            .count() as u32;

        log::trace!(
            "end {}: second best pair #{} score={} other_best={} se_window=({}, {}] sub_count={}",
            end,
            second_idx,
            pe_max,
            other_best,
            se_min,
            se_max,
            sub_count
        );

        (Some(second_idx), sub_count)
    }

    /// Second-best among single-end candidates competing with
    /// `alignments[best_index]`, and the number of them within one SNP of it.
    ///
    /// Returns `(INVALID_SCORE, 0)` when nothing competes.
    pub fn find_second_best_single(&self, alignments: &[Alignment], best_index: usize) -> (Score, u32) {
        let Some(best) = alignments.get(best_index) else {
            return (INVALID_SCORE, 0);
        };
        let competing = || {
            alignments.iter().enumerate().filter(move |&(i, a)| {
                i != best_index && !a.unmapped && !best.is_duplicate(a) && best.is_overlap(a)
            })
        };

        let Some(max) = competing().map(|(_, a)| a.score).max() else {
            return (INVALID_SCORE, 0);
        };
        let min = max.saturating_sub(self.snp_cost);
        let count = competing()
            .filter(|(_, a)| a.score > min && a.score <= max)
            .count() as u32;
        (max, count)
    }

    /// Second-best pair score and competing score for one end of the best pair.
    ///
    /// The competing score is the larger of the single-end second best and the
    /// second-best pair's alignment at this end.
    pub fn find_second_best_score(
        &self,
        avg_read_len: u32,
        pairs: &[AlignmentPair],
        unpaired: &UnpairedAlignments,
        best: usize,
        end: usize,
    ) -> SecondBest {
        let (second, sub_count) = self.find_second_best(avg_read_len, pairs, unpaired, best, end);
        let (single_score, _) = self.find_second_best_single(&unpaired[end], pairs[best].ends[end]);

        match second {
            Some(s) => SecondBest {
                sub_count,
                pair_score: pairs[s].score,
                score: single_score.max(pair_alignment(unpaired, &pairs[s], end).score),
            },
            None => SecondBest {
                sub_count,
                pair_score: INVALID_SCORE,
                score: single_score,
            },
        }
    }
}
