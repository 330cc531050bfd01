//! Candidate alignments, pairs and the per-end candidate pools.

use std::ops::Index;

use super::seed_chain::SeedChain;
use crate::mapq::Mapq;

/// Alignment score in hardware score units; higher is better.
pub type Score = i32;

/// Sentinel for "no valid score".
pub const INVALID_SCORE: Score = i32::MIN;

/// One candidate placement of one read end.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Reference sequence ID (chromosome)
    pub ref_id: usize,
    /// Leftmost reference position (0-based, inclusive)
    pub pos: i64,
    /// Rightmost reference position (0-based, inclusive)
    pub ref_end: i64,
    /// First read base covered (0-based, inclusive)
    pub query_start: i32,
    /// One past the last read base covered
    pub query_end: i32,
    pub is_rev: bool,
    pub score: Score,
    pub mapq: Mapq,
    /// Second-best score reported for this end; `INVALID_SCORE` when unset
    pub xs: Score,
    pub unmapped: bool,
    /// Set upstream when this end alone is not trustworthy enough to report
    pub ineligible: bool,
    pub chain: Option<SeedChain>,
}

impl Alignment {
    /// Mapped candidate covering `[pos, ref_end]`; the read span defaults to
    /// the same number of bases starting at read position 0.
    pub fn mapped(ref_id: usize, pos: i64, ref_end: i64, is_rev: bool, score: Score) -> Self {
        Self {
            ref_id,
            pos,
            ref_end,
            query_start: 0,
            query_end: (ref_end - pos + 1).max(0) as i32,
            is_rev,
            score,
            mapq: 0,
            xs: INVALID_SCORE,
            unmapped: false,
            ineligible: false,
            chain: None,
        }
    }

    /// Placeholder for a read end with no placement.
    pub fn unmapped() -> Self {
        Self {
            ref_id: 0,
            pos: 0,
            ref_end: 0,
            query_start: 0,
            query_end: 0,
            is_rev: false,
            score: 0,
            mapq: 0,
            xs: INVALID_SCORE,
            unmapped: true,
            ineligible: false,
            chain: None,
        }
    }

    pub fn with_query_span(mut self, query_start: i32, query_end: i32) -> Self {
        self.query_start = query_start;
        self.query_end = query_end;
        self
    }

    pub fn with_chain(mut self, chain: SeedChain) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_ineligible(mut self, ineligible: bool) -> Self {
        self.ineligible = ineligible;
        self
    }

    /// Same placement: reference, both ends and strand agree.
    pub fn is_duplicate(&self, other: &Alignment) -> bool {
        if self.unmapped || other.unmapped {
            return self.unmapped && other.unmapped;
        }
        self.ref_id == other.ref_id
            && self.pos == other.pos
            && self.ref_end == other.ref_end
            && self.is_rev == other.is_rev
    }

    /// Both placements explain at least one common read base, i.e. they
    /// compete for the same part of the read.
    ///
    /// This compares read intervals, not reference positions, so a repeat
    /// copy elsewhere in the genome still counts as overlapping.
    pub fn is_overlap(&self, other: &Alignment) -> bool {
        if self.unmapped || other.unmapped {
            return false;
        }
        self.query_start.max(other.query_start) < self.query_end.min(other.query_end)
    }

    /// XS value for reporting, `None` when no valid second-best exists.
    pub fn xs(&self) -> Option<Score> {
        (self.xs != INVALID_SCORE).then_some(self.xs)
    }
}

/// Stable handle to an alignment inside `UnpairedAlignments`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlignmentId {
    pub end: usize,
    pub index: usize,
}

/// Two candidate alignments, one per read end, and their combined score.
///
/// The members are indices into the per-end pools of `UnpairedAlignments`;
/// two pairs sharing an index share the alignment itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentPair {
    pub ends: [usize; 2],
    /// `score(end0) + score(end1) - pairing penalty`
    pub score: Score,
    /// Whether the pair met the proper-pair criteria when it was built
    pub proper: bool,
}

impl AlignmentPair {
    pub fn new(end0: usize, end1: usize, score: Score) -> Self {
        Self {
            ends: [end0, end1],
            score,
            proper: false,
        }
    }

    pub fn id(&self, end: usize) -> AlignmentId {
        AlignmentId {
            end,
            index: self.ends[end],
        }
    }
}

/// Both reads of a pair; only their lengths matter for scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPair {
    pub lengths: [u32; 2],
}

impl ReadPair {
    pub fn new(len0: u32, len1: u32) -> Self {
        Self {
            lengths: [len0, len1],
        }
    }

    pub fn length_of(&self, end: usize) -> u32 {
        self.lengths[end]
    }

    /// Average read length, rounded down.
    pub fn length(&self) -> u32 {
        ((self.lengths[0] as u64 + self.lengths[1] as u64) / 2) as u32
    }
}

/// All single-end candidates for both read ends.
///
/// This is the owning arena for every `Alignment` of a read pair. Pairs only
/// hold indices into it, so MAPQ/XS written here is visible through every
/// pair that references the same candidate.
#[derive(Debug, Clone, Default)]
pub struct UnpairedAlignments {
    ends: [Vec<Alignment>; 2],
}

impl UnpairedAlignments {
    pub fn new(end0: Vec<Alignment>, end1: Vec<Alignment>) -> Self {
        Self { ends: [end0, end1] }
    }

    pub fn push(&mut self, end: usize, alignment: Alignment) -> AlignmentId {
        self.ends[end].push(alignment);
        AlignmentId {
            end,
            index: self.ends[end].len() - 1,
        }
    }

    pub fn end(&self, end: usize) -> &[Alignment] {
        &self.ends[end]
    }

    pub fn get(&self, id: AlignmentId) -> Option<&Alignment> {
        self.ends.get(id.end)?.get(id.index)
    }

    pub fn get_mut(&mut self, id: AlignmentId) -> Option<&mut Alignment> {
        self.ends.get_mut(id.end)?.get_mut(id.index)
    }

    pub fn len(&self) -> usize {
        self.ends[0].len() + self.ends[1].len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends[0].is_empty() && self.ends[1].is_empty()
    }
}

impl Index<usize> for UnpairedAlignments {
    type Output = [Alignment];

    fn index(&self, end: usize) -> &[Alignment] {
        &self.ends[end]
    }
}
