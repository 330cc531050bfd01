//! Seed chains backing candidate alignments.
//!
//! Chains are produced by the seeding/chaining stage; this crate only reads
//! their reference and read extents when computing the pairing penalty.

/// One exact seed match between read and reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedHit {
    /// Position in the reference sequence
    pub ref_pos: i64,
    /// Position in the read (0-based)
    pub read_pos: i32,
    /// Length of the seed
    pub len: i32,
}

/// Ordered seeds supporting one candidate placement.
///
/// Seeds are kept in read order. On the reverse strand the reference
/// coordinates still increase along the vector, because the read is
/// reverse-complemented before seeding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedChain {
    pub seeds: Vec<SeedHit>,
    pub is_rev: bool,
}

impl SeedChain {
    pub fn new(seeds: Vec<SeedHit>, is_rev: bool) -> Self {
        Self { seeds, is_rev }
    }

    /// Single-seed chain spanning `[ref_begin, ref_end]` on the reference.
    pub fn spanning(ref_begin: i64, ref_end: i64, read_begin: i32, is_rev: bool) -> Self {
        let len = (ref_end - ref_begin + 1).max(0) as i32;
        Self {
            seeds: vec![SeedHit {
                ref_pos: ref_begin,
                read_pos: read_begin,
                len,
            }],
            is_rev,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    pub fn is_reverse_complement(&self) -> bool {
        self.is_rev
    }

    /// Reference position of the first base of the first seed.
    pub fn first_reference_position(&self) -> i64 {
        self.seeds.first().map_or(0, |s| s.ref_pos)
    }

    /// Reference position of the last base of the last seed.
    pub fn last_reference_position(&self) -> i64 {
        self.seeds
            .last()
            .map_or(0, |s| s.ref_pos + s.len as i64 - 1)
    }

    pub fn first_read_base(&self) -> i32 {
        self.seeds.first().map_or(0, |s| s.read_pos)
    }

    pub fn last_read_base(&self) -> i32 {
        self.seeds.last().map_or(0, |s| s.read_pos + s.len - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_extents() {
        let chain = SeedChain::new(
            vec![
                SeedHit {
                    ref_pos: 1000,
                    read_pos: 0,
                    len: 30,
                },
                SeedHit {
                    ref_pos: 1050,
                    read_pos: 50,
                    len: 51,
                },
            ],
            false,
        );
        assert_eq!(chain.first_reference_position(), 1000);
        assert_eq!(chain.last_reference_position(), 1100);
        assert_eq!(chain.first_read_base(), 0);
        assert_eq!(chain.last_read_base(), 100);
        assert!(!chain.is_reverse_complement());
    }

    #[test]
    fn test_spanning_chain() {
        let chain = SeedChain::spanning(1300, 1400, 0, true);
        assert_eq!(chain.first_reference_position(), 1300);
        assert_eq!(chain.last_reference_position(), 1400);
        assert_eq!(chain.last_read_base(), 100);
        assert!(chain.is_reverse_complement());
    }

    #[test]
    fn test_empty_chain() {
        let chain = SeedChain::default();
        assert!(chain.is_empty());
        assert_eq!(chain.first_reference_position(), 0);
        assert_eq!(chain.last_reference_position(), 0);
    }
}
