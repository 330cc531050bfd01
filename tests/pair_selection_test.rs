//! Integration tests for best-pair selection and MAPQ/XS assignment
//!
//! Candidates are built the way the candidate-generation stage hands them
//! over: one pool per read end, each alignment carrying its seed chain.

use pairmapq::alignment::INVALID_SCORE;
use pairmapq::mapq::{MAPQ_MAX, compute_mapq, saturate_mapq};
use pairmapq::{
    Alignment, AlignmentPair, InsertSizeParameters, Orientation, PairBuilder, PairOpt, ReadPair,
    SeedChain, UnpairedAlignments,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn placed(ref_id: usize, pos: i64, is_rev: bool, score: i32) -> Alignment {
    Alignment::mapped(ref_id, pos, pos + 99, is_rev, score)
        .with_chain(SeedChain::spanning(pos, pos + 99, 0, is_rev))
}

fn fr_params() -> InsertSizeParameters {
    InsertSizeParameters::new(Orientation::Fr, 400.0, 40.0)
}

#[test]
fn test_unique_pair_gets_high_mapq() {
    let builder = PairBuilder::default();
    let read_pair = ReadPair::new(150, 150);
    let mut unpaired = UnpairedAlignments::new(
        vec![placed(0, 1000, false, 140)],
        vec![placed(0, 1300, true, 140)],
    );

    let pairs = builder.build_pairs(&fr_params(), &read_pair, &unpaired);
    let best = builder.pick_best(&read_pair, &pairs, &mut unpaired);

    assert_eq!(best, Some(0));
    for end in 0..2 {
        let aln = &unpaired[end][0];
        assert_eq!(aln.mapq, 750, "end {end}");
        assert_eq!(saturate_mapq(aln.mapq, MAPQ_MAX), MAPQ_MAX);
        assert_eq!(aln.xs(), None);
    }
}

#[test]
fn test_repeat_pair_is_ambiguous() {
    let builder = PairBuilder::default();
    let read_pair = ReadPair::new(150, 150);
    let mut unpaired = UnpairedAlignments::new(
        vec![placed(0, 1000, false, 140), placed(0, 50_000, false, 140)],
        vec![placed(0, 1300, true, 140), placed(0, 50_300, true, 140)],
    );

    let pairs = builder.build_pairs(&fr_params(), &read_pair, &unpaired);
    let scores: Vec<i32> = pairs.iter().map(|p| p.score).collect();
    assert_eq!(scores, vec![280, 253, 253, 280]);

    // first of the two equal copies wins
    assert_eq!(builder.pick_best(&read_pair, &pairs, &mut unpaired), Some(0));

    for end in 0..2 {
        let aln = &unpaired[end][0];
        // zero score gap, two pairs within one SNP -> 0 - int(3 * log2(2))
        assert_eq!(aln.mapq, -3, "end {end}");
        assert_eq!(saturate_mapq(aln.mapq, MAPQ_MAX), 0);
        assert_eq!(aln.xs(), Some(140));
    }
}

#[test]
fn test_pair_rescues_weak_end() {
    // end 1 alone cannot tell its two placements apart; the pair can
    let builder = PairBuilder::default();
    let read_pair = ReadPair::new(150, 150);
    let mut unpaired = UnpairedAlignments::new(
        vec![placed(0, 1000, false, 140)],
        vec![placed(0, 1300, true, 120), placed(2, 9_000, true, 120)],
    );

    let pairs = builder.build_pairs(&fr_params(), &read_pair, &unpaired);
    assert!(pairs[0].proper);
    assert!(!pairs[1].proper);
    assert_eq!(builder.pick_best(&read_pair, &pairs, &mut unpaired), Some(0));

    let mate = &unpaired[1][0];
    assert_eq!(mate.xs(), Some(120));
    assert_eq!(
        mate.mapq,
        compute_mapq(5, pairs[0].score, pairs[1].score, 150.0)
    );
    assert!(mate.mapq > 0);
}

#[test]
fn test_unmapped_mate() {
    let builder = PairBuilder::new(&PairOpt::default());
    let read_pair = ReadPair::new(150, 150);
    // XS left over from an earlier selection over the same pool
    let mut mate = Alignment::unmapped();
    mate.xs = 77;
    let mut unpaired = UnpairedAlignments::new(vec![placed(0, 1000, false, 140)], vec![mate]);

    let pairs = builder.build_pairs(&fr_params(), &read_pair, &unpaired);
    assert_eq!(pairs.len(), 1);
    assert_eq!(builder.pick_best(&read_pair, &pairs, &mut unpaired), Some(0));
    assert_eq!(unpaired[1][0].mapq, 0);
    assert_eq!(unpaired[1][0].xs, INVALID_SCORE);
    assert_eq!(unpaired[1][0].xs(), None);
    assert!(unpaired[0][0].mapq > 0);
}

#[test]
fn test_ineligible_pair_is_not_reported() {
    let builder = PairBuilder::default();
    let read_pair = ReadPair::new(150, 150);
    let mut unpaired = UnpairedAlignments::new(
        vec![placed(0, 1000, false, 140).with_ineligible(true)],
        vec![placed(0, 1300, true, 140).with_ineligible(true)],
    );
    let pairs = vec![AlignmentPair::new(0, 0, 280)];
    assert_eq!(builder.pick_best(&read_pair, &pairs, &mut unpaired), None);
    assert_eq!(unpaired[0][0].mapq, 0);
    assert_eq!(unpaired[1][0].mapq, 0);
}

#[test]
fn test_random_pools_pick_first_maximal_pair() {
    let builder = PairBuilder::default();
    let params = fr_params();
    let read_pair = ReadPair::new(150, 150);
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..200 {
        let mut ends: [Vec<Alignment>; 2] = [Vec::new(), Vec::new()];
        for end in ends.iter_mut() {
            for _ in 0..rng.gen_range(1..6) {
                if rng.gen_bool(0.1) {
                    end.push(Alignment::unmapped());
                } else {
                    let pos = rng.gen_range(0..5_000i64);
                    end.push(placed(0, pos, rng.gen_bool(0.5), rng.gen_range(20..150)));
                }
            }
        }
        let [end0, end1] = ends;
        let mut unpaired = UnpairedAlignments::new(end0, end1);
        let pairs = builder.build_pairs(&params, &read_pair, &unpaired);
        assert_eq!(pairs.len(), unpaired[0].len() * unpaired[1].len());

        let best = builder
            .pick_best(&read_pair, &pairs, &mut unpaired)
            .expect("eligible candidates always yield a pair");
        let max = pairs.iter().map(|p| p.score).max().unwrap();
        assert_eq!(pairs[best].score, max);
        assert!(pairs[..best].iter().all(|p| p.score < max));

        for end in 0..2 {
            let aln = &unpaired[end][pairs[best].ends[end]];
            if aln.unmapped {
                assert_eq!(aln.mapq, 0);
                assert_eq!(aln.xs(), None);
            }
            if let Some(xs) = aln.xs() {
                assert!(xs >= builder.min_score);
            }
        }
    }
}
