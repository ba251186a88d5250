//! Property-based tests for the block index strategies
//!
//! Ordered-scan and rank-indexed lookups must agree on every position,
//! whatever order the blocks were inserted in.

use multialn::core::{
    AlignmentBlock, BitIndexArena, BitIndexKind, BlockIndex, IndexState, SequenceId, StorageStrategy, Strand,
};
use proptest::prelude::*;

/// Reference start and column pattern of one block
type BlockSpec = (u64, Vec<bool>);

/// Non-overlapping blocks, each with at least one reference base
fn arb_blocks() -> impl Strategy<Value = Vec<BlockSpec>> {
    prop::collection::vec(
        (
            0u64..40,
            prop::collection::vec(any::<bool>(), 1..30).prop_filter("needs a base", |b| b.iter().any(|&x| x)),
        ),
        1..12,
    )
    .prop_map(|specs| {
        let mut next = 0;
        specs
            .into_iter()
            .map(|(gap, bits)| {
                let start = next + gap;
                next = start + bits.iter().filter(|&&b| b).count() as u64;
                (start, bits)
            })
            .collect::<Vec<_>>()
    })
    .prop_shuffle()
}

fn build(strategy: StorageStrategy, kind: BitIndexKind, specs: &[BlockSpec]) -> (BitIndexArena, Box<dyn BlockIndex>) {
    let mut arena = BitIndexArena::new();
    let mut assembly = arena.begin_assembly();
    let mut index = strategy.build(kind);
    for (start, bits) in specs {
        let mut block = AlignmentBlock::new();
        block.add_sequence(assembly.append_bits(SequenceId::REFERENCE, *start, Strand::Plus, 10_000, bits.iter().copied()));
        index.add_block(block).unwrap();
    }
    arena.finish_assembly(assembly, &kind);
    (arena, index)
}

fn covering(specs: &[BlockSpec], position: u64) -> Option<u64> {
    specs
        .iter()
        .map(|(start, bits)| (*start, *start + bits.iter().filter(|&&b| b).count() as u64))
        .find(|&(lo, hi)| lo <= position && position < hi)
        .map(|(lo, _)| lo)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: both strategies find the same block for every position,
    /// and it is the block that covers the position
    #[test]
    fn prop_strategies_agree(specs in arb_blocks()) {
        let (_, ordered) = build(StorageStrategy::OrderedScan, BitIndexKind::Rank9, &specs);
        let (_, ranked) = build(StorageStrategy::RankIndexed, BitIndexKind::Rank9, &specs);
        let extent = specs.iter().map(|(s, b)| s + b.len() as u64).max().unwrap_or(0) + 5;

        for position in 0..extent {
            let a = ordered.lookup(position).map(|b| b.reference_start().unwrap());
            let b = ranked.lookup(position).map(|b| b.reference_start().unwrap());
            prop_assert_eq!(&a, &b, "position {}", position);
            prop_assert_eq!(a.ok(), covering(&specs, position), "position {}", position);
            prop_assert_eq!(ordered.locate(position), ranked.locate(position));
        }
    }

    /// Property: iteration yields blocks in ascending reference order
    #[test]
    fn prop_iteration_sorted(specs in arb_blocks(), encoding in 0usize..4) {
        let kind = BitIndexKind::all()[encoding];
        for strategy in [StorageStrategy::OrderedScan, StorageStrategy::RankIndexed] {
            let (_, index) = build(strategy, kind, &specs);
            prop_assert_eq!(index.state(), IndexState::Dirty);
            let starts: Vec<u64> = index.iter().map(|b| b.reference_start().unwrap()).collect();
            prop_assert_eq!(index.state(), IndexState::Prepared);

            let mut expected: Vec<u64> = specs.iter().map(|(s, _)| *s).collect();
            expected.sort_unstable();
            prop_assert_eq!(starts, expected);
        }
    }
}

#[test]
fn test_adding_block_resets_state() {
    let specs = vec![(12, vec![true, true]), (30, vec![true])];
    let (mut arena, mut index) = build(StorageStrategy::RankIndexed, BitIndexKind::DArray, &specs);
    assert!(index.lookup(12).is_ok());
    assert_eq!(index.state(), IndexState::Prepared);

    let mut assembly = arena.begin_assembly();
    let mut block = AlignmentBlock::new();
    block.add_sequence(assembly.append_bits(SequenceId::REFERENCE, 20, Strand::Plus, 10_000, [true; 3]));
    arena.finish_assembly(assembly, &BitIndexKind::DArray);
    index.add_block(block).unwrap();

    assert_eq!(index.state(), IndexState::Dirty);
    assert_eq!(index.lookup(21).unwrap().reference_start(), Ok(20));
    assert_eq!(index.len(), 3);
}
