//! Property-based tests for whole-alignment coordinate mapping
//!
//! Alignments are generated as MAF text and loaded through the reader, so
//! these tests cover ingestion and mapping together.

use multialn::{
    parse_maf_bytes, AlignmentRegistry, BitIndexKind, IngestOptions, IntervalBoundary, MappingError, StorageStrategy,
};
use proptest::prelude::*;
use std::fmt::Write;

const REFERENCE: &str = "ref.chr1";

/// One `s` row: name, start, strand, source length, columns
struct Row {
    name: String,
    start: u64,
    strand: char,
    source_length: u64,
    bits: Vec<bool>,
}

fn maf_text(blocks: &[Vec<Row>]) -> String {
    let mut out = String::from("##maf version=1\n\n");
    for rows in blocks {
        out.push_str("a score=0\n");
        for row in rows {
            let size = row.bits.iter().filter(|&&b| b).count();
            let text: String = row.bits.iter().map(|&b| if b { 'A' } else { '-' }).collect();
            writeln!(
                out,
                "s {} {} {} {} {} {}",
                row.name, row.start, size, row.strand, row.source_length, text
            )
            .unwrap();
        }
        out.push('\n');
    }
    out
}

fn load(strategy: StorageStrategy, blocks: &[Vec<Row>]) -> AlignmentRegistry {
    let mut registry = AlignmentRegistry::new(REFERENCE, strategy, BitIndexKind::Rank9);
    parse_maf_bytes(maf_text(blocks).as_bytes(), &mut registry, &IngestOptions::default()).unwrap();
    registry
}

fn ungapped(name: &str, start: u64, strand: char, source_length: u64, len: usize) -> Row {
    Row {
        name: name.to_string(),
        start,
        strand,
        source_length,
        bits: vec![true; len],
    }
}

/// One block: reference columns plus informant columns of the same width
fn arb_block() -> impl Strategy<Value = (Vec<bool>, Vec<Vec<bool>>)> {
    (2usize..40).prop_flat_map(|width| {
        (
            prop::collection::vec(any::<bool>(), width).prop_filter("reference base", |b| b.iter().any(|&x| x)),
            prop::collection::vec(prop::collection::vec(any::<bool>(), width), 1..4),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: map_position_to_all contains an informant iff the single
    /// mapping to that informant succeeds, with the same answer
    #[test]
    fn prop_map_all_matches_single((reference, informants) in arb_block(), start in 0u64..1000, end_boundary in any::<bool>()) {
        let mut rows = vec![Row { name: REFERENCE.into(), start, strand: '+', source_length: 5000, bits: reference.clone() }];
        for (i, bits) in informants.iter().enumerate() {
            let strand = if i % 2 == 0 { '+' } else { '-' };
            rows.push(Row { name: format!("inf{}.chr{}", i, i), start: 100, strand, source_length: 5000, bits: bits.clone() });
        }
        let registry = load(StorageStrategy::OrderedScan, &[rows]);
        let boundary = if end_boundary { IntervalBoundary::End } else { IntervalBoundary::Begin };
        let size = reference.iter().filter(|&&b| b).count() as u64;

        for position in start..start + size {
            let all = registry.map_position_to_all(position, boundary).unwrap();
            for i in 0..informants.len() {
                let name = format!("inf{}.chr{}", i, i);
                let single = registry.map_position_to_informant(position, &name, boundary);
                prop_assert_eq!(all.get(name.as_str()).copied(), single.clone().ok(), "{} at {}", name, position);
                if let Err(e) = single {
                    prop_assert!(e.is_miss());
                }
            }
        }
    }

    /// Property: a forward informant across three ungapped blocks maps the
    /// whole span collinearly
    #[test]
    fn prop_forward_region_collinear(
        lens in prop::collection::vec(2usize..30, 3),
        ref_gaps in prop::collection::vec(0u64..20, 3),
        inf_gaps in prop::collection::vec(0u64..20, 3),
    ) {
        let mut blocks = Vec::new();
        let (mut r, mut q) = (0, 500);
        for i in 0..3 {
            r += ref_gaps[i];
            q += inf_gaps[i];
            blocks.push(vec![
                ungapped(REFERENCE, r, '+', 10_000, lens[i]),
                ungapped("inf.chr2", q, '+', 10_000, lens[i]),
            ]);
            r += lens[i] as u64;
            q += lens[i] as u64;
        }
        let ref_start = ref_gaps[0];
        let inf_start = 500 + inf_gaps[0];

        for strategy in [StorageStrategy::OrderedScan, StorageStrategy::RankIndexed] {
            let registry = load(strategy, &blocks);
            prop_assert_eq!(
                registry.map_region_to_informant(ref_start, r - 1, "inf.chr2"),
                Ok((inf_start, q - 1))
            );
            // A start before the alignment widens to the first block
            prop_assert_eq!(
                registry.map_region_to_informant(0, r - 1, "inf.chr2"),
                Ok((inf_start, q - 1))
            );
            // The end is never widened
            prop_assert_eq!(
                registry.map_region_to_informant(0, r + 100, "inf.chr2"),
                Err(MappingError::OutOfRange { position: r + 100 })
            );
        }
    }

    /// Property: an informant that jumps backwards between blocks is rejected
    #[test]
    fn prop_reversal_rejected(len0 in 2usize..30, len1 in 2usize..30, back in 1u64..50) {
        let blocks = vec![
            vec![ungapped(REFERENCE, 10, '+', 10_000, len0), ungapped("inf.chr2", 1000, '+', 10_000, len0)],
            vec![
                ungapped(REFERENCE, 10 + len0 as u64, '+', 10_000, len1),
                ungapped("inf.chr2", 1000 - len1 as u64 - back, '+', 10_000, len1),
            ],
        ];
        let registry = load(StorageStrategy::RankIndexed, &blocks);
        let end = 10 + (len0 + len1) as u64 - 1;
        prop_assert_eq!(
            registry.map_region_to_informant(10, end, "inf.chr2"),
            Err(MappingError::NonCollinear { start: 10, end })
        );
    }

    /// Property: the parallel batch gives the sequential answers in order
    #[test]
    fn prop_batch_matches_sequential((reference, informants) in arb_block(), threads in 1usize..4) {
        let mut rows = vec![Row { name: REFERENCE.into(), start: 0, strand: '+', source_length: 5000, bits: reference.clone() }];
        for (i, bits) in informants.iter().enumerate() {
            rows.push(Row { name: format!("inf{}", i), start: 7, strand: '+', source_length: 5000, bits: bits.clone() });
        }
        let registry = load(StorageStrategy::RankIndexed, &[rows]);

        let queries: Vec<(String, u64)> = (0..reference.len() as u64 + 2)
            .flat_map(|p| (0..informants.len()).map(move |i| (format!("inf{}", i), p)))
            .collect();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
        let batch = pool.install(|| registry.map_positions_to_informant(&queries, IntervalBoundary::Begin));

        prop_assert_eq!(batch.len(), queries.len());
        for ((name, p), result) in queries.iter().zip(batch) {
            prop_assert_eq!(result, registry.map_position_to_informant(*p, name, IntervalBoundary::Begin));
        }
    }
}

#[test]
fn test_reverse_informant_across_blocks() {
    // Informant on the minus strand, walking downwards through both blocks
    let blocks = vec![
        vec![ungapped(REFERENCE, 0, '+', 100, 5), ungapped("inf.chr3", 10, '-', 100, 5)],
        vec![ungapped(REFERENCE, 8, '+', 100, 5), ungapped("inf.chr3", 15, '-', 100, 5)],
    ];
    let registry = load(StorageStrategy::OrderedScan, &blocks);
    // Strand offsets 10..14 are forward 89..85, then 15..19 are 84..80
    assert_eq!(registry.map_region_to_informant(0, 12, "inf.chr3"), Ok((89, 80)));
    assert_eq!(registry.map_region_to_informant(1, 9, "inf.chr3"), Ok((88, 83)));
    // Region ending in the gap between blocks is rejected
    assert_eq!(
        registry.map_region_to_informant(0, 6, "inf.chr3"),
        Err(MappingError::OutOfRange { position: 6 })
    );
    // Start in the gap widens to the first block
    assert_eq!(registry.map_region_to_informant(6, 9, "inf.chr3"), Ok((89, 83)));
}

#[test]
fn test_sampled_positions_all_map() {
    let blocks = vec![
        vec![ungapped(REFERENCE, 0, '+', 1000, 50), ungapped("a.chr1", 0, '+', 1000, 50)],
        vec![ungapped(REFERENCE, 100, '+', 1000, 50), ungapped("b.chr1", 0, '-', 1000, 50)],
    ];
    let registry = load(StorageStrategy::RankIndexed, &blocks);
    let samples = registry.sample_positions(7);
    // 0, 7, ..., 49 in each block
    assert_eq!(samples.len(), 16);
    for (name, position) in samples {
        assert!(registry
            .map_position_to_informant(position, name, IntervalBoundary::Begin)
            .is_ok());
    }
}
