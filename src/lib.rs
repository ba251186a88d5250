//! multialn - coordinate mapping over multiple sequence alignments
//!
//! Maps positions and intervals of a reference sequence to any informant
//! sequence of a whole-genome multiple alignment, using one succinct
//! rank/select bit vector per alignment file.
//!
//! # Features
//!
//! - Sublinear position lookup with two block index strategies
//! - Interchangeable bit-vector encodings from `sucds`
//! - Region mapping with collinearity checking
//! - MAF input, plain or compressed (gzip, bzip2)
//! - Parallel batch mapping with rayon
//!
//! # Example
//!
//! ```ignore
//! use multialn::{read_maf_file, AlignmentRegistry, BitIndexKind, IngestOptions, IntervalBoundary, StorageStrategy};
//!
//! let mut registry = AlignmentRegistry::new("hg19.chr1", StorageStrategy::RankIndexed, BitIndexKind::Rank9);
//! read_maf_file("chr1.maf.gz".as_ref(), &mut registry, &IngestOptions::default())?;
//!
//! let pos = registry.map_position_to_informant(1_000_000, "mm10.chr4", IntervalBoundary::Begin)?;
//! ```

pub mod core;
pub mod formats;

// Re-export commonly used types
pub use core::{
    AlignmentBlock, AlignmentRegistry, BitIndex, BitIndexKind, BlockIndex, ErrorKind,
    IntervalBoundary, MappingError, MappingResult, MultialnError, Result, SequenceId,
    SequenceRegion, StorageStrategy, Strand,
};
pub use formats::{load_alignment, parse_maf_bytes, read_maf, read_maf_file, IngestOptions, MafParseError, MafStats};
