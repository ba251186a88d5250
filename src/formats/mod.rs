//! Alignment file readers

pub mod maf;

pub use maf::{
    load_alignment, parse_maf_bytes, read_maf, read_maf_file, IngestOptions, MafParseError, MafParseErrorKind,
    MafRecord, MafStats,
};
