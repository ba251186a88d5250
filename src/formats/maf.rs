//! MAF (Multiple Alignment Format) reader
//!
//! Builds an [`AlignmentRegistry`] from `a` paragraphs and their `s` rows.
//! All rows of one file share a single bit string, finalized once the file
//! has been read.
//!
//! ```text
//! a score=5062.0
//! s hg18.chr7    27699739 6 + 158545518 TAAAGA
//! s panTro1.chr6 28862317 6 + 161576975 TAAAGA
//! ```
//!
//! Paragraphs that do not start with an `a` line are skipped with a warning.
//! `i`, `e` and `q` rows are accepted and ignored.

use crate::core::bits::{BitAssembly, BitIndexKind};
use crate::core::block::AlignmentBlock;
use crate::core::io::{open_input, ByteLineIterator};
use crate::core::registry::AlignmentRegistry;
use crate::core::region::Strand;
use crate::core::storage::StorageStrategy;
use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

/// Error type for MAF parsing
#[derive(Debug, Clone)]
pub struct MafParseError {
    /// Human-readable error message
    pub message: String,
    /// Line number where the error occurred (1-based)
    pub line_number: Option<usize>,
    pub kind: MafParseErrorKind,
    /// Start of the offending line, if available
    pub content: Option<String>,
}

/// Specific kinds of MAF parsing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MafParseErrorKind {
    /// Line inside an alignment paragraph is not a known row type
    InvalidLine,
    /// `s` row with fewer than six fields after the marker
    MissingField,
    InvalidNumber,
    /// Strand must be '+' or '-'
    InvalidStrand,
    InvalidUtf8,
    /// Declared size differs from the non-gap columns of the row
    SizeMismatch,
    /// Row width differs from the first row of the paragraph
    ColumnMismatch,
    /// `start + size` exceeds the source length
    OutOfBounds,
    /// More distinct sequence names than identifiers
    TooManySequences,
    IoError,
}

impl std::fmt::Display for MafParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line_number {
            Some(line) => write!(f, "Line {}: {}", line, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for MafParseError {}

impl MafParseError {
    pub fn with_context(
        message: impl Into<String>,
        line_number: usize,
        kind: MafParseErrorKind,
        content: Option<&str>,
    ) -> Self {
        Self {
            message: message.into(),
            line_number: Some(line_number),
            kind,
            content: content.map(|c| c.chars().take(100).collect()),
        }
    }

    pub fn invalid_line(line_number: usize, content: &str) -> Self {
        Self::with_context(
            "Unexpected line inside alignment paragraph",
            line_number,
            MafParseErrorKind::InvalidLine,
            Some(content),
        )
    }

    pub fn missing_field(field: &str, line_number: usize, content: &str) -> Self {
        Self::with_context(
            format!("Missing {} field in sequence row", field),
            line_number,
            MafParseErrorKind::MissingField,
            Some(content),
        )
    }

    pub fn invalid_number(field: &str, value: &str, line_number: usize) -> Self {
        Self::with_context(
            format!("Invalid {} value '{}': expected a non-negative integer", field, value),
            line_number,
            MafParseErrorKind::InvalidNumber,
            None,
        )
    }

    pub fn invalid_strand(value: &str, line_number: usize) -> Self {
        Self::with_context(
            format!("Invalid strand '{}', expected '+' or '-'", value),
            line_number,
            MafParseErrorKind::InvalidStrand,
            None,
        )
    }

    pub fn is_kind(&self, kind: MafParseErrorKind) -> bool {
        self.kind == kind
    }
}

impl From<std::io::Error> for MafParseError {
    fn from(e: std::io::Error) -> Self {
        Self {
            message: format!("IO error: {}", e),
            line_number: None,
            kind: MafParseErrorKind::IoError,
            content: None,
        }
    }
}

/// One `s` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MafRecord<'a> {
    pub name: &'a str,
    /// Start in the row strand's own coordinates
    pub start: u64,
    /// Number of non-gap columns
    pub size: u64,
    pub strand: Strand,
    pub source_length: u64,
    /// Alignment text, `-` marks a gap
    pub text: &'a [u8],
}

impl<'a> MafRecord<'a> {
    /// Parse `s name start size strand source_length text`
    pub fn parse(line: &'a str, line_number: usize) -> Result<Self, MafParseError> {
        let mut fields = line.split_ascii_whitespace();
        if fields.next() != Some("s") {
            return Err(MafParseError::invalid_line(line_number, line));
        }
        let mut next = |field: &str| {
            fields
                .next()
                .ok_or_else(|| MafParseError::missing_field(field, line_number, line))
        };
        let name = next("name")?;
        let start = next("start")?;
        let size = next("size")?;
        let strand = next("strand")?;
        let source_length = next("source size")?;
        let text = next("text")?.as_bytes();

        let number = |field: &str, value: &str| {
            value
                .parse::<u64>()
                .map_err(|_| MafParseError::invalid_number(field, value, line_number))
        };
        let strand = match strand.as_bytes() {
            [b] => Strand::from_byte(*b),
            _ => None,
        }
        .ok_or_else(|| MafParseError::invalid_strand(strand, line_number))?;

        let record = Self {
            name,
            start: number("start", start)?,
            size: number("size", size)?,
            strand,
            source_length: number("source size", source_length)?,
            text,
        };

        let bases = record.columns() - record.gaps();
        if bases as u64 != record.size {
            return Err(MafParseError::with_context(
                format!(
                    "Sequence {} declares {} bases but its text has {}",
                    name, record.size, bases
                ),
                line_number,
                MafParseErrorKind::SizeMismatch,
                Some(line),
            ));
        }
        match record.start.checked_add(record.size) {
            Some(stop) if stop <= record.source_length => Ok(record),
            _ => Err(MafParseError::with_context(
                format!(
                    "Sequence {} spans {}+{} past its length {}",
                    name, record.start, record.size, record.source_length
                ),
                line_number,
                MafParseErrorKind::OutOfBounds,
                Some(line),
            )),
        }
    }

    pub fn columns(&self) -> usize {
        self.text.len()
    }

    pub fn gaps(&self) -> usize {
        memchr::memchr_iter(b'-', self.text).count()
    }
}

/// Ingestion settings
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Only rows of these sequences are kept; `None` keeps all
    pub limit: Option<HashSet<String>>,
    /// Encoding of the finalized bit index
    pub encoding: BitIndexKind,
}

impl IngestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.limit = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_encoding(mut self, encoding: BitIndexKind) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn accepts(&self, name: &str) -> bool {
        self.limit.as_ref().map_or(true, |limit| limit.contains(name))
    }
}

/// Counters collected while reading one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MafStats {
    /// Blocks added to the registry
    pub blocks: usize,
    /// `s` rows kept
    pub rows: usize,
    /// `s` rows dropped by the whitelist
    pub filtered_rows: usize,
    /// Paragraphs not starting with an `a` line
    pub skipped_paragraphs: usize,
    /// Paragraphs without a reference row
    pub skipped_blocks: usize,
    /// Alignment columns stored
    pub columns: usize,
}

enum Paragraph {
    Outside,
    Alignment { block: AlignmentBlock, width: Option<usize> },
    Skipping,
}

/// Read a MAF stream into `registry`
///
/// The file's bit index is finalized even when parsing fails part way, so
/// blocks added before the error stay queryable.
pub fn read_maf<R: BufRead>(
    reader: R,
    registry: &mut AlignmentRegistry,
    options: &IngestOptions,
) -> Result<MafStats, MafParseError> {
    let mut assembly = registry.begin_assembly();
    let mut stats = MafStats::default();
    let result = ingest(reader, registry, &mut assembly, options, &mut stats);

    stats.columns = assembly.len();
    registry.finish_assembly(assembly, &options.encoding);
    result?;

    log::info!(
        "Read {} alignment blocks ({} rows, {} columns) over {} sequences",
        stats.blocks,
        stats.rows,
        stats.columns,
        registry.count_known_sequences()
    );
    if stats.skipped_paragraphs + stats.skipped_blocks > 0 {
        log::warn!(
            "Skipped {} malformed paragraphs and {} blocks without {}",
            stats.skipped_paragraphs,
            stats.skipped_blocks,
            registry.reference_name()
        );
    }
    Ok(stats)
}

fn ingest<R: BufRead>(
    reader: R,
    registry: &mut AlignmentRegistry,
    assembly: &mut BitAssembly,
    options: &IngestOptions,
    stats: &mut MafStats,
) -> Result<(), MafParseError> {
    let mut lines = ByteLineIterator::new(reader);
    let mut state = Paragraph::Outside;
    let mut line_number = 0;

    while let Some(line) = lines.next_line() {
        let line = line?;
        line_number += 1;

        if line.iter().all(u8::is_ascii_whitespace) {
            if let Paragraph::Alignment { block, .. } = std::mem::replace(&mut state, Paragraph::Outside) {
                commit_block(block, registry, stats);
            }
            continue;
        }
        if line[0] == b'#' {
            continue;
        }

        if let Paragraph::Alignment { block, width } = &mut state {
            let text = std::str::from_utf8(line).map_err(|_| {
                MafParseError::with_context(
                    "Invalid UTF-8 in alignment row",
                    line_number,
                    MafParseErrorKind::InvalidUtf8,
                    None,
                )
            })?;
            if is_row(line, b's') {
                let record = MafRecord::parse(text, line_number)?;
                let expected = *width.get_or_insert(record.columns());
                if expected != record.columns() {
                    return Err(MafParseError::with_context(
                        format!(
                            "Sequence {} has {} columns, expected {}",
                            record.name,
                            record.columns(),
                            expected
                        ),
                        line_number,
                        MafParseErrorKind::ColumnMismatch,
                        None,
                    ));
                }
                if !options.accepts(record.name) {
                    stats.filtered_rows += 1;
                    continue;
                }
                let id = registry
                    .request_sequence_id(record.name, record.source_length)
                    .map_err(|e| {
                        MafParseError::with_context(
                            e.to_string(),
                            line_number,
                            MafParseErrorKind::TooManySequences,
                            None,
                        )
                    })?;
                block.add_sequence(assembly.append_region(
                    id,
                    record.start,
                    record.strand,
                    record.source_length,
                    record.text,
                ));
                stats.rows += 1;
            } else if !(is_row(line, b'i') || is_row(line, b'e') || is_row(line, b'q')) {
                return Err(MafParseError::invalid_line(line_number, text));
            }
            continue;
        }

        if matches!(state, Paragraph::Outside) {
            if is_row(line, b'a') {
                state = Paragraph::Alignment {
                    block: AlignmentBlock::new(),
                    width: None,
                };
            } else if !line.starts_with(b"track") {
                log::warn!("Line {}: paragraph does not start with an 'a' line, skipping it", line_number);
                stats.skipped_paragraphs += 1;
                state = Paragraph::Skipping;
            }
        }
    }

    if let Paragraph::Alignment { block, .. } = state {
        commit_block(block, registry, stats);
    }
    Ok(())
}

/// Whether `line` is a row of the given one-letter type
fn is_row(line: &[u8], marker: u8) -> bool {
    line.first() == Some(&marker) && line.get(1).map_or(true, u8::is_ascii_whitespace)
}

fn commit_block(block: AlignmentBlock, registry: &mut AlignmentRegistry, stats: &mut MafStats) {
    if block.get_reference_sequence().is_err() {
        stats.skipped_blocks += 1;
        return;
    }
    match registry.add_block(block) {
        Ok(()) => stats.blocks += 1,
        Err(e) => {
            log::warn!("Dropping alignment block: {}", e);
            stats.skipped_blocks += 1;
        }
    }
}

/// Read a MAF file, transparently decompressing gzip and bzip2
pub fn read_maf_file(
    path: &Path,
    registry: &mut AlignmentRegistry,
    options: &IngestOptions,
) -> Result<MafStats, MafParseError> {
    let reader = open_input(path).map_err(|e| MafParseError {
        message: format!("Cannot open {}: {}", path.display(), e),
        line_number: None,
        kind: MafParseErrorKind::IoError,
        content: None,
    })?;
    read_maf(reader, registry, options)
}

/// Load a whole alignment file into a new registry, prepared for queries
pub fn load_alignment(
    path: &Path,
    reference: &str,
    strategy: StorageStrategy,
    options: &IngestOptions,
) -> crate::Result<(AlignmentRegistry, MafStats)> {
    let reader = open_input(path)?;
    let mut registry = AlignmentRegistry::new(reference, strategy, options.encoding);
    let stats = read_maf(reader, &mut registry, options)?;
    registry.prepare();
    Ok((registry, stats))
}

/// Read MAF text from memory
pub fn parse_maf_bytes(
    data: &[u8],
    registry: &mut AlignmentRegistry,
    options: &IngestOptions,
) -> Result<MafStats, MafParseError> {
    read_maf(data, registry, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bits::BitIndexArena;
    use crate::core::MappingError;
    use crate::core::region::{IntervalBoundary, SequenceId};
    use crate::core::storage::StorageStrategy;

    const TEST_LINE: &str =
        "s hg18.chr7    27578828 38 + 158545518 AAA-GGGAATGTTAACCAAATGA---ATTGTCTCTTACGGTG";

    const TEST_FILE: &str = "track name=euArc visibility=pack
##maf version=1 scoring=tba.v8
# tba.v8 (((human chimp) baboon) (mouse rat))

a score=23262.0
s hg18.chr7    27578828 38 + 158545518 AAA-GGGAATGTTAACCAAATGA---ATTGTCTCTTACGGTG
s panTro1.chr6 28741140 38 + 161576975 AAA-GGGAATGTTAACCAAATGA---ATTGTCTCTTACGGTG
s baboon         116834 38 +   4622798 AAA-GGGAATGTTAACCAAATGA---GTTGTCTCTTATGGTG
s mm4.chr6     53215344 38 + 151104725 -AATGGGAATGTTAAGCAAACGA---ATTGTCTCTCAGTGTG
s rn3.chr4     81344243 40 + 187371129 -AA-GGGGATGCTAAGCCAATGAGTTGTTGTCTCTCAATGTG

a score=5062.0
s hg18.chr7    27699739 6 + 158545518 TAAAGA
s panTro1.chr6 28862317 6 + 161576975 TAAAGA
s baboon         241163 6 +   4622798 TAAAGA
s mm4.chr6     53303881 6 + 151104725 TAAAGA
s rn3.chr4     81444246 6 + 187371129 taagga

a score=6636.0
s hg18.chr7    27707221 13 + 158545518 gcagctgaaaaca
s panTro1.chr6 28869787 13 + 161576975 gcagctgaaaaca
s baboon         249182 13 +   4622798 gcagctgaaaaca
s mm4.chr6     53310102 13 + 151104725 ACAGCTGAAAATA
";

    fn load(data: &str, options: &IngestOptions) -> (AlignmentRegistry, Result<MafStats, MafParseError>) {
        let mut registry = AlignmentRegistry::new("hg18.chr7", StorageStrategy::OrderedScan, BitIndexKind::Rank9);
        let result = parse_maf_bytes(data.as_bytes(), &mut registry, options);
        (registry, result)
    }

    #[test]
    fn test_record_parse() {
        let record = MafRecord::parse(TEST_LINE, 1).unwrap();
        assert_eq!(record.name, "hg18.chr7");
        assert_eq!(record.start, 27578828);
        assert_eq!(record.size, 38);
        assert_eq!(record.strand, Strand::Plus);
        assert_eq!(record.source_length, 158545518);
        assert_eq!(record.columns(), 42);
        assert_eq!(record.gaps(), 4);
    }

    #[test]
    fn test_record_columns_map() {
        let record = MafRecord::parse(TEST_LINE, 1).unwrap();
        let mut arena = BitIndexArena::new();
        let mut assembly = arena.begin_assembly();
        let region = assembly.append_region(
            SequenceId::REFERENCE,
            record.start,
            record.strand,
            record.source_length,
            record.text,
        );
        arena.finish_assembly(assembly, &BitIndexKind::Rank9);

        assert_eq!(region.to_alignment_column(&arena, 27578828), Ok(0));
        assert_eq!(region.to_alignment_column(&arena, 27578830), Ok(2));
        assert_eq!(region.to_alignment_column(&arena, 27578831), Ok(4));
        assert_eq!(region.to_alignment_column(&arena, 27578850), Ok(26));
        assert_eq!(region.to_alignment_column(&arena, 27578865), Ok(41));
        assert!(region.to_alignment_column(&arena, 27578827).is_err());
        assert!(region.to_alignment_column(&arena, 27578866).is_err());
    }

    #[test]
    fn test_record_parse_errors() {
        let err = MafRecord::parse("random useless stuff", 3).unwrap_err();
        assert!(err.is_kind(MafParseErrorKind::InvalidLine));
        assert_eq!(err.line_number, Some(3));

        let err = MafRecord::parse("s name 47 12 + 470 ", 4).unwrap_err();
        assert!(err.is_kind(MafParseErrorKind::MissingField));

        let err = MafRecord::parse(
            "s panTro1.chr6 28741140Invalid! 38 + 161576975 AAA-GGGAATGTTAACCAAATGA---ATTGTCTCTTACGGTG",
            5,
        )
        .unwrap_err();
        assert!(err.is_kind(MafParseErrorKind::InvalidNumber));
        assert!(err.to_string().starts_with("Line 5: Invalid start value"));

        let err = MafRecord::parse("s x 1 3 * 10 ACG", 6).unwrap_err();
        assert!(err.is_kind(MafParseErrorKind::InvalidStrand));

        let err = MafRecord::parse("s x 1 4 + 10 AC-G", 7).unwrap_err();
        assert!(err.is_kind(MafParseErrorKind::SizeMismatch));
    }

    #[test]
    fn test_record_past_source_length() {
        let err = MafRecord::parse("s ref 18446744073709551615 1 + 10 A", 2).unwrap_err();
        assert!(err.is_kind(MafParseErrorKind::OutOfBounds));
        assert_eq!(err.line_number, Some(2));

        let err = MafRecord::parse("s ref 8 3 - 10 A-CG", 3).unwrap_err();
        assert!(err.is_kind(MafParseErrorKind::OutOfBounds));

        // Ending exactly at the source length is fine
        let record = MafRecord::parse("s ref 7 3 - 10 A-CG", 4).unwrap();
        assert_eq!(record.start + record.size, record.source_length);
    }

    #[test]
    fn test_out_of_bounds_row_aborts_ingestion() {
        let input = "a\ns hg18.chr7 0 3 + 10 ACG\ns other 9 3 + 10 ACG\n";
        let (al, result) = load(input, &IngestOptions::default());
        let err = result.unwrap_err();
        assert!(err.is_kind(MafParseErrorKind::OutOfBounds));
        assert_eq!(err.line_number, Some(3));
        assert_eq!(al.block_count(), 0);
    }

    #[test]
    fn test_reads_valid_file() {
        let (al, result) = load(TEST_FILE, &IngestOptions::default());
        let stats = result.unwrap();
        assert_eq!(stats.blocks, 3);
        assert_eq!(stats.rows, 14);
        assert_eq!(al.block_count(), 3);
        assert_eq!(al.count_known_sequences(), 5);

        let starts: Vec<u64> = al.blocks().map(|b| b.reference_start().unwrap()).collect();
        assert_eq!(starts, vec![27578828, 27699739, 27707221]);

        let rn3 = al.get_sequence_id("rn3.chr4").unwrap();
        let blocks: Vec<_> = al.blocks().collect();
        assert!(blocks[0].contains_sequence(rn3));
        assert!(blocks[1].contains_sequence(rn3));
        assert!(!blocks[2].contains_sequence(rn3));

        assert_eq!(
            al.map_position_to_informant(27578830, "baboon", IntervalBoundary::Begin),
            Ok(116836)
        );
        assert_eq!(
            al.map_position_to_informant(27707225, "panTro1.chr6", IntervalBoundary::Begin),
            Ok(28869791)
        );
        assert_eq!(
            al.map_position_to_informant(27707225, "rn3.chr4", IntervalBoundary::Begin),
            Err(MappingError::SequenceAbsent { id: rn3 })
        );
        assert_eq!(al.get_source_length(SequenceId::REFERENCE), Ok(158545518));
    }

    #[test]
    fn test_fails_on_invalid() {
        let input = "##maf version=1 scoring=tba.v8

a score=23262.0
s hg18.chr7    27578828 38 + 158545518 AAA-GGGAATGTTAACCAAATGA---ATTGTCTCTTACGGTG
s panTro1.chr6 28741140Invalid! 38 + 161576975 AAA-GGGAATGTTAACCAAATGA---ATTGTCTCTTACGGTG
";
        let (_, result) = load(input, &IngestOptions::default());
        let err = result.unwrap_err();
        assert_eq!(err.line_number, Some(5));
        assert!(err.is_kind(MafParseErrorKind::InvalidNumber));
    }

    #[test]
    fn test_skips_malformed_paragraph() {
        let input = "x not an alignment
s hg18.chr7 10 3 + 100 ACG

a
s hg18.chr7 20 3 + 100 ACG
s other 5 2 - 50 A-C
i other N 0 C 0
";
        let (al, result) = load(input, &IngestOptions::default());
        let stats = result.unwrap();
        assert_eq!(stats.skipped_paragraphs, 1);
        assert_eq!(stats.blocks, 1);
        assert_eq!(al.blocks().next().unwrap().reference_start(), Ok(20));
        // Reverse row: strand offsets 5, 6 are forward 44, 43
        assert_eq!(al.map_position_to_informant(20, "other", IntervalBoundary::Begin), Ok(44));
        assert_eq!(al.map_position_to_informant(21, "other", IntervalBoundary::End), Ok(44));
        assert_eq!(al.map_position_to_informant(21, "other", IntervalBoundary::Begin), Ok(43));
    }

    #[test]
    fn test_limit_drops_rows() {
        let options = IngestOptions::new().with_limit(["hg18.chr7", "baboon"]);
        let (al, result) = load(TEST_FILE, &options);
        let stats = result.unwrap();
        assert_eq!(stats.blocks, 3);
        assert_eq!(stats.rows, 6);
        assert_eq!(stats.filtered_rows, 8);
        assert_eq!(al.count_known_sequences(), 2);
        assert!(al.get_sequence_id("rn3.chr4").is_err());

        // Without the reference every block is dropped
        let options = IngestOptions::new().with_limit(["baboon"]);
        let (al, result) = load(TEST_FILE, &options);
        assert_eq!(result.unwrap().skipped_blocks, 3);
        assert_eq!(al.block_count(), 0);
    }

    #[test]
    fn test_column_mismatch() {
        let input = "a\ns hg18.chr7 0 3 + 10 ACG\ns other 0 2 + 10 AC\n";
        let (_, result) = load(input, &IngestOptions::default());
        assert!(result.unwrap_err().is_kind(MafParseErrorKind::ColumnMismatch));
    }

    #[test]
    fn test_unexpected_row() {
        let input = "a\ns hg18.chr7 0 3 + 10 ACG\nz what\n";
        let (_, result) = load(input, &IngestOptions::default());
        let err = result.unwrap_err();
        assert!(err.is_kind(MafParseErrorKind::InvalidLine));
        assert_eq!(err.line_number, Some(3));
    }

    #[test]
    fn test_load_alignment() -> Result<(), Box<dyn std::error::Error>> {
        use crate::core::MultialnError;
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(TEST_FILE.as_bytes())?;
        file.flush()?;

        let options = IngestOptions::new().with_encoding(BitIndexKind::Sparse);
        let (al, stats) = load_alignment(file.path(), "hg18.chr7", StorageStrategy::RankIndexed, &options)?;
        assert_eq!(stats.blocks, 3);
        assert_eq!(al.index().encoding(), Some(BitIndexKind::Sparse));
        assert_eq!(
            al.map_position_to_informant(27578830, "baboon", IntervalBoundary::Begin),
            Ok(116836)
        );

        let missing = load_alignment(
            Path::new("/nonexistent/input.maf"),
            "hg18.chr7",
            StorageStrategy::OrderedScan,
            &IngestOptions::default(),
        );
        assert!(matches!(missing, Err(MultialnError::Io(_))));

        let mut broken = tempfile::NamedTempFile::new()?;
        broken.write_all(b"a\ns hg18.chr7 0 3 + 10 ACG\nz what\n")?;
        broken.flush()?;
        let err = load_alignment(broken.path(), "hg18.chr7", StorageStrategy::OrderedScan, &IngestOptions::default());
        assert!(matches!(err, Err(MultialnError::MafParse(e)) if e.is_kind(MafParseErrorKind::InvalidLine)));
        Ok(())
    }

    #[test]
    fn test_every_encoding_agrees() {
        for kind in BitIndexKind::all() {
            let options = IngestOptions::new().with_encoding(kind);
            let (al, result) = load(TEST_FILE, &options);
            result.unwrap();
            assert_eq!(
                al.map_position_to_informant(27578830, "baboon", IntervalBoundary::Begin),
                Ok(116836),
                "encoding {}",
                kind
            );
            assert_eq!(
                al.map_position_to_informant(27578829, "mm4.chr6", IntervalBoundary::Begin),
                Ok(53215344)
            );
        }
    }
}
