//! One sequence's participation in one alignment block
//!
//! A [`SequenceRegion`] converts between positions in the biological
//! sequence and columns of the block-local alignment. Positions are always
//! exposed normalized to the forward strand; reverse-strand rows are stored
//! in their own coordinates and flipped on the way in and out.

use crate::core::bits::{BitIndex, BitIndexArena, BitSlice};
use crate::core::error::{MappingError, MappingResult};
use std::fmt;

/// Compact identifier of a sequence within one alignment registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SequenceId(u16);

impl SequenceId {
    /// Reserved identifier of the reference sequence
    pub const REFERENCE: SequenceId = SequenceId(0);

    pub const fn new(id: u16) -> Self {
        SequenceId(id)
    }

    pub fn get(self) -> u16 {
        self.0
    }

    pub fn is_reference(self) -> bool {
        self == Self::REFERENCE
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strand orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Strand {
    #[default]
    Plus,
    Minus,
}

impl Strand {
    /// Get the complement strand
    ///
    /// # Examples
    /// ```
    /// use multialn::Strand;
    /// assert_eq!(Strand::Plus.complement(), Strand::Minus);
    /// assert_eq!(Strand::Minus.complement(), Strand::Plus);
    /// ```
    pub fn complement(&self) -> Self {
        match self {
            Strand::Plus => Strand::Minus,
            Strand::Minus => Strand::Plus,
        }
    }

    /// Parse strand from char
    ///
    /// # Examples
    /// ```
    /// use multialn::Strand;
    /// assert_eq!(Strand::from_char('+'), Some(Strand::Plus));
    /// assert_eq!(Strand::from_char('-'), Some(Strand::Minus));
    /// assert_eq!(Strand::from_char('.'), None);
    /// ```
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Strand::Plus),
            '-' => Some(Strand::Minus),
            _ => None,
        }
    }

    /// Parse strand from byte
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'+' => Some(Strand::Plus),
            b'-' => Some(Strand::Minus),
            _ => None,
        }
    }

    /// Convert to char
    pub fn to_char(&self) -> char {
        match self {
            Strand::Plus => '+',
            Strand::Minus => '-',
        }
    }

    pub fn is_reverse(&self) -> bool {
        matches!(self, Strand::Minus)
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Which side of a gap an unaligned column resolves to
///
/// `Begin` moves to the nearest covered column to the right (the first base
/// of an interval), `End` to the nearest covered column to the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum IntervalBoundary {
    #[default]
    Begin,
    End,
}

/// Bit-indexed region of one sequence in one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRegion {
    sequence_id: SequenceId,
    /// First covered position, in the source strand's own coordinates
    start: u64,
    /// Number of covered (non-gap) positions
    size: u64,
    strand: Strand,
    /// Length of the whole source sequence
    source_length: u64,
    bits: BitSlice,
}

impl SequenceRegion {
    pub fn new(
        sequence_id: SequenceId,
        start: u64,
        size: u64,
        strand: Strand,
        source_length: u64,
        bits: BitSlice,
    ) -> Self {
        Self {
            sequence_id,
            start,
            size,
            strand,
            source_length,
            bits,
        }
    }

    pub fn sequence_id(&self) -> SequenceId {
        self.sequence_id
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    pub fn is_reverse(&self) -> bool {
        self.strand.is_reverse()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn source_length(&self) -> u64 {
        self.source_length
    }

    /// Start in the source strand's own coordinates, as written in the file
    pub fn raw_start(&self) -> u64 {
        self.start
    }

    /// Number of alignment columns in the block
    pub fn columns(&self) -> usize {
        self.bits.span
    }

    pub fn bit_slice(&self) -> BitSlice {
        self.bits
    }

    /// First covered position, forward-normalized
    pub fn get_start(&self) -> u64 {
        self.normalize(self.start)
    }

    /// Last covered position, forward-normalized. On the reverse strand
    /// this is smaller than [`get_start`](Self::get_start).
    pub fn get_end(&self) -> u64 {
        self.normalize(self.start + self.size.saturating_sub(1))
    }

    /// Whether the forward position is one of this region's bases
    pub fn contains(&self, position: u64) -> bool {
        match self.to_strand(position) {
            Some(p) => p >= self.start && p < self.start + self.size,
            None => false,
        }
    }

    /// Alignment column holding the given forward position
    pub fn to_alignment_column(&self, arena: &BitIndexArena, position: u64) -> MappingResult<usize> {
        if !self.contains(position) {
            return Err(MappingError::out_of_range(position));
        }
        let p = self.to_strand(position).ok_or(MappingError::out_of_range(position))?;
        let bits = arena.get(self.bits.handle)?;
        let rank = (p - self.start) as usize + 1;
        let column = bits
            .select1(self.base_rank(bits) + rank)
            .filter(|&c| c >= self.bits.offset && c < self.bits.offset + self.bits.span)
            .ok_or(MappingError::out_of_range(position))?;
        Ok(column - self.bits.offset)
    }

    /// Forward position at an alignment column, resolving gaps towards
    /// `boundary`
    pub fn to_source_position(
        &self,
        arena: &BitIndexArena,
        column: usize,
        boundary: IntervalBoundary,
    ) -> MappingResult<u64> {
        if column >= self.bits.span {
            return Err(MappingError::out_of_range(column as u64));
        }
        let bits = arena.get(self.bits.handle)?;
        let first = self.bits.offset;
        let last = first + self.bits.span - 1;
        let absolute = first + column;

        let hit = if bits.access(absolute) {
            Some(absolute)
        } else {
            match boundary {
                IntervalBoundary::Begin => bits.select_next1(absolute).filter(|&b| b <= last),
                IntervalBoundary::End => bits.select_prev1(absolute).filter(|&b| b >= first),
            }
        }
        .ok_or(MappingError::out_of_range(column as u64))?;

        let rank = (bits.rank1(hit) - self.base_rank(bits)) as u64;
        if rank == 0 || rank > self.size {
            return Err(MappingError::out_of_range(column as u64));
        }
        Ok(self.normalize(self.start + rank - 1))
    }

    /// Set bits of the shared structure preceding this region
    fn base_rank(&self, bits: &dyn BitIndex) -> usize {
        match self.bits.offset {
            0 => 0,
            offset => bits.rank1(offset - 1),
        }
    }

    /// Forward position to strand coordinates
    fn to_strand(&self, position: u64) -> Option<u64> {
        match self.strand {
            Strand::Plus => Some(position),
            Strand::Minus if position < self.source_length => Some(self.source_length - position - 1),
            Strand::Minus => None,
        }
    }

    /// Strand coordinates to forward position (the flip is its own inverse)
    fn normalize(&self, position: u64) -> u64 {
        match self.strand {
            Strand::Plus => position,
            Strand::Minus => self.source_length.saturating_sub(position + 1),
        }
    }
}
