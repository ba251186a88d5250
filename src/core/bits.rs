//! Succinct bit-vector capability and bit-string assembly
//!
//! The engine never inspects bit arrays directly. Everything goes through the
//! [`BitIndex`] trait (access / rank / select), whose encodings come from the
//! `sucds` crate. One alignment file produces one [`BitString`] that is
//! assembled incrementally while the file is read and then compressed once;
//! every region of that file addresses a slice of the shared structure
//! through a [`BitIndexHandle`] into the registry-owned [`BitIndexArena`].

use crate::core::error::{MappingError, MappingResult};
use crate::core::region::{SequenceId, SequenceRegion, Strand};
use std::fmt;
use sucds::bit_vectors::{Access, BitVector, DArray, Rank, Rank9Sel, SArray, Select};

/// Rank/select structure over a static bit array.
///
/// `rank1(i)` counts set bits in `[0, i]` (inclusive) and saturates to the
/// total popcount past the end. `select1(k)` is 1-indexed.
pub trait BitIndex: Send + Sync {
    /// Number of bits
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether bit `i` is set (`false` past the end)
    fn access(&self, i: usize) -> bool;

    /// Number of set bits in `[0, i]`
    fn rank1(&self, i: usize) -> usize;

    /// Position of the `k`-th set bit, counting from 1
    fn select1(&self, k: usize) -> Option<usize>;

    /// Total number of set bits
    fn count_ones(&self) -> usize;

    /// First set bit at or after `i`
    fn select_next1(&self, i: usize) -> Option<usize> {
        let before = if i == 0 { 0 } else { self.rank1(i - 1) };
        self.select1(before + 1)
    }

    /// Last set bit at or before `i`
    fn select_prev1(&self, i: usize) -> Option<usize> {
        match self.rank1(i) {
            0 => None,
            rank => self.select1(rank),
        }
    }
}

/// Available bit-vector encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum BitIndexKind {
    /// Dense vector with rank9 counters and select hints
    #[default]
    Rank9,
    /// Dense vector with the DArray select index
    DArray,
    /// Elias-Fano encoding, suited to sparse bitmaps
    Sparse,
    /// Uncompressed words, linear-time rank and select
    Plain,
}

impl BitIndexKind {
    /// Parse from string (for CLI argument)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rank9" | "rg" | "dense" => Some(BitIndexKind::Rank9),
            "darray" => Some(BitIndexKind::DArray),
            "sparse" | "sarray" | "sdarray" | "elias-fano" => Some(BitIndexKind::Sparse),
            "plain" => Some(BitIndexKind::Plain),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BitIndexKind::Rank9 => "rank9",
            BitIndexKind::DArray => "darray",
            BitIndexKind::Sparse => "sparse",
            BitIndexKind::Plain => "plain",
        }
    }

    /// All encodings, for parameterized tests and benchmarks
    pub fn all() -> [BitIndexKind; 4] {
        [
            BitIndexKind::Rank9,
            BitIndexKind::DArray,
            BitIndexKind::Sparse,
            BitIndexKind::Plain,
        ]
    }
}

impl fmt::Display for BitIndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Turns a finished bit string into a queryable structure
pub trait BitIndexFactory {
    fn build(&self, bits: &BitString) -> Box<dyn BitIndex>;
}

impl BitIndexFactory for BitIndexKind {
    fn build(&self, bits: &BitString) -> Box<dyn BitIndex> {
        let len = bits.len();
        let ones = bits.count_ones();
        // The select-based encodings need at least one set bit.
        if ones == 0 {
            return Box::new(SucdsIndex::new(BitVector::from_bits(bits.iter()), len, ones));
        }
        match self {
            BitIndexKind::Rank9 => Box::new(SucdsIndex::new(
                Rank9Sel::from_bits(bits.iter()).select1_hints(),
                len,
                ones,
            )),
            BitIndexKind::DArray => Box::new(SucdsIndex::new(
                DArray::from_bits(bits.iter()).enable_rank(),
                len,
                ones,
            )),
            BitIndexKind::Sparse => Box::new(SucdsIndex::new(
                SArray::from_bits(bits.iter()).enable_rank(),
                len,
                ones,
            )),
            BitIndexKind::Plain => {
                Box::new(SucdsIndex::new(BitVector::from_bits(bits.iter()), len, ones))
            }
        }
    }
}

/// Adapter from the `sucds` traits to [`BitIndex`]
struct SucdsIndex<B> {
    bits: B,
    len: usize,
    ones: usize,
}

impl<B> SucdsIndex<B> {
    fn new(bits: B, len: usize, ones: usize) -> Self {
        Self { bits, len, ones }
    }
}

impl<B> BitIndex for SucdsIndex<B>
where
    B: Access + Rank + Select + Send + Sync,
{
    fn len(&self) -> usize {
        self.len
    }

    fn access(&self, i: usize) -> bool {
        self.bits.access(i).unwrap_or(false)
    }

    fn rank1(&self, i: usize) -> usize {
        if i >= self.len {
            return self.ones;
        }
        // sucds ranks are exclusive of `pos`
        self.bits.rank1(i + 1).unwrap_or(self.ones)
    }

    fn select1(&self, k: usize) -> Option<usize> {
        if k == 0 || k > self.ones {
            return None;
        }
        self.bits.select1(k - 1)
    }

    fn count_ones(&self) -> usize {
        self.ones
    }
}

/// Growable bit array backed by 64-bit words
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitString {
    words: Vec<u64>,
    len: usize,
}

impl BitString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: Vec::with_capacity(bits.div_ceil(64)),
            len: 0,
        }
    }

    /// `len` unset bits
    pub fn zeros(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    /// Parse a `0`/`1` string; any other character counts as set
    pub fn from_pattern(pattern: &str) -> Self {
        let mut bits = Self::with_capacity(pattern.len());
        for c in pattern.bytes() {
            bits.push(c != b'0');
        }
        bits
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Capacity in bits
    pub fn capacity(&self) -> usize {
        self.words.capacity() * 64
    }

    /// Make room for `additional` more bits, doubling the word capacity
    /// so that appends stay amortized O(1).
    pub fn ensure_capacity(&mut self, additional: usize) {
        let needed = (self.len + additional).div_ceil(64);
        if needed <= self.words.capacity() {
            return;
        }
        let mut target = self.words.capacity().max(1);
        while target < needed {
            target *= 2;
        }
        self.words.reserve_exact(target - self.words.len());
    }

    pub fn push(&mut self, bit: bool) {
        self.ensure_capacity(1);
        if self.len % 64 == 0 {
            self.words.push(0);
        }
        if bit {
            self.words[self.len / 64] |= 1 << (self.len % 64);
        }
        self.len += 1;
    }

    /// Append one bit per alignment column: `-` is a gap, anything else is
    /// sequence material. Returns the number of set bits appended.
    pub fn push_columns(&mut self, columns: &[u8]) -> usize {
        self.ensure_capacity(columns.len());
        let mut ones = 0;
        for &c in columns {
            let bit = c != b'-';
            ones += bit as usize;
            self.push(bit);
        }
        ones
    }

    pub fn get(&self, i: usize) -> bool {
        i < self.len && (self.words[i / 64] >> (i % 64)) & 1 == 1
    }

    /// Set bit `i`; out-of-range indices are ignored
    pub fn set(&mut self, i: usize, bit: bool) {
        if i >= self.len {
            return;
        }
        if bit {
            self.words[i / 64] |= 1 << (i % 64);
        } else {
            self.words[i / 64] &= !(1 << (i % 64));
        }
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    /// Drop spare capacity once no more bits will be appended
    pub fn shrink_to_fit(&mut self) {
        self.words.shrink_to_fit();
    }
}

/// Non-owning reference to a bit index held by a [`BitIndexArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BitIndexHandle(u32);

impl fmt::Display for BitIndexHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Location of a region's bits inside a shared bit index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSlice {
    pub handle: BitIndexHandle,
    pub offset: usize,
    pub span: usize,
}

/// Single owner of every bit index used by one alignment
///
/// Slots are reserved when assembly starts and bound exactly once when it
/// finishes; regions created in between already carry the handle.
#[derive(Default)]
pub struct BitIndexArena {
    slots: Vec<Option<Box<dyn BitIndex>>>,
}

impl BitIndexArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an already built index
    pub fn insert(&mut self, index: Box<dyn BitIndex>) -> BitIndexHandle {
        let handle = self.reserve();
        self.slots[handle.0 as usize] = Some(index);
        handle
    }

    fn reserve(&mut self) -> BitIndexHandle {
        let handle = BitIndexHandle(self.slots.len() as u32);
        self.slots.push(None);
        handle
    }

    pub fn get(&self, handle: BitIndexHandle) -> MappingResult<&dyn BitIndex> {
        self.slots
            .get(handle.0 as usize)
            .and_then(|slot| slot.as_deref())
            .ok_or(MappingError::UnboundIndex(handle))
    }

    pub fn is_bound(&self, handle: BitIndexHandle) -> bool {
        self.get(handle).is_ok()
    }

    /// Number of slots, bound or not
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Start assembling the bits of one alignment file
    pub fn begin_assembly(&mut self) -> BitAssembly {
        BitAssembly {
            handle: self.reserve(),
            bits: BitString::new(),
            regions: 0,
        }
    }

    /// Compress the assembled bits once and bind them to the reserved slot
    pub fn finish_assembly(
        &mut self,
        assembly: BitAssembly,
        factory: &dyn BitIndexFactory,
    ) -> BitIndexHandle {
        let (handle, index) = assembly.finalize(factory);
        self.slots[handle.0 as usize] = Some(index);
        handle
    }
}

impl fmt::Debug for BitIndexArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitIndexArena")
            .field("slots", &self.slots.len())
            .field("bound", &self.slots.iter().filter(|s| s.is_some()).count())
            .finish()
    }
}

/// In-progress bit string for one alignment file
#[derive(Debug)]
pub struct BitAssembly {
    handle: BitIndexHandle,
    bits: BitString,
    regions: usize,
}

impl BitAssembly {
    pub fn handle(&self) -> BitIndexHandle {
        self.handle
    }

    /// Bits appended so far
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Regions created so far
    pub fn region_count(&self) -> usize {
        self.regions
    }

    /// Append the column pattern of one sequence row and return the region
    /// addressing it. The region's size is the number of non-gap columns.
    pub fn append_region(
        &mut self,
        sequence_id: SequenceId,
        start: u64,
        strand: Strand,
        source_length: u64,
        columns: &[u8],
    ) -> SequenceRegion {
        let offset = self.bits.len();
        let size = self.bits.push_columns(columns) as u64;
        self.finish_region(sequence_id, start, size, strand, source_length, offset)
    }

    /// Like [`append_region`](Self::append_region) for an explicit bit pattern
    pub fn append_bits<I>(
        &mut self,
        sequence_id: SequenceId,
        start: u64,
        strand: Strand,
        source_length: u64,
        bits: I,
    ) -> SequenceRegion
    where
        I: IntoIterator<Item = bool>,
    {
        let offset = self.bits.len();
        let mut size = 0;
        for bit in bits {
            size += bit as u64;
            self.bits.push(bit);
        }
        self.finish_region(sequence_id, start, size, strand, source_length, offset)
    }

    fn finish_region(
        &mut self,
        sequence_id: SequenceId,
        start: u64,
        size: u64,
        strand: Strand,
        source_length: u64,
        offset: usize,
    ) -> SequenceRegion {
        self.regions += 1;
        let slice = BitSlice {
            handle: self.handle,
            offset,
            span: self.bits.len() - offset,
        };
        SequenceRegion::new(sequence_id, start, size, strand, source_length, slice)
    }

    /// Trim the bit string and invoke the factory exactly once
    pub fn finalize(mut self, factory: &dyn BitIndexFactory) -> (BitIndexHandle, Box<dyn BitIndex>) {
        self.bits.shrink_to_fit();
        log::debug!(
            "Finalizing bit index {}: {} bits, {} set, {} regions",
            self.handle,
            self.bits.len(),
            self.bits.count_ones(),
            self.regions
        );
        (self.handle, factory.build(&self.bits))
    }
}
