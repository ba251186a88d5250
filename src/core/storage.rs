//! Block index: which alignment block covers a reference position
//!
//! Two interchangeable strategies sit behind the [`BlockIndex`] trait:
//!
//! - [`OrderedScanIndex`] binary-searches the block starts.
//! - [`RankIndexedIndex`] marks every block start in a bitmap over the
//!   reference and answers with a single `rank1` query.
//!
//! Both keep blocks in insertion order and build their lookup structures
//! lazily. Inserting a block moves the index to [`IndexState::Dirty`]; the
//! first query (or an explicit [`BlockIndex::prepare`]) rebuilds the sort
//! order and, for the rank strategy, the compressed bitmap together and moves
//! it to [`IndexState::Prepared`]. Queries take `&self`, so a prepared index
//! can be shared between threads.

use crate::core::bits::{BitIndex, BitIndexFactory, BitIndexKind, BitString};
use crate::core::block::AlignmentBlock;
use crate::core::error::{MappingError, MappingResult};
use std::sync::OnceLock;

/// Extra bits past the longest reference so that rank queries just beyond
/// the last block start stay inside the bitmap
pub const RANK_PADDING: usize = 47;

/// Lazy cache state of a block index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    /// Blocks were added since the last rebuild
    Dirty,
    /// Sort order (and bitmap) match the stored blocks
    Prepared,
}

/// Ordered collection of blocks keyed by reference start
///
/// Blocks must be disjoint on the reference; this is assumed, not checked.
pub trait BlockIndex: Send + Sync {
    /// Store a block. Fails with `SequenceAbsent` if it has no reference
    /// region, since it could never be found.
    fn add_block(&mut self, block: AlignmentBlock) -> MappingResult<()>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuild the lookup structures if they are stale
    fn prepare(&self);

    fn state(&self) -> IndexState;

    /// Encoding of the lookup bitmap, if the strategy keeps one
    fn encoding(&self) -> Option<BitIndexKind> {
        None
    }

    /// The `i`-th block in ascending reference start order
    fn get(&self, i: usize) -> Option<&AlignmentBlock>;

    /// Rank of the last block whose reference start is at or before
    /// `position`, or `None` if every block starts after it
    fn locate(&self, position: u64) -> Option<usize>;

    fn first(&self) -> Option<&AlignmentBlock> {
        self.get(0)
    }

    /// Rank of the block covering `position`. The nearest preceding block
    /// only counts if its reference region actually reaches `position`.
    fn find(&self, position: u64) -> MappingResult<usize> {
        let i = self
            .locate(position)
            .ok_or(MappingError::out_of_range(position))?;
        match self.get(i) {
            Some(block) if block.covers_reference(position) => Ok(i),
            _ => Err(MappingError::out_of_range(position)),
        }
    }

    /// Block covering `position`
    fn lookup(&self, position: u64) -> MappingResult<&AlignmentBlock> {
        let i = self.find(position)?;
        self.get(i).ok_or(MappingError::out_of_range(position))
    }
}

impl<'a> dyn BlockIndex + 'a {
    /// Blocks in ascending reference start order
    pub fn iter(&self) -> Blocks<'_> {
        Blocks { index: self, next: 0 }
    }
}

/// Iterator over the blocks of a [`BlockIndex`]
pub struct Blocks<'a> {
    index: &'a dyn BlockIndex,
    next: usize,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = &'a AlignmentBlock;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.index;
        let block = index.get(self.next)?;
        self.next += 1;
        Some(block)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.index.len().saturating_sub(self.next);
        (left, Some(left))
    }
}

/// Block index strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageStrategy {
    /// Binary search over sorted block starts
    #[default]
    OrderedScan,
    /// Rank query over a bitmap of block starts
    RankIndexed,
}

impl StorageStrategy {
    /// Parse from string (for CLI argument)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "binsearch" | "ordered" | "ordered-scan" => Some(StorageStrategy::OrderedScan),
            "rank" | "rank-indexed" => Some(StorageStrategy::RankIndexed),
            _ => None,
        }
    }

    /// Create an empty index; `kind` encodes the rank strategy's bitmap
    pub fn build(self, kind: BitIndexKind) -> Box<dyn BlockIndex> {
        match self {
            StorageStrategy::OrderedScan => Box::new(OrderedScanIndex::new()),
            StorageStrategy::RankIndexed => Box::new(RankIndexedIndex::new(kind)),
        }
    }
}

/// Blocks in insertion order with their ordering keys
#[derive(Debug, Default)]
struct BlockList {
    blocks: Vec<AlignmentBlock>,
    starts: Vec<u64>,
}

/// Insertion positions sorted by reference start
#[derive(Debug)]
struct SortOrder {
    order: Vec<usize>,
    starts: Vec<u64>,
}

impl BlockList {
    fn push(&mut self, block: AlignmentBlock) -> MappingResult<()> {
        let start = block.reference_start()?;
        self.starts.push(start);
        self.blocks.push(block);
        Ok(())
    }

    fn sort(&self) -> SortOrder {
        let mut order: Vec<usize> = (0..self.blocks.len()).collect();
        order.sort_by_key(|&i| self.starts[i]);
        let starts = order.iter().map(|&i| self.starts[i]).collect();
        log::debug!("Sorted {} alignment blocks by reference start", order.len());
        SortOrder { order, starts }
    }

    fn get(&self, sorted: &SortOrder, i: usize) -> Option<&AlignmentBlock> {
        sorted.order.get(i).map(|&j| &self.blocks[j])
    }

    /// Longest reference any block was cut from
    fn reference_extent(&self) -> usize {
        self.blocks
            .iter()
            .filter_map(|b| b.get_reference_sequence().ok())
            .map(|r| r.source_length())
            .chain(self.starts.iter().map(|&s| s + 1))
            .max()
            .unwrap_or(0) as usize
    }
}

/// Binary search over a lazily sorted vector of blocks
#[derive(Debug, Default)]
pub struct OrderedScanIndex {
    list: BlockList,
    prepared: OnceLock<SortOrder>,
}

impl OrderedScanIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(&self) -> &SortOrder {
        self.prepared.get_or_init(|| self.list.sort())
    }
}

impl BlockIndex for OrderedScanIndex {
    fn add_block(&mut self, block: AlignmentBlock) -> MappingResult<()> {
        self.list.push(block)?;
        self.prepared.take();
        Ok(())
    }

    fn len(&self) -> usize {
        self.list.blocks.len()
    }

    fn prepare(&self) {
        self.sorted();
    }

    fn state(&self) -> IndexState {
        match self.prepared.get() {
            Some(_) => IndexState::Prepared,
            None => IndexState::Dirty,
        }
    }

    fn get(&self, i: usize) -> Option<&AlignmentBlock> {
        self.list.get(self.sorted(), i)
    }

    fn locate(&self, position: u64) -> Option<usize> {
        let preceding = self.sorted().starts.partition_point(|&s| s <= position);
        preceding.checked_sub(1)
    }
}

struct RankState {
    sorted: SortOrder,
    starts: Box<dyn BitIndex>,
}

/// Rank query over a compressed bitmap with one set bit per block start
pub struct RankIndexedIndex {
    list: BlockList,
    kind: BitIndexKind,
    prepared: OnceLock<RankState>,
}

impl RankIndexedIndex {
    pub fn new(kind: BitIndexKind) -> Self {
        Self {
            list: BlockList::default(),
            kind,
            prepared: OnceLock::new(),
        }
    }

    pub fn kind(&self) -> BitIndexKind {
        self.kind
    }

    fn state_or_build(&self) -> &RankState {
        self.prepared.get_or_init(|| {
            let sorted = self.list.sort();
            let mut bitmap = BitString::zeros(self.list.reference_extent() + RANK_PADDING);
            for &start in &sorted.starts {
                bitmap.set(start as usize, true);
            }
            log::debug!(
                "Built {} block-start bitmap: {} bits, {} blocks",
                self.kind,
                bitmap.len(),
                sorted.starts.len()
            );
            RankState {
                starts: self.kind.build(&bitmap),
                sorted,
            }
        })
    }

    /// Discard the sort order and the bitmap together
    fn unprepare(&mut self) {
        self.prepared.take();
    }
}

impl std::fmt::Debug for RankIndexedIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankIndexedIndex")
            .field("blocks", &self.list.blocks.len())
            .field("kind", &self.kind)
            .field("state", &self.state())
            .finish()
    }
}

impl BlockIndex for RankIndexedIndex {
    fn add_block(&mut self, block: AlignmentBlock) -> MappingResult<()> {
        self.list.push(block)?;
        self.unprepare();
        Ok(())
    }

    fn len(&self) -> usize {
        self.list.blocks.len()
    }

    fn prepare(&self) {
        self.state_or_build();
    }

    fn state(&self) -> IndexState {
        match self.prepared.get() {
            Some(_) => IndexState::Prepared,
            None => IndexState::Dirty,
        }
    }

    fn encoding(&self) -> Option<BitIndexKind> {
        Some(self.kind)
    }

    fn get(&self, i: usize) -> Option<&AlignmentBlock> {
        self.list.get(&self.state_or_build().sorted, i)
    }

    fn locate(&self, position: u64) -> Option<usize> {
        if self.list.blocks.is_empty() {
            return None;
        }
        let state = self.state_or_build();
        let rank = state.starts.rank1(usize::try_from(position).unwrap_or(usize::MAX));
        if rank == 0 || rank > self.len() {
            return None;
        }
        Some(rank - 1)
    }
}
