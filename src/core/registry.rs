//! Whole-alignment registry and public mapping operations
//!
//! The registry owns everything belonging to one alignment: the block index,
//! the arena holding the shared bit indexes, and the mapping between sequence
//! names and compact [`SequenceId`]s. The reference is always
//! [`SequenceId::REFERENCE`], whatever its name.

use crate::core::bits::{BitAssembly, BitIndexArena, BitIndexFactory, BitIndexHandle, BitIndexKind};
use crate::core::block::AlignmentBlock;
use crate::core::error::{ErrorKind, MappingError, MappingResult};
use crate::core::region::{IntervalBoundary, SequenceId};
use crate::core::storage::{BlockIndex, Blocks, StorageStrategy};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
struct SequenceEntry {
    name: String,
    /// 0 until a record of this sequence has been seen
    source_length: u64,
}

/// Coordinate mapping over one multiple alignment
///
/// # Example
/// ```ignore
/// use multialn::{AlignmentRegistry, BitIndexKind, IntervalBoundary, StorageStrategy};
///
/// let mut registry = AlignmentRegistry::new("hg19.chr1", StorageStrategy::RankIndexed, BitIndexKind::Rank9);
/// // ... ingest blocks ...
/// let pos = registry.map_position_to_informant(1_000_000, "mm10.chr4", IntervalBoundary::Begin)?;
/// let (start, end) = registry.map_region_to_informant(1_000_000, 1_000_500, "mm10.chr4")?;
/// ```
pub struct AlignmentRegistry {
    ids: HashMap<String, SequenceId>,
    sequences: Vec<SequenceEntry>,
    index: Box<dyn BlockIndex>,
    arena: BitIndexArena,
}

impl AlignmentRegistry {
    /// Empty registry; `encoding` also compresses the rank-indexed block
    /// bitmap
    pub fn new(reference: impl Into<String>, strategy: StorageStrategy, encoding: BitIndexKind) -> Self {
        Self::with_index(reference, strategy.build(encoding))
    }

    pub fn with_index(reference: impl Into<String>, index: Box<dyn BlockIndex>) -> Self {
        let name = reference.into();
        let mut ids = HashMap::new();
        ids.insert(name.clone(), SequenceId::REFERENCE);
        Self {
            ids,
            sequences: vec![SequenceEntry {
                name,
                source_length: 0,
            }],
            index,
            arena: BitIndexArena::new(),
        }
    }

    pub fn reference_name(&self) -> &str {
        &self.sequences[SequenceId::REFERENCE.index()].name
    }

    /// Id of `name`, allocating the next free one for unseen names.
    ///
    /// A known name keeps its id; its length is only recorded if none was
    /// known yet.
    pub fn request_sequence_id(&mut self, name: &str, source_length: u64) -> MappingResult<SequenceId> {
        if let Some(&id) = self.ids.get(name) {
            let entry = &mut self.sequences[id.index()];
            if entry.source_length == 0 {
                entry.source_length = source_length;
            }
            return Ok(id);
        }

        let next = u16::try_from(self.sequences.len()).map_err(|_| MappingError::IdentifiersExhausted)?;
        let id = SequenceId::new(next);
        self.sequences.push(SequenceEntry {
            name: name.to_string(),
            source_length,
        });
        self.ids.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn get_sequence_id(&self, name: &str) -> MappingResult<SequenceId> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| MappingError::UnknownSequence(name.to_string()))
    }

    pub fn get_sequence_name(&self, id: SequenceId) -> MappingResult<&str> {
        self.sequences
            .get(id.index())
            .map(|e| e.name.as_str())
            .ok_or(MappingError::SequenceAbsent { id })
    }

    pub fn get_source_length(&self, id: SequenceId) -> MappingResult<u64> {
        self.sequences
            .get(id.index())
            .map(|e| e.source_length)
            .ok_or(MappingError::SequenceAbsent { id })
    }

    /// Registered sequences, reference included
    pub fn count_known_sequences(&self) -> usize {
        self.sequences.len()
    }

    /// Names in id order, reference first
    pub fn sequence_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.sequences.iter().map(|e| e.name.as_str())
    }

    pub fn arena(&self) -> &BitIndexArena {
        &self.arena
    }

    /// Reserve a shared bit index for the regions of one alignment file
    pub fn begin_assembly(&mut self) -> BitAssembly {
        self.arena.begin_assembly()
    }

    /// Compress the assembled bits and bind them for every region created
    /// from `assembly`
    pub fn finish_assembly(&mut self, assembly: BitAssembly, factory: &dyn BitIndexFactory) -> BitIndexHandle {
        self.arena.finish_assembly(assembly, factory)
    }

    pub fn add_block(&mut self, block: AlignmentBlock) -> MappingResult<()> {
        self.index.add_block(block)
    }

    pub fn block_count(&self) -> usize {
        self.index.len()
    }

    /// Blocks in ascending reference order
    pub fn blocks(&self) -> Blocks<'_> {
        self.index.iter()
    }

    pub fn index(&self) -> &dyn BlockIndex {
        self.index.as_ref()
    }

    /// Build the index's lookup structures now rather than on first query
    pub fn prepare(&self) {
        self.index.prepare();
    }

    /// Map a reference position to one informant
    pub fn map_position_to_informant(
        &self,
        position: u64,
        name: &str,
        boundary: IntervalBoundary,
    ) -> MappingResult<u64> {
        let block = self.index.lookup(position)?;
        let id = self.get_sequence_id(name)?;
        block.map_position_to_sequence(&self.arena, position, id, boundary)
    }

    /// Map a reference position to every informant aligned there
    pub fn map_position_to_all(
        &self,
        position: u64,
        boundary: IntervalBoundary,
    ) -> MappingResult<BTreeMap<&str, u64>> {
        let block = self.index.lookup(position)?;
        let mapped = block.map_position_to_all(&self.arena, position, boundary)?;
        Ok(mapped
            .into_iter()
            .filter_map(|(id, pos)| self.get_sequence_name(id).ok().map(|name| (name, pos)))
            .collect())
    }

    /// Map many `(informant, position)` queries in parallel
    ///
    /// Runs on the current rayon pool; results keep the query order.
    pub fn map_positions_to_informant<S>(
        &self,
        queries: &[(S, u64)],
        boundary: IntervalBoundary,
    ) -> Vec<MappingResult<u64>>
    where
        S: AsRef<str> + Sync,
    {
        self.prepare();
        queries
            .par_iter()
            .map(|(name, position)| self.map_position_to_informant(*position, name.as_ref(), boundary))
            .collect()
    }

    /// Map the reference interval `[start, end]` to one informant
    ///
    /// A start outside every block is widened to the start of the first
    /// block; the end is never widened and must lie in a block. Between the
    /// two blocks every block holding the informant is walked, failing with
    /// `NonCollinear` if the informant changes direction or strand.
    pub fn map_region_to_informant(&self, start: u64, end: u64, name: &str) -> MappingResult<(u64, u64)> {
        if start > end {
            return Err(MappingError::InvalidRange { start, end });
        }
        let target = self.get_sequence_id(name)?;
        let index = self.index.as_ref();

        let (first, region_start) = match index.find(start) {
            Ok(i) => (i, start),
            Err(_) => {
                let block = index.first().ok_or(MappingError::out_of_range(start))?;
                (0, block.reference_start()?)
            }
        };
        let last = index.find(end)?;

        if first == last {
            let block = index.get(first).ok_or(MappingError::out_of_range(start))?;
            let mapped_start =
                block.map_position_to_sequence(&self.arena, region_start, target, IntervalBoundary::Begin)?;
            let mapped_end = block.map_position_to_sequence(&self.arena, end, target, IntervalBoundary::End)?;
            return Ok((mapped_start, mapped_end));
        }

        let mut walk = CollinearWalk::default();
        let mut present = false;
        for i in first..=last {
            let Some(block) = index.get(i) else { break };
            let region = match block.get_sequence(target) {
                Ok(region) if !region.is_empty() => region,
                Ok(_) => {
                    present = true;
                    continue;
                }
                Err(_) => continue,
            };
            present = true;

            let segment_start = if i == first {
                let mapped = block.map_position_to_sequence(
                    &self.arena,
                    region_start,
                    target,
                    IntervalBoundary::Begin,
                );
                match skip_out_of_range(mapped)? {
                    Some(pos) => pos,
                    None => continue,
                }
            } else {
                region.get_start()
            };

            if !walk.push(segment_start, region.get_end()) {
                log::debug!(
                    "{}:{}-{} breaks collinearity in block starting at {}",
                    name,
                    start,
                    end,
                    block.reference_start().unwrap_or_default()
                );
                return Err(MappingError::NonCollinear { start, end });
            }

            if i == last {
                let mapped = block.map_position_to_sequence(&self.arena, end, target, IntervalBoundary::End);
                walk.settle_end(skip_out_of_range(mapped)?);
            }
        }

        match walk.finish() {
            Some(mapped) => Ok(mapped),
            None if present => Err(MappingError::out_of_range(end)),
            None => Err(MappingError::SequenceAbsent { id: target }),
        }
    }

    /// Reference positions, taken every `stride` bases of every block, paired
    /// with each informant they map to
    pub fn sample_positions(&self, stride: u64) -> Vec<(&str, u64)> {
        let stride = stride.max(1) as usize;
        let mut samples = Vec::new();
        for block in self.blocks() {
            let Ok((lo, hi)) = block.reference_range() else { continue };
            for position in (lo..=hi).step_by(stride) {
                for region in block.sequences().filter(|r| !r.sequence_id().is_reference()) {
                    let id = region.sequence_id();
                    let mapped = block.map_position_to_sequence(
                        &self.arena,
                        position,
                        id,
                        IntervalBoundary::Begin,
                    );
                    if let (Ok(_), Ok(name)) = (mapped, self.get_sequence_name(id)) {
                        samples.push((name, position));
                    }
                }
            }
        }
        samples
    }
}

impl std::fmt::Debug for AlignmentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignmentRegistry")
            .field("reference", &self.reference_name())
            .field("sequences", &self.sequences.len())
            .field("blocks", &self.index.len())
            .field("arena", &self.arena)
            .finish()
    }
}

/// Treat OutOfRange as "nothing here", propagate anything else
fn skip_out_of_range(result: MappingResult<u64>) -> MappingResult<Option<u64>> {
    match result {
        Ok(pos) => Ok(Some(pos)),
        Err(e) if e.kind() == ErrorKind::OutOfRange => Ok(None),
        Err(e) => Err(e),
    }
}

/// Running state of a multi-block region mapping
#[derive(Debug, Default)]
struct CollinearWalk {
    start_map: Option<u64>,
    last_position: u64,
    /// Mapped end before the latest segment, for rollback
    last_but_one: Option<u64>,
}

impl CollinearWalk {
    /// Append the informant segment of the next block; false if it does not
    /// continue in the direction established so far.
    ///
    /// Besides the heading, the segment's own span and the jump onto it must
    /// agree, so a single-base heading cannot hide a backwards jump.
    fn push(&mut self, segment_start: u64, segment_end: u64) -> bool {
        let Some(start_map) = self.start_map else {
            self.start_map = Some(segment_start);
            self.last_position = segment_end;
            self.last_but_one = None;
            return true;
        };

        let heading = segment_direction(start_map, self.last_position);
        let span = segment_direction(segment_start, segment_end);
        let jump = segment_direction(self.last_position, segment_start);
        if !(agree(heading, span) && agree(heading, jump) && agree(span, jump)) {
            return false;
        }
        self.last_but_one = Some(self.last_position);
        self.last_position = segment_end;
        true
    }

    /// Replace the latest segment's end with the mapped region end, or roll
    /// back to the previous segment when the end does not map
    fn settle_end(&mut self, mapped_end: Option<u64>) {
        match (mapped_end, self.last_but_one) {
            (Some(end), _) => self.last_position = end,
            (None, Some(previous)) => self.last_position = previous,
            (None, None) => self.start_map = None,
        }
    }

    fn finish(self) -> Option<(u64, u64)> {
        self.start_map.map(|start| (start, self.last_position))
    }
}

fn segment_direction(from: u64, to: u64) -> Ordering {
    to.cmp(&from)
}

/// Equal (a single base, or no move) is compatible with either direction
fn agree(a: Ordering, b: Ordering) -> bool {
    a == Ordering::Equal || b == Ordering::Equal || a == b
}
