//! Alignment blocks
//!
//! A block holds the regions of every sequence aligned over one contiguous
//! span of alignment columns. Regions are appended in file order and sorted
//! by sequence id lazily, the first time a lookup needs them.

use crate::core::bits::BitIndexArena;
use crate::core::error::{ErrorKind, MappingError, MappingResult};
use crate::core::region::{IntervalBoundary, SequenceId, SequenceRegion};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Regions of all sequences sharing one alignment column range
#[derive(Debug, Default)]
pub struct AlignmentBlock {
    regions: Vec<SequenceRegion>,
    /// Positions in `regions`, ascending by sequence id. Empty cell means
    /// the order is stale.
    order: OnceLock<Vec<usize>>,
}

impl AlignmentBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a region, replacing any previous region of the same sequence
    pub fn add_sequence(&mut self, region: SequenceRegion) {
        let id = region.sequence_id();
        match self.regions.iter_mut().find(|r| r.sequence_id() == id) {
            Some(existing) => *existing = region,
            None => self.regions.push(region),
        }
        self.order.take();
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Whether the lazy sort is current
    pub fn is_sorted(&self) -> bool {
        self.order.get().is_some()
    }

    fn order(&self) -> &[usize] {
        self.order.get_or_init(|| {
            let mut order: Vec<usize> = (0..self.regions.len()).collect();
            order.sort_unstable_by_key(|&i| self.regions[i].sequence_id());
            order
        })
    }

    pub fn get_sequence(&self, id: SequenceId) -> MappingResult<&SequenceRegion> {
        let order = self.order();
        order
            .binary_search_by_key(&id, |&i| self.regions[i].sequence_id())
            .map(|pos| &self.regions[order[pos]])
            .map_err(|_| MappingError::SequenceAbsent { id })
    }

    pub fn get_reference_sequence(&self) -> MappingResult<&SequenceRegion> {
        self.get_sequence(SequenceId::REFERENCE)
    }

    pub fn contains_sequence(&self, id: SequenceId) -> bool {
        self.get_sequence(id).is_ok()
    }

    /// Regions in ascending sequence id order
    pub fn sequences(&self) -> impl Iterator<Item = &SequenceRegion> + '_ {
        self.order().iter().map(move |&i| &self.regions[i])
    }

    /// Forward start of the reference region, the block's ordering key
    pub fn reference_start(&self) -> MappingResult<u64> {
        Ok(self.get_reference_sequence()?.get_start())
    }

    /// First and last reference positions covered by this block
    pub fn reference_range(&self) -> MappingResult<(u64, u64)> {
        let reference = self.get_reference_sequence()?;
        let (a, b) = (reference.get_start(), reference.get_end());
        Ok((a.min(b), a.max(b)))
    }

    /// Whether the reference region covers `position`
    pub fn covers_reference(&self, position: u64) -> bool {
        self.get_reference_sequence()
            .map(|r| r.contains(position))
            .unwrap_or(false)
    }

    /// Map a reference position to one sequence of this block
    pub fn map_position_to_sequence(
        &self,
        arena: &BitIndexArena,
        position: u64,
        target: SequenceId,
        boundary: IntervalBoundary,
    ) -> MappingResult<u64> {
        let reference = self.get_reference_sequence()?;
        let column = reference.to_alignment_column(arena, position)?;
        let region = self.get_sequence(target)?;
        region.to_source_position(arena, column, boundary)
    }

    /// Map a reference position to every informant of this block
    ///
    /// Informants with a gap that cannot be resolved towards `boundary` are
    /// left out, and so is everything when the reference does not cover
    /// `position`. A missing reference region is an error.
    pub fn map_position_to_all(
        &self,
        arena: &BitIndexArena,
        position: u64,
        boundary: IntervalBoundary,
    ) -> MappingResult<BTreeMap<SequenceId, u64>> {
        let mut mapping = BTreeMap::new();
        let reference = self.get_reference_sequence()?;
        let column = match reference.to_alignment_column(arena, position) {
            Ok(column) => column,
            Err(e) if e.kind() == ErrorKind::OutOfRange => return Ok(mapping),
            Err(e) => return Err(e),
        };

        for region in self.sequences().filter(|r| !r.sequence_id().is_reference()) {
            match region.to_source_position(arena, column, boundary) {
                Ok(mapped) => {
                    mapping.insert(region.sequence_id(), mapped);
                }
                Err(e) if e.kind() == ErrorKind::OutOfRange => {}
                Err(e) => return Err(e),
            }
        }
        Ok(mapping)
    }
}
