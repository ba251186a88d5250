//! Core coordinate mapping functionality
//!
//! Bit-indexed sequence regions, alignment blocks, the block index and the
//! registry tying them together, plus the input layer.

pub mod bits;
pub mod block;
mod error;
pub mod io;
pub mod region;
pub mod registry;
pub mod storage;

pub use bits::{
    BitAssembly, BitIndex, BitIndexArena, BitIndexFactory, BitIndexHandle, BitIndexKind, BitSlice,
    BitString,
};
pub use block::AlignmentBlock;
pub use error::{ErrorKind, MappingError, MappingResult, MultialnError, Result};
pub use io::{
    detect_compression, open_input, open_input_or_stdin, ByteLineIterator, CompressionFormat,
    IoStrategy, SmartReader, DEFAULT_BUFFER_SIZE, LARGE_BUFFER_SIZE, MMAP_THRESHOLD,
};
pub use region::{IntervalBoundary, SequenceId, SequenceRegion, Strand};
pub use registry::AlignmentRegistry;
pub use storage::{
    BlockIndex, Blocks, IndexState, OrderedScanIndex, RankIndexedIndex, StorageStrategy, RANK_PADDING,
};
