//! Input layer for alignment and query files
//!
//! Alignment dumps are large and usually compressed, so every reader goes
//! through [`open_input`], which sniffs the compression format and picks a
//! buffered or memory-mapped strategy for plain files.

use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Default buffer size for BufReader (128KB)
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// Buffer size for plain files above 10MB (1MB)
pub const LARGE_BUFFER_SIZE: usize = 1024 * 1024;

/// Plain files at least this large are memory mapped (100MB)
pub const MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const BZIP2_MAGIC: [u8; 3] = *b"BZh";

/// How a plain file is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IoStrategy {
    /// Buffered reading with the given buffer size
    Buffered(usize),
    /// Map the whole file
    MemoryMapped,
    /// Pick by file size
    #[default]
    Auto,
}

/// Compression of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    Plain,
    /// gzip, including multi-member (bgzip) files
    Gzip,
    Bzip2,
}

impl CompressionFormat {
    /// Classify by leading bytes
    pub fn from_magic(magic: &[u8]) -> Self {
        if magic.starts_with(&GZIP_MAGIC) {
            CompressionFormat::Gzip
        } else if magic.starts_with(&BZIP2_MAGIC) {
            CompressionFormat::Bzip2
        } else {
            CompressionFormat::Plain
        }
    }

    /// Classify by file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") | Some("bgz") => Some(CompressionFormat::Gzip),
            Some("bz2") => Some(CompressionFormat::Bzip2),
            _ => None,
        }
    }
}

/// Detect compression by extension, falling back to magic bytes
pub fn detect_compression(path: &Path) -> io::Result<CompressionFormat> {
    if let Some(format) = CompressionFormat::from_extension(path) {
        return Ok(format);
    }
    let mut file = File::open(path)?;
    let mut magic = [0u8; 3];
    let mut filled = 0;
    while filled < magic.len() {
        match file.read(&mut magic[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(CompressionFormat::from_magic(&magic[..filled]))
}

/// Open a possibly compressed file for line reading
pub fn open_input(path: &Path) -> io::Result<Box<dyn BufRead + Send>> {
    open_input_with(path, IoStrategy::Auto)
}

/// Open a possibly compressed file; `strategy` applies to plain files only
pub fn open_input_with(path: &Path, strategy: IoStrategy) -> io::Result<Box<dyn BufRead + Send>> {
    let format = detect_compression(path)?;
    log::debug!("Opening {} as {:?}", path.display(), format);
    Ok(match format {
        CompressionFormat::Gzip => {
            let decoder = flate2::read::MultiGzDecoder::new(File::open(path)?);
            Box::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, decoder))
        }
        CompressionFormat::Bzip2 => {
            let decoder = bzip2::read::BzDecoder::new(File::open(path)?);
            Box::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, decoder))
        }
        CompressionFormat::Plain => Box::new(SmartReader::open(path, strategy)?),
    })
}

/// Open `path`, or standard input when it is absent or `-`
pub fn open_input_or_stdin(path: Option<&Path>) -> io::Result<Box<dyn BufRead + Send>> {
    match path {
        Some(p) if p != Path::new("-") => open_input(p),
        _ => Ok(Box::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, io::stdin()))),
    }
}

/// Plain-file reader using the strategy chosen at open time
pub enum SmartReader {
    Buffered(BufReader<File>),
    /// Whole file mapped, `offset` bytes already consumed
    Mapped { map: Mmap, offset: usize },
}

impl SmartReader {
    pub fn open<P: AsRef<Path>>(path: P, strategy: IoStrategy) -> io::Result<Self> {
        let file = File::open(path.as_ref())?;
        let size = file.metadata()?.len();
        let capacity = match strategy {
            IoStrategy::Buffered(capacity) => capacity,
            IoStrategy::MemoryMapped => return Self::map(&file),
            IoStrategy::Auto if size >= MMAP_THRESHOLD => return Self::map(&file),
            IoStrategy::Auto if size > 10 * 1024 * 1024 => LARGE_BUFFER_SIZE,
            IoStrategy::Auto => DEFAULT_BUFFER_SIZE,
        };
        Ok(SmartReader::Buffered(BufReader::with_capacity(capacity, file)))
    }

    fn map(file: &File) -> io::Result<Self> {
        // SAFETY: alignment inputs are not modified while being ingested
        let map = unsafe { Mmap::map(file)? };
        Ok(SmartReader::Mapped { map, offset: 0 })
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, SmartReader::Mapped { .. })
    }
}

impl Read for SmartReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let SmartReader::Buffered(reader) = self {
            return reader.read(buf);
        }
        let available = self.fill_buf()?;
        let n = buf.len().min(available.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for SmartReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            SmartReader::Buffered(reader) => reader.fill_buf(),
            SmartReader::Mapped { map, offset } => Ok(&map[*offset..]),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            SmartReader::Buffered(reader) => reader.consume(amt),
            SmartReader::Mapped { map, offset } => *offset = (*offset + amt).min(map.len()),
        }
    }
}

/// Byte lines read into a reused buffer
pub struct ByteLineIterator<R: BufRead> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: BufRead> ByteLineIterator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(4096),
        }
    }

    /// Next line without its terminator (`\n` or `\r\n`)
    pub fn next_line(&mut self) -> Option<io::Result<&[u8]>> {
        self.buffer.clear();
        match self.reader.read_until(b'\n', &mut self.buffer) {
            Ok(0) => None,
            Ok(_) => {
                if self.buffer.last() == Some(&b'\n') {
                    self.buffer.pop();
                    if self.buffer.last() == Some(&b'\r') {
                        self.buffer.pop();
                    }
                }
                Some(Ok(&self.buffer))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
