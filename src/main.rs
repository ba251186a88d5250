//! multialn CLI entry point
//!
//! Loads a MAF alignment and maps reference coordinates read from a query
//! file (or stdin) to informant sequences, printing BED-style lines.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use multialn::core::open_input_or_stdin;
use multialn::{
    load_alignment, AlignmentRegistry, BitIndexKind, IngestOptions, IntervalBoundary, MappingError,
    StorageStrategy,
};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Bit-vector encoding of alignment columns (CLI enum)
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum EncodingArg {
    /// Dense rank9 with select hints
    #[default]
    #[value(name = "rank9")]
    Rank9,
    /// Dense array of set-bit positions
    #[value(name = "darray")]
    DArray,
    /// Elias-Fano, for sparse columns
    #[value(name = "sparse")]
    Sparse,
    /// Uncompressed, linear-scan select
    #[value(name = "plain")]
    Plain,
}

impl From<EncodingArg> for BitIndexKind {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Rank9 => BitIndexKind::Rank9,
            EncodingArg::DArray => BitIndexKind::DArray,
            EncodingArg::Sparse => BitIndexKind::Sparse,
            EncodingArg::Plain => BitIndexKind::Plain,
        }
    }
}

/// Block lookup strategy (CLI enum)
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum StorageArg {
    /// Binary search over sorted block starts
    #[value(name = "binsearch")]
    Binsearch,
    /// Rank over a bitmap of block starts
    #[default]
    #[value(name = "rank")]
    Rank,
}

impl From<StorageArg> for StorageStrategy {
    fn from(arg: StorageArg) -> Self {
        match arg {
            StorageArg::Binsearch => StorageStrategy::OrderedScan,
            StorageArg::Rank => StorageStrategy::RankIndexed,
        }
    }
}

#[derive(Parser)]
#[command(name = "multialn")]
#[command(about = "Coordinate mapping through whole-genome multiple alignments")]
#[command(version)]
struct Cli {
    /// Bit-vector encoding for alignment columns
    #[arg(long, global = true, default_value = "rank9")]
    encoding: EncodingArg,

    /// Block index: 'binsearch' or 'rank'
    #[arg(long, global = true, default_value = "rank")]
    storage: StorageArg,

    /// Only load these sequences, comma separated (the reference is always kept)
    #[arg(long, global = true, value_delimiter = ',')]
    limit: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map '<informant> <position>' queries
    Map {
        /// Alignment in MAF format (may be gzip or bzip2 compressed)
        maf: PathBuf,
        /// Name of the reference sequence, e.g. hg19.chr1
        reference: String,
        /// Query file (stdin if not specified or '-')
        queries: Option<PathBuf>,
        /// Output file (stdout if not specified)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
        /// Number of threads
        #[arg(short = 't', long, default_value = "1")]
        threads: usize,
        /// Resolve gaps to the left (interval end) instead of the right
        #[arg(long)]
        end: bool,
    },
    /// Map '<position>' queries to every informant
    MapAll {
        maf: PathBuf,
        reference: String,
        queries: Option<PathBuf>,
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
        #[arg(long)]
        end: bool,
    },
    /// Map '<informant> <start> <end>' intervals
    Region {
        maf: PathBuf,
        reference: String,
        queries: Option<PathBuf>,
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Print '<informant> <position>' pairs that are known to map
    Sample {
        maf: PathBuf,
        reference: String,
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
        /// Distance between sampled reference positions
        #[arg(short = 's', long, default_value = "1000")]
        stride: u64,
    },
}

#[derive(Debug, Default)]
struct QueryStats {
    attempts: usize,
    misses: usize,
    non_collinear: usize,
}

impl QueryStats {
    fn report(&self, start: Instant) {
        eprintln!("\n=== Mapping Statistics ===");
        eprintln!("Queries:         {}", self.attempts);
        eprintln!("Mapped:          {}", self.attempts - self.misses - self.non_collinear);
        eprintln!("Misses:          {}", self.misses);
        if self.non_collinear > 0 {
            eprintln!("Non-collinear:   {}", self.non_collinear);
        }
        eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
    }

    /// Count an expected failure, propagate anything else
    fn record_failure(&mut self, e: MappingError) -> anyhow::Result<()> {
        if e.is_miss() {
            self.misses += 1;
        } else if matches!(e, MappingError::NonCollinear { .. }) {
            self.non_collinear += 1;
        } else {
            return Err(e.into());
        }
        Ok(())
    }
}

fn load(cli: &Cli, maf: &Path, reference: &str) -> anyhow::Result<AlignmentRegistry> {
    let start = Instant::now();
    eprintln!("Loading alignment: {:?}", maf);

    let mut options = IngestOptions::new().with_encoding(cli.encoding.into());
    if !cli.limit.is_empty() {
        options = options.with_limit(cli.limit.iter().cloned().chain([reference.to_string()]));
    }

    let (registry, stats) = load_alignment(maf, reference, cli.storage.into(), &options)
        .with_context(|| format!("Failed to load alignment {:?}", maf))?;

    eprintln!(
        "Loaded {} blocks over {} sequences in {:.2}s",
        stats.blocks,
        registry.count_known_sequences(),
        start.elapsed().as_secs_f64()
    );
    Ok(registry)
}

fn open_output(output: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::with_capacity(
            128 * 1024,
            std::fs::File::create(path).with_context(|| format!("Cannot create {:?}", path))?,
        )),
        None => Box::new(BufWriter::with_capacity(128 * 1024, std::io::stdout().lock())),
    })
}

/// Parse whitespace-separated query lines, skipping blanks and '#' comments
fn read_queries<T>(
    path: Option<&Path>,
    usage: &str,
    parse: impl Fn(&[&str]) -> Option<T>,
) -> anyhow::Result<Vec<T>> {
    let reader = open_input_or_stdin(path)?;
    let mut queries = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() || fields[0].starts_with('#') {
            continue;
        }
        let query = parse(&fields).with_context(|| format!("Line {}: expected '{}'", i + 1, usage))?;
        queries.push(query);
    }
    Ok(queries)
}

/// Chromosome part of an `assembly.chromosome` sequence name
fn chrom_name(sequence: &str) -> &str {
    sequence.split_once('.').map_or(sequence, |(_, chrom)| chrom)
}

fn boundary(end: bool) -> IntervalBoundary {
    if end {
        IntervalBoundary::End
    } else {
        IntervalBoundary::Begin
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();

    match &cli.command {
        Commands::Map {
            maf,
            reference,
            queries,
            output,
            threads,
            end,
        } => {
            let registry = load(&cli, maf, reference)?;
            let queries = read_queries(queries.as_deref(), "<informant> <position>", |f| match f {
                [name, pos] => Some((name.to_string(), pos.parse::<u64>().ok()?)),
                _ => None,
            })?;

            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(*threads)
                .build()
                .context("Failed to build thread pool")?;
            let results = pool.install(|| registry.map_positions_to_informant(&queries, boundary(*end)));

            let mut out = open_output(output.as_deref())?;
            let mut stats = QueryStats::default();
            for ((name, _), result) in queries.iter().zip(results) {
                stats.attempts += 1;
                match result {
                    Ok(pos) => writeln!(out, "{}\t{}\t{}", chrom_name(name), pos, pos + 1)?,
                    Err(e) => stats.record_failure(e)?,
                }
            }
            out.flush()?;
            stats.report(start);
        }

        Commands::MapAll {
            maf,
            reference,
            queries,
            output,
            end,
        } => {
            let registry = load(&cli, maf, reference)?;
            let positions = read_queries(queries.as_deref(), "<position>", |f| match f {
                [pos] => pos.parse::<u64>().ok(),
                _ => None,
            })?;

            let mut out = open_output(output.as_deref())?;
            let mut stats = QueryStats::default();
            for position in positions {
                stats.attempts += 1;
                match registry.map_position_to_all(position, boundary(*end)) {
                    Ok(mapped) if mapped.is_empty() => stats.misses += 1,
                    Ok(mapped) => {
                        for (name, pos) in mapped {
                            writeln!(out, "{}\t{}\t{}\t{}", chrom_name(name), pos, pos + 1, position)?;
                        }
                    }
                    Err(e) => stats.record_failure(e)?,
                }
            }
            out.flush()?;
            stats.report(start);
        }

        Commands::Region {
            maf,
            reference,
            queries,
            output,
        } => {
            let registry = load(&cli, maf, reference)?;
            let regions = read_queries(queries.as_deref(), "<informant> <start> <end>", |f| match f {
                [name, s, e] => Some((name.to_string(), s.parse::<u64>().ok()?, e.parse::<u64>().ok()?)),
                _ => None,
            })?;

            let mut out = open_output(output.as_deref())?;
            let mut stats = QueryStats::default();
            for (name, s, e) in &regions {
                stats.attempts += 1;
                match registry.map_region_to_informant(*s, *e, name) {
                    Ok((a, b)) => {
                        let strand = if b < a { '-' } else { '+' };
                        writeln!(
                            out,
                            "{}\t{}\t{}\t{}:{}-{}\t0\t{}",
                            chrom_name(name),
                            a.min(b),
                            a.max(b) + 1,
                            chrom_name(registry.reference_name()),
                            s,
                            e,
                            strand
                        )?;
                    }
                    Err(MappingError::InvalidRange { .. }) => {
                        log::warn!("Skipping inverted interval {}:{}-{}", name, s, e);
                        stats.misses += 1;
                    }
                    Err(e) => stats.record_failure(e)?,
                }
            }
            out.flush()?;
            stats.report(start);
        }

        Commands::Sample {
            maf,
            reference,
            output,
            stride,
        } => {
            let registry = load(&cli, maf, reference)?;
            let samples = registry.sample_positions(*stride);

            let mut out = open_output(output.as_deref())?;
            for (name, position) in &samples {
                writeln!(out, "{}\t{}", name, position)?;
            }
            out.flush()?;
            eprintln!("Sampled {} positions in {:.2}s", samples.len(), start.elapsed().as_secs_f64());
        }
    }

    Ok(())
}
