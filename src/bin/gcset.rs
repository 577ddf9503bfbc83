//! Command-line front end for building and querying Golomb Compressed Sets.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use gcset::{BucketHash, GcsBuilder, GolombSet, LineFormat};

#[derive(Parser)]
#[command(name = "gcset", about = "Golomb Compressed Set tools", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a set file from newline-separated items.
    Create {
        /// How item bytes are obtained from each input line.
        #[arg(long = "hash", value_enum, default_value_t = LineMode::Raw)]
        hash: LineMode,
        /// Inverse false-positive rate (a probe not in the set reports
        /// "Found" with probability about 1/P).
        #[arg(short = 'p', value_name = "P")]
        p: u64,
        /// Hash identity recorded in the file.
        #[arg(long, value_enum, default_value_t = Digest::Siphash)]
        digest: Digest,
        /// Log2 of the anchor stride (one index entry per 2^G codes).
        #[arg(long, value_name = "G", default_value_t = 10)]
        granularity_log2: u8,
        /// Input file of items, one per line, or `-` for stdin.
        input: String,
        /// Output set file.
        output: PathBuf,
    },
    /// Query a set file with probes read from stdin, one per line.
    Query {
        /// Set file produced by `create`.
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LineMode {
    /// Use line bytes as-is.
    Raw,
    /// Hex-decode each line before hashing.
    Hex,
}

impl From<LineMode> for LineFormat {
    fn from(mode: LineMode) -> Self {
        match mode {
            LineMode::Raw => LineFormat::Raw,
            LineMode::Hex => LineFormat::Hex,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Digest {
    /// SHA-1 truncated to 64 bits.
    Sha1,
    /// SipHash-2-4 with a zero key.
    Siphash,
    /// XXH64 with seed 0.
    Xxh64,
}

impl From<Digest> for BucketHash {
    fn from(digest: Digest) -> Self {
        match digest {
            Digest::Sha1 => BucketHash::Sha1Trunc64,
            Digest::Siphash => BucketHash::SipHash24,
            Digest::Xxh64 => BucketHash::Xxh64,
        }
    }
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Command::Create {
            hash,
            p,
            digest,
            granularity_log2,
            input,
            output,
        } => create(hash.into(), p, digest.into(), granularity_log2, &input, &output),
        Command::Query { file } => query(&file),
    }
}

fn create(
    format: LineFormat,
    p: u64,
    digest: BucketHash,
    granularity_log2: u8,
    input: &str,
    output: &PathBuf,
) -> Result<()> {
    let reader: Box<dyn Read> = if input == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(input).with_context(|| format!("cannot open input {input}"))?)
    };

    let mut builder = GcsBuilder::new(p)?
        .with_hash(digest)
        .with_index_log2_granularity(granularity_log2)?;
    let mut line_no = 0u64;
    for line in BufReader::new(reader).lines() {
        let line = line.with_context(|| format!("cannot read input {input}"))?;
        line_no += 1;
        let item = format.item_bytes(&line, line_no)?;
        builder.insert(&item)?;
    }

    let out = File::create(output)
        .with_context(|| format!("cannot create output {}", output.display()))?;
    let stats = match builder.finish(BufWriter::new(out)) {
        Ok(stats) => stats,
        Err(err) => {
            // Never leave a partial set file behind.
            let _ = std::fs::remove_file(output);
            return Err(err)
                .with_context(|| format!("cannot write output {}", output.display()));
        }
    };

    println!(
        "{} items -> {} buckets over universe {} ({} bytes, {} index entries)",
        stats.items_ingested,
        stats.buckets_encoded,
        stats.n_buckets,
        stats.bytes_written,
        stats.index_entries,
    );
    Ok(())
}

fn query(file: &PathBuf) -> Result<()> {
    let set =
        GolombSet::open(file).with_context(|| format!("cannot open set {}", file.display()))?;

    let stdin = io::stdin().lock();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lines() {
        let line = line.context("cannot read probe from stdin")?;
        let started = Instant::now();
        let found = set.contains(line.as_bytes());
        let elapsed = started.elapsed();
        let verdict = if found { "Found" } else { "Not found" };
        writeln!(out, "{verdict} ({elapsed:?})")?;
    }
    Ok(())
}
