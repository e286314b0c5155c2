use anyhow::Result;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::io::Write;

mod align;
mod index;
mod io;
mod scaffold;
mod util;

use index::fm::{IndexMeta, IndexPair};
use scaffold::assemble::{generate_sequence, ScaffoldOpt};
use scaffold::store::SequenceStore;

// jemalloc：替换默认 allocator，多线程场景显著提升
// 仅在非 Windows 平台启用（Linux glibc/musl + macOS）
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "sga-rust", author, version, about = "Rust implementation inspired by SGA: overlap search and scaffold assembly", arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the paired FM-index (forward + reversed text) from contigs
    Index {
        /// Contigs FASTA file
        contigs: String,
        /// Output prefix for the index file
        #[arg(short, long, default_value = "ref")]
        output: String,
        /// Occ sampling block size
        #[arg(long, default_value_t = 64)]
        block: usize,
    },
    /// Search approximate occurrences of each query against an index
    Overlap {
        /// Path to paired index (.fm)
        #[arg(short = 'i', long = "index")]
        index: String,
        /// Queries FASTA file
        queries: String,
        /// Output TSV path (stdout if omitted)
        #[arg(short, long)]
        out: Option<String>,
        /// Fixed edit budget (ignored when --error-rate is set)
        #[arg(long = "max-diff", default_value_t = 0)]
        max_diff: i32,
        /// Error-rate budget; enables the inexact search with indels
        #[arg(long = "error-rate")]
        error_rate: Option<f64>,
        #[arg(long = "min-overlap", default_value_t = 20)]
        min_overlap: i32,
        /// Frame-count ceiling per query
        #[arg(long = "max-frames", default_value_t = 100_000)]
        max_frames: usize,
    },
    /// Materialize scaffold records into consensus FASTA
    Scaffold {
        /// Contigs FASTA file
        #[arg(short = 'c', long = "contigs")]
        contigs: String,
        /// Scaffold records (.scaf, one tab-delimited record per line)
        scaf: String,
        /// Output FASTA path (stdout if omitted)
        #[arg(short, long)]
        out: Option<String>,
        #[arg(long = "min-overlap", default_value_t = 20)]
        min_overlap: usize,
        /// Overlap search upper bound (defaults to expected + 3·stdDev per link)
        #[arg(long = "max-overlap")]
        max_overlap: Option<usize>,
        #[arg(long = "error-rate", default_value_t = 0.05)]
        error_rate: f64,
        /// Skip overlap resolution entirely; always gap-fill
        #[arg(long = "no-overlap")]
        no_overlap: bool,
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Index {
            contigs,
            output,
            block,
        } => run_index(&contigs, &output, block),
        Commands::Overlap {
            index,
            queries,
            out,
            max_diff,
            error_rate,
            min_overlap,
            max_frames,
        } => run_overlap(
            &index,
            &queries,
            out.as_deref(),
            max_diff,
            error_rate,
            min_overlap,
            max_frames,
        ),
        Commands::Scaffold {
            contigs,
            scaf,
            out,
            min_overlap,
            max_overlap,
            error_rate,
            no_overlap,
            threads,
        } => {
            let opt = ScaffoldOpt {
                no_overlap,
                min_overlap,
                max_overlap,
                max_error_rate: error_rate,
            };
            run_scaffold(&contigs, &scaf, out.as_deref(), opt, threads)
        }
    }
}

fn open_fasta(path: &str) -> Result<io::fasta::FastaReader<std::io::BufReader<std::fs::File>>> {
    let fh = std::fs::File::open(path)
        .map_err(|e| anyhow::anyhow!("cannot open FASTA '{}': {}", path, e))?;
    Ok(io::fasta::FastaReader::new(std::io::BufReader::new(fh)))
}

fn make_writer(out_path: Option<&str>) -> Result<Box<dyn Write>> {
    Ok(if let Some(p) = out_path {
        Box::new(std::io::BufWriter::new(std::fs::File::create(p)?))
    } else {
        Box::new(std::io::BufWriter::new(std::io::stdout()))
    })
}

fn run_index(contigs: &str, output: &str, block: usize) -> Result<()> {
    let mut reader = open_fasta(contigs)?;
    let mut seqs: Vec<Vec<u8>> = Vec::new();
    let mut total_len = 0usize;
    while let Some(rec) = reader.next_record()? {
        total_len += rec.seq.len();
        seqs.push(rec.seq);
    }
    if seqs.is_empty() {
        anyhow::bail!("FASTA file '{}' contains no sequences", contigs);
    }
    if total_len == 0 {
        anyhow::bail!("FASTA file '{}' contains only empty sequences", contigs);
    }

    println!("reference: {}", contigs);
    println!("sequences: {}", seqs.len());
    println!("total_len: {}", total_len);

    let views: Vec<&[u8]> = seqs.iter().map(Vec::as_slice).collect();
    let mut pair = IndexPair::from_reads(&views, block);
    pair.set_meta(IndexMeta {
        source_file: Some(contigs.to_string()),
        build_args: Some(std::env::args().collect::<Vec<_>>().join(" ")),
        build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
    });

    let out_path = format!("{}.fm", output);
    pair.save_to_file(&out_path)
        .map_err(|e| anyhow::anyhow!("cannot write index to '{}': {}", out_path, e))?;
    println!("paired FM index saved: {}", out_path);
    Ok(())
}

fn run_overlap(
    index_path: &str,
    queries_path: &str,
    out_path: Option<&str>,
    max_diff: i32,
    error_rate: Option<f64>,
    min_overlap: i32,
    max_frames: usize,
) -> Result<()> {
    let idx = IndexPair::load_from_file(index_path)
        .map_err(|e| anyhow::anyhow!("cannot load index '{}': {}", index_path, e))?;
    let mut reader = open_fasta(queries_path)?;
    let mut out = make_writer(out_path)?;
    let params = align::search::SearchParams {
        max_frames,
        ..align::search::SearchParams::default()
    };

    writeln!(out, "#query\tposition\tquery_len\tnum_diff")?;
    let mut n_queries = 0usize;
    let mut n_hits = 0usize;
    while let Some(rec) = reader.next_record()? {
        n_queries += 1;
        let query: Vec<u8> = rec.seq.iter().map(|&b| util::dna::to_alphabet(b)).collect();
        let mut hits = Vec::new();
        n_hits += match error_rate {
            Some(rate) => align::search::align_suffix_inexact(
                &query,
                &idx,
                rate,
                min_overlap,
                &params,
                &mut hits,
            ),
            None => align::search::align_suffix_max_diff(
                &query,
                &idx,
                max_diff,
                min_overlap,
                &params,
                &mut hits,
            ),
        };
        for hit in &hits {
            for pos in idx.fwd.positions(hit.interval.lower, hit.interval.upper) {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}",
                    rec.id,
                    pos,
                    rec.seq.len(),
                    hit.num_diff
                )?;
            }
        }
    }
    out.flush()?;
    eprintln!("queries: {}  hits: {}", n_queries, n_hits);
    Ok(())
}

fn run_scaffold(
    contigs_path: &str,
    scaf_path: &str,
    out_path: Option<&str>,
    opt: ScaffoldOpt,
    threads: usize,
) -> Result<()> {
    let mut reader = open_fasta(contigs_path)?;
    let mut store = SequenceStore::new();
    while let Some(rec) = reader.next_record()? {
        store.insert(&rec.id, util::dna::normalize_seq(&rec.seq));
    }
    if store.is_empty() {
        anyhow::bail!("FASTA file '{}' contains no sequences", contigs_path);
    }

    let scaf_fh = std::fs::File::open(scaf_path)
        .map_err(|e| anyhow::anyhow!("cannot open scaf file '{}': {}", scaf_path, e))?;
    let records = io::scaf::read_records(std::io::BufReader::new(scaf_fh));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;

    // 记录彼此独立：逐条并行，各自失败各自跳过
    let results: Vec<(usize, Result<(String, Vec<u8>)>)> = pool.install(|| {
        records
            .par_iter()
            .map(|(lineno, parsed)| {
                let assembled = match parsed {
                    Ok(rec) => generate_sequence(rec, &store, &opt)
                        .map(|seq| (rec.root_id.clone(), seq)),
                    Err(e) => Err(anyhow::anyhow!("{:#}", e)),
                };
                (*lineno, assembled)
            })
            .collect()
    });

    let mut out = make_writer(out_path)?;
    let mut written = 0usize;
    let mut skipped = 0usize;
    for (lineno, result) in results {
        match result {
            Ok((id, seq)) => {
                io::fasta::write_fasta_record(&mut out, &id, &seq, 80)?;
                written += 1;
            }
            Err(e) => {
                eprintln!("skipping scaffold record at line {}: {:#}", lineno, e);
                skipped += 1;
            }
        }
    }
    out.flush()?;
    eprintln!("scaffolds written: {}  skipped: {}", written, skipped);
    Ok(())
}
