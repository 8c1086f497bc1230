pub mod tinycore;

use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;
use tinycore::corpus::CollectionReader;
use tinycore::error::Result;
use tinycore::index::disk::{self, DiskIndex};
use tinycore::index::IndexBuilder;
use tinycore::search::SearchEngine;

#[derive(Parser)]
#[derive(Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
/// A minimal BM25 search engine for TREC-style tagged collections
struct Cli {
    #[clap(short, long, value_parser, default_value_t = String::from("."))]
    /// Index directory
    index_dir: String,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[derive(Debug)]
enum Commands {
    /// Build an index from a tagged collection file
    Index {
        #[clap(value_parser)]
        /// Collection file
        collection: String,
    },
    /// Rank queries read from standard input
    Search,
    /// Print index statistics
    Stats,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Index { collection } => command_index(collection, &cli.index_dir),
        Commands::Search => command_search(&cli.index_dir),
        Commands::Stats => command_stats(&cli.index_dir),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn command_index(collection: &str, index_dir: &str) -> Result<()> {
    let mut builder = IndexBuilder::new();
    for line in CollectionReader::open(Path::new(collection))? {
        builder.index_line(&line?);
    }
    let index = builder.finish();
    let count = index.get_document_count();
    if count == 0 {
        log::warn!("no documents in {}, nothing to write", collection);
        return Ok(());
    }
    log::info!("indexed {} documents, serialising", count);
    disk::write_index(&index, Path::new(index_dir))?;
    println!("{} documents indexed", count);
    Ok(())
}

fn command_search(index_dir: &str) -> Result<()> {
    let mut engine = SearchEngine::open(Path::new(index_dir))?;
    log::info!("index of {} documents loaded", engine.get_document_count());
    let stdin = io::stdin();
    let stdout = io::stdout();
    // result lines only on stdout, diagnostics go through the logger
    let mut out = io::BufWriter::new(stdout.lock());
    for line in stdin.lock().lines() {
        let results = engine.search(&line?)?;
        engine.write_results(&results, &mut out)?;
        out.flush()?;
    }
    Ok(())
}

fn command_stats(index_dir: &str) -> Result<()> {
    let mut index = DiskIndex::open(Path::new(index_dir))?;
    let stats = index.stats()?;
    println!("documents: {}", stats.document_count);
    println!("average document length: {:.2}", stats.average_document_length);
    println!("shortest document: {}", stats.shortest_document);
    println!("longest document: {}", stats.longest_document);
    println!("unique terms: {}", stats.term_count);
    if let Some((term, occurrences)) = &stats.most_common {
        println!("most common term: '{}' occurs {} times", term, occurrences);
    }
    Ok(())
}
