use std::path::PathBuf;
use std::time::Instant;
use std::{env, fs, process};

use getopts::Options;

use snp_base::error::Error;
use snp_base::{ingest, SnpBase, SourceFiles};

//-----------------------------------------------------------------------------

fn main() -> Result<(), Error> {
    let start_time = Instant::now();

    // Parse arguments.
    let config = Config::new();

    if config.overwrite && SnpBase::exists(&config.db_file) {
        eprintln!("Overwriting database {}", config.db_file.display());
        fs::remove_file(&config.db_file)?;
    }

    // Open the store and run the pipeline.
    let mut database = SnpBase::open_or_create(&config.db_file)?;
    let summary = ingest::run(&mut database, &config.sources)?;

    // Statistics.
    eprintln!(
        "The store contains {} genes, {} populations, {} SNPs, and {} frequency rows",
        database.genes()?, database.populations()?,
        database.snps()?, database.snp_population_stats()?
    );
    if summary.skipped_rows > 0 || summary.undecodable_blobs > 0 {
        eprintln!(
            "Skipped {} rows and {} allele-frequency blobs",
            summary.skipped_rows, summary.undecodable_blobs
        );
    }
    if summary.unresolved_genes > 0 || summary.unresolved_frequencies > 0 {
        eprintln!(
            "Unresolved references: {} genes, {} frequency entries",
            summary.unresolved_genes, summary.unresolved_frequencies
        );
    }
    if let Some(size) = database.file_size() {
        eprintln!("Database size: {}", size);
    }

    let end_time = Instant::now();
    let seconds = end_time.duration_since(start_time).as_secs_f64();
    eprintln!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub db_file: PathBuf,
    pub overwrite: bool,
    pub sources: SourceFiles,
}

impl Config {
    pub fn new() -> Config {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("a", "associations", "association summary statistics (TSV)", "FILE");
        opts.optopt("g", "gene-functions", "gene-function mappings (TSV)", "FILE");
        opts.optopt("f", "fst", "FST table (CSV)", "FILE");
        opts.optopt("i", "ihs", "iHS table (TSV)", "FILE");
        opts.optopt("p", "populations", "population metadata (TSV)", "FILE");
        opts.optopt("s", "sub-populations", "sub-population metadata (TSV)", "FILE");
        opts.optflag("", "overwrite", "overwrite the database file if it exists");
        let matches = match opts.parse(&args[1..]) {
            Ok(matches) => matches,
            Err(err) => {
                eprintln!("{}", err);
                process::exit(1);
            }
        };

        let header = format!("Usage: {} [options] output.db", program);
        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }
        let db_file = if let Some(name) = matches.free.first() {
            PathBuf::from(name)
        } else {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };

        let sources = SourceFiles {
            associations: matches.opt_str("a").map(PathBuf::from),
            gene_functions: matches.opt_str("g").map(PathBuf::from),
            fst: matches.opt_str("f").map(PathBuf::from),
            ihs: matches.opt_str("i").map(PathBuf::from),
            population_details: matches.opt_str("p").map(PathBuf::from),
            sub_population_details: matches.opt_str("s").map(PathBuf::from),
        };

        Config {
            db_file,
            overwrite: matches.opt_present("overwrite"),
            sources,
        }
    }
}

//-----------------------------------------------------------------------------
