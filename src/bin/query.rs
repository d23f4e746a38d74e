use std::io::{self, Write};
use std::{env, process};

use getopts::Options;

use snp_base::db::{FstRecord, IhsRecord, SnpHit};
use snp_base::error::Error;
use snp_base::{SnpBase, StoreInterface};

//-----------------------------------------------------------------------------

fn main() -> Result<(), Error> {
    // Parse arguments.
    let config = Config::new();

    // Open the database.
    let database = SnpBase::open(&config.db_file)?;
    let mut interface = StoreInterface::new(&database)?;

    // Run the query and write TSV rows to stdout.
    let mut output = io::stdout();
    match &config.search {
        Search::Snp(name) => {
            write_hits(&interface.find_snp(name)?, &mut output)?;
        }
        Search::Gene(name) => {
            write_hits(&interface.snps_for_gene(name)?, &mut output)?;
        }
        Search::Population(name) => {
            write_hits(&interface.snps_for_population(name)?, &mut output)?;
        }
        Search::Chromosome(chromosome) => {
            write_hits(&interface.snps_on_chromosome(chromosome)?, &mut output)?;
        }
        Search::Coordinates { chromosome, start, end } => {
            write_hits(&interface.snps_in_range(chromosome, *start, *end)?, &mut output)?;
        }
        Search::Fst(chromosome) => {
            write_fst(&interface.fst_for_chromosome(chromosome)?, &mut output)?;
        }
        Search::Ihs { chromosome, population } => {
            let rows = interface.ihs_for_chromosome(chromosome, population.as_deref())?;
            write_ihs(&rows, &mut output)?;
        }
    }

    Ok(())
}

//-----------------------------------------------------------------------------

enum Search {
    Snp(String),
    Gene(String),
    Population(String),
    Chromosome(String),
    Coordinates { chromosome: String, start: i64, end: i64 },
    Fst(String),
    Ihs { chromosome: String, population: Option<String> },
}

struct Config {
    pub db_file: String,
    pub search: Search,
}

impl Config {
    pub fn new() -> Config {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("s", "snp", "search by rsID", "NAME");
        opts.optopt("g", "gene", "search by gene name", "NAME");
        opts.optopt("p", "population", "search by population name", "NAME");
        opts.optopt("c", "chromosome", "search by chromosome", "CHR");
        opts.optopt("r", "coordinates", "search by inclusive coordinate range", "CHR:START-END");
        opts.optopt("", "fst", "FST rows for a chromosome", "CHR");
        opts.optopt("", "ihs", "iHS rows for a chromosome; -p restricts the population", "CHR");
        let matches = match opts.parse(&args[1..]) {
            Ok(matches) => matches,
            Err(err) => {
                eprintln!("{}", err);
                process::exit(1);
            }
        };

        let header = format!("Usage: {} [options] genetics.db", program);
        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }
        let db_file = if let Some(name) = matches.free.first() {
            name.clone()
        } else {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };

        let population = matches.opt_str("p");
        let mut search: Option<Search> = None;
        if let Some(name) = matches.opt_str("s") {
            search = Some(Search::Snp(name));
        } else if let Some(name) = matches.opt_str("g") {
            search = Some(Search::Gene(name));
        } else if let Some(chromosome) = matches.opt_str("c") {
            search = Some(Search::Chromosome(chromosome));
        } else if let Some(range) = matches.opt_str("r") {
            match parse_coordinates(&range) {
                Some((chromosome, start, end)) => {
                    search = Some(Search::Coordinates { chromosome, start, end });
                }
                None => {
                    eprintln!("Invalid coordinate range: {}", range);
                    process::exit(1);
                }
            }
        } else if let Some(chromosome) = matches.opt_str("fst") {
            search = Some(Search::Fst(chromosome));
        } else if let Some(chromosome) = matches.opt_str("ihs") {
            search = Some(Search::Ihs { chromosome, population });
        } else if let Some(name) = population {
            search = Some(Search::Population(name));
        }

        let search = match search {
            Some(search) => search,
            None => {
                eprint!("{}", opts.usage(&header));
                process::exit(1);
            }
        };

        Config { db_file, search }
    }
}

// Parses a range in the form CHR:START-END.
fn parse_coordinates(value: &str) -> Option<(String, i64, i64)> {
    let (chromosome, range) = value.split_once(':')?;
    let (start, end) = range.split_once('-')?;
    let start = start.trim().parse::<i64>().ok()?;
    let end = end.trim().parse::<i64>().ok()?;
    Some((chromosome.to_string(), start, end))
}

//-----------------------------------------------------------------------------

fn opt_string<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|x| x.to_string()).unwrap_or_default()
}

fn write_hits<W: Write>(hits: &[SnpHit], output: &mut W) -> io::Result<()> {
    for hit in hits {
        writeln!(
            output, "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            hit.snp_name, hit.chromosome, hit.start_position,
            opt_string(&hit.end_position), opt_string(&hit.gene_name),
            opt_string(&hit.p_value), opt_string(&hit.population_name)
        )?;
    }
    Ok(())
}

fn write_fst<W: Write>(rows: &[FstRecord], output: &mut W) -> io::Result<()> {
    for row in rows {
        writeln!(
            output, "{}\t{}\t{}\t{}",
            row.chromosome, row.position,
            opt_string(&row.snp_name), opt_string(&row.fst)
        )?;
    }
    Ok(())
}

fn write_ihs<W: Write>(rows: &[IhsRecord], output: &mut W) -> io::Result<()> {
    for row in rows {
        writeln!(
            output, "{}\t{}\t{}\t{}\t{}\t{}",
            row.chromosome, row.position, opt_string(&row.ihs_score),
            opt_string(&row.mean_ihs), opt_string(&row.std_ihs), row.population
        )?;
    }
    Ok(())
}

//-----------------------------------------------------------------------------
