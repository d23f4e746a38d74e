//! The normalized annotation store: a SQLite database and its query interface.

use crate::error::Error;
use crate::utils;

use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, Statement};

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

// Schema v1. Applied once per database; the version is recorded in Tags and
// checked on every open. Foreign keys are declared for documentation; an
// unresolved reference is stored as NULL rather than rejected.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS Tags (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS Genes (
        gene_id INTEGER PRIMARY KEY,
        gene_name TEXT NOT NULL,
        functional_term TEXT NOT NULL DEFAULT '',
        ontology_term TEXT,
        UNIQUE (gene_name, functional_term)
    ) STRICT;

    CREATE TABLE IF NOT EXISTS Populations (
        population_id INTEGER PRIMARY KEY,
        population_name TEXT NOT NULL UNIQUE,
        sampling_location TEXT
    ) STRICT;

    CREATE TABLE IF NOT EXISTS Snps (
        snp_id INTEGER PRIMARY KEY,
        snp_name TEXT NOT NULL UNIQUE,
        chromosome TEXT NOT NULL,
        start_position INTEGER NOT NULL,
        end_position INTEGER,
        p_value REAL,
        gene_id INTEGER REFERENCES Genes (gene_id)
    ) STRICT;

    CREATE TABLE IF NOT EXISTS SnpPopulationStats (
        snp_id INTEGER NOT NULL REFERENCES Snps (snp_id),
        population_id INTEGER NOT NULL REFERENCES Populations (population_id),
        allele_freq REAL,
        PRIMARY KEY (snp_id, population_id)
    ) STRICT;

    CREATE TABLE IF NOT EXISTS GeneAnnotations (
        gene_name TEXT NOT NULL,
        gene_id INTEGER REFERENCES Genes (gene_id),
        uniprot_id TEXT NOT NULL,
        uniprot_url TEXT,
        UNIQUE (gene_name, uniprot_id)
    ) STRICT;

    CREATE TABLE IF NOT EXISTS FstStats (
        chromosome TEXT NOT NULL,
        position INTEGER NOT NULL,
        snp_name TEXT,
        fst REAL,
        UNIQUE (chromosome, position)
    ) STRICT;

    CREATE TABLE IF NOT EXISTS IhsStats (
        chromosome TEXT NOT NULL,
        position INTEGER NOT NULL,
        ihs_score REAL,
        mean_ihs REAL,
        std_ihs REAL,
        population TEXT NOT NULL,
        UNIQUE (chromosome, position, population)
    ) STRICT;

    CREATE TABLE IF NOT EXISTS PopulationDetails (
        population_name TEXT NOT NULL UNIQUE,
        geographical_sampling_locations TEXT,
        genetic_diversity TEXT,
        disease_trait_associations TEXT
    ) STRICT;

    CREATE TABLE IF NOT EXISTS SubPopulationDetails (
        population TEXT NOT NULL,
        sub_population TEXT NOT NULL,
        genetic_diversity TEXT,
        disease_trait_associations TEXT,
        UNIQUE (population, sub_population)
    ) STRICT;

    CREATE TABLE IF NOT EXISTS Associations (
        var_id TEXT,
        snp_name TEXT,
        chromosome TEXT,
        clump_start INTEGER,
        clump_end INTEGER,
        p_value REAL,
        nearest_gene TEXT,
        consequence TEXT,
        ancestry TEXT,
        maf REAL,
        beta REAL,
        allele_frequencies TEXT
    ) STRICT;
";

//-----------------------------------------------------------------------------

/// A handle to a SNP-base database.
///
/// The handle owns the connection and releases it when dropped, so the
/// database is closed on every exit path. A writable handle from
/// [`SnpBase::open_or_create`] is used by the ingestion pipeline; read-only
/// handles from [`SnpBase::open`] serve queries through [`StoreInterface`]
/// and may be open concurrently with an ingestion run. Ingestion runs
/// themselves must be externally serialized: the store is single-writer.
///
/// # Examples
///
/// ```
/// use snp_base::{ingest, utils, SnpBase, SourceFiles};
/// use std::fs;
///
/// // Build a database from the test files.
/// let db_file = utils::temp_file_name("snp-base");
/// let mut database = SnpBase::open_or_create(&db_file).unwrap();
/// let sources = SourceFiles {
///     associations: Some(utils::get_test_data("associations.tsv")),
///     ..SourceFiles::default()
/// };
/// let summary = ingest::run(&mut database, &sources).unwrap();
/// assert_eq!(summary.snps, 4);
/// drop(database);
///
/// // Open it read-only and check some statistics.
/// let database = SnpBase::open(&db_file).unwrap();
/// assert_eq!(database.version(), SnpBase::VERSION);
/// assert_eq!(database.genes().unwrap(), 5);
/// assert_eq!(database.snps().unwrap(), 4);
///
/// // Clean up.
/// drop(database);
/// fs::remove_file(&db_file).unwrap();
/// ```
#[derive(Debug)]
pub struct SnpBase {
    pub(crate) connection: Connection,
    version: String,
}

impl SnpBase {
    /// Current database version.
    pub const VERSION: &'static str = "SNP-base v1";

    // Key for database version.
    const KEY_VERSION: &'static str = "version";

    /// Opens a read-only connection to the database in the given file.
    ///
    /// Returns [`Error::StoreUnavailable`] if the file cannot be opened or
    /// the database version is not supported.
    pub fn open<P: AsRef<Path>>(filename: P) -> Result<Self, Error> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = Connection::open_with_flags(&filename, flags).map_err(|x| {
            Error::StoreUnavailable(format!("{}: {}", filename.as_ref().display(), x))
        })?;
        let version = Self::read_version(&connection, filename.as_ref())?;
        Ok(SnpBase { connection, version })
    }

    /// Opens a writable connection, creating the database and applying the
    /// schema if necessary.
    ///
    /// The schema is versioned and applied once; reopening an existing
    /// database only validates the stored version. This is the handle the
    /// ingestion pipeline works with.
    pub fn open_or_create<P: AsRef<Path>>(filename: P) -> Result<Self, Error> {
        let connection = Connection::open(&filename).map_err(|x| {
            Error::StoreUnavailable(format!("{}: {}", filename.as_ref().display(), x))
        })?;
        connection.execute_batch(SCHEMA).map_err(|x| {
            Error::StoreUnavailable(format!("cannot apply schema: {}", x))
        })?;
        connection.execute(
            "INSERT OR IGNORE INTO Tags (key, value) VALUES (?1, ?2)",
            (Self::KEY_VERSION, Self::VERSION),
        )?;
        let version = Self::read_version(&connection, filename.as_ref())?;
        Ok(SnpBase { connection, version })
    }

    /// Creates a new empty database in the given file.
    ///
    /// Returns an error if the database already exists.
    pub fn create<P: AsRef<Path>>(filename: P) -> Result<(), Error> {
        if Self::exists(&filename) {
            return Err(Error::StoreUnavailable(format!(
                "database {} already exists", filename.as_ref().display()
            )));
        }
        let _ = Self::open_or_create(&filename)?;
        Ok(())
    }

    /// Returns `true` if the database file exists.
    pub fn exists<P: AsRef<Path>>(filename: P) -> bool {
        utils::file_exists(filename)
    }

    fn read_version(connection: &Connection, filename: &Path) -> Result<String, Error> {
        let version: String = connection
            .query_row(
                "SELECT value FROM Tags WHERE key = ?1",
                (Self::KEY_VERSION,),
                |row| row.get(0),
            )
            .map_err(|x| {
                Error::StoreUnavailable(format!(
                    "{} is not a SNP-base database: {}", filename.display(), x
                ))
            })?;
        if version != Self::VERSION {
            return Err(Error::StoreUnavailable(format!(
                "unsupported database version: {} (expected {})", version, Self::VERSION
            )));
        }
        Ok(version)
    }

    /// Returns the filename of the database or [`None`] if there is no filename.
    pub fn filename(&self) -> Option<&str> {
        self.connection.path()
    }

    /// Returns the size of the database file in a human-readable format.
    pub fn file_size(&self) -> Option<String> {
        let filename = self.filename()?;
        utils::file_size(filename)
    }

    /// Returns the version of the database.
    pub fn version(&self) -> &str {
        &self.version
    }

    fn count_rows(&self, sql: &str) -> Result<usize, Error> {
        let count = self.connection.query_row(sql, (), |row| row.get::<_, usize>(0))?;
        Ok(count)
    }

    /// Returns the number of gene rows.
    pub fn genes(&self) -> Result<usize, Error> {
        self.count_rows("SELECT COUNT(*) FROM Genes")
    }

    /// Returns the number of population rows.
    pub fn populations(&self) -> Result<usize, Error> {
        self.count_rows("SELECT COUNT(*) FROM Populations")
    }

    /// Returns the number of SNP rows.
    pub fn snps(&self) -> Result<usize, Error> {
        self.count_rows("SELECT COUNT(*) FROM Snps")
    }

    /// Returns the number of rows in the SNP / population junction table.
    pub fn snp_population_stats(&self) -> Result<usize, Error> {
        self.count_rows("SELECT COUNT(*) FROM SnpPopulationStats")
    }

    /// Returns the number of gene-function annotation rows.
    pub fn annotations(&self) -> Result<usize, Error> {
        self.count_rows("SELECT COUNT(*) FROM GeneAnnotations")
    }

    /// Returns the number of FST rows.
    pub fn fst_rows(&self) -> Result<usize, Error> {
        self.count_rows("SELECT COUNT(*) FROM FstStats")
    }

    /// Returns the number of iHS rows.
    pub fn ihs_rows(&self) -> Result<usize, Error> {
        self.count_rows("SELECT COUNT(*) FROM IhsStats")
    }

    /// Returns the number of staged association rows.
    pub fn staged_associations(&self) -> Result<usize, Error> {
        self.count_rows("SELECT COUNT(*) FROM Associations")
    }
}

//-----------------------------------------------------------------------------

/// A gene row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneRecord {
    pub gene_id: i64,
    pub gene_name: String,
    /// Functional annotation; an empty string when the source had none.
    pub functional_term: String,
    pub ontology_term: Option<String>,
}

/// A population row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationRecord {
    pub population_id: i64,
    pub population_name: String,
    pub sampling_location: Option<String>,
}

/// A SNP row.
#[derive(Debug, Clone, PartialEq)]
pub struct SnpRecord {
    pub snp_id: i64,
    pub snp_name: String,
    pub chromosome: String,
    pub start_position: i64,
    pub end_position: Option<i64>,
    pub p_value: Option<f64>,
    /// Mapped gene, or [`None`] if the reference did not resolve.
    pub gene_id: Option<i64>,
}

/// One row of the joined SNP search projection.
///
/// The fields are in the declared column order of the data model: SNP name,
/// chromosome, positions, gene name, p-value, population name.
#[derive(Debug, Clone, PartialEq)]
pub struct SnpHit {
    pub snp_name: String,
    pub chromosome: String,
    pub start_position: i64,
    pub end_position: Option<i64>,
    pub gene_name: Option<String>,
    pub p_value: Option<f64>,
    pub population_name: Option<String>,
}

/// A gene-function annotation row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    pub gene_name: String,
    pub gene_id: Option<i64>,
    pub uniprot_id: String,
    pub uniprot_url: Option<String>,
}

/// An FST row, linked to SNPs only by name-match at query time.
#[derive(Debug, Clone, PartialEq)]
pub struct FstRecord {
    pub chromosome: String,
    pub position: i64,
    pub snp_name: Option<String>,
    pub fst: Option<f64>,
}

/// An iHS row.
#[derive(Debug, Clone, PartialEq)]
pub struct IhsRecord {
    pub chromosome: String,
    pub position: i64,
    pub ihs_score: Option<f64>,
    pub mean_ihs: Option<f64>,
    pub std_ihs: Option<f64>,
    pub population: String,
}

/// A population metadata row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationDetailRecord {
    pub population_name: String,
    pub geographical_sampling_locations: Option<String>,
    pub genetic_diversity: Option<String>,
    pub disease_trait_associations: Option<String>,
}

/// A sub-population metadata row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubPopulationRecord {
    pub population: String,
    pub sub_population: String,
    pub genetic_diversity: Option<String>,
    pub disease_trait_associations: Option<String>,
}

//-----------------------------------------------------------------------------

// The joined projection behind the SNP search operations.
const SNP_PROJECTION: &str = "
    SELECT DISTINCT
        Snps.snp_name, Snps.chromosome, Snps.start_position, Snps.end_position,
        Genes.gene_name, Snps.p_value, Populations.population_name
    FROM Snps
    LEFT JOIN Genes ON Snps.gene_id = Genes.gene_id
    LEFT JOIN SnpPopulationStats ON Snps.snp_id = SnpPopulationStats.snp_id
    LEFT JOIN Populations
        ON SnpPopulationStats.population_id = Populations.population_id
";

/// Database query interface.
///
/// This structure stores prepared statements for the read side of the store.
/// All queries are parametrized; user input is never concatenated into query
/// text. Result sets are ordered sequences of rows in the declared column
/// order of the data model.
///
/// # Examples
///
/// ```
/// use snp_base::{ingest, utils, SnpBase, SourceFiles, StoreInterface};
/// use std::fs;
///
/// let db_file = utils::temp_file_name("store-interface");
/// let mut database = SnpBase::open_or_create(&db_file).unwrap();
/// let sources = SourceFiles {
///     associations: Some(utils::get_test_data("associations.tsv")),
///     ..SourceFiles::default()
/// };
/// let _ = ingest::run(&mut database, &sources).unwrap();
///
/// let mut interface = StoreInterface::new(&database).unwrap();
/// let hits = interface.find_snp("rs100").unwrap();
/// assert!(!hits.is_empty());
/// assert_eq!(hits[0].chromosome, "7");
/// assert_eq!(hits[0].start_position, 100);
///
/// // Clean up.
/// drop(interface);
/// drop(database);
/// fs::remove_file(&db_file).unwrap();
/// ```
#[derive(Debug)]
pub struct StoreInterface<'a> {
    find_snp: Statement<'a>,
    get_snp: Statement<'a>,
    snps_on_chromosome: Statement<'a>,
    snps_in_range: Statement<'a>,
    snps_for_gene: Statement<'a>,
    snps_for_population: Statement<'a>,
    genes_by_name: Statement<'a>,
    population_by_name: Statement<'a>,
    annotations_for_gene: Statement<'a>,
    frequencies_for_snp: Statement<'a>,
    population_details: Statement<'a>,
    sub_populations: Statement<'a>,
    fst_for_chromosome: Statement<'a>,
    ihs_for_chromosome: Statement<'a>,
    ihs_for_population: Statement<'a>,
}

impl<'a> StoreInterface<'a> {
    /// Returns a new interface to the given database.
    ///
    /// Passes through any database errors.
    pub fn new(database: &'a SnpBase) -> Result<Self, Error> {
        let connection = &database.connection;

        let find_snp = connection.prepare(
            &format!("{} WHERE Snps.snp_name = ?1 ORDER BY Populations.population_name", SNP_PROJECTION)
        )?;
        let get_snp = connection.prepare(
            "SELECT snp_id, snp_name, chromosome, start_position, end_position, p_value, gene_id
            FROM Snps WHERE snp_name = ?1"
        )?;
        let snps_on_chromosome = connection.prepare(
            &format!("{} WHERE Snps.chromosome = ?1 ORDER BY Snps.start_position", SNP_PROJECTION)
        )?;
        let snps_in_range = connection.prepare(
            &format!(
                "{} WHERE Snps.chromosome = ?1
                AND IFNULL(Snps.end_position, Snps.start_position) BETWEEN ?2 AND ?3
                ORDER BY Snps.start_position",
                SNP_PROJECTION
            )
        )?;
        let snps_for_gene = connection.prepare(
            &format!("{} WHERE Genes.gene_name = ?1 ORDER BY Snps.start_position", SNP_PROJECTION)
        )?;
        let snps_for_population = connection.prepare(
            &format!("{} WHERE Populations.population_name = ?1 ORDER BY Snps.start_position", SNP_PROJECTION)
        )?;

        let genes_by_name = connection.prepare(
            "SELECT gene_id, gene_name, functional_term, ontology_term
            FROM Genes WHERE gene_name = ?1 ORDER BY functional_term"
        )?;
        let population_by_name = connection.prepare(
            "SELECT population_id, population_name, sampling_location
            FROM Populations WHERE population_name = ?1"
        )?;
        let annotations_for_gene = connection.prepare(
            "SELECT gene_name, gene_id, uniprot_id, uniprot_url
            FROM GeneAnnotations WHERE gene_name = ?1 ORDER BY uniprot_id"
        )?;
        let frequencies_for_snp = connection.prepare(
            "SELECT Populations.population_name, SnpPopulationStats.allele_freq
            FROM SnpPopulationStats
            JOIN Snps ON SnpPopulationStats.snp_id = Snps.snp_id
            JOIN Populations ON SnpPopulationStats.population_id = Populations.population_id
            WHERE Snps.snp_name = ?1
            ORDER BY Populations.population_name"
        )?;
        let population_details = connection.prepare(
            "SELECT population_name, geographical_sampling_locations,
                genetic_diversity, disease_trait_associations
            FROM PopulationDetails WHERE population_name = ?1"
        )?;
        let sub_populations = connection.prepare(
            "SELECT population, sub_population, genetic_diversity, disease_trait_associations
            FROM SubPopulationDetails WHERE population = ?1 ORDER BY sub_population"
        )?;
        let fst_for_chromosome = connection.prepare(
            "SELECT chromosome, position, snp_name, fst
            FROM FstStats WHERE chromosome = ?1 ORDER BY position"
        )?;
        let ihs_for_chromosome = connection.prepare(
            "SELECT chromosome, position, ihs_score, mean_ihs, std_ihs, population
            FROM IhsStats WHERE chromosome = ?1 ORDER BY position, population"
        )?;
        let ihs_for_population = connection.prepare(
            "SELECT chromosome, position, ihs_score, mean_ihs, std_ihs, population
            FROM IhsStats WHERE chromosome = ?1 AND population = ?2 ORDER BY position"
        )?;

        Ok(StoreInterface {
            find_snp, get_snp,
            snps_on_chromosome, snps_in_range, snps_for_gene, snps_for_population,
            genes_by_name, population_by_name,
            annotations_for_gene, frequencies_for_snp,
            population_details, sub_populations,
            fst_for_chromosome, ihs_for_chromosome, ihs_for_population,
        })
    }

    fn row_to_snp_hit(row: &Row) -> rusqlite::Result<SnpHit> {
        Ok(SnpHit {
            snp_name: row.get(0)?,
            chromosome: row.get(1)?,
            start_position: row.get(2)?,
            end_position: row.get(3)?,
            gene_name: row.get(4)?,
            p_value: row.get(5)?,
            population_name: row.get(6)?,
        })
    }

    fn collect_hits(
        statement: &mut Statement, params: impl rusqlite::Params
    ) -> Result<Vec<SnpHit>, Error> {
        let mut result: Vec<SnpHit> = Vec::new();
        let mut rows = statement.query(params)?;
        while let Some(row) = rows.next()? {
            result.push(Self::row_to_snp_hit(row)?);
        }
        Ok(result)
    }

    /// Returns the joined search rows for the SNP with the given rsID.
    ///
    /// One row per linked population; a single row with an empty population
    /// field when the SNP has no frequency data.
    pub fn find_snp(&mut self, snp_name: &str) -> Result<Vec<SnpHit>, Error> {
        Self::collect_hits(&mut self.find_snp, (snp_name,))
    }

    /// Returns the SNP row with the given rsID, or [`None`] if there is none.
    pub fn get_snp(&mut self, snp_name: &str) -> Result<Option<SnpRecord>, Error> {
        let result = self.get_snp.query_row((snp_name,), |row| {
            Ok(SnpRecord {
                snp_id: row.get(0)?,
                snp_name: row.get(1)?,
                chromosome: row.get(2)?,
                start_position: row.get(3)?,
                end_position: row.get(4)?,
                p_value: row.get(5)?,
                gene_id: row.get(6)?,
            })
        }).optional()?;
        Ok(result)
    }

    /// Returns all search rows on the given chromosome, ordered by position.
    pub fn snps_on_chromosome(&mut self, chromosome: &str) -> Result<Vec<SnpHit>, Error> {
        Self::collect_hits(&mut self.snps_on_chromosome, (chromosome,))
    }

    /// Returns the search rows for SNPs in an inclusive coordinate range.
    ///
    /// A SNP matches when the position where it ends lies within
    /// `start..=end`; a SNP without an end position matches on its start
    /// position instead.
    pub fn snps_in_range(
        &mut self, chromosome: &str, start: i64, end: i64
    ) -> Result<Vec<SnpHit>, Error> {
        Self::collect_hits(&mut self.snps_in_range, (chromosome, start, end))
    }

    /// Returns the search rows for SNPs mapped to the given gene.
    pub fn snps_for_gene(&mut self, gene_name: &str) -> Result<Vec<SnpHit>, Error> {
        Self::collect_hits(&mut self.snps_for_gene, (gene_name,))
    }

    /// Returns the search rows for SNPs observed in the given population.
    pub fn snps_for_population(&mut self, population_name: &str) -> Result<Vec<SnpHit>, Error> {
        Self::collect_hits(&mut self.snps_for_population, (population_name,))
    }

    /// Returns the gene rows with the given name, one per functional term.
    pub fn genes_by_name(&mut self, gene_name: &str) -> Result<Vec<GeneRecord>, Error> {
        let mut result: Vec<GeneRecord> = Vec::new();
        let mut rows = self.genes_by_name.query((gene_name,))?;
        while let Some(row) = rows.next()? {
            result.push(GeneRecord {
                gene_id: row.get(0)?,
                gene_name: row.get(1)?,
                functional_term: row.get(2)?,
                ontology_term: row.get(3)?,
            });
        }
        Ok(result)
    }

    /// Returns the population with the given name, or [`None`] if there is none.
    pub fn population_by_name(
        &mut self, population_name: &str
    ) -> Result<Option<PopulationRecord>, Error> {
        let result = self.population_by_name.query_row((population_name,), |row| {
            Ok(PopulationRecord {
                population_id: row.get(0)?,
                population_name: row.get(1)?,
                sampling_location: row.get(2)?,
            })
        }).optional()?;
        Ok(result)
    }

    /// Returns the gene-function annotations stored for the given gene.
    pub fn annotations_for_gene(
        &mut self, gene_name: &str
    ) -> Result<Vec<AnnotationRecord>, Error> {
        let mut result: Vec<AnnotationRecord> = Vec::new();
        let mut rows = self.annotations_for_gene.query((gene_name,))?;
        while let Some(row) = rows.next()? {
            result.push(AnnotationRecord {
                gene_name: row.get(0)?,
                gene_id: row.get(1)?,
                uniprot_id: row.get(2)?,
                uniprot_url: row.get(3)?,
            });
        }
        Ok(result)
    }

    /// Returns the per-population allele frequencies for the given SNP,
    /// ordered by population name.
    pub fn frequencies_for_snp(
        &mut self, snp_name: &str
    ) -> Result<Vec<(String, Option<f64>)>, Error> {
        let mut result: Vec<(String, Option<f64>)> = Vec::new();
        let mut rows = self.frequencies_for_snp.query((snp_name,))?;
        while let Some(row) = rows.next()? {
            result.push((row.get(0)?, row.get(1)?));
        }
        Ok(result)
    }

    /// Returns the metadata row for the given population, if any.
    pub fn population_details(
        &mut self, population_name: &str
    ) -> Result<Option<PopulationDetailRecord>, Error> {
        let result = self.population_details.query_row((population_name,), |row| {
            Ok(PopulationDetailRecord {
                population_name: row.get(0)?,
                geographical_sampling_locations: row.get(1)?,
                genetic_diversity: row.get(2)?,
                disease_trait_associations: row.get(3)?,
            })
        }).optional()?;
        Ok(result)
    }

    /// Returns the sub-populations of the given population.
    pub fn sub_populations(
        &mut self, population_name: &str
    ) -> Result<Vec<SubPopulationRecord>, Error> {
        let mut result: Vec<SubPopulationRecord> = Vec::new();
        let mut rows = self.sub_populations.query((population_name,))?;
        while let Some(row) = rows.next()? {
            result.push(SubPopulationRecord {
                population: row.get(0)?,
                sub_population: row.get(1)?,
                genetic_diversity: row.get(2)?,
                disease_trait_associations: row.get(3)?,
            });
        }
        Ok(result)
    }

    fn row_to_ihs(row: &Row) -> rusqlite::Result<IhsRecord> {
        Ok(IhsRecord {
            chromosome: row.get(0)?,
            position: row.get(1)?,
            ihs_score: row.get(2)?,
            mean_ihs: row.get(3)?,
            std_ihs: row.get(4)?,
            population: row.get(5)?,
        })
    }

    /// Returns the FST rows on the given chromosome, ordered by position.
    pub fn fst_for_chromosome(&mut self, chromosome: &str) -> Result<Vec<FstRecord>, Error> {
        let mut result: Vec<FstRecord> = Vec::new();
        let mut rows = self.fst_for_chromosome.query((chromosome,))?;
        while let Some(row) = rows.next()? {
            result.push(FstRecord {
                chromosome: row.get(0)?,
                position: row.get(1)?,
                snp_name: row.get(2)?,
                fst: row.get(3)?,
            });
        }
        Ok(result)
    }

    /// Returns the iHS rows on the given chromosome, optionally restricted to
    /// one population, ordered by position.
    pub fn ihs_for_chromosome(
        &mut self, chromosome: &str, population: Option<&str>
    ) -> Result<Vec<IhsRecord>, Error> {
        let mut result: Vec<IhsRecord> = Vec::new();
        match population {
            None => {
                let mut rows = self.ihs_for_chromosome.query((chromosome,))?;
                while let Some(row) = rows.next()? {
                    result.push(Self::row_to_ihs(row)?);
                }
            }
            Some(name) => {
                let mut rows = self.ihs_for_population.query((chromosome, name))?;
                while let Some(row) = rows.next()? {
                    result.push(Self::row_to_ihs(row)?);
                }
            }
        }
        Ok(result)
    }
}

//-----------------------------------------------------------------------------
