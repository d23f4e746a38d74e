//! Reading the delimited source files.
//!
//! Each of the six source kinds is a delimited text file with a header line.
//! A [`DelimitedReader`] turns such a file into a lazy, finite sequence of
//! typed rows. The sequence is restartable by opening a new reader for the
//! same path. The files may be gzip-compressed.
//!
//! Column handling follows the ingestion contract:
//!
//! * A missing required column is detected from the header when the reader is
//!   opened and fails with [`Error::MalformedInput`].
//! * Unexpected extra columns are ignored.
//! * A numeric cell that cannot be coerced makes that row an `Err` item;
//!   the caller logs it and skips the row instead of aborting the batch.
//!
//! The row types are: [`AssociationRow`] (GWAS association summary),
//! [`GeneFunctionRow`] (gene-function mapping), [`FstRow`] and [`IhsRow`]
//! (selection-statistic tables), and [`PopulationDetailRow`] /
//! [`SubPopulationRow`] (population metadata).

use crate::error::Error;
use crate::utils;

use std::collections::HashMap;
use std::fmt::Display;
use std::io::BufRead;
use std::marker::PhantomData;
use std::path::Path;
use std::str::FromStr;

use csv::StringRecord;


//-----------------------------------------------------------------------------

/// A mapping from column names to field indexes, built from a header line.
#[derive(Debug, Clone)]
pub struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        let mut index = HashMap::new();
        for (offset, name) in headers.iter().enumerate() {
            index.entry(name.trim().to_string()).or_insert(offset);
        }
        Columns { index }
    }

    /// Returns the field index for the given column name.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

//-----------------------------------------------------------------------------

/// A typed row from one of the source file kinds.
pub trait SourceRow: Sized {
    /// Name of the source kind, used in error messages.
    const SOURCE: &'static str;

    /// Default field delimiter for this source kind.
    const DELIMITER: u8;

    /// Columns that must be present in the header line.
    fn required_columns() -> &'static [&'static str];

    /// Parses one record. An error is row-level: log and skip.
    fn parse(record: &StringRecord, columns: &Columns) -> Result<Self, Error>;
}

/// A lazy reader over the typed rows of one source file.
///
/// # Examples
///
/// ```
/// use snp_base::formats::{AssociationRow, DelimitedReader};
/// use snp_base::utils;
///
/// let path = utils::get_test_data("associations.tsv");
/// let reader = DelimitedReader::<AssociationRow>::open(&path).unwrap();
/// let rows: Vec<AssociationRow> = reader.filter_map(Result::ok).collect();
/// assert_eq!(rows[0].snp_name.as_deref(), Some("rs100"));
/// assert_eq!(rows[0].clump_start, Some(100));
/// ```
pub struct DelimitedReader<R: SourceRow> {
    reader: csv::Reader<Box<dyn BufRead>>,
    columns: Columns,
    _marker: PhantomData<R>,
}

impl<R: SourceRow> DelimitedReader<R> {
    /// Opens the file with the default delimiter for the source kind.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::with_delimiter(path, R::DELIMITER)
    }

    /// Opens the file with the given field delimiter.
    ///
    /// Returns [`Error::MalformedInput`] if a required column is missing from
    /// the header line.
    pub fn with_delimiter<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self, Error> {
        let input = utils::open_file(&path)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(input);
        let columns = Columns::new(reader.headers()?);

        let missing: Vec<&str> = R::required_columns().iter()
            .copied()
            .filter(|name| columns.get(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MalformedInput(format!(
                "{} file {} is missing required columns: {}",
                R::SOURCE, path.as_ref().display(), missing.join(", ")
            )));
        }

        Ok(DelimitedReader {
            reader,
            columns,
            _marker: PhantomData,
        })
    }

    /// Returns the column mapping built from the header line.
    pub fn columns(&self) -> &Columns {
        &self.columns
    }
}

impl<R: SourceRow> Iterator for DelimitedReader<R> {
    type Item = Result<R, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = StringRecord::new();
        match self.reader.read_record(&mut record) {
            Ok(false) => None,
            Ok(true) => Some(R::parse(&record, &self.columns)),
            Err(err) => Some(Err(err.into())),
        }
    }
}

//-----------------------------------------------------------------------------

// Field accessors shared by the row types. Empty cells and the NA marker
// count as absent values.

fn field<'a>(record: &'a StringRecord, columns: &Columns, name: &str) -> Option<&'a str> {
    let index = columns.get(name)?;
    let value = record.get(index)?.trim();
    if value.is_empty() || value == "NA" {
        None
    } else {
        Some(value)
    }
}

fn string_field(record: &StringRecord, columns: &Columns, name: &str) -> Option<String> {
    field(record, columns, name).map(str::to_string)
}

fn required_field(
    record: &StringRecord, columns: &Columns, name: &str, source: &str
) -> Result<String, Error> {
    string_field(record, columns, name).ok_or_else(|| {
        Error::MalformedInput(format!("{} row has no value for column {}", source, name))
    })
}

fn numeric_field<T>(
    record: &StringRecord, columns: &Columns, name: &str, source: &str
) -> Result<Option<T>, Error>
where
    T: FromStr,
    T::Err: Display,
{
    match field(record, columns, name) {
        None => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(|err| {
            Error::MalformedInput(format!(
                "{} row has an invalid value {:?} in column {}: {}", source, value, name, err
            ))
        }),
    }
}

fn required_numeric<T>(
    record: &StringRecord, columns: &Columns, name: &str, source: &str
) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
{
    numeric_field(record, columns, name, source)?.ok_or_else(|| {
        Error::MalformedInput(format!("{} row has no value for column {}", source, name))
    })
}

//-----------------------------------------------------------------------------

/// One row of the GWAS association summary file.
///
/// All cells are optional: the row is staged as-is and the downstream
/// pipeline stages decide what qualifies. The `af` cell holds the raw
/// per-population allele-frequency blob; it is decoded later by
/// [`crate::resolve::decode_allele_frequencies`].
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationRow {
    pub var_id: Option<String>,
    /// The rsID from the `dbSNP` column.
    pub snp_name: Option<String>,
    pub chromosome: Option<String>,
    pub clump_start: Option<i64>,
    pub clump_end: Option<i64>,
    pub p_value: Option<f64>,
    /// Nearest gene, possibly in list-literal form.
    pub nearest_gene: Option<String>,
    pub consequence: Option<String>,
    pub ancestry: Option<String>,
    pub maf: Option<f64>,
    pub beta: Option<f64>,
    /// Raw allele-frequency blob from the `af` column.
    pub allele_frequencies: Option<String>,
}

impl SourceRow for AssociationRow {
    const SOURCE: &'static str = "association summary";
    const DELIMITER: u8 = b'\t';

    fn required_columns() -> &'static [&'static str] {
        &["dbSNP", "chromosome", "clumpStart", "nearest", "consequence", "af"]
    }

    fn parse(record: &StringRecord, columns: &Columns) -> Result<Self, Error> {
        Ok(AssociationRow {
            var_id: string_field(record, columns, "varId"),
            snp_name: string_field(record, columns, "dbSNP"),
            chromosome: string_field(record, columns, "chromosome"),
            clump_start: numeric_field(record, columns, "clumpStart", Self::SOURCE)?,
            clump_end: numeric_field(record, columns, "clumpEnd", Self::SOURCE)?,
            p_value: numeric_field(record, columns, "pValue", Self::SOURCE)?,
            nearest_gene: string_field(record, columns, "nearest"),
            consequence: string_field(record, columns, "consequence"),
            ancestry: string_field(record, columns, "ancestry"),
            maf: numeric_field(record, columns, "maf", Self::SOURCE)?,
            beta: numeric_field(record, columns, "beta", Self::SOURCE)?,
            allele_frequencies: string_field(record, columns, "af"),
        })
    }
}

//-----------------------------------------------------------------------------

/// One row of the gene-function mapping file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneFunctionRow {
    /// Gene name, possibly in list-literal form.
    pub gene_name: String,
    pub uniprot_id: String,
    pub uniprot_url: Option<String>,
}

impl SourceRow for GeneFunctionRow {
    const SOURCE: &'static str = "gene-function mapping";
    const DELIMITER: u8 = b'\t';

    fn required_columns() -> &'static [&'static str] {
        &["gene_name", "uniprot_id", "uniprot_url"]
    }

    fn parse(record: &StringRecord, columns: &Columns) -> Result<Self, Error> {
        Ok(GeneFunctionRow {
            gene_name: required_field(record, columns, "gene_name", Self::SOURCE)?,
            uniprot_id: required_field(record, columns, "uniprot_id", Self::SOURCE)?,
            uniprot_url: string_field(record, columns, "uniprot_url"),
        })
    }
}

//-----------------------------------------------------------------------------

/// One row of the FST table. The upstream batch job writes it as CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct FstRow {
    pub chromosome: String,
    pub position: i64,
    /// The rsID from the `dbSNP` column, when present.
    pub snp_name: Option<String>,
    pub fst: Option<f64>,
}

impl SourceRow for FstRow {
    const SOURCE: &'static str = "FST table";
    const DELIMITER: u8 = b',';

    fn required_columns() -> &'static [&'static str] {
        &["CHROM", "POS", "FST"]
    }

    fn parse(record: &StringRecord, columns: &Columns) -> Result<Self, Error> {
        Ok(FstRow {
            chromosome: required_field(record, columns, "CHROM", Self::SOURCE)?,
            position: required_numeric(record, columns, "POS", Self::SOURCE)?,
            snp_name: string_field(record, columns, "dbSNP"),
            fst: numeric_field(record, columns, "FST", Self::SOURCE)?,
        })
    }
}

//-----------------------------------------------------------------------------

/// One row of the iHS table.
#[derive(Debug, Clone, PartialEq)]
pub struct IhsRow {
    pub chromosome: String,
    pub position: i64,
    pub ihs_score: Option<f64>,
    pub mean_ihs: Option<f64>,
    pub std_ihs: Option<f64>,
    pub population: String,
}

impl SourceRow for IhsRow {
    const SOURCE: &'static str = "iHS table";
    const DELIMITER: u8 = b'\t';

    fn required_columns() -> &'static [&'static str] {
        &["Chromosome", "Position", "iHS_Score", "Population"]
    }

    fn parse(record: &StringRecord, columns: &Columns) -> Result<Self, Error> {
        Ok(IhsRow {
            chromosome: required_field(record, columns, "Chromosome", Self::SOURCE)?,
            position: required_numeric(record, columns, "Position", Self::SOURCE)?,
            ihs_score: numeric_field(record, columns, "iHS_Score", Self::SOURCE)?,
            mean_ihs: numeric_field(record, columns, "Mean_iHS", Self::SOURCE)?,
            std_ihs: numeric_field(record, columns, "Std_iHS", Self::SOURCE)?,
            population: required_field(record, columns, "Population", Self::SOURCE)?,
        })
    }
}

//-----------------------------------------------------------------------------

/// One row of the population metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationDetailRow {
    pub population_name: String,
    pub geographical_sampling_locations: Option<String>,
    pub genetic_diversity: Option<String>,
    pub disease_trait_associations: Option<String>,
}

impl SourceRow for PopulationDetailRow {
    const SOURCE: &'static str = "population metadata";
    const DELIMITER: u8 = b'\t';

    fn required_columns() -> &'static [&'static str] {
        &["population_name"]
    }

    fn parse(record: &StringRecord, columns: &Columns) -> Result<Self, Error> {
        Ok(PopulationDetailRow {
            population_name: required_field(record, columns, "population_name", Self::SOURCE)?,
            geographical_sampling_locations:
                string_field(record, columns, "geographical_sampling_locations"),
            genetic_diversity: string_field(record, columns, "genetic_diversity"),
            disease_trait_associations:
                string_field(record, columns, "disease_trait_associations"),
        })
    }
}

//-----------------------------------------------------------------------------

/// One row of the sub-population metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubPopulationRow {
    pub population: String,
    pub sub_population: String,
    pub genetic_diversity: Option<String>,
    pub disease_trait_associations: Option<String>,
}

impl SourceRow for SubPopulationRow {
    const SOURCE: &'static str = "sub-population metadata";
    const DELIMITER: u8 = b'\t';

    fn required_columns() -> &'static [&'static str] {
        &["population", "sub_population"]
    }

    fn parse(record: &StringRecord, columns: &Columns) -> Result<Self, Error> {
        Ok(SubPopulationRow {
            population: required_field(record, columns, "population", Self::SOURCE)?,
            sub_population: required_field(record, columns, "sub_population", Self::SOURCE)?,
            genetic_diversity: string_field(record, columns, "genetic_diversity"),
            disease_trait_associations:
                string_field(record, columns, "disease_trait_associations"),
        })
    }
}

//-----------------------------------------------------------------------------
