//! Error types for the store, the source readers, and the ingestion pipeline.

use thiserror::Error;

/// An error from SNP-base.
///
/// The fatal variants are [`Error::StoreUnavailable`] and the database / I/O
/// passthroughs: they abort an ingestion run before or between stages.
/// [`Error::MalformedInput`] is fatal when raised for a missing required
/// column at reader construction, and row-level otherwise: the pipeline logs
/// the error, skips the row, and continues the batch. [`Error::Decode`] is
/// always row-level.
///
/// Two conditions never surface as values of this type. Uniqueness
/// violations on insert-or-ignore tables are absorbed by the
/// conflict clause, and unresolved gene or population references are stored
/// as NULL and counted in [`crate::ingest::IngestSummary`].
#[derive(Debug, Error)]
pub enum Error {
    /// The database cannot be opened or created, or it has an incompatible
    /// schema version.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A required column is missing from a source file, or a row cannot be
    /// coerced into the declared column schema.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// An embedded per-population allele-frequency map cannot be decoded.
    #[error("cannot decode allele frequencies: {0}")]
    Decode(String),

    /// A database operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A delimited input file cannot be read.
    #[error("{0}")]
    Csv(#[from] csv::Error),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
