//! # SNP-base: a normalized genomic annotation store using SQLite.
//!
//! This crate ingests several heterogeneous flat-file sources — GWAS
//! association summary statistics, gene-function mappings, population
//! metadata, and two selection-statistic tables (FST and iHS) — and merges
//! them into a normalized SQLite database usable for point, range, and join
//! queries.
//!
//! ### Basic concepts
//!
//! The store holds the entity tables `Genes`, `Populations`, and `Snps`, the
//! `SnpPopulationStats` junction table mapping a (SNP, population) pair to an
//! allele frequency, the `GeneAnnotations` table of UniProt references, and
//! the denormalized `FstStats` and `IhsStats` selection-statistic tables,
//! which are linked to SNPs only by name-match at query time. A typed
//! `Associations` staging table holds the raw association summary between
//! pipeline stages.
//!
//! The ingestion pipeline ([`ingest::run`]) executes a strict sequence of
//! stages, each committing before the next reads. Entity tables use
//! insert-or-ignore and the stat tables insert-or-replace, so a rerun on the
//! same inputs converges to the same row sets while stats always reflect the
//! latest run. Inconsistent upstream identifiers are normalized in exactly
//! one place ([`resolve`]): gene names arrive both plain and as quoted
//! one-element list literals, and per-population allele frequencies arrive
//! as loosely-quoted JSON blobs.
//!
//! See [`SnpBase`] for the database handle, [`StoreInterface`] for the query
//! side, and [`formats`] for the source readers.

pub mod db;
pub mod error;
pub mod formats;
pub mod ingest;
pub mod resolve;
pub mod utils;

pub use db::{SnpBase, StoreInterface};
pub use db::{
    AnnotationRecord, FstRecord, GeneRecord, IhsRecord, PopulationDetailRecord,
    PopulationRecord, SnpHit, SnpRecord, SubPopulationRecord,
};
pub use error::Error;
pub use ingest::{IngestSummary, SourceFiles};
