//! The ingestion pipeline: loads the delimited source files into the store.
//!
//! [`run`] executes a fixed sequence of stages:
//!
//! 1. **Load-Staging** — refresh the `Associations` staging table from the
//!    association summary file.
//! 2. **Populate-Population** — population metadata plus the population codes
//!    found in the staged allele-frequency maps.
//! 3. **Populate-Gene** — distinct (gene, functional term) pairs from staging.
//! 4. **Populate-SNP** — staged SNPs with their gene references resolved.
//! 5. **Populate-Stats** — the SNP / population junction table and the FST
//!    and iHS selection-statistic tables.
//! 6. **Populate-Annotations** — the gene-function mapping file.
//!
//! Each stage runs in its own transaction and commits before the next stage
//! reads. A stage whose source file is absent, or that finds no qualifying
//! rows, is a no-op. The normalized entity tables use insert-or-ignore, the
//! stat tables insert-or-replace, so rerunning the pipeline on the same
//! inputs converges to the same row sets and a crash mid-run leaves a store
//! that the next invocation completes. Concurrent runs against the same
//! store are unsupported and must be externally serialized.
//!
//! Row-level problems (unparsable cells, undecodable frequency blobs,
//! references that do not resolve) are logged, counted in [`IngestSummary`],
//! and skipped; only store-level failures abort the run.

use crate::db::SnpBase;
use crate::error::Error;
use crate::formats::{
    AssociationRow, DelimitedReader, FstRow, GeneFunctionRow, IhsRow,
    PopulationDetailRow, SubPopulationRow,
};
use crate::resolve;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension};

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// Paths to the source files for one ingestion run.
///
/// Every file is optional; the corresponding stage is a no-op when the path
/// is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFiles {
    /// GWAS association summary statistics (TSV).
    pub associations: Option<PathBuf>,
    /// Gene-function mappings (TSV).
    pub gene_functions: Option<PathBuf>,
    /// FST table from the upstream batch job (CSV).
    pub fst: Option<PathBuf>,
    /// iHS table (TSV).
    pub ihs: Option<PathBuf>,
    /// Population metadata (TSV).
    pub population_details: Option<PathBuf>,
    /// Sub-population metadata (TSV).
    pub sub_population_details: Option<PathBuf>,
}

/// Row counts and audit counters from one ingestion run.
///
/// The entity counts are rows actually inserted by this run; rows absorbed
/// by insert-or-ignore do not count. `stat_rows`, `fst_rows`, and `ihs_rows`
/// count upserts, so a rerun reports them again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Association rows loaded into staging.
    pub staged_rows: usize,
    /// Rows skipped anywhere in the run because they could not be parsed or
    /// failed a basic invariant.
    pub skipped_rows: usize,
    /// New population rows.
    pub populations: usize,
    /// New gene rows.
    pub genes: usize,
    /// New SNP rows.
    pub snps: usize,
    /// Allele-frequency rows written to the junction table.
    pub stat_rows: usize,
    /// New gene-function annotation rows.
    pub annotations: usize,
    /// FST rows written.
    pub fst_rows: usize,
    /// iHS rows written.
    pub ihs_rows: usize,
    /// Allele-frequency blobs that could not be decoded.
    pub undecodable_blobs: usize,
    /// Gene references (from SNPs or annotations) stored as NULL because the
    /// lookup missed.
    pub unresolved_genes: usize,
    /// Frequency entries dropped because the SNP or population was unknown.
    pub unresolved_frequencies: usize,
}

//-----------------------------------------------------------------------------

/// Runs the full pipeline against the given store.
///
/// The stages run in dependency order and each commits before the next
/// begins; see the module documentation for the exact sequence and the
/// rerun semantics.
pub fn run(database: &mut SnpBase, sources: &SourceFiles) -> Result<IngestSummary, Error> {
    let mut summary = IngestSummary::default();
    let connection = &mut database.connection;

    load_staging(connection, sources.associations.as_deref(), &mut summary)?;
    populate_populations(
        connection,
        sources.population_details.as_deref(),
        sources.sub_population_details.as_deref(),
        &mut summary,
    )?;
    populate_genes(connection, &mut summary)?;
    populate_snps(connection, &mut summary)?;
    populate_stats(
        connection, sources.fst.as_deref(), sources.ihs.as_deref(), &mut summary
    )?;
    populate_annotations(connection, sources.gene_functions.as_deref(), &mut summary)?;

    Ok(summary)
}

//-----------------------------------------------------------------------------

// Stage 1: refresh the staging table from the association summary file.
fn load_staging(
    connection: &mut Connection, path: Option<&Path>, summary: &mut IngestSummary
) -> Result<(), Error> {
    let Some(path) = path else {
        return Ok(());
    };
    eprintln!("Loading association summary {}", path.display());
    let reader = DelimitedReader::<AssociationRow>::open(path)?;

    let transaction = connection.transaction()?;
    {
        transaction.execute("DELETE FROM Associations", ())?;
        let mut insert = transaction.prepare(
            "INSERT INTO Associations (
                var_id, snp_name, chromosome, clump_start, clump_end, p_value,
                nearest_gene, consequence, ancestry, maf, beta, allele_frequencies
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        )?;
        for row in reader {
            let row = match row {
                Ok(row) => row,
                Err(err) => {
                    eprintln!("Warning: skipping association row: {}", err);
                    summary.skipped_rows += 1;
                    continue;
                }
            };
            insert.execute((
                row.var_id, row.snp_name, row.chromosome,
                row.clump_start, row.clump_end, row.p_value,
                row.nearest_gene, row.consequence, row.ancestry,
                row.maf, row.beta, row.allele_frequencies,
            ))?;
            summary.staged_rows += 1;
        }
    }
    transaction.commit()?;

    eprintln!("Staged {} association rows", summary.staged_rows);
    Ok(())
}

//-----------------------------------------------------------------------------

// Stage 2: populations from the metadata files and the staged frequency maps.
// The metadata file goes first so that a known sampling location is part of
// the row that wins the insert-or-ignore race.
fn populate_populations(
    connection: &mut Connection,
    details: Option<&Path>,
    sub_details: Option<&Path>,
    summary: &mut IngestSummary,
) -> Result<(), Error> {
    eprintln!("Inserting populations");

    let detail_rows = read_rows::<PopulationDetailRow>(details, summary)?;
    let sub_rows = read_rows::<SubPopulationRow>(sub_details, summary)?;

    let transaction = connection.transaction()?;
    {
        let mut insert = transaction.prepare(
            "INSERT OR IGNORE INTO Populations (population_name, sampling_location)
            VALUES (?1, ?2)"
        )?;
        let mut insert_details = transaction.prepare(
            "INSERT OR REPLACE INTO PopulationDetails (
                population_name, geographical_sampling_locations,
                genetic_diversity, disease_trait_associations
            ) VALUES (?1, ?2, ?3, ?4)"
        )?;
        for row in &detail_rows {
            let name = resolve::normalize_population_code(&row.population_name);
            summary.populations +=
                insert.execute((name, &row.geographical_sampling_locations))?;
            insert_details.execute((
                name,
                &row.geographical_sampling_locations,
                &row.genetic_diversity,
                &row.disease_trait_associations,
            ))?;
        }

        let mut insert_sub = transaction.prepare(
            "INSERT OR REPLACE INTO SubPopulationDetails (
                population, sub_population, genetic_diversity, disease_trait_associations
            ) VALUES (?1, ?2, ?3, ?4)"
        )?;
        for row in &sub_rows {
            insert_sub.execute((
                resolve::normalize_population_code(&row.population),
                &row.sub_population,
                &row.genetic_diversity,
                &row.disease_trait_associations,
            ))?;
        }

        // Population codes seen in the staged frequency maps. Undecodable
        // blobs are counted when the stats stage skips them.
        let mut names: BTreeSet<String> = BTreeSet::new();
        let mut select = transaction.prepare(
            "SELECT allele_frequencies FROM Associations WHERE allele_frequencies IS NOT NULL"
        )?;
        let mut rows = select.query(())?;
        while let Some(row) = rows.next()? {
            let blob: String = row.get(0)?;
            if let Ok(frequencies) = resolve::decode_allele_frequencies(&blob) {
                names.extend(
                    frequencies.into_keys()
                        .map(|code| resolve::normalize_population_code(&code).to_string())
                );
            }
        }
        drop(rows);
        drop(select);

        let mut insert_name = transaction.prepare(
            "INSERT OR IGNORE INTO Populations (population_name) VALUES (?1)"
        )?;
        for name in &names {
            summary.populations += insert_name.execute((name,))?;
        }
    }
    transaction.commit()?;

    eprintln!("Inserted {} new populations", summary.populations);
    Ok(())
}

// Reads all rows of a source file, logging and counting row-level failures.
fn read_rows<R: crate::formats::SourceRow>(
    path: Option<&Path>, summary: &mut IngestSummary
) -> Result<Vec<R>, Error> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let mut result: Vec<R> = Vec::new();
    for row in DelimitedReader::<R>::open(path)? {
        match row {
            Ok(row) => result.push(row),
            Err(err) => {
                eprintln!("Warning: skipping row in {}: {}", path.display(), err);
                summary.skipped_rows += 1;
            }
        }
    }
    Ok(result)
}

//-----------------------------------------------------------------------------

// Stage 3: distinct (gene, functional term) pairs from staging.
fn populate_genes(
    connection: &mut Connection, summary: &mut IngestSummary
) -> Result<(), Error> {
    eprintln!("Inserting genes");

    let transaction = connection.transaction()?;
    {
        let mut select = transaction.prepare(
            "SELECT DISTINCT nearest_gene, consequence FROM Associations
            WHERE nearest_gene IS NOT NULL"
        )?;
        let mut pairs: Vec<(String, Option<String>)> = Vec::new();
        let mut rows = select.query(())?;
        while let Some(row) = rows.next()? {
            pairs.push((row.get(0)?, row.get(1)?));
        }
        drop(rows);
        drop(select);

        let mut insert = transaction.prepare(
            "INSERT OR IGNORE INTO Genes (gene_name, functional_term) VALUES (?1, ?2)"
        )?;
        for (raw, consequence) in &pairs {
            let name = resolve::normalize_gene_name(raw);
            if name.is_empty() {
                continue;
            }
            summary.genes += insert.execute((name, consequence.as_deref().unwrap_or("")))?;
        }
    }
    transaction.commit()?;

    eprintln!("Inserted {} new genes", summary.genes);
    Ok(())
}

//-----------------------------------------------------------------------------

// Stage 4: SNPs from staging, with gene references resolved against the
// rows the gene stage committed.
fn populate_snps(
    connection: &mut Connection, summary: &mut IngestSummary
) -> Result<(), Error> {
    eprintln!("Inserting SNPs");

    let transaction = connection.transaction()?;
    {
        let mut select = transaction.prepare(
            "SELECT DISTINCT snp_name, chromosome, clump_start, clump_end, p_value,
                nearest_gene, consequence
            FROM Associations WHERE snp_name IS NOT NULL"
        )?;
        type StagedSnp = (
            String, Option<String>, Option<i64>, Option<i64>, Option<f64>,
            Option<String>, Option<String>,
        );
        let mut staged: Vec<StagedSnp> = Vec::new();
        let mut rows = select.query(())?;
        while let Some(row) = rows.next()? {
            staged.push((
                row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?,
                row.get(4)?, row.get(5)?, row.get(6)?,
            ));
        }
        drop(rows);
        drop(select);

        let mut find_gene = transaction.prepare(
            "SELECT gene_id FROM Genes WHERE gene_name = ?1 AND functional_term = ?2"
        )?;
        let mut insert = transaction.prepare(
            "INSERT OR IGNORE INTO Snps (
                snp_name, chromosome, start_position, end_position, p_value, gene_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        )?;
        for (snp_name, chromosome, start, end, p_value, nearest, consequence) in &staged {
            let Some(chromosome) = chromosome else {
                eprintln!("Warning: skipping SNP {} without a chromosome", snp_name);
                summary.skipped_rows += 1;
                continue;
            };
            let Some(start) = start else {
                eprintln!("Warning: skipping SNP {} without a start position", snp_name);
                summary.skipped_rows += 1;
                continue;
            };
            if let Some(end) = end {
                if end < start {
                    eprintln!(
                        "Warning: skipping SNP {} with an invalid interval {}..{}",
                        snp_name, start, end
                    );
                    summary.skipped_rows += 1;
                    continue;
                }
            }

            let gene_id: Option<i64> = match nearest.as_deref() {
                None => None,
                Some(raw) => {
                    let name = resolve::normalize_gene_name(raw);
                    let found = find_gene.query_row(
                        (name, consequence.as_deref().unwrap_or("")),
                        |row| row.get(0),
                    ).optional()?;
                    if found.is_none() {
                        summary.unresolved_genes += 1;
                    }
                    found
                }
            };
            summary.snps += insert.execute((
                snp_name, chromosome, start, end, p_value, gene_id,
            ))?;
        }
    }
    transaction.commit()?;

    eprintln!("Inserted {} new SNPs", summary.snps);
    Ok(())
}

//-----------------------------------------------------------------------------

// Stage 5: the junction table from the staged frequency maps, plus the FST
// and iHS tables. Everything here uses replace semantics: the latest run
// wins for a given key.
fn populate_stats(
    connection: &mut Connection,
    fst: Option<&Path>,
    ihs: Option<&Path>,
    summary: &mut IngestSummary,
) -> Result<(), Error> {
    eprintln!("Inserting selection statistics");

    let fst_rows = read_rows::<FstRow>(fst, summary)?;
    let ihs_rows = read_rows::<IhsRow>(ihs, summary)?;

    let transaction = connection.transaction()?;
    {
        let mut select = transaction.prepare(
            "SELECT snp_name, allele_frequencies FROM Associations
            WHERE snp_name IS NOT NULL AND allele_frequencies IS NOT NULL"
        )?;
        let mut staged: Vec<(String, String)> = Vec::new();
        let mut rows = select.query(())?;
        while let Some(row) = rows.next()? {
            staged.push((row.get(0)?, row.get(1)?));
        }
        drop(rows);
        drop(select);

        let mut find_snp = transaction.prepare(
            "SELECT snp_id FROM Snps WHERE snp_name = ?1"
        )?;
        let mut find_population = transaction.prepare(
            "SELECT population_id FROM Populations WHERE population_name = ?1"
        )?;
        let mut upsert = transaction.prepare(
            "INSERT OR REPLACE INTO SnpPopulationStats (snp_id, population_id, allele_freq)
            VALUES (?1, ?2, ?3)"
        )?;
        for (snp_name, blob) in &staged {
            let frequencies = match resolve::decode_allele_frequencies(blob) {
                Ok(frequencies) => frequencies,
                Err(err) => {
                    eprintln!("Warning: skipping allele frequencies for {}: {}", snp_name, err);
                    summary.undecodable_blobs += 1;
                    continue;
                }
            };
            let snp_id: Option<i64> =
                find_snp.query_row((snp_name,), |row| row.get(0)).optional()?;
            let Some(snp_id) = snp_id else {
                summary.unresolved_frequencies += frequencies.len();
                continue;
            };
            for (code, freq) in &frequencies {
                let population_id: Option<i64> = find_population.query_row(
                    (resolve::normalize_population_code(code),),
                    |row| row.get(0),
                ).optional()?;
                match population_id {
                    Some(population_id) => {
                        upsert.execute((snp_id, population_id, freq))?;
                        summary.stat_rows += 1;
                    }
                    None => summary.unresolved_frequencies += 1,
                }
            }
        }

        let mut upsert_fst = transaction.prepare(
            "INSERT OR REPLACE INTO FstStats (chromosome, position, snp_name, fst)
            VALUES (?1, ?2, ?3, ?4)"
        )?;
        for row in &fst_rows {
            upsert_fst.execute((&row.chromosome, row.position, &row.snp_name, row.fst))?;
            summary.fst_rows += 1;
        }

        let mut upsert_ihs = transaction.prepare(
            "INSERT OR REPLACE INTO IhsStats (
                chromosome, position, ihs_score, mean_ihs, std_ihs, population
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        )?;
        for row in &ihs_rows {
            upsert_ihs.execute((
                &row.chromosome, row.position, row.ihs_score,
                row.mean_ihs, row.std_ihs,
                resolve::normalize_population_code(&row.population),
            ))?;
            summary.ihs_rows += 1;
        }
    }
    transaction.commit()?;

    eprintln!(
        "Wrote {} frequency rows, {} FST rows, and {} iHS rows",
        summary.stat_rows, summary.fst_rows, summary.ihs_rows
    );
    Ok(())
}

//-----------------------------------------------------------------------------

// Stage 6: gene-function annotations. The gene reference resolves by name
// alone; with several functional terms for the name, the first gene row wins.
fn populate_annotations(
    connection: &mut Connection, path: Option<&Path>, summary: &mut IngestSummary
) -> Result<(), Error> {
    let Some(path) = path else {
        return Ok(());
    };
    eprintln!("Inserting gene-function annotations from {}", path.display());
    let annotation_rows = read_rows::<GeneFunctionRow>(Some(path), summary)?;

    let transaction = connection.transaction()?;
    {
        let mut find_gene = transaction.prepare(
            "SELECT MIN(gene_id) FROM Genes WHERE gene_name = ?1"
        )?;
        let mut insert = transaction.prepare(
            "INSERT OR IGNORE INTO GeneAnnotations (gene_name, gene_id, uniprot_id, uniprot_url)
            VALUES (?1, ?2, ?3, ?4)"
        )?;
        for row in &annotation_rows {
            let name = resolve::normalize_gene_name(&row.gene_name);
            if name.is_empty() {
                summary.skipped_rows += 1;
                continue;
            }
            let gene_id: Option<i64> =
                find_gene.query_row((name,), |row| row.get(0))?;
            if gene_id.is_none() {
                summary.unresolved_genes += 1;
            }
            summary.annotations +=
                insert.execute((name, gene_id, &row.uniprot_id, &row.uniprot_url))?;
        }
    }
    transaction.commit()?;

    eprintln!("Inserted {} new annotations", summary.annotations);
    Ok(())
}

//-----------------------------------------------------------------------------
