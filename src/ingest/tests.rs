use super::*;

use crate::db::StoreInterface;
use crate::utils;

use std::fs;

//-----------------------------------------------------------------------------

fn fixture_sources() -> SourceFiles {
    SourceFiles {
        associations: Some(utils::get_test_data("associations.tsv")),
        gene_functions: Some(utils::get_test_data("uniprot_data.tsv")),
        fst: Some(utils::get_test_data("fst.csv")),
        ihs: Some(utils::get_test_data("ihs.tsv")),
        population_details: Some(utils::get_test_data("population_details.tsv")),
        sub_population_details: Some(utils::get_test_data("subpopulation_details.tsv")),
    }
}

fn create_database() -> (PathBuf, SnpBase) {
    let db_file = utils::temp_file_name("snp-base");
    assert!(!SnpBase::exists(&db_file), "Database {} already exists", db_file.display());
    let database = SnpBase::open_or_create(&db_file);
    assert!(database.is_ok(), "Failed to create database: {}", database.err().unwrap());
    (db_file, database.unwrap())
}

fn run_pipeline(database: &mut SnpBase, sources: &SourceFiles) -> IngestSummary {
    let summary = run(database, sources);
    assert!(summary.is_ok(), "Ingestion failed: {}", summary.err().unwrap());
    summary.unwrap()
}

//-----------------------------------------------------------------------------

#[test]
fn full_run_counts() {
    let (db_file, mut database) = create_database();
    let summary = run_pipeline(&mut database, &fixture_sources());

    // All six association rows stage; the invalid interval of rs400 is the
    // only skip. The unresolved gene references are the empty nearest-gene
    // list of rs500 and the ABCD1 annotation.
    assert_eq!(summary.staged_rows, 6, "Wrong number of staged rows");
    assert_eq!(summary.skipped_rows, 1, "Wrong number of skipped rows");
    assert_eq!(summary.populations, 2, "Wrong number of new populations");
    assert_eq!(summary.genes, 5, "Wrong number of new genes");
    assert_eq!(summary.snps, 4, "Wrong number of new SNPs");
    assert_eq!(summary.stat_rows, 3, "Wrong number of frequency rows");
    assert_eq!(summary.annotations, 3, "Wrong number of new annotations");
    assert_eq!(summary.fst_rows, 3, "Wrong number of FST rows");
    assert_eq!(summary.ihs_rows, 3, "Wrong number of iHS rows");
    assert_eq!(summary.undecodable_blobs, 1, "Wrong number of undecodable blobs");
    assert_eq!(summary.unresolved_genes, 2, "Wrong number of unresolved gene references");
    assert_eq!(summary.unresolved_frequencies, 0, "Wrong number of unresolved frequency entries");

    assert_eq!(database.genes().unwrap(), 5, "Wrong gene count in the store");
    assert_eq!(database.populations().unwrap(), 2, "Wrong population count in the store");
    assert_eq!(database.snps().unwrap(), 4, "Wrong SNP count in the store");
    assert_eq!(database.snp_population_stats().unwrap(), 3, "Wrong junction row count in the store");
    assert_eq!(database.annotations().unwrap(), 3, "Wrong annotation count in the store");
    assert_eq!(database.fst_rows().unwrap(), 3, "Wrong FST count in the store");
    assert_eq!(database.ihs_rows().unwrap(), 3, "Wrong iHS count in the store");
    assert_eq!(database.staged_associations().unwrap(), 6, "Wrong staging count in the store");

    drop(database);
    fs::remove_file(&db_file).unwrap();
}

#[test]
fn rerun_is_idempotent() {
    let (db_file, mut database) = create_database();
    let sources = fixture_sources();
    let _ = run_pipeline(&mut database, &sources);
    let second = run_pipeline(&mut database, &sources);

    // The entity tables absorb the rerun; the stat tables report their
    // upserts again.
    assert_eq!(second.staged_rows, 6, "Staging should be reloaded on a rerun");
    assert_eq!(second.populations, 0, "A rerun should not insert populations");
    assert_eq!(second.genes, 0, "A rerun should not insert genes");
    assert_eq!(second.snps, 0, "A rerun should not insert SNPs");
    assert_eq!(second.annotations, 0, "A rerun should not insert annotations");
    assert_eq!(second.stat_rows, 3, "A rerun should upsert the frequency rows");
    assert_eq!(second.fst_rows, 3, "A rerun should upsert the FST rows");
    assert_eq!(second.ihs_rows, 3, "A rerun should upsert the iHS rows");

    assert_eq!(database.genes().unwrap(), 5, "The gene count changed on a rerun");
    assert_eq!(database.populations().unwrap(), 2, "The population count changed on a rerun");
    assert_eq!(database.snps().unwrap(), 4, "The SNP count changed on a rerun");
    assert_eq!(database.snp_population_stats().unwrap(), 3, "The junction row count changed on a rerun");
    assert_eq!(database.annotations().unwrap(), 3, "The annotation count changed on a rerun");
    assert_eq!(database.fst_rows().unwrap(), 3, "The FST count changed on a rerun");
    assert_eq!(database.ihs_rows().unwrap(), 3, "The iHS count changed on a rerun");

    drop(database);
    fs::remove_file(&db_file).unwrap();
}

#[test]
fn refreshed_frequencies_replace_old() {
    let (db_file, mut database) = create_database();
    let _ = run_pipeline(&mut database, &fixture_sources());

    // A fresh association summary with an updated GBR frequency for rs100.
    let updated = utils::temp_file_name("associations");
    fs::write(
        &updated,
        "varId\tdbSNP\tchromosome\tclumpStart\tclumpEnd\tpValue\tnearest\tconsequence\taf\n\
        7:100:A:G\trs100\t7\t100\t200\t0.00001\t[\"TCF7L2\"]\tintron_variant\t{'GBR': 0.99}\n"
    ).unwrap();
    let sources = SourceFiles {
        associations: Some(updated.clone()),
        ..SourceFiles::default()
    };
    let summary = run_pipeline(&mut database, &sources);
    assert_eq!(summary.staged_rows, 1, "Staging should hold only the fresh rows");
    assert_eq!(summary.stat_rows, 1, "Wrong number of upserted frequency rows");
    assert_eq!(database.staged_associations().unwrap(), 1, "Staging was not refreshed");

    // The GBR frequency is replaced; the GIH row from the first run stays.
    let mut interface = StoreInterface::new(&database).unwrap();
    let frequencies = interface.frequencies_for_snp("rs100").unwrap();
    assert_eq!(
        frequencies,
        vec![("GBR".to_string(), Some(0.99)), ("GIH".to_string(), Some(0.41))],
        "Wrong frequencies after the refresh"
    );
    assert_eq!(database.snp_population_stats().unwrap(), 3, "Wrong junction row count after the refresh");

    drop(interface);
    drop(database);
    fs::remove_file(&db_file).unwrap();
    fs::remove_file(&updated).unwrap();
}

#[test]
fn unresolved_gene_references_are_null() {
    let (db_file, mut database) = create_database();
    let _ = run_pipeline(&mut database, &fixture_sources());

    let mut interface = StoreInterface::new(&database).unwrap();

    // rs500 has an empty nearest-gene list; rs100 resolves.
    let snp = interface.get_snp("rs500").unwrap().unwrap();
    assert_eq!(snp.gene_id, None, "An unresolved gene reference should be NULL");
    let snp = interface.get_snp("rs100").unwrap().unwrap();
    assert!(snp.gene_id.is_some(), "The gene reference of rs100 should resolve");

    // ABCD1 never appears in the association summary.
    let annotations = interface.annotations_for_gene("ABCD1").unwrap();
    assert_eq!(annotations.len(), 1, "Wrong number of ABCD1 annotations");
    assert_eq!(annotations[0].gene_id, None, "An unknown gene should be stored with a NULL reference");
    assert_eq!(annotations[0].uniprot_id, "P33897");

    drop(interface);
    drop(database);
    fs::remove_file(&db_file).unwrap();
}

#[test]
fn undecodable_blob_is_skipped() {
    let (db_file, mut database) = create_database();
    let summary = run_pipeline(&mut database, &fixture_sources());
    assert_eq!(summary.undecodable_blobs, 1, "Wrong number of undecodable blobs");

    // The rs300 row itself survives; only its frequencies are dropped.
    let mut interface = StoreInterface::new(&database).unwrap();
    let snp = interface.get_snp("rs300").unwrap();
    assert!(snp.is_some(), "rs300 should be in the store");
    let frequencies = interface.frequencies_for_snp("rs300").unwrap();
    assert!(frequencies.is_empty(), "rs300 should have no frequency rows");

    drop(interface);
    drop(database);
    fs::remove_file(&db_file).unwrap();
}

#[test]
fn invalid_interval_row_is_skipped() {
    let (db_file, mut database) = create_database();
    let _ = run_pipeline(&mut database, &fixture_sources());

    let mut interface = StoreInterface::new(&database).unwrap();
    let snp = interface.get_snp("rs400").unwrap();
    assert!(snp.is_none(), "A SNP with end < start should not be in the store");

    drop(interface);
    drop(database);
    fs::remove_file(&db_file).unwrap();
}

#[test]
fn missing_sources_are_noops() {
    let (db_file, mut database) = create_database();
    let summary = run_pipeline(&mut database, &SourceFiles::default());
    assert_eq!(summary, IngestSummary::default(), "A run without sources should do nothing");
    assert_eq!(database.genes().unwrap(), 0);
    assert_eq!(database.populations().unwrap(), 0);
    assert_eq!(database.snps().unwrap(), 0);
    assert_eq!(database.staged_associations().unwrap(), 0);

    drop(database);
    fs::remove_file(&db_file).unwrap();
}

//-----------------------------------------------------------------------------
