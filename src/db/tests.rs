use super::*;

use crate::ingest::{self, SourceFiles};

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

//-----------------------------------------------------------------------------

fn create_database(name_part: &str) -> (PathBuf, SnpBase) {
    let db_file = utils::temp_file_name(name_part);
    assert!(!SnpBase::exists(&db_file), "Database {} already exists", db_file.display());
    let database = SnpBase::open_or_create(&db_file);
    assert!(database.is_ok(), "Failed to create database: {}", database.err().unwrap());
    (db_file, database.unwrap())
}

fn open_database(filename: &PathBuf) -> SnpBase {
    let database = SnpBase::open(filename);
    assert!(database.is_ok(), "Failed to open database: {}", database.err().unwrap());
    database.unwrap()
}

fn create_interface(database: &SnpBase) -> StoreInterface {
    let interface = StoreInterface::new(database);
    assert!(interface.is_ok(), "Failed to create store interface: {}", interface.err().unwrap());
    interface.unwrap()
}

fn ingest_fixtures(database: &mut SnpBase) {
    let sources = SourceFiles {
        associations: Some(utils::get_test_data("associations.tsv")),
        gene_functions: Some(utils::get_test_data("uniprot_data.tsv")),
        fst: Some(utils::get_test_data("fst.csv")),
        ihs: Some(utils::get_test_data("ihs.tsv")),
        population_details: Some(utils::get_test_data("population_details.tsv")),
        sub_population_details: Some(utils::get_test_data("subpopulation_details.tsv")),
    };
    let summary = ingest::run(database, &sources);
    assert!(summary.is_ok(), "Ingestion failed: {}", summary.err().unwrap());
}

fn hit_names(hits: &[SnpHit]) -> BTreeSet<String> {
    hits.iter().map(|hit| hit.snp_name.clone()).collect()
}

//-----------------------------------------------------------------------------

#[test]
fn create_and_reopen() {
    let (db_file, database) = create_database("create-and-reopen");
    assert!(SnpBase::exists(&db_file), "The database file was not created");
    assert_eq!(database.version(), SnpBase::VERSION, "Wrong version after creation");
    drop(database);

    let database = open_database(&db_file);
    assert_eq!(database.version(), SnpBase::VERSION, "Wrong version after reopening");
    assert!(database.filename().is_some(), "The database should have a filename");
    assert_eq!(database.genes().unwrap(), 0, "A new database should have no genes");
    assert_eq!(database.populations().unwrap(), 0, "A new database should have no populations");
    assert_eq!(database.snps().unwrap(), 0, "A new database should have no SNPs");
    assert_eq!(database.staged_associations().unwrap(), 0, "A new database should have no staged rows");

    drop(database);
    fs::remove_file(&db_file).unwrap();
}

#[test]
fn open_missing_file_fails() {
    let db_file = utils::temp_file_name("missing-database");
    let result = SnpBase::open(&db_file);
    match result {
        Err(Error::StoreUnavailable(_)) => (),
        Err(err) => panic!("Wrong error for a missing database: {}", err),
        Ok(_) => panic!("Opened a database that does not exist"),
    }
}

#[test]
fn create_refuses_existing() {
    let (db_file, database) = create_database("create-existing");
    drop(database);
    let result = SnpBase::create(&db_file);
    match result {
        Err(Error::StoreUnavailable(_)) => (),
        Err(err) => panic!("Wrong error for an existing database: {}", err),
        Ok(_) => panic!("Created a database over an existing one"),
    }
    fs::remove_file(&db_file).unwrap();
}

#[test]
fn version_mismatch_fails() {
    let (db_file, database) = create_database("version-mismatch");
    drop(database);

    let connection = Connection::open(&db_file).unwrap();
    connection.execute(
        "UPDATE Tags SET value = ?1 WHERE key = ?2",
        ("SNP-base v0", "version"),
    ).unwrap();
    drop(connection);

    let result = SnpBase::open(&db_file);
    match result {
        Err(Error::StoreUnavailable(message)) => {
            assert!(message.contains("version"), "The error should mention the version: {}", message);
        }
        Err(err) => panic!("Wrong error for a version mismatch: {}", err),
        Ok(_) => panic!("Opened a database with an unsupported version"),
    }
    fs::remove_file(&db_file).unwrap();
}

//-----------------------------------------------------------------------------

#[test]
fn statistics_after_ingest() {
    let (db_file, mut database) = create_database("statistics");
    ingest_fixtures(&mut database);

    assert_eq!(database.genes().unwrap(), 5, "Wrong number of genes");
    assert_eq!(database.populations().unwrap(), 2, "Wrong number of populations");
    assert_eq!(database.snps().unwrap(), 4, "Wrong number of SNPs");
    assert_eq!(database.snp_population_stats().unwrap(), 3, "Wrong number of junction rows");
    assert_eq!(database.annotations().unwrap(), 3, "Wrong number of annotations");
    assert_eq!(database.fst_rows().unwrap(), 3, "Wrong number of FST rows");
    assert_eq!(database.ihs_rows().unwrap(), 3, "Wrong number of iHS rows");
    assert_eq!(database.staged_associations().unwrap(), 6, "Wrong number of staged rows");

    drop(database);
    fs::remove_file(&db_file).unwrap();
}

#[test]
fn snp_search() {
    let (db_file, mut database) = create_database("snp-search");
    ingest_fixtures(&mut database);
    let mut interface = create_interface(&database);

    // rs100 has frequency data for two populations, ordered by name.
    let hits = interface.find_snp("rs100").unwrap();
    assert_eq!(hits.len(), 2, "Wrong number of rows for rs100");
    assert_eq!(hits[0].population_name.as_deref(), Some("GBR"));
    assert_eq!(hits[1].population_name.as_deref(), Some("GIH"));
    for hit in &hits {
        assert_eq!(hit.snp_name, "rs100");
        assert_eq!(hit.chromosome, "7");
        assert_eq!(hit.start_position, 100);
        assert_eq!(hit.end_position, Some(200));
        assert_eq!(hit.gene_name.as_deref(), Some("TCF7L2"));
        assert_eq!(hit.p_value, Some(0.00001));
    }

    // rs500 has no gene and no frequency data.
    let hits = interface.find_snp("rs500").unwrap();
    assert_eq!(hits.len(), 1, "Wrong number of rows for rs500");
    assert_eq!(hits[0].gene_name, None, "rs500 should have no gene");
    assert_eq!(hits[0].population_name, None, "rs500 should have no population");

    let hits = interface.find_snp("rs99999").unwrap();
    assert!(hits.is_empty(), "Found rows for an unknown rsID");

    drop(interface);
    drop(database);
    fs::remove_file(&db_file).unwrap();
}

#[test]
fn chromosome_and_range_search() {
    let (db_file, mut database) = create_database("range-search");
    ingest_fixtures(&mut database);
    let mut interface = create_interface(&database);

    let hits = interface.snps_on_chromosome("7").unwrap();
    assert_eq!(hits.len(), 3, "Wrong number of rows on chromosome 7");
    assert_eq!(hit_names(&hits), BTreeSet::from(["rs100".to_string(), "rs200".to_string()]));
    assert!(hits.windows(2).all(|pair| pair[0].start_position <= pair[1].start_position),
        "The rows are not ordered by position");

    // rs100 is 100..=200 and rs200 is 300..=400. A range covering the end of
    // the first but only the interior of the second matches the first alone.
    let hits = interface.snps_in_range("7", 150, 350).unwrap();
    assert_eq!(hit_names(&hits), BTreeSet::from(["rs100".to_string()]), "Wrong rows in range 150..=350");
    let hits = interface.snps_in_range("7", 50, 450).unwrap();
    assert_eq!(hit_names(&hits), BTreeSet::from(["rs100".to_string(), "rs200".to_string()]),
        "Wrong rows in range 50..=450");
    let hits = interface.snps_in_range("7", 1000, 2000).unwrap();
    assert!(hits.is_empty(), "Found rows in an empty range");

    // rs300 has no end position and matches on its start position.
    let hits = interface.snps_in_range("10", 450, 550).unwrap();
    assert_eq!(hit_names(&hits), BTreeSet::from(["rs300".to_string()]), "Wrong rows in range 450..=550");

    drop(interface);
    drop(database);
    fs::remove_file(&db_file).unwrap();
}

#[test]
fn gene_and_population_search() {
    let (db_file, mut database) = create_database("join-search");
    ingest_fixtures(&mut database);
    let mut interface = create_interface(&database);

    let hits = interface.snps_for_gene("TCF7L2").unwrap();
    assert_eq!(hit_names(&hits), BTreeSet::from(["rs100".to_string(), "rs200".to_string()]),
        "Wrong SNPs for TCF7L2");

    let hits = interface.snps_for_population("GIH").unwrap();
    assert_eq!(hit_names(&hits), BTreeSet::from(["rs100".to_string()]), "Wrong SNPs for GIH");
    let hits = interface.snps_for_population("GBR").unwrap();
    assert_eq!(hit_names(&hits), BTreeSet::from(["rs100".to_string(), "rs200".to_string()]),
        "Wrong SNPs for GBR");

    drop(interface);
    drop(database);
    fs::remove_file(&db_file).unwrap();
}

//-----------------------------------------------------------------------------

#[test]
fn gene_rows_and_annotations() {
    let (db_file, mut database) = create_database("gene-rows");
    ingest_fixtures(&mut database);
    let mut interface = create_interface(&database);

    // TCF7L2 appears with two functional terms, ordered by term.
    let genes = interface.genes_by_name("TCF7L2").unwrap();
    assert_eq!(genes.len(), 2, "Wrong number of TCF7L2 rows");
    assert_eq!(genes[0].functional_term, "intron_variant");
    assert_eq!(genes[1].functional_term, "missense_variant");

    let annotations = interface.annotations_for_gene("TCF7L2").unwrap();
    assert_eq!(annotations.len(), 1, "Wrong number of TCF7L2 annotations");
    assert_eq!(annotations[0].uniprot_id, "Q9NQB0");
    assert!(annotations[0].gene_id.is_some(), "The TCF7L2 annotation should resolve");

    let annotations = interface.annotations_for_gene("NO_SUCH_GENE").unwrap();
    assert!(annotations.is_empty(), "Found annotations for an unknown gene");

    drop(interface);
    drop(database);
    fs::remove_file(&db_file).unwrap();
}

#[test]
fn population_rows_and_details() {
    let (db_file, mut database) = create_database("population-rows");
    ingest_fixtures(&mut database);
    let mut interface = create_interface(&database);

    let population = interface.population_by_name("GBR").unwrap().unwrap();
    assert_eq!(population.population_name, "GBR");
    assert_eq!(population.sampling_location.as_deref(), Some("England and Scotland"),
        "The sampling location should come from the metadata file");
    assert!(interface.population_by_name("YRI").unwrap().is_none(), "Found an unknown population");

    let details = interface.population_details("GBR").unwrap().unwrap();
    assert_eq!(details.genetic_diversity.as_deref(), Some("High"));
    assert_eq!(details.disease_trait_associations.as_deref(), Some("Type 2 diabetes"));

    let subs = interface.sub_populations("GBR").unwrap();
    assert_eq!(subs.len(), 1, "Wrong number of GBR sub-populations");
    assert_eq!(subs[0].sub_population, "Cornwall");

    drop(interface);
    drop(database);
    fs::remove_file(&db_file).unwrap();
}

#[test]
fn frequencies() {
    let (db_file, mut database) = create_database("frequencies");
    ingest_fixtures(&mut database);
    let mut interface = create_interface(&database);

    let frequencies = interface.frequencies_for_snp("rs100").unwrap();
    assert_eq!(
        frequencies,
        vec![("GBR".to_string(), Some(0.23)), ("GIH".to_string(), Some(0.41))],
        "Wrong frequencies for rs100"
    );
    let frequencies = interface.frequencies_for_snp("rs500").unwrap();
    assert!(frequencies.is_empty(), "rs500 should have no frequencies");

    drop(interface);
    drop(database);
    fs::remove_file(&db_file).unwrap();
}

#[test]
fn selection_statistics() {
    let (db_file, mut database) = create_database("selection-stats");
    ingest_fixtures(&mut database);
    let mut interface = create_interface(&database);

    let fst = interface.fst_for_chromosome("7").unwrap();
    assert_eq!(fst.len(), 2, "Wrong number of FST rows on chromosome 7");
    assert_eq!(fst[0].position, 100);
    assert_eq!(fst[0].snp_name.as_deref(), Some("rs100"));
    assert_eq!(fst[0].fst, Some(0.12));
    assert_eq!(fst[1].position, 300);

    let ihs = interface.ihs_for_chromosome("7", None).unwrap();
    assert_eq!(ihs.len(), 2, "Wrong number of iHS rows on chromosome 7");
    let ihs = interface.ihs_for_chromosome("7", Some("GBR")).unwrap();
    assert_eq!(ihs.len(), 1, "Wrong number of GBR iHS rows on chromosome 7");
    assert_eq!(ihs[0].position, 100);
    assert_eq!(ihs[0].ihs_score, Some(2.1));
    let ihs = interface.ihs_for_chromosome("7", Some("YRI")).unwrap();
    assert!(ihs.is_empty(), "Found iHS rows for an unknown population");

    drop(interface);
    drop(database);
    fs::remove_file(&db_file).unwrap();
}

//-----------------------------------------------------------------------------
