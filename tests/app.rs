use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use assert_matches::assert_matches;
use camino::{Utf8Path, Utf8PathBuf};

use seqtax_annotate::annotate::Annotator;
use seqtax_annotate::app::{App, RunOptions};
use seqtax_annotate::config::{Config, ConfigLoader, ConfigOverrides};
use seqtax_annotate::domain::{SourceFormat, SourceTag};
use seqtax_annotate::error::AnnotateError;
use seqtax_annotate::fasta::{SeqRecord, read_fasta_file};
use seqtax_annotate::lookup::{LookupQuery, LookupService};
use seqtax_annotate::output::JsonOutput;
use seqtax_annotate::species_map::SpeciesMap;
use seqtax_annotate::store::StoreLayout;

type Key = (String, String, Vec<String>);

/// Rows keyed by store file name, table and filter values.
#[derive(Default)]
struct MockLookup {
    rows: HashMap<Key, Vec<Vec<String>>>,
    calls: Mutex<Vec<String>>,
}

impl MockLookup {
    fn with_row(mut self, store: &str, table: &str, filter: &[&str], row: &[&str]) -> Self {
        let key = (
            store.to_string(),
            table.to_string(),
            filter.iter().map(|v| v.to_string()).collect(),
        );
        self.rows
            .entry(key)
            .or_default()
            .push(row.iter().map(|v| v.to_string()).collect());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl LookupService for MockLookup {
    fn query_unique(
        &self,
        store: &Utf8Path,
        query: &LookupQuery<'_>,
    ) -> Result<Option<Vec<String>>, AnnotateError> {
        let name = store.file_name().unwrap_or_default().to_string();
        self.calls.lock().unwrap().push(name.clone());
        let key = (
            name,
            query.table.to_string(),
            query.filter.iter().map(|(_, v)| v.to_string()).collect(),
        );
        Ok(match self.rows.get(&key) {
            Some(rows) if rows.len() == 1 => Some(rows[0].clone()),
            _ => None,
        })
    }
}

const LINEAGE: &str = "Eukaryota; Fungi; Ascomycota";
const JGI_TITLE: &str = "jgi|Neute1|12345|Pkinase_domain 1";

fn species_map() -> SpeciesMap {
    [("Neute1".to_string(), "510951".to_string())]
        .into_iter()
        .collect()
}

fn taxonomy(lookup: MockLookup) -> MockLookup {
    lookup
        .with_row(
            "taxonomy.db",
            "taxonomy",
            &["510951"],
            &["Neurospora tetrasperma", LINEAGE],
        )
        .with_row(
            "taxonomy.db",
            "taxonomy",
            &["9606"],
            &["Homo sapiens", "Eukaryota; Metazoa; Chordata"],
        )
}

fn kog_hit(lookup: MockLookup) -> MockLookup {
    lookup.with_row(
        "Neute1_kog.db",
        "Neute1",
        &["12345"],
        &["Serine/threonine protein kinase"],
    )
}

fn app(temp: &Path, lookup: MockLookup) -> App<MockLookup> {
    let config = Config {
        failure_path: temp.join("failure.fasta").display().to_string(),
        ..Config::default()
    };
    let overrides = ConfigOverrides {
        db_dir: Some(temp.join("db").display().to_string()),
        ..ConfigOverrides::default()
    };
    let resolved = ConfigLoader::resolve_config(config, overrides, None).unwrap();
    App::new(resolved, species_map(), lookup)
}

fn record(title: &str) -> SeqRecord {
    let mut record = SeqRecord::from_title(title);
    record.sequence = "MKVLAAGIV".to_string();
    record
}

#[test]
fn jgi_record_with_kog_definition() {
    let temp = tempfile::tempdir().unwrap();
    let app = app(temp.path(), taxonomy(kog_hit(MockLookup::default())));

    let batch = app
        .annotate_records(vec![record(JGI_TITLE)], RunOptions::default(), &JsonOutput)
        .unwrap();

    assert_eq!(batch.records.len(), 1);
    assert_eq!(
        batch.records[0].id,
        format!(
            "jgi||12345||Serine/threonine protein kinase||1||510951||Neurospora tetrasperma||{LINEAGE}"
        )
    );
    assert_eq!(batch.records[0].description, "");
    assert!(batch.failures.is_empty());
}

#[test]
fn jgi_record_without_kog_definition_falls_back() {
    let temp = tempfile::tempdir().unwrap();
    let app = app(temp.path(), taxonomy(MockLookup::default()));

    let batch = app
        .annotate_records(vec![record(JGI_TITLE)], RunOptions::default(), &JsonOutput)
        .unwrap();

    let expected =
        format!("jgi||12345||Pkinase||1||510951||Neurospora tetrasperma||{LINEAGE}");
    assert_eq!(batch.records[0].id, expected);
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].id, expected);
}

#[test]
fn excluded_species_never_queries_its_store() {
    let lookup = taxonomy(MockLookup::default());
    let layout = StoreLayout::new(Utf8PathBuf::from("/db"));
    let map: SpeciesMap = [("Neute_mat_a1".to_string(), "510951".to_string())]
        .into_iter()
        .collect();
    let annotator = Annotator::new(&layout, &lookup, &map);

    let annotated = annotator
        .annotate(SourceTag::Jgi, &record("jgi|Neute_mat_a1|77|Pkinase__domain 2"))
        .unwrap();

    assert!(annotated.fallback);
    assert!(annotated.annotation.to_string().starts_with("jgi||77||Pkinase||2||"));
    assert_eq!(lookup.calls(), vec!["taxonomy.db"]);
}

#[test]
fn jgi_queries_species_store_then_taxonomy() {
    let lookup = taxonomy(kog_hit(MockLookup::default()));
    let layout = StoreLayout::new(Utf8PathBuf::from("/db"));
    let map = species_map();
    let annotator = Annotator::new(&layout, &lookup, &map);

    let annotated = annotator.annotate(SourceTag::Jgi, &record(JGI_TITLE)).unwrap();

    assert!(!annotated.fallback);
    assert_eq!(lookup.calls(), vec!["Neute1_kog.db", "taxonomy.db"]);
}

#[test]
fn unknown_species_code_aborts() {
    let temp = tempfile::tempdir().unwrap();
    let app = app(temp.path(), taxonomy(MockLookup::default()));

    let err = app
        .annotate_records(
            vec![record("jgi|Aspni1|1|Pkinase_domain 1")],
            RunOptions::default(),
            &JsonOutput,
        )
        .unwrap_err();
    assert_matches!(err, AnnotateError::UnknownSpeciesCode(code) if code == "Aspni1");
}

fn three_source_lookup() -> MockLookup {
    taxonomy(kog_hit(MockLookup::default()))
        .with_row(
            "pfamseq.db",
            "pfamseq",
            &["A0A0B4J2F0.1"],
            &["Protein kinase", "Homo sapiens", "Eukaryota", "9606"],
        )
        .with_row("accession2taxid.db", "nucl_gb", &["XM_003648112.1"], &["9606"])
}

const THREE_SOURCES: &str = "\
>A0A0B4J2F0.1 A0A0B4J2F0_HUMAN/10-200 Protein kinase domain [1]
MKVLAAGIV
>XM_003648112.1  PREDICTED: kinase domain 2
MKVL
AAGIV
>jgi|Neute1|12345|Pkinase_domain 1
MKVLAAGIV
";

#[test]
fn run_one_record_per_source() {
    let temp = tempfile::tempdir().unwrap();
    let input = temp.path().join("domains.fasta");
    std::fs::write(&input, THREE_SOURCES).unwrap();
    let app = app(temp.path(), three_source_lookup());

    let summary = app.run(&input, RunOptions::default(), &JsonOutput).unwrap();

    assert_eq!(summary.annotated, 3);
    assert_eq!(summary.fallback, 0);
    assert!(summary.failure_path.is_none());
    assert!(!temp.path().join("failure.fasta").exists());

    let output = temp.path().join("domains.fasta.an");
    assert_eq!(summary.output, output.display().to_string());
    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        content,
        "\
>pfam||A0A0B4J2F0.1||Protein kinase||1||9606||Homo sapiens||Eukaryota; Metazoa; Chordata
MKVLAAGIV
>ncbi||XM_003648112.1||PREDICTED: kinase domain 2||2||9606||Homo sapiens||Eukaryota; Metazoa; Chordata
MKVLAAGIV
>jgi||12345||Serine/threonine protein kinase||1||510951||Neurospora tetrasperma||Eukaryota; Fungi; Ascomycota
MKVLAAGIV
"
    );
    assert_eq!(read_fasta_file(&output).unwrap().len(), 3);
}

#[test]
fn run_writes_failure_file_for_fallbacks() {
    let temp = tempfile::tempdir().unwrap();
    let input = temp.path().join("jgi.fasta");
    std::fs::write(&input, format!(">{JGI_TITLE}\nMKV\n")).unwrap();
    let app = app(temp.path(), taxonomy(MockLookup::default()));

    let summary = app.run(&input, RunOptions::default(), &JsonOutput).unwrap();

    assert_eq!(summary.fallback, 1);
    let failure = temp.path().join("failure.fasta");
    assert_eq!(summary.failure_path, Some(failure.display().to_string()));
    let failed = read_fasta_file(&failure).unwrap();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].id.starts_with("jgi||12345||Pkinase||1||"));
}

#[test]
fn lookup_miss_aborts_without_output() {
    let temp = tempfile::tempdir().unwrap();
    let input = temp.path().join("domains.fasta");
    std::fs::write(&input, THREE_SOURCES).unwrap();
    let app = app(temp.path(), taxonomy(kog_hit(MockLookup::default())));

    let err = app.run(&input, RunOptions::default(), &JsonOutput).unwrap_err();

    assert_matches!(err, AnnotateError::PfamAccessionNotFound(acc) if acc == "A0A0B4J2F0.1");
    assert!(!temp.path().join("domains.fasta.an").exists());
}

#[test]
fn skip_errors_isolates_bad_records() {
    let temp = tempfile::tempdir().unwrap();
    let input = temp.path().join("domains.fasta");
    std::fs::write(&input, THREE_SOURCES).unwrap();
    let app = app(temp.path(), taxonomy(kog_hit(MockLookup::default())));
    let options = RunOptions {
        skip_errors: true,
        ..RunOptions::default()
    };

    let summary = app.run(&input, options, &JsonOutput).unwrap();

    assert_eq!(summary.annotated, 1);
    assert_eq!(summary.skipped.len(), 2);
    assert_eq!(summary.skipped[0].id, "A0A0B4J2F0.1");
    assert_eq!(summary.skipped[1].id, "XM_003648112.1");
}

#[test]
fn forced_format_applies_to_every_record() {
    let temp = tempfile::tempdir().unwrap();
    let lookup = three_source_lookup();
    let app = app(temp.path(), lookup);
    let options = RunOptions {
        format: SourceFormat::Pfam,
        skip_errors: false,
    };

    let err = app
        .annotate_records(vec![record(JGI_TITLE)], options, &JsonOutput)
        .unwrap_err();
    assert_matches!(err, AnnotateError::PfamAccessionNotFound(_));
}

#[test]
fn pfam_taxid_missing_from_taxonomy_aborts() {
    let temp = tempfile::tempdir().unwrap();
    let lookup = MockLookup::default().with_row(
        "pfamseq.db",
        "pfamseq",
        &["A0A0B4J2F0.1"],
        &["Protein kinase", "Homo sapiens", "Eukaryota", "9606"],
    );
    let app = app(temp.path(), lookup);

    let err = app
        .annotate_records(
            vec![record("A0A0B4J2F0.1 Protein kinase domain [1]")],
            RunOptions::default(),
            &JsonOutput,
        )
        .unwrap_err();
    assert_matches!(err, AnnotateError::TaxidNotFound(taxid) if taxid == "9606");
}

#[test]
fn jgi_taxid_missing_from_taxonomy_aborts_after_kog_hit() {
    let lookup = kog_hit(MockLookup::default());
    let layout = StoreLayout::new(Utf8PathBuf::from("/db"));
    let map = species_map();
    let annotator = Annotator::new(&layout, &lookup, &map);

    let err = annotator
        .annotate(SourceTag::Jgi, &record(JGI_TITLE))
        .unwrap_err();

    assert_matches!(err, AnnotateError::TaxidNotFound(taxid) if taxid == "510951");
    assert_eq!(lookup.calls(), vec!["Neute1_kog.db", "taxonomy.db"]);
}
