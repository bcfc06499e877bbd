use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::annotate::Annotator;
use crate::config::ResolvedConfig;
use crate::domain::SourceFormat;
use crate::error::AnnotateError;
use crate::fasta::{SeqRecord, read_fasta_file};
use crate::fs_util::write_fasta_atomic;
use crate::lookup::LookupService;
use crate::species_map::SpeciesMap;
use crate::store::StoreLayout;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub format: SourceFormat,
    /// Skip records whose own content fails to annotate instead of aborting.
    pub skip_errors: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedRecord {
    pub id: String,
    pub reason: String,
}

/// Records after annotation, before anything is written.
#[derive(Debug, Clone, Default)]
pub struct AnnotationBatch {
    pub records: Vec<SeqRecord>,
    pub failures: Vec<SeqRecord>,
    pub skipped: Vec<SkippedRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input: String,
    pub output: String,
    pub annotated: usize,
    pub fallback: usize,
    pub failure_path: Option<String>,
    pub skipped: Vec<SkippedRecord>,
    pub finished_at: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<L: LookupService> {
    layout: StoreLayout,
    lookup: L,
    species_map: SpeciesMap,
    excluded_species: Vec<String>,
    output_suffix: String,
    failure_path: PathBuf,
}

impl<L: LookupService> App<L> {
    pub fn new(config: ResolvedConfig, species_map: SpeciesMap, lookup: L) -> Self {
        Self {
            layout: config.layout,
            lookup,
            species_map,
            excluded_species: config.excluded_species,
            output_suffix: config.output_suffix,
            failure_path: config.failure_path,
        }
    }

    /// Loads the species map named by the config.
    pub fn from_config(config: ResolvedConfig, lookup: L) -> Result<Self, AnnotateError> {
        let species_map = SpeciesMap::load(&config.species_map)?;
        Ok(Self::new(config, species_map, lookup))
    }

    pub fn output_path(&self, input: &Path) -> PathBuf {
        let mut path = input.as_os_str().to_owned();
        path.push(&self.output_suffix);
        PathBuf::from(path)
    }

    pub fn run(
        &self,
        input: &Path,
        options: RunOptions,
        sink: &dyn ProgressSink,
    ) -> Result<RunSummary, AnnotateError> {
        let started = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Load; reading {}", input.display()),
            elapsed: None,
        });
        let records = read_fasta_file(input)?;
        info!(input = %input.display(), records = records.len(), "loaded records");

        let batch = self.annotate_records(records, options, sink)?;

        let output = self.output_path(input);
        sink.event(ProgressEvent {
            message: format!("phase=Write; {} records to {}", batch.records.len(), output.display()),
            elapsed: Some(started.elapsed()),
        });
        write_fasta_atomic(&output, &batch.records)?;

        let failure_path = if batch.failures.is_empty() {
            None
        } else {
            warn!(
                count = batch.failures.len(),
                path = %self.failure_path.display(),
                "writing records annotated without a KOG definition"
            );
            write_fasta_atomic(&self.failure_path, &batch.failures)?;
            Some(self.failure_path.display().to_string())
        };

        sink.event(ProgressEvent {
            message: "phase=Done".to_string(),
            elapsed: Some(started.elapsed()),
        });
        Ok(RunSummary {
            input: input.display().to_string(),
            output: output.display().to_string(),
            annotated: batch.records.len(),
            fallback: batch.failures.len(),
            failure_path,
            skipped: batch.skipped,
            finished_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Classifies and annotates every record, rewriting identifiers in place.
    pub fn annotate_records(
        &self,
        records: Vec<SeqRecord>,
        options: RunOptions,
        sink: &dyn ProgressSink,
    ) -> Result<AnnotationBatch, AnnotateError> {
        let annotator = Annotator::new(&self.layout, &self.lookup, &self.species_map)
            .with_excluded_species(self.excluded_species.clone());
        let total = records.len();
        let mut batch = AnnotationBatch::default();

        for (idx, mut record) in records.into_iter().enumerate() {
            let tag = options.format.classify(&record.id);
            sink.event(ProgressEvent {
                message: format!("phase=Annotate; {}/{} {} ({tag})", idx + 1, total, record.id),
                elapsed: None,
            });

            let annotated = match annotator.annotate(tag, &record) {
                Ok(annotated) => annotated,
                Err(err) if options.skip_errors && err.is_record_level() => {
                    warn!(id = %record.id, error = %err, "skipping record");
                    batch.skipped.push(SkippedRecord {
                        id: record.id,
                        reason: err.to_string(),
                    });
                    continue;
                }
                Err(err) => return Err(err),
            };

            record.id = annotated.annotation.to_string();
            record.description.clear();
            if annotated.fallback {
                batch.failures.push(record.clone());
            }
            batch.records.push(record);
        }

        Ok(batch)
    }
}
