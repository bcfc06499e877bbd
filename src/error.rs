use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AnnotateError {
    #[error("no database directory provided (use --dbdir, db_dir in the config, or SQLITEDB)")]
    MissingStoreDir,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read species map {path}: {message}")]
    SpeciesMapRead { path: PathBuf, message: String },

    #[error("invalid species map: {0}")]
    SpeciesMapParse(String),

    #[error("species map row {row} has no column {column}")]
    MalformedSpeciesMap { row: u64, column: usize },

    #[error("failed to open store {path}: {message}")]
    StoreOpen { path: String, message: String },

    #[error("query on store {path} failed: {message}")]
    StoreQuery { path: String, message: String },

    #[error("Pfam accession {0} not found.")]
    PfamAccessionNotFound(String),

    #[error("NCBI accession.version {0} not found.")]
    NcbiAccessionNotFound(String),

    #[error("NCBI taxid {0} not found.")]
    TaxidNotFound(String),

    #[error("no domain number found in {0:?}")]
    MissingDomainNumber(String),

    #[error("unsupported JGI header with {count} fields: {description}")]
    UnsupportedJgiFieldCount { count: usize, description: String },

    #[error("JGI species code {0} missing from species map")]
    UnknownSpeciesCode(String),

    #[error("invalid FASTA input: {0}")]
    FastaParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl AnnotateError {
    /// Errors caused by a single record's content rather than by the run's
    /// configuration or infrastructure.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            AnnotateError::PfamAccessionNotFound(_)
                | AnnotateError::NcbiAccessionNotFound(_)
                | AnnotateError::TaxidNotFound(_)
                | AnnotateError::MissingDomainNumber(_)
                | AnnotateError::UnsupportedJgiFieldCount { .. }
                | AnnotateError::UnknownSpeciesCode(_)
        )
    }

    /// Process exit status for a run that failed with this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AnnotateError::MissingStoreDir
            | AnnotateError::ConfigRead(_)
            | AnnotateError::ConfigParse(_)
            | AnnotateError::SpeciesMapRead { .. }
            | AnnotateError::SpeciesMapParse(_)
            | AnnotateError::MalformedSpeciesMap { .. } => 2,
            AnnotateError::PfamAccessionNotFound(_)
            | AnnotateError::NcbiAccessionNotFound(_)
            | AnnotateError::TaxidNotFound(_) => 3,
            AnnotateError::MissingDomainNumber(_)
            | AnnotateError::UnsupportedJgiFieldCount { .. }
            | AnnotateError::FastaParse(_) => 4,
            AnnotateError::UnknownSpeciesCode(_) => 5,
            AnnotateError::StoreOpen { .. }
            | AnnotateError::StoreQuery { .. }
            | AnnotateError::Filesystem(_) => 1,
        }
    }
}
