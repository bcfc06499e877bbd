use std::fs;
use std::path::Path;

use crate::error::AnnotateError;
use crate::fasta::{SeqRecord, write_fasta_2line};

/// Writes the records to a temp file next to `path` and renames it into
/// place, so a failed run never leaves a half-written output behind.
pub fn write_fasta_atomic(path: &Path, records: &[SeqRecord]) -> Result<(), AnnotateError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|err| AnnotateError::Filesystem(err.to_string()))?;
    let temp = tempfile::Builder::new()
        .prefix("seqtax-annotate")
        .tempfile_in(parent)
        .map_err(|err| AnnotateError::Filesystem(err.to_string()))?;
    write_fasta_2line(temp.as_file(), records)
        .map_err(|err| AnnotateError::Filesystem(format!("write {}: {err}", path.display())))?;
    temp.persist(path)
        .map_err(|err| AnnotateError::Filesystem(err.to_string()))?;
    Ok(())
}
