use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use bio::io::fasta;

use crate::error::AnnotateError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqRecord {
    /// First whitespace-delimited token of the title line.
    pub id: String,
    /// The full title line, identifier included.
    pub description: String,
    pub sequence: String,
}

impl SeqRecord {
    pub fn from_title(title: &str) -> Self {
        let title = title.trim_end();
        let id = title.split_whitespace().next().unwrap_or_default().to_string();
        Self {
            id,
            description: title.to_string(),
            sequence: String::new(),
        }
    }

    /// Text written after the identifier on the title line, if any. The
    /// description is only repeated when it does not already start with the
    /// identifier.
    pub fn title_desc(&self) -> Option<&str> {
        if self.description.is_empty() {
            return None;
        }
        match self.description.strip_prefix(self.id.as_str()) {
            Some("") => None,
            Some(rest) if rest.starts_with(char::is_whitespace) => {
                // Drop the single separator after the identifier.
                let mut chars = rest.chars();
                chars.next();
                Some(chars.as_str()).filter(|rest| !rest.is_empty())
            }
            _ => Some(self.description.as_str()),
        }
    }

    fn from_fasta(record: &fasta::Record) -> Self {
        let description = match record.desc() {
            Some(desc) => format!("{} {desc}", record.id()),
            None => record.id().to_string(),
        };
        // Interior spaces and carriage returns are not residues.
        let sequence = record
            .seq()
            .iter()
            .filter(|byte| !byte.is_ascii_whitespace())
            .map(|&byte| byte as char)
            .collect();
        Self {
            id: record.id().to_string(),
            description,
            sequence,
        }
    }
}

pub fn read_fasta_file<P: AsRef<Path>>(path: P) -> Result<Vec<SeqRecord>, AnnotateError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| {
        AnnotateError::Filesystem(format!("open {}: {err}", path.display()))
    })?;
    read_fasta(BufReader::new(file))
}

pub fn read_fasta<R: BufRead>(reader: R) -> Result<Vec<SeqRecord>, AnnotateError> {
    fasta::Reader::from_bufread(reader)
        .records()
        .map(|record| {
            record
                .map(|record| SeqRecord::from_fasta(&record))
                .map_err(|err| AnnotateError::FastaParse(err.to_string()))
        })
        .collect()
}

/// Writes each record as a title line followed by its whole sequence on one
/// line.
pub fn write_fasta_2line<W: Write>(writer: W, records: &[SeqRecord]) -> std::io::Result<()> {
    let mut writer = fasta::Writer::new(writer);
    for record in records {
        writer.write(&record.id, record.title_desc(), record.sequence.as_bytes())?;
    }
    writer.flush()
}
