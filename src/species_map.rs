use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::error::AnnotateError;

pub const TAXID_COLUMN: usize = 0;
pub const SPECIES_CODE_COLUMN: usize = 6;

/// JGI species code to NCBI taxid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeciesMap {
    entries: HashMap<String, String>,
}

impl SpeciesMap {
    pub fn load(path: &Path) -> Result<Self, AnnotateError> {
        let file = std::fs::File::open(path).map_err(|err| AnnotateError::SpeciesMapRead {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let map = Self::from_reader(file)?;
        info!(path = %path.display(), species = map.len(), "loaded species map");
        Ok(map)
    }

    /// Reads CSV with a header row; duplicate species codes keep the last row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AnnotateError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut entries = HashMap::new();
        for (idx, record) in csv_reader.records().enumerate() {
            let record = record.map_err(|err| AnnotateError::SpeciesMapParse(err.to_string()))?;
            // Row numbers count the header as row 1.
            let row = idx as u64 + 2;
            let column = |column: usize| {
                record
                    .get(column)
                    .map(str::to_string)
                    .ok_or(AnnotateError::MalformedSpeciesMap { row, column })
            };
            let taxid = column(TAXID_COLUMN)?;
            let code = column(SPECIES_CODE_COLUMN)?;
            entries.insert(code, taxid);
        }
        Ok(Self { entries })
    }

    pub fn taxid(&self, species_code: &str) -> Result<&str, AnnotateError> {
        self.entries
            .get(species_code)
            .map(String::as_str)
            .ok_or_else(|| AnnotateError::UnknownSpeciesCode(species_code.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for SpeciesMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
