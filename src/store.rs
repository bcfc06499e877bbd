use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// File and table names of the fixed lookup stores.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreNames {
    pub accession2taxid: String,
    pub accession2taxid_table: String,
    pub pfamseq: String,
    pub pfamseq_table: String,
    pub taxonomy: String,
    pub taxonomy_table: String,
    pub jgi_dir: String,
}

impl Default for StoreNames {
    fn default() -> Self {
        Self {
            accession2taxid: "accession2taxid.db".to_string(),
            accession2taxid_table: "nucl_gb".to_string(),
            pfamseq: "pfamseq.db".to_string(),
            pfamseq_table: "pfamseq".to_string(),
            taxonomy: "taxonomy.db".to_string(),
            taxonomy_table: "taxonomy".to_string(),
            jgi_dir: "jgi".to_string(),
        }
    }
}

/// Where every lookup store of a run lives.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: Utf8PathBuf,
    names: StoreNames,
}

impl StoreLayout {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self::with_names(root, StoreNames::default())
    }

    pub fn with_names(root: Utf8PathBuf, names: StoreNames) -> Self {
        Self { root, names }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn names(&self) -> &StoreNames {
        &self.names
    }

    pub fn accession2taxid_path(&self) -> Utf8PathBuf {
        self.root.join(&self.names.accession2taxid)
    }

    pub fn pfamseq_path(&self) -> Utf8PathBuf {
        self.root.join(&self.names.pfamseq)
    }

    pub fn taxonomy_path(&self) -> Utf8PathBuf {
        self.root.join(&self.names.taxonomy)
    }

    pub fn jgi_species_path(&self, species_code: &str) -> Utf8PathBuf {
        self.root
            .join(&self.names.jgi_dir)
            .join(format!("{species_code}_kog.db"))
    }
}
