use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::domain::{Annotation, DomainNumber, JgiHeader, SourceTag, split_ncbi_header};
use crate::error::AnnotateError;
use crate::fasta::SeqRecord;
use crate::lookup::{LookupQuery, LookupService};
use crate::species_map::SpeciesMap;
use crate::store::StoreLayout;

pub const DEFAULT_EXCLUDED_SPECIES: &[&str] = &["Neute_mat_a1"];

static DOMAIN_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_*domain").unwrap());

/// Result of annotating one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotated {
    pub annotation: Annotation,
    /// The description was rebuilt from the header because the authoritative
    /// store had no entry.
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyEntry {
    pub species: String,
    pub lineage: String,
}

pub struct Annotator<'a, L: LookupService> {
    layout: &'a StoreLayout,
    lookup: &'a L,
    species_map: &'a SpeciesMap,
    excluded_species: Vec<String>,
}

impl<'a, L: LookupService> Annotator<'a, L> {
    pub fn new(layout: &'a StoreLayout, lookup: &'a L, species_map: &'a SpeciesMap) -> Self {
        Self {
            layout,
            lookup,
            species_map,
            excluded_species: DEFAULT_EXCLUDED_SPECIES
                .iter()
                .map(|code| code.to_string())
                .collect(),
        }
    }

    /// JGI species whose per-species store is never queried.
    pub fn with_excluded_species(mut self, excluded: Vec<String>) -> Self {
        self.excluded_species = excluded;
        self
    }

    pub fn annotate(&self, tag: SourceTag, record: &SeqRecord) -> Result<Annotated, AnnotateError> {
        debug!(id = %record.id, source = %tag, "annotating record");
        match tag {
            SourceTag::Pfam => self.annotate_pfam(record),
            SourceTag::Ncbi => self.annotate_ncbi(record),
            SourceTag::Jgi => self.annotate_jgi(record),
        }
    }

    fn annotate_pfam(&self, record: &SeqRecord) -> Result<Annotated, AnnotateError> {
        let accession = record.id.as_str();
        let domain_number = DomainNumber::extract(&record.description)?;
        let names = self.layout.names();
        let row = self
            .lookup
            .query_unique(
                &self.layout.pfamseq_path(),
                &LookupQuery {
                    table: &names.pfamseq_table,
                    fields: &["description", "species", "taxonomy", "ncbi_taxid"],
                    filter: &[("pfamseq_acc", accession)],
                },
            )?
            .ok_or_else(|| AnnotateError::PfamAccessionNotFound(accession.to_string()))?;
        let mut row = row.into_iter();
        let description = row.next().unwrap_or_default();
        let taxid = row.nth(2).unwrap_or_default();

        let taxonomy = self.resolve_taxonomy(&taxid)?;
        Ok(Annotated {
            annotation: Annotation {
                source: SourceTag::Pfam,
                primary_id: accession.to_string(),
                description,
                domain_number,
                taxid,
                species: taxonomy.species,
                lineage: taxonomy.lineage,
            },
            fallback: false,
        })
    }

    fn annotate_ncbi(&self, record: &SeqRecord) -> Result<Annotated, AnnotateError> {
        let (accession, description) = split_ncbi_header(&record.id, &record.description);
        let domain_number = DomainNumber::extract(&record.description)?;
        let names = self.layout.names();
        let row = self
            .lookup
            .query_unique(
                &self.layout.accession2taxid_path(),
                &LookupQuery {
                    table: &names.accession2taxid_table,
                    fields: &["taxid"],
                    filter: &[("accession.version", accession)],
                },
            )?
            .ok_or_else(|| AnnotateError::NcbiAccessionNotFound(accession.to_string()))?;
        let taxid = row.into_iter().next().unwrap_or_default();

        let taxonomy = self.resolve_taxonomy(&taxid)?;
        Ok(Annotated {
            annotation: Annotation {
                source: SourceTag::Ncbi,
                primary_id: accession.to_string(),
                description,
                domain_number,
                taxid,
                species: taxonomy.species,
                lineage: taxonomy.lineage,
            },
            fallback: false,
        })
    }

    fn annotate_jgi(&self, record: &SeqRecord) -> Result<Annotated, AnnotateError> {
        let header: JgiHeader = record.description.parse()?;
        let taxid = self.species_map.taxid(&header.species_code)?.to_string();

        let kogdefline = if self.is_excluded(&header.species_code) {
            None
        } else {
            self.lookup
                .query_unique(
                    &self.layout.jgi_species_path(&header.species_code),
                    &LookupQuery {
                        table: &header.species_code,
                        fields: &["kogdefline"],
                        filter: &[("transcriptID", header.transcript_id.as_str())],
                    },
                )?
                .and_then(|row| row.into_iter().next())
        };

        let fallback = kogdefline.is_none();
        let description = match kogdefline {
            Some(defline) => defline,
            None => {
                warn!(
                    id = %record.id,
                    transcript = %header.transcript_id,
                    "no KOG definition; using protein id"
                );
                fallback_description(&header.protein_id)
            }
        };

        let taxonomy = self.resolve_taxonomy(&taxid)?;
        Ok(Annotated {
            annotation: Annotation {
                source: SourceTag::Jgi,
                primary_id: header.transcript_id,
                description,
                domain_number: header.domain_number,
                taxid,
                species: taxonomy.species,
                lineage: taxonomy.lineage,
            },
            fallback,
        })
    }

    pub fn resolve_taxonomy(&self, taxid: &str) -> Result<TaxonomyEntry, AnnotateError> {
        let names = self.layout.names();
        let row = self
            .lookup
            .query_unique(
                &self.layout.taxonomy_path(),
                &LookupQuery {
                    table: &names.taxonomy_table,
                    fields: &["species", "lineage"],
                    filter: &[("taxid", taxid)],
                },
            )?
            .ok_or_else(|| AnnotateError::TaxidNotFound(taxid.to_string()))?;
        let mut fields = row.into_iter();
        Ok(TaxonomyEntry {
            species: fields.next().unwrap_or_default(),
            lineage: fields.next().unwrap_or_default(),
        })
    }

    fn is_excluded(&self, species_code: &str) -> bool {
        self.excluded_species.iter().any(|code| code == species_code)
    }
}

/// Protein id up to its `domain` token, e.g. `Kinase__domain1` -> `Kinase`.
pub fn fallback_description(protein_id: &str) -> String {
    DOMAIN_SUFFIX
        .split(protein_id)
        .next()
        .unwrap_or(protein_id)
        .to_string()
}
