use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;

use crate::error::AnnotateError;

pub const JGI_MARKER: &str = "jgi|";
pub const NCBI_PREFIX: &str = "XM_";
pub const FIELD_DELIMITER: &str = "||";

static DOMAIN_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"domain.*\[*(\d)\]*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTag {
    Pfam,
    Ncbi,
    Jgi,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Pfam => "pfam",
            SourceTag::Ncbi => "ncbi",
            SourceTag::Jgi => "jgi",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Database of origin for a whole run: either detected per record or forced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SourceFormat {
    #[default]
    Multiple,
    Pfam,
    Ncbi,
    Jgi,
}

impl SourceFormat {
    pub fn fixed_tag(self) -> Option<SourceTag> {
        match self {
            SourceFormat::Multiple => None,
            SourceFormat::Pfam => Some(SourceTag::Pfam),
            SourceFormat::Ncbi => Some(SourceTag::Ncbi),
            SourceFormat::Jgi => Some(SourceTag::Jgi),
        }
    }

    pub fn classify(self, identifier: &str) -> SourceTag {
        self.fixed_tag()
            .unwrap_or_else(|| identify_source(identifier))
    }
}

/// Guess the source database of a record from its identifier. Anything that
/// is neither JGI nor NCBI is treated as Pfam.
pub fn identify_source(identifier: &str) -> SourceTag {
    if identifier.contains(JGI_MARKER) {
        SourceTag::Jgi
    } else if identifier.contains(NCBI_PREFIX) {
        SourceTag::Ncbi
    } else {
        SourceTag::Pfam
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainNumber(String);

impl DomainNumber {
    /// Pull the trailing domain digit out of free text such as
    /// `"Kinase domain [2]"`.
    pub fn extract(text: &str) -> Result<Self, AnnotateError> {
        DOMAIN_NUMBER
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|digit| Self(digit.as_str().to_string()))
            .ok_or_else(|| AnnotateError::MissingDomainNumber(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fields of a JGI description line:
/// `jgi|<species code>|<transcript id>|<protein id>[|<extra>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JgiHeader {
    pub species_code: String,
    pub transcript_id: String,
    pub protein_id: String,
    pub domain_number: DomainNumber,
}

impl FromStr for JgiHeader {
    type Err = AnnotateError;

    fn from_str(description: &str) -> Result<Self, Self::Err> {
        let fields = description.split('|').collect::<Vec<_>>();
        // Five-field headers carry the domain token in the trailing field.
        let domain_field = match fields.len() {
            4 => fields[3],
            5 => fields[4],
            count => {
                return Err(AnnotateError::UnsupportedJgiFieldCount {
                    count,
                    description: description.to_string(),
                });
            }
        };
        Ok(Self {
            species_code: fields[1].to_string(),
            transcript_id: fields[2].to_string(),
            protein_id: fields[3].to_string(),
            domain_number: DomainNumber::extract(domain_field)?,
        })
    }
}

/// Split a RefSeq-style record into its accession.version and the free text
/// after the first double-space separator.
pub fn split_ncbi_header<'a>(identifier: &'a str, description: &str) -> (&'a str, String) {
    let accession = identifier.split("  ").next().unwrap_or(identifier);
    let text = description.split("  ").skip(1).collect::<String>();
    (accession, text)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub source: SourceTag,
    pub primary_id: String,
    pub description: String,
    pub domain_number: DomainNumber,
    pub taxid: String,
    pub species: String,
    pub lineage: String,
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [
            self.source.as_str(),
            self.primary_id.as_str(),
            self.description.as_str(),
            self.domain_number.as_str(),
            self.taxid.as_str(),
            self.species.as_str(),
            self.lineage.as_str(),
        ];
        write!(f, "{}", fields.join(FIELD_DELIMITER))
    }
}
