//! Code for the report configuration, i.e., the fixed vocabularies and
//! annotation key names that the joiner and normalizer are built with.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::err::{Error, Vocabulary};

/// Selection of the short-read DNA analytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyteFilter {
    /// Value of `analyte_type` to keep.
    pub dna_analyte_type: String,
    /// Analyte ID suffixes marking long-read analytes, these are dropped.
    pub long_read_suffixes: Vec<String>,
}

impl Default for AnalyteFilter {
    fn default() -> Self {
        Self {
            dna_analyte_type: "DNA".into(),
            long_read_suffixes: vec![".PB".into(), ".ONT".into()],
        }
    }
}

impl AnalyteFilter {
    /// Whether an analyte with the given type and ID is a short-read DNA analyte.
    pub fn keep(&self, analyte_type: &str, analyte_id: &str) -> bool {
        analyte_type == self.dna_analyte_type
            && !self
                .long_read_suffixes
                .iter()
                .any(|suffix| analyte_id.ends_with(suffix.as_str()))
    }
}

/// Base URLs of the cross-reference links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Links {
    /// Franklin, addressed by hyphen-delimited coordinate.
    pub franklin_url: String,
    /// ClinVar, addressed by variation ID.
    pub clinvar_url: String,
}

impl Default for Links {
    fn default() -> Self {
        Self {
            franklin_url: "https://franklin.genoox.com/clinical-db/variant/snp".into(),
            clinvar_url: "https://www.ncbi.nlm.nih.gov/clinvar/variation".into(),
        }
    }
}

/// Names of the `INFO` and `FORMAT` keys written by the annotator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationKeys {
    /// Presence of this key switches on the population frequency group.
    pub af_hom: String,
    pub af_het: String,
    pub max_hl: String,
    pub vep: String,
    /// Presence of this key switches on the clinical group.
    pub clinvar_id: String,
    pub clinvar_sig: String,
    pub clinvar_revstat: String,
    pub disease: String,
    pub score: String,
    /// Sample-level allele fraction.
    pub allele_fraction: String,
    /// Sample-level read depth.
    pub read_depth: String,
}

impl Default for AnnotationKeys {
    fn default() -> Self {
        Self {
            af_hom: "gnomad.AF_hom".into(),
            af_het: "gnomad.AF_het".into(),
            max_hl: "gnomad.max_hl".into(),
            vep: "gnomad.vep".into(),
            clinvar_id: "clinvar.ID".into(),
            clinvar_sig: "clinvar.CLNSIG".into(),
            clinvar_revstat: "clinvar.CLNREVSTAT".into(),
            disease: "mitomap.Disease".into(),
            score: "tApogee.tAPOGEE_score".into(),
            allele_fraction: "AF".into(),
            read_depth: "DP".into(),
        }
    }
}

/// Layout of the pipe-delimited consequence annotation.
///
/// Another annotator release with a different field layout only needs a
/// different value here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsequenceSchema {
    /// Label of the layout, used in log and error messages.
    pub version: String,
    /// Offset of the functional consequence.
    pub consequence: usize,
    /// Offset of the gene symbol.
    pub gene_symbol: usize,
}

impl Default for ConsequenceSchema {
    fn default() -> Self {
        Self {
            version: "vep".into(),
            consequence: 1,
            gene_symbol: 3,
        }
    }
}

/// The complete, immutable configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the mitochondrial contig in the coverage files.
    pub mito_contig: String,
    /// UBERON code to biosample label.
    pub biosamples: IndexMap<String, String>,
    /// Comma-joined ClinVar review status to star rating.
    pub review_status: IndexMap<String, u8>,
    pub analytes: AnalyteFilter,
    pub links: Links,
    pub annotation_keys: AnnotationKeys,
    pub consequence_schema: ConsequenceSchema,
}

impl Default for Config {
    fn default() -> Self {
        let biosamples = [
            ("UBERON:0000178", "blood"),
            ("UBERON:0000479", "tissue"),
            ("UBERON:0006956", "buccal_mucosa"),
        ]
        .into_iter()
        .map(|(code, label)| (code.to_string(), label.to_string()))
        .collect();
        let review_status = [
            ("practice_guideline", 4),
            ("reviewed_by_expert_panel", 3),
            ("criteria_provided,_multiple_submitters,_no_conflicts", 2),
            ("criteria_provided,_conflicting_classifications", 1),
            ("criteria_provided,_single_submitter", 1),
            ("no_assertion_criteria_provided", 0),
            ("no_classification_provided", 0),
            ("no_classification_for_the_individual_variant", 0),
        ]
        .into_iter()
        .map(|(status, stars)| (status.to_string(), stars))
        .collect();

        Self {
            mito_contig: "chrM".into(),
            biosamples,
            review_status,
            analytes: Default::default(),
            links: Default::default(),
            annotation_keys: Default::default(),
            consequence_schema: Default::default(),
        }
    }
}

impl Config {
    /// Load configuration from the TOML file at `path`, or use the built-in
    /// defaults if `path` is `None`.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self, anyhow::Error> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                tracing::debug!("loading configuration from {:?}", path.as_ref());
                let toml_str = std::fs::read_to_string(path.as_ref()).map_err(|e| {
                    anyhow::anyhow!("could not read config {:?}: {}", path.as_ref(), e)
                })?;
                Ok(toml::from_str(&toml_str)?)
            }
        }
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, anyhow::Error> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Translate a UBERON code into the biosample label.
    pub fn biosample_label(&self, code: &str) -> Result<&str, Error> {
        self.biosamples
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| Error::UnmappedCategory {
                vocabulary: Vocabulary::Biosample,
                code: code.to_string(),
            })
    }

    /// Translate the comma-joined review status into its star rating.
    pub fn review_status_rank(&self, status: &str) -> Result<u8, Error> {
        self.review_status
            .get(status)
            .copied()
            .ok_or_else(|| Error::UnmappedCategory {
                vocabulary: Vocabulary::ReviewStatus,
                code: status.to_string(),
            })
    }
}
