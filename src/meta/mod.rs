//! Joining of the metadata tables for one participant.
//!
//! The four lookups are independent of each other; each one has an explicit
//! "no match" outcome that is either a sentinel value or an error.

use itertools::Itertools;

use crate::{conf::Config, err::Error, ident::ParticipantToken};

pub mod input;

pub use input::Sources;

/// Sentinel for demographic and coverage values without source row.
pub const NOT_AVAILABLE: &str = "NA";
/// Sentinel for a participant without short-read DNA analyte.
pub const UNKNOWN_BIOSAMPLE: &str = "unknown";

/// Demographic and phenotype attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demographics {
    pub sex: String,
    pub age_at_last_observation: String,
    pub affected_status: String,
    pub phenotype_description: String,
    pub prior_testing: String,
}

impl Demographics {
    /// All attributes set to `"NA"`.
    pub fn not_available() -> Self {
        Self {
            sex: NOT_AVAILABLE.into(),
            age_at_last_observation: NOT_AVAILABLE.into(),
            affected_status: NOT_AVAILABLE.into(),
            phenotype_description: NOT_AVAILABLE.into(),
            prior_testing: NOT_AVAILABLE.into(),
        }
    }
}

impl From<&input::ParticipantRow> for Demographics {
    fn from(row: &input::ParticipantRow) -> Self {
        Self {
            sex: row.sex.clone(),
            age_at_last_observation: row.age_at_last_observation.clone(),
            affected_status: row.affected_status.clone(),
            phenotype_description: row.phenotype_description.clone(),
            prior_testing: row.prior_testing.clone(),
        }
    }
}

/// The merged participant-level attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantMetadata {
    pub demographics: Demographics,
    /// Biosample label or `"unknown"`.
    pub primary_biosample: String,
    /// Mean WGS coverage as found in the table, `None` renders as `"NA"`.
    pub wgs_coverage: Option<String>,
    /// Mean depth on the mitochondrial contig.
    pub mt_coverage: f64,
}

/// Performs the metadata lookups with a given configuration.
#[derive(Debug, Clone, Copy)]
pub struct MetadataJoiner<'a> {
    config: &'a Config,
}

impl<'a> MetadataJoiner<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Merge the results of all four lookups for `token`.
    ///
    /// # Errors
    ///
    /// The errors of all failed lookups, see `primary_biosample` and
    /// `mt_coverage`.
    pub fn join(
        &self,
        token: &ParticipantToken,
        sources: &Sources,
    ) -> Result<ParticipantMetadata, Vec<Error>> {
        let demographics = self.demographics(token, &sources.participants);
        let primary_biosample = self.primary_biosample(token, &sources.analytes);
        let wgs_coverage = self.wgs_coverage(token, &sources.aligned_metrics);
        let mt_coverage = self.mt_coverage(token, &sources.mito_coverages);

        match (primary_biosample, mt_coverage) {
            (Ok(primary_biosample), Ok(mt_coverage)) => Ok(ParticipantMetadata {
                demographics,
                primary_biosample,
                wgs_coverage,
                mt_coverage,
            }),
            (primary_biosample, mt_coverage) => Err(primary_biosample
                .err()
                .into_iter()
                .chain(mt_coverage.err())
                .collect()),
        }
    }

    /// Demographics by consent ID; `"NA"` for all attributes without match.
    pub fn demographics(
        &self,
        token: &ParticipantToken,
        participants: &input::Participants,
    ) -> Demographics {
        let rows = participants.get(&token.consent_id);
        if rows.len() > 1 {
            tracing::warn!(
                "{} participant rows for {}, using the first",
                rows.len(),
                &token.consent_id
            );
        }
        rows.first()
            .map(|row| Demographics::from(*row))
            .unwrap_or_else(|| {
                tracing::debug!("no participant row for {}", &token.consent_id);
                Demographics::not_available()
            })
    }

    /// Biosample label of the short-read DNA analyte.
    ///
    /// With analyte ID in the token, the match is on consent ID and analyte ID,
    /// otherwise on consent ID alone.  Several matching analytes are fine as
    /// long as they agree on the biosample code.
    ///
    /// # Errors
    ///
    /// `Error::UnmappedCategory` for a code not in the vocabulary and
    /// `Error::AmbiguousAnalyte` if the matching analytes disagree.
    pub fn primary_biosample(
        &self,
        token: &ParticipantToken,
        analytes: &input::Analytes,
    ) -> Result<String, Error> {
        let rows = match &token.analyte_id {
            Some(analyte_id) => analytes.get_analyte(&token.consent_id, analyte_id),
            None => analytes.get(&token.consent_id),
        };
        let codes = rows
            .iter()
            .map(|row| row.primary_biosample.as_str())
            .unique()
            .collect::<Vec<_>>();
        match codes.as_slice() {
            [] => Ok(UNKNOWN_BIOSAMPLE.to_string()),
            [code] => Ok(self.config.biosample_label(code)?.to_string()),
            _ => Err(Error::AmbiguousAnalyte {
                consent_id: token.consent_id.clone(),
                codes: codes.iter().map(|code| code.to_string()).collect(),
            }),
        }
    }

    /// Mean WGS coverage by full token.
    pub fn wgs_coverage(
        &self,
        token: &ParticipantToken,
        aligned_metrics: &input::AlignedMetrics,
    ) -> Option<String> {
        aligned_metrics
            .get(&token.raw)
            .first()
            .map(|row| row.mean_coverage.clone())
    }

    /// Mean depth on the mitochondrial contig by full token.
    ///
    /// # Errors
    ///
    /// `Error::MissingRequiredMetric` if there is no coverage file or no row
    /// for the mitochondrial contig in it.
    pub fn mt_coverage(
        &self,
        token: &ParticipantToken,
        mito_coverages: &input::MitoCoverages,
    ) -> Result<f64, Error> {
        let rows = mito_coverages
            .get(&token.raw)
            .ok_or_else(|| Error::MissingRequiredMetric {
                subject: token.raw.clone(),
                metric: "coverage file".into(),
            })?;
        rows.iter()
            .find(|row| row.rname == self.config.mito_contig)
            .map(|row| row.meandepth)
            .ok_or_else(|| Error::MissingRequiredMetric {
                subject: token.raw.clone(),
                metric: format!("{} row in coverage file", &self.config.mito_contig),
            })
    }
}
