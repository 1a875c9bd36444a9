//! Typed rows of the metadata tables and their lookup indices.
//!
//! Each table is read once into a `Vec` of rows; the indices map keys to
//! positions in that `Vec`.

use std::{collections::HashMap, path::Path, time::Instant};

use serde::Deserialize;
use thousands::Separable;

use crate::{
    common::io::read_tsv,
    conf::AnalyteFilter,
    err::Error,
};

/// Row of the demographic/phenotype table (`participant.tsv`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParticipantRow {
    /// Consent ID of the participant.
    #[serde(rename = "entity:participant_id")]
    pub participant_id: String,
    pub sex: String,
    pub age_at_last_observation: String,
    pub affected_status: String,
    pub phenotype_description: String,
    pub prior_testing: String,
}

/// Row of the analyte/biosample table (`analyte.tsv`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalyteRow {
    #[serde(rename = "entity:analyte_id")]
    pub analyte_id: String,
    pub analyte_type: String,
    /// Consent ID of the participant.
    pub participant_id: String,
    /// UBERON code.
    pub primary_biosample: String,
}

/// Row of the short-read alignment table (`aligned_dna_short_read.tsv`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AlignedMetricsRow {
    /// Full participant token.
    pub experiment_dna_short_read_id: String,
    pub mean_coverage: String,
}

/// Row of a `samtools coverage` output file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CoverageRow {
    #[serde(rename = "#rname")]
    pub rname: String,
    pub meandepth: f64,
}

/// The demographic table indexed by consent ID.
#[derive(Debug, Default)]
pub struct Participants {
    pub records: Vec<ParticipantRow>,
    pub by_consent_id: multimap::MultiMap<String, usize>,
}

impl Participants {
    pub fn from_rows(records: Vec<ParticipantRow>) -> Self {
        let mut by_consent_id = multimap::MultiMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_consent_id.insert(record.participant_id.clone(), idx);
        }
        Self {
            records,
            by_consent_id,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let before_loading = Instant::now();
        let result = Self::from_rows(read_tsv(path.as_ref())?);
        tracing::info!(
            "loaded {} participant rows from {:?} in {:?}",
            result.records.len().separate_with_commas(),
            path.as_ref(),
            before_loading.elapsed()
        );
        Ok(result)
    }

    /// Rows for the given consent ID, in table order.
    pub fn get(&self, consent_id: &str) -> Vec<&ParticipantRow> {
        self.by_consent_id
            .get_vec(consent_id)
            .map_or(Vec::new(), |idxs| {
                idxs.iter().map(|idx| &self.records[*idx]).collect()
            })
    }
}

/// The short-read DNA analytes indexed by consent ID and by consent ID plus
/// analyte ID.
///
/// Analytes of other types and long-read analytes are dropped when building.
#[derive(Debug, Default)]
pub struct Analytes {
    pub records: Vec<AnalyteRow>,
    pub by_consent_id: multimap::MultiMap<String, usize>,
    pub by_analyte: multimap::MultiMap<(String, String), usize>,
}

impl Analytes {
    pub fn from_rows(rows: Vec<AnalyteRow>, filter: &AnalyteFilter) -> Self {
        let total = rows.len();
        let records = rows
            .into_iter()
            .filter(|row| filter.keep(&row.analyte_type, &row.analyte_id))
            .collect::<Vec<_>>();
        tracing::debug!(
            "kept {} of {} analytes as short-read DNA",
            records.len(),
            total
        );

        let mut by_consent_id = multimap::MultiMap::new();
        let mut by_analyte = multimap::MultiMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_consent_id.insert(record.participant_id.clone(), idx);
            by_analyte.insert(
                (record.participant_id.clone(), record.analyte_id.clone()),
                idx,
            );
        }
        Self {
            records,
            by_consent_id,
            by_analyte,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P, filter: &AnalyteFilter) -> Result<Self, Error> {
        let before_loading = Instant::now();
        let result = Self::from_rows(read_tsv(path.as_ref())?, filter);
        tracing::info!(
            "loaded {} short-read DNA analyte rows from {:?} in {:?}",
            result.records.len().separate_with_commas(),
            path.as_ref(),
            before_loading.elapsed()
        );
        Ok(result)
    }

    fn resolve(&self, idxs: Option<&Vec<usize>>) -> Vec<&AnalyteRow> {
        idxs.map_or(Vec::new(), |idxs| {
            idxs.iter().map(|idx| &self.records[*idx]).collect()
        })
    }

    /// Rows for the given consent ID.
    pub fn get(&self, consent_id: &str) -> Vec<&AnalyteRow> {
        self.resolve(self.by_consent_id.get_vec(consent_id))
    }

    /// Rows for the given consent ID and analyte ID.
    pub fn get_analyte(&self, consent_id: &str, analyte_id: &str) -> Vec<&AnalyteRow> {
        self.resolve(
            self.by_analyte
                .get_vec(&(consent_id.to_string(), analyte_id.to_string())),
        )
    }
}

/// The alignment metrics indexed by short-read experiment ID.
#[derive(Debug, Default)]
pub struct AlignedMetrics {
    pub records: Vec<AlignedMetricsRow>,
    pub by_experiment_id: multimap::MultiMap<String, usize>,
}

impl AlignedMetrics {
    pub fn from_rows(records: Vec<AlignedMetricsRow>) -> Self {
        let mut by_experiment_id = multimap::MultiMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_experiment_id.insert(record.experiment_dna_short_read_id.clone(), idx);
        }
        Self {
            records,
            by_experiment_id,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let before_loading = Instant::now();
        let result = Self::from_rows(read_tsv(path.as_ref())?);
        tracing::info!(
            "loaded {} alignment metrics rows from {:?} in {:?}",
            result.records.len().separate_with_commas(),
            path.as_ref(),
            before_loading.elapsed()
        );
        Ok(result)
    }

    /// Rows for the given experiment ID, i.e., full participant token.
    pub fn get(&self, experiment_id: &str) -> Vec<&AlignedMetricsRow> {
        self.by_experiment_id
            .get_vec(experiment_id)
            .map_or(Vec::new(), |idxs| {
                idxs.iter().map(|idx| &self.records[*idx]).collect()
            })
    }
}

/// Per-participant coverage tables keyed by full participant token.
///
/// A participant without coverage file has no entry.
#[derive(Debug, Default)]
pub struct MitoCoverages {
    pub by_token: HashMap<String, Vec<CoverageRow>>,
}

impl MitoCoverages {
    /// Path of the coverage file of `token` below `dir`.
    pub fn path_for<P: AsRef<Path>>(dir: P, token: &str) -> std::path::PathBuf {
        dir.as_ref().join(format!("{}.coverage.txt", token))
    }

    /// Load the coverage files for all of `tokens` that have one.
    ///
    /// # Errors
    ///
    /// If an existing coverage file cannot be parsed.
    pub fn load<P: AsRef<Path>>(dir: P, tokens: &[&str]) -> Result<Self, Error> {
        let mut by_token = HashMap::new();
        for token in tokens {
            let path = Self::path_for(dir.as_ref(), token);
            if path.exists() {
                by_token.insert(token.to_string(), read_tsv(&path)?);
            } else {
                tracing::debug!("no coverage file {:?}", &path);
            }
        }
        tracing::info!(
            "loaded {} of {} coverage files from {:?}",
            by_token.len(),
            tokens.len(),
            dir.as_ref()
        );
        Ok(Self { by_token })
    }

    pub fn get(&self, token: &str) -> Option<&[CoverageRow]> {
        self.by_token.get(token).map(Vec::as_slice)
    }
}

/// All four metadata sources.
#[derive(Debug, Default)]
pub struct Sources {
    pub participants: Participants,
    pub analytes: Analytes,
    pub aligned_metrics: AlignedMetrics,
    pub mito_coverages: MitoCoverages,
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn load_participants() -> Result<(), anyhow::Error> {
        let participants = Participants::load("tests/mito/participant.tsv")?;

        assert_eq!(participants.records.len(), 3);
        let rows = participants.get("CONSORTIUM-PFX-007-0");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sex, "Female");
        assert_eq!(rows[0].age_at_last_observation, "12");
        assert!(participants.get("CONSORTIUM-PFX-007-1").is_empty());
        Ok(())
    }

    #[test]
    fn load_analytes_drops_long_read_and_rna() -> Result<(), anyhow::Error> {
        let analytes = Analytes::load("tests/mito/analyte.tsv", &AnalyteFilter::default())?;

        let ids = analytes
            .records
            .iter()
            .map(|row| row.analyte_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["SM-A1B2C", "SM-Q7R8S", "SM-X9Y8Z", "SM-K1L2M"]);
        assert_eq!(analytes.get("CONSORTIUM-PFX-003-0").len(), 1);
        assert_eq!(
            analytes
                .get_analyte("CONSORTIUM-PFX-003-0", "SM-A1B2C")
                .len(),
            1
        );
        assert!(analytes
            .get_analyte("CONSORTIUM-PFX-003-0", "SM-A1B2C.PB")
            .is_empty());
        Ok(())
    }

    #[test]
    fn load_aligned_metrics() -> Result<(), anyhow::Error> {
        let metrics = AlignedMetrics::load("tests/mito/aligned_dna_short_read.tsv")?;

        let rows = metrics.get("CONSORTIUM-PFX-003-0_SM-A1B2C_RUN1");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].mean_coverage, "35.2");
        assert!(metrics.get("CONSORTIUM-PFX-003-0").is_empty());
        Ok(())
    }

    #[test]
    fn load_mito_coverages_skips_missing_files() -> Result<(), anyhow::Error> {
        let coverages = MitoCoverages::load(
            "tests/mito/coverage",
            &["CONSORTIUM-PFX-007-0", "CONSORTIUM-PFX-999-0"],
        )?;

        let rows = coverages.get("CONSORTIUM-PFX-007-0").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].rname, "chrM");
        assert!(coverages.get("CONSORTIUM-PFX-999-0").is_none());
        Ok(())
    }

    #[test]
    fn load_missing_table_is_unavailable() {
        let err = Participants::load("tests/mito/no-such-table.tsv").unwrap_err();
        assert!(matches!(err, Error::SourceFileUnavailable { .. }));
    }
}
