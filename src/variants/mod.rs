//! Normalization of annotated variant records into flat report records.
//!
//! Each annotation source ("feature group") is keyed by the presence of one
//! `INFO` key.  When that key is absent, the whole group is absent and all of
//! its report columns show `"."`.

use std::{path::Path, time::Instant};

use indexmap::IndexMap;
use noodles_vcf as vcf;
use thousands::Separable;

use crate::{
    common::io::open_read_maybe_gz,
    conf::Config,
    err::{Error, Scope},
};

pub mod csq;
pub mod value;

use csq::ConsequenceAnnotation;
use value::{info_values, render_sample};

/// Placeholder for values whose annotation source had nothing to say.
pub const PLACEHOLDER: &str = ".";

/// A hyperlink with display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub url: String,
    pub text: String,
}

/// The population frequency group (gnomAD).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationFrequencies {
    /// Consequence annotation of the first transcript.
    pub consequence: ConsequenceAnnotation,
    /// Allele frequency of homoplasmic calls.
    pub af_hom: String,
    /// Allele frequency of heteroplasmic calls.
    pub af_het: String,
    /// Maximal observed heteroplasmy level.
    pub max_hl: String,
}

/// The clinical group (ClinVar).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClinicalSignificance {
    pub link: Link,
    /// First clinical significance label.
    pub significance: String,
    /// Review status star rating, 0 to 4.
    pub review_rank: u8,
}

/// One normalized variant call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    /// `<chrom>:<pos>_<ref>><alt>`
    pub coordinate_key: String,
    pub franklin_link: Link,
    pub population: Option<PopulationFrequencies>,
    pub clinical: Option<ClinicalSignificance>,
    /// Disease association (MITOMAP).
    pub disease: Option<String>,
    /// Pathogenicity score (t-APOGEE).
    pub score: Option<String>,
    /// Comma-joined filter values.
    pub filters: String,
    /// First allele fraction of the call.
    pub allele_fraction: String,
    /// Read depth of the call.
    pub read_depth: String,
}

/// Turns annotated VCF records into `VariantRecord`s.
#[derive(Debug, Clone, Copy)]
pub struct VariantNormalizer<'a> {
    config: &'a Config,
}

impl<'a> VariantNormalizer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Normalize one record, only the first alternate allele is considered.
    ///
    /// # Errors
    ///
    /// `Error::MissingRequiredMetric` without sample call, allele fraction or
    /// depth, `Error::MalformedAnnotation` for incomplete feature groups and
    /// `Error::UnmappedCategory` for an unknown review status.
    pub fn normalize(&self, record: &vcf::variant::RecordBuf) -> Result<VariantRecord, Error> {
        let coordinate_key = self.coordinate_key(record)?;
        let franklin_link = Link {
            url: format!(
                "{}/{}",
                &self.config.links.franklin_url,
                coordinate_key.replace([':', '_', '>'], "-")
            ),
            text: coordinate_key.clone(),
        };

        let population = self.population(record, &coordinate_key)?;
        let clinical = self.clinical(record, &coordinate_key)?;
        let keys = &self.config.annotation_keys;
        let disease = info_values(record, &keys.disease).map(first);
        let score = info_values(record, &keys.score).map(|values| values.join(","));

        let filters = record
            .filters()
            .as_ref()
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let (allele_fraction, read_depth) = self.call(record, &coordinate_key)?;

        Ok(VariantRecord {
            coordinate_key,
            franklin_link,
            population,
            clinical,
            disease,
            score,
            filters,
            allele_fraction,
            read_depth,
        })
    }

    fn coordinate_key(&self, record: &vcf::variant::RecordBuf) -> Result<String, Error> {
        let chrom = record.reference_sequence_name();
        let malformed = |key: &str| Error::MalformedAnnotation {
            subject: chrom.to_string(),
            key: key.to_string(),
            reason: "missing value".into(),
        };
        let pos = record
            .variant_start()
            .map(usize::from)
            .ok_or_else(|| malformed("POS"))?;
        let alternative = record
            .alternate_bases()
            .as_ref()
            .first()
            .ok_or_else(|| malformed("ALT"))?;

        Ok(format!(
            "{}:{}_{}>{}",
            chrom,
            pos,
            record.reference_bases(),
            alternative
        ))
    }

    /// Values of a key that must accompany the key of its feature group.
    fn required(
        &self,
        record: &vcf::variant::RecordBuf,
        coordinate_key: &str,
        group_key: &str,
        key: &str,
    ) -> Result<Vec<String>, Error> {
        info_values(record, key).ok_or_else(|| Error::MalformedAnnotation {
            subject: coordinate_key.to_string(),
            key: key.to_string(),
            reason: format!("absent although {} is present", group_key),
        })
    }

    fn population(
        &self,
        record: &vcf::variant::RecordBuf,
        coordinate_key: &str,
    ) -> Result<Option<PopulationFrequencies>, Error> {
        let keys = &self.config.annotation_keys;
        let Some(af_hom) = info_values(record, &keys.af_hom) else {
            return Ok(None);
        };
        let af_het = self.required(record, coordinate_key, &keys.af_hom, &keys.af_het)?;
        let max_hl = self.required(record, coordinate_key, &keys.af_hom, &keys.max_hl)?;
        let vep = self.required(record, coordinate_key, &keys.af_hom, &keys.vep)?;
        let consequence =
            ConsequenceAnnotation::parse(&first(vep), &self.config.consequence_schema).map_err(
                |reason| Error::MalformedAnnotation {
                    subject: coordinate_key.to_string(),
                    key: keys.vep.clone(),
                    reason,
                },
            )?;

        Ok(Some(PopulationFrequencies {
            consequence,
            af_hom: af_hom.join(","),
            af_het: af_het.join(","),
            max_hl: max_hl.join(","),
        }))
    }

    fn clinical(
        &self,
        record: &vcf::variant::RecordBuf,
        coordinate_key: &str,
    ) -> Result<Option<ClinicalSignificance>, Error> {
        let keys = &self.config.annotation_keys;
        let Some(clinvar_id) = info_values(record, &keys.clinvar_id) else {
            return Ok(None);
        };
        let clinvar_id = clinvar_id.join(",");
        let significance =
            self.required(record, coordinate_key, &keys.clinvar_id, &keys.clinvar_sig)?;
        let review_status =
            self.required(record, coordinate_key, &keys.clinvar_id, &keys.clinvar_revstat)?;
        let review_rank = self
            .config
            .review_status_rank(&review_status.join(","))?;

        Ok(Some(ClinicalSignificance {
            link: Link {
                url: format!("{}/{}", &self.config.links.clinvar_url, &clinvar_id),
                text: clinvar_id,
            },
            significance: first(significance),
            review_rank,
        }))
    }

    /// Allele fraction and depth from the first sample.
    fn call(
        &self,
        record: &vcf::variant::RecordBuf,
        coordinate_key: &str,
    ) -> Result<(String, String), Error> {
        let keys = &self.config.annotation_keys;
        let missing = |metric: String| Error::MissingRequiredMetric {
            subject: coordinate_key.to_string(),
            metric,
        };
        let sample = record
            .samples()
            .values()
            .next()
            .ok_or_else(|| missing("sample call".into()))?;
        let allele_fraction = sample
            .get(&keys.allele_fraction)
            .map(|value| first(render_sample(value)))
            .ok_or_else(|| missing(format!("FORMAT/{}", &keys.allele_fraction)))?;
        let read_depth = sample
            .get(&keys.read_depth)
            .map(|value| first(render_sample(value)))
            .ok_or_else(|| missing(format!("FORMAT/{}", &keys.read_depth)))?;

        Ok((allele_fraction, read_depth))
    }
}

fn first(values: Vec<String>) -> String {
    values.into_iter().next().unwrap_or_default()
}

/// The normalized variants of one file together with the errors of the
/// variants that could not be normalized.
#[derive(Debug, Default)]
pub struct VariantFile {
    /// Variants by coordinate key, in file order.
    pub variants: IndexMap<String, VariantRecord>,
    pub errors: Vec<Error>,
}

/// Read and normalize all records of the VCF file at `path`.
///
/// A later record with the same coordinate key replaces an earlier one.
///
/// # Errors
///
/// If the file cannot be read, or on the first error that is not limited to
/// one variant.
pub fn read_variant_file<P: AsRef<Path>>(
    path: P,
    normalizer: &VariantNormalizer,
) -> Result<VariantFile, Error> {
    let path = path.as_ref();
    let before_parsing = Instant::now();
    tracing::debug!("reading variants from {:?}", path);

    let mut reader = vcf::io::Reader::new(open_read_maybe_gz(path)?);
    let header = reader
        .read_header()
        .map_err(|e| Error::unavailable(path, e))?;

    let mut result = VariantFile::default();
    for record in reader.record_bufs(&header) {
        let record = record.map_err(|e| Error::unavailable(path, e))?;
        match normalizer.normalize(&record) {
            Ok(variant) => {
                if let Some(previous) =
                    result.variants.insert(variant.coordinate_key.clone(), variant)
                {
                    tracing::debug!(
                        "{:?}: replacing earlier record at {}",
                        path,
                        &previous.coordinate_key
                    );
                }
            }
            Err(e) if e.scope() == Scope::Process => return Err(e),
            Err(e) => result.errors.push(e),
        }
    }

    tracing::debug!(
        "normalized {} variants from {:?} in {:?}",
        result.variants.len().separate_with_commas(),
        path,
        before_parsing.elapsed()
    );
    Ok(result)
}
