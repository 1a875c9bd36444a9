//! Implementation of the `report` sub command.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    time::Instant,
};

use rayon::prelude::*;
use thousands::Separable;

use crate::{
    common::io::expand_input_paths,
    conf::Config,
    err::{Error, Scope},
    ident::{resolve, token_from_path, ParticipantToken},
    meta::{
        input::{AlignedMetrics, Analytes, MitoCoverages, Participants},
        MetadataJoiner, Sources,
    },
    variants::{read_variant_file, VariantNormalizer},
};

use super::{assemble, xlsx::write_report, ParticipantRecord};

/// File name suffixes of the annotated variant files.
const VCF_SUFFIXES: &[&str] = &[".anno.vcf", ".anno.vcf.gz"];

/// Command line arguments for `report` sub command.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "Build the mitochondrial cohort report", long_about = None)]
pub struct Args {
    /// Path to `participant.tsv` with demographics and phenotype.
    #[clap(long)]
    pub path_participants: String,
    /// Path to `analyte.tsv` with the biosamples.
    #[clap(long)]
    pub path_analytes: String,
    /// Path to `aligned_dna_short_read.tsv` with the WGS coverage.
    #[clap(long)]
    pub path_aligned_metrics: String,
    /// Directory with the `<participant>.coverage.txt` files from `samtools coverage`.
    #[clap(long)]
    pub path_coverage: String,
    /// Directories with `<participant>.anno.vcf` files, single files, or
    /// `@file` with one path per line.
    #[clap(long, required = true)]
    pub path_input_vcfs: Vec<String>,
    /// Path to the output XLSX file.
    #[clap(long)]
    pub path_output: String,
    /// Optional TOML file overriding the built-in vocabularies.
    #[clap(long)]
    pub path_config: Option<String>,
    /// Number of threads for processing participants, defaults to all cores.
    #[clap(long)]
    pub num_threads: Option<usize>,
}

/// A participant that could not be included in the report.
#[derive(Debug)]
pub struct Failure {
    /// The participant token, or the file name if there is no token.
    pub token: String,
    pub error: Error,
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", &self.token, &self.error)
    }
}

/// A discovered variant file with its resolved token.
#[derive(Debug, Clone)]
struct ParticipantInput {
    token: ParticipantToken,
    path: PathBuf,
}

/// Resolve the tokens of the variant files at `paths`.
fn discover(paths: &[PathBuf]) -> (Vec<ParticipantInput>, Vec<Failure>) {
    let mut inputs = Vec::new();
    let mut failures = Vec::new();
    let mut seen = HashSet::new();

    for path in paths {
        let Some(raw) = token_from_path(path) else {
            let name = path.display().to_string();
            failures.push(Failure {
                token: name.clone(),
                error: Error::MalformedIdentifier {
                    token: name,
                    reason: "no participant token in file name".into(),
                },
            });
            continue;
        };
        match resolve(&raw) {
            Ok(_) if !seen.insert(raw.clone()) => failures.push(Failure {
                token: raw.clone(),
                error: Error::MalformedIdentifier {
                    token: raw,
                    reason: format!("second variant file {:?} for the same token", path),
                },
            }),
            Ok(token) => inputs.push(ParticipantInput {
                token,
                path: path.clone(),
            }),
            Err(error) => failures.push(Failure { token: raw, error }),
        }
    }

    (inputs, failures)
}

/// Join metadata and normalize variants of one participant.
///
/// The outer `Result` carries errors that stop the run, the inner one the
/// participant's own failures.
fn process_participant(
    input: &ParticipantInput,
    sources: &Sources,
    joiner: &MetadataJoiner,
    normalizer: &VariantNormalizer,
) -> Result<Result<ParticipantRecord, Vec<Failure>>, Error> {
    tracing::debug!("processing {}", &input.token);
    let metadata = joiner.join(&input.token, sources);
    let variant_file = read_variant_file(&input.path, normalizer)?;

    let mut errors = Vec::new();
    let metadata = match metadata {
        Ok(metadata) => Some(metadata),
        Err(mut join_errors) => {
            if let Some(idx) = join_errors
                .iter()
                .position(|e| e.scope() == Scope::Process)
            {
                return Err(join_errors.swap_remove(idx));
            }
            errors.extend(join_errors);
            None
        }
    };
    errors.extend(variant_file.errors);

    match metadata {
        Some(metadata) if errors.is_empty() => Ok(Ok(ParticipantRecord {
            token: input.token.clone(),
            metadata,
            variants: variant_file.variants,
        })),
        _ => Ok(Err(errors
            .into_iter()
            .map(|error| Failure {
                token: input.token.raw.clone(),
                error,
            })
            .collect())),
    }
}

/// Load all sources and process all participants.
///
/// Returns the participants in encounter order together with the failures
/// of the participants that were left out.
///
/// # Errors
///
/// On the first error that is not limited to one participant or variant.
pub fn collect_participants(
    args: &Args,
    config: &Config,
) -> Result<(Vec<ParticipantRecord>, Vec<Failure>), Error> {
    let paths = expand_input_paths(&args.path_input_vcfs, VCF_SUFFIXES)?;
    let (inputs, mut failures) = discover(&paths);
    tracing::info!(
        "found {} participants in {} variant files",
        inputs.len().separate_with_commas(),
        paths.len().separate_with_commas()
    );

    let tokens = inputs
        .iter()
        .map(|input| input.token.raw.as_str())
        .collect::<Vec<_>>();
    let sources = Sources {
        participants: Participants::load(&args.path_participants)?,
        analytes: Analytes::load(&args.path_analytes, &config.analytes)?,
        aligned_metrics: AlignedMetrics::load(&args.path_aligned_metrics)?,
        mito_coverages: MitoCoverages::load(&args.path_coverage, &tokens)?,
    };

    let joiner = MetadataJoiner::new(config);
    let normalizer = VariantNormalizer::new(config);
    let outcomes = inputs
        .par_iter()
        .map(|input| process_participant(input, &sources, &joiner, &normalizer))
        .collect::<Result<Vec<_>, _>>()?;

    let mut participants = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(participant) => participants.push(participant),
            Err(participant_failures) => failures.extend(participant_failures),
        }
    }

    Ok((participants, failures))
}

/// Write `report` next to `path` first and move it into place afterwards.
fn write_report_atomically(report: &super::Report, path: &Path) -> Result<(), anyhow::Error> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let tmp_file = tempfile::Builder::new()
        .prefix(".mito-cohort-report")
        .suffix(".xlsx")
        .tempfile_in(dir)?;
    write_report(report, tmp_file.path())?;
    tmp_file.persist(path)?;
    Ok(())
}

/// Main entry point for `report` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = Instant::now();
    tracing::info!("mito-cohort-report {}", crate::common::VERSION);
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let config = Config::load(args.path_config.as_ref())?;
    tracing::debug!("config = {:?}", &config);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.num_threads.unwrap_or(0))
        .build()?;
    let (participants, failures) = pool.install(|| collect_participants(args, &config))?;
    if !failures.is_empty() {
        for failure in &failures {
            tracing::error!("{}", failure);
        }
        anyhow::bail!(
            "{} problem(s) with participants, no report written to {}",
            failures.len(),
            &args.path_output
        );
    }

    let report = assemble(&participants);
    tracing::info!(
        "writing {} variant rows for {} participants to {}",
        report.variants.rows.len().separate_with_commas(),
        report.cohort.rows.len().separate_with_commas(),
        &args.path_output
    );
    write_report_atomically(&report, Path::new(&args.path_output))?;

    tracing::info!(
        "All of `report` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}
