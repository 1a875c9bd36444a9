//! Error taxonomy of the report builder.

use std::path::PathBuf;

/// The fixed vocabularies that codes are translated through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Vocabulary {
    /// UBERON biosample codes.
    #[strum(serialize = "biosample")]
    Biosample,
    /// ClinVar review status.
    #[strum(serialize = "review status")]
    ReviewStatus,
}

/// How far an error reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only the affected participant or variant is lost; collected and
    /// reported at the end of the run.
    Record,
    /// The run cannot continue.
    Process,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("malformed identifier {token:?}: {reason}")]
    MalformedIdentifier { token: String, reason: String },
    #[error("no entry for {code:?} in the {vocabulary} vocabulary")]
    UnmappedCategory {
        vocabulary: Vocabulary,
        code: String,
    },
    #[error("missing required {metric} for {subject}")]
    MissingRequiredMetric { subject: String, metric: String },
    #[error("malformed {key} annotation for {subject}: {reason}")]
    MalformedAnnotation {
        subject: String,
        key: String,
        reason: String,
    },
    #[error("ambiguous analyte for {consent_id}: biosample codes {codes:?} disagree")]
    AmbiguousAnalyte {
        consent_id: String,
        codes: Vec<String>,
    },
    #[error("could not read {path:?}: {source}")]
    SourceFileUnavailable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Build a `SourceFileUnavailable` for `path`.
    pub fn unavailable<P, E>(path: P, source: E) -> Self
    where
        P: Into<PathBuf>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::SourceFileUnavailable {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Error::UnmappedCategory { .. } | Error::SourceFileUnavailable { .. } => Scope::Process,
            Error::MalformedIdentifier { .. }
            | Error::MissingRequiredMetric { .. }
            | Error::MalformedAnnotation { .. }
            | Error::AmbiguousAnalyte { .. } => Scope::Record,
        }
    }
}
