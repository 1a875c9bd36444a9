//! Assembly of the two report views.
//!
//! The "Variants" view has one row per participant and variant, the "Cohort"
//! view one row per participant.  Both are sorted by family and role, ties
//! keep the order in which participants were encountered.

use indexmap::IndexMap;

use crate::{
    ident::ParticipantToken,
    meta::{ParticipantMetadata, NOT_AVAILABLE},
    variants::{Link, VariantRecord, PLACEHOLDER},
};

pub mod cli;
pub mod xlsx;

/// A participant with its metadata and variants.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantRecord {
    pub token: ParticipantToken,
    pub metadata: ParticipantMetadata,
    /// Variants by coordinate key, in file order.
    pub variants: IndexMap<String, VariantRecord>,
}

impl ParticipantRecord {
    /// The composite sort key.
    pub fn sort_key(&self) -> (u32, u32) {
        (self.token.family_id, self.token.role_code)
    }
}

/// One cell of a sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Link(Link),
    Blank,
}

impl Cell {
    /// Numeric cell if `value` parses as finite number, text cell otherwise.
    pub fn from_value(value: &str) -> Self {
        match value.parse::<f64>() {
            Ok(number) if number.is_finite() => Cell::Number(number),
            _ => Cell::Text(value.to_string()),
        }
    }

    /// Text cell, no attempt to parse numbers.
    pub fn text(value: &str) -> Self {
        Cell::Text(value.to_string())
    }

    fn placeholder() -> Self {
        Cell::text(PLACEHOLDER)
    }

    /// Link cell, or its display text if the URL is too long for a sheet.
    pub fn link(link: &Link) -> Self {
        if link.url.len() > MAX_URL_LEN {
            tracing::debug!("URL for {} too long, writing as text", &link.text);
            Cell::text(&link.text)
        } else {
            Cell::Link(link.clone())
        }
    }

    /// Textual content of the cell; links render as their display text.
    #[cfg(test)]
    pub fn as_text(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Number(number) => number.to_string(),
            Cell::Link(link) => link.text.clone(),
            Cell::Blank => String::new(),
        }
    }
}

/// One sheet of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// Number of frozen rows and columns.
    pub freeze: (u32, u16),
}

/// The complete report.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub variants: Sheet,
    pub cohort: Sheet,
}

impl Report {
    pub fn sheets(&self) -> [&Sheet; 2] {
        [&self.variants, &self.cohort]
    }
}

/// Longest URL a spreadsheet link may have.
const MAX_URL_LEN: usize = 2083;

const ID_COLUMN: &str = "#Participant_ID";

const VARIANT_COLUMNS: &[&str] = &[
    "franklin_link",
    "clinvar_link",
    "vep_gene",
    "vep_cons",
    "af_hom",
    "af_het",
    "max_hl",
    "clnsig",
    "clnrevs",
    "mm_disease",
    "tApogee_score",
    "FILTER",
    "VAF",
    "DEPTH",
];

const PARTICIPANT_COLUMNS_VARIANTS: &[&str] = &[
    "Sex", "Age", "Status", "Phenotype", "Prior_Hx", "Sample", "WGS_cov", "MT_cov",
];

const COHORT_COLUMNS: &[&str] = &[
    "family_id",
    "proband_relationship",
    "sex",
    "age_at_last_observation",
    "affected_status",
    "phenotype_description",
    "prior_testing",
    "primary_biosample",
    "WGS_coverage",
    "MT_coverage",
];

/// Variant columns in report order.
fn variant_cells(variant: &VariantRecord) -> Vec<Cell> {
    let mut cells = vec![Cell::link(&variant.franklin_link)];

    match &variant.clinical {
        Some(clinical) => cells.push(Cell::link(&clinical.link)),
        None => cells.push(Cell::placeholder()),
    }
    match &variant.population {
        Some(population) => cells.extend([
            Cell::text(&population.consequence.gene_symbol),
            Cell::text(&population.consequence.consequence),
            Cell::from_value(&population.af_hom),
            Cell::from_value(&population.af_het),
            Cell::from_value(&population.max_hl),
        ]),
        None => cells.extend(std::iter::repeat(Cell::placeholder()).take(5)),
    }
    match &variant.clinical {
        Some(clinical) => cells.extend([
            Cell::text(&clinical.significance),
            Cell::Number(clinical.review_rank as f64),
        ]),
        None => cells.extend([Cell::placeholder(), Cell::placeholder()]),
    }
    cells.push(
        variant
            .disease
            .as_deref()
            .map_or_else(Cell::placeholder, Cell::text),
    );
    cells.push(
        variant
            .score
            .as_deref()
            .map_or_else(Cell::placeholder, Cell::from_value),
    );
    cells.extend([
        Cell::text(&variant.filters),
        Cell::from_value(&variant.allele_fraction),
        Cell::from_value(&variant.read_depth),
    ]);

    cells
}

/// Participant-level attribute columns, shared by both views.
fn participant_cells(metadata: &ParticipantMetadata) -> Vec<Cell> {
    let demographics = &metadata.demographics;
    vec![
        Cell::text(&demographics.sex),
        Cell::from_value(&demographics.age_at_last_observation),
        Cell::text(&demographics.affected_status),
        Cell::text(&demographics.phenotype_description),
        Cell::text(&demographics.prior_testing),
        Cell::text(&metadata.primary_biosample),
        metadata
            .wgs_coverage
            .as_deref()
            .map_or_else(|| Cell::text(NOT_AVAILABLE), Cell::from_value),
        Cell::Number(metadata.mt_coverage),
    ]
}

fn leading_cells(participant: &ParticipantRecord) -> Vec<Cell> {
    vec![
        Cell::text(&participant.token.raw),
        Cell::Number(participant.token.family_id as f64),
        Cell::Number(participant.token.role_code as f64),
    ]
}

/// Participants in report order.
pub fn sorted_participants(participants: &[ParticipantRecord]) -> Vec<&ParticipantRecord> {
    let mut result = participants.iter().collect::<Vec<_>>();
    // `sort_by_key` is stable, so ties stay in encounter order.
    result.sort_by_key(|participant| participant.sort_key());
    result
}

/// Build both views from `participants` given in encounter order.
pub fn assemble(participants: &[ParticipantRecord]) -> Report {
    let sorted = sorted_participants(participants);

    let mut variants = Sheet {
        name: "Variants".into(),
        header: std::iter::once(ID_COLUMN)
            .chain(["Family_ID", "Role"])
            .chain(VARIANT_COLUMNS.iter().copied())
            .chain(PARTICIPANT_COLUMNS_VARIANTS.iter().copied())
            .chain(["Notes"])
            .map(str::to_string)
            .collect(),
        rows: Vec::new(),
        freeze: (1, 4),
    };
    let mut cohort = Sheet {
        name: "Cohort".into(),
        header: std::iter::once(ID_COLUMN)
            .chain(COHORT_COLUMNS.iter().copied())
            .map(str::to_string)
            .collect(),
        rows: Vec::new(),
        freeze: (1, 3),
    };

    for participant in sorted {
        let shared = participant_cells(&participant.metadata);
        for variant in participant.variants.values() {
            let mut row = leading_cells(participant);
            row.extend(variant_cells(variant));
            row.extend(shared.iter().cloned());
            row.push(Cell::Blank);
            variants.rows.push(row);
        }

        let mut row = leading_cells(participant);
        row.extend(shared);
        cohort.rows.push(row);
    }

    tracing::debug!(
        "assembled {} variant rows and {} cohort rows",
        variants.rows.len(),
        cohort.rows.len()
    );
    Report { variants, cohort }
}
