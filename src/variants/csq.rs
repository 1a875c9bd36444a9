//! Parsing of the pipe-delimited consequence annotation.

use crate::conf::ConsequenceSchema;

/// The fields of a consequence annotation used in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsequenceAnnotation {
    /// Functional consequence, e.g., `missense_variant`.
    pub consequence: String,
    /// Gene symbol, e.g., `MT-ND5`.
    pub gene_symbol: String,
}

impl ConsequenceAnnotation {
    /// Parse `raw` with the field offsets from `schema`.
    ///
    /// # Errors
    ///
    /// If `raw` has too few fields for `schema`.
    pub fn parse(raw: &str, schema: &ConsequenceSchema) -> Result<Self, String> {
        let fields = raw.split('|').collect::<Vec<_>>();
        let field = |offset: usize, name: &str| {
            fields.get(offset).map(|s| s.to_string()).ok_or_else(|| {
                format!(
                    "no {} at offset {} of {} layout, only {} fields in {:?}",
                    name,
                    offset,
                    &schema.version,
                    fields.len(),
                    raw
                )
            })
        };

        Ok(Self {
            consequence: field(schema.consequence, "consequence")?,
            gene_symbol: field(schema.gene_symbol, "gene symbol")?,
        })
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_default_layout() -> Result<(), anyhow::Error> {
        let annotation = ConsequenceAnnotation::parse(
            "G|missense_variant|MODERATE|MT-ND5|ENSG00000198786|Transcript",
            &ConsequenceSchema::default(),
        )
        .map_err(|e| anyhow::anyhow!(e))?;

        assert_eq!(
            annotation,
            ConsequenceAnnotation {
                consequence: "missense_variant".into(),
                gene_symbol: "MT-ND5".into(),
            }
        );
        Ok(())
    }

    #[test]
    fn parse_other_layout() -> Result<(), anyhow::Error> {
        let schema = ConsequenceSchema {
            version: "snpeff".into(),
            consequence: 1,
            gene_symbol: 2,
        };

        let annotation = ConsequenceAnnotation::parse("G|synonymous_variant|MT-CO1", &schema)
            .map_err(|e| anyhow::anyhow!(e))?;

        assert_eq!(annotation.gene_symbol, "MT-CO1");
        Ok(())
    }

    #[test]
    fn parse_too_few_fields() {
        let err =
            ConsequenceAnnotation::parse("G|missense_variant", &ConsequenceSchema::default())
                .unwrap_err();
        assert!(err.contains("no gene symbol at offset 3 of vep layout"), "{}", err);
    }

    #[test]
    fn parse_keeps_empty_fields() -> Result<(), anyhow::Error> {
        let annotation = ConsequenceAnnotation::parse("G|||", &ConsequenceSchema::default())
            .map_err(|e| anyhow::anyhow!(e))?;
        assert_eq!(annotation.consequence, "");
        assert_eq!(annotation.gene_symbol, "");
        Ok(())
    }
}
