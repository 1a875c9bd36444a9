//! Resolution of composite participant tokens.
//!
//! A token looks like `<prefix>-<prefix>-<family>-<role>[_<analyte>[_<run>...]]`,
//! e.g. `CONSORTIUM-PFX-007-1_SM-AB12C_RUN3`.  The part before the first
//! underscore is the consent ID.

use std::path::Path;

use crate::err::Error;

/// Separator between consent ID, analyte ID and sequencing run.
const SEGMENT_SEP: char = '_';
/// Separator within the consent ID.
const CONSENT_SEP: char = '-';

/// A resolved participant token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantToken {
    /// The full token as found in the file name.
    pub raw: String,
    /// The consent ID, e.g. `CONSORTIUM-PFX-007-1`.
    pub consent_id: String,
    /// Family number from the consent ID.
    pub family_id: u32,
    /// Role within the family from the consent ID.
    pub role_code: u32,
    /// Analyte ID, if given.
    pub analyte_id: Option<String>,
    /// Sequencing-run suffix, if given.
    pub sequencing_suffix: Option<String>,
}

impl std::fmt::Display for ParticipantToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.raw)
    }
}

impl std::str::FromStr for ParticipantToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve(s)
    }
}

fn malformed(token: &str, reason: impl Into<String>) -> Error {
    Error::MalformedIdentifier {
        token: token.to_string(),
        reason: reason.into(),
    }
}

/// Decompose `token` into its parts.
///
/// # Errors
///
/// `Error::MalformedIdentifier` if the consent ID does not have four
/// dash-delimited parts with integer family and role, or if an analyte
/// segment is present but empty.
pub fn resolve(token: &str) -> Result<ParticipantToken, Error> {
    let mut segments = token.splitn(3, SEGMENT_SEP);
    let consent_id = segments.next().unwrap_or_default();
    let analyte_id = segments.next();
    let sequencing_suffix = segments.next();

    let parts = consent_id.split(CONSENT_SEP).collect::<Vec<_>>();
    let [prefix1, prefix2, family, role] = parts.as_slice() else {
        return Err(malformed(
            token,
            format!(
                "consent ID {:?} has {} dash-delimited parts, expected 4",
                consent_id,
                parts.len()
            ),
        ));
    };
    if prefix1.is_empty() || prefix2.is_empty() {
        return Err(malformed(token, "empty consent ID prefix"));
    }
    let family_id = family
        .parse::<u32>()
        .map_err(|e| malformed(token, format!("family {:?} is not an integer: {}", family, e)))?;
    let role_code = role
        .parse::<u32>()
        .map_err(|e| malformed(token, format!("role {:?} is not an integer: {}", role, e)))?;

    let analyte_id = match analyte_id {
        Some("") => return Err(malformed(token, "empty analyte ID")),
        other => other.map(str::to_string),
    };
    let sequencing_suffix = match sequencing_suffix {
        Some("") => return Err(malformed(token, "empty sequencing run suffix")),
        other => other.map(str::to_string),
    };

    Ok(ParticipantToken {
        raw: token.to_string(),
        consent_id: consent_id.to_string(),
        family_id,
        role_code,
        analyte_id,
        sequencing_suffix,
    })
}

/// Extract the raw token from a file path, i.e., the file name up to the
/// first dot.
pub fn token_from_path<P: AsRef<Path>>(path: P) -> Option<String> {
    path.as_ref()
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn resolve_consent_id_only() -> Result<(), anyhow::Error> {
        let token = resolve("CONSORTIUM-PFX-007-1")?;

        assert_eq!(
            token,
            ParticipantToken {
                raw: "CONSORTIUM-PFX-007-1".into(),
                consent_id: "CONSORTIUM-PFX-007-1".into(),
                family_id: 7,
                role_code: 1,
                analyte_id: None,
                sequencing_suffix: None,
            }
        );
        Ok(())
    }

    #[test]
    fn resolve_with_analyte_and_run() -> Result<(), anyhow::Error> {
        let token = resolve("CONSORTIUM-PFX-1234-0_SM-AB12C_RUN3_LANE1")?;

        assert_eq!(token.consent_id, "CONSORTIUM-PFX-1234-0");
        assert_eq!(token.family_id, 1234);
        assert_eq!(token.role_code, 0);
        assert_eq!(token.analyte_id.as_deref(), Some("SM-AB12C"));
        assert_eq!(token.sequencing_suffix.as_deref(), Some("RUN3_LANE1"));
        assert_eq!(token.to_string(), "CONSORTIUM-PFX-1234-0_SM-AB12C_RUN3_LANE1");
        Ok(())
    }

    #[rstest::rstest]
    #[case("A-B-10-2", 10, 2)]
    #[case("A-B-0-0", 0, 0)]
    #[case("X-Y-0042-003_SM-1", 42, 3)]
    fn resolve_trailing_integers(
        #[case] raw: &str,
        #[case] family_id: u32,
        #[case] role_code: u32,
    ) -> Result<(), anyhow::Error> {
        let token: ParticipantToken = raw.parse()?;
        assert_eq!((token.family_id, token.role_code), (family_id, role_code));
        Ok(())
    }

    #[rstest::rstest]
    #[case("")]
    #[case("CONSORTIUM-PFX-007")]
    #[case("CONSORTIUM-PFX-007-1-2")]
    #[case("CONSORTIUM-PFX-seven-1")]
    #[case("CONSORTIUM-PFX-007-x")]
    #[case("CONSORTIUM-PFX-007-")]
    #[case("-PFX-007-1")]
    #[case("CONSORTIUM-PFX-007-1_")]
    #[case("CONSORTIUM-PFX-007-1_SM-1_")]
    fn resolve_malformed(#[case] raw: &str) {
        assert!(matches!(
            resolve(raw),
            Err(Error::MalformedIdentifier { .. })
        ));
    }

    #[test]
    fn resolve_is_idempotent() -> Result<(), anyhow::Error> {
        let raw = "CONSORTIUM-PFX-007-1_SM-AB12C";
        assert_eq!(resolve(raw)?, resolve(raw)?);
        assert_eq!(resolve(&resolve(raw)?.raw)?, resolve(raw)?);
        Ok(())
    }

    #[rstest::rstest]
    #[case("vcfs/CONSORTIUM-PFX-007-1.anno.vcf", Some("CONSORTIUM-PFX-007-1"))]
    #[case("CONSORTIUM-PFX-007-1_SM-1.anno.vcf.gz", Some("CONSORTIUM-PFX-007-1_SM-1"))]
    #[case("/data/.anno.vcf", None)]
    fn token_from_path(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(super::token_from_path(path).as_deref(), expected);
    }
}
