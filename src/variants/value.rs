//! Rendering of `INFO` and `FORMAT` values to text.
//!
//! Annotation values are carried through as text; a missing value (`.`)
//! renders as the empty string.

use noodles_vcf as vcf;

use vcf::variant::record_buf::{
    info::field::{value::Array as InfoArray, Value as InfoValue},
    samples::sample::value::{Array as SampleArray, Value as SampleValue},
};

fn render_all<T: ToString>(values: &[Option<T>]) -> Vec<String> {
    values
        .iter()
        .map(|value| {
            value
                .as_ref()
                .map(|value| value.to_string())
                .unwrap_or_default()
        })
        .collect()
}

/// Render an `INFO` value, arrays yield one entry per element.
pub fn render_info(value: Option<&InfoValue>) -> Vec<String> {
    match value {
        None | Some(InfoValue::Flag) => vec![String::new()],
        Some(InfoValue::Integer(value)) => vec![value.to_string()],
        Some(InfoValue::Float(value)) => vec![value.to_string()],
        Some(InfoValue::Character(value)) => vec![value.to_string()],
        Some(InfoValue::String(value)) => vec![value.clone()],
        Some(InfoValue::Array(InfoArray::Integer(values))) => render_all(values),
        Some(InfoValue::Array(InfoArray::Float(values))) => render_all(values),
        Some(InfoValue::Array(InfoArray::Character(values))) => render_all(values),
        Some(InfoValue::Array(InfoArray::String(values))) => render_all(values),
    }
}

/// Render a `FORMAT` value, arrays yield one entry per element.
pub fn render_sample(value: Option<&SampleValue>) -> Vec<String> {
    match value {
        None => vec![String::new()],
        Some(SampleValue::Integer(value)) => vec![value.to_string()],
        Some(SampleValue::Float(value)) => vec![value.to_string()],
        Some(SampleValue::Character(value)) => vec![value.to_string()],
        Some(SampleValue::String(value)) => vec![value.clone()],
        Some(SampleValue::Array(SampleArray::Integer(values))) => render_all(values),
        Some(SampleValue::Array(SampleArray::Float(values))) => render_all(values),
        Some(SampleValue::Array(SampleArray::Character(values))) => render_all(values),
        Some(SampleValue::Array(SampleArray::String(values))) => render_all(values),
        Some(other) => vec![format!("{:?}", other)],
    }
}

/// Values of `INFO/{key}`, `None` if the key is absent from the record.
pub fn info_values(record: &vcf::variant::RecordBuf, key: &str) -> Option<Vec<String>> {
    record.info().get(key).map(render_info)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn render_info_scalars() {
        assert_eq!(render_info(None), vec![""]);
        assert_eq!(render_info(Some(&InfoValue::Flag)), vec![""]);
        assert_eq!(render_info(Some(&InfoValue::Integer(9589))), vec!["9589"]);
        assert_eq!(render_info(Some(&InfoValue::Float(0.25))), vec!["0.25"]);
        assert_eq!(
            render_info(Some(&InfoValue::String("MELAS".into()))),
            vec!["MELAS"]
        );
    }

    #[test]
    fn render_info_arrays() {
        assert_eq!(
            render_info(Some(&InfoValue::Array(InfoArray::String(vec![
                Some("criteria_provided".into()),
                None,
                Some("_single_submitter".into()),
            ])))),
            vec!["criteria_provided", "", "_single_submitter"]
        );
        assert_eq!(
            render_info(Some(&InfoValue::Array(InfoArray::Float(vec![
                Some(0.5),
                Some(0.125)
            ])))),
            vec!["0.5", "0.125"]
        );
    }

    #[test]
    fn render_sample_values() {
        assert_eq!(render_sample(Some(&SampleValue::Integer(2011))), vec!["2011"]);
        assert_eq!(
            render_sample(Some(&SampleValue::Array(SampleArray::Float(vec![
                Some(0.452),
                Some(0.01)
            ])))),
            vec!["0.452", "0.01"]
        );
    }
}
