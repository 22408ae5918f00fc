// src/utils/numeric.rs
//
// Number handling for spreadsheet cells and stored series fields.

use serde_json::{Number, Value};

/// Parses a spreadsheet cell into a number, stripping thousands separators.
/// Blank cells, placeholders and unparsable text yield `None`.
pub fn parse_numeric_cell(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        _ => None,
    }
}

/// Converts a cell to the JSON value stored for a numeric column: a number or `null`.
/// Whole numbers are stored as integers so repeated syncs produce identical documents.
pub fn numeric_cell_value(raw: &str) -> Value {
    match parse_numeric_cell(raw) {
        Some(n) => number_value(n),
        None => Value::Null,
    }
}

pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Reads a stored field as a number. Numbers pass through, numeric strings are
/// parsed, everything else (null, blank, text, arrays) is `None`.
pub fn value_as_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric_cell(s),
        _ => None,
    }
}

/// Sums the named fields of a document, counting absent or non-numeric fields as zero.
pub fn sum_fields(doc: Option<&serde_json::Map<String, Value>>, fields: &[String]) -> f64 {
    let Some(doc) = doc else {
        return 0.0;
    };
    fields
        .iter()
        .filter_map(|field| value_as_f64(doc.get(field)))
        .sum()
}

/// Extracts the trailing four-digit year of a field such as `volumes2023`.
pub fn trailing_year(field: &str, prefix: &str) -> Option<i32> {
    let rest = field.strip_prefix(prefix)?;
    if rest.len() == 4 && rest.chars().all(|c| c.is_ascii_digit()) {
        rest.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_numeric_cell() {
        assert_eq!(parse_numeric_cell("1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_numeric_cell(" 12.5 "), Some(12.5));
        assert_eq!(parse_numeric_cell(""), None);
        assert_eq!(parse_numeric_cell("n/a"), None);
        assert_eq!(parse_numeric_cell("-"), None);
        assert_eq!(parse_numeric_cell("NaN"), None);
    }

    #[test]
    fn test_numeric_cell_value_is_stable() {
        assert_eq!(numeric_cell_value("1,000"), json!(1000));
        assert_eq!(numeric_cell_value("1,000"), numeric_cell_value("1000"));
        assert_eq!(numeric_cell_value("0.25"), json!(0.25));
        assert_eq!(numeric_cell_value(""), Value::Null);
    }

    #[test]
    fn test_sum_fields_never_fails_on_junk() {
        let doc = json!({
            "values2022": "",
            "values2023": null,
            "values2024": "not a number",
            "values2025": 10,
            "values2026": "2,5",
            "values2027": [1, 2],
        });
        let fields: Vec<String> = (2022..=2028).map(|y| format!("values{}", y)).collect();
        // "2,5" strips to "25"
        assert_eq!(sum_fields(doc.as_object(), &fields), 35.0);
        assert_eq!(sum_fields(None, &fields), 0.0);
    }

    #[test]
    fn test_trailing_year() {
        assert_eq!(trailing_year("volumes2023", "volumes"), Some(2023));
        assert_eq!(trailing_year("volumesTotal", "volumes"), None);
        assert_eq!(trailing_year("values2023", "volumes"), None);
        assert_eq!(trailing_year("values20231", "values"), None);
    }
}
