//! Parsing the harness `results.json`

use serde_json::Value;

/// Resolved and total counts from a harness results document
///
/// Accepts `resolved`/`total` or `resolved_instances`/`total_instances`.
/// `resolved` may be a count or a list of resolved ids. A missing resolved
/// count is 0; a missing total falls back to `submitted`.
pub fn parse_counts(data: &Value, submitted: u64) -> Result<(u64, u64), String> {
    let object = data
        .as_object()
        .ok_or_else(|| "results document is not a JSON object".to_string())?;

    let resolved = match object
        .get("resolved")
        .or_else(|| object.get("resolved_instances"))
    {
        None | Some(Value::Null) => 0,
        Some(Value::Array(ids)) => ids.len() as u64,
        Some(value) => value
            .as_u64()
            .ok_or_else(|| format!("'resolved' is not a count: {}", value))?,
    };

    let total = match object
        .get("total")
        .or_else(|| object.get("total_instances"))
    {
        None | Some(Value::Null) => submitted,
        Some(value) => value
            .as_u64()
            .ok_or_else(|| format!("'total' is not a count: {}", value))?,
    };

    Ok((resolved, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_counts() {
        assert_eq!(parse_counts(&json!({"resolved": 3, "total": 10}), 99), Ok((3, 10)));
    }

    #[test]
    fn test_instance_key_variants() {
        let data = json!({"resolved_instances": 2, "total_instances": 4, "error_instances": 1});
        assert_eq!(parse_counts(&data, 0), Ok((2, 4)));
    }

    #[test]
    fn test_resolved_id_list() {
        let data = json!({"resolved": ["a", "b"], "total": 5});
        assert_eq!(parse_counts(&data, 0), Ok((2, 5)));
    }

    #[test]
    fn test_missing_fields_fall_back() {
        assert_eq!(parse_counts(&json!({}), 7), Ok((0, 7)));
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(parse_counts(&json!([1, 2]), 0).is_err());
        assert!(parse_counts(&json!({"resolved": "three"}), 0).is_err());
        assert!(parse_counts(&json!({"resolved": 1, "total": -1}), 0).is_err());
    }
}
