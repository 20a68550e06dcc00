//! Recursive-descent parser for result documents.
//!
//! Simple versus full is decided by one probe: whether the document root has
//! a `name` property. The same parser serves every operation; only the
//! simple-shape decoder differs.

use crate::error::{Error, Result};
use crate::types::{
    FullPayload, FullResult, GetResult, OperationKind, OperationResult, ResultDocument, SetResult,
    SimpleShape, TestResult,
};
use serde::Deserialize;
use serde_json::Value;

/// Property whose presence at the root marks a full result.
pub const FULL_RESULT_PROBE: &str = "name";

#[derive(Deserialize)]
struct RawFullResult {
    #[serde(default)]
    metadata: Option<Value>,
    name: String,
    #[serde(rename = "type")]
    resource_type: String,
    result: Value,
}

/// Parse provider output for an operation.
///
/// The output is one JSON document, possibly spread over several lines. If
/// it does not parse as a whole, its last non-empty line is the document.
pub fn parse_result(output: &str, operation: OperationKind) -> Result<OperationResult> {
    Ok(match operation {
        OperationKind::Get => OperationResult::Get(parse_get(output)?),
        OperationKind::Set => OperationResult::Set(parse_set(output)?),
        OperationKind::Test => OperationResult::Test(parse_test(output)?),
    })
}

/// Parse the output of a get.
pub fn parse_get(output: &str) -> Result<GetResult> {
    parse_document(output)
}

/// Parse the output of a set.
pub fn parse_set(output: &str) -> Result<SetResult> {
    parse_document(output)
}

/// Parse the output of a test.
pub fn parse_test(output: &str) -> Result<TestResult> {
    parse_document(output)
}

/// Parse provider output into a document of the given simple shape.
pub fn parse_document<S: SimpleShape>(output: &str) -> Result<ResultDocument<S>> {
    parse_value(decode_output(output)?)
}

/// Decode provider stdout into a JSON value.
///
/// Tries the whole trimmed output, then its last non-empty line.
pub fn decode_output(output: &str) -> Result<Value> {
    let whole = output.trim();
    if whole.is_empty() {
        return Err(Error::malformed("provider produced no output", ""));
    }

    let whole_error = match serde_json::from_str(whole) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    match whole.lines().map(str::trim).rfind(|line| !line.is_empty()) {
        Some(line) if line != whole => {
            serde_json::from_str(line).map_err(|e| Error::malformed(e.to_string(), line))
        }
        _ => Err(Error::malformed(whole_error.to_string(), whole)),
    }
}

/// Parse an already decoded JSON value.
pub fn parse_value<S: SimpleShape>(value: Value) -> Result<ResultDocument<S>> {
    let Value::Object(root) = &value else {
        return Err(Error::malformed("document root is not an object", value.to_string()));
    };

    if root.contains_key(FULL_RESULT_PROBE) {
        parse_full(value).map(ResultDocument::Full)
    } else {
        decode_simple(value).map(ResultDocument::Simple)
    }
}

fn parse_full<S: SimpleShape>(value: Value) -> Result<FullResult<S>> {
    let fragment = value.to_string();
    let raw: RawFullResult = serde_json::from_value(value)
        .map_err(|e| Error::malformed(format!("invalid {} full result: {e}", S::OPERATION), &fragment))?;

    let result = match raw.result {
        Value::Object(leaf) => FullPayload::Leaf(decode_simple(Value::Object(leaf))?),
        Value::Array(members) => {
            if members.is_empty() && S::OPERATION == OperationKind::Test {
                return Err(Error::malformed(
                    format!("group '{}' has no members to test", raw.name),
                    &fragment,
                ));
            }
            let members = members
                .into_iter()
                .map(parse_full::<S>)
                .collect::<Result<Vec<_>>>()?;
            FullPayload::Group(members)
        }
        other => {
            return Err(Error::malformed(
                format!("`result` of '{}' is neither an object nor an array", raw.name),
                other.to_string(),
            ));
        }
    };

    Ok(FullResult {
        metadata: raw.metadata,
        name: raw.name,
        resource_type: raw.resource_type,
        result,
    })
}

fn decode_simple<S: SimpleShape>(value: Value) -> Result<S> {
    let fragment = value.to_string();
    serde_json::from_value(value)
        .map_err(|e| Error::malformed(format!("invalid {} result: {e}", S::OPERATION), fragment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_test(name: &str, result: Value) -> Value {
        json!({
            "metadata": {"Microsoft.DSC": {"duration": "PT0.1S"}},
            "name": name,
            "type": "Test/Echo",
            "result": result,
        })
    }

    fn test_leaf(ok: bool) -> Value {
        json!({
            "desiredState": {"v": 1},
            "actualState": {"v": if ok { 1 } else { 2 }},
            "inDesiredState": ok,
            "differingProperties": if ok { json!([]) } else { json!(["v"]) },
        })
    }

    #[test]
    fn test_simple_set_document() {
        let doc = parse_set(r#"{"beforeState":{"x":1},"afterState":{"x":2},"changedProperties":["x"]}"#)
            .unwrap();
        assert!(!doc.is_full());
        assert_eq!(doc.changed_properties().unwrap(), ["x".to_string()]);
        assert_eq!(doc.before_state().unwrap(), &json!({"x": 1}));
        assert_eq!(doc.after_state().unwrap(), &json!({"x": 2}));
    }

    #[test]
    fn test_simple_test_matches_field() {
        for ok in [true, false] {
            let doc = parse_test(&test_leaf(ok).to_string()).unwrap();
            assert_eq!(doc.in_desired_state(), ok);
        }
    }

    #[test]
    fn test_empty_differing_properties_is_valid() {
        let doc = parse_test(
            r#"{"desiredState":{},"actualState":{},"inDesiredState":true,"differingProperties":[]}"#,
        )
        .unwrap();
        assert!(doc.in_desired_state());
        assert!(doc.differing_properties().is_empty());
    }

    #[test]
    fn test_full_test_is_and_over_leaves() {
        let cases: [&[bool]; 4] = [&[true], &[true, true], &[true, false], &[false, false, true]];
        for leaves in cases {
            let members: Vec<Value> = leaves
                .iter()
                .enumerate()
                .map(|(i, ok)| full_test(&format!("m{i}"), test_leaf(*ok)))
                .collect();
            let doc = parse_test(&full_test("group", Value::Array(members)).to_string()).unwrap();
            assert_eq!(doc.leaves().len(), leaves.len());
            assert_eq!(doc.in_desired_state(), leaves.iter().all(|ok| *ok));
        }
    }

    #[test]
    fn test_nested_groups() {
        let inner = full_test("inner", json!([full_test("leaf", test_leaf(false))]));
        let outer = full_test("outer", json!([full_test("first", test_leaf(true)), inner]));
        let doc = parse_test(&outer.to_string()).unwrap();
        assert_eq!(doc.leaves().len(), 2);
        assert!(!doc.in_desired_state());
        assert_eq!(doc.differing_properties(), vec!["v"]);
    }

    #[test]
    fn test_empty_test_group_fails() {
        let err = parse_test(&full_test("group", json!([])).to_string()).unwrap_err();
        assert!(err.is_malformed());

        let nested = full_test("outer", json!([full_test("inner", json!([]))]));
        assert!(parse_test(&nested.to_string()).unwrap_err().is_malformed());
    }

    #[test]
    fn test_empty_get_group_parses() {
        let doc = parse_get(&full_test("group", json!([])).to_string()).unwrap();
        assert!(doc.leaves().is_empty());
        assert!(matches!(
            doc.actual_state().unwrap_err(),
            Error::UnsupportedGroupAggregation { .. }
        ));
    }

    #[test]
    fn test_full_round_trip_recovers_leaf() {
        let get_leaf = json!({"actualState": {"path": "/tmp", "exists": true}});
        let doc = parse_get(&full_test("one", get_leaf).to_string()).unwrap();
        assert_eq!(
            doc.actual_state().unwrap(),
            &json!({"path": "/tmp", "exists": true})
        );
        assert_eq!(doc.resource_type(), Some("Test/Echo"));

        let set_leaf = json!({"beforeState": {"n": 1}, "afterState": {"n": 5}, "changedProperties": ["n"]});
        let doc = parse_set(&full_test("one", set_leaf).to_string()).unwrap();
        assert_eq!(doc.after_state().unwrap(), &json!({"n": 5}));

        let doc = parse_test(&full_test("one", test_leaf(false)).to_string()).unwrap();
        let leaf = doc.single().unwrap();
        assert_eq!(leaf.desired_state, json!({"v": 1}));
        assert_eq!(leaf.actual_state, json!({"v": 2}));
        assert_eq!(leaf.differing_properties, vec!["v".to_string()]);
    }

    #[test]
    fn test_metadata_is_optional() {
        let doc = parse_get(r#"{"name":"n","type":"T/R","result":{"actualState":{}}}"#).unwrap();
        match doc {
            ResultDocument::Full(full) => assert!(full.metadata.is_none()),
            ResultDocument::Simple(_) => panic!("expected full result"),
        }
    }

    #[test]
    fn test_missing_required_fields() {
        // Simple without actualState.
        assert!(parse_get(r#"{"state":{}}"#).unwrap_err().is_malformed());
        // Full without type.
        assert!(parse_get(r#"{"name":"n","result":{"actualState":{}}}"#)
            .unwrap_err()
            .is_malformed());
        // Test without inDesiredState.
        assert!(
            parse_test(r#"{"desiredState":{},"actualState":{},"differingProperties":[]}"#)
                .unwrap_err()
                .is_malformed()
        );
    }

    #[test]
    fn test_result_neither_object_nor_array() {
        let err = parse_get(r#"{"name":"n","type":"T/R","result":"oops"}"#).unwrap_err();
        match err {
            Error::Malformed { fragment, .. } => assert_eq!(fragment, "\"oops\""),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_group_member_must_be_full() {
        let doc = full_test("g", json!([{"actualState": {}}]));
        assert!(parse_get(&doc.to_string()).unwrap_err().is_malformed());
    }

    #[test]
    fn test_last_line_is_the_document() {
        let output = "\nwarning: something\n{\"actualState\":{\"a\":1}}\n\n";
        let doc = parse_get(output).unwrap();
        assert_eq!(doc.actual_state().unwrap(), &json!({"a": 1}));
    }

    #[test]
    fn test_pretty_printed_document() {
        let output = r#"{
  "beforeState": {"x": 1},
  "afterState": {"x": 2},
  "changedProperties": ["x"]
}
"#;
        let doc = parse_set(output).unwrap();
        assert_eq!(doc.changed_properties().unwrap(), ["x"]);
        assert_eq!(doc.after_state().unwrap(), &json!({"x": 2}));
    }

    #[test]
    fn test_pretty_printed_full_document() {
        let output = serde_json::to_string_pretty(&full_test("echo", test_leaf(true))).unwrap();
        assert!(output.lines().count() > 1);
        assert!(parse_test(&output).unwrap().in_desired_state());
    }

    #[test]
    fn test_empty_and_non_object_output() {
        assert!(parse_get("").unwrap_err().is_malformed());
        assert!(parse_get("  \n ").unwrap_err().is_malformed());
        assert!(parse_get("[1,2]").unwrap_err().is_malformed());
        assert!(parse_get("not json").unwrap_err().is_malformed());
    }

    #[test]
    fn test_parse_result_dispatch() {
        let result = parse_result(r#"{"actualState":{}}"#, OperationKind::Get).unwrap();
        assert_eq!(result.kind(), OperationKind::Get);
        assert!(parse_result(r#"{"actualState":{}}"#, OperationKind::Set).is_err());
    }
}
