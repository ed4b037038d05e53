//! Request-shape checkers that need nothing beyond the request itself.
//!
//! Every checker reports all violations it finds in a single [`Rejection`].

use serde_json::Value;

use super::context::{Pass, RequestContext};
use super::outcome::{Rejection, ValidationBuilder};
use super::spec::{runtime_type, TypeTag};

/// Every dotted path must resolve to a value that is not null and not `""`
pub fn check_required(paths: &[String], ctx: &RequestContext) -> Result<Pass, Rejection> {
    let mut builder = ValidationBuilder::new();

    for path in paths {
        let present = match ctx.body_path(path) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        if !present {
            builder.add_error(path.as_str(), "is required");
        }
    }

    builder.build(|errors| {
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        format!("Missing required fields: {}", fields.join(", "))
    })?;
    Ok(Pass::Proceed)
}

/// Fields present in the body must have the expected type; absent fields are skipped
pub fn check_types(types: &[(String, TypeTag)], ctx: &RequestContext) -> Result<Pass, Rejection> {
    let mut builder = ValidationBuilder::new();

    for (field, expected) in types {
        let Some(value) = ctx.body_field(field) else {
            continue;
        };
        builder.check(field, || type_matches(field, *expected, value));
    }

    builder.build_joined("; ")?;
    Ok(Pass::Proceed)
}

fn type_matches(field: &str, expected: TypeTag, value: &Value) -> Result<(), String> {
    match expected {
        TypeTag::Array => {
            if value.is_array() {
                Ok(())
            } else {
                Err(format!("{} must be an array", field))
            }
        }
        TypeTag::Integer => {
            if is_integral(value) {
                Ok(())
            } else {
                Err(format!("{} must be an integer", field))
            }
        }
        TypeTag::String | TypeTag::Number | TypeTag::Boolean | TypeTag::Object => {
            let actual = runtime_type(value);
            if actual == expected.as_str() {
                Ok(())
            } else {
                Err(format!("{} must be a {}, got {}", field, expected, actual))
            }
        }
    }
}

/// A JSON number with no fractional part (`3` and `3.0` both qualify)
fn is_integral(value: &Value) -> bool {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => true,
        Value::Number(n) => n.as_f64().map_or(false, |f| f.is_finite() && f.fract() == 0.0),
        _ => false,
    }
}

/// The field, looked up in the body and then the query string, must be one of `allowed`.
///
/// A field missing from both places passes.
pub fn check_enum(field: &str, allowed: &[String], ctx: &RequestContext) -> Result<Pass, Rejection> {
    let candidate = match ctx.body_field(field) {
        Some(Value::Null) | None => ctx.query_param(field).map(|q| Value::String(q.to_string())),
        Some(value) => Some(value.clone()),
    };

    let Some(candidate) = candidate else {
        return Ok(Pass::Proceed);
    };

    let is_member = match &candidate {
        Value::String(s) => allowed.iter().any(|a| a == s),
        _ => false,
    };

    if is_member {
        Ok(Pass::Proceed)
    } else {
        Err(Rejection::validation(format!(
            "{} must be one of: {}",
            field,
            allowed.join(", ")
        )))
    }
}

/// Named path parameters, when present, must be positive integers
pub fn check_numeric_params(params: &[String], ctx: &RequestContext) -> Result<Pass, Rejection> {
    let mut builder = ValidationBuilder::new();

    for name in params {
        let Some(raw) = ctx.param(name) else {
            continue;
        };
        if !is_positive_integer(raw) {
            builder.add_error(name.as_str(), format!("{} must be a positive integer", name));
        }
    }

    builder.build_joined("; ")?;
    Ok(Pass::Proceed)
}

/// ASCII digits only, numerically greater than zero. Leading zeros are fine.
pub fn is_positive_integer(raw: &str) -> bool {
    !raw.is_empty()
        && raw.bytes().all(|b| b.is_ascii_digit())
        && raw.bytes().any(|b| b != b'0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::RejectionKind;
    use serde_json::json;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_required_reports_every_missing_field() {
        let ctx = RequestContext::new(json!({ "clientId": 1, "title": "", "notes": null }));
        let err = check_required(&paths(&["clientId", "contactId", "title", "notes"]), &ctx)
            .unwrap_err();

        assert_eq!(err.kind, RejectionKind::Validation);
        assert_eq!(err.message, "Missing required fields: contactId, title, notes");
        assert_eq!(err.errors.len(), 3);
    }

    #[test]
    fn test_required_nested_path() {
        let ctx = RequestContext::new(json!({ "timeEntry": {} }));
        let err = check_required(&paths(&["timeEntry.duration"]), &ctx).unwrap_err();
        assert!(err.message.contains("timeEntry.duration"));

        let ok = RequestContext::new(json!({ "timeEntry": { "duration": "1h" } }));
        assert_eq!(check_required(&paths(&["timeEntry.duration"]), &ok), Ok(Pass::Proceed));
    }

    #[test]
    fn test_required_accepts_falsy_but_present_values() {
        let ctx = RequestContext::new(json!({ "billable": false, "minutes": 0, "tags": [] }));
        assert!(check_required(&paths(&["billable", "minutes", "tags"]), &ctx).is_ok());
    }

    #[test]
    fn test_types_skip_absent_fields() {
        let ctx = RequestContext::new(json!({}));
        let types = vec![
            ("clientId".to_string(), TypeTag::Integer),
            ("tags".to_string(), TypeTag::Array),
        ];
        assert!(check_types(&types, &ctx).is_ok());
    }

    #[test]
    fn test_types_name_expected_and_actual() {
        let ctx = RequestContext::new(json!({ "clientId": "1" }));
        let types = vec![("clientId".to_string(), TypeTag::Number)];
        let err = check_types(&types, &ctx).unwrap_err();
        assert_eq!(err.message, "clientId must be a number, got string");
    }

    #[test]
    fn test_types_fixed_wording_for_array_and_integer() {
        let ctx = RequestContext::new(json!({ "clientId": 1.5, "tags": "a,b" }));
        let types = vec![
            ("clientId".to_string(), TypeTag::Integer),
            ("tags".to_string(), TypeTag::Array),
        ];
        let err = check_types(&types, &ctx).unwrap_err();
        assert_eq!(err.message, "clientId must be an integer; tags must be an array");
    }

    #[test]
    fn test_types_integer_accepts_whole_floats() {
        let ctx = RequestContext::new(json!({ "a": 3, "b": 3.0, "c": -2 }));
        let types = vec![
            ("a".to_string(), TypeTag::Integer),
            ("b".to_string(), TypeTag::Integer),
            ("c".to_string(), TypeTag::Integer),
        ];
        assert!(check_types(&types, &ctx).is_ok());
    }

    #[test]
    fn test_types_object_rejects_array_and_null() {
        let ctx = RequestContext::new(json!({ "a": [], "b": null }));
        let types = vec![
            ("a".to_string(), TypeTag::Object),
            ("b".to_string(), TypeTag::Object),
        ];
        let err = check_types(&types, &ctx).unwrap_err();
        assert_eq!(
            err.message,
            "a must be a object, got array; b must be a object, got null"
        );
    }

    #[test]
    fn test_enum_absent_passes() {
        let allowed = paths(&["open", "closed"]);
        assert!(check_enum("state", &allowed, &RequestContext::default()).is_ok());
    }

    #[test]
    fn test_enum_falls_back_to_query() {
        let allowed = paths(&["open", "closed"]);
        let ctx = RequestContext::default().with_query_param("state", "pending");
        let err = check_enum("state", &allowed, &ctx).unwrap_err();
        assert_eq!(err.message, "state must be one of: open, closed");

        let ok = RequestContext::default().with_query_param("state", "closed");
        assert!(check_enum("state", &allowed, &ok).is_ok());
    }

    #[test]
    fn test_enum_body_wins_over_query() {
        let allowed = paths(&["open", "closed"]);
        let ctx = RequestContext::new(json!({ "state": "open" })).with_query_param("state", "bogus");
        assert!(check_enum("state", &allowed, &ctx).is_ok());
    }

    #[test]
    fn test_enum_is_case_sensitive_and_string_only() {
        let allowed = paths(&["open", "closed"]);
        let upper = RequestContext::new(json!({ "state": "Open" }));
        assert!(check_enum("state", &allowed, &upper).is_err());

        let numeric = RequestContext::new(json!({ "state": 1 }));
        assert!(check_enum("state", &allowed, &numeric).is_err());
    }

    #[test]
    fn test_positive_integer_strings() {
        assert!(is_positive_integer("123"));
        assert!(is_positive_integer("007"));
        for bad in ["0", "000", "-5", "1.5", "abc", "", "+5", " 1"] {
            assert!(!is_positive_integer(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_numeric_params_aggregate() {
        let ctx = RequestContext::default()
            .with_param("id", "-5")
            .with_param("entryId", "abc")
            .with_param("page", "2");
        let err = check_numeric_params(&paths(&["id", "entryId", "page", "absent"]), &ctx)
            .unwrap_err();
        assert_eq!(
            err.message,
            "id must be a positive integer; entryId must be a positive integer"
        );
    }

    #[test]
    fn test_checkers_are_idempotent() {
        let ctx = RequestContext::new(json!({ "clientId": 1 }));
        let required = paths(&["clientId", "contactId"]);
        assert_eq!(check_required(&required, &ctx), check_required(&required, &ctx));
    }
}
