//! Scalar casting primitives.
//!
//! Null passes through every kind; absence is the concern of the defaulting
//! and required passes, not the caster. Object and array kinds never reach
//! this module — the walk handles them structurally.

use crate::schema::TypeKind;
use serde_json::{Number, Value};

use super::error::FieldError;

/// Coerces `value` to the declared kind, or reports a cast failure.
pub fn cast_value(value: &Value, kind: &TypeKind) -> Result<Value, FieldError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match kind {
        TypeKind::Any => Ok(value.clone()),
        TypeKind::Number => cast_number(value),
        TypeKind::String => cast_string(value),
        TypeKind::Boolean => cast_boolean(value),
        TypeKind::Custom(cast_type) => {
            if cast_type.is_instance(value) {
                return Ok(value.clone());
            }
            cast_type
                .construct(value.clone())
                .map_err(|_| cast_failure(value, kind))
        }
        TypeKind::Object | TypeKind::Array => Ok(value.clone()),
    }
}

fn cast_number(value: &Value) -> Result<Value, FieldError> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::Bool(b) => Ok(Value::Number(Number::from(if *b { 1 } else { 0 }))),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Value::Number(Number::from(i)));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| cast_failure(value, &TypeKind::Number))
        }
        _ => Err(cast_failure(value, &TypeKind::Number)),
    }
}

fn cast_string(value: &Value) -> Result<Value, FieldError> {
    match value {
        Value::String(_) => Ok(value.clone()),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        _ => Err(cast_failure(value, &TypeKind::String)),
    }
}

fn cast_boolean(value: &Value) -> Result<Value, FieldError> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::String(s) => match s.as_str() {
            "1" | "true" | "yes" => Ok(Value::Bool(true)),
            "0" | "false" | "no" => Ok(Value::Bool(false)),
            _ => Err(cast_failure(value, &TypeKind::Boolean)),
        },
        Value::Number(n) => {
            if n.as_i64() == Some(1) || n.as_f64() == Some(1.0) {
                Ok(Value::Bool(true))
            } else if n.as_i64() == Some(0) || n.as_f64() == Some(0.0) {
                Ok(Value::Bool(false))
            } else {
                Err(cast_failure(value, &TypeKind::Boolean))
            }
        }
        _ => Err(cast_failure(value, &TypeKind::Boolean)),
    }
}

fn cast_failure(value: &Value, kind: &TypeKind) -> FieldError {
    FieldError::Cast {
        value: value.to_string(),
        target: kind.type_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CastType;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_number_from_string() {
        assert_eq!(cast_value(&json!("42"), &TypeKind::Number).unwrap(), json!(42));
        assert_eq!(
            cast_value(&json!("2.5"), &TypeKind::Number).unwrap(),
            json!(2.5)
        );
        assert!(cast_value(&json!("abc"), &TypeKind::Number).is_err());
    }

    #[test]
    fn test_number_from_bool() {
        assert_eq!(cast_value(&json!(true), &TypeKind::Number).unwrap(), json!(1));
        assert_eq!(cast_value(&json!(false), &TypeKind::Number).unwrap(), json!(0));
    }

    #[test]
    fn test_number_rejects_composites() {
        assert!(cast_value(&json!([1]), &TypeKind::Number).is_err());
        assert!(cast_value(&json!({"a": 1}), &TypeKind::Number).is_err());
    }

    #[test]
    fn test_string_from_scalars() {
        assert_eq!(
            cast_value(&json!(42), &TypeKind::String).unwrap(),
            json!("42")
        );
        assert_eq!(
            cast_value(&json!(true), &TypeKind::String).unwrap(),
            json!("true")
        );
        assert_eq!(
            cast_value(&json!("x"), &TypeKind::String).unwrap(),
            json!("x")
        );
    }

    #[test]
    fn test_string_rejects_objects() {
        assert!(cast_value(&json!({"a": 1}), &TypeKind::String).is_err());
    }

    #[test]
    fn test_boolean_truthy_falsy_forms() {
        for truthy in [json!("1"), json!("true"), json!("yes"), json!(1)] {
            assert_eq!(
                cast_value(&truthy, &TypeKind::Boolean).unwrap(),
                json!(true),
                "{} should cast to true",
                truthy
            );
        }
        for falsy in [json!("0"), json!("false"), json!("no"), json!(0)] {
            assert_eq!(
                cast_value(&falsy, &TypeKind::Boolean).unwrap(),
                json!(false),
                "{} should cast to false",
                falsy
            );
        }
        assert!(cast_value(&json!("maybe"), &TypeKind::Boolean).is_err());
        assert!(cast_value(&json!(2), &TypeKind::Boolean).is_err());
    }

    #[test]
    fn test_null_passes_through() {
        for kind in [TypeKind::Number, TypeKind::String, TypeKind::Boolean] {
            assert_eq!(cast_value(&Value::Null, &kind).unwrap(), Value::Null);
        }
    }

    #[test]
    fn test_any_passes_through() {
        let value = json!({"nested": [1, 2]});
        assert_eq!(cast_value(&value, &TypeKind::Any).unwrap(), value);
    }

    #[derive(Debug)]
    struct Upper;

    impl CastType for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn is_instance(&self, value: &Value) -> bool {
            value
                .as_str()
                .map(|s| s.chars().all(|c| !c.is_lowercase()))
                .unwrap_or(false)
        }

        fn construct(&self, value: Value) -> Result<Value, String> {
            value
                .as_str()
                .map(|s| Value::String(s.to_uppercase()))
                .ok_or_else(|| "not a string".to_string())
        }
    }

    #[test]
    fn test_custom_construct_or_passthrough() {
        let kind = TypeKind::Custom(Arc::new(Upper));
        // Already an instance: untouched.
        assert_eq!(cast_value(&json!("ABC"), &kind).unwrap(), json!("ABC"));
        // Constructed from the raw value.
        assert_eq!(cast_value(&json!("abc"), &kind).unwrap(), json!("ABC"));
        // Construction failure is a cast failure.
        let err = cast_value(&json!(5), &kind).unwrap_err();
        assert!(err.to_string().contains("upper"));
    }
}
