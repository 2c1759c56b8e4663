// ── Change detection ──
//
// Decides whether a freshly polled reading differs from the cached one.
// Comparison is structural (JSON equality), not by reference, and covers
// added, modified, and removed fields.

use serde_json::Value;

use crate::model::Reading;

/// `true` if `new` differs from `old`: a field was added, its value
/// changed, or a field present in `old` is missing from `new`.
pub fn has_changed(old: &Reading, new: &Reading) -> bool {
    new.iter()
        .any(|(field, value)| old.get(field).is_none_or(|prev| !json_eq(prev, value)))
        || old.keys().any(|field| !new.contains_key(field))
}

/// Structural JSON equality where `1` and `1.0` are the same number, as
/// they are once serialized by the database.
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x == y || matches!((x.as_f64(), y.as_f64()), (Some(p), Some(q)) if p == q)
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reading(value: Value) -> Reading {
        match value {
            Value::Object(map) => map,
            _ => Reading::new(),
        }
    }

    #[test]
    fn identical_readings_are_unchanged() {
        let a = reading(json!({"LEVEL": 42, "fecha": "01.01.25..08.00"}));
        let b = reading(json!({"fecha": "01.01.25..08.00", "LEVEL": 42}));
        assert!(!has_changed(&a, &b));
    }

    #[test]
    fn modified_field_is_a_change() {
        let a = reading(json!({"LEVEL": 42}));
        let b = reading(json!({"LEVEL": 43}));
        assert!(has_changed(&a, &b));
    }

    #[test]
    fn added_and_removed_fields_are_changes() {
        let a = reading(json!({"LEVEL": 42, "FLOW": 3}));
        let b = reading(json!({"LEVEL": 42, "PRESSURE": 1.5}));
        assert!(has_changed(&a, &b));

        let only_removed = reading(json!({"LEVEL": 42}));
        assert!(has_changed(&a, &only_removed));
    }

    #[test]
    fn nested_objects_compare_structurally() {
        let a = reading(json!({"PUMP": {"status": 1, "hours": [1, 2]}}));
        let b = reading(json!({"PUMP": {"hours": [1, 2], "status": 1}}));
        let c = reading(json!({"PUMP": {"hours": [1, 3], "status": 1}}));
        assert!(!has_changed(&a, &b));
        assert!(has_changed(&a, &c));
    }

    #[test]
    fn integral_floats_equal_integers() {
        assert!(json_eq(&json!(1), &json!(1.0)));
        assert!(!json_eq(&json!(1), &json!(1.5)));
        assert!(!json_eq(&json!(1), &json!("1")));
    }

    #[test]
    fn null_differs_from_missing() {
        let a = reading(json!({"value": null}));
        let b = reading(json!({}));
        assert!(has_changed(&a, &b));
        assert!(has_changed(&b, &a));
    }
}
