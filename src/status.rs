//! Module implementing the parameter dictionary surface.
//!
//! Model parameters are exposed and ingested through a JSON object so a host
//! can read and write them without knowing the concrete model type. Updates
//! are partial: absent keys leave the current value untouched, wrong-typed
//! values are rejected.

use serde_json::Value;

use super::error::SNNError;

/// A parameter dictionary: named values exchanged with the host.
pub type StatusDict = serde_json::Map<String, Value>;

/// Update `target` from `d[key]` if present. Returns an error if the value is
/// present but not representable as a float.
pub fn update_f64(d: &StatusDict, key: &str, target: &mut f64) -> Result<(), SNNError> {
    match d.get(key) {
        None => Ok(()),
        Some(v) => match v.as_f64() {
            Some(x) => {
                *target = x;
                Ok(())
            }
            None => Err(SNNError::InvalidParameter(format!(
                "{} must be a number",
                key
            ))),
        },
    }
}

/// Update `target` from `d[key]` if present. Returns an error if the value is
/// present but not a non-negative integer.
pub fn update_usize(d: &StatusDict, key: &str, target: &mut usize) -> Result<(), SNNError> {
    match d.get(key) {
        None => Ok(()),
        Some(v) => match v.as_u64() {
            Some(x) => {
                *target = x as usize;
                Ok(())
            }
            None => Err(SNNError::InvalidParameter(format!(
                "{} must be a non-negative integer",
                key
            ))),
        },
    }
}

/// Update `target` from `d[key]` if present. Returns an error if the value is
/// present but not a boolean.
pub fn update_bool(d: &StatusDict, key: &str, target: &mut bool) -> Result<(), SNNError> {
    match d.get(key) {
        None => Ok(()),
        Some(v) => match v.as_bool() {
            Some(x) => {
                *target = x;
                Ok(())
            }
            None => Err(SNNError::InvalidParameter(format!(
                "{} must be a boolean",
                key
            ))),
        },
    }
}

/// Update `target` from `d[key]` if present. Returns an error if the value is
/// present but not an array of numbers.
pub fn update_f64_vec(d: &StatusDict, key: &str, target: &mut Vec<f64>) -> Result<(), SNNError> {
    match d.get(key) {
        None => Ok(()),
        Some(Value::Array(values)) => {
            let mut parsed = Vec::with_capacity(values.len());
            for v in values {
                match v.as_f64() {
                    Some(x) => parsed.push(x),
                    None => {
                        return Err(SNNError::InvalidParameter(format!(
                            "{} must be an array of numbers",
                            key
                        )))
                    }
                }
            }
            *target = parsed;
            Ok(())
        }
        Some(_) => Err(SNNError::InvalidParameter(format!(
            "{} must be an array of numbers",
            key
        ))),
    }
}

pub fn insert_f64(d: &mut StatusDict, key: &str, value: f64) {
    d.insert(key.to_string(), Value::from(value));
}

pub fn insert_usize(d: &mut StatusDict, key: &str, value: usize) {
    d.insert(key.to_string(), Value::from(value as u64));
}

pub fn insert_bool(d: &mut StatusDict, key: &str, value: bool) {
    d.insert(key.to_string(), Value::from(value));
}

pub fn insert_f64_vec(d: &mut StatusDict, key: &str, values: &[f64]) {
    d.insert(key.to_string(), Value::from(values.to_vec()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dict(value: Value) -> StatusDict {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_update_f64() {
        let d = dict(json!({"tau_m": 15.5, "bad": "x"}));
        let mut tau = 30.0;
        update_f64(&d, "tau_m", &mut tau).unwrap();
        assert_eq!(tau, 15.5);

        let mut untouched = 1.0;
        update_f64(&d, "absent", &mut untouched).unwrap();
        assert_eq!(untouched, 1.0);

        assert_eq!(
            update_f64(&d, "bad", &mut untouched),
            Err(SNNError::InvalidParameter("bad must be a number".to_string()))
        );
        assert_eq!(untouched, 1.0);
    }

    #[test]
    fn test_update_usize_rejects_negative() {
        let d = dict(json!({"n": -3}));
        let mut n = 2;
        assert!(update_usize(&d, "n", &mut n).is_err());
        assert_eq!(n, 2);
    }

    #[test]
    fn test_update_f64_vec() {
        let d = dict(json!({"tau_syn": [2.0, 4, 8.0]}));
        let mut taus = vec![1.0];
        update_f64_vec(&d, "tau_syn", &mut taus).unwrap();
        assert_eq!(taus, vec![2.0, 4.0, 8.0]);

        let d = dict(json!({"tau_syn": [2.0, "x"]}));
        assert!(update_f64_vec(&d, "tau_syn", &mut taus).is_err());
    }

    #[test]
    fn test_insert_round_trip() {
        let mut d = StatusDict::new();
        insert_f64(&mut d, "w", 0.25);
        insert_usize(&mut d, "n", 4);
        insert_bool(&mut d, "emit", true);
        let mut w = 0.0;
        let mut n = 0;
        let mut emit = false;
        update_f64(&d, "w", &mut w).unwrap();
        update_usize(&d, "n", &mut n).unwrap();
        update_bool(&d, "emit", &mut emit).unwrap();
        assert_eq!((w, n, emit), (0.25, 4, true));
    }
}
