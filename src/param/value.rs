// src/param/value.rs

use serde_json::Value as JsonValue;

/// Semantic type of a parameter, driving parsing and normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Str,
    Int,
    Float,
    Bool,
    /// Enumerated string value restricted to a fixed set of choices.
    Choice { choices: Vec<String> },
    /// Arbitrary structured value carried as JSON.
    Json,
}

impl ParamKind {
    /// Parse a serialized string value under this kind.
    ///
    /// This is the inverse of [`ParamValue::serialize`]; a value that was
    /// serialized under a kind must parse back to an equal value.
    pub fn parse(&self, raw: &str) -> Result<ParamValue, String> {
        match self {
            ParamKind::Str => Ok(ParamValue::Str(raw.to_string())),
            ParamKind::Int => raw
                .trim()
                .parse::<i64>()
                .map(ParamValue::Int)
                .map_err(|e| format!("expected an integer, got '{raw}': {e}")),
            ParamKind::Float => raw
                .trim()
                .parse::<f64>()
                .map(ParamValue::Float)
                .map_err(|e| format!("expected a float, got '{raw}': {e}")),
            ParamKind::Bool => match raw.trim().to_lowercase().as_str() {
                "true" => Ok(ParamValue::Bool(true)),
                "false" => Ok(ParamValue::Bool(false)),
                other => Err(format!("expected 'true' or 'false', got '{other}'")),
            },
            ParamKind::Choice { choices } => {
                if choices.iter().any(|c| c == raw) {
                    Ok(ParamValue::Str(raw.to_string()))
                } else {
                    Err(format!(
                        "'{raw}' is not a valid choice (expected one of {choices:?})"
                    ))
                }
            }
            ParamKind::Json => serde_json::from_str::<JsonValue>(raw)
                .map(ParamValue::Json)
                .map_err(|e| format!("invalid JSON '{raw}': {e}")),
        }
    }

    /// Normalize a resolved value toward this kind.
    ///
    /// Only lossless coercions are applied (a string that parses as the
    /// target kind, an integer widened to a float). Normalizing an already
    /// normalized value is a no-op.
    pub fn normalize(&self, value: ParamValue) -> ParamValue {
        match (self, value) {
            (ParamKind::Int, ParamValue::Str(s)) => match s.trim().parse::<i64>() {
                Ok(i) => ParamValue::Int(i),
                Err(_) => ParamValue::Str(s),
            },
            (ParamKind::Float, ParamValue::Int(i)) => ParamValue::Float(i as f64),
            (ParamKind::Float, ParamValue::Str(s)) => match s.trim().parse::<f64>() {
                Ok(f) => ParamValue::Float(f),
                Err(_) => ParamValue::Str(s),
            },
            (ParamKind::Bool, ParamValue::Str(s)) => match s.trim().to_lowercase().as_str() {
                "true" => ParamValue::Bool(true),
                "false" => ParamValue::Bool(false),
                _ => ParamValue::Str(s),
            },
            (_, value) => value,
        }
    }

    /// Whether a (normalized) value inhabits this kind. Used only for the
    /// non-fatal construction warning.
    pub fn accepts(&self, value: &ParamValue) -> bool {
        match (self, value) {
            (ParamKind::Str, ParamValue::Str(_)) => true,
            (ParamKind::Int, ParamValue::Int(_)) => true,
            (ParamKind::Float, ParamValue::Float(_)) => true,
            (ParamKind::Bool, ParamValue::Bool(_)) => true,
            (ParamKind::Choice { choices }, ParamValue::Str(s)) => {
                choices.iter().any(|c| c == s)
            }
            (ParamKind::Json, ParamValue::Json(_)) => true,
            (ParamKind::Json, ParamValue::List(_)) => true,
            _ => false,
        }
    }
}

/// A resolved parameter value.
///
/// Values are immutable once attached to a task instance. Collection values
/// are kept as ordered lists so instances stay hashable and deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<ParamValue>),
    Json(JsonValue),
}

impl ParamValue {
    /// Stable string form used for task ids and cross-process exchange.
    pub fn serialize(&self) -> String {
        match self {
            ParamValue::Str(s) => s.clone(),
            ParamValue::Int(i) => i.to_string(),
            ParamValue::Float(f) => f.to_string(),
            ParamValue::Bool(b) => b.to_string(),
            ParamValue::List(_) | ParamValue::Json(_) => self.to_json().to_string(),
        }
    }

    fn to_json(&self) -> JsonValue {
        match self {
            ParamValue::Str(s) => JsonValue::String(s.clone()),
            ParamValue::Int(i) => JsonValue::from(*i),
            ParamValue::Float(f) => {
                serde_json::Number::from_f64(*f).map(JsonValue::Number).unwrap_or(JsonValue::Null)
            }
            ParamValue::Bool(b) => JsonValue::Bool(*b),
            ParamValue::List(items) => {
                JsonValue::Array(items.iter().map(ParamValue::to_json).collect())
            }
            ParamValue::Json(v) => v.clone(),
        }
    }

    /// Short name of the value's own shape, for warning messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ParamValue::Str(_) => "str",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Bool(_) => "bool",
            ParamValue::List(_) => "list",
            ParamValue::Json(_) => "json",
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        ParamValue::Int(i as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(f: f64) -> Self {
        ParamValue::Float(f)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<JsonValue> for ParamValue {
    fn from(v: JsonValue) -> Self {
        ParamValue::Json(v)
    }
}

impl<V: Into<ParamValue>> From<Vec<V>> for ParamValue {
    fn from(values: Vec<V>) -> Self {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_round_trips_through_serialize_and_parse() {
        let v = ParamValue::Int(42);
        assert_eq!(ParamKind::Int.parse(&v.serialize()).unwrap(), v);
    }

    #[test]
    fn bool_round_trips() {
        let v = ParamValue::Bool(true);
        assert_eq!(v.serialize(), "true");
        assert_eq!(ParamKind::Bool.parse("true").unwrap(), v);
    }

    #[test]
    fn choice_rejects_unknown_value() {
        let kind = ParamKind::Choice {
            choices: vec!["red".into(), "blue".into()],
        };
        assert!(kind.parse("red").is_ok());
        assert!(kind.parse("green").is_err());
    }

    #[test]
    fn normalize_is_idempotent() {
        let kind = ParamKind::Int;
        let once = kind.normalize(ParamValue::Str("7".into()));
        let twice = kind.normalize(once.clone());
        assert_eq!(once, ParamValue::Int(7));
        assert_eq!(once, twice);
    }

    #[test]
    fn list_serializes_as_compact_json() {
        let v = ParamValue::List(vec![ParamValue::Int(1), ParamValue::Str("a".into())]);
        assert_eq!(v.serialize(), "[1,\"a\"]");
    }

    #[test]
    fn float_widens_from_int() {
        assert_eq!(
            ParamKind::Float.normalize(ParamValue::Int(3)),
            ParamValue::Float(3.0)
        );
    }
}
