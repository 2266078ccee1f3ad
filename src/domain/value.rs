//! Leaf values of the data tree.

use std::fmt;

use itertools::Itertools;

/// Terminal value held by a leaf.
///
/// Tuples hold scalars only; nesting a tuple inside a tuple is rejected by
/// [`Value::tuple`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f64),
    Int(i64),
    Str(String),
    Tuple(Vec<Value>),
}

impl Value {
    /// Build a tuple value, returning `None` if an element is itself a tuple.
    pub fn tuple(items: Vec<Value>) -> Option<Self> {
        if items.iter().any(|v| matches!(v, Value::Tuple(_))) {
            None
        } else {
            Some(Value::Tuple(items))
        }
    }

    pub fn floats(items: &[f64]) -> Self {
        Value::Tuple(items.iter().copied().map(Value::Float).collect())
    }

    /// Short kind name used in schema error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Float(_) => "float",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Tuple(_) => "tuple",
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Parse a raw text token: integer, float, comma separated tuple, else string.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Some(s) = unquote(text) {
            return Value::Str(s.to_string());
        }
        if text.contains(',') {
            let items = text
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Value::parse_scalar)
                .collect();
            return Value::Tuple(items);
        }
        Value::parse_scalar(text)
    }

    fn parse_scalar(text: &str) -> Self {
        if let Some(s) = unquote(text) {
            return Value::Str(s.to_string());
        }
        if let Ok(i) = text.parse::<i64>() {
            return Value::Int(i);
        }
        match text.parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => Value::Str(text.to_string()),
        }
    }
}

/// Contents of a `"..."` or `'...'` token that does not contain its own quote.
fn unquote(text: &str) -> Option<&str> {
    ['"', '\''].into_iter().find_map(|q| {
        text.strip_prefix(q)
            .and_then(|s| s.strip_suffix(q))
            .filter(|inner| !inner.contains(q))
    })
}

/// Raw, round-trippable text form.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Debug formatting keeps the shortest repr that parses back exactly
            // and always shows a fractional part for whole numbers
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{}", s),
            Value::Tuple(items) => match items.len() {
                // a trailing comma keeps short tuples distinguishable from scalars
                0 => write!(f, ","),
                1 => write!(f, "{},", items[0]),
                _ => write!(f, "{}", items.iter().join(", ")),
            },
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("42", Value::Int(42))]
    #[case("-7", Value::Int(-7))]
    #[case("0.78", Value::Float(0.78))]
    #[case("1e-4", Value::Float(1e-4))]
    #[case("turbofan", Value::Str("turbofan".into()))]
    #[case("\"150\"", Value::Str("150".into()))]
    fn given_scalar_token_when_parsing_then_infers_kind(#[case] text: &str, #[case] expected: Value) {
        assert_eq!(Value::parse(text), expected);
    }

    #[test]
    fn given_comma_separated_token_when_parsing_then_builds_tuple() {
        let v = Value::parse("1.0, 0.9, 2");
        assert_eq!(
            v,
            Value::Tuple(vec![Value::Float(1.0), Value::Float(0.9), Value::Int(2)])
        );
    }

    #[test]
    fn given_whole_float_when_displaying_then_keeps_fraction() {
        assert_eq!(Value::Float(140000.0).to_string(), "140000.0");
        assert_eq!(Value::parse(&Value::Float(0.1).to_string()), Value::Float(0.1));
    }

    #[test]
    fn given_nested_tuple_when_building_then_rejected() {
        let inner = Value::floats(&[1.0]);
        assert!(Value::tuple(vec![inner]).is_none());
        assert!(Value::tuple(vec![Value::Int(1), Value::Str("a".into())]).is_some());
    }
}
