//! Human-readable rendering of leaf values.
//!
//! Floats are shown with a magnitude-dependent number of decimals so that
//! roughly four to five significant digits survive whatever the scale.
//! Persisted files depend on this exact rule.

use itertools::Itertools;

use crate::domain::value::Value;

/// Decimal digits used to display `v`.
pub fn decimals_for(v: f64) -> usize {
    if v == 0.0 {
        return 4;
    }
    let magnitude = v.abs();
    let digits = if magnitude > 1.0 {
        (5.0 - (magnitude + 1e-4).log10().ceil()).max(0.0)
    } else {
        3.0 - magnitude.log10().floor()
    };
    digits as usize
}

pub fn render_float(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    format!("{:.*}", decimals_for(v), v)
}

/// Format a leaf for display. Integers and strings pass through unchanged;
/// tuples are rendered element by element.
pub fn render(value: &Value) -> String {
    match value {
        Value::Float(v) => render_float(*v),
        Value::Int(i) => i.to_string(),
        Value::Str(s) => s.clone(),
        Value::Tuple(items) => match items.len() {
            0 => ",".to_string(),
            1 => format!("{},", render(&items[0])),
            _ => items.iter().map(render).join(", "),
        },
    }
}
