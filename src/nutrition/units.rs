//! Numeric coercion for label values.
//!
//! Both helpers are total: anything that does not parse becomes `0.0`.

use lazy_static::lazy_static;
use regex::Regex;

const MG_PER_G: f64 = 1_000.0;
const MCG_PER_G: f64 = 1_000_000.0;
const G_PER_KG: f64 = 1_000.0;

lazy_static! {
    static ref UNIT_TOKEN: Regex =
        Regex::new(r"(?i)(?:^|[\d\s(])(mcg|µg|μg|mg|kg|g)\b").unwrap();
}

#[derive(Debug, Default, Clone, Copy)]
struct UnitTokens {
    g: bool,
    mg: bool,
    mcg: bool,
    kg: bool,
}

fn unit_tokens(raw: &str) -> UnitTokens {
    let mut tokens = UnitTokens::default();
    for cap in UNIT_TOKEN.captures_iter(raw) {
        match cap[1].to_lowercase().as_str() {
            "g" => tokens.g = true,
            "mg" => tokens.mg = true,
            "kg" => tokens.kg = true,
            _ => tokens.mcg = true,
        }
    }
    tokens
}

/// Keep digits and decimal points, parse what is left. Empty, unparseable
/// or non-finite input yields `0.0`.
pub fn safe_float(raw: &str) -> f64 {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    match digits.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Convert a value with an optional unit annotation to grams.
///
/// `mg` alone divides by 1000; when a `g` token is also present
/// (`"1.5g (1500mg)"`) the value is already grams. A conversion that
/// overflows yields `0.0`.
pub fn normalize_unit(raw: &str) -> f64 {
    let value = safe_float(raw);
    let tokens = unit_tokens(raw);

    let grams = if tokens.mcg {
        value / MCG_PER_G
    } else if tokens.kg {
        value * G_PER_KG
    } else if tokens.mg && !tokens.g {
        value / MG_PER_G
    } else {
        value
    };
    if grams.is_finite() {
        grams
    } else {
        0.0
    }
}
