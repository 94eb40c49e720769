use std::collections::BTreeMap;

use serde_json::Value;

use super::{
    extraction::extract_raw,
    labels::{extract_ingredients, extract_serving_size},
    record::{Macros, Micronutrient, NutritionRecord},
    units::{normalize_unit, safe_float},
};

fn coerce(raw: Option<&str>) -> f64 {
    raw.map(safe_float).unwrap_or(0.0)
}

/// Full pipeline over OCR text. Never fails: the worst case is an all-zero
/// record with a baseline score and no advisories.
pub fn extract_full_nutrition(text: &str) -> NutritionRecord {
    let raw = extract_raw(text);
    let macros = Macros {
        calories: coerce(raw.calories.as_deref()),
        fat: coerce(raw.fat.as_deref()),
        saturated_fat: coerce(raw.saturated_fat.as_deref()),
        trans_fat: coerce(raw.trans_fat.as_deref()),
        cholesterol: coerce(raw.cholesterol.as_deref()),
        sodium: coerce(raw.sodium.as_deref()),
        carbs: coerce(raw.carbs.as_deref()),
        fiber: coerce(raw.fiber.as_deref()),
        sugar: coerce(raw.sugar.as_deref()),
        protein: coerce(raw.protein.as_deref()),
    };

    NutritionRecord::assemble(
        macros,
        raw.micronutrients,
        extract_ingredients(text),
        extract_serving_size(text),
    )
}

/// Gram fields may arrive as `"1500mg"`; those go through unit
/// normalization.
fn grams(v: Option<&Value>) -> f64 {
    match v {
        Some(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0),
        Some(Value::String(s)) => normalize_unit(s),
        _ => 0.0,
    }
}

/// Calories and milligram fields are taken as plain numbers.
fn plain(v: Option<&Value>) -> f64 {
    match v {
        Some(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0),
        Some(Value::String(s)) => safe_float(s),
        _ => 0.0,
    }
}

fn non_negative(v: f64) -> f64 {
    v.max(0.0)
}

fn text_of(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn ingredients_of(v: Option<&Value>) -> Vec<String> {
    let items: Vec<String> = match v {
        Some(Value::Array(items)) => items.iter().filter_map(text_of).collect(),
        Some(Value::String(s)) => s.split([',', ';']).map(|t| t.trim().to_string()).collect(),
        _ => Vec::new(),
    };
    items.into_iter().filter(|s| !s.is_empty()).collect()
}

/// `additional_nutrients: { "Vitamin D": { "value": 2, "unit": "mcg" } }`
/// or flat `"vitamin_d": "2mcg"` keys.
fn micronutrients_of(obj: &serde_json::Map<String, Value>) -> BTreeMap<Micronutrient, String> {
    let mut out = BTreeMap::new();

    for m in Micronutrient::ALL {
        if let Some(s) = obj.get(m.key()).and_then(text_of).filter(|s| !s.is_empty()) {
            out.insert(m, s);
        }
    }

    if let Some(Value::Object(extra)) = obj.get("additional_nutrients") {
        for (name, entry) in extra {
            let Some(m) = Micronutrient::from_name(name) else {
                continue;
            };
            let value = match entry {
                Value::Object(e) => {
                    let amount = e.get("value").and_then(text_of).unwrap_or_default();
                    let unit = e.get("unit").and_then(text_of).unwrap_or_default();
                    format!("{amount}{unit}")
                }
                other => text_of(other).unwrap_or_default(),
            };
            if !value.is_empty() {
                out.entry(m).or_insert(value);
            }
        }
    }
    out
}

/// Turn a model's JSON answer into a record. Only measured inputs are
/// trusted; score and advisories are recomputed.
pub fn record_from_json(value: &Value) -> Option<NutritionRecord> {
    let obj = value.as_object()?;
    let field = |k: &str| obj.get(k);

    let macros = Macros {
        calories: non_negative(plain(field("calories"))),
        fat: non_negative(grams(field("fat"))),
        saturated_fat: non_negative(grams(field("saturated_fat"))),
        trans_fat: non_negative(grams(field("trans_fat"))),
        cholesterol: non_negative(plain(field("cholesterol"))),
        sodium: non_negative(plain(field("sodium"))),
        carbs: non_negative(grams(field("carbs"))),
        fiber: non_negative(grams(field("fiber"))),
        sugar: non_negative(grams(field("sugar"))),
        protein: non_negative(grams(field("protein"))),
    };
    let serving_size = field("serving_size").and_then(text_of).unwrap_or_default();

    Some(NutritionRecord::assemble(
        macros,
        micronutrients_of(obj),
        ingredients_of(field("ingredients")),
        serving_size,
    ))
}
