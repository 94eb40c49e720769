//! Pattern extraction over OCR'd label text.
//!
//! Every field gets its own scan over the whole cleaned text and the first
//! hit wins. Nothing here fails: a missing field is simply `None`.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::record::{Micronutrient, PartialRecord};

/// Known OCR misreads, replaced literally before any matching.
const OCR_CORRECTIONS: &[(&str, &str)] = &[
    ("Dietarv Fiber", "Dietary Fiber"),
    ("Dietary Fibcr", "Dietary Fiber"),
    ("Dietary Fber", "Dietary Fiber"),
    ("Dietary Flber", "Dietary Fiber"),
    ("DietaryFiber", "Dietary Fiber"),
    ("Total Fal", "Total Fat"),
    ("Saturated Fal", "Saturated Fat"),
    ("Sodlum", "Sodium"),
    ("Cholesteroi", "Cholesterol"),
    ("Calorles", "Calories"),
    ("Protcin", "Protein"),
    ("Total Carbohydrale", "Total Carbohydrate"),
];

/// Integer, decimal, or thousands-grouped number.
const NUM: &str = r"(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)";

/// One macro field: label synonyms, the unit that must follow the digits,
/// and qualifier words that mean the hit belongs to a more specific field.
struct MacroPattern {
    regex: Regex,
    excluded_qualifiers: &'static [&'static str],
}

impl MacroPattern {
    fn new(labels: &str, unit: &str, excluded_qualifiers: &'static [&'static str]) -> Self {
        let pattern = format!(
            r"(?i)(?:\b([a-z]+)[\s.]+)?\b(?:{labels})\b[:\s</]*{NUM}{unit}\b"
        );
        Self {
            regex: Regex::new(&pattern).unwrap(),
            excluded_qualifiers,
        }
    }

    fn find(&self, text: &str) -> Option<String> {
        self.regex.captures_iter(text).find_map(|cap| {
            let qualifier = cap.get(1).map(|m| m.as_str().to_lowercase());
            match qualifier {
                Some(q) if self.excluded_qualifiers.contains(&q.as_str()) => None,
                _ => cap.get(2).map(|m| m.as_str().to_string()),
            }
        })
    }
}

const FAT_QUALIFIERS: &[&str] = &[
    "saturated",
    "sat",
    "trans",
    "unsaturated",
    "polyunsaturated",
    "monounsaturated",
];

struct MacroPatterns {
    calories: MacroPattern,
    fat: MacroPattern,
    saturated_fat: MacroPattern,
    trans_fat: MacroPattern,
    cholesterol: MacroPattern,
    sodium: MacroPattern,
    carbs: MacroPattern,
    fiber: MacroPattern,
    sugar: MacroPattern,
    protein: MacroPattern,
}

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref MACROS: MacroPatterns = MacroPatterns {
        // A leading kilojoule figure ("Energy 1046kJ / 250kcal") is skipped.
        calories: MacroPattern::new(
            r"calories|energy(?:[:\s]*\d[\d,]*(?:\.\d+)?\s*kj)?",
            r"(?:\s*k?cal)?",
            &[],
        ),
        fat: MacroPattern::new("fat", "g", FAT_QUALIFIERS),
        saturated_fat: MacroPattern::new(r"saturated\s+fat|sat\.?\s*fat", "g", &[]),
        trans_fat: MacroPattern::new(r"trans\s+fat", "g", &[]),
        cholesterol: MacroPattern::new("cholesterol", "mg", &[]),
        sodium: MacroPattern::new("sodium", "mg", &[]),
        carbs: MacroPattern::new(
            r"total\s+carbohydrates?|carbohydrates?|total\s+carbs?|carbs?",
            "g",
            &[],
        ),
        fiber: MacroPattern::new(
            r"dietary\s+fib(?:er|re)|fib(?:er|re)",
            "g",
            &["soluble", "insoluble"],
        ),
        sugar: MacroPattern::new(r"total\s+sugars?|sugars?", "g", &["added"]),
        protein: MacroPattern::new("protein", "g", &[]),
    };
    static ref MICROS: Vec<(Micronutrient, Regex)> = Micronutrient::ALL
        .into_iter()
        .map(|m| {
            let pattern = format!(
                r"(?i)\b(?:{})\b[:\s]*{NUM}\s*(mcg|µg|μg|mg|%)",
                micronutrient_labels(m)
            );
            (m, Regex::new(&pattern).unwrap())
        })
        .collect();
}

fn micronutrient_labels(m: Micronutrient) -> &'static str {
    match m {
        Micronutrient::VitaminD => r"vitamin\s*d\d?",
        Micronutrient::Calcium => "calcium",
        Micronutrient::Iron => "iron",
        Micronutrient::Potassium => "potassium",
        Micronutrient::VitaminA => r"vitamin\s*a",
        Micronutrient::VitaminC => r"vitamin\s*c",
        Micronutrient::VitaminE => r"vitamin\s*e",
        Micronutrient::VitaminK => r"vitamin\s*k\d?",
        Micronutrient::Thiamin => r"thiamine?|vitamin\s*b1",
        Micronutrient::Riboflavin => r"riboflavin|vitamin\s*b2",
        Micronutrient::Niacin => r"niacin|vitamin\s*b3",
        Micronutrient::VitaminB6 => r"vitamin\s*b6|pyridoxine",
        Micronutrient::Folate => r"folate|folic\s+acid",
        Micronutrient::VitaminB12 => r"vitamin\s*b12|cobalamin",
        Micronutrient::Biotin => "biotin",
        Micronutrient::PantothenicAcid => r"pantothenic\s+acid",
        Micronutrient::Phosphorus => "phosphorus",
        Micronutrient::Iodine => "iodine",
        Micronutrient::Magnesium => "magnesium",
        Micronutrient::Zinc => "zinc",
        Micronutrient::Selenium => "selenium",
        Micronutrient::Copper => "copper",
        Micronutrient::Manganese => "manganese",
        Micronutrient::Chromium => "chromium",
        Micronutrient::Molybdenum => "molybdenum",
        Micronutrient::Chloride => "chloride",
        Micronutrient::Choline => "choline",
    }
}

/// Apply the OCR correction table and collapse whitespace. Labels break
/// names and values across lines, so newlines become plain spaces.
pub fn clean_text(text: &str) -> String {
    let mut corrected = text.to_string();
    for (from, to) in OCR_CORRECTIONS {
        if corrected.contains(from) {
            corrected = corrected.replace(from, to);
        }
    }
    WHITESPACE.replace_all(&corrected, " ").trim().to_string()
}

pub fn extract_raw(text: &str) -> PartialRecord {
    let text = clean_text(text);
    let m = &*MACROS;

    let micronutrients: BTreeMap<Micronutrient, String> = MICROS
        .iter()
        .filter_map(|(nutrient, re)| {
            re.captures(&text)
                .map(|cap| (*nutrient, format!("{}{}", &cap[1], &cap[2])))
        })
        .collect();

    PartialRecord {
        calories: m.calories.find(&text),
        fat: m.fat.find(&text),
        saturated_fat: m.saturated_fat.find(&text),
        trans_fat: m.trans_fat.find(&text),
        cholesterol: m.cholesterol.find(&text),
        sodium: m.sodium.find(&text),
        carbs: m.carbs.find(&text),
        fiber: m.fiber.find(&text),
        sugar: m.sugar.find(&text),
        protein: m.protein.find(&text),
        micronutrients,
    }
}
