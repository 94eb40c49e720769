use std::collections::BTreeMap;

use serde::Serialize;

/// Vitamins and minerals tracked by name. Values are kept exactly as they
/// appear on the label (`"2mcg"`, `"10%"`), never unit-normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Micronutrient {
    VitaminD,
    Calcium,
    Iron,
    Potassium,
    VitaminA,
    VitaminC,
    VitaminE,
    VitaminK,
    Thiamin,
    Riboflavin,
    Niacin,
    VitaminB6,
    Folate,
    VitaminB12,
    Biotin,
    PantothenicAcid,
    Phosphorus,
    Iodine,
    Magnesium,
    Zinc,
    Selenium,
    Copper,
    Manganese,
    Chromium,
    Molybdenum,
    Chloride,
    Choline,
}

impl Micronutrient {
    pub const ALL: [Micronutrient; 27] = [
        Micronutrient::VitaminD,
        Micronutrient::Calcium,
        Micronutrient::Iron,
        Micronutrient::Potassium,
        Micronutrient::VitaminA,
        Micronutrient::VitaminC,
        Micronutrient::VitaminE,
        Micronutrient::VitaminK,
        Micronutrient::Thiamin,
        Micronutrient::Riboflavin,
        Micronutrient::Niacin,
        Micronutrient::VitaminB6,
        Micronutrient::Folate,
        Micronutrient::VitaminB12,
        Micronutrient::Biotin,
        Micronutrient::PantothenicAcid,
        Micronutrient::Phosphorus,
        Micronutrient::Iodine,
        Micronutrient::Magnesium,
        Micronutrient::Zinc,
        Micronutrient::Selenium,
        Micronutrient::Copper,
        Micronutrient::Manganese,
        Micronutrient::Chromium,
        Micronutrient::Molybdenum,
        Micronutrient::Chloride,
        Micronutrient::Choline,
    ];

    /// Underscore-joined lowercase key used in JSON output.
    pub fn key(&self) -> &'static str {
        match self {
            Micronutrient::VitaminD => "vitamin_d",
            Micronutrient::Calcium => "calcium",
            Micronutrient::Iron => "iron",
            Micronutrient::Potassium => "potassium",
            Micronutrient::VitaminA => "vitamin_a",
            Micronutrient::VitaminC => "vitamin_c",
            Micronutrient::VitaminE => "vitamin_e",
            Micronutrient::VitaminK => "vitamin_k",
            Micronutrient::Thiamin => "thiamin",
            Micronutrient::Riboflavin => "riboflavin",
            Micronutrient::Niacin => "niacin",
            Micronutrient::VitaminB6 => "vitamin_b6",
            Micronutrient::Folate => "folate",
            Micronutrient::VitaminB12 => "vitamin_b12",
            Micronutrient::Biotin => "biotin",
            Micronutrient::PantothenicAcid => "pantothenic_acid",
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

    /// Lenient lookup for names coming from model output
    /// ("Vitamin D", "vitamin_d", "Pantothenic Acid").
    pub fn from_name(name: &str) -> Option<Self> {
        let key = name
            .trim()
            .to_lowercase()
            .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("_");
        Self::ALL.into_iter().find(|m| m.key() == key)
    }
}

/// Macro values pulled from text before any derivation. `None` means the
/// field never matched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialRecord {
    pub calories: Option<String>,
    pub fat: Option<String>,
    pub saturated_fat: Option<String>,
    pub trans_fat: Option<String>,
    pub cholesterol: Option<String>,
    pub sodium: Option<String>,
    pub carbs: Option<String>,
    pub fiber: Option<String>,
    pub sugar: Option<String>,
    pub protein: Option<String>,
    pub micronutrients: BTreeMap<Micronutrient, String>,
}

/// Macro fields only, the input of scoring and advisories.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Macros {
    pub calories: f64,
    pub fat: f64,
    pub saturated_fat: f64,
    pub trans_fat: f64,
    pub cholesterol: f64,
    pub sodium: f64,
    pub carbs: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub protein: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionRecord {
    pub calories: f64,
    pub fat: f64,
    pub saturated_fat: f64,
    pub trans_fat: f64,
    pub cholesterol: f64,
    pub sodium: f64,
    pub carbs: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub protein: f64,
    pub serving_size: String,
    pub ingredients: Vec<String>,
    pub health_score: f64,
    pub benefits: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(flatten)]
    pub micronutrients: BTreeMap<Micronutrient, String>,
}

impl NutritionRecord {
    /// Assemble a record from coerced macros; score and advisories are
    /// always derived here, never taken from the caller.
    pub fn assemble(
        macros: Macros,
        micronutrients: BTreeMap<Micronutrient, String>,
        ingredients: Vec<String>,
        serving_size: String,
    ) -> Self {
        let health_score = super::scoring::derive_score(&macros);
        let (warnings, benefits) = super::scoring::derive_advisories(&macros);

        let mut micros: BTreeMap<Micronutrient, String> = Micronutrient::ALL
            .into_iter()
            .map(|m| (m, String::new()))
            .collect();
        micros.extend(micronutrients);

        Self {
            calories: macros.calories,
            fat: macros.fat,
            saturated_fat: macros.saturated_fat,
            trans_fat: macros.trans_fat,
            cholesterol: macros.cholesterol,
            sodium: macros.sodium,
            carbs: macros.carbs,
            fiber: macros.fiber,
            sugar: macros.sugar,
            protein: macros.protein,
            serving_size,
            ingredients,
            health_score,
            benefits,
            warnings,
            micronutrients: micros,
        }
    }

    pub fn macros(&self) -> Macros {
        Macros {
            calories: self.calories,
            fat: self.fat,
            saturated_fat: self.saturated_fat,
            trans_fat: self.trans_fat,
            cholesterol: self.cholesterol,
            sodium: self.sodium,
            carbs: self.carbs,
            fiber: self.fiber,
            sugar: self.sugar,
            protein: self.protein,
        }
    }

    pub fn micronutrient(&self, m: Micronutrient) -> &str {
        self.micronutrients.get(&m).map(String::as_str).unwrap_or("")
    }
}
