//! Health score and advisories.
//!
//! Thresholds follow common recommended daily values. Consumers compare
//! scores numerically, so the constants must stay exactly as they are.

use super::record::Macros;

const BASELINE: f64 = 10.0;
const MIN_SCORE: f64 = 0.0;
const MAX_SCORE: f64 = 10.0;

pub const HIGH_SODIUM: &str = "High in sodium";
pub const HIGH_SUGAR: &str = "High in sugar";
pub const HIGH_FAT: &str = "High in fat";
pub const HIGH_CALORIES: &str = "High in calories";
pub const HIGH_PROTEIN: &str = "High in protein";
pub const HIGH_FIBER: &str = "High in fiber";
pub const LOW_SUGAR: &str = "Low in sugar";
pub const LOW_SODIUM: &str = "Low in sodium";

fn penalty(value: f64, threshold: f64, step: f64) -> f64 {
    if value > threshold {
        (value - threshold) / step
    } else {
        0.0
    }
}

fn bonus(value: f64, full_at: f64) -> f64 {
    (value / full_at).min(1.0)
}

pub fn derive_score(m: &Macros) -> f64 {
    let mut score = BASELINE;
    score -= penalty(m.calories, 2000.0, 500.0);
    score += bonus(m.protein, 50.0);
    score -= penalty(m.carbs, 300.0, 100.0);
    score -= penalty(m.fat, 70.0, 35.0);
    score += bonus(m.fiber, 25.0);
    score -= penalty(m.sugar, 50.0, 25.0);
    score -= penalty(m.sodium, 2300.0, 1150.0);

    if score.is_nan() {
        return BASELINE;
    }
    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// Returns `(warnings, benefits)` in their fixed emission order.
///
/// The "low in" benefits need a measured amount: a nutrient that was never
/// found reads as `0.0` and says nothing about the food.
pub fn derive_advisories(m: &Macros) -> (Vec<String>, Vec<String>) {
    let mut warnings = Vec::new();
    if m.sodium > 2300.0 {
        warnings.push(HIGH_SODIUM.to_string());
    }
    if m.sugar > 50.0 {
        warnings.push(HIGH_SUGAR.to_string());
    }
    if m.fat > 70.0 {
        warnings.push(HIGH_FAT.to_string());
    }
    if m.calories > 2000.0 {
        warnings.push(HIGH_CALORIES.to_string());
    }

    let mut benefits = Vec::new();
    if m.protein > 20.0 {
        benefits.push(HIGH_PROTEIN.to_string());
    }
    if m.fiber > 10.0 {
        benefits.push(HIGH_FIBER.to_string());
    }
    if m.sugar > 0.0 && m.sugar < 10.0 {
        benefits.push(LOW_SUGAR.to_string());
    }
    if m.sodium > 0.0 && m.sodium < 500.0 {
        benefits.push(LOW_SODIUM.to_string());
    }

    (warnings, benefits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_macros_score_baseline() {
        assert_eq!(derive_score(&Macros::default()), 10.0);
        let (w, b) = derive_advisories(&Macros::default());
        assert!(w.is_empty());
        assert!(b.is_empty());
    }

    #[test]
    fn penalties_follow_formula() {
        let m = Macros {
            calories: 2500.0,
            fat: 80.0,
            sugar: 60.0,
            sodium: 3000.0,
            ..Macros::default()
        };
        let expected = 10.0 - 500.0 / 500.0 - 10.0 / 35.0 - 10.0 / 25.0 - 700.0 / 1150.0;
        assert!(close(derive_score(&m), expected));
    }

    #[test]
    fn carbs_penalty() {
        let m = Macros {
            carbs: 450.0,
            ..Macros::default()
        };
        assert!(close(derive_score(&m), 8.5));
    }

    #[test]
    fn bonuses_cap_at_one_and_score_is_clamped() {
        let m = Macros {
            protein: 500.0,
            fiber: 100.0,
            ..Macros::default()
        };
        assert_eq!(derive_score(&m), 10.0);
    }

    #[test]
    fn partial_bonus_offsets_penalty() {
        let m = Macros {
            protein: 25.0,
            fiber: 12.5,
            sugar: 75.0,
            ..Macros::default()
        };
        // 10 + 0.5 + 0.5 - 1.0
        assert!(close(derive_score(&m), 10.0));
    }

    #[test]
    fn score_never_goes_negative() {
        let m = Macros {
            calories: 50_000.0,
            sodium: 100_000.0,
            ..Macros::default()
        };
        assert_eq!(derive_score(&m), 0.0);
    }

    #[test]
    fn warnings_in_fixed_order() {
        let m = Macros {
            calories: 2500.0,
            fat: 80.0,
            sugar: 60.0,
            sodium: 3000.0,
            ..Macros::default()
        };
        let (w, b) = derive_advisories(&m);
        assert_eq!(w, vec![HIGH_SODIUM, HIGH_SUGAR, HIGH_FAT, HIGH_CALORIES]);
        assert!(b.is_empty());
    }

    #[test]
    fn benefits_in_fixed_order() {
        let m = Macros {
            protein: 25.0,
            fiber: 11.0,
            sugar: 4.0,
            sodium: 120.0,
            ..Macros::default()
        };
        let (w, b) = derive_advisories(&m);
        assert!(w.is_empty());
        assert_eq!(b, vec![HIGH_PROTEIN, HIGH_FIBER, LOW_SUGAR, LOW_SODIUM]);
    }

    #[test]
    fn thresholds_are_strict() {
        let m = Macros {
            sodium: 2300.0,
            sugar: 50.0,
            fat: 70.0,
            calories: 2000.0,
            protein: 20.0,
            fiber: 10.0,
            ..Macros::default()
        };
        let (w, b) = derive_advisories(&m);
        assert!(w.is_empty());
        assert!(b.is_empty());
    }
}
