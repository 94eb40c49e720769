use lazy_static::lazy_static;
use regex::Regex;

use super::extraction::clean_text;

lazy_static! {
    /// Tried in order; the first pattern that matches owns the span.
    static ref INGREDIENT_PATTERNS: Vec<Regex> = vec![
        Regex::new(
            r"(?i)\bingredients?\s*:\s*(.+?)(?:\.\s|\.$|\bcontains\s*:|\ballergens?\b|\bnutrition\s+facts\b|$)"
        )
        .unwrap(),
        Regex::new(r"(?i)\bcontains\s*:\s*(.+?)(?:\.\s|\.$|$)").unwrap(),
        Regex::new(r"(?i)\bingredients\b[\s-]*(.+?)(?:;|\.\s|\.$|$)").unwrap(),
    ];
    static ref SERVING_PATTERNS: Vec<Regex> = {
        const END: &str =
            r"\s*(?:\bservings?\s+per\b|\bcalories\b|\bamount\b|\bnutrition\b|\btotal\b|\bper\s+container\b|[;|]|$)";
        vec![
            Regex::new(&format!(r"(?i)\bserving\s+size\s*:?\s*(.+?){END}")).unwrap(),
            Regex::new(&format!(r"(?i)\bserving\s*:\s*(.+?){END}")).unwrap(),
            Regex::new(&format!(r"(?i)\bper\s+serving\s*:\s*(.+?){END}")).unwrap(),
        ]
    };
}

fn first_span<'t>(patterns: &[Regex], text: &'t str) -> Option<&'t str> {
    patterns
        .iter()
        .find_map(|re| re.captures(text).and_then(|cap| cap.get(1)))
        .map(|m| m.as_str())
}

pub fn extract_ingredients(text: &str) -> Vec<String> {
    let text = clean_text(text);
    let Some(span) = first_span(&INGREDIENT_PATTERNS, &text) else {
        return Vec::new();
    };
    span.split([',', ';'])
        .map(|s| s.trim().trim_matches('.').trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Serving size is free text ("1 cup (240ml)") and is returned verbatim.
pub fn extract_serving_size(text: &str) -> String {
    let text = clean_text(text);
    first_span(&SERVING_PATTERNS, &text)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingredients_with_trailing_period() {
        assert_eq!(
            extract_ingredients("ingredients: Wheat Flour, Sugar, Salt."),
            vec!["Wheat Flour", "Sugar", "Salt"]
        );
    }

    #[test]
    fn ingredients_stop_at_allergen_statement() {
        let text = "INGREDIENTS: Oats; Honey,\nAlmonds (roasted). CONTAINS: Tree Nuts.";
        assert_eq!(
            extract_ingredients(text),
            vec!["Oats", "Honey", "Almonds (roasted)"]
        );
    }

    #[test]
    fn contains_is_a_fallback() {
        assert_eq!(extract_ingredients("Contains: Milk, Soy"), vec!["Milk", "Soy"]);
    }

    #[test]
    fn ingredients_without_colon() {
        assert_eq!(
            extract_ingredients("Ingredients water, sugar; citric acid"),
            vec!["water", "sugar"]
        );
    }

    #[test]
    fn empty_tokens_are_dropped() {
        assert_eq!(extract_ingredients("Ingredients: Rice,, ,Salt"), vec!["Rice", "Salt"]);
    }

    #[test]
    fn no_ingredients_section() {
        assert!(extract_ingredients("Calories 100").is_empty());
        assert!(extract_ingredients("").is_empty());
    }

    #[test]
    fn serving_size_is_verbatim() {
        let text = "Nutrition Facts\nServing Size 1 cup (240ml)\nServings Per Container 2\nCalories 250";
        assert_eq!(extract_serving_size(text), "1 cup (240ml)");
    }

    #[test]
    fn serving_size_with_colon_at_end() {
        assert_eq!(extract_serving_size("Serving size: 2/3 cup (55g)"), "2/3 cup (55g)");
    }

    #[test]
    fn per_serving_form() {
        assert_eq!(extract_serving_size("Per serving: 30g | Calories 120"), "30g");
    }

    #[test]
    fn servings_inside_the_span_are_kept() {
        assert_eq!(
            extract_serving_size("Serving Size 2 servings Calories 100"),
            "2 servings"
        );
        assert_eq!(
            extract_serving_size("Serving Size 3 pieces Serving Per Container 8"),
            "3 pieces"
        );
    }

    #[test]
    fn missing_serving_size() {
        assert_eq!(extract_serving_size("Protein 3g"), "");
    }
}
