//! HTML bodies for outgoing mail. Every interpolated value is escaped.

use serde_json::Value;

use super::services::{NutritionLogEntry, TimeOfDay};
use crate::telemetry::IotLogEntry;

const NA: &str = "N/A";

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn field(data: &Value, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => escape(s),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => NA.to_string(),
    }
}

fn list_items(data: &Value, key: &str) -> String {
    data.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| format!("<li>{}</li>", escape(s)))
                .collect()
        })
        .unwrap_or_default()
}

/// Single analysis result, as sent by `/send_email`.
pub fn nutrition_email(data: &Value) -> String {
    format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <h2 style="color: #2e7d32;">Nutrition Analysis Results</h2>
  <div style="background-color: #f5f5f5; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <h3 style="color: #1b5e20;">Health Score: {score}/10</h3>
    <h4>Main Nutrients:</h4>
    <ul>
      <li>Calories: {calories}</li>
      <li>Protein: {protein}g</li>
      <li>Carbohydrates: {carbs}g</li>
      <li>Fat: {fat}g</li>
      <li>Fiber: {fiber}g</li>
      <li>Sugar: {sugar}g</li>
      <li>Sodium: {sodium}mg</li>
    </ul>
    <h4>Serving Size:</h4>
    <p>{serving}</p>
    <h4>Health Benefits:</h4>
    <ul>{benefits}</ul>
    <h4>Warnings:</h4>
    <ul>{warnings}</ul>
  </div>
  <p style="color: #666; font-size: 0.9em;">This analysis was performed by Fresh Eye.</p>
</body>
</html>"#,
        score = field(data, "health_score"),
        calories = field(data, "calories"),
        protein = field(data, "protein"),
        carbs = field(data, "carbs"),
        fat = field(data, "fat"),
        fiber = field(data, "fiber"),
        sugar = field(data, "sugar"),
        sodium = field(data, "sodium"),
        serving = field(data, "serving_size"),
        benefits = list_items(data, "benefits"),
        warnings = list_items(data, "warnings"),
    )
}

fn summary(entry: &NutritionLogEntry) -> String {
    let r = &entry.record;
    let mut line = format!(
        "Calories {} | Protein {}g | Carbs {}g | Fat {}g | Sugar {}g | Sodium {}mg | Health score {}/10",
        r.calories, r.protein, r.carbs, r.fat, r.sugar, r.sodium, r.health_score
    );
    if !r.serving_size.is_empty() {
        line.push_str(&format!(" | Serving {}", escape(&r.serving_size)));
    }
    if !r.warnings.is_empty() {
        line.push_str(&format!(" | Warnings: {}", escape(&r.warnings.join(", "))));
    }
    line
}

pub fn daily_nutrition_report(entries: &[NutritionLogEntry]) -> String {
    let items: String = entries
        .iter()
        .map(|e| format!("<li>{}</li>", summary(e)))
        .collect();
    format!("<h2>Your Daily Nutrition Report</h2><ul>{items}</ul>")
}

pub fn iot_report(time_of_day: TimeOfDay, latest: &IotLogEntry) -> String {
    format!(
        "<h2>IoT Report ({time_of_day})</h2><p>Temperature: {}°C<br>Humidity: {}%</p>",
        latest.temperature, latest.humidity
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::*;
    use crate::nutrition::services::extract_full_nutrition;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<b>"Tom" & 'Jerry'</b>"#), "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;");
    }

    #[test]
    fn nutrition_email_fills_known_fields() {
        let html = nutrition_email(&json!({
            "health_score": 7.5,
            "calories": 230,
            "protein": 3,
            "serving_size": "2/3 cup <55g>",
            "benefits": ["Low in sugar"],
            "warnings": ["High in fat", 4]
        }));
        assert!(html.contains("Health Score: 7.5/10"));
        assert!(html.contains("<li>Calories: 230</li>"));
        assert!(html.contains("<li>Fiber: N/Ag</li>"));
        assert!(html.contains("2/3 cup &lt;55g&gt;"));
        assert!(html.contains("<li>Low in sugar</li>"));
        assert!(html.contains("<li>High in fat</li>"));
        assert!(!html.contains("<li>4</li>"));
    }

    #[test]
    fn daily_report_lists_every_entry() {
        let entries = vec![
            NutritionLogEntry {
                email: "a@x.io".into(),
                record: extract_full_nutrition("Calories 100 Sodium 2400mg"),
                timestamp: datetime!(2024-01-01 10:00 UTC),
            },
            NutritionLogEntry {
                email: "a@x.io".into(),
                record: extract_full_nutrition("Calories 50"),
                timestamp: datetime!(2024-01-01 12:00 UTC),
            },
        ];
        let html = daily_nutrition_report(&entries);
        assert_eq!(html.matches("<li>").count(), 2);
        assert!(html.contains("Calories 100"));
        assert!(html.contains("Warnings: High in sodium"));
    }

    #[test]
    fn iot_report_names_time_of_day() {
        let entry = IotLogEntry {
            email: "a@x.io".into(),
            temperature: 4.5,
            humidity: 70.0,
            timestamp: datetime!(2024-01-01 08:00 UTC),
        };
        let html = iot_report(TimeOfDay::Morning, &entry);
        assert_eq!(
            html,
            "<h2>IoT Report (Morning)</h2><p>Temperature: 4.5°C<br>Humidity: 70%</p>"
        );
    }
}
