//! Metric value display parsing
//!
//! Turns a raw [`MetricValue`] and its label into the text shown on a summary card:
//! a display label, a main value, and an optional trend percentage.
//!
//! The backend is loose about what it puts in a metric value. Plain numbers and
//! strings are common, but a string may carry a trailing trend such as
//! `"1234 (+8.4%)"`, an order-status breakdown may arrive either as an object or as a
//! JSON-encoded string, and percentages occasionally come with doubled signs
//! (`"+-83.1%"`). [`parse_metric_value`] applies the rules in a fixed order:
//!
//! 1. Breakdown object under the "incomplete orders breakdown" label → pending count
//! 2. Any other object → key count (`"3 keys"`)
//! 3. String holding a JSON object → rules 1-2 on the parsed object
//! 4. Trailing `(<sign><pct>%)` → split off with sign normalization
//! 5. Anything else → the plain string

use crate::models::{KeyMetric, MetricValue};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::debug;

/// Display label used in place of the incomplete orders breakdown label
pub const PENDING_ORDERS_LABEL: &str = "Pending Orders";

/// Metric labels whose values depend on the selected time range
pub const TIME_FILTERED_METRICS: &[&str] = &[
    "Total Revenue",
    "Total Profit",
    "Total Sales (qty)",
    "Total Transactions",
    "Expiring in 30 days",
    "Expired Items",
    "Top seller",
    "Avg Sale Value (per unit)",
    "Most Ordered Product",
    "Turnover Rate",
];

/// Parsed display form of a single metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricDisplay {
    #[serde(rename = "displayLabel")]
    pub display_label: String,
    pub main: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<String>,
}

/// Everything a summary card needs to render one metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricCard {
    #[serde(flatten)]
    pub display: MetricDisplay,
    #[serde(rename = "timeFiltered")]
    pub time_filtered: bool,
    #[serde(rename = "trendUp")]
    pub trend_up: bool,
}

impl MetricCard {
    pub fn from_metric(metric: &KeyMetric) -> Self {
        let display = parse_metric_value(&metric.label, &metric.value);
        let time_filtered = is_time_filtered(&display.display_label);
        Self {
            display,
            time_filtered,
            trend_up: metric.trend_up,
        }
    }
}

/// Build cards for a list of metrics, preserving order
pub fn metric_cards(metrics: &[KeyMetric]) -> Vec<MetricCard> {
    metrics.iter().map(MetricCard::from_metric).collect()
}

fn incomplete_orders_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)incomplete\s*orders\s*breakdown").expect("incomplete orders pattern is valid")
    })
}

fn trailing_percent_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.*?)(?:\s*\(([+\-]*[0-9]+(?:\.[0-9]+)?%)\)\s*)$")
            .expect("trailing percent pattern is valid")
    })
}

/// True when the label names the incomplete orders breakdown metric
pub fn is_incomplete_orders_label(label: &str) -> bool {
    incomplete_orders_pattern().is_match(label)
}

/// True when the label contains one of [`TIME_FILTERED_METRICS`] (case-insensitive)
pub fn is_time_filtered(label: &str) -> bool {
    let label = label.to_lowercase();
    TIME_FILTERED_METRICS
        .iter()
        .any(|metric| label.contains(&metric.to_lowercase()))
}

/// Collapse doubled leading signs: `+-`/`-+` → `-`, then `++` → `+`, then `--` → `-`
pub fn normalize_sign(percent: &str) -> String {
    let mut s = percent.trim().to_string();
    if s.starts_with("+-") || s.starts_with("-+") {
        s = format!("-{}", &s[2..]);
    }
    if s.starts_with("++") {
        s = format!("+{}", &s[2..]);
    }
    if s.starts_with("--") {
        s = format!("-{}", &s[2..]);
    }
    s
}

/// Numeric `pending` field of a breakdown; missing, non-numeric or non-finite → 0
pub fn extract_pending(breakdown: &Map<String, Value>) -> f64 {
    let n = match breakdown.get("pending") {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(_) => f64::NAN,
    };

    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Render a number the way the dashboard prints it (`4.0` → `"4"`).
///
/// Magnitudes of at least 1e21 or below 1e-6 switch to exponent form with an
/// explicit exponent sign (`1e21` → `"1e+21"`, `1e-7` → `"1e-7"`).
pub fn format_number(n: f64) -> String {
    // adding 0.0 turns -0 into 0
    let n = n + 0.0;
    let magnitude = n.abs();
    if n.is_finite() && (magnitude >= 1e21 || (magnitude != 0.0 && magnitude < 1e-6)) {
        let formatted = format!("{:e}", n);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        };
    }
    format!("{}", n)
}

fn key_count(breakdown: &Map<String, Value>) -> String {
    let count = breakdown.len();
    format!("{} key{}", count, if count == 1 { "" } else { "s" })
}

fn parse_breakdown(label: &str, breakdown: &Map<String, Value>) -> MetricDisplay {
    if is_incomplete_orders_label(label) {
        return MetricDisplay {
            display_label: PENDING_ORDERS_LABEL.to_string(),
            main: format_number(extract_pending(breakdown)),
            percent: None,
        };
    }

    MetricDisplay {
        display_label: label.to_string(),
        main: key_count(breakdown),
        percent: None,
    }
}

fn looks_like_json_object(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.starts_with('{') && trimmed.ends_with('}')
}

/// Parse a metric value into its display form
pub fn parse_metric_value(label: &str, value: &MetricValue) -> MetricDisplay {
    let text = match value {
        MetricValue::Breakdown(breakdown) => return parse_breakdown(label, breakdown),
        MetricValue::Numeric(n) => format_number(*n),
        MetricValue::Text(s) => s.clone(),
        MetricValue::Empty => String::new(),
    };

    if looks_like_json_object(&text) {
        match serde_json::from_str::<Map<String, Value>>(&text) {
            Ok(breakdown) => return parse_breakdown(label, &breakdown),
            Err(e) => {
                debug!(label, error = %e, "Metric value looks like JSON but failed to parse");
            }
        }
    }

    if let Some(caps) = trailing_percent_pattern().captures(&text) {
        if let (Some(main), Some(percent)) = (caps.get(1), caps.get(2)) {
            return MetricDisplay {
                display_label: label.to_string(),
                main: main.as_str().trim().to_string(),
                percent: Some(normalize_sign(percent.as_str())),
            };
        }
    }

    MetricDisplay {
        display_label: label.to_string(),
        main: text,
        percent: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn breakdown(value: Value) -> MetricValue {
        MetricValue::from(value)
    }

    #[test]
    fn test_trailing_percent_is_split() {
        let parsed = parse_metric_value("Total Revenue", &MetricValue::Text("1234 (+8.4%)".into()));
        assert_eq!(parsed.display_label, "Total Revenue");
        assert_eq!(parsed.main, "1234");
        assert_eq!(parsed.percent.as_deref(), Some("+8.4%"));
    }

    #[test]
    fn test_malformed_signs_are_collapsed() {
        let parsed = parse_metric_value("Total Profit", &MetricValue::Text("637.00 (+--19.3%)".into()));
        assert_eq!(parsed.main, "637.00");
        assert_eq!(parsed.percent.as_deref(), Some("-19.3%"));

        let parsed = parse_metric_value("Total Profit", &MetricValue::Text("10 (-+5%)".into()));
        assert_eq!(parsed.percent.as_deref(), Some("-5%"));
    }

    #[test]
    fn test_normalize_sign() {
        assert_eq!(normalize_sign("+-83.1%"), "-83.1%");
        assert_eq!(normalize_sign("-+83.1%"), "-83.1%");
        assert_eq!(normalize_sign("++2%"), "+2%");
        assert_eq!(normalize_sign("--2%"), "-2%");
        assert_eq!(normalize_sign(" +7% "), "+7%");
        assert_eq!(normalize_sign("3%"), "3%");
    }

    #[test]
    fn test_incomplete_orders_breakdown() {
        let value = breakdown(json!({"pending": 4, "completed": 10}));
        let parsed = parse_metric_value("Incomplete Orders Breakdown", &value);
        assert_eq!(parsed.display_label, PENDING_ORDERS_LABEL);
        assert_eq!(parsed.main, "4");
        assert!(parsed.percent.is_none());
    }

    #[test]
    fn test_pending_coercion() {
        let label = "incomplete orders  breakdown";
        let cases = [
            (json!({"pending": "7"}), "7"),
            (json!({"pending": "abc"}), "0"),
            (json!({"pending": null}), "0"),
            (json!({"completed": 3}), "0"),
            (json!({"pending": 2.5}), "2.5"),
        ];
        for (value, expected) in cases {
            let parsed = parse_metric_value(label, &breakdown(value));
            assert_eq!(parsed.main, expected);
        }
    }

    #[test]
    fn test_other_objects_show_key_count() {
        assert_eq!(parse_metric_value("Stats", &breakdown(json!({}))).main, "0 keys");
        assert_eq!(parse_metric_value("Stats", &breakdown(json!({"a": 1}))).main, "1 key");
        assert_eq!(parse_metric_value("Stats", &breakdown(json!({"a": 1, "b": 2}))).main, "2 keys");
    }

    #[test]
    fn test_json_encoded_breakdown() {
        let value = MetricValue::Text(r#" {"pending": "12", "completed": 1} "#.into());
        let parsed = parse_metric_value("Incomplete Orders Breakdown", &value);
        assert_eq!(parsed.display_label, PENDING_ORDERS_LABEL);
        assert_eq!(parsed.main, "12");

        let value = MetricValue::Text(r#"{"x": 1, "y": 2, "z": 3}"#.into());
        assert_eq!(parse_metric_value("Other", &value).main, "3 keys");
    }

    #[test]
    fn test_broken_json_is_kept_verbatim() {
        let value = MetricValue::Text("{not json}".into());
        let parsed = parse_metric_value("Incomplete Orders Breakdown", &value);
        assert_eq!(parsed.display_label, "Incomplete Orders Breakdown");
        assert_eq!(parsed.main, "{not json}");
        assert!(parsed.percent.is_none());
    }

    #[test]
    fn test_scalars() {
        assert_eq!(parse_metric_value("Count", &MetricValue::Numeric(42.0)).main, "42");
        assert_eq!(parse_metric_value("Avg", &MetricValue::Numeric(3.25)).main, "3.25");
        assert_eq!(parse_metric_value("Empty", &MetricValue::Empty).main, "");
        assert_eq!(parse_metric_value("Top seller", &MetricValue::Text("Amoxicillin".into())).main, "Amoxicillin");
    }

    #[test]
    fn test_extreme_numbers_use_exponent_form() {
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1.5e22), "1.5e+22");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(-2.5e-8), "-2.5e-8");
        assert_eq!(format_number(123456789012.0), "123456789012");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn test_non_ascii_digits_are_not_split() {
        let parsed = parse_metric_value("Total Revenue", &MetricValue::Text("１２ (+５%)".into()));
        assert_eq!(parsed.main, "１２ (+５%)");
        assert!(parsed.percent.is_none());
    }

    #[test]
    fn test_percent_without_parentheses_is_not_split() {
        let parsed = parse_metric_value("Turnover Rate", &MetricValue::Text("12.5%".into()));
        assert_eq!(parsed.main, "12.5%");
        assert!(parsed.percent.is_none());
    }

    #[test]
    fn test_time_filtered_labels() {
        assert!(is_time_filtered("Total Revenue"));
        assert!(is_time_filtered("total sales (qty) this week"));
        assert!(is_time_filtered("EXPIRED ITEMS"));
        assert!(!is_time_filtered("Pending Orders"));
        assert!(!is_time_filtered("Low Stock Items"));
    }

    #[test]
    fn test_card_uses_display_label_for_badge() {
        let metric = KeyMetric {
            label: "Incomplete Orders Breakdown".to_string(),
            value: breakdown(json!({"pending": 1})),
            trend_up: true,
        };
        let card = MetricCard::from_metric(&metric);
        assert_eq!(card.display.display_label, PENDING_ORDERS_LABEL);
        assert!(!card.time_filtered);
        assert!(card.trend_up);
    }
}
