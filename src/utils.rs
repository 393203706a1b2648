use crate::models::fpl::Gameweek;
use serde::Serialize;
use serde_json::{Map, Value};

/// The gameweek flagged as current, re-derived from the events list on every run.
pub fn current_gameweek(events: &[Gameweek]) -> Option<&Gameweek> {
    events.iter().find(|e| e.is_current)
}

/// Upstream prices and values are integer tenths of a currency unit.
pub fn tenths_to_display(tenths: i64) -> f64 {
    tenths as f64 / 10.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Map the upstream position code (1..=4) to its short label.
pub fn position_label(element_type: i64) -> &'static str {
    match element_type {
        1 => "GK",
        2 => "DEF",
        3 => "MID",
        4 => "FWD",
        _ => "Unknown",
    }
}

/// Parse one of the upstream's string-encoded decimals; missing or garbage is 0.0.
pub fn parse_decimal(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok()).unwrap_or(0.0)
}

/// Serialize a struct into a JSON object (sorted keys).
pub fn to_object<T: Serialize>(val: &T) -> Result<Map<String, Value>, serde_json::Error> {
    match serde_json::to_value(val)? {
        Value::Object(map) => Ok(map),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            Ok(map)
        }
    }
}
