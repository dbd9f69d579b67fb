//! Chat messages sent for readings and alerts.
//!
//! The reading report carries [`REPORT_MARKER`] and the labels the parser
//! looks for, so a report posted to the channel can be ingested back.

use crate::alerts::{crossings, Variable};
use crate::models::{Measurements, QualityState};

// ---

/// Marker line an inbound message must contain to be ingested.
pub const REPORT_MARKER: &str = "Air Quality Report";

fn status_label(state: QualityState) -> &'static str {
    match state {
        QualityState::Good => "✅ Good",
        QualityState::Regular => "⚠️ Regular",
        QualityState::Bad => "🔴 Bad",
    }
}

/// Render a classified sample as a chat report.
pub fn reading_report(m: &Measurements, state: QualityState) -> String {
    // ---
    [
        format!("📊 {REPORT_MARKER}"),
        format!("🌡 Temp: {:.1} °C", m.temperature),
        format!("💧 Humidity: {:.1}%", m.humidity),
        format!("💨 CO₂: {:.0} ppm", m.co2),
        format!("🌫 PM2.5: {:.1} µg/m³", m.pm25),
        format!("🌫 PM10: {:.1} µg/m³", m.pm10),
        format!("🧪 TVOC: {:.0} ppb", m.tvoc),
        format!("Status: {}", status_label(state)),
    ]
    .join("\n")
}

fn alert_line(variable: Variable, value: f64) -> String {
    let unit = variable.unit();
    let decimals = variable.report_decimals();
    format!(
        "{}: {value:.decimals$} {unit} (threshold: {} {unit})",
        variable.label(),
        variable.threshold()
    )
}

/// Render the alert message for a sample, if any threshold is crossed.
pub fn alert_report(m: &Measurements) -> Option<String> {
    // ---
    let lines: Vec<String> = crossings(m).map(|(v, value)| alert_line(v, value)).collect();
    if lines.is_empty() {
        return None;
    }

    let mut message = vec!["⚠️ AIR QUALITY ALERT".to_string()];
    message.extend(lines);
    message.push("Action: ventilation recommended".to_string());
    Some(message.join("\n"))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::parser;
    use crate::quality::classify;

    fn sample() -> Measurements {
        Measurements {
            pm25: 12.1,
            pm10: 20.0,
            co2: 650.0,
            tvoc: 85.0,
            temperature: 25.3,
            humidity: 48.0,
        }
    }

    #[test]
    fn test_reading_report_layout() {
        // ---
        let report = reading_report(&sample(), QualityState::Good);
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "📊 Air Quality Report");
        assert_eq!(lines[3], "💨 CO₂: 650 ppm");
        assert_eq!(lines[7], "Status: ✅ Good");
    }

    #[test]
    fn test_reading_report_parses_back() {
        // ---
        let m = sample();
        let report = reading_report(&m, classify(&m));

        assert!(report.contains(REPORT_MARKER));
        assert_eq!(parser::parse(&report).unwrap().measurements, m);
    }

    #[test]
    fn test_alert_report_lists_crossings() {
        // ---
        let m = Measurements {
            pm25: 55.34,
            co2: 1400.4,
            temperature: 41.0,
            ..sample()
        };
        let report = alert_report(&m).unwrap();
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(
            lines,
            vec![
                "⚠️ AIR QUALITY ALERT",
                "PM2.5: 55.3 µg/m³ (threshold: 35 µg/m³)",
                "CO₂: 1400 ppm (threshold: 1000 ppm)",
                "Temperature: 41.0 °C (threshold: 40 °C)",
                "Action: ventilation recommended",
            ]
        );
    }

    #[test]
    fn test_no_alert_report_below_thresholds() {
        // ---
        assert!(alert_report(&sample()).is_none());
    }
}
