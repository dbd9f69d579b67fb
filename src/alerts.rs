//! Alert derivation.
//!
//! Each monitored variable is checked on its own against a fixed threshold
//! and produces at most one candidate. Candidates come out in table order.
//! Humidity is not monitored.

use crate::models::{AlertCandidate, Measurements};

// ---

/// A variable watched for threshold crossings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    Pm25,
    Pm10,
    Co2,
    Tvoc,
    Temperature,
}

/// Threshold table in evaluation order.
pub const MONITORED: [Variable; 5] = [
    Variable::Pm25,
    Variable::Pm10,
    Variable::Co2,
    Variable::Tvoc,
    Variable::Temperature,
];

impl Variable {
    // ---
    pub fn label(&self) -> &'static str {
        match self {
            Variable::Pm25 => "PM2.5",
            Variable::Pm10 => "PM10",
            Variable::Co2 => "CO₂",
            Variable::Tvoc => "TVOC",
            Variable::Temperature => "Temperature",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Variable::Pm25 | Variable::Pm10 => "µg/m³",
            Variable::Co2 => "ppm",
            Variable::Tvoc => "ppb",
            Variable::Temperature => "°C",
        }
    }

    /// Alert fires when the observed value is strictly above this.
    pub fn threshold(&self) -> f64 {
        match self {
            Variable::Pm25 => 35.0,
            Variable::Pm10 => 50.0,
            Variable::Co2 => 1000.0,
            Variable::Tvoc => 220.0,
            Variable::Temperature => 40.0,
        }
    }

    /// Decimals used when the value is shown in a chat report.
    pub fn report_decimals(&self) -> usize {
        match self {
            Variable::Co2 | Variable::Tvoc => 0,
            _ => 1,
        }
    }

    pub fn value(&self, m: &Measurements) -> f64 {
        match self {
            Variable::Pm25 => m.pm25,
            Variable::Pm10 => m.pm10,
            Variable::Co2 => m.co2,
            Variable::Tvoc => m.tvoc,
            Variable::Temperature => m.temperature,
        }
    }
}

/// Round half away from zero to one decimal.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Variables of `m` that are above their alert threshold, in table order.
pub fn crossings(m: &Measurements) -> impl Iterator<Item = (Variable, f64)> + '_ {
    MONITORED
        .into_iter()
        .map(move |v| (v, v.value(m)))
        .filter(|(v, value)| *value > v.threshold())
}

/// Derive the alert candidates for one sample.
pub fn derive_alerts(m: &Measurements) -> Vec<AlertCandidate> {
    // ---
    crossings(m)
        .map(|(variable, value)| {
            let label = variable.label();
            let unit = variable.unit();
            let threshold = variable.threshold();
            AlertCandidate {
                variable: label,
                value: round1(value),
                threshold,
                message: format!(
                    "{label}: {value:.1} {unit} (threshold: {threshold} {unit}); ventilation recommended"
                ),
            }
        })
        .collect()
}
