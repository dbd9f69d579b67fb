//! Data models for the air-quality pipeline.
//!
//! A reading moves through three shapes: [`RawReading`] as handed in by a
//! producer, [`NewReading`] once it has been classified, and [`Reading`] once
//! the store has given it an identity. The quality state can only be stamped
//! by [`RawReading::classified`], so it is set exactly once before the first
//! write.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quality;

// ---

/// Store-assigned identity for readings and alerts.
pub type Id = i64;

/// Coarse severity classification of a reading.
///
/// Variants are declared in severity order so the derived `Ord` is the
/// severity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityState {
    Good,
    Regular,
    Bad,
}

impl QualityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityState::Good => "good",
            QualityState::Regular => "regular",
            QualityState::Bad => "bad",
        }
    }
}

impl fmt::Display for QualityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good" => Ok(QualityState::Good),
            "regular" => Ok(QualityState::Regular),
            "bad" => Ok(QualityState::Bad),
            other => Err(format!("unknown quality state '{other}'")),
        }
    }
}

/// The six scalar measurements of one sensor sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    // ---
    /// Fine particulate matter, µg/m³.
    pub pm25: f64,
    /// Coarse particulate matter, µg/m³.
    pub pm10: f64,
    /// Carbon dioxide, ppm.
    pub co2: f64,
    /// Total volatile organic compounds, ppb.
    pub tvoc: f64,
    /// Temperature, °C.
    pub temperature: f64,
    /// Relative humidity, %.
    pub humidity: f64,
}

/// A reading as submitted by a producer (HTTP caller, simulator, parser).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    // ---
    /// Sample time; defaults to the evaluation instant when absent.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub measurements: Measurements,
}

impl RawReading {
    // ---
    pub fn new(measurements: Measurements) -> Self {
        Self {
            timestamp: None,
            measurements,
        }
    }

    pub fn at(timestamp: DateTime<Utc>, measurements: Measurements) -> Self {
        Self {
            timestamp: Some(timestamp),
            measurements,
        }
    }

    /// Stamp the quality state, producing the shape the store accepts.
    pub fn classified(self) -> NewReading {
        // ---
        let state = quality::classify(&self.measurements);
        NewReading {
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            measurements: self.measurements,
            state,
        }
    }
}

/// A classified reading that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub timestamp: DateTime<Utc>,
    pub measurements: Measurements,
    pub state: QualityState,
}

impl NewReading {
    pub fn with_id(self, id: Id) -> Reading {
        Reading {
            id,
            timestamp: self.timestamp,
            measurements: self.measurements,
            state: self.state,
        }
    }
}

/// A persisted reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: Id,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub measurements: Measurements,
    pub state: QualityState,
}

/// One threshold crossing derived from a reading, before it is tied to a
/// persisted reading.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertCandidate {
    pub variable: &'static str,
    /// Observed value rounded to one decimal.
    pub value: f64,
    pub threshold: f64,
    pub message: String,
}

impl AlertCandidate {
    /// Materialize the candidate against the persisted reading it came from.
    pub fn for_reading(self, reading: &Reading) -> NewAlert {
        NewAlert {
            reading_id: reading.id,
            timestamp: Utc::now(),
            variable: self.variable.to_string(),
            value: self.value,
            threshold: self.threshold,
            message: self.message,
        }
    }
}

/// An alert ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub reading_id: Id,
    pub timestamp: DateTime<Utc>,
    pub variable: String,
    pub value: f64,
    pub threshold: f64,
    pub message: String,
}

impl NewAlert {
    pub fn with_id(self, id: Id) -> Alert {
        Alert {
            id,
            reading_id: self.reading_id,
            timestamp: self.timestamp,
            variable: self.variable,
            value: self.value,
            threshold: self.threshold,
            message: self.message,
        }
    }
}

/// A persisted alert. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Id,
    pub reading_id: Id,
    pub timestamp: DateTime<Utc>,
    pub variable: String,
    pub value: f64,
    pub threshold: f64,
    pub message: String,
}

/// Number of alerts raised for one variable in a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlertCount {
    pub variable: String,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Measurements {
        Measurements {
            pm25: 10.0,
            pm10: 20.0,
            co2: 700.0,
            tvoc: 80.0,
            temperature: 22.0,
            humidity: 45.0,
        }
    }

    #[test]
    fn test_quality_state_order_is_severity() {
        // ---
        assert!(QualityState::Good < QualityState::Regular);
        assert!(QualityState::Regular < QualityState::Bad);
    }

    #[test]
    fn test_quality_state_text_round_trip() {
        // ---
        for state in [QualityState::Good, QualityState::Regular, QualityState::Bad] {
            assert_eq!(state.as_str().parse::<QualityState>(), Ok(state));
        }
        assert!("Malo".parse::<QualityState>().is_err());
    }

    #[test]
    fn test_classified_keeps_explicit_timestamp() {
        // ---
        let ts = Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap();
        let new = RawReading::at(ts, sample()).classified();

        assert_eq!(new.timestamp, ts);
        assert_eq!(new.state, QualityState::Good);
        assert_eq!(new.measurements, sample());
    }

    #[test]
    fn test_classified_defaults_timestamp_to_now() {
        // ---
        let before = Utc::now();
        let new = RawReading::new(sample()).classified();
        assert!(new.timestamp >= before);
    }

    #[test]
    fn test_raw_reading_accepts_flat_json() {
        // ---
        let raw: RawReading = serde_json::from_str(
            r#"{"pm25":40,"pm10":30,"co2":800,"tvoc":100,"temperature":25,"humidity":50}"#,
        )
        .unwrap();

        assert!(raw.timestamp.is_none());
        assert_eq!(raw.measurements.pm25, 40.0);
        assert_eq!(raw.measurements.humidity, 50.0);
    }

    #[test]
    fn test_reading_serializes_state_lowercase() {
        // ---
        let reading = RawReading::new(sample()).classified().with_id(7);
        let json = serde_json::to_value(&reading).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["state"], "good");
        assert_eq!(json["co2"], 700.0);
    }
}
