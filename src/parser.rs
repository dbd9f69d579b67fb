//! Extraction of a reading from free-form chat text.
//!
//! Each of the six fields is found by its label (anywhere in the text, in
//! any order) followed by optional whitespace and a decimal numeral using
//! `.` as separator. All six must be present and valid; there is no partial
//! result.

use std::fmt;

use thiserror::Error;

use crate::models::{Measurements, RawReading};

// ---

/// A labelled field of an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Temperature,
    Humidity,
    Co2,
    Pm25,
    Pm10,
    Tvoc,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Temperature => "Temp",
            Field::Humidity => "Humidity",
            Field::Co2 => "CO2",
            Field::Pm25 => "PM2.5",
            Field::Pm10 => "PM10",
            Field::Tvoc => "TVOC",
        };
        f.write_str(name)
    }
}

/// Label spellings per field, tried in order.
const LABELS: [(Field, &[&str]); 6] = [
    (Field::Temperature, &["Temp:"]),
    (Field::Humidity, &["Humidity:"]),
    (Field::Co2, &["CO2:", "CO₂:"]),
    (Field::Pm25, &["PM2.5:"]),
    (Field::Pm10, &["PM10:"]),
    (Field::Tvoc, &["TVOC:"]),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no numeric value labelled {0}")]
    MissingField(Field),

    #[error("invalid number '{token}' for {field}")]
    InvalidNumber { field: Field, token: String },
}

/// Parse a message into a reading stamped with the current time.
pub fn parse(text: &str) -> Result<RawReading, ParseError> {
    // ---
    let mut values = [0.0_f64; 6];
    for (slot, (field, labels)) in values.iter_mut().zip(LABELS.iter()) {
        *slot = extract(text, *field, labels)?;
    }
    let [temperature, humidity, co2, pm25, pm10, tvoc] = values;

    Ok(RawReading::new(Measurements {
        pm25,
        pm10,
        co2,
        tvoc,
        temperature,
        humidity,
    }))
}

/// Value after the first occurrence of a label that is followed by a
/// numeral.
fn extract(text: &str, field: Field, labels: &[&str]) -> Result<f64, ParseError> {
    // ---
    for label in labels {
        for (pos, _) in text.match_indices(label) {
            let Some(token) = numeral(&text[pos + label.len()..]) else {
                continue;
            };
            return match token.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                _ => Err(ParseError::InvalidNumber {
                    field,
                    token: token.to_string(),
                }),
            };
        }
    }
    Err(ParseError::MissingField(field))
}

/// Leading run of an optional minus sign, digits and dots, after skipping
/// whitespace.
fn numeral(rest: &str) -> Option<&str> {
    // ---
    let rest = rest.trim_start();
    let sign = usize::from(rest.starts_with('-'));
    let body = &rest[sign..];
    let len = body
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(body.len());

    if len == 0 {
        None
    } else {
        Some(&rest[..sign + len])
    }
}
