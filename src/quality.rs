//! Air-quality classification.
//!
//! Only CO₂, PM2.5 and TVOC take part; temperature and humidity never change
//! the state. These limits are separate from the alert thresholds in
//! [`crate::alerts`] and the two sets are not meant to agree.

use crate::models::{Measurements, QualityState};

// ---

const BAD_CO2: f64 = 1200.0;
const BAD_PM25: f64 = 35.0;
const BAD_TVOC: f64 = 200.0;

const REGULAR_CO2: f64 = 900.0;
const REGULAR_PM25: f64 = 15.0;
const REGULAR_TVOC: f64 = 120.0;

/// Classify a sample. First matching rule wins: Bad, then Regular, then Good.
pub fn classify(m: &Measurements) -> QualityState {
    // ---
    if m.co2 > BAD_CO2 || m.pm25 > BAD_PM25 || m.tvoc > BAD_TVOC {
        return QualityState::Bad;
    }

    if m.co2 > REGULAR_CO2 || m.pm25 > REGULAR_PM25 || m.tvoc > REGULAR_TVOC {
        return QualityState::Regular;
    }

    QualityState::Good
}
