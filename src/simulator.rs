//! Synthetic readings for demos and load.
//!
//! Values are Gaussian (Box-Muller), rounded to one decimal and clamped to a
//! plausible range per field.

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{Measurements, RawReading};

// ---

/// Mean and standard deviation of one field.
#[derive(Debug, Clone, Copy)]
struct Profile {
    mean: f64,
    dev: f64,
}

const PM25: Profile = Profile { mean: 18.0, dev: 8.0 };
const PM10: Profile = Profile { mean: 30.0, dev: 12.0 };
const CO2: Profile = Profile { mean: 620.0, dev: 150.0 };
const TVOC: Profile = Profile { mean: 90.0, dev: 50.0 };
const TEMPERATURE: Profile = Profile { mean: 25.0, dev: 4.0 };
const HUMIDITY: Profile = Profile { mean: 48.0, dev: 12.0 };

/// Probability that a normal reading is a pollution spike.
const SPIKE_PROBABILITY: f64 = 0.10;

/// Scale applied to particulate and gas profiles during a spike.
const SPIKE_FACTOR: f64 = 2.5;

pub struct Simulator {
    rng: StdRng,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    // ---
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic simulator for tests and reproducible demos.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn gaussian(&mut self, mean: f64, dev: f64) -> f64 {
        // ---
        let u1: f64 = 1.0 - self.rng.gen::<f64>();
        let u2: f64 = 1.0 - self.rng.gen::<f64>();
        let normal = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).sin();
        ((mean + dev * normal) * 10.0).round() / 10.0
    }

    fn sample(&mut self, profile: Profile, factor: f64, min: f64, max: f64) -> f64 {
        self.gaussian(profile.mean * factor, profile.dev * factor).clamp(min, max)
    }

    /// A typical sample, occasionally a spike.
    pub fn measurements(&mut self) -> Measurements {
        // ---
        let factor = if self.rng.gen::<f64>() < SPIKE_PROBABILITY {
            SPIKE_FACTOR
        } else {
            1.0
        };

        Measurements {
            pm25: self.sample(PM25, factor, 0.0, 500.0),
            pm10: self.sample(PM10, factor, 0.0, 600.0),
            co2: self.sample(CO2, factor, 400.0, 5000.0),
            tvoc: self.sample(TVOC, factor, 0.0, 2000.0),
            temperature: self.sample(TEMPERATURE, 1.0, -10.0, 55.0),
            humidity: self.sample(HUMIDITY, 1.0, 0.0, 100.0),
        }
    }

    /// A sample with PM2.5, PM10, CO₂ and TVOC above their alert thresholds.
    pub fn alert_measurements(&mut self) -> Measurements {
        // ---
        Measurements {
            pm25: self.gaussian(55.0, 15.0).clamp(36.0, 500.0),
            pm10: self.gaussian(70.0, 20.0).clamp(51.0, 600.0),
            co2: self.gaussian(1400.0, 200.0).clamp(1001.0, 5000.0),
            tvoc: self.gaussian(350.0, 80.0).clamp(221.0, 2000.0),
            temperature: self.gaussian(38.0, 3.0).clamp(30.0, 55.0),
            humidity: self.gaussian(75.0, 10.0).clamp(40.0, 100.0),
        }
    }

    pub fn reading(&mut self) -> RawReading {
        RawReading::at(Utc::now(), self.measurements())
    }

    pub fn alert_reading(&mut self) -> RawReading {
        RawReading::at(Utc::now(), self.alert_measurements())
    }

    /// `count` readings spaced `interval` apart, oldest first, the last one
    /// stamped now.
    pub fn history(&mut self, count: usize, interval: Duration) -> Vec<RawReading> {
        // ---
        let now = Utc::now();
        (0..count)
            .rev()
            .map(|i| RawReading::at(now - interval * i as i32, self.measurements()))
            .collect()
    }
}
