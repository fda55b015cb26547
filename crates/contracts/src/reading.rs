//! Reading - validated hydrometer measurement
//!
//! A `Reading` is immutable once built; every consumer gets a shared borrow.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::{TiltColor, ValidityConfig};

/// Hydrometer measurement decoded from one beacon
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    color: TiltColor,
    name: String,
    temp_fahrenheit: f64,
    gravity: f64,
    original_gravity: Option<f64>,
    temp_valid: bool,
    gravity_valid: bool,
    timestamp: DateTime<Utc>,
}

impl Reading {
    /// Build a reading from raw beacon fields
    ///
    /// `major` is the temperature in °F, `minor` the specific gravity
    /// scaled by 1000. Validity flags are computed against `validity`.
    pub fn from_beacon_fields(
        color: TiltColor,
        name: impl Into<String>,
        major: u16,
        minor: u16,
        original_gravity: Option<f64>,
        validity: &ValidityConfig,
    ) -> Self {
        let temp_fahrenheit = f64::from(major);
        let gravity = decimal_gravity(minor);
        Self {
            color,
            name: name.into(),
            temp_fahrenheit,
            gravity,
            original_gravity,
            temp_valid: validity.temp_in_range(temp_fahrenheit),
            gravity_valid: validity.gravity_in_range(gravity),
            timestamp: Utc::now(),
        }
    }

    pub fn color(&self) -> TiltColor {
        self.color
    }

    /// Display name (configured profile name, or the colour)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn temp_fahrenheit(&self) -> f64 {
        self.temp_fahrenheit
    }

    pub fn temp_celsius(&self) -> f64 {
        (self.temp_fahrenheit - 32.0) * 5.0 / 9.0
    }

    /// Specific gravity (e.g. 1.050)
    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    pub fn original_gravity(&self) -> Option<f64> {
        self.original_gravity
    }

    /// Gravity expressed in degrees Plato
    pub fn degrees_plato(&self) -> f64 {
        let sg = self.gravity;
        135.997 * sg.powi(3) - 630.272 * sg.powi(2) + 1111.14 * sg - 616.868
    }

    /// Alcohol by volume, when an original gravity is known
    pub fn alcohol_by_volume(&self) -> Option<f64> {
        self.original_gravity
            .map(|og| ((og - self.gravity) * 131.25).max(0.0))
    }

    /// Apparent attenuation in percent, when an original gravity is known
    pub fn apparent_attenuation(&self) -> Option<f64> {
        self.original_gravity
            .filter(|og| *og > 1.0)
            .map(|og| (og - self.gravity) / (og - 1.0) * 100.0)
    }

    pub fn temp_valid(&self) -> bool {
        self.temp_valid
    }

    pub fn gravity_valid(&self) -> bool {
        self.gravity_valid
    }

    /// Both validity checks passed
    pub fn is_valid(&self) -> bool {
        self.temp_valid && self.gravity_valid
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Convert the scaled integer gravity into its decimal form
pub fn decimal_gravity(minor: u16) -> f64 {
    f64::from(minor) / 1000.0
}

#[derive(Serialize)]
struct ReadingRecord<'a> {
    color: TiltColor,
    name: &'a str,
    timestamp: DateTime<Utc>,
    temp_fahrenheit: f64,
    temp_celsius: f64,
    gravity: f64,
    degrees_plato: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_gravity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alcohol_by_volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    apparent_attenuation: Option<f64>,
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ReadingRecord {
            color: self.color,
            name: &self.name,
            timestamp: self.timestamp,
            temp_fahrenheit: self.temp_fahrenheit,
            temp_celsius: round3(self.temp_celsius()),
            gravity: self.gravity,
            degrees_plato: round3(self.degrees_plato()),
            original_gravity: self.original_gravity,
            alcohol_by_volume: self.alcohol_by_volume().map(round3),
            apparent_attenuation: self.apparent_attenuation().map(round3),
        }
        .serialize(serializer)
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
