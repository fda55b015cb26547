//! Reading builder - decoded beacon + identity -> validated `Reading`

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use contracts::{BeaconId, DecodedBeacon, DeviceProfile, Reading, TiltColor, ValidityConfig};

use crate::identity::IdentityTable;

/// Why a reading was discarded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    /// Temperature outside the accepted range
    Temperature { color: TiltColor, temp_f: f64 },
    /// Gravity outside the accepted range
    Gravity { color: TiltColor, gravity: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Temperature { temp_f, .. } => write!(f, "invalid temperature: {temp_f}F"),
            Rejection::Gravity { gravity, .. } => write!(f, "invalid gravity: {gravity}"),
        }
    }
}

/// Result of building a reading
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    /// Both checks passed
    Accepted(Reading),
    /// Identifier not in the identity table
    UnknownDevice(BeaconId),
    /// A validity check failed
    Rejected(Rejection),
}

/// Maps decoded beacons into readings
#[derive(Debug, Clone)]
pub struct ReadingBuilder {
    identity: Arc<IdentityTable>,
    validity: ValidityConfig,
    profiles: BTreeMap<TiltColor, DeviceProfile>,
}

impl ReadingBuilder {
    pub fn new(identity: Arc<IdentityTable>, validity: ValidityConfig) -> Self {
        Self {
            identity,
            validity,
            profiles: BTreeMap::new(),
        }
    }

    /// Attach per-colour display names and original gravities
    pub fn with_profiles(mut self, profiles: BTreeMap<TiltColor, DeviceProfile>) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn identity(&self) -> &IdentityTable {
        &self.identity
    }

    /// Resolve, build and validate
    ///
    /// Temperature is checked before gravity; the first failing check is reported.
    pub fn build(&self, beacon: &DecodedBeacon) -> BuildOutcome {
        let Some(color) = self.identity.color_of(&beacon.id) else {
            return BuildOutcome::UnknownDevice(beacon.id);
        };

        let profile = self.profiles.get(&color);
        let name = profile
            .and_then(|p| p.name.clone())
            .unwrap_or_else(|| color.to_string());
        let original_gravity = profile.and_then(|p| p.original_gravity);

        let reading = Reading::from_beacon_fields(
            color,
            name,
            beacon.major,
            beacon.minor,
            original_gravity,
            &self.validity,
        );

        if !reading.temp_valid() {
            return BuildOutcome::Rejected(Rejection::Temperature {
                color,
                temp_f: reading.temp_fahrenheit(),
            });
        }
        if !reading.gravity_valid() {
            return BuildOutcome::Rejected(Rejection::Gravity {
                color,
                gravity: reading.gravity(),
            });
        }

        BuildOutcome::Accepted(reading)
    }
}
