//! Identity table - beacon identifier to colour mapping
//!
//! Built once at startup and shared read-only.

use std::collections::HashMap;

use contracts::{BeaconId, TiltColor};

const fn tilt_id(channel: u8, tail: u8) -> BeaconId {
    BeaconId::from_bytes([
        0xa4, 0x95, 0xbb, channel, 0xc5, 0xb1, 0x4b, 0x44, 0xb5, 0x12, 0x13, 0x70, 0xf0, 0x2d,
        0x74, tail,
    ])
}

/// Reserved identifier of the synthetic source
pub const SIMULATED_ID: BeaconId = tilt_id(0x40, 0xdf);

/// Identifiers broadcast by each hydrometer colour
pub const KNOWN_DEVICES: [(BeaconId, TiltColor); 9] = [
    (tilt_id(0x10, 0xde), TiltColor::Red),
    (tilt_id(0x20, 0xde), TiltColor::Green),
    (tilt_id(0x30, 0xde), TiltColor::Black),
    (tilt_id(0x40, 0xde), TiltColor::Purple),
    (tilt_id(0x50, 0xde), TiltColor::Orange),
    (tilt_id(0x60, 0xde), TiltColor::Blue),
    (tilt_id(0x70, 0xde), TiltColor::Yellow),
    (tilt_id(0x80, 0xde), TiltColor::Pink),
    (SIMULATED_ID, TiltColor::Simulated),
];

/// Immutable identifier <-> colour lookup
#[derive(Debug, Clone)]
pub struct IdentityTable {
    by_id: HashMap<BeaconId, TiltColor>,
    by_color: HashMap<TiltColor, BeaconId>,
}

impl IdentityTable {
    /// Table of all known hydrometer identifiers
    pub fn standard() -> Self {
        Self::from_entries(KNOWN_DEVICES)
    }

    /// Build from arbitrary entries (later duplicates win)
    pub fn from_entries(entries: impl IntoIterator<Item = (BeaconId, TiltColor)>) -> Self {
        let by_id: HashMap<BeaconId, TiltColor> = entries.into_iter().collect();
        let by_color = by_id.iter().map(|(id, color)| (*color, *id)).collect();
        Self { by_id, by_color }
    }

    /// Resolve an identifier
    pub fn color_of(&self, id: &BeaconId) -> Option<TiltColor> {
        self.by_id.get(id).copied()
    }

    /// Inverse lookup
    pub fn id_of(&self, color: TiltColor) -> Option<BeaconId> {
        self.by_color.get(&color).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Entries sorted by colour
    pub fn entries(&self) -> Vec<(TiltColor, BeaconId)> {
        let mut entries: Vec<_> = self.by_color.iter().map(|(c, id)| (*c, *id)).collect();
        entries.sort();
        entries
    }
}

impl Default for IdentityTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_lookup() {
        let table = IdentityTable::standard();
        assert_eq!(table.len(), 9);

        let green: BeaconId = "a495bb20-c5b1-4b44-b512-1370f02d74de".parse().unwrap();
        assert_eq!(table.color_of(&green), Some(TiltColor::Green));

        let simulated: BeaconId = "a495bb40-c5b1-4b44-b512-1370f02d74df".parse().unwrap();
        assert_eq!(table.color_of(&simulated), Some(TiltColor::Simulated));
        assert_eq!(table.id_of(TiltColor::Simulated), Some(simulated));
    }

    #[test]
    fn test_unknown_id() {
        let table = IdentityTable::standard();
        let stranger = BeaconId::from_bytes([0u8; 16]);
        assert_eq!(table.color_of(&stranger), None);
    }

    #[test]
    fn test_inverse_is_consistent() {
        let table = IdentityTable::standard();
        for (color, id) in table.entries() {
            assert_eq!(table.color_of(&id), Some(color));
        }
    }
}
