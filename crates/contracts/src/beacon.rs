//! Beacon wire types
//!
//! Raw advertisements as seen by a scanner, and the decoded iBeacon frame.

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// Bluetooth SIG company identifier for Apple (iBeacon format owner)
pub const APPLE_MANUFACTURER_ID: u16 = 0x004C;

/// iBeacon type marker (byte 0)
pub const IBEACON_TYPE: u8 = 0x02;

/// iBeacon remaining-length marker (byte 1)
pub const IBEACON_LENGTH: u8 = 0x15;

/// Minimum manufacturer payload length for an iBeacon frame
pub const IBEACON_FRAME_LEN: usize = 23;

/// 16-byte beacon identifier, displayed in hyphenated UUID form.
///
/// # Examples
/// ```
/// use contracts::BeaconId;
///
/// let id: BeaconId = "a495bb20-c5b1-4b44-b512-1370f02d74de".parse().unwrap();
/// assert_eq!(id.to_string(), "a495bb20-c5b1-4b44-b512-1370f02d74de");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BeaconId([u8; 16]);

impl BeaconId {
    /// Create from raw big-endian bytes
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Raw big-endian bytes
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for BeaconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for BeaconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BeaconId({self})")
    }
}

impl FromStr for BeaconId {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let groups: Vec<&str> = s.split('-').collect();
        let lengths: Vec<usize> = groups.iter().map(|g| g.len()).collect();
        if !s.is_ascii() || lengths != [8, 4, 4, 4, 12] {
            return Err(ContractError::invalid_beacon_id(s));
        }

        let hex: String = groups.concat();
        let mut bytes = [0u8; 16];
        for (i, slot) in bytes.iter_mut().enumerate() {
            *slot = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| ContractError::invalid_beacon_id(s))?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for BeaconId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BeaconId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Manufacturer-specific advertisement payload
///
/// Transient; only lives until it has been decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAdvertisement {
    /// Company identifier the payload was published under
    pub manufacturer_id: u16,
    /// Opaque manufacturer payload
    pub payload: Bytes,
}

impl RawAdvertisement {
    /// Create an advertisement under the Apple company identifier
    pub fn apple(payload: impl Into<Bytes>) -> Self {
        Self {
            manufacturer_id: APPLE_MANUFACTURER_ID,
            payload: payload.into(),
        }
    }
}

/// One event produced by a scan source
#[derive(Debug, Clone)]
pub struct ScanEvent {
    /// Device address (None for synthetic events)
    pub address: Option<String>,
    /// Received signal strength in dBm (None for synthetic events)
    pub rssi: Option<i16>,
    /// Manufacturer payload
    pub advertisement: RawAdvertisement,
}

/// Decoded iBeacon frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedBeacon {
    /// Beacon-type marker (always [`IBEACON_TYPE`] once decoded)
    pub beacon_type: u8,
    /// Proximity identifier
    pub id: BeaconId,
    /// Major field
    pub major: u16,
    /// Minor field
    pub minor: u16,
    /// Calibrated transmit power at 1m (dBm)
    pub tx_power: i8,
}

impl DecodedBeacon {
    /// Encode back into a 23-byte iBeacon manufacturer payload
    pub fn to_payload(&self) -> [u8; IBEACON_FRAME_LEN] {
        let mut frame = [0u8; IBEACON_FRAME_LEN];
        frame[0] = IBEACON_TYPE;
        frame[1] = IBEACON_LENGTH;
        frame[2..18].copy_from_slice(self.id.as_bytes());
        frame[18..20].copy_from_slice(&self.major.to_be_bytes());
        frame[20..22].copy_from_slice(&self.minor.to_be_bytes());
        frame[22] = self.tx_power.to_be_bytes()[0];
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beacon_id_display_roundtrip() {
        let text = "a495bb40-c5b1-4b44-b512-1370f02d74df";
        let id: BeaconId = text.parse().unwrap();
        assert_eq!(id.as_bytes()[0], 0xa4);
        assert_eq!(id.as_bytes()[15], 0xdf);
        assert_eq!(id.to_string(), text);
    }

    #[test]
    fn test_beacon_id_rejects_bad_input() {
        assert!("a495bb40c5b14b44b5121370f02d74df".parse::<BeaconId>().is_err());
        assert!("zz95bb40-c5b1-4b44-b512-1370f02d74df"
            .parse::<BeaconId>()
            .is_err());
        assert!("".parse::<BeaconId>().is_err());
    }

    #[test]
    fn test_beacon_id_serde_as_string() {
        let id: BeaconId = "a495bb20-c5b1-4b44-b512-1370f02d74de".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"a495bb20-c5b1-4b44-b512-1370f02d74de\"");
        let back: BeaconId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_to_payload_layout() {
        let beacon = DecodedBeacon {
            beacon_type: IBEACON_TYPE,
            id: BeaconId::from_bytes([0x11; 16]),
            major: 70,
            minor: 1000,
            tx_power: -59,
        };
        let frame = beacon.to_payload();
        assert_eq!(&frame[..2], &[0x02, 0x15]);
        assert_eq!(&frame[18..22], &[0x00, 0x46, 0x03, 0xe8]);
        assert_eq!(frame[22] as i8, -59);
    }
}
