//! iBeacon 解码器
//!
//! 纯函数：厂商负载字节 -> `DecodedBeacon`。
//! 畸形负载是常见情况，返回 `None`，不记录日志。

use bytes::Buf;
use contracts::{
    DecodedBeacon, RawAdvertisement, APPLE_MANUFACTURER_ID, IBEACON_FRAME_LEN, IBEACON_LENGTH,
    IBEACON_TYPE,
};

/// 解码 iBeacon 负载
///
/// 布局（大端）：
/// `[0]=0x02 [1]=0x15 [2..18]=id [18..20]=major [20..22]=minor [22]=tx_power`
///
/// 长度不足 23 字节或类型标记不符时返回 `None`；超出部分忽略。
pub fn decode_ibeacon(payload: &[u8]) -> Option<DecodedBeacon> {
    if payload.len() < IBEACON_FRAME_LEN {
        return None;
    }
    if payload[0] != IBEACON_TYPE || payload[1] != IBEACON_LENGTH {
        return None;
    }

    let mut buf = &payload[2..IBEACON_FRAME_LEN];
    let mut id = [0u8; 16];
    buf.copy_to_slice(&mut id);
    let major = buf.get_u16();
    let minor = buf.get_u16();
    let tx_power = buf.get_i8();

    Some(DecodedBeacon {
        beacon_type: IBEACON_TYPE,
        id: contracts::BeaconId::from_bytes(id),
        major,
        minor,
        tx_power,
    })
}

/// 解码广播：仅接受 Apple 厂商 ID 下的负载
pub fn decode_advertisement(advertisement: &RawAdvertisement) -> Option<DecodedBeacon> {
    if advertisement.manufacturer_id != APPLE_MANUFACTURER_ID {
        return None;
    }
    decode_ibeacon(&advertisement.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::BeaconId;
    use rand::Rng;

    fn green_id() -> BeaconId {
        "a495bb20-c5b1-4b44-b512-1370f02d74de".parse().unwrap()
    }

    #[test]
    fn test_decode_known_frame() {
        let mut payload = vec![0x02, 0x15];
        payload.extend_from_slice(green_id().as_bytes());
        payload.extend_from_slice(&[0x00, 0x46, 0x03, 0xe8, 0xc5]);

        let beacon = decode_ibeacon(&payload).unwrap();
        assert_eq!(beacon.id, green_id());
        assert_eq!(beacon.major, 70);
        assert_eq!(beacon.minor, 1000);
        assert_eq!(beacon.tx_power, -59);
        assert_eq!(beacon.beacon_type, IBEACON_TYPE);
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let beacon = DecodedBeacon {
            beacon_type: IBEACON_TYPE,
            id: green_id(),
            major: 65,
            minor: 1042,
            tx_power: 4,
        };
        let mut payload = beacon.to_payload().to_vec();
        payload.extend_from_slice(&[0xff, 0xff]);
        assert_eq!(decode_ibeacon(&payload), Some(beacon));
    }

    #[test]
    fn test_encoded_beacon_decodes_identically() {
        let mut rng = rand::rng();
        for _ in 0..32 {
            let mut id = [0u8; 16];
            rng.fill(&mut id[..]);
            let beacon = DecodedBeacon {
                beacon_type: IBEACON_TYPE,
                id: BeaconId::from_bytes(id),
                major: rng.random(),
                minor: rng.random(),
                tx_power: rng.random(),
            };
            assert_eq!(decode_ibeacon(&beacon.to_payload()), Some(beacon));
        }
    }

    #[test]
    fn test_short_payloads_not_recognized() {
        let mut rng = rand::rng();
        for len in 0..IBEACON_FRAME_LEN {
            let mut payload = vec![0u8; len];
            rng.fill(&mut payload[..]);
            if len >= 2 {
                payload[0] = IBEACON_TYPE;
                payload[1] = IBEACON_LENGTH;
            }
            assert!(decode_ibeacon(&payload).is_none(), "len {len} decoded");
        }
    }

    #[test]
    fn test_wrong_markers_not_recognized() {
        let mut rng = rand::rng();
        for _ in 0..64 {
            let mut payload = [0u8; IBEACON_FRAME_LEN];
            rng.fill(&mut payload[..]);
            if payload[0] == IBEACON_TYPE && payload[1] == IBEACON_LENGTH {
                payload[1] = 0x16;
            }
            assert!(decode_ibeacon(&payload).is_none());
        }
    }

    #[test]
    fn test_other_manufacturer_ignored() {
        let beacon = DecodedBeacon {
            beacon_type: IBEACON_TYPE,
            id: green_id(),
            major: 70,
            minor: 1000,
            tx_power: 0,
        };
        let apple = RawAdvertisement::apple(beacon.to_payload().to_vec());
        assert!(decode_advertisement(&apple).is_some());

        let other = RawAdvertisement {
            manufacturer_id: 0x018E,
            payload: apple.payload.clone(),
        };
        assert!(decode_advertisement(&other).is_none());
    }
}
