//! 模拟扫描源
//!
//! 无需蓝牙硬件，按固定间隔发出同一条 iBeacon 广播。

use std::time::Duration;

use contracts::{DecodedBeacon, RawAdvertisement, ScanEvent, IBEACON_TYPE};
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use crate::error::Result;
use crate::identity::SIMULATED_ID;
use crate::shutdown::StopSignal;
use crate::source::{ScanEventCallback, ScanSource};

/// 默认发送间隔
pub const DEFAULT_SYNTHETIC_INTERVAL: Duration = Duration::from_millis(250);

/// 模拟扫描源
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    interval: Duration,
    beacon: DecodedBeacon,
}

impl SyntheticSource {
    /// 使用保留的模拟设备标识创建
    ///
    /// 固定读数：70°F，比重 1.035。
    pub fn new(interval: Duration) -> Self {
        Self::with_beacon(interval, Self::default_beacon())
    }

    /// 使用自定义帧创建
    pub fn with_beacon(interval: Duration, beacon: DecodedBeacon) -> Self {
        Self {
            // tokio interval 不接受零周期
            interval: interval.max(Duration::from_millis(1)),
            beacon,
        }
    }

    /// 模拟设备的默认帧
    pub fn default_beacon() -> DecodedBeacon {
        DecodedBeacon {
            beacon_type: IBEACON_TYPE,
            id: SIMULATED_ID,
            major: 70,
            minor: 1035,
            tx_power: -59,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn event(&self) -> ScanEvent {
        ScanEvent {
            address: None,
            rssi: None,
            advertisement: RawAdvertisement::apple(self.beacon.to_payload().to_vec()),
        }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(DEFAULT_SYNTHETIC_INTERVAL)
    }
}

impl ScanSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn scan(&mut self, callback: ScanEventCallback, mut stop: StopSignal) -> Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(interval_ms = self.interval.as_millis() as u64, "synthetic source started");

        let mut emitted: u64 = 0;
        loop {
            tokio::select! {
                _ = stop.stopped() => break,
                _ = ticker.tick() => {
                    callback(self.event());
                    emitted += 1;
                    trace!(emitted, "synthetic advertisement emitted");
                }
            }
        }

        debug!(emitted, "synthetic source stopped");
        Ok(())
    }
}
