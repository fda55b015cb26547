//! 蓝牙扫描源（btleplug）
//!
//! 在指定适配器上启动被动扫描，只转发 Apple 厂商 ID 下的广播。
//! 停止时先在适配器上关闭扫描，再返回。

use btleplug::api::{Central as _, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use contracts::{RawAdvertisement, ScanEvent, APPLE_MANUFACTURER_ID};
use futures::StreamExt as _;
use tracing::{debug, info, instrument, warn};

use crate::error::{IngestionError, Result};
use crate::shutdown::StopSignal;
use crate::source::{ScanEventCallback, ScanSource};

const SOURCE_NAME: &str = "ble";

/// 蓝牙扫描源
#[derive(Debug, Clone)]
pub struct BleScanSource {
    adapter_index: usize,
}

impl BleScanSource {
    /// `adapter_index`: 系统适配器列表中的序号
    pub fn new(adapter_index: usize) -> Self {
        Self { adapter_index }
    }

    async fn open_adapter(&self) -> Result<Adapter> {
        let manager = Manager::new()
            .await
            .map_err(|e| IngestionError::scan(SOURCE_NAME, e))?;
        let adapters = manager
            .adapters()
            .await
            .map_err(|e| IngestionError::scan(SOURCE_NAME, e))?;
        adapters
            .into_iter()
            .nth(self.adapter_index)
            .ok_or(IngestionError::AdapterNotFound {
                index: self.adapter_index,
            })
    }
}

/// 查询外设的地址和信号强度；查询失败时仅保留标识
async fn describe(adapter: &Adapter, id: &PeripheralId) -> (String, Option<i16>) {
    let properties = match adapter.peripheral(id).await {
        Ok(peripheral) => peripheral.properties().await.ok().flatten(),
        Err(_) => None,
    };
    match properties {
        Some(p) => (p.address.to_string(), p.rssi),
        None => (format!("{id:?}"), None),
    }
}

impl ScanSource for BleScanSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    #[instrument(name = "ble_scan", skip_all, fields(adapter = self.adapter_index))]
    async fn scan(&mut self, callback: ScanEventCallback, mut stop: StopSignal) -> Result<()> {
        let adapter = self.open_adapter().await?;
        let mut events = adapter
            .events()
            .await
            .map_err(|e| IngestionError::scan(SOURCE_NAME, e))?;
        adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(|e| IngestionError::scan(SOURCE_NAME, e))?;
        info!("bluetooth scan started");

        loop {
            tokio::select! {
                _ = stop.stopped() => break,
                event = events.next() => match event {
                    Some(CentralEvent::ManufacturerDataAdvertisement { id, manufacturer_data }) => {
                        let Some(payload) = manufacturer_data.get(&APPLE_MANUFACTURER_ID) else {
                            continue;
                        };
                        let (address, rssi) = describe(&adapter, &id).await;
                        callback(ScanEvent {
                            address: Some(address),
                            rssi,
                            advertisement: RawAdvertisement::apple(payload.clone()),
                        });
                    }
                    Some(_) => {}
                    None => {
                        warn!("bluetooth event stream closed");
                        break;
                    }
                },
            }
        }

        adapter
            .stop_scan()
            .await
            .map_err(|e| IngestionError::scan(SOURCE_NAME, e))?;
        debug!("bluetooth scan stopped");
        Ok(())
    }
}
