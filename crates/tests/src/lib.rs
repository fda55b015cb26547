//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（无需蓝牙适配器）

#[cfg(test)]
mod contract_tests {
    use contracts::{BeaconId, TiltColor};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::RelayConfig::default();
        assert_eq!(TiltColor::Simulated.as_str(), "simulated");
    }

    #[test]
    fn test_identity_table_matches_wire_ids() {
        let table = ingestion::IdentityTable::standard();
        let green: BeaconId = "a495bb20-c5b1-4b44-b512-1370f02d74de".parse().unwrap();
        assert_eq!(table.color_of(&green), Some(TiltColor::Green));
        assert_eq!(table.id_of(TiltColor::Green), Some(green));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use contracts::{
        BeaconId, DecodedBeacon, RawAdvertisement, Reading, ReadingSink, RelayConfig, ScanEvent,
        SinkError, TiltColor, ValidityConfig, IBEACON_TYPE,
    };
    use dispatcher::{boxed, Dispatcher, DispatcherConfig, ErasedSink};
    use ingestion::{
        ingest_queue, stop_channel, EventOutcome, IdentityTable, IngestionPipeline,
        QueueConsumer, ReadingBuilder, RemoveOutcome, SyntheticSource,
    };

    type Received = Arc<Mutex<Vec<Reading>>>;

    /// Sink that records every reading, optionally failing every update
    struct CollectingSink {
        name: String,
        fail: bool,
        received: Received,
    }

    impl CollectingSink {
        fn boxed(name: &str, fail: bool) -> (Box<dyn ErasedSink>, Received) {
            let received = Received::default();
            let sink = Self {
                name: name.to_string(),
                fail,
                received: Arc::clone(&received),
            };
            (boxed(sink), received)
        }
    }

    impl ReadingSink for CollectingSink {
        fn name(&self) -> &str {
            &self.name
        }

        fn enabled(&self) -> bool {
            true
        }

        async fn start(&mut self) -> Result<Option<String>, SinkError> {
            Ok(None)
        }

        async fn update(&mut self, reading: &Reading) -> Result<(), SinkError> {
            self.received.lock().unwrap().push(reading.clone());
            if self.fail {
                Err(SinkError::failed(&self.name, "backend unavailable"))
            } else {
                Ok(())
            }
        }
    }

    fn event(id: BeaconId, major: u16, minor: u16) -> ScanEvent {
        let beacon = DecodedBeacon {
            beacon_type: IBEACON_TYPE,
            id,
            major,
            minor,
            tx_power: -59,
        };
        ScanEvent {
            address: None,
            rssi: None,
            advertisement: RawAdvertisement::apple(beacon.to_payload().to_vec()),
        }
    }

    fn known_id() -> BeaconId {
        ingestion::IdentityTable::standard()
            .id_of(TiltColor::Orange)
            .unwrap()
    }

    fn pipeline(capacity: usize) -> (IngestionPipeline, QueueConsumer) {
        let (producer, consumer) = ingest_queue(capacity);
        let builder =
            ReadingBuilder::new(Arc::new(IdentityTable::standard()), ValidityConfig::default());
        (IngestionPipeline::new(builder, producer), consumer)
    }

    fn fast_config() -> DispatcherConfig {
        DispatcherConfig {
            idle_sleep: Duration::ZERO,
            remove_wait: Duration::from_millis(10),
            time_budget: None,
            console_log: false,
        }
    }

    async fn wait_until(received: &Received, count: usize) {
        for _ in 0..200 {
            if received.lock().unwrap().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// 已知标识符：解码 -> 入队 -> 唯一 sink 恰好调用一次
    #[tokio::test]
    async fn test_known_device_reaches_sink_once() {
        let (ingestion, consumer) = pipeline(3);

        // 02 15 <id> 00 46 03 e8 c5
        let outcome = ingestion.handle_event(&event(known_id(), 70, 1000));
        assert_eq!(outcome, EventOutcome::Queued);

        let (sink, received) = CollectingSink::boxed("always_ok", false);
        let dispatcher = Dispatcher::start(fast_config(), vec![sink], consumer).await;
        let (stop, signal) = stop_channel();
        let handle = dispatcher.spawn(signal);

        wait_until(&received, 1).await;
        // no more readings arrive; give the loop a few empty polls
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.stop();
        let summary = handle.await.unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].color(), TiltColor::Orange);
        assert_eq!(received[0].temp_fahrenheit(), 70.0);
        assert!((received[0].gravity() - 1.000).abs() < 1e-9);
        assert_eq!(summary.readings_dispatched, 1);
    }

    /// 未知标识符：不入队，sink 不被调用
    #[tokio::test]
    async fn test_unknown_device_never_dispatched() {
        let (ingestion, consumer) = pipeline(3);
        let stranger: BeaconId = "00000000-0000-0000-0000-000000000001".parse().unwrap();

        assert_eq!(
            ingestion.handle_event(&event(stranger, 70, 1000)),
            EventOutcome::UnknownDevice
        );
        assert!(consumer.is_empty());

        let (sink, received) = CollectingSink::boxed("always_ok", false);
        let dispatcher = Dispatcher::start(fast_config(), vec![sink], consumer).await;
        let (stop, signal) = stop_channel();
        let handle = dispatcher.spawn(signal);

        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.stop();
        let summary = handle.await.unwrap();

        assert!(received.lock().unwrap().is_empty());
        assert_eq!(summary.readings_dispatched, 0);
        assert_eq!(ingestion.metrics().snapshot().unknown_devices, 1);
    }

    /// 容量为 1：保留第一条，丢弃第二条，不报错
    #[tokio::test]
    async fn test_capacity_one_keeps_first() {
        let (ingestion, consumer) = pipeline(1);

        assert_eq!(
            ingestion.handle_event(&event(known_id(), 65, 1050)),
            EventOutcome::Queued
        );
        assert_eq!(
            ingestion.handle_event(&event(known_id(), 66, 1049)),
            EventOutcome::Dropped
        );
        assert_eq!(consumer.len(), 1);

        match consumer.remove(Duration::from_millis(10)).await {
            RemoveOutcome::Reading(reading) => assert_eq!(reading.temp_fahrenheit(), 65.0),
            other => panic!("expected the first reading, got {other:?}"),
        }
        assert!(matches!(
            consumer.remove(Duration::from_millis(10)).await,
            RemoveOutcome::Empty
        ));

        let snapshot = ingestion.metrics().snapshot();
        assert_eq!(snapshot.readings_queued, 1);
        assert_eq!(snapshot.readings_dropped, 1);
    }

    /// 第一个 sink 失败，第二个 sink 仍收到读数，循环继续
    #[tokio::test]
    async fn test_failing_sink_does_not_block_next() {
        let (ingestion, consumer) = pipeline(3);
        let (failing, failing_seen) = CollectingSink::boxed("flaky", true);
        let (healthy, healthy_seen) = CollectingSink::boxed("healthy", false);

        let dispatcher = Dispatcher::start(fast_config(), vec![failing, healthy], consumer).await;
        let (stop, signal) = stop_channel();
        let handle = dispatcher.spawn(signal);

        ingestion.handle_event(&event(known_id(), 68, 1012));
        wait_until(&healthy_seen, 1).await;
        ingestion.handle_event(&event(known_id(), 69, 1011));
        wait_until(&healthy_seen, 2).await;

        stop.stop();
        let summary = handle.await.unwrap();

        assert_eq!(failing_seen.lock().unwrap().len(), 2);
        assert_eq!(healthy_seen.lock().unwrap().len(), 2);
        assert_eq!(summary.readings_dispatched, 2);
        assert_eq!(summary.sinks["flaky"].failures, 2);
        assert_eq!(summary.sinks["healthy"].successes, 2);
    }

    /// 超出有效范围的读数在入队前被丢弃
    #[tokio::test]
    async fn test_out_of_range_discarded_before_queue() {
        let (ingestion, consumer) = pipeline(3);

        let outcome = ingestion.handle_event(&event(known_id(), 250, 1000));
        assert!(matches!(outcome, EventOutcome::Invalid(_)));
        assert!(consumer.is_empty());
    }

    /// Synthetic source -> queue -> dispatcher, driven by a config file body
    #[tokio::test]
    async fn test_synthetic_run_from_config() {
        let config: RelayConfig = config_loader::ConfigLoader::load_from_str(
            r#"
[queue]
capacity = 2
remove_wait_ms = 10
idle_sleep_ms = 0

[dispatch]
console_log = false

[devices.simulated]
name = "Test Batch"
original_gravity = 1.050
"#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let (producer, consumer) = ingest_queue(config.queue.capacity);
        let builder = ReadingBuilder::new(Arc::new(IdentityTable::standard()), config.validity)
            .with_profiles(config.devices.clone());
        let ingestion = IngestionPipeline::new(builder, producer);

        let (sink, received) = CollectingSink::boxed("collector", false);
        let dispatcher = Dispatcher::start(
            DispatcherConfig::from_settings(&config.queue, &config.dispatch),
            vec![sink],
            consumer,
        )
        .await;
        let (stop, signal) = stop_channel();
        let handle = dispatcher.spawn(signal.clone());

        let scan_signal = signal.clone();
        let scan_pipeline = ingestion.clone();
        let scan = tokio::spawn(async move {
            let mut source = SyntheticSource::new(Duration::from_millis(5));
            scan_pipeline.run(&mut source, scan_signal).await
        });

        wait_until(&received, 3).await;
        stop.stop();
        scan.await.unwrap().unwrap();
        handle.await.unwrap();

        let received = received.lock().unwrap();
        assert!(received.len() >= 3);
        let first = &received[0];
        assert_eq!(first.color(), TiltColor::Simulated);
        assert_eq!(first.name(), "Test Batch");
        assert_eq!(first.temp_fahrenheit(), 70.0);
        assert!(first.alcohol_by_volume().is_some());
    }
}
