//! SinkRegistry - ordered list of enabled sinks
//!
//! Membership and order are fixed once `start` returns.

use futures::future::BoxFuture;
use tracing::{info, instrument, warn};

use contracts::{Reading, ReadingSink, SinkError};

/// Object-safe view of a [`ReadingSink`]
///
/// Lets the registry hold heterogeneous sinks behind one pointer type.
pub trait ErasedSink: Send {
    fn name(&self) -> &str;
    fn enabled(&self) -> bool;
    fn start(&mut self) -> BoxFuture<'_, Result<Option<String>, SinkError>>;
    fn update<'a>(&'a mut self, reading: &'a Reading) -> BoxFuture<'a, Result<(), SinkError>>;
}

impl<S: ReadingSink + Send> ErasedSink for S {
    fn name(&self) -> &str {
        ReadingSink::name(self)
    }

    fn enabled(&self) -> bool {
        ReadingSink::enabled(self)
    }

    fn start(&mut self) -> BoxFuture<'_, Result<Option<String>, SinkError>> {
        Box::pin(ReadingSink::start(self))
    }

    fn update<'a>(&'a mut self, reading: &'a Reading) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(ReadingSink::update(self, reading))
    }
}

/// Box a concrete sink for the registry
pub fn boxed<S: ReadingSink + Send + 'static>(sink: S) -> Box<dyn ErasedSink> {
    Box::new(sink)
}

/// Enabled sinks in registration order
pub struct SinkRegistry {
    sinks: Vec<Box<dyn ErasedSink>>,
}

impl SinkRegistry {
    /// Evaluate `enabled()` once per sink, then start the enabled ones
    ///
    /// A sink whose start fails stays registered; the failure is logged.
    #[instrument(name = "sink_registry_start", skip(candidates), fields(candidates = candidates.len()))]
    pub async fn start(candidates: Vec<Box<dyn ErasedSink>>) -> Self {
        let mut sinks = Vec::with_capacity(candidates.len());
        for mut sink in candidates {
            if !sink.enabled() {
                info!(sink = %sink.name(), "sink disabled, skipping");
                continue;
            }
            match sink.start().await {
                Ok(Some(status)) => info!("started: {} {}", sink.name(), status),
                Ok(None) => info!("started: {}", sink.name()),
                Err(e) => warn!(sink = %sink.name(), error = %e, "sink failed to start"),
            }
            sinks.push(sink);
        }

        info!(enabled = sinks.len(), "sink registry ready");
        Self { sinks }
    }

    /// Sink names in dispatch order
    pub fn names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn ErasedSink>> {
        self.sinks.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct StartCountingSink {
        name: String,
        enabled: bool,
        fail_start: bool,
        starts: Arc<AtomicU32>,
    }

    impl StartCountingSink {
        fn new(name: &str, enabled: bool, starts: &Arc<AtomicU32>) -> Self {
            Self {
                name: name.to_string(),
                enabled,
                fail_start: false,
                starts: Arc::clone(starts),
            }
        }
    }

    impl ReadingSink for StartCountingSink {
        fn name(&self) -> &str {
            &self.name
        }

        fn enabled(&self) -> bool {
            self.enabled
        }

        async fn start(&mut self) -> Result<Option<String>, SinkError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                return Err(SinkError::failed(&self.name, "no route"));
            }
            Ok(Some("ready".into()))
        }

        async fn update(&mut self, _reading: &Reading) -> Result<(), SinkError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_disabled_sinks_are_not_started() {
        let starts = Arc::new(AtomicU32::new(0));
        let registry = SinkRegistry::start(vec![
            boxed(StartCountingSink::new("a", true, &starts)),
            boxed(StartCountingSink::new("b", false, &starts)),
            boxed(StartCountingSink::new("c", true, &starts)),
        ])
        .await;

        assert_eq!(registry.names(), vec!["a", "c"]);
        assert_eq!(starts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_start_failure_keeps_sink() {
        let starts = Arc::new(AtomicU32::new(0));
        let mut failing = StartCountingSink::new("flaky", true, &starts);
        failing.fail_start = true;

        let registry = SinkRegistry::start(vec![boxed(failing)]).await;
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}
