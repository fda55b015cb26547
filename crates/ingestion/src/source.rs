//! Scan source abstraction
//!
//! A scan source produces `ScanEvent`s until told to stop. Events are
//! delivered through a callback so the source never sees the queue.

use std::sync::Arc;

use contracts::ScanEvent;

use crate::error::Result;
use crate::shutdown::StopSignal;

/// Callback invoked once per observed advertisement
pub type ScanEventCallback = Arc<dyn Fn(ScanEvent) + Send + Sync>;

/// Producer of raw advertisement events
///
/// `scan` returns only once the session is fully closed: for a live
/// radio that means the scan has been stopped on the adapter.
#[trait_variant::make(ScanSource: Send)]
pub trait LocalScanSource {
    /// Source name, used in logs
    fn name(&self) -> &str;

    /// Run until `stop` fires
    async fn scan(&mut self, callback: ScanEventCallback, stop: StopSignal) -> Result<()>;
}
