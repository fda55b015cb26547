//! # Dispatcher
//!
//! 读数分发模块。
//!
//! 负责：
//! - 消费 ingest 队列中的 `Reading`
//! - 按注册顺序 fan-out 到所有启用的 sinks
//! - 隔离失败和限流的 sink，不影响其他 sink 和后续循环

pub mod dispatcher;
pub mod error;
pub mod factory;
pub mod rate_limit;
pub mod registry;
pub mod sinks;

pub use contracts::{Reading, ReadingSink, SinkError};
pub use dispatcher::{CycleReport, DispatchState, Dispatcher, DispatcherConfig, SinkAttempt};
pub use error::DispatcherError;
pub use factory::{create_sink, create_sinks};
pub use rate_limit::{RateLimitedSink, RateLimiter};
pub use registry::{boxed, ErasedSink, SinkRegistry};
pub use sinks::{FileSink, LogSink, NetworkSink, PrometheusSink};
