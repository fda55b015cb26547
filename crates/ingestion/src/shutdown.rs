//! 停止信号
//!
//! 基于 `tokio::sync::watch`：一个 `StopHandle` 触发，任意多个 `StopSignal` 观察。
//! 句柄被丢弃也视为停止。

use tokio::sync::watch;

/// 创建停止信号对
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

/// 触发端
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    /// 请求停止（幂等）
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    /// 新建观察端
    pub fn signal(&self) -> StopSignal {
        StopSignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

/// 观察端
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// 是否已请求停止
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// 等待停止请求
    pub async fn stopped(&mut self) {
        // wait_for 在发送端丢弃时返回 Err，同样视为停止
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}
