//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 扫描会话启动或运行失败
    #[error("scan source {source_name} failed: {message}")]
    Scan {
        /// 扫描源名称
        source_name: String,
        /// 错误消息
        message: String,
    },

    /// 找不到蓝牙适配器
    #[error("no bluetooth adapter at index {index}")]
    AdapterNotFound {
        /// 适配器序号
        index: usize,
    },
}

impl IngestionError {
    pub fn scan(source_name: impl Into<String>, message: impl ToString) -> Self {
        Self::Scan {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }
}

impl From<IngestionError> for contracts::ContractError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::Scan {
                source_name,
                message,
            } => contracts::ContractError::scan(source_name, message),
            other => contracts::ContractError::Other(other.to_string()),
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
