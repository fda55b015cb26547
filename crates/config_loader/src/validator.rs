//! 配置校验模块
//!
//! 校验规则：
//! - queue capacity / remove wait > 0
//! - 温度、比重范围为有限值且 min <= max
//! - sink 名称非空且唯一
//! - sink 必填参数齐全 (file: path, network: addr)
//! - original_gravity > 1.0

use std::collections::HashSet;
use std::net::SocketAddr;

use contracts::{ContractError, RelayConfig, SinkType};

/// 校验 RelayConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &RelayConfig) -> Result<(), ContractError> {
    validate_queue(config)?;
    validate_validity_ranges(config)?;
    validate_scan(config)?;
    validate_devices(config)?;
    validate_sinks(config)?;
    Ok(())
}

/// 校验队列配置
fn validate_queue(config: &RelayConfig) -> Result<(), ContractError> {
    if config.queue.capacity == 0 {
        return Err(ContractError::config_validation(
            "queue.capacity",
            "capacity must be > 0",
        ));
    }
    if config.queue.remove_wait_ms == 0 {
        return Err(ContractError::config_validation(
            "queue.remove_wait_ms",
            "remove_wait_ms must be > 0",
        ));
    }
    Ok(())
}

/// 校验有效范围
fn validate_validity_ranges(config: &RelayConfig) -> Result<(), ContractError> {
    let v = &config.validity;

    for (field, bound) in [
        ("validity.temp_min_f", v.temp_min_f),
        ("validity.temp_max_f", v.temp_max_f),
        ("validity.gravity_min", v.gravity_min),
        ("validity.gravity_max", v.gravity_max),
    ] {
        if !bound.is_finite() {
            return Err(ContractError::config_validation(
                field,
                format!("bound must be a finite number, got {bound}"),
            ));
        }
    }

    if v.temp_min_f > v.temp_max_f {
        return Err(ContractError::config_validation(
            "validity.temp_min_f / validity.temp_max_f",
            format!(
                "temp_min_f ({}) must be <= temp_max_f ({})",
                v.temp_min_f, v.temp_max_f
            ),
        ));
    }

    if v.gravity_min <= 0.0 {
        return Err(ContractError::config_validation(
            "validity.gravity_min",
            format!("gravity_min must be > 0, got {}", v.gravity_min),
        ));
    }

    if v.gravity_min > v.gravity_max {
        return Err(ContractError::config_validation(
            "validity.gravity_min / validity.gravity_max",
            format!(
                "gravity_min ({}) must be <= gravity_max ({})",
                v.gravity_min, v.gravity_max
            ),
        ));
    }

    Ok(())
}

fn validate_scan(config: &RelayConfig) -> Result<(), ContractError> {
    if config.scan.synthetic_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "scan.synthetic_interval_ms",
            "synthetic_interval_ms must be > 0",
        ));
    }
    Ok(())
}

/// 校验设备配置
fn validate_devices(config: &RelayConfig) -> Result<(), ContractError> {
    for (color, profile) in &config.devices {
        if let Some(og) = profile.original_gravity {
            if !(og.is_finite() && og > 1.0) {
                return Err(ContractError::config_validation(
                    format!("devices.{color}.original_gravity"),
                    format!("original_gravity must be > 1.0, got {og}"),
                ));
            }
        }
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(config: &RelayConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();

    for (idx, sink) in config.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }

        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }

        if let Some(limit) = sink.rate_limit_seconds {
            if limit.is_nan() || limit < 0.0 {
                return Err(ContractError::config_validation(
                    format!("sinks[{}].rate_limit_seconds", sink.name),
                    format!("rate_limit_seconds must be >= 0, got {limit}"),
                ));
            }
        }

        match sink.sink_type {
            SinkType::File if !sink.params.contains_key("path") => {
                return Err(ContractError::config_validation(
                    format!("sinks[{}].params.path", sink.name),
                    "file sink requires 'path'",
                ));
            }
            SinkType::Network => {
                let addr = sink.params.get("addr").ok_or_else(|| {
                    ContractError::config_validation(
                        format!("sinks[{}].params.addr", sink.name),
                        "network sink requires 'addr'",
                    )
                })?;
                addr.parse::<SocketAddr>().map_err(|e| {
                    ContractError::config_validation(
                        format!("sinks[{}].params.addr", sink.name),
                        format!("invalid address '{addr}': {e}"),
                    )
                })?;
            }
            _ => {}
        }
    }
    Ok(())
}
