//! # BIN 二进制格式解析器
//!
//! ## BIN 格式说明
//! ```text
//! 偏移 146  16 字节   样品名称（ASCII，以 NUL 填充）
//! 偏移 214  3 × f64   步长、最小 2θ、最大 2θ（小端）
//! 偏移 250  n × u16   强度计数（小端）
//! ```
//! 点数 `n = floor((max - min) / step)`，第 i 个点位于 `min + step·i`。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`, `models/xy_store.rs` 使用

use crate::error::{PyxrdError, Result};
use byteorder::{ByteOrder, LittleEndian};
use std::fs;
use std::path::Path;

const SAMPLE_OFFSET: usize = 146;
const SAMPLE_LEN: usize = 16;
const LIMITS_OFFSET: usize = 214;
const DATA_OFFSET: usize = 250;

/// 浮点步长计数的容差
const STEP_TOLERANCE: f64 = 1e-9;

/// 解析结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinPattern {
    pub sample: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// 解析 BIN 文件
pub fn parse_bin_file(path: &Path) -> Result<BinPattern> {
    let bytes = fs::read(path).map_err(|e| PyxrdError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_bin_bytes(&bytes)
}

/// 从字节内容解析 BIN 格式
pub fn parse_bin_bytes(bytes: &[u8]) -> Result<BinPattern> {
    if bytes.len() < LIMITS_OFFSET + 24 {
        return Err(corrupt(format!(
            "header too short ({} bytes, need {})",
            bytes.len(),
            LIMITS_OFFSET + 24
        )));
    }

    let step = LittleEndian::read_f64(&bytes[LIMITS_OFFSET..]);
    let min = LittleEndian::read_f64(&bytes[LIMITS_OFFSET + 8..]);
    let max = LittleEndian::read_f64(&bytes[LIMITS_OFFSET + 16..]);

    if !step.is_finite() || step <= 0.0 {
        return Err(corrupt(format!("invalid step size {}", step)));
    }
    if !min.is_finite() || !max.is_finite() {
        return Err(corrupt(format!("invalid range [{}, {}]", min, max)));
    }

    let n = point_count(step, min, max);
    let available = bytes.len().saturating_sub(DATA_OFFSET) / 2;
    if n > available {
        return Err(corrupt(format!(
            "expected {} data points, file truncated at {} bytes",
            n,
            bytes.len()
        )));
    }

    let end = DATA_OFFSET + 2 * n;
    let mut counts = vec![0u16; n];
    LittleEndian::read_u16_into(&bytes[DATA_OFFSET..end], &mut counts);

    Ok(BinPattern {
        sample: sample_name(bytes),
        x: (0..n).map(|i| min + step * i as f64).collect(),
        y: counts.into_iter().map(f64::from).collect(),
    })
}

/// 样品名称，从偏移 146 读取，去掉 NUL 与首尾空白
pub fn sample_name(bytes: &[u8]) -> String {
    let end = (SAMPLE_OFFSET + SAMPLE_LEN).min(bytes.len());
    if end <= SAMPLE_OFFSET {
        return String::new();
    }
    String::from_utf8_lossy(&bytes[SAMPLE_OFFSET..end])
        .trim_matches(char::from(0))
        .trim()
        .to_string()
}

fn point_count(step: f64, min: f64, max: f64) -> usize {
    let n = ((max - min) / step + STEP_TOLERANCE).floor();
    if n > 0.0 {
        n as usize
    } else {
        0
    }
}

fn corrupt(reason: String) -> PyxrdError {
    PyxrdError::CorruptInput {
        format: "bin".to_string(),
        reason,
    }
}

/// 写出 BIN 格式字节（测试用）
#[cfg(test)]
pub fn encode_bin(sample: &str, step: f64, min: f64, counts: &[u16]) -> Vec<u8> {
    let mut bytes = vec![0u8; DATA_OFFSET + 2 * counts.len()];
    let name = sample.as_bytes();
    let len = name.len().min(SAMPLE_LEN);
    bytes[SAMPLE_OFFSET..SAMPLE_OFFSET + len].copy_from_slice(&name[..len]);

    let max = min + step * counts.len() as f64;
    LittleEndian::write_f64(&mut bytes[LIMITS_OFFSET..], step);
    LittleEndian::write_f64(&mut bytes[LIMITS_OFFSET + 8..], min);
    LittleEndian::write_f64(&mut bytes[LIMITS_OFFSET + 16..], max);
    LittleEndian::write_u16_into(counts, &mut bytes[DATA_OFFSET..]);
    bytes
}
