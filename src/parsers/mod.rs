//! # 解析器模块
//!
//! 提供实验衍射图样文件（DAT 文本、BIN 二进制）的解析器。
//!
//! ## 依赖关系
//! - 被 `models/xy_store.rs`, `xrd/specimen.rs`, `batch/` 使用
//! - 子模块: dat, bin

pub mod bin;
pub mod dat;

use crate::error::{PyxrdError, Result};
use std::fmt;
use std::path::Path;

/// 实验数据文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Dat,
    Bin,
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFormat::Dat => write!(f, "DAT"),
            DataFormat::Bin => write!(f, "BIN"),
        }
    }
}

/// 从文件扩展名推断格式
pub fn detect_format(path: &Path) -> Result<DataFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "dat" | "txt" | "xy" => Ok(DataFormat::Dat),
        "bin" | "raw" => Ok(DataFormat::Bin),
        _ => Err(PyxrdError::UnsupportedFormat(format!(
            "Cannot determine format for: {}",
            path.display()
        ))),
    }
}
