//! # DAT 文本格式解析器
//!
//! ## DAT 格式说明
//! ```text
//! Sample name            # 可选的首行标题
//! 5.000 1520.0           # 2θ 强度
//! 5.020 1498.5
//! ...
//! ```
//! 空行被忽略，其他每一行必须恰好包含两个数值。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`, `models/xy_store.rs` 使用

use crate::error::{PyxrdError, Result};
use std::fs;
use std::path::Path;

/// 解析结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatPattern {
    pub header: Option<String>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// 解析 DAT 文件
pub fn parse_dat_file(path: &Path, has_header: bool) -> Result<DatPattern> {
    let content = fs::read_to_string(path).map_err(|e| PyxrdError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_dat_content(&content, &path.display().to_string(), has_header)
}

/// 从字符串内容解析 DAT 格式
pub fn parse_dat_content(content: &str, source_name: &str, has_header: bool) -> Result<DatPattern> {
    let mut pattern = DatPattern::default();
    let mut lines = content.lines().enumerate();

    if has_header {
        if let Some((_, first)) = lines.next() {
            pattern.header = Some(first.trim().to_string());
        }
    }

    for (i, line) in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (x, y) = parse_pair(line).ok_or_else(|| PyxrdError::ParseError {
            format: "dat".to_string(),
            source_name: source_name.to_string(),
            line: i + 1,
            reason: format!("expected two numeric columns, got '{}'", line),
        })?;
        pattern.x.push(x);
        pattern.y.push(y);
    }

    Ok(pattern)
}

fn parse_pair(line: &str) -> Option<(f64, f64)> {
    let mut tokens = line.split_whitespace();
    let x = tokens.next()?.parse().ok()?;
    let y = tokens.next()?.parse().ok()?;
    match tokens.next() {
        Some(_) => None,
        None => Some((x, y)),
    }
}
