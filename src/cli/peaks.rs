//! # peaks 子命令 CLI 定义
//!
//! 对实验图样做峰检测，输出峰位标记表。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/peaks.rs`

use clap::{Args, ValueEnum};
use std::path::PathBuf;

use super::parse_wavelength;

/// 输入文件格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum InputFormat {
    /// Two-column text (.dat)
    Dat,
    /// Binary scan (.bin)
    Bin,
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Dat => write!(f, "dat"),
            InputFormat::Bin => write!(f, "bin"),
        }
    }
}

/// peaks 子命令参数
#[derive(Args, Debug)]
pub struct PeaksArgs {
    /// Experimental pattern (DAT or BIN)
    pub file: PathBuf,

    /// Input format (detected from the extension when omitted)
    #[arg(short, long, value_enum)]
    pub format: Option<InputFormat>,

    /// Peak threshold relative to the maximum intensity (auto-selected when omitted)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Largest threshold tried during auto-selection
    #[arg(long, default_value_t = 0.32)]
    pub max_threshold: f64,

    /// Number of thresholds tried during auto-selection
    #[arg(long, default_value_t = 20)]
    pub steps: usize,

    /// X-ray wavelength: radiation name (cu-ka1, mo-ka, ...) or value in Å
    #[arg(short, long, env = "PYXRD_WAVELENGTH", default_value = "cu-ka1", value_parser = parse_wavelength)]
    pub wavelength: f64,

    /// Export the markers to a CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
}
