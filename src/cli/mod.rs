//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `convert`: BIN → DAT 批量转换
//! - `peaks`: 实验图样峰检测与标记
//! - `calculate`: 计算项目中所有样品的理论图样与拟合指标
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: convert, peaks, calculate

pub mod calculate;
pub mod convert;
pub mod peaks;

use clap::{Parser, Subcommand};

/// pyxrd - 黏土矿物混合物 X 射线衍射图样分析工具
#[derive(Parser)]
#[command(name = "pyxrd")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "X-ray diffraction pattern analysis for clay mineral mixtures", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Convert binary BIN scans to two-column DAT files
    Convert(convert::ConvertArgs),

    /// Detect peaks in an experimental pattern and list them as markers
    Peaks(peaks::PeaksArgs),

    /// Calculate every specimen of a project and report fit statistics
    Calculate(calculate::CalculateArgs),
}

// ─────────────────────────────────────────────────────────────
// 辐射源
// ─────────────────────────────────────────────────────────────

/// 预定义辐射源波长 (Å)
pub fn get_predefined_wavelength(name: &str) -> Option<f64> {
    match name.to_lowercase().as_str() {
        "cu-ka" | "cuka" => Some(1.5418),
        "cu-ka1" | "cuka1" => Some(1.5406),
        "cu-ka2" | "cuka2" => Some(1.5444),
        "cu-kb1" | "cukb1" => Some(1.3922),
        "mo-ka" | "moka" => Some(0.7107),
        "mo-ka1" | "moka1" => Some(0.7093),
        "co-ka" | "coka" => Some(1.7903),
        "fe-ka" | "feka" => Some(1.9373),
        "cr-ka" | "crka" => Some(2.2910),
        _ => None,
    }
}

/// 解析波长输入（辐射源名称或以 Å 为单位的数值）
pub fn parse_wavelength(input: &str) -> Result<f64, String> {
    if let Some(wl) = get_predefined_wavelength(input) {
        return Ok(wl);
    }
    match input.parse::<f64>() {
        Ok(wl) if wl > 0.0 => Ok(wl),
        _ => Err(format!(
            "Invalid wavelength '{}'. Use a positive number in Å (e.g., 1.5406) or a name: cu-ka, cu-ka1, mo-ka, co-ka, fe-ka, cr-ka",
            input
        )),
    }
}
