//! # calculate 子命令 CLI 定义
//!
//! 加载项目，计算所有样品的理论图样并报告拟合指标。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/calculate.rs`

use clap::Args;
use std::path::PathBuf;

/// calculate 子命令参数
#[derive(Args, Debug)]
pub struct CalculateArgs {
    /// Project JSON file
    pub project: PathBuf,

    /// Number of 2θ points for specimens without experimental data
    #[arg(short, long, default_value_t = 2500)]
    pub steps: usize,

    /// Write calculated and residual patterns as DAT files into this directory
    #[arg(short, long)]
    pub export_dir: Option<PathBuf>,

    /// Write the fit statistics to a CSV file
    #[arg(long)]
    pub stats_csv: Option<PathBuf>,

    /// Save the project after calculation (to the given path, or in place with --save-in-place)
    #[arg(long, conflicts_with = "save_in_place")]
    pub save: Option<PathBuf>,

    /// Overwrite the input project file after calculation
    #[arg(long, default_value_t = false)]
    pub save_in_place: bool,
}
