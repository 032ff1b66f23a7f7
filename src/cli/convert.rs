//! # convert 子命令 CLI 定义
//!
//! 批量将 BIN 二进制扫描转换为两列 DAT 文本。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/convert.rs`

use clap::Args;
use std::path::PathBuf;

/// convert 子命令参数
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input BIN file or directory
    pub input: PathBuf,

    /// Output directory for DAT files
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Recurse into subdirectories
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Glob pattern(s) for input files, comma separated
    #[arg(short, long, default_value = "*.bin,*.BIN,*.raw,*.RAW")]
    pub pattern: String,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Overwrite existing output files
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}
