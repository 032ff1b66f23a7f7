//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `xrd/`, `models/`, `utils/`
//! - 子模块: convert, peaks, calculate

pub mod calculate;
pub mod convert;
pub mod peaks;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Convert(args) => convert::execute(args),
        Commands::Peaks(args) => peaks::execute(args),
        Commands::Calculate(args) => calculate::execute(args),
    }
}
