//! # pyxrd 命令行入口
//!
//! ## 子命令
//! - `convert` - BIN → DAT 批量转换
//! - `peaks` - 实验图样峰检测
//! - `calculate` - 计算项目中所有样品并报告拟合指标
//!
//! ## 依赖关系
//! - 使用 `pyxrd::cli` 解析参数，`pyxrd::commands` 执行

use clap::Parser;
use pyxrd::cli::Cli;
use pyxrd::{commands, utils};

fn main() {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
