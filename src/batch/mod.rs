//! # 批量文件处理
//!
//! 收集输入文件（单文件或目录 + glob 模式），在 rayon 线程池上逐个处理，
//! 汇总成功 / 跳过 / 失败数量。
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 使用
//! - 子模块: collector (walkdir + glob), runner (rayon + indicatif)

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchResult, BatchRunner, ProcessResult};
