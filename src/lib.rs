//! # pyxrd - 黏土矿物混合物 X 射线衍射图样分析
//!
//! 可观察的列表数据模型、样品计算管线与拟合统计。
//!
//! ## 依赖关系
//! ```text
//! lib.rs
//!   ├── models/     (可观察容器：ObjectListStore, IndexListStore, XYListStore)
//!   ├── parsers/    (DAT / BIN 实验数据解析)
//!   ├── xrd/        (测角仪、物相、样品计算管线、峰检测、统计、项目)
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   ├── batch/      (批量文件处理)
//!   ├── utils/      (输出与进度条)
//!   └── error.rs    (错误处理)
//! ```

pub mod batch;
pub mod cli;
pub mod commands;
pub mod error;
pub mod models;
pub mod parsers;
pub mod utils;
pub mod xrd;

pub use error::{PyxrdError, Result};
