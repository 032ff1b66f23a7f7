//! # XRD 计算模块
//!
//! 样品计算管线：测角仪几何、物相模型、理论图样计算、峰检测、
//! 排除区间与拟合统计。
//!
//! ## 子模块
//! - `goniometer`: 仪器几何
//! - `phase`: 物相模型接口与反射物相
//! - `pattern`: 带粗粒度更新信号的图样
//! - `marker`: 峰位标记
//! - `exclusion`: 排除区间
//! - `peaks`: 峰检测与阈值选择
//! - `statistics`: 拟合优度
//! - `specimen`: 样品与计算管线
//! - `project`: 项目
//! - `export`: 数据导出
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/`, `parsers/`

pub mod exclusion;
pub mod export;
pub mod goniometer;
pub mod marker;
pub mod pattern;
pub mod peaks;
pub mod phase;
pub mod project;
pub mod specimen;
pub mod statistics;

pub use goniometer::Goniometer;
pub use marker::Marker;
pub use pattern::Pattern;
pub use peaks::ThresholdSelector;
pub use phase::{PhaseModel, Reflection, ReflectionPhase};
pub use project::Project;
pub use specimen::{CalculationState, PatternSource, Specimen};
pub use statistics::{FitStatistics, Statistics};
