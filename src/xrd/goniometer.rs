//! # 测角仪几何
//!
//! 仪器几何参数：波长、2θ 扫描范围、测角仪半径、发散狭缝、Soller 狭缝。
//! 波长以 nm 保存，命令行按惯例以 Å 输入。
//!
//! ## 依赖关系
//! - 被 `xrd/specimen.rs`, `xrd/marker.rs`, `xrd/project.rs` 使用

use serde::{Deserialize, Serialize};

/// 测角仪
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Goniometer {
    /// 波长（nm）
    pub wavelength: f64,
    /// 最小 2θ（度）
    pub min_2theta: f64,
    /// 最大 2θ（度）
    pub max_2theta: f64,
    /// 测角仪半径（cm）
    pub radius: f64,
    /// 发散狭缝角（度）
    pub divergence: f64,
    /// Soller 狭缝 1（度）
    pub soller1: f64,
    /// Soller 狭缝 2（度）
    pub soller2: f64,
}

impl Default for Goniometer {
    fn default() -> Self {
        Self {
            wavelength: 0.154056,
            min_2theta: 3.0,
            max_2theta: 45.0,
            radius: 24.0,
            divergence: 0.5,
            soller1: 2.3,
            soller2: 2.3,
        }
    }
}

impl Goniometer {
    /// 以 Å 为单位设置波长
    pub fn with_wavelength_angstrom(mut self, angstrom: f64) -> Self {
        self.wavelength = angstrom / 10.0;
        self
    }

    /// 合成 Soller 狭缝角 S
    pub fn soller_s(&self) -> f64 {
        ((self.soller1 / 2.0).powi(2) + (self.soller2 / 2.0).powi(2)).sqrt()
    }

    /// 两个 Soller 狭缝角之积
    pub fn soller_s1s2(&self) -> f64 {
        self.soller1 * self.soller2
    }

    /// 2θ（度）→ d 间距（nm），2θ 为 0 时返回 0
    pub fn nm_from_2t(&self, two_theta: f64) -> f64 {
        let sin_theta = (two_theta / 2.0).to_radians().sin();
        if sin_theta == 0.0 {
            return 0.0;
        }
        self.wavelength / (2.0 * sin_theta)
    }

    /// d 间距（nm）→ 2θ（度），无衍射解时返回 0
    pub fn two_theta_from_nm(&self, d: f64) -> f64 {
        if d <= 0.0 {
            return 0.0;
        }
        let ratio = self.wavelength / (2.0 * d);
        if ratio > 1.0 {
            return 0.0;
        }
        2.0 * ratio.asin().to_degrees()
    }

    /// 样品长度校正系数 L / (R · tan(divergence))
    pub fn length_ratio(&self, sample_length: f64) -> f64 {
        sample_length / (self.radius * self.divergence.to_radians().tan())
    }

    /// 合成 θ 网格（弧度）：`steps` 个点均匀覆盖 2θ 范围
    pub fn theta_grid(&self, steps: usize) -> Vec<f64> {
        let min_theta = (self.min_2theta * 0.5).to_radians();
        let max_theta = (self.max_2theta * 0.5).to_radians();
        if steps < 2 {
            return vec![min_theta; steps];
        }
        let delta = (max_theta - min_theta) / (steps - 1) as f64;
        (0..steps).map(|i| min_theta + delta * i as f64).collect()
    }
}
