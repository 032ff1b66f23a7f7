//! # 拟合优度统计
//!
//! 比较实验与计算图样（排除区间之外的点）：残差序列、χ²、Rp、R²。
//! 统计对象订阅两个图样的 `updated` 信号以及排除区间的变更，
//! 任何一方变化都会同步重新计算。
//!
//! ## 指标
//! - χ² = Σ (o − e)² / e（o == e 的项记为 0）
//! - Rp = 100 · Σ|o − e| / Σ|o|
//! - R² = 1 − SSerr / SStot
//!
//! 分母为 0 时：分子也为 0 则 Rp = 0、R² = 1，否则 Rp = ∞、R² = −∞。
//!
//! ## 依赖关系
//! - 被 `xrd/specimen.rs`, `commands/calculate.rs` 使用
//! - 使用 `xrd/pattern.rs`, `xrd/exclusion.rs`

use crate::error::{PyxrdError, Result};
use crate::models::signal::{Signal, SlotId};
use crate::models::xy_store::XYListStore;
use crate::xrd::exclusion::exclusion_xy;
use crate::xrd::pattern::Pattern;

use std::cell::Cell;
use std::rc::{Rc, Weak};

/// 拟合指标
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FitStatistics {
    pub points: usize,
    pub chi2: f64,
    pub rp: f64,
    pub r2: f64,
}

/// 响应式统计对象
pub struct Statistics {
    experimental: Rc<Pattern>,
    calculated: Rc<Pattern>,
    exclusions: Rc<XYListStore>,
    residual: Rc<Pattern>,
    values: Cell<FitStatistics>,
    updated: Signal<FitStatistics>,
    slots: [SlotId; 3],
}

impl Statistics {
    pub fn new(
        experimental: Rc<Pattern>,
        calculated: Rc<Pattern>,
        exclusions: Rc<XYListStore>,
    ) -> Rc<Self> {
        let stats = Rc::new_cyclic(|weak: &Weak<Statistics>| {
            let on_exp = refresh_slot(weak.clone());
            let on_calc = refresh_slot(weak.clone());
            let w = weak.clone();
            let slots = [
                experimental.connect_updated(move |_| on_exp()),
                calculated.connect_updated(move |_| on_calc()),
                exclusions.connect(move |_| {
                    if let Some(stats) = w.upgrade() {
                        stats.refresh();
                    }
                }),
            ];
            Statistics {
                experimental,
                calculated,
                exclusions,
                residual: Pattern::new("Residual Data"),
                values: Cell::new(FitStatistics::default()),
                updated: Signal::new(),
                slots,
            }
        });
        stats.refresh();
        stats
    }

    pub fn values(&self) -> FitStatistics {
        self.values.get()
    }

    pub fn points(&self) -> usize {
        self.values.get().points
    }

    pub fn chi2(&self) -> f64 {
        self.values.get().chi2
    }

    pub fn rp(&self) -> f64 {
        self.values.get().rp
    }

    pub fn r2(&self) -> f64 {
        self.values.get().r2
    }

    /// 残差序列（实验 − 计算，位于实验 x 位置）
    pub fn residual(&self) -> &Rc<Pattern> {
        &self.residual
    }

    pub fn connect<F>(&self, slot: F) -> SlotId
    where
        F: Fn(&FitStatistics) + 'static,
    {
        self.updated.connect(slot)
    }

    pub fn disconnect(&self, id: SlotId) -> bool {
        self.updated.disconnect(id)
    }

    /// 重新计算所有指标
    ///
    /// 任一过滤后的序列为空时指标归零，不视为错误；
    /// 两个序列点数不一致时返回 `ShapeMismatch`。
    pub fn update(&self) -> Result<FitStatistics> {
        let ((ex, ey), (_, cy)) = exclusion_xy(&self.experimental, &self.calculated, &self.exclusions);

        if ey.is_empty() || cy.is_empty() {
            self.reset();
            return Ok(FitStatistics::default());
        }
        if ey.len() != cy.len() {
            self.reset();
            return Err(PyxrdError::ShapeMismatch {
                left: ey.len(),
                right: cy.len(),
            });
        }

        let residual: Vec<f64> = ey.iter().zip(cy.iter()).map(|(o, e)| o - e).collect();
        self.residual.set_data(&ex, &residual)?;

        let (rp, r2) = rp_r2(&ey, &cy);
        let values = FitStatistics {
            points: ey.len(),
            chi2: chi_square(&ey, &cy),
            rp,
            r2,
        };
        self.values.set(values);
        self.updated.emit(&values);
        Ok(values)
    }

    fn refresh(&self) {
        if let Err(e) = self.update() {
            log::warn!("Statistics not updated: {}", e);
        }
    }

    fn reset(&self) {
        self.residual.clear();
        self.values.set(FitStatistics::default());
        self.updated.emit(&FitStatistics::default());
    }
}

impl Drop for Statistics {
    fn drop(&mut self) {
        self.experimental.disconnect_updated(self.slots[0]);
        self.calculated.disconnect_updated(self.slots[1]);
        self.exclusions.disconnect(self.slots[2]);
    }
}

fn refresh_slot(weak: Weak<Statistics>) -> impl Fn() {
    move || {
        if let Some(stats) = weak.upgrade() {
            stats.refresh();
        }
    }
}

/// Pearson χ²
pub fn chi_square(observed: &[f64], expected: &[f64]) -> f64 {
    observed
        .iter()
        .zip(expected.iter())
        .filter(|(o, e)| o != e)
        .map(|(o, e)| (o - e).powi(2) / e)
        .sum()
}

/// Rp（%）与 R²
pub fn rp_r2(observed: &[f64], expected: &[f64]) -> (f64, f64) {
    let n = observed.len() as f64;
    let avg = observed.iter().sum::<f64>() / n;

    let abs_diff: f64 = observed.iter().zip(expected).map(|(o, e)| (o - e).abs()).sum();
    let abs_obs: f64 = observed.iter().map(|o| o.abs()).sum();
    let ss_err: f64 = observed.iter().zip(expected).map(|(o, e)| (o - e).powi(2)).sum();
    let ss_tot: f64 = observed.iter().map(|o| (o - avg).powi(2)).sum();

    let rp = 100.0 * safe_ratio(abs_diff, abs_obs);
    let r2 = 1.0 - safe_ratio(ss_err, ss_tot);
    (rp, r2)
}

fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator != 0.0 {
        numerator / denominator
    } else if numerator == 0.0 {
        0.0
    } else {
        f64::INFINITY
    }
}
