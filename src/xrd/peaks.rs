//! # 峰检测与阈值选择
//!
//! ## 峰检测
//! 带前瞻窗口的极值检测：沿序列追踪当前最大 / 最小值，当数值回落超过
//! `delta` 且前瞻窗口内没有更大（更小）的值时，确认一个峰（谷）。
//! 第一个确认的极值总是序列起点附近的伪峰，被丢弃。
//!
//! ## 阈值选择
//! 在 `[0, max_threshold]` 上取 `steps` 个阈值，记录每个阈值检测到的峰数；
//! 从前 4 个点开始扩大线性回归窗口，直到 |R| < 0.95，以回归直线与
//! x 轴的交点作为自动选择的阈值。
//!
//! 阈值是相对量：实际的 `delta` 为阈值乘以序列的最大强度。
//!
//! ## 依赖关系
//! - 被 `xrd/specimen.rs`, `commands/peaks.rs` 使用

use crate::error::{PyxrdError, Result};

/// 自动加峰使用的前瞻窗口
pub const DEFAULT_LOOKAHEAD: usize = 5;

/// (x, y) 极值列表
pub type PeakTable = Vec<(f64, f64)>;

/// 检测峰与谷，返回 `(maxima, minima)`
pub fn peakdetect(y: &[f64], x: &[f64], lookahead: usize, delta: f64) -> Result<(PeakTable, PeakTable)> {
    if x.len() != y.len() {
        return Err(PyxrdError::ShapeMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    if lookahead < 1 {
        return Err(PyxrdError::InvalidArgument(
            "lookahead must be at least 1".to_string(),
        ));
    }
    if !(delta >= 0.0) || !delta.is_finite() {
        return Err(PyxrdError::InvalidArgument(format!(
            "delta must be a non-negative number, got {}",
            delta
        )));
    }

    let length = y.len();
    let mut maxima = Vec::new();
    let mut minima = Vec::new();
    let mut first_is_max: Option<bool> = None;

    let mut mx = f64::NEG_INFINITY;
    let mut mn = f64::INFINITY;
    let mut mx_pos = 0.0;
    let mut mn_pos = 0.0;

    let scan = length.saturating_sub(lookahead);
    for index in 0..scan {
        let (xv, yv) = (x[index], y[index]);
        if yv > mx {
            mx = yv;
            mx_pos = xv;
        }
        if yv < mn {
            mn = yv;
            mn_pos = xv;
        }

        let window = &y[index..index + lookahead];

        if yv < mx - delta && mx != f64::INFINITY {
            let window_max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if window_max < mx {
                maxima.push((mx_pos, mx));
                first_is_max.get_or_insert(true);
                mx = f64::INFINITY;
                mn = f64::INFINITY;
                if index + lookahead >= length {
                    break;
                }
                continue;
            }
        }

        if yv > mn + delta && mn != f64::NEG_INFINITY {
            let window_min = window.iter().copied().fold(f64::INFINITY, f64::min);
            if window_min > mn {
                minima.push((mn_pos, mn));
                first_is_max.get_or_insert(false);
                mn = f64::NEG_INFINITY;
                mx = f64::NEG_INFINITY;
                if index + lookahead >= length {
                    break;
                }
            }
        }
    }

    match first_is_max {
        Some(true) => {
            maxima.remove(0);
        }
        Some(false) => {
            minima.remove(0);
        }
        None => {}
    }

    Ok((maxima, minima))
}

/// 对多个 delta 依次检测
pub fn multi_peakdetect(
    y: &[f64],
    x: &[f64],
    lookahead: usize,
    deltas: &[f64],
) -> Result<Vec<(PeakTable, PeakTable)>> {
    deltas
        .iter()
        .map(|&delta| peakdetect(y, x, lookahead, delta))
        .collect()
}

/// 将相对阈值换算为绝对 delta
pub fn absolute_delta(y: &[f64], threshold: f64) -> f64 {
    let max = y.iter().copied().filter(|v| v.is_finite()).fold(0.0, f64::max);
    threshold * max
}

/// 线性回归结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
}

/// 最小二乘线性回归，x 方差为 0 时斜率为 0，相关系数在退化情况下为 0
pub fn linregress(x: &[f64], y: &[f64]) -> LinearFit {
    let n = x.len().min(y.len()) as f64;
    if n == 0.0 {
        return LinearFit {
            slope: 0.0,
            intercept: 0.0,
            r: 0.0,
        };
    }
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    let slope = if sxx != 0.0 { sxy / sxx } else { 0.0 };
    let r_den = (sxx * syy).sqrt();
    let r = if r_den != 0.0 {
        (sxy / r_den).clamp(-1.0, 1.0)
    } else {
        0.0
    };
    LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
        r,
    }
}

/// 阈值扫描与自动选择
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdSelector {
    max_threshold: f64,
    steps: usize,
    sel_threshold: f64,
    sel_num_peaks: usize,
    deltas: Vec<f64>,
    num_peaks: Vec<f64>,
}

impl Default for ThresholdSelector {
    fn default() -> Self {
        Self {
            max_threshold: 0.32,
            steps: 20,
            sel_threshold: 0.1,
            sel_num_peaks: 0,
            deltas: Vec::new(),
            num_peaks: Vec::new(),
        }
    }
}

impl ThresholdSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_threshold(&self) -> f64 {
        self.max_threshold
    }

    /// 设置最大阈值，限制在 [0, 1]
    pub fn set_max_threshold(&mut self, value: f64) {
        self.max_threshold = value.clamp(0.0, 1.0);
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// 设置扫描步数，限制在 [3, 50]
    pub fn set_steps(&mut self, value: usize) {
        self.steps = value.clamp(3, 50);
    }

    pub fn sel_threshold(&self) -> f64 {
        self.sel_threshold
    }

    pub fn sel_num_peaks(&self) -> usize {
        self.sel_num_peaks
    }

    /// 扫描结果 `(阈值, 峰数)`
    pub fn threshold_plot_data(&self) -> (&[f64], &[f64]) {
        (&self.deltas, &self.num_peaks)
    }

    /// 手动选择阈值，并按扫描结果插值出对应的峰数
    pub fn set_sel_threshold(&mut self, value: f64) {
        self.sel_threshold = value;
        self.sel_num_peaks = interpolate_clamped(&self.deltas, &self.num_peaks, value).max(0.0) as usize;
    }

    /// 对给定序列执行阈值扫描并自动选择阈值
    pub fn update(&mut self, x: &[f64], y: &[f64]) -> Result<()> {
        self.deltas.clear();
        self.num_peaks.clear();
        if x.len() < 2 {
            self.sel_num_peaks = 0;
            return Ok(());
        }

        let factor = self.max_threshold / (self.steps - 1) as f64;
        self.deltas = (0..self.steps).map(|i| i as f64 * factor).collect();

        let scale = absolute_delta(y, 1.0);
        let absolute: Vec<f64> = self.deltas.iter().map(|d| d * scale).collect();
        self.num_peaks = multi_peakdetect(y, x, DEFAULT_LOOKAHEAD, &absolute)?
            .iter()
            .map(|(maxima, _)| maxima.len() as f64)
            .collect();

        let max_ln = self.deltas.len();
        let mut ln = 4;
        let selected = loop {
            let end = ln.min(max_ln);
            let fit = linregress(&self.deltas[..end], &self.num_peaks[..end]);
            ln += 1;
            if fit.r.abs() < 0.95 || ln >= max_ln {
                break -fit.intercept / fit.slope;
            }
        };

        if selected.is_finite() {
            log::debug!("Auto-selected peak threshold {:.4}", selected);
            self.set_sel_threshold(selected);
        } else {
            log::debug!("Threshold regression degenerate, keeping {:.4}", self.sel_threshold);
            self.set_sel_threshold(self.sel_threshold);
        }
        Ok(())
    }
}

/// 线性插值，超出范围时取端点值
fn interpolate_clamped(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    match xs.len() {
        0 => 0.0,
        1 => ys[0],
        n => {
            if x <= xs[0] {
                return ys[0];
            }
            if x >= xs[n - 1] {
                return ys[n - 1];
            }
            let i = xs.partition_point(|&v| v < x);
            let (x0, x1) = (xs[i - 1], xs[i]);
            let (y0, y1) = (ys[i - 1], ys[i]);
            if x1 == x0 {
                y1
            } else {
                y0 + (y1 - y0) * (x - x0) / (x1 - x0)
            }
        }
    }
}
