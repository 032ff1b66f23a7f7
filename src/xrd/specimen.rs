//! # 样品与计算管线
//!
//! 样品汇集：样品元数据、实验图样、计算图样、物相 → 权重分数映射、
//! 有序标记容器、排除区间以及统计对象。
//!
//! ## 计算流程
//! 1. 无物相：清空计算图样，返回 `None`
//! 2. θ 网格：有实验数据（≥ 2 点）时取实验 2θ 的一半（弧度），否则在
//!    测角仪 2θ 范围内均匀取 `steps` 个点
//! 3. `stl = 2·sin θ / λ`，样品长度校正 `min(sin θ · L / (R · tan δ), 1)`
//! 4. 累加各物相的衍射强度，再乘以绝对比例并加上背景偏移
//! 5. 写回计算图样，统计对象经由通知重新计算
//!
//! ## 依赖关系
//! - 被 `xrd/project.rs`, `commands/` 使用
//! - 使用 `xrd/pattern.rs`, `xrd/phase.rs`, `xrd/marker.rs`, `xrd/statistics.rs`,
//!   `xrd/exclusion.rs`, `xrd/peaks.rs`, `models/`

use crate::error::{PyxrdError, Result};
use crate::models::object_store::ObjectListStore;
use crate::models::observable::{Handle, Observable};
use crate::models::schema::{
    expect_bool, expect_f64, expect_str, unknown_field, FieldType, FieldValue, Record, Schema,
};
use crate::models::signal::SlotId;
use crate::models::xy_store::XYListStore;
use crate::parsers::DataFormat;
use crate::xrd::exclusion::{self, Series};
use crate::xrd::goniometer::Goniometer;
use crate::xrd::marker::{marker_schema, Marker};
use crate::xrd::pattern::Pattern;
use crate::xrd::peaks::{absolute_delta, peakdetect, DEFAULT_LOOKAHEAD};
use crate::xrd::phase::{DiffractionInput, PhaseModel};
use crate::xrd::statistics::Statistics;

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

/// 默认合成网格点数
pub const DEFAULT_STEPS: usize = 2500;

/// 计算状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationState {
    Stale,
    Computing,
    Fresh,
}

impl fmt::Display for CalculationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalculationState::Stale => write!(f, "stale"),
            CalculationState::Computing => write!(f, "computing"),
            CalculationState::Fresh => write!(f, "fresh"),
        }
    }
}

/// 峰检测所用的图样
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSource {
    Experimental,
    Calculated,
}

struct PhaseEntry {
    phase: Handle<dyn PhaseModel>,
    fraction: f64,
    slot: SlotId,
}

/// 样品
pub struct Specimen {
    name: String,
    sample: String,
    sample_length: f64,
    abs_scale: f64,
    bg_shift: f64,
    display_calculated: bool,
    display_experimental: bool,
    display_phases: bool,
    experimental: Rc<Pattern>,
    calculated: Rc<Pattern>,
    phases: Vec<PhaseEntry>,
    markers: ObjectListStore<Marker>,
    exclusion_ranges: Rc<XYListStore>,
    statistics: Rc<Statistics>,
    state: Rc<Cell<CalculationState>>,
}

/// 样品列表的模式
pub fn specimen_schema() -> Schema {
    Schema::new(
        "Specimen",
        &[
            ("name", FieldType::Str),
            ("sample", FieldType::Str),
            ("sample_length", FieldType::Float),
            ("abs_scale", FieldType::Float),
            ("bg_shift", FieldType::Float),
            ("display_calculated", FieldType::Bool),
            ("display_experimental", FieldType::Bool),
            ("display_phases", FieldType::Bool),
        ],
    )
}

impl Specimen {
    pub fn new(name: impl Into<String>, sample: impl Into<String>) -> Self {
        Self::from_parts(
            name.into(),
            sample.into(),
            Pattern::new("Experimental Profile"),
            Pattern::new("Calculated Profile"),
            Rc::new(XYListStore::new()),
        )
    }

    fn from_parts(
        name: String,
        sample: String,
        experimental: Rc<Pattern>,
        calculated: Rc<Pattern>,
        exclusion_ranges: Rc<XYListStore>,
    ) -> Self {
        let statistics = Statistics::new(
            Rc::clone(&experimental),
            Rc::clone(&calculated),
            Rc::clone(&exclusion_ranges),
        );
        Self {
            name,
            sample,
            sample_length: 3.0,
            abs_scale: 1.0,
            bg_shift: 0.0,
            display_calculated: true,
            display_experimental: true,
            display_phases: false,
            experimental,
            calculated,
            phases: Vec::new(),
            markers: ObjectListStore::new(marker_schema()),
            exclusion_ranges,
            statistics,
            state: Rc::new(Cell::new(CalculationState::Stale)),
        }
    }

    /// 由实验数据文件创建样品
    ///
    /// 名称取文件名；样品名取 DAT 首行或 BIN 头部的样品字段。
    pub fn from_experimental_data(path: &Path, format: DataFormat) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let mut specimen = Specimen::new(name, "");
        specimen.sample = specimen.experimental.load_data(path, format)?;
        Ok(specimen)
    }

    // ─────────────────────────────────────────────────────────────
    // 访问
    // ─────────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sample(&self) -> &str {
        &self.sample
    }

    pub fn sample_length(&self) -> f64 {
        self.sample_length
    }

    pub fn abs_scale(&self) -> f64 {
        self.abs_scale
    }

    pub fn bg_shift(&self) -> f64 {
        self.bg_shift
    }

    pub fn experimental(&self) -> &Rc<Pattern> {
        &self.experimental
    }

    pub fn calculated(&self) -> &Rc<Pattern> {
        &self.calculated
    }

    pub fn markers(&self) -> &ObjectListStore<Marker> {
        &self.markers
    }

    pub fn exclusion_ranges(&self) -> &Rc<XYListStore> {
        &self.exclusion_ranges
    }

    pub fn statistics(&self) -> &Rc<Statistics> {
        &self.statistics
    }

    pub fn state(&self) -> CalculationState {
        self.state.get()
    }

    /// 标记为需要重新计算
    pub fn invalidate(&self) {
        self.state.set(CalculationState::Stale);
    }

    pub fn max_intensity(&self) -> f64 {
        self.experimental
            .max_intensity()
            .max(self.calculated.max_intensity())
    }

    // ─────────────────────────────────────────────────────────────
    // 物相
    // ─────────────────────────────────────────────────────────────

    /// 物相及其权重分数
    pub fn phases(&self) -> Vec<(Handle<dyn PhaseModel>, f64)> {
        self.phases
            .iter()
            .map(|entry| (Rc::clone(&entry.phase), entry.fraction))
            .collect()
    }

    pub fn has_phase(&self, phase: &Handle<dyn PhaseModel>) -> bool {
        self.phases.iter().any(|entry| Rc::ptr_eq(&entry.phase, phase))
    }

    /// 添加物相，已存在时不做任何修改
    pub fn add_phase(&mut self, phase: Handle<dyn PhaseModel>, fraction: f64) {
        if self.has_phase(&phase) {
            return;
        }
        let state = Rc::clone(&self.state);
        let slot = phase.connect(move |_| state.set(CalculationState::Stale));
        self.phases.push(PhaseEntry {
            phase,
            fraction,
            slot,
        });
        self.invalidate();
    }

    /// 移除物相，返回是否确实存在
    pub fn del_phase(&mut self, phase: &Handle<dyn PhaseModel>) -> bool {
        let Some(position) = self
            .phases
            .iter()
            .position(|entry| Rc::ptr_eq(&entry.phase, phase))
        else {
            return false;
        };
        let entry = self.phases.remove(position);
        entry.phase.disconnect(entry.slot);
        self.invalidate();
        true
    }

    pub fn set_phase_fraction(&mut self, phase: &Handle<dyn PhaseModel>, fraction: f64) -> Result<()> {
        let entry = self
            .phases
            .iter_mut()
            .find(|entry| Rc::ptr_eq(&entry.phase, phase))
            .ok_or(PyxrdError::ItemNotFound)?;
        if entry.fraction != fraction {
            entry.fraction = fraction;
            self.invalidate();
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    // 计算
    // ─────────────────────────────────────────────────────────────

    /// 计算理论图样，返回 `(2θ, 强度)`；无物相时清空计算图样并返回 `None`
    pub fn calculate_pattern(
        &self,
        goniometer: &Goniometer,
        steps: usize,
    ) -> Result<Option<(Vec<f64>, Vec<f64>)>> {
        if self.phases.is_empty() {
            self.calculated.clear();
            self.state.set(CalculationState::Fresh);
            return Ok(None);
        }

        self.state.set(CalculationState::Computing);
        match self.compute(goniometer, steps) {
            Ok(result) => {
                self.state.set(CalculationState::Fresh);
                Ok(Some(result))
            }
            Err(e) => {
                self.state.set(CalculationState::Stale);
                Err(e)
            }
        }
    }

    fn compute(&self, goniometer: &Goniometer, steps: usize) -> Result<(Vec<f64>, Vec<f64>)> {
        let exp_x = self.experimental.x_data();
        let (theta, two_theta) = if exp_x.len() >= 2 {
            let theta: Vec<f64> = exp_x.iter().map(|x| x.to_radians() / 2.0).collect();
            (theta, exp_x)
        } else {
            let theta = goniometer.theta_grid(steps);
            let two_theta: Vec<f64> = theta.iter().map(|t| 2.0 * t.to_degrees()).collect();
            (theta, two_theta)
        };

        let stl: Vec<f64> = theta
            .iter()
            .map(|t| 2.0 * t.sin() / goniometer.wavelength)
            .collect();
        let l_rta = goniometer.length_ratio(self.sample_length);
        let correction: Vec<f64> = theta.iter().map(|t| (t.sin() * l_rta).min(1.0)).collect();

        let input = DiffractionInput {
            theta: &theta,
            stl: &stl,
            wavelength: goniometer.wavelength,
            soller_s: goniometer.soller_s(),
            soller_s1s2: goniometer.soller_s1s2(),
            correction: &correction,
        };

        let mut total = vec![0.0; theta.len()];
        for entry in &self.phases {
            let contribution = entry.phase.borrow().diffracted_intensity(&input, entry.fraction);
            if contribution.len() != total.len() {
                return Err(PyxrdError::ShapeMismatch {
                    left: total.len(),
                    right: contribution.len(),
                });
            }
            for (sum, value) in total.iter_mut().zip(contribution) {
                *sum += value;
            }
        }

        let intensity: Vec<f64> = total
            .into_iter()
            .map(|v| self.abs_scale * v + self.bg_shift)
            .collect();

        log::debug!(
            "{}: calculated {} points from {} phase(s)",
            self.name,
            intensity.len(),
            self.phases.len()
        );
        self.calculated.set_data(&two_theta, &intensity)?;
        Ok((two_theta, intensity))
    }

    /// 自动检测峰并为未标记的峰位添加标记，返回新增数量
    pub fn auto_add_peaks(
        &self,
        goniometer: &Goniometer,
        threshold: f64,
        source: PatternSource,
    ) -> Result<usize> {
        let pattern = match source {
            PatternSource::Experimental => &self.experimental,
            PatternSource::Calculated => &self.calculated,
        };
        let (x, y) = pattern.xy().data();
        let (maxima, _) = peakdetect(&y, &x, DEFAULT_LOOKAHEAD, absolute_delta(&y, threshold))?;

        let marked: Vec<f64> = self
            .markers
            .items()
            .iter()
            .map(|marker| marker.borrow().position)
            .collect();

        let mut added = 0;
        for (position, _) in maxima {
            if marked.contains(&position) {
                continue;
            }
            let nm = goniometer.nm_from_2t(position);
            self.markers
                .append(Observable::new(Marker::new(d_spacing_label(nm), position)))?;
            added += 1;
        }
        log::debug!("{}: added {} peak marker(s)", self.name, added);
        Ok(added)
    }

    // ─────────────────────────────────────────────────────────────
    // 排除区间
    // ─────────────────────────────────────────────────────────────

    /// 保留掩码
    pub fn get_exclusion_selector(&self, x: &[f64]) -> Vec<bool> {
        exclusion::exclusion_selector(x, &self.exclusion_ranges)
    }

    /// 应用排除掩码后的 (实验, 计算) 序列
    pub fn get_exclusion_xy(&self) -> (Series, Series) {
        exclusion::exclusion_xy(&self.experimental, &self.calculated, &self.exclusion_ranges)
    }

    // ─────────────────────────────────────────────────────────────
    // JSON
    // ─────────────────────────────────────────────────────────────

    /// 编码为 JSON，物相以其在物相列表中的位置保存
    pub fn to_json<F>(&self, phase_position: F) -> Result<serde_json::Value>
    where
        F: Fn(&Handle<dyn PhaseModel>) -> Option<usize>,
    {
        let mut phase_indeces = BTreeMap::new();
        for entry in &self.phases {
            let position = phase_position(&entry.phase).ok_or(PyxrdError::ItemNotFound)?;
            phase_indeces.insert(position.to_string(), entry.fraction);
        }
        let json = SpecimenJson {
            name: self.name.clone(),
            sample: self.sample.clone(),
            sample_length: self.sample_length,
            abs_scale: self.abs_scale,
            bg_shift: self.bg_shift,
            display_calculated: self.display_calculated,
            display_experimental: self.display_experimental,
            display_phases: self.display_phases,
            experimental_pattern: Some(self.experimental.to_json()),
            calculated_pattern: Some(self.calculated.to_json()),
            exclusion_ranges: Some(self.exclusion_ranges.to_json()),
            markers: self
                .markers
                .items()
                .iter()
                .map(|marker| marker.borrow().clone())
                .collect(),
            phase_indeces,
        };
        Ok(serde_json::to_value(json)?)
    }

    /// 从 JSON 解码，`resolve` 按位置取回物相
    pub fn from_json<F>(value: &serde_json::Value, resolve: F) -> Result<Self>
    where
        F: Fn(usize) -> Option<Handle<dyn PhaseModel>>,
    {
        let json: SpecimenJson = serde_json::from_value(value.clone())?;
        let experimental = match &json.experimental_pattern {
            Some(v) => Pattern::from_json(v)?,
            None => Pattern::new("Experimental Profile"),
        };
        let calculated = match &json.calculated_pattern {
            Some(v) => Pattern::from_json(v)?,
            None => Pattern::new("Calculated Profile"),
        };
        let exclusion_ranges = match &json.exclusion_ranges {
            Some(v) => XYListStore::from_json(v)?,
            None => XYListStore::new(),
        };

        let mut specimen = Specimen::from_parts(
            json.name,
            json.sample,
            experimental,
            calculated,
            Rc::new(exclusion_ranges),
        );
        specimen.sample_length = json.sample_length;
        specimen.abs_scale = json.abs_scale;
        specimen.bg_shift = json.bg_shift;
        specimen.display_calculated = json.display_calculated;
        specimen.display_experimental = json.display_experimental;
        specimen.display_phases = json.display_phases;

        for marker in json.markers {
            specimen.markers.append(Observable::new(marker))?;
        }
        for (index, fraction) in json.phase_indeces {
            let position: usize = index.parse().map_err(|_| {
                PyxrdError::InvalidArgument(format!("invalid phase index '{}'", index))
            })?;
            let phase = resolve(position).ok_or_else(|| {
                PyxrdError::InvalidArgument(format!("no phase at position {}", position))
            })?;
            specimen.add_phase(phase, fraction);
        }
        Ok(specimen)
    }
}

impl Drop for Specimen {
    fn drop(&mut self) {
        for entry in &self.phases {
            entry.phase.disconnect(entry.slot);
        }
    }
}

impl Record for Specimen {
    fn schema_name(&self) -> &str {
        "Specimen"
    }

    fn get_field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "name" => self.name.clone().into(),
            "sample" => self.sample.clone().into(),
            "sample_length" => self.sample_length.into(),
            "abs_scale" => self.abs_scale.into(),
            "bg_shift" => self.bg_shift.into(),
            "display_calculated" => self.display_calculated.into(),
            "display_experimental" => self.display_experimental.into(),
            "display_phases" => self.display_phases.into(),
            _ => return None,
        };
        Some(value)
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<()> {
        match name {
            "name" => self.name = expect_str("Specimen", name, value)?,
            "sample" => self.sample = expect_str("Specimen", name, value)?,
            "sample_length" => {
                self.sample_length = expect_f64("Specimen", name, value)?;
                self.invalidate();
            }
            "abs_scale" => {
                self.abs_scale = expect_f64("Specimen", name, value)?;
                self.invalidate();
            }
            "bg_shift" => {
                self.bg_shift = expect_f64("Specimen", name, value)?;
                self.invalidate();
            }
            "display_calculated" => self.display_calculated = expect_bool("Specimen", name, value)?,
            "display_experimental" => {
                self.display_experimental = expect_bool("Specimen", name, value)?
            }
            "display_phases" => self.display_phases = expect_bool("Specimen", name, value)?,
            _ => return Err(unknown_field("Specimen", name)),
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct SpecimenJson {
    name: String,
    #[serde(default)]
    sample: String,
    #[serde(default = "default_sample_length")]
    sample_length: f64,
    #[serde(default = "default_abs_scale")]
    abs_scale: f64,
    #[serde(default)]
    bg_shift: f64,
    #[serde(default = "default_true")]
    display_calculated: bool,
    #[serde(default = "default_true")]
    display_experimental: bool,
    #[serde(default)]
    display_phases: bool,
    #[serde(default)]
    experimental_pattern: Option<serde_json::Value>,
    #[serde(default)]
    calculated_pattern: Option<serde_json::Value>,
    #[serde(default)]
    exclusion_ranges: Option<serde_json::Value>,
    #[serde(default)]
    markers: Vec<Marker>,
    #[serde(default)]
    phase_indeces: BTreeMap<String, f64>,
}

fn default_sample_length() -> f64 {
    3.0
}

fn default_abs_scale() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// d 间距标签：保留 `3 + min(trunc(log10 d), 0)` 位小数，不少于 0 位
pub fn d_spacing_label(nm: f64) -> String {
    let decimals = if nm > 0.0 {
        (3 + (nm.log10().trunc() as i64).min(0)).max(0) as usize
    } else {
        3
    };
    format!("{:.*}", decimals, nm)
}
