//! # 物相模型
//!
//! 计算管线只通过 [`PhaseModel`] 与物相交互：给定 θ 网格及仪器参数，
//! 返回该物相（已乘以权重分数）的衍射强度曲线。
//!
//! [`ReflectionPhase`] 是一个具体实现：一组反射（d 间距、相对强度、FWHM），
//! 以 Gaussian 峰形展宽并施加 Lorentz 极化校正。
//!
//! ## 序列化
//! ```text
//! {"type": "ReflectionPhase", "properties": {"name": ..., "reflections": [...]}}
//! ```
//!
//! ## 依赖关系
//! - 被 `xrd/specimen.rs`, `xrd/project.rs` 使用
//! - 使用 `models/schema.rs`

use crate::error::{PyxrdError, Result};
use crate::models::observable::{Handle, Observable};
use crate::models::schema::{expect_f64, expect_str, unknown_field, FieldType, FieldValue, Record, Schema};

use serde::{Deserialize, Serialize};

/// 物相计算所需的逐点输入
#[derive(Debug, Clone, Copy)]
pub struct DiffractionInput<'a> {
    /// θ 网格（弧度）
    pub theta: &'a [f64],
    /// 2·sin θ / λ
    pub stl: &'a [f64],
    /// 波长（nm）
    pub wavelength: f64,
    pub soller_s: f64,
    pub soller_s1s2: f64,
    /// 样品长度校正系数
    pub correction: &'a [f64],
}

/// 物相模型接口
pub trait PhaseModel: Record {
    fn name(&self) -> &str;

    /// 计算衍射强度，返回值长度与 `input.theta` 相同
    fn diffracted_intensity(&self, input: &DiffractionInput<'_>, fraction: f64) -> Vec<f64>;

    /// 编码为 `{"type", "properties"}`
    fn to_json(&self) -> Result<serde_json::Value>;
}

/// 物相列表的模式：按名称索引
pub fn phase_schema() -> Result<Schema> {
    Schema::new(
        "Phase",
        &[("name", FieldType::Str), ("scale", FieldType::Float)],
    )
    .with_index("name")
}

/// 单条反射
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reflection {
    /// d 间距（nm）
    pub d: f64,
    /// 相对强度
    pub intensity: f64,
    /// 半高宽（度 2θ）
    pub fwhm: f64,
}

/// 由离散反射构成的物相
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionPhase {
    pub name: String,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub reflections: Vec<Reflection>,
}

fn default_scale() -> f64 {
    1.0
}

impl ReflectionPhase {
    pub fn new(name: impl Into<String>, reflections: Vec<Reflection>) -> Self {
        Self {
            name: name.into(),
            scale: 1.0,
            reflections,
        }
    }

    /// 转为共享句柄
    pub fn into_handle(self) -> Handle<dyn PhaseModel> {
        Observable::new(self)
    }
}

impl Record for ReflectionPhase {
    fn schema_name(&self) -> &str {
        "Phase"
    }

    fn get_field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "name" => Some(self.name.clone().into()),
            "scale" => Some(self.scale.into()),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<()> {
        match name {
            "name" => self.name = expect_str("Phase", name, value)?,
            "scale" => self.scale = expect_f64("Phase", name, value)?,
            _ => return Err(unknown_field("Phase", name)),
        }
        Ok(())
    }
}

impl PhaseModel for ReflectionPhase {
    fn name(&self) -> &str {
        &self.name
    }

    fn diffracted_intensity(&self, input: &DiffractionInput<'_>, fraction: f64) -> Vec<f64> {
        let peaks: Vec<(f64, f64, f64)> = self
            .reflections
            .iter()
            .filter_map(|r| {
                let ratio = input.wavelength / (2.0 * r.d);
                if r.d <= 0.0 || ratio > 1.0 || r.fwhm <= 0.0 {
                    return None;
                }
                Some((2.0 * ratio.asin().to_degrees(), r.intensity, r.fwhm))
            })
            .collect();

        input
            .theta
            .iter()
            .zip(input.correction.iter())
            .map(|(&theta, &correction)| {
                let two_theta = 2.0 * theta.to_degrees();
                let profile: f64 = peaks
                    .iter()
                    .map(|&(center, intensity, fwhm)| intensity * gaussian(two_theta - center, fwhm))
                    .sum();
                fraction * self.scale * correction * lorentz_polarization(theta) * profile
            })
            .collect()
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({
            "type": "ReflectionPhase",
            "properties": serde_json::to_value(self)?,
        }))
    }
}

/// 归一化峰高为 1 的 Gaussian 峰形
fn gaussian(offset: f64, fwhm: f64) -> f64 {
    (-4.0 * std::f64::consts::LN_2 * offset * offset / (fwhm * fwhm)).exp()
}

/// Lorentz 极化校正
fn lorentz_polarization(theta: f64) -> f64 {
    let sin_theta = theta.sin();
    let cos_theta = theta.cos();
    let cos_2theta = (2.0 * theta).cos();

    if sin_theta.abs() < 1e-10 || cos_theta.abs() < 1e-10 {
        return 0.0;
    }

    (1.0 + cos_2theta * cos_2theta) / (sin_theta * sin_theta * cos_theta)
}

/// 从 `{"type", "properties"}` 解码物相
pub fn phase_from_json(value: &serde_json::Value) -> Result<Handle<dyn PhaseModel>> {
    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| PyxrdError::InvalidArgument("phase JSON lacks a 'type' field".to_string()))?;
    let properties = value.get("properties").cloned().unwrap_or_default();

    match kind {
        "ReflectionPhase" => {
            let phase: ReflectionPhase = serde_json::from_value(properties)?;
            Ok(phase.into_handle())
        }
        other => Err(PyxrdError::UnsupportedFormat(format!(
            "Unknown phase type: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xrd::goniometer::Goniometer;

    fn illite() -> ReflectionPhase {
        ReflectionPhase::new(
            "Illite",
            vec![
                Reflection {
                    d: 1.0,
                    intensity: 100.0,
                    fwhm: 0.4,
                },
                Reflection {
                    d: 0.5,
                    intensity: 40.0,
                    fwhm: 0.4,
                },
            ],
        )
    }

    fn input_for<'a>(theta: &'a [f64], ones: &'a [f64]) -> DiffractionInput<'a> {
        DiffractionInput {
            theta,
            stl: ones,
            wavelength: 0.154056,
            soller_s: 1.0,
            soller_s1s2: 1.0,
            correction: ones,
        }
    }

    #[test]
    fn test_peak_at_bragg_position() {
        let gonio = Goniometer::default();
        let theta = gonio.theta_grid(2101);
        let ones = vec![1.0; theta.len()];
        let intensity = illite().diffracted_intensity(&input_for(&theta, &ones), 1.0);

        let (imax, _) = intensity
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) });
        let peak_2t = 2.0 * theta[imax].to_degrees();
        assert!((peak_2t - gonio.two_theta_from_nm(1.0)).abs() < 0.05);
    }

    #[test]
    fn test_fraction_scales_linearly() {
        let theta = Goniometer::default().theta_grid(50);
        let ones = vec![1.0; theta.len()];
        let phase = illite();
        let full = phase.diffracted_intensity(&input_for(&theta, &ones), 1.0);
        let half = phase.diffracted_intensity(&input_for(&theta, &ones), 0.5);
        for (f, h) in full.iter().zip(half.iter()) {
            assert!((f * 0.5 - h).abs() < 1e-9);
        }
    }

    #[test]
    fn test_json_round_trip() {
        let phase = illite();
        let json = phase.to_json().unwrap();
        assert_eq!(json["type"], "ReflectionPhase");
        let decoded = phase_from_json(&json).unwrap();
        assert_eq!(decoded.borrow().name(), "Illite");
    }

    #[test]
    fn test_unknown_phase_type() {
        let json = serde_json::json!({"type": "Mystery", "properties": {}});
        assert!(phase_from_json(&json).is_err());
    }

    #[test]
    fn test_phase_matches_schema() {
        let schema = phase_schema().unwrap();
        assert!(schema.check(&illite()).is_ok());
        assert_eq!(schema.index_key(&illite()).as_deref(), Some("Illite"));
    }
}
