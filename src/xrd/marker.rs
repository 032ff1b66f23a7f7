//! # 标记（Marker）
//!
//! 衍射图样上的峰位标记。每个标记是一条可观察的记录，存放在样品的
//! 有序标记容器中，可按 d 间距读写位置，并支持 CSV 导入导出。
//!
//! ## CSV 格式
//! ```text
//! label,visible,position,x_offset,y_offset,base,angle,inherit_angle,style
//! 1.000,true,8.84,0.0,0.05,1,0.0,true,none
//! ```
//!
//! ## 依赖关系
//! - 被 `xrd/specimen.rs`, `commands/peaks.rs` 使用
//! - 使用 `csv` 库读写 CSV 文件

use crate::error::{PyxrdError, Result};
use crate::models::schema::{
    expect_bool, expect_f64, expect_i64, expect_str, unknown_field, FieldType, FieldValue, Record,
    Schema,
};
use crate::xrd::goniometer::Goniometer;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// 标记锚定的基线
pub const MARKER_BASES: [(i64, &str); 5] = [
    (0, "X-axis"),
    (1, "Experimental profile"),
    (2, "Calculated profile"),
    (3, "Lowest of both"),
    (4, "Highest of both"),
];

/// 标记线型
pub const MARKER_STYLES: [&str; 6] = ["none", "solid", "dashed", "dotted", "dashdot", "offset"];

/// 峰位标记
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Marker {
    pub label: String,
    pub visible: bool,
    /// 位置（度 2θ）
    pub position: f64,
    pub x_offset: f64,
    pub y_offset: f64,
    pub base: i64,
    pub angle: f64,
    pub inherit_angle: bool,
    pub style: String,
}

impl Default for Marker {
    fn default() -> Self {
        Self {
            label: String::new(),
            visible: true,
            position: 0.0,
            x_offset: 0.0,
            y_offset: 0.05,
            base: 1,
            angle: 0.0,
            inherit_angle: true,
            style: "none".to_string(),
        }
    }
}

impl Marker {
    pub fn new(label: impl Into<String>, position: f64) -> Self {
        Self {
            label: label.into(),
            position,
            ..Default::default()
        }
    }

    /// 当前位置对应的 d 间距（nm）
    pub fn nm_position(&self, goniometer: &Goniometer) -> f64 {
        goniometer.nm_from_2t(self.position)
    }

    /// 按 d 间距（nm）设置位置
    pub fn set_nm_position(&mut self, goniometer: &Goniometer, d: f64) {
        self.position = goniometer.two_theta_from_nm(d);
    }
}

/// 标记容器的模式
pub fn marker_schema() -> Schema {
    Schema::new(
        "Marker",
        &[
            ("label", FieldType::Str),
            ("visible", FieldType::Bool),
            ("position", FieldType::Float),
            ("x_offset", FieldType::Float),
            ("y_offset", FieldType::Float),
            ("base", FieldType::Int),
            ("angle", FieldType::Float),
            ("inherit_angle", FieldType::Bool),
            ("style", FieldType::Str),
        ],
    )
}

impl Record for Marker {
    fn schema_name(&self) -> &str {
        "Marker"
    }

    fn get_field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "label" => self.label.clone().into(),
            "visible" => self.visible.into(),
            "position" => self.position.into(),
            "x_offset" => self.x_offset.into(),
            "y_offset" => self.y_offset.into(),
            "base" => self.base.into(),
            "angle" => self.angle.into(),
            "inherit_angle" => self.inherit_angle.into(),
            "style" => self.style.clone().into(),
            _ => return None,
        };
        Some(value)
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<()> {
        match name {
            "label" => self.label = expect_str("Marker", name, value)?,
            "visible" => self.visible = expect_bool("Marker", name, value)?,
            "position" => self.position = expect_f64("Marker", name, value)?,
            "x_offset" => self.x_offset = expect_f64("Marker", name, value)?,
            "y_offset" => self.y_offset = expect_f64("Marker", name, value)?,
            "base" => {
                let base = expect_i64("Marker", name, value)?;
                if !MARKER_BASES.iter().any(|(b, _)| *b == base) {
                    return Err(PyxrdError::InvalidArgument(format!(
                        "'{}' is not a valid marker base",
                        base
                    )));
                }
                self.base = base;
            }
            "angle" => self.angle = expect_f64("Marker", name, value)?,
            "inherit_angle" => self.inherit_angle = expect_bool("Marker", name, value)?,
            "style" => {
                let style = expect_str("Marker", name, value)?;
                if !MARKER_STYLES.contains(&style.as_str()) {
                    return Err(PyxrdError::InvalidArgument(format!(
                        "'{}' is not a valid marker style",
                        style
                    )));
                }
                self.style = style;
            }
            _ => return Err(unknown_field("Marker", name)),
        }
        Ok(())
    }
}

/// 导出标记为 CSV
pub fn save_markers_csv(markers: &[Marker], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;
    for marker in markers {
        wtr.serialize(marker)?;
    }
    wtr.flush().map_err(|e| PyxrdError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

/// 从 CSV 导入标记
pub fn load_markers_csv(input_path: &Path) -> Result<Vec<Marker>> {
    let mut rdr = csv::Reader::from_path(input_path)?;
    let mut markers = Vec::new();
    for record in rdr.deserialize() {
        markers.push(record?);
    }
    Ok(markers)
}
