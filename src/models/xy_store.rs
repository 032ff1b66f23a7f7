//! # 列式 XY 序列容器
//!
//! 用两个连续的 `f64` 缓冲区保存有序的 (x, y) 点，支持批量替换、
//! 线性插值、DAT/BIN 加载与保存，以及逐点的变更通知。
//!
//! ## 不变量
//! - 任何可观察时刻 `x.len() == y.len()`
//! - 不要求 x 有序；插值假定 x 递增，由调用方保证
//!
//! ## 序列化
//! ```text
//! {"data": "[[5.0,120.0],[5.02,118.5],...]"}
//! ```
//! 解码时 `nan` 被替换为 `0.0`。
//!
//! ## 依赖关系
//! - 被 `xrd/pattern.rs`, `xrd/specimen.rs`, `xrd/statistics.rs` 使用
//! - 使用 `models/signal.rs`, `parsers/`

use crate::error::{PyxrdError, Result};
use crate::models::signal::{Signal, SlotId};
use crate::parsers::{bin, dat, DataFormat};

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::Path;

/// 单个数据点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// XY 容器事件
#[derive(Debug, Clone, PartialEq)]
pub enum XyEvent {
    Inserted { point: Point, position: usize },
    Removed { point: Point, position: usize },
    RowDeleted { position: usize },
    Changed { point: Point, position: usize },
    /// 缓冲区被原地整体替换（形状不变）
    Refreshed,
}

#[derive(Serialize, Deserialize)]
struct XyJson {
    data: String,
}

/// 列式 XY 容器
#[derive(Default)]
pub struct XYListStore {
    x: RefCell<Vec<f64>>,
    y: RefCell<Vec<f64>>,
    events: Signal<XyEvent>,
}

impl XYListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由数据直接构造（不发送通知）
    pub fn from_data(xs: &[f64], ys: &[f64]) -> Result<Self> {
        check_shape(xs, ys)?;
        Ok(Self {
            x: RefCell::new(xs.to_vec()),
            y: RefCell::new(ys.to_vec()),
            events: Signal::new(),
        })
    }

    pub fn connect<F>(&self, slot: F) -> SlotId
    where
        F: Fn(&XyEvent) + 'static,
    {
        self.events.connect(slot)
    }

    pub fn disconnect(&self, id: SlotId) -> bool {
        self.events.disconnect(id)
    }

    // ─────────────────────────────────────────────────────────────
    // 访问
    // ─────────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.x.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, position: usize) -> Option<Point> {
        let x = self.x.borrow();
        let y = self.y.borrow();
        Some(Point {
            x: *x.get(position)?,
            y: *y.get(position)?,
        })
    }

    pub fn x_data(&self) -> Vec<f64> {
        self.x.borrow().clone()
    }

    pub fn y_data(&self) -> Vec<f64> {
        self.y.borrow().clone()
    }

    /// 两个缓冲区的快照
    pub fn data(&self) -> (Vec<f64>, Vec<f64>) {
        (self.x_data(), self.y_data())
    }

    pub fn points(&self) -> Vec<Point> {
        self.x
            .borrow()
            .iter()
            .zip(self.y.borrow().iter())
            .map(|(&x, &y)| Point { x, y })
            .collect()
    }

    /// 最大 y 值，空序列返回 `None`
    pub fn max_y(&self) -> Option<f64> {
        self.y
            .borrow()
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }

    // ─────────────────────────────────────────────────────────────
    // 逐点修改
    // ─────────────────────────────────────────────────────────────

    pub fn append(&self, x: f64, y: f64) -> usize {
        let position = self.len();
        self.insert(position, x, y)
    }

    /// 插入点（超出末尾时追加），返回其位置
    pub fn insert(&self, position: usize, x: f64, y: f64) -> usize {
        let position = {
            let mut xs = self.x.borrow_mut();
            let mut ys = self.y.borrow_mut();
            let position = position.min(xs.len());
            xs.insert(position, x);
            ys.insert(position, y);
            position
        };
        self.events.emit(&XyEvent::Inserted {
            point: Point { x, y },
            position,
        });
        position
    }

    /// 修改单个点
    pub fn set_point(&self, position: usize, x: f64, y: f64) -> Result<()> {
        {
            let mut xs = self.x.borrow_mut();
            let mut ys = self.y.borrow_mut();
            if position >= xs.len() {
                return Err(out_of_range(position, xs.len()));
            }
            xs[position] = x;
            ys[position] = y;
        }
        self.events.emit(&XyEvent::Changed {
            point: Point { x, y },
            position,
        });
        Ok(())
    }

    /// 删除多个位置上的点，按位置降序处理
    pub fn remove_at(&self, positions: &[usize]) -> Result<()> {
        let len = self.len();
        if let Some(&bad) = positions.iter().find(|&&p| p >= len) {
            return Err(out_of_range(bad, len));
        }
        let mut positions = positions.to_vec();
        positions.sort_unstable_by(|a, b| b.cmp(a));
        positions.dedup();
        for position in positions {
            self.remove_one(position);
        }
        Ok(())
    }

    /// 从末尾开始逐个删除所有点
    pub fn clear(&self) {
        while let Some(last) = self.len().checked_sub(1) {
            self.remove_one(last);
        }
    }

    fn remove_one(&self, position: usize) {
        let point = {
            let mut xs = self.x.borrow_mut();
            let mut ys = self.y.borrow_mut();
            Point {
                x: xs.remove(position),
                y: ys.remove(position),
            }
        };
        self.events.emit(&XyEvent::Removed { point, position });
        self.events.emit(&XyEvent::RowDeleted { position });
    }

    // ─────────────────────────────────────────────────────────────
    // 批量替换
    // ─────────────────────────────────────────────────────────────

    /// 清空后整体写入新数据，每个点发送一次 `Inserted`
    pub fn set_from_data(&self, xs: &[f64], ys: &[f64]) -> Result<()> {
        check_shape(xs, ys)?;
        self.clear();
        {
            let mut x = self.x.borrow_mut();
            let mut y = self.y.borrow_mut();
            x.extend_from_slice(xs);
            y.extend_from_slice(ys);
        }
        for (position, (&x, &y)) in xs.iter().zip(ys.iter()).enumerate() {
            self.events.emit(&XyEvent::Inserted {
                point: Point { x, y },
                position,
            });
        }
        Ok(())
    }

    /// 形状不变时原地替换并发送一次 `Refreshed`，否则退回 `set_from_data`
    pub fn update_from_data(&self, xs: &[f64], ys: &[f64]) -> Result<()> {
        check_shape(xs, ys)?;
        if xs.len() != self.len() {
            return self.set_from_data(xs, ys);
        }
        {
            let mut x = self.x.borrow_mut();
            let mut y = self.y.borrow_mut();
            x.copy_from_slice(xs);
            y.copy_from_slice(ys);
        }
        self.events.emit(&XyEvent::Refreshed);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    // 插值
    // ─────────────────────────────────────────────────────────────

    /// 分段线性插值，请求点必须位于 `[x_first, x_last]` 之内
    pub fn interpolate(&self, x_values: &[f64]) -> Result<Vec<(f64, f64)>> {
        let xs = self.x.borrow();
        let ys = self.y.borrow();
        if xs.len() < 2 {
            return Err(PyxrdError::NotEnoughPoints(xs.len()));
        }
        let (min, max) = (xs[0], xs[xs.len() - 1]);

        x_values
            .iter()
            .map(|&xv| {
                if !(min..=max).contains(&xv) {
                    return Err(PyxrdError::InterpolationDomain { x: xv, min, max });
                }
                let i = xs.partition_point(|&v| v < xv);
                let y = if i == 0 || xs[i] == xv {
                    ys[i]
                } else {
                    let (x0, x1) = (xs[i - 1], xs[i]);
                    let (y0, y1) = (ys[i - 1], ys[i]);
                    y0 + (y1 - y0) * (xv - x0) / (x1 - x0)
                };
                Ok((xv, y))
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────
    // 文件 I/O
    // ─────────────────────────────────────────────────────────────

    /// 清空并从文件加载数据，返回标题（DAT 首行或 BIN 样品名）
    pub fn load_data(&self, path: &Path, format: DataFormat) -> Result<String> {
        if !path.exists() {
            return Err(PyxrdError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let (title, xs, ys) = match format {
            DataFormat::Dat => {
                let pattern = dat::parse_dat_file(path, true)?;
                (pattern.header.unwrap_or_default(), pattern.x, pattern.y)
            }
            DataFormat::Bin => {
                let pattern = bin::parse_bin_file(path)?;
                (pattern.sample, pattern.x, pattern.y)
            }
        };
        log::debug!(
            "Loaded {} points from {} ({})",
            xs.len(),
            path.display(),
            format
        );
        self.set_from_data(&xs, &ys)?;
        Ok(title)
    }

    /// 从 DAT 文本加载
    pub fn load_dat_str(&self, content: &str, has_header: bool) -> Result<Option<String>> {
        let pattern = dat::parse_dat_content(content, "<memory>", has_header)?;
        self.set_from_data(&pattern.x, &pattern.y)?;
        Ok(pattern.header)
    }

    /// 从 BIN 字节加载
    pub fn load_bin_bytes(&self, bytes: &[u8]) -> Result<String> {
        let pattern = bin::parse_bin_bytes(bytes)?;
        self.set_from_data(&pattern.x, &pattern.y)?;
        Ok(pattern.sample)
    }

    /// 写出标题行和两列 `%.8f` 文本
    pub fn save_data(&self, header: &str, path: &Path) -> Result<()> {
        let mut content = String::with_capacity(self.len() * 32 + header.len() + 1);
        content.push_str(header);
        content.push('\n');
        for point in self.points() {
            let _ = writeln!(content, "{:.8} {:.8}", point.x, point.y);
        }

        let write_err = |e| PyxrdError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        };
        let mut file = fs::File::create(path).map_err(write_err)?;
        file.write_all(content.as_bytes()).map_err(write_err)?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    // JSON
    // ─────────────────────────────────────────────────────────────

    /// 编码为 `{"data": "[[x,y],...]"}`
    pub fn to_json(&self) -> serde_json::Value {
        let mut data = String::from("[");
        let mut non_finite = 0usize;
        for (i, point) in self.points().iter().enumerate() {
            if i > 0 {
                data.push(',');
            }
            non_finite += [point.x, point.y].iter().filter(|v| !v.is_finite()).count();
            let _ = write!(data, "[{},{}]", json_number(point.x), json_number(point.y));
        }
        data.push(']');
        if non_finite > 0 {
            log::warn!(
                "{} non-finite value(s) written as nan, they will load back as 0.0",
                non_finite
            );
        }
        serde_json::json!({ "data": data })
    }

    /// 从 JSON 解码，`nan` 替换为 `0.0`
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let wrapper: XyJson = serde_json::from_value(value.clone())?;
        let sanitized = wrapper.data.replace("nan", "0.0").replace("NaN", "0.0");
        let pairs: Vec<[f64; 2]> = serde_json::from_str(&sanitized)?;
        let xs: Vec<f64> = pairs.iter().map(|p| p[0]).collect();
        let ys: Vec<f64> = pairs.iter().map(|p| p[1]).collect();
        Self::from_data(&xs, &ys)
    }
}

fn json_number(v: f64) -> String {
    if v.is_finite() {
        format!("{:?}", v)
    } else {
        "nan".to_string()
    }
}

fn check_shape(xs: &[f64], ys: &[f64]) -> Result<()> {
    if xs.len() != ys.len() {
        return Err(PyxrdError::ShapeMismatch {
            left: xs.len(),
            right: ys.len(),
        });
    }
    Ok(())
}

fn out_of_range(position: usize, len: usize) -> PyxrdError {
    PyxrdError::InvalidArgument(format!(
        "position {} out of range for {} points",
        position, len
    ))
}
