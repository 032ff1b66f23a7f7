//! # 衍射图样
//!
//! 带名称的 XY 序列。逐点事件由内部 [`XYListStore`] 发出；图样在其上
//! 提供一个粗粒度的 `updated` 信号：批量操作（整体替换、清空、加载）
//! 结束后只发送一次，单点编辑则每次发送。
//!
//! ## 依赖关系
//! - 被 `xrd/specimen.rs`, `xrd/statistics.rs` 使用
//! - 使用 `models/xy_store.rs`, `models/signal.rs`

use crate::error::Result;
use crate::models::signal::{Signal, SlotId};
use crate::models::xy_store::XYListStore;
use crate::parsers::DataFormat;

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::path::Path;
use std::rc::{Rc, Weak};

#[derive(Serialize, Deserialize)]
struct PatternJson {
    name: String,
    xy_data: serde_json::Value,
}

/// 衍射图样
pub struct Pattern {
    name: String,
    xy: XYListStore,
    updated: Signal<()>,
    batch_depth: Cell<u32>,
}

impl Pattern {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Self::with_store(name.into(), XYListStore::new())
    }

    fn with_store(name: String, xy: XYListStore) -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Pattern>| {
            let weak = weak.clone();
            xy.connect(move |_| {
                if let Some(pattern) = weak.upgrade() {
                    if pattern.batch_depth.get() == 0 {
                        pattern.updated.emit(&());
                    }
                }
            });
            Pattern {
                name,
                xy,
                updated: Signal::new(),
                batch_depth: Cell::new(0),
            }
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 底层 XY 容器（逐点事件）
    pub fn xy(&self) -> &XYListStore {
        &self.xy
    }

    pub fn len(&self) -> usize {
        self.xy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xy.is_empty()
    }

    pub fn x_data(&self) -> Vec<f64> {
        self.xy.x_data()
    }

    pub fn y_data(&self) -> Vec<f64> {
        self.xy.y_data()
    }

    /// 注册粗粒度更新监听器
    pub fn connect_updated<F>(&self, slot: F) -> SlotId
    where
        F: Fn(&()) + 'static,
    {
        self.updated.connect(slot)
    }

    pub fn disconnect_updated(&self, id: SlotId) -> bool {
        self.updated.disconnect(id)
    }

    /// 替换数据（形状不变时原地更新）
    pub fn set_data(&self, xs: &[f64], ys: &[f64]) -> Result<()> {
        self.batch(|xy| xy.update_from_data(xs, ys))
    }

    pub fn clear(&self) {
        self.batch_depth.set(self.batch_depth.get() + 1);
        self.xy.clear();
        self.end_batch(true);
    }

    /// 从文件加载，返回文件标题
    pub fn load_data(&self, path: &Path, format: DataFormat) -> Result<String> {
        self.batch(|xy| xy.load_data(path, format))
    }

    /// 最大强度，空图样为 0
    pub fn max_intensity(&self) -> f64 {
        self.xy.max_y().unwrap_or(0.0)
    }

    fn batch<T>(&self, f: impl FnOnce(&XYListStore) -> Result<T>) -> Result<T> {
        self.batch_depth.set(self.batch_depth.get() + 1);
        let result = f(&self.xy);
        self.end_batch(result.is_ok());
        result
    }

    /// 结束一次批量操作，最外层且成功时发出一次 `updated`
    fn end_batch(&self, succeeded: bool) {
        self.batch_depth.set(self.batch_depth.get() - 1);
        if succeeded && self.batch_depth.get() == 0 {
            self.updated.emit(&());
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "xy_data": self.xy.to_json(),
        })
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Rc<Self>> {
        let json: PatternJson = serde_json::from_value(value.clone())?;
        let xy = XYListStore::from_json(&json.xy_data)?;
        Ok(Self::with_store(json.name, xy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter(pattern: &Pattern) -> Rc<Cell<usize>> {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        pattern.connect_updated(move |_| h.set(h.get() + 1));
        hits
    }

    #[test]
    fn test_bulk_update_emits_once() {
        let pattern = Pattern::new("Calculated Profile");
        let hits = counter(&pattern);

        pattern.set_data(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert_eq!(hits.get(), 1);
        pattern.set_data(&[1.0, 2.0, 3.0], &[7.0, 8.0, 9.0]).unwrap();
        assert_eq!(hits.get(), 2);
        pattern.clear();
        assert_eq!(hits.get(), 3);
        assert!(pattern.is_empty());
    }

    #[test]
    fn test_clear_emits_once() {
        let pattern = Pattern::new("p");
        let xs: Vec<f64> = (0..50).map(f64::from).collect();
        pattern.set_data(&xs, &xs).unwrap();
        let hits = counter(&pattern);

        pattern.clear();
        assert_eq!(hits.get(), 1);
        assert!(pattern.is_empty());

        pattern.xy().append(1.0, 1.0);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_point_edit_emits() {
        let pattern = Pattern::new("Experimental Profile");
        let hits = counter(&pattern);
        pattern.xy().append(1.0, 2.0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_failed_update_is_silent() {
        let pattern = Pattern::new("p");
        let hits = counter(&pattern);
        assert!(pattern.set_data(&[1.0], &[1.0, 2.0]).is_err());
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_max_intensity() {
        let pattern = Pattern::new("p");
        assert_eq!(pattern.max_intensity(), 0.0);
        pattern.set_data(&[1.0, 2.0], &[3.0, 8.0]).unwrap();
        assert_eq!(pattern.max_intensity(), 8.0);
    }

    #[test]
    fn test_json_round_trip() {
        let pattern = Pattern::new("Residual");
        pattern.set_data(&[1.0, 2.0], &[3.0, 4.0]).unwrap();
        let decoded = Pattern::from_json(&pattern.to_json()).unwrap();
        assert_eq!(decoded.name(), "Residual");
        assert_eq!(decoded.y_data(), vec![3.0, 4.0]);

        let hits = counter(&decoded);
        decoded.xy().append(3.0, 5.0);
        assert_eq!(hits.get(), 1);
    }
}
