//! # 排除区间
//!
//! 排除区间保存在 XY 容器中：x 为区间起点，y 为区间终点（顺序可颠倒）。
//! 落在任一闭区间内的点被排除，区间之间取并集，可以重叠、不要求有序。
//!
//! ## 依赖关系
//! - 被 `xrd/specimen.rs`, `xrd/statistics.rs` 使用
//! - 使用 `models/xy_store.rs`

use crate::models::xy_store::XYListStore;
use crate::xrd::pattern::Pattern;

/// 一对索引对齐的 (x, y) 序列
pub type Series = (Vec<f64>, Vec<f64>);

/// 保留掩码：`true` 表示该点不在任何排除区间内
pub fn exclusion_selector(x: &[f64], ranges: &XYListStore) -> Vec<bool> {
    let ranges: Vec<(f64, f64)> = ranges
        .points()
        .into_iter()
        .map(|p| (p.x.min(p.y), p.x.max(p.y)))
        .collect();
    x.iter()
        .map(|&v| !ranges.iter().any(|&(lo, hi)| lo <= v && v <= hi))
        .collect()
}

/// 按掩码过滤序列
pub fn apply_mask(xs: &[f64], ys: &[f64], mask: &[bool]) -> Series {
    xs.iter()
        .zip(ys.iter())
        .zip(mask.iter())
        .filter(|(_, &keep)| keep)
        .map(|((&x, &y), _)| (x, y))
        .unzip()
}

/// 对实验与计算图样应用同一排除掩码
///
/// 计算图样与实验图样点数不同时（例如尚未重新计算），计算图样按自身的 x 过滤。
pub fn exclusion_xy(experimental: &Pattern, calculated: &Pattern, ranges: &XYListStore) -> (Series, Series) {
    let (ex, ey) = experimental.xy().data();
    let (cx, cy) = calculated.xy().data();

    let exp_mask = exclusion_selector(&ex, ranges);
    let calc_mask = if cx.len() == ex.len() {
        exp_mask.clone()
    } else {
        exclusion_selector(&cx, ranges)
    };

    (apply_mask(&ex, &ey, &exp_mask), apply_mask(&cx, &cy, &calc_mask))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_of_ranges() {
        let ranges = XYListStore::from_data(&[2.0, 6.0], &[4.0, 8.0]).unwrap();
        let mask = exclusion_selector(&[1.0, 3.0, 5.0, 7.0, 9.0], &ranges);
        assert_eq!(mask, vec![true, false, true, false, true]);
    }

    #[test]
    fn test_reversed_and_overlapping_ranges() {
        let ranges = XYListStore::from_data(&[4.0, 3.0], &[2.0, 6.0]).unwrap();
        let mask = exclusion_selector(&[1.0, 2.0, 5.0, 6.0, 6.5], &ranges);
        assert_eq!(mask, vec![true, false, false, false, true]);
    }

    #[test]
    fn test_no_ranges_keeps_everything() {
        let mask = exclusion_selector(&[1.0, 2.0], &XYListStore::new());
        assert_eq!(mask, vec![true, true]);
    }

    #[test]
    fn test_exclusion_xy_keeps_alignment() {
        let exp = Pattern::new("exp");
        let calc = Pattern::new("calc");
        exp.set_data(&[1.0, 2.0, 3.0], &[10.0, 20.0, 30.0]).unwrap();
        calc.set_data(&[1.0, 2.0, 3.0], &[11.0, 21.0, 31.0]).unwrap();
        let ranges = XYListStore::from_data(&[1.5], &[2.5]).unwrap();

        let ((ex, ey), (cx, cy)) = exclusion_xy(&exp, &calc, &ranges);
        assert_eq!(ex, vec![1.0, 3.0]);
        assert_eq!(ey, vec![10.0, 30.0]);
        assert_eq!(cx, ex);
        assert_eq!(cy, vec![11.0, 31.0]);
    }
}
