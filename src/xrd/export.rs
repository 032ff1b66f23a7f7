//! # 数据导出
//!
//! ## 支持格式
//! - DAT: 计算图样与残差（标题行 + 两列 `%.8f`）
//! - CSV: 各样品的拟合指标汇总
//!
//! ## 依赖关系
//! - 被 `commands/calculate.rs` 调用
//! - 使用 `xrd/specimen.rs`, `xrd/project.rs` 的结构
//! - 使用 `csv` 库写入 CSV 文件

use crate::error::{PyxrdError, Result};
use crate::xrd::project::CalculationSummary;
use crate::xrd::specimen::Specimen;

use std::path::{Path, PathBuf};

/// 导出样品的计算图样与残差为 DAT，返回写出的文件路径
pub fn specimen_to_dat(specimen: &Specimen, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let stem = file_stem(specimen.name());
    let mut written = Vec::new();

    if !specimen.calculated().is_empty() {
        let path = output_dir.join(format!("{}_calculated.dat", stem));
        specimen
            .calculated()
            .xy()
            .save_data(&format!("{} (calculated)", specimen.sample()), &path)?;
        written.push(path);
    }

    let residual = specimen.statistics().residual();
    if !residual.is_empty() {
        let path = output_dir.join(format!("{}_residual.dat", stem));
        residual
            .xy()
            .save_data(&format!("{} (residual)", specimen.sample()), &path)?;
        written.push(path);
    }

    Ok(written)
}

/// 导出拟合指标为 CSV
pub fn summaries_to_csv(summaries: &[CalculationSummary], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record(["specimen", "points", "chi2", "Rp", "R2"])?;
    for summary in summaries {
        wtr.write_record(&[
            summary.specimen.clone(),
            summary.points.to_string(),
            format!("{:.6}", summary.chi2),
            format!("{:.4}", summary.rp),
            format!("{:.6}", summary.r2),
        ])?;
    }

    wtr.flush().map_err(|e| PyxrdError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 样品名称去掉扩展名后作为输出文件名
fn file_stem(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    if stem.is_empty() {
        "specimen".to_string()
    } else {
        stem.replace(char::is_whitespace, "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xrd::goniometer::Goniometer;
    use crate::xrd::phase::{Reflection, ReflectionPhase};
    use tempfile::tempdir;

    #[test]
    fn test_specimen_to_dat() {
        let dir = tempdir().unwrap();
        let mut specimen = Specimen::new("kga 1.dat", "KGa-1");
        specimen.add_phase(
            ReflectionPhase::new(
                "Kaolinite",
                vec![Reflection {
                    d: 0.715,
                    intensity: 100.0,
                    fwhm: 0.3,
                }],
            )
            .into_handle(),
            1.0,
        );
        specimen.calculate_pattern(&Goniometer::default(), 20).unwrap();

        let written = specimen_to_dat(&specimen, dir.path()).unwrap();
        assert_eq!(written, vec![dir.path().join("kga_1_calculated.dat")]);
        let content = std::fs::read_to_string(&written[0]).unwrap();
        assert!(content.starts_with("KGa-1 (calculated)\n"));
        assert_eq!(content.lines().count(), 21);
    }

    #[test]
    fn test_summaries_to_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let summaries = vec![CalculationSummary {
            specimen: "s1".to_string(),
            points: 10,
            chi2: 1.5,
            rp: 12.25,
            r2: 0.875,
        }];
        summaries_to_csv(&summaries, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "specimen,points,chi2,Rp,R2\ns1,10,1.500000,12.2500,0.875000\n");
    }
}
