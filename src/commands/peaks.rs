//! # peaks 命令实现
//!
//! 将实验图样载入样品，按给定或自动选择的阈值检测峰并添加标记。
//!
//! ## 功能
//! - DAT / BIN 输入（按扩展名推断或显式指定）
//! - 阈值扫描自动选择（`ThresholdSelector`）
//! - 标记表格输出，可选导出 CSV
//!
//! ## 依赖关系
//! - 使用 `cli/peaks.rs` 定义的参数
//! - 使用 `xrd/specimen.rs`, `xrd/peaks.rs`, `xrd/marker.rs`

use crate::cli::peaks::{InputFormat, PeaksArgs};
use crate::error::{PyxrdError, Result};
use crate::parsers::{self, DataFormat};
use crate::utils::output;
use crate::xrd::marker::{save_markers_csv, Marker};
use crate::xrd::{Goniometer, PatternSource, Specimen, ThresholdSelector};

use tabled::Tabled;

/// 标记表格行
#[derive(Debug, Clone, Tabled)]
struct MarkerRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "2θ (°)")]
    two_theta: String,
    #[tabled(rename = "d (nm)")]
    label: String,
}

/// 执行 peaks 命令
pub fn execute(args: PeaksArgs) -> Result<()> {
    output::print_header("Peak Detection");

    let (specimen, goniometer) = load_specimen(&args)?;
    output::print_info(&format!(
        "Loaded '{}' ({} points, sample '{}')",
        specimen.name(),
        specimen.experimental().len(),
        specimen.sample()
    ));
    output::print_info(&format!(
        "Using wavelength: {:.4} Å",
        goniometer.wavelength * 10.0
    ));

    let threshold = match args.threshold {
        Some(threshold) if !(0.0..=1.0).contains(&threshold) => {
            return Err(PyxrdError::InvalidArgument(format!(
                "threshold must lie in [0, 1], got {}",
                threshold
            )));
        }
        Some(threshold) => threshold,
        None => {
            let threshold = select_threshold(&specimen, args.max_threshold, args.steps)?;
            output::print_info(&format!("Auto-selected threshold: {:.4}", threshold));
            threshold
        }
    };

    let added = specimen.auto_add_peaks(&goniometer, threshold, PatternSource::Experimental)?;
    let markers = collect_markers(&specimen);

    if added == 0 {
        output::print_warning("No peaks found above the threshold");
    } else {
        let rows: Vec<MarkerRow> = markers
            .iter()
            .enumerate()
            .map(|(i, marker)| MarkerRow {
                index: i + 1,
                two_theta: format!("{:.3}", marker.position),
                label: marker.label.clone(),
            })
            .collect();
        output::print_table(&format!("{} Peak Marker(s)", added), &rows);
    }

    if let Some(ref path) = args.csv {
        save_markers_csv(&markers, path)?;
        output::print_success(&format!("Markers saved to '{}'", path.display()));
    }

    Ok(())
}

fn load_specimen(args: &PeaksArgs) -> Result<(Specimen, Goniometer)> {
    let format = match args.format {
        Some(InputFormat::Dat) => DataFormat::Dat,
        Some(InputFormat::Bin) => DataFormat::Bin,
        None => parsers::detect_format(&args.file)?,
    };
    let specimen = Specimen::from_experimental_data(&args.file, format)?;
    let goniometer = Goniometer::default().with_wavelength_angstrom(args.wavelength);
    Ok((specimen, goniometer))
}

/// 扫描阈值并返回自动选择的结果
fn select_threshold(specimen: &Specimen, max_threshold: f64, steps: usize) -> Result<f64> {
    let mut selector = ThresholdSelector::new();
    selector.set_max_threshold(max_threshold);
    selector.set_steps(steps);
    let (x, y) = specimen.experimental().xy().data();
    selector.update(&x, &y)?;
    log::debug!(
        "threshold sweep: {:?} -> selected {} ({} peaks)",
        selector.threshold_plot_data(),
        selector.sel_threshold(),
        selector.sel_num_peaks()
    );
    Ok(selector.sel_threshold())
}

fn collect_markers(specimen: &Specimen) -> Vec<Marker> {
    specimen
        .markers()
        .items()
        .iter()
        .map(|marker| marker.borrow().clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xrd::marker::load_markers_csv;
    use std::fmt::Write;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn write_scan(path: &Path) {
        let mut content = String::from("Kaolinite\n");
        for i in 0..500 {
            let x = 3.0 + i as f64 * 0.05;
            let y = 10.0 + 100.0 * (-((x - 8.85) / 0.2_f64).powi(2)).exp();
            writeln!(content, "{:.8} {:.8}", x, y).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn args(file: PathBuf, threshold: Option<f64>, csv: Option<PathBuf>) -> PeaksArgs {
        PeaksArgs {
            file,
            format: None,
            threshold,
            max_threshold: 0.32,
            steps: 20,
            wavelength: 1.5406,
            csv,
        }
    }

    #[test]
    fn test_peaks_to_csv() {
        let dir = tempdir().unwrap();
        let scan = dir.path().join("scan.dat");
        let csv = dir.path().join("markers.csv");
        write_scan(&scan);

        execute(args(scan, Some(0.05), Some(csv.clone()))).unwrap();

        let markers = load_markers_csv(&csv).unwrap();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].label, "0.998");
        assert!((markers[0].position - 8.85).abs() < 1e-6);
    }

    #[test]
    fn test_load_specimen_uses_header_as_sample() {
        let dir = tempdir().unwrap();
        let scan = dir.path().join("scan.dat");
        write_scan(&scan);

        let (specimen, goniometer) = load_specimen(&args(scan, None, None)).unwrap();
        assert_eq!(specimen.sample(), "Kaolinite");
        assert_eq!(specimen.experimental().len(), 500);
        assert!((goniometer.wavelength - 0.15406).abs() < 1e-12);
    }

    #[test]
    fn test_auto_threshold_runs() {
        let dir = tempdir().unwrap();
        let scan = dir.path().join("scan.dat");
        write_scan(&scan);
        assert!(execute(args(scan, None, None)).is_ok());
    }

    #[test]
    fn test_threshold_out_of_range() {
        let dir = tempdir().unwrap();
        let scan = dir.path().join("scan.dat");
        write_scan(&scan);
        assert!(matches!(
            execute(args(scan, Some(1.5), None)),
            Err(PyxrdError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unknown_extension() {
        assert!(matches!(
            execute(args(PathBuf::from("scan.cif"), Some(0.1), None)),
            Err(PyxrdError::UnsupportedFormat(_))
        ));
    }
}
