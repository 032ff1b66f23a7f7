//! # calculate 命令实现
//!
//! 加载项目，计算所有样品的理论图样，输出拟合指标表。
//!
//! ## 功能
//! - 拟合指标表格（χ², Rp, R²）
//! - 可选导出计算图样与残差（DAT）和指标汇总（CSV）
//! - 可选保存计算后的项目
//!
//! ## 依赖关系
//! - 使用 `cli/calculate.rs` 定义的参数
//! - 使用 `xrd/project.rs`, `xrd/export.rs`

use crate::cli::calculate::CalculateArgs;
use crate::error::{PyxrdError, Result};
use crate::utils::output;
use crate::xrd::export;
use crate::xrd::project::CalculationSummary;
use crate::xrd::Project;

use std::fs;
use tabled::Tabled;

/// 拟合指标表格行
#[derive(Debug, Clone, Tabled)]
struct StatsRow {
    #[tabled(rename = "Specimen")]
    specimen: String,
    #[tabled(rename = "Points")]
    points: usize,
    #[tabled(rename = "χ²")]
    chi2: String,
    #[tabled(rename = "Rp (%)")]
    rp: String,
    #[tabled(rename = "R²")]
    r2: String,
}

impl From<&CalculationSummary> for StatsRow {
    fn from(summary: &CalculationSummary) -> Self {
        Self {
            specimen: summary.specimen.clone(),
            points: summary.points,
            chi2: format!("{:.4}", summary.chi2),
            rp: format!("{:.2}", summary.rp),
            r2: format!("{:.4}", summary.r2),
        }
    }
}

/// 执行 calculate 命令
pub fn execute(args: CalculateArgs) -> Result<()> {
    output::print_header("Pattern Calculation");

    if args.steps < 2 {
        return Err(PyxrdError::InvalidArgument(format!(
            "steps must be at least 2, got {}",
            args.steps
        )));
    }

    let project = Project::load(&args.project)?;
    output::print_info(&format!(
        "Project '{}': {} phase(s), {} specimen(s)",
        project.name(),
        project.phases().len(),
        project.specimens().len()
    ));

    if project.specimens().is_empty() {
        output::print_warning("Project has no specimens");
        return Ok(());
    }

    let summaries = project.calculate_all(args.steps)?;

    let rows: Vec<StatsRow> = summaries.iter().map(StatsRow::from).collect();
    output::print_table("Fit Statistics", &rows);

    if let Some(ref dir) = args.export_dir {
        fs::create_dir_all(dir).map_err(|e| PyxrdError::FileWriteError {
            path: dir.display().to_string(),
            source: e,
        })?;
        let mut written = 0;
        for specimen in project.specimens().items() {
            written += export::specimen_to_dat(&specimen.borrow(), dir)?.len();
        }
        output::print_success(&format!(
            "Exported {} pattern file(s) to '{}'",
            written,
            dir.display()
        ));
    }

    if let Some(ref path) = args.stats_csv {
        export::summaries_to_csv(&summaries, path)?;
        output::print_success(&format!("Statistics saved to '{}'", path.display()));
    }

    let save_path = if args.save_in_place {
        Some(args.project.clone())
    } else {
        args.save.clone()
    };
    if let Some(path) = save_path {
        project.save(&path)?;
        output::print_success(&format!("Project saved to '{}'", path.display()));
    }

    output::print_done(&format!("Calculated {} specimen(s)", summaries.len()));
    Ok(())
}
