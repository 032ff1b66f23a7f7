//! # convert 命令实现
//!
//! 批量将 BIN 二进制扫描转换为两列 DAT 文本（样品名作为标题行）。
//!
//! ## 功能
//! - 单文件与目录输入
//! - 并行处理（rayon）
//! - 已存在的输出默认跳过
//!
//! ## 依赖关系
//! - 使用 `cli/convert.rs` 定义的参数
//! - 使用 `batch/` 模块进行批量处理
//! - 使用 `models/xy_store.rs` 读写数据

use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::convert::ConvertArgs;
use crate::error::{PyxrdError, Result};
use crate::models::XYListStore;
use crate::parsers::DataFormat;
use crate::utils::output;

use std::fs;
use std::path::{Path, PathBuf};

/// 执行 convert 命令
pub fn execute(args: ConvertArgs) -> Result<()> {
    output::print_header("Converting BIN scans to DAT");

    if !args.input.exists() {
        return Err(PyxrdError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    fs::create_dir_all(&args.output).map_err(|e| PyxrdError::FileWriteError {
        path: args.output.display().to_string(),
        source: e,
    })?;

    if args.input.is_file() {
        return execute_single_file(&args);
    }

    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .collect();

    if files.is_empty() {
        return Err(PyxrdError::NoFilesFound {
            pattern: args.input.join(&args.pattern).display().to_string(),
        });
    }

    output::print_info(&format!("Found {} files to convert", files.len()));

    let runner = BatchRunner::new(args.jobs);
    let result = runner.run(files, |file| {
        convert_file(file, &args.output, args.overwrite)
    })?;

    output::print_separator();
    output::print_done(&format!(
        "Converted {} file(s) into '{}' ({} skipped, {} failed)",
        result.success,
        args.output.display(),
        result.skipped,
        result.failed
    ));

    if result.failed > 0 {
        return Err(PyxrdError::Other(format!(
            "{} of {} file(s) failed to convert",
            result.failed,
            result.total()
        )));
    }
    Ok(())
}

/// 单文件模式
fn execute_single_file(args: &ConvertArgs) -> Result<()> {
    let output_path = dat_path(&args.input, &args.output);
    match convert_file(&args.input, &args.output, args.overwrite) {
        ProcessResult::Success(_) => {
            output::print_conversion(
                &args.input.display().to_string(),
                &output_path.display().to_string(),
            );
            Ok(())
        }
        ProcessResult::Skipped(msg) => {
            output::print_warning(&msg);
            Ok(())
        }
        ProcessResult::Failed(_, err) => Err(PyxrdError::Other(err)),
    }
}

fn dat_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("pattern");
    output_dir.join(format!("{}.dat", stem))
}

/// 转换单个文件
fn convert_file(input: &PathBuf, output_dir: &Path, overwrite: bool) -> ProcessResult {
    let output_path = dat_path(input, output_dir);

    if output_path.exists() && !overwrite {
        return ProcessResult::Skipped(format!(
            "Output exists, skipping: {}",
            output_path.display()
        ));
    }

    match bin_to_dat(input, &output_path) {
        Ok(points) => {
            log::debug!("{}: {} points", input.display(), points);
            ProcessResult::Success(format!("{} -> {}", input.display(), output_path.display()))
        }
        Err(e) => ProcessResult::Failed(input.display().to_string(), e.to_string()),
    }
}

fn bin_to_dat(input: &Path, output: &Path) -> Result<usize> {
    let xy = XYListStore::new();
    let sample = xy.load_data(input, DataFormat::Bin)?;
    xy.save_data(&sample, output)?;
    Ok(xy.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::bin::encode_bin;
    use crate::parsers::dat::parse_dat_file;
    use tempfile::tempdir;

    fn args(input: PathBuf, output: PathBuf) -> ConvertArgs {
        ConvertArgs {
            input,
            output,
            recursive: false,
            pattern: "*.bin".to_string(),
            jobs: 1,
            overwrite: false,
        }
    }

    #[test]
    fn test_convert_directory() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        fs::write(
            dir.path().join("scan.bin"),
            encode_bin("Illite", 0.02, 5.0, &[1, 2, 3, 4, 5]),
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        execute(args(dir.path().to_path_buf(), out.clone())).unwrap();

        let dat = parse_dat_file(&out.join("scan.dat"), true).unwrap();
        assert_eq!(dat.header.as_deref(), Some("Illite"));
        assert_eq!(dat.y, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(!out.join("notes.dat").exists());
    }

    #[test]
    fn test_empty_directory_reports_no_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let result = execute(args(dir.path().to_path_buf(), dir.path().join("out")));
        match result {
            Err(PyxrdError::NoFilesFound { pattern }) => assert!(pattern.ends_with("*.bin")),
            other => panic!("expected NoFilesFound, got {:?}", other),
        }
    }

    #[test]
    fn test_existing_output_is_skipped() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("scan.bin");
        fs::write(&input, encode_bin("A", 0.02, 5.0, &[1, 2])).unwrap();
        fs::write(dir.path().join("scan.dat"), "keep").unwrap();

        let result = convert_file(&input, dir.path(), false);
        assert!(matches!(result, ProcessResult::Skipped(_)));
        assert_eq!(fs::read_to_string(dir.path().join("scan.dat")).unwrap(), "keep");

        let result = convert_file(&input, dir.path(), true);
        assert!(matches!(result, ProcessResult::Success(_)));
    }

    #[test]
    fn test_corrupt_input_fails() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("bad.bin");
        fs::write(&input, b"short").unwrap();
        assert!(matches!(
            convert_file(&input, dir.path(), false),
            ProcessResult::Failed(_, _)
        ));
        assert!(execute(args(input, dir.path().join("out"))).is_err());
    }
}
