//! # 统一错误处理模块
//!
//! 定义 pyxrd 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分类
//! - 契约违反（类型不匹配、重复键、对象不存在）：调用方的集成错误，立即失败
//! - 数据形状错误（XY 长度不一致、插值越界）
//! - 文件错误（读写失败、格式损坏、解析失败）
//!
//! 数据尚未就绪（无实验数据、无物相）不属于错误，各计算均定义了空结果。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// pyxrd 统一错误类型
#[derive(Error, Debug)]
pub enum PyxrdError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} data ({source_name}), line {line}: {reason}")]
    ParseError {
        format: String,
        source_name: String,
        line: usize,
        reason: String,
    },

    #[error("Corrupt {format} input: {reason}")]
    CorruptInput { format: String, reason: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // 容器契约错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid type, expected {expected} but got {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Duplicate index key '{key}'")]
    DuplicateKey { key: String },

    #[error("Item is already part of this store")]
    DuplicateItem,

    #[error("Item not found in store")]
    ItemNotFound,

    #[error("Unknown field '{field}' for {schema}")]
    UnknownField { schema: String, field: String },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    // ─────────────────────────────────────────────────────────────
    // 数据形状错误
    // ─────────────────────────────────────────────────────────────
    #[error("Shape mismatch: {left} vs {right} points")]
    ShapeMismatch { left: usize, right: usize },

    #[error("Interpolation needs at least 2 points, got {0}")]
    NotEnoughPoints(usize),

    #[error("x = {x} lies outside the interpolation domain [{min}, {max}]")]
    InterpolationDomain { x: f64, min: f64, max: f64 },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },

    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, PyxrdError>;
