//! # 记录模式描述
//!
//! 容器不解释记录字段的语义，只关心字段类型与可选的唯一索引字段。
//! 模式（Schema）显式地传入容器构造函数：有序的 (字段名, 类型) 列表，
//! 以及可选的索引字段。
//!
//! ## 依赖关系
//! - 被 `models/object_store.rs`, `models/observable.rs` 使用
//! - 被 `xrd/` 下的记录类型（Marker, Specimen, Phase）实现

use crate::error::{PyxrdError, Result};

use std::fmt;

/// 字段类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Float,
    Int,
    Bool,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Str => write!(f, "str"),
            FieldType::Float => write!(f, "float"),
            FieldType::Int => write!(f, "int"),
            FieldType::Bool => write!(f, "bool"),
        }
    }
}

/// 字段值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Float(f64),
    Int(i64),
    Bool(bool),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Str(_) => FieldType::Str,
            FieldValue::Float(_) => FieldType::Float,
            FieldValue::Int(_) => FieldType::Int,
            FieldValue::Bool(_) => FieldType::Bool,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// 整数字段也可以按浮点读取
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => write!(f, "{}", s),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// 记录：具有固定字段模式的外部类型
pub trait Record {
    /// 模式名称，用于容器的类型检查
    fn schema_name(&self) -> &str;

    /// 读取字段，未知字段返回 `None`
    fn get_field(&self, name: &str) -> Option<FieldValue>;

    /// 写入字段，未知字段或类型不符返回错误
    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<()>;
}

/// 单个列定义
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: FieldType,
}

/// 模式描述
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    columns: Vec<Column>,
    index_column: Option<usize>,
}

impl Schema {
    /// 创建无索引字段的模式
    pub fn new(name: impl Into<String>, columns: &[(&str, FieldType)]) -> Self {
        Schema {
            name: name.into(),
            columns: columns
                .iter()
                .map(|(name, kind)| Column {
                    name: name.to_string(),
                    kind: *kind,
                })
                .collect(),
            index_column: None,
        }
    }

    /// 指定索引字段，该字段必须存在且为字符串类型
    pub fn with_index(mut self, column: &str) -> Result<Self> {
        let position = self.column_index(column).ok_or_else(|| {
            PyxrdError::InvalidSchema(format!(
                "index column '{}' is not a column of {}",
                column, self.name
            ))
        })?;
        if self.columns[position].kind != FieldType::Str {
            return Err(PyxrdError::InvalidSchema(format!(
                "index column '{}' of {} must be a str column",
                column, self.name
            )));
        }
        self.index_column = Some(position);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn index_column(&self) -> Option<&Column> {
        self.index_column.map(|i| &self.columns[i])
    }

    /// 读取记录的索引键（若模式声明了索引字段）
    pub fn index_key<R: Record + ?Sized>(&self, record: &R) -> Option<String> {
        let column = self.index_column()?;
        match record.get_field(&column.name) {
            Some(FieldValue::Str(key)) => Some(key),
            _ => None,
        }
    }

    /// 类型检查：模式名称一致，且每一列都存在并具有声明的类型
    pub fn check<R: Record + ?Sized>(&self, record: &R) -> Result<()> {
        if record.schema_name() != self.name {
            return Err(PyxrdError::TypeMismatch {
                expected: self.name.clone(),
                found: record.schema_name().to_string(),
            });
        }
        for column in &self.columns {
            match record.get_field(&column.name) {
                Some(value) if value.field_type() == column.kind => {}
                Some(value) => {
                    return Err(PyxrdError::TypeMismatch {
                        expected: format!("{}.{}: {}", self.name, column.name, column.kind),
                        found: value.field_type().to_string(),
                    })
                }
                None => {
                    return Err(PyxrdError::UnknownField {
                        schema: self.name.clone(),
                        field: column.name.clone(),
                    })
                }
            }
        }
        Ok(())
    }

    /// 校验即将写入某列的值类型
    pub fn check_value(&self, column: &str, value: &FieldValue) -> Result<()> {
        let position = self
            .column_index(column)
            .ok_or_else(|| PyxrdError::UnknownField {
                schema: self.name.clone(),
                field: column.to_string(),
            })?;
        let kind = self.columns[position].kind;
        if value.field_type() != kind {
            return Err(PyxrdError::TypeMismatch {
                expected: format!("{}.{}: {}", self.name, column, kind),
                found: value.field_type().to_string(),
            });
        }
        Ok(())
    }
}

/// 记录实现 `set_field` 时的类型转换辅助函数
pub fn expect_str(schema: &str, field: &str, value: FieldValue) -> Result<String> {
    match value {
        FieldValue::Str(s) => Ok(s),
        other => Err(type_error(schema, field, FieldType::Str, &other)),
    }
}

pub fn expect_f64(schema: &str, field: &str, value: FieldValue) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| type_error(schema, field, FieldType::Float, &value))
}

pub fn expect_i64(schema: &str, field: &str, value: FieldValue) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| type_error(schema, field, FieldType::Int, &value))
}

pub fn expect_bool(schema: &str, field: &str, value: FieldValue) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| type_error(schema, field, FieldType::Bool, &value))
}

/// 未知字段错误
pub fn unknown_field(schema: &str, field: &str) -> PyxrdError {
    PyxrdError::UnknownField {
        schema: schema.to_string(),
        field: field.to_string(),
    }
}

fn type_error(schema: &str, field: &str, expected: FieldType, found: &FieldValue) -> PyxrdError {
    PyxrdError::TypeMismatch {
        expected: format!("{}.{}: {}", schema, field, expected),
        found: found.field_type().to_string(),
    }
}
