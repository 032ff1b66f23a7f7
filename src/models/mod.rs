//! # 数据模型模块
//!
//! 可观察的列表数据模型层：有序对象容器、带唯一键的容器以及列式 XY 序列。
//! 视图与绘图层只消费这里发出的通知。
//!
//! ## 依赖关系
//! - 被 `xrd/` 和 `commands/` 使用
//! - 子模块: signal, schema, observable, object_store, index_store, xy_store

pub mod index_store;
pub mod object_store;
pub mod observable;
pub mod schema;
pub mod signal;
pub mod xy_store;

pub use index_store::IndexListStore;
pub use object_store::{ListEvent, ObjectListStore};
pub use observable::{Handle, Observable, PropertyChange};
pub use schema::{FieldType, FieldValue, Record, Schema};
pub use signal::{Signal, SlotId};
pub use xy_store::{Point, XYListStore, XyEvent};
