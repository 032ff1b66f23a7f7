//! # 带唯一键的有序容器
//!
//! [`ObjectListStore`] 的特化：模式必须声明索引字段，键 → 记录的查找总是可用。
//!
//! ## 依赖关系
//! - 被 `xrd/project.rs` 使用（物相列表按名称索引）
//! - 使用 `models/object_store.rs`

use crate::error::{PyxrdError, Result};
use crate::models::object_store::ObjectListStore;
use crate::models::observable::Handle;
use crate::models::schema::{Record, Schema};

use std::ops::Deref;

pub struct IndexListStore<R: Record + ?Sized + 'static> {
    store: ObjectListStore<R>,
}

impl<R: Record + ?Sized + 'static> IndexListStore<R> {
    /// 创建容器，模式未声明索引字段时返回错误
    pub fn new(schema: Schema) -> Result<Self> {
        if schema.index_column().is_none() {
            return Err(PyxrdError::InvalidSchema(format!(
                "{} has no index column",
                schema.name()
            )));
        }
        Ok(Self {
            store: ObjectListStore::new(schema),
        })
    }

    pub fn get_item_by_index(&self, key: &str) -> Option<Handle<R>> {
        self.store.get_by_index(key)
    }

    /// 索引字段名
    pub fn index_column(&self) -> &str {
        self.store
            .schema()
            .index_column()
            .map(|column| column.name.as_str())
            .unwrap_or_default()
    }
}

impl<R: Record + ?Sized + 'static> Deref for IndexListStore<R> {
    type Target = ObjectListStore<R>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::observable::Observable;
    use crate::models::schema::{expect_str, unknown_field, FieldType, FieldValue};

    struct Tag {
        key: String,
    }

    impl Record for Tag {
        fn schema_name(&self) -> &str {
            "Tag"
        }

        fn get_field(&self, name: &str) -> Option<FieldValue> {
            (name == "key").then(|| self.key.clone().into())
        }

        fn set_field(&mut self, name: &str, value: FieldValue) -> Result<()> {
            if name != "key" {
                return Err(unknown_field("Tag", name));
            }
            self.key = expect_str("Tag", name, value)?;
            Ok(())
        }
    }

    fn tag(key: &str) -> Handle<Tag> {
        Observable::new(Tag {
            key: key.to_string(),
        })
    }

    #[test]
    fn test_requires_index_column() {
        let plain = Schema::new("Tag", &[("key", FieldType::Str)]);
        assert!(IndexListStore::<Tag>::new(plain.clone()).is_err());
        assert!(IndexListStore::<Tag>::new(plain.with_index("key").unwrap()).is_ok());
    }

    #[test]
    fn test_lookup_by_key() {
        let schema = Schema::new("Tag", &[("key", FieldType::Str)])
            .with_index("key")
            .unwrap();
        let store = IndexListStore::new(schema).unwrap();
        let a = tag("a");
        store.append(a.clone()).unwrap();
        store.append(tag("b")).unwrap();

        assert_eq!(store.index_column(), "key");
        assert!(std::rc::Rc::ptr_eq(&store.get_item_by_index("a").unwrap(), &a));
        assert!(store.get_item_by_index("missing").is_none());
        assert_eq!(store.len(), 2);
    }
}
