//! # 有序对象容器
//!
//! 保存共享记录的有序列表，提供位置访问、可选的唯一键索引、
//! 插入 / 删除 / 重排操作以及变更通知。
//!
//! ## 不变量
//! - 声明索引字段时，键 → 记录在存活记录上是双射
//! - 只有显式的 `reposition` 会改变已有记录的相对顺序
//!
//! ## 键重命名
//! 记录的索引字段被外部修改为另一条存活记录已使用的键时，容器在同一条
//! 观察路径上检测冲突，追加 `_2`、`_3`... 后缀重新写回记录，并用一次性的
//! 抑制标记吞掉由此产生的嵌套通知。
//!
//! ## 依赖关系
//! - 被 `models/index_store.rs`, `xrd/specimen.rs`, `xrd/project.rs` 使用
//! - 使用 `models/observable.rs`, `models/schema.rs`, `models/signal.rs`

use crate::error::{PyxrdError, Result};
use crate::models::observable::{Handle, PropertyChange};
use crate::models::schema::{FieldValue, Record, Schema};
use crate::models::signal::{Signal, SlotId};

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// 容器事件
pub enum ListEvent<R: ?Sized> {
    /// 记录已插入，`position` 为插入后的位置
    Inserted { item: Handle<R>, position: usize },
    /// 记录已移除，`position` 为移除前的位置
    Removed { item: Handle<R>, position: usize },
    /// 记录的某个字段已变化
    Changed { item: Handle<R>, position: usize },
    /// 行已重排，`new_order[i]` 为当前第 i 行的原位置
    Reordered { new_order: Vec<usize> },
}

struct Entry<R: ?Sized> {
    item: Handle<R>,
    slot: SlotId,
}

struct StoreInner<R: ?Sized> {
    schema: Schema,
    entries: RefCell<Vec<Entry<R>>>,
    index: RefCell<HashMap<String, Handle<R>>>,
    rename_guard: RefCell<Option<String>>,
    events: Signal<ListEvent<R>>,
}

/// 有序对象容器
pub struct ObjectListStore<R: Record + ?Sized + 'static> {
    inner: Rc<StoreInner<R>>,
}

impl<R: Record + ?Sized + 'static> ObjectListStore<R> {
    pub fn new(schema: Schema) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                schema,
                entries: RefCell::new(Vec::new()),
                index: RefCell::new(HashMap::new()),
                rename_guard: RefCell::new(None),
                events: Signal::new(),
            }),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 注册容器事件监听器
    pub fn connect<F>(&self, slot: F) -> SlotId
    where
        F: Fn(&ListEvent<R>) + 'static,
    {
        self.inner.events.connect(slot)
    }

    pub fn disconnect(&self, id: SlotId) -> bool {
        self.inner.events.disconnect(id)
    }

    // ─────────────────────────────────────────────────────────────
    // 插入 / 删除
    // ─────────────────────────────────────────────────────────────

    /// 追加记录，返回其位置
    pub fn append(&self, item: Handle<R>) -> Result<usize> {
        let position = self.len();
        self.insert(position, item)
    }

    /// 在指定位置插入记录（超出末尾时追加），返回其位置
    pub fn insert(&self, position: usize, item: Handle<R>) -> Result<usize> {
        let key = {
            let record = item.borrow();
            self.inner.schema.check(&*record)?;
            self.inner.schema.index_key(&*record)
        };
        if self.contains(&item) {
            return Err(PyxrdError::DuplicateItem);
        }
        if let Some(key) = &key {
            if self.inner.index.borrow().contains_key(key) {
                return Err(PyxrdError::DuplicateKey { key: key.clone() });
            }
        }

        let slot = self.observe(&item);
        let position = {
            let mut entries = self.inner.entries.borrow_mut();
            let position = position.min(entries.len());
            entries.insert(
                position,
                Entry {
                    item: Rc::clone(&item),
                    slot,
                },
            );
            position
        };
        if let Some(key) = key {
            self.inner.index.borrow_mut().insert(key, Rc::clone(&item));
        }

        log::debug!(
            "{} store: inserted item at position {}",
            self.inner.schema.name(),
            position
        );
        self.inner
            .events
            .emit(&ListEvent::Inserted { item, position });
        Ok(position)
    }

    /// 移除记录，返回其原位置
    pub fn remove(&self, item: &Handle<R>) -> Result<usize> {
        let position = self.position(item).ok_or(PyxrdError::ItemNotFound)?;
        self.remove_index(position)?;
        Ok(position)
    }

    /// 按位置移除记录
    pub fn remove_at(&self, position: usize) -> Result<Handle<R>> {
        self.remove_index(position)
    }

    fn remove_index(&self, position: usize) -> Result<Handle<R>> {
        let entry = {
            let mut entries = self.inner.entries.borrow_mut();
            if position >= entries.len() {
                return Err(PyxrdError::ItemNotFound);
            }
            entries.remove(position)
        };
        entry.item.disconnect(entry.slot);

        let key = self.inner.schema.index_key(&*entry.item.borrow());
        if let Some(key) = key {
            let mut index = self.inner.index.borrow_mut();
            if index
                .get(&key)
                .map_or(false, |held| Rc::ptr_eq(held, &entry.item))
            {
                index.remove(&key);
            }
        }

        self.inner.events.emit(&ListEvent::Removed {
            item: Rc::clone(&entry.item),
            position,
        });
        Ok(entry.item)
    }

    /// 清空容器
    pub fn clear(&self) {
        self.clear_with(|_| {});
    }

    /// 清空容器，每移除一条记录后调用 `callback`
    ///
    /// 从末尾开始逐个移除，移除过程中尚未处理的位置不会移动。
    pub fn clear_with<F>(&self, mut callback: F)
    where
        F: FnMut(&Handle<R>),
    {
        while let Some(last) = self.len().checked_sub(1) {
            if let Ok(item) = self.remove_index(last) {
                callback(&item);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // 查询
    // ─────────────────────────────────────────────────────────────

    pub fn contains(&self, item: &Handle<R>) -> bool {
        self.position(item).is_some()
    }

    pub fn position(&self, item: &Handle<R>) -> Option<usize> {
        self.inner
            .entries
            .borrow()
            .iter()
            .position(|entry| Rc::ptr_eq(&entry.item, item))
    }

    /// 按位置取记录
    pub fn get(&self, position: usize) -> Option<Handle<R>> {
        self.inner
            .entries
            .borrow()
            .get(position)
            .map(|entry| Rc::clone(&entry.item))
    }

    /// 当前记录的快照
    pub fn items(&self) -> Vec<Handle<R>> {
        self.inner
            .entries
            .borrow()
            .iter()
            .map(|entry| Rc::clone(&entry.item))
            .collect()
    }

    /// 按索引键取记录，键不存在时返回 `None`
    pub fn get_by_index(&self, key: &str) -> Option<Handle<R>> {
        self.inner.index.borrow().get(key).cloned()
    }

    pub fn index_in_model(&self, key: &str) -> bool {
        self.inner.index.borrow().contains_key(key)
    }

    /// 当前所有索引键
    pub fn keys(&self) -> Vec<String> {
        self.inner.index.borrow().keys().cloned().collect()
    }

    // ─────────────────────────────────────────────────────────────
    // 修改
    // ─────────────────────────────────────────────────────────────

    /// 视图编辑路径：写入某条记录的一列
    pub fn set_value(&self, item: &Handle<R>, column: &str, value: FieldValue) -> Result<()> {
        if !self.contains(item) {
            return Err(PyxrdError::ItemNotFound);
        }
        self.inner.schema.check_value(column, &value)?;
        item.set(column, value)
    }

    /// 将记录移动到新位置（超出末尾时移动到最后）
    pub fn reposition(&self, item: &Handle<R>, new_position: usize) -> Result<()> {
        let new_order = {
            let mut entries = self.inner.entries.borrow_mut();
            let old_position = entries
                .iter()
                .position(|entry| Rc::ptr_eq(&entry.item, item))
                .ok_or(PyxrdError::ItemNotFound)?;
            let new_position = new_position.min(entries.len() - 1);
            if old_position == new_position {
                return Ok(());
            }
            let entry = entries.remove(old_position);
            entries.insert(new_position, entry);
            reorder_permutation(entries.len(), old_position, new_position)
        };
        self.inner
            .events
            .emit(&ListEvent::Reordered { new_order });
        Ok(())
    }

    pub fn move_item_up(&self, item: &Handle<R>) -> Result<()> {
        let position = self.position(item).ok_or(PyxrdError::ItemNotFound)?;
        if position > 0 {
            self.reposition(item, position - 1)?;
        }
        Ok(())
    }

    pub fn move_item_down(&self, item: &Handle<R>) -> Result<()> {
        let position = self.position(item).ok_or(PyxrdError::ItemNotFound)?;
        if position + 1 < self.len() {
            self.reposition(item, position + 1)?;
        }
        Ok(())
    }

    fn observe(&self, item: &Handle<R>) -> SlotId {
        let store = Rc::downgrade(&self.inner);
        let weak_item = Rc::downgrade(item);
        item.connect(move |change| {
            if let (Some(store), Some(item)) = (store.upgrade(), weak_item.upgrade()) {
                store.on_item_changed(&item, change);
            }
        })
    }
}

impl<R: Record + ?Sized + 'static> StoreInner<R> {
    fn on_item_changed(&self, item: &Handle<R>, change: &PropertyChange) {
        if let Some(column) = self.schema.index_column() {
            if change.field == column.name {
                let guarded = matches!(
                    (self.rename_guard.borrow().as_deref(), change.new.as_str()),
                    (Some(guard), Some(new)) if guard == new
                );
                if guarded {
                    self.rename_guard.borrow_mut().take();
                    return;
                }
                self.rekey(item);
            }
        }

        let position = self
            .entries
            .borrow()
            .iter()
            .position(|entry| Rc::ptr_eq(&entry.item, item));
        if let Some(position) = position {
            self.events.emit(&ListEvent::Changed {
                item: Rc::clone(item),
                position,
            });
        }
    }

    /// 按记录当前的键重建该记录的索引项。
    ///
    /// 同一记录可能位于多个列表中，嵌套的重命名通知会乱序到达，
    /// 因此不信任通知中的新旧值，只读取记录本身。
    fn rekey(&self, item: &Handle<R>) {
        self.index
            .borrow_mut()
            .retain(|_, held| !Rc::ptr_eq(held, item));
        let current = self.schema.index_key(&*item.borrow());
        let current = match current {
            Some(key) => key,
            None => return,
        };

        let key = if self.index.borrow().contains_key(&current) {
            let unique = self.unique_key(&current);
            log::warn!(
                "{}: index key '{}' already in use, renaming to '{}'",
                self.schema.name(),
                current,
                unique
            );
            let column = self
                .schema
                .index_column()
                .map(|c| c.name.clone())
                .unwrap_or_default();
            *self.rename_guard.borrow_mut() = Some(unique.clone());
            let result = item.set(&column, FieldValue::Str(unique.clone()));
            self.rename_guard.borrow_mut().take();
            if let Err(e) = result {
                log::error!("{}: failed to rename item: {}", self.schema.name(), e);
            }
            // 嵌套通知可能已写入其他键
            self.index
                .borrow_mut()
                .retain(|_, held| !Rc::ptr_eq(held, item));
            unique
        } else {
            current
        };

        self.index.borrow_mut().insert(key, Rc::clone(item));
    }

    fn unique_key(&self, key: &str) -> String {
        let index = self.index.borrow();
        (2..)
            .map(|n| format!("{}_{}", key, n))
            .find(|candidate| !index.contains_key(candidate))
            .unwrap_or_else(|| key.to_string())
    }
}

impl<R: ?Sized> Drop for StoreInner<R> {
    fn drop(&mut self) {
        for entry in self.entries.get_mut().iter() {
            entry.item.disconnect(entry.slot);
        }
    }
}

/// 计算重排后的行映射：`new_order[i]` 为新第 i 行的原位置
pub fn reorder_permutation(len: usize, old_position: usize, new_position: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    if old_position < len && new_position < len {
        let moved = order.remove(old_position);
        order.insert(new_position, moved);
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::observable::Observable;
    use crate::models::schema::{expect_f64, expect_str, unknown_field, FieldType};
    use std::cell::Cell;

    struct Mineral {
        name: String,
        fraction: f64,
    }

    impl Record for Mineral {
        fn schema_name(&self) -> &str {
            "Mineral"
        }

        fn get_field(&self, name: &str) -> Option<FieldValue> {
            match name {
                "name" => Some(self.name.clone().into()),
                "fraction" => Some(self.fraction.into()),
                _ => None,
            }
        }

        fn set_field(&mut self, name: &str, value: FieldValue) -> Result<()> {
            match name {
                "name" => self.name = expect_str("Mineral", name, value)?,
                "fraction" => self.fraction = expect_f64("Mineral", name, value)?,
                _ => return Err(unknown_field("Mineral", name)),
            }
            Ok(())
        }
    }

    struct Rock;

    impl Record for Rock {
        fn schema_name(&self) -> &str {
            "Rock"
        }

        fn get_field(&self, _name: &str) -> Option<FieldValue> {
            None
        }

        fn set_field(&mut self, name: &str, _value: FieldValue) -> Result<()> {
            Err(unknown_field("Rock", name))
        }
    }

    fn schema() -> Schema {
        Schema::new(
            "Mineral",
            &[("name", FieldType::Str), ("fraction", FieldType::Float)],
        )
    }

    fn indexed() -> ObjectListStore<Mineral> {
        ObjectListStore::new(schema().with_index("name").unwrap())
    }

    fn mineral(name: &str) -> Handle<Mineral> {
        Observable::new(Mineral {
            name: name.to_string(),
            fraction: 0.0,
        })
    }

    fn names(store: &ObjectListStore<Mineral>) -> Vec<String> {
        store
            .items()
            .iter()
            .map(|item| item.borrow().name.clone())
            .collect()
    }

    fn assert_bijection(store: &ObjectListStore<Mineral>) {
        let items = store.items();
        let mut keys = store.keys();
        keys.sort();
        let mut names: Vec<String> = items.iter().map(|i| i.borrow().name.clone()).collect();
        names.sort();
        assert_eq!(keys, names);
        for item in &items {
            let key = item.borrow().name.clone();
            let held = store.get_by_index(&key).unwrap();
            assert!(Rc::ptr_eq(&held, item));
        }
    }

    #[test]
    fn test_append_emits_inserted_with_position() {
        let store = indexed();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        store.connect(move |event| {
            if let ListEvent::Inserted { item, position } = event {
                s.borrow_mut().push((item.borrow().name.clone(), *position));
            }
        });

        store.append(mineral("illite")).unwrap();
        store.append(mineral("kaolinite")).unwrap();
        store.insert(0, mineral("chlorite")).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                ("illite".to_string(), 0),
                ("kaolinite".to_string(), 1),
                ("chlorite".to_string(), 0)
            ]
        );
        assert_eq!(names(&store), vec!["chlorite", "illite", "kaolinite"]);
    }

    #[test]
    fn test_insert_past_end_appends() {
        let store = indexed();
        store.append(mineral("a")).unwrap();
        assert_eq!(store.insert(10, mineral("b")).unwrap(), 1);
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let store: ObjectListStore<dyn Record> = ObjectListStore::new(schema());
        let rock: Handle<dyn Record> = Observable::new(Rock);
        assert!(matches!(
            store.append(rock),
            Err(PyxrdError::TypeMismatch { .. })
        ));
        let ok: Handle<dyn Record> = Observable::new(Mineral {
            name: "smectite".to_string(),
            fraction: 1.0,
        });
        assert!(store.append(ok).is_ok());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let store = indexed();
        store.append(mineral("illite")).unwrap();
        assert!(matches!(
            store.append(mineral("illite")),
            Err(PyxrdError::DuplicateKey { .. })
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_same_item_twice_rejected() {
        let store = ObjectListStore::new(schema());
        let item = mineral("a");
        store.append(Rc::clone(&item)).unwrap();
        assert!(matches!(
            store.append(item),
            Err(PyxrdError::DuplicateItem)
        ));
    }

    #[test]
    fn test_remove_absent_item_fails() {
        let store = indexed();
        assert!(matches!(
            store.remove(&mineral("ghost")),
            Err(PyxrdError::ItemNotFound)
        ));
    }

    #[test]
    fn test_remove_updates_index_and_emits() {
        let store = indexed();
        let a = mineral("a");
        store.append(Rc::clone(&a)).unwrap();
        store.append(mineral("b")).unwrap();

        let removed = Rc::new(RefCell::new(Vec::new()));
        let r = Rc::clone(&removed);
        store.connect(move |event| {
            if let ListEvent::Removed { item, position } = event {
                r.borrow_mut().push((item.borrow().name.clone(), *position));
            }
        });

        assert_eq!(store.remove(&a).unwrap(), 0);
        assert!(store.get_by_index("a").is_none());
        assert_eq!(*removed.borrow(), vec![("a".to_string(), 0)]);
        assert_bijection(&store);
    }

    #[test]
    fn test_index_bijection_under_mutation() {
        let store = indexed();
        let mut held = Vec::new();
        for i in 0..20 {
            let item = mineral(&format!("m{}", i));
            store.append(Rc::clone(&item)).unwrap();
            held.push(item);
            if i % 3 == 2 {
                let victim = held.remove(i % held.len());
                store.remove(&victim).unwrap();
            }
            assert_bijection(&store);
        }
    }

    #[test]
    fn test_get_by_missing_key_is_none() {
        let store = indexed();
        assert!(store.get_by_index("nothing").is_none());
        assert!(!store.index_in_model("nothing"));
    }

    #[test]
    fn test_reposition_emits_permutation() {
        let store = indexed();
        for name in ["a", "b", "c", "d"] {
            store.append(mineral(name)).unwrap();
        }
        let orders = Rc::new(RefCell::new(Vec::new()));
        let o = Rc::clone(&orders);
        store.connect(move |event| {
            if let ListEvent::Reordered { new_order } = event {
                o.borrow_mut().push(new_order.clone());
            }
        });

        let a = store.get(0).unwrap();
        store.reposition(&a, 2).unwrap();

        assert_eq!(names(&store), vec!["b", "c", "a", "d"]);
        assert_eq!(*orders.borrow(), vec![vec![1, 2, 0, 3]]);
    }

    #[test]
    fn test_reposition_same_position_is_noop() {
        let store = indexed();
        store.append(mineral("a")).unwrap();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        store.connect(move |_| h.set(h.get() + 1));

        let a = store.get(0).unwrap();
        store.reposition(&a, 0).unwrap();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_move_up_and_down() {
        let store = indexed();
        for name in ["a", "b", "c"] {
            store.append(mineral(name)).unwrap();
        }
        let c = store.get(2).unwrap();
        store.move_item_up(&c).unwrap();
        assert_eq!(names(&store), vec!["a", "c", "b"]);
        store.move_item_down(&c).unwrap();
        store.move_item_down(&c).unwrap();
        assert_eq!(names(&store), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_clear_removes_in_reverse_order() {
        let store = indexed();
        for name in ["a", "b", "c"] {
            store.append(mineral(name)).unwrap();
        }
        let positions = Rc::new(RefCell::new(Vec::new()));
        let p = Rc::clone(&positions);
        store.connect(move |event| {
            if let ListEvent::Removed { position, .. } = event {
                p.borrow_mut().push(*position);
            }
        });

        let mut cleared = Vec::new();
        store.clear_with(|item| cleared.push(item.borrow().name.clone()));

        assert_eq!(*positions.borrow(), vec![2, 1, 0]);
        assert_eq!(cleared, vec!["c", "b", "a"]);
        assert!(store.is_empty());
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_field_change_emits_changed() {
        let store = indexed();
        let a = mineral("a");
        store.append(Rc::clone(&a)).unwrap();
        store.append(mineral("b")).unwrap();

        let changed = Rc::new(RefCell::new(Vec::new()));
        let c = Rc::clone(&changed);
        store.connect(move |event| {
            if let ListEvent::Changed { position, .. } = event {
                c.borrow_mut().push(*position);
            }
        });

        store.set_value(&a, "fraction", 0.5.into()).unwrap();
        assert_eq!(*changed.borrow(), vec![0]);
        assert_eq!(a.borrow().fraction, 0.5);
    }

    #[test]
    fn test_set_value_checks_column_type() {
        let store = indexed();
        let a = mineral("a");
        store.append(Rc::clone(&a)).unwrap();
        assert!(store.set_value(&a, "fraction", "high".into()).is_err());
        assert!(store.set_value(&a, "colour", "red".into()).is_err());
    }

    #[test]
    fn test_rename_updates_index() {
        let store = indexed();
        let a = mineral("a");
        store.append(Rc::clone(&a)).unwrap();

        a.set("name", "z".into()).unwrap();

        assert!(store.get_by_index("a").is_none());
        assert!(Rc::ptr_eq(&store.get_by_index("z").unwrap(), &a));
        assert_bijection(&store);
    }

    #[test]
    fn test_rename_collision_is_disambiguated() {
        let store = indexed();
        let a = mineral("a");
        let b = mineral("b");
        store.append(Rc::clone(&a)).unwrap();
        store.append(Rc::clone(&b)).unwrap();

        let changed = Rc::new(Cell::new(0));
        let c = Rc::clone(&changed);
        store.connect(move |event| {
            if let ListEvent::Changed { .. } = event {
                c.set(c.get() + 1);
            }
        });

        b.set("name", "a".into()).unwrap();

        assert_eq!(b.borrow().name, "a_2");
        assert!(Rc::ptr_eq(&store.get_by_index("a").unwrap(), &a));
        assert!(Rc::ptr_eq(&store.get_by_index("a_2").unwrap(), &b));
        assert!(store.get_by_index("b").is_none());
        assert_eq!(changed.get(), 1);
        assert_bijection(&store);

        // 后续重命名不再被抑制
        b.set("name", "c".into()).unwrap();
        assert!(Rc::ptr_eq(&store.get_by_index("c").unwrap(), &b));
        assert_bijection(&store);
    }

    #[test]
    fn test_rename_collision_picks_next_free_suffix() {
        let store = indexed();
        store.append(mineral("a")).unwrap();
        store.append(mineral("a_2")).unwrap();
        let c = mineral("c");
        store.append(Rc::clone(&c)).unwrap();

        c.set("name", "a".into()).unwrap();
        assert_eq!(c.borrow().name, "a_3");
        assert_bijection(&store);
    }

    #[test]
    fn test_rename_collision_in_one_of_two_stores() {
        let first = indexed();
        let second = indexed();
        let shared = mineral("x");
        first.append(Rc::clone(&shared)).unwrap();
        second.append(mineral("a")).unwrap();
        second.append(Rc::clone(&shared)).unwrap();

        shared.set("name", "a".into()).unwrap();

        assert_eq!(shared.borrow().name, "a_2");
        assert_eq!(first.keys(), vec!["a_2".to_string()]);
        let mut keys = second.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "a_2".to_string()]);
        assert_bijection(&first);
        assert_bijection(&second);
    }

    #[test]
    fn test_rename_collision_in_first_connected_store() {
        let first = indexed();
        let second = indexed();
        let shared = mineral("x");
        first.append(mineral("a")).unwrap();
        first.append(Rc::clone(&shared)).unwrap();
        second.append(Rc::clone(&shared)).unwrap();

        shared.set("name", "a".into()).unwrap();

        assert_eq!(shared.borrow().name, "a_2");
        assert_eq!(second.keys(), vec!["a_2".to_string()]);
        assert_bijection(&first);
        assert_bijection(&second);
    }

    #[test]
    fn test_removed_item_no_longer_observed() {
        let store = indexed();
        let a = mineral("a");
        store.append(Rc::clone(&a)).unwrap();
        store.remove(&a).unwrap();

        a.set("name", "b".into()).unwrap();
        assert!(store.get_by_index("b").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_reorder_permutation() {
        assert_eq!(reorder_permutation(4, 3, 0), vec![3, 0, 1, 2]);
        assert_eq!(reorder_permutation(3, 0, 2), vec![1, 2, 0]);
    }
}
