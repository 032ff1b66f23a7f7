//! # 可观察的共享记录
//!
//! 记录可以同时被容器、计算管线和外部视图引用。容器是规范的所有者，
//! 其他持有者保留 `Rc` / `Weak` 句柄。对被观察字段的修改统一经过
//! [`Observable::set`]，从而只有一条通知路径。
//!
//! ## 依赖关系
//! - 被 `models/object_store.rs` 使用
//! - 使用 `models/schema.rs`, `models/signal.rs`

use crate::error::Result;
use crate::models::schema::{FieldValue, Record};
use crate::models::signal::{Signal, SlotId};

use std::cell::{Ref, RefCell};
use std::rc::Rc;

/// 字段变更事件
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    pub field: String,
    pub old: FieldValue,
    pub new: FieldValue,
}

/// 共享记录句柄
pub type Handle<R> = Rc<Observable<R>>;

/// 带字段变更通知的记录单元
pub struct Observable<R: ?Sized> {
    changed: Signal<PropertyChange>,
    value: RefCell<R>,
}

impl<R> Observable<R> {
    pub fn new(value: R) -> Handle<R> {
        Rc::new(Observable {
            changed: Signal::new(),
            value: RefCell::new(value),
        })
    }
}

impl<R: ?Sized> Observable<R> {
    pub fn borrow(&self) -> Ref<'_, R> {
        self.value.borrow()
    }

    /// 直接修改记录（不发送字段通知），用于非观察字段
    pub fn modify<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        f(&mut self.value.borrow_mut())
    }

    pub fn connect<F>(&self, slot: F) -> SlotId
    where
        F: Fn(&PropertyChange) + 'static,
    {
        self.changed.connect(slot)
    }

    pub fn disconnect(&self, id: SlotId) -> bool {
        self.changed.disconnect(id)
    }
}

impl<R: Record + ?Sized> Observable<R> {
    /// 读取字段
    pub fn get(&self, field: &str) -> Option<FieldValue> {
        self.value.borrow().get_field(field)
    }

    /// 写入字段并通知观察者
    ///
    /// 借用在发送通知前释放，监听器可以再次读写同一记录。
    /// 值未变化时不发送通知。
    pub fn set(&self, field: &str, value: FieldValue) -> Result<()> {
        let old = {
            let mut record = self.value.borrow_mut();
            let old = record.get_field(field);
            record.set_field(field, value.clone())?;
            old
        };
        match old {
            Some(old) if old == value => {}
            Some(old) => self.changed.emit(&PropertyChange {
                field: field.to_string(),
                old,
                new: value,
            }),
            None => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::{expect_str, unknown_field};
    use std::cell::Cell;

    struct Label {
        text: String,
    }

    impl Record for Label {
        fn schema_name(&self) -> &str {
            "Label"
        }

        fn get_field(&self, name: &str) -> Option<FieldValue> {
            (name == "text").then(|| self.text.clone().into())
        }

        fn set_field(&mut self, name: &str, value: FieldValue) -> Result<()> {
            if name != "text" {
                return Err(unknown_field("Label", name));
            }
            self.text = expect_str("Label", name, value)?;
            Ok(())
        }
    }

    #[test]
    fn test_set_notifies_with_old_and_new() {
        let label = Observable::new(Label {
            text: "a".to_string(),
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        label.connect(move |change| s.borrow_mut().push(change.clone()));

        label.set("text", "b".into()).unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].old, FieldValue::from("a"));
        assert_eq!(seen[0].new, FieldValue::from("b"));
    }

    #[test]
    fn test_unchanged_value_is_silent() {
        let label = Observable::new(Label {
            text: "a".to_string(),
        });
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        label.connect(move |_| h.set(h.get() + 1));

        label.set("text", "a".into()).unwrap();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_listener_can_read_record() {
        let label = Observable::new(Label {
            text: "a".to_string(),
        });
        let weak = Rc::downgrade(&label);
        let read = Rc::new(RefCell::new(String::new()));
        let r = Rc::clone(&read);
        label.connect(move |_| {
            if let Some(label) = weak.upgrade() {
                *r.borrow_mut() = label.borrow().text.clone();
            }
        });

        label.set("text", "c".into()).unwrap();
        assert_eq!(*read.borrow(), "c");
    }

    #[test]
    fn test_set_unknown_field_fails() {
        let label = Observable::new(Label {
            text: "a".to_string(),
        });
        assert!(label.set("color", "red".into()).is_err());
    }
}
