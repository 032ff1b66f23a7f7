//! # 信号 / 回调注册
//!
//! 同步、可重入的观察者机制。每个变更操作在释放所有内部借用之后，
//! 依次调用已注册的监听器，并传入类型化的事件。
//!
//! ## 依赖关系
//! - 被 `models/` 下所有容器以及 `xrd/` 下的模型使用
//! - 无外部模块依赖

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// 监听器句柄，用于断开连接
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(u64);

type Slot<E> = Rc<dyn Fn(&E)>;

/// 类型化信号
pub struct Signal<E> {
    slots: RefCell<Vec<(SlotId, Slot<E>)>>,
    next_id: Cell<u64>,
}

impl<E> Signal<E> {
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// 注册监听器
    pub fn connect<F>(&self, slot: F) -> SlotId
    where
        F: Fn(&E) + 'static,
    {
        let id = SlotId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.slots.borrow_mut().push((id, Rc::new(slot)));
        id
    }

    /// 断开监听器，返回是否确实存在
    pub fn disconnect(&self, id: SlotId) -> bool {
        let mut slots = self.slots.borrow_mut();
        let before = slots.len();
        slots.retain(|(slot_id, _)| *slot_id != id);
        slots.len() != before
    }

    /// 同步发送事件
    ///
    /// 先复制监听器列表再逐个调用，监听器内部可以安全地连接、断开或再次触发信号。
    pub fn emit(&self, event: &E) {
        let slots: Vec<Slot<E>> = self
            .slots
            .borrow()
            .iter()
            .map(|(_, slot)| Rc::clone(slot))
            .collect();
        for slot in slots {
            slot(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.slots.borrow().len()
    }
}

impl<E> Default for Signal<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
