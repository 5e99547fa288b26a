//! 单操作管理器
//!
//! 每个机械臂实例最多允许一个逻辑运动操作在途
//! （MoveToJointPositions / MoveThroughJointPositions 等）。
//! 开始新操作会取消上一个操作的令牌；上一个操作在下一个
//! 流式步之间观察到取消并尽快退出，绝不在帧中途打断。

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 单操作管理器
#[derive(Debug, Default)]
pub struct OperationManager {
    slot: Mutex<Option<Arc<AtomicBool>>>,
}

impl OperationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始一个新操作，取消并顶替任何在途操作
    pub fn begin(&self) -> OperationHandle<'_> {
        let token = Arc::new(AtomicBool::new(false));
        let mut slot = self.slot.lock();
        if let Some(prev) = slot.replace(token.clone()) {
            prev.store(true, Ordering::SeqCst);
        }
        OperationHandle { mgr: self, token }
    }

    /// 是否有操作在途
    pub fn op_running(&self) -> bool {
        self.slot.lock().is_some()
    }

    fn finish(&self, token: &Arc<AtomicBool>) {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|cur| Arc::ptr_eq(cur, token)) {
            *slot = None;
        }
    }
}

/// 在途操作句柄
///
/// 流式执行器在相邻两帧之间调用 [`cancelled`](Self::cancelled)；
/// 句柄 drop 时操作结束（若仍是当前操作则清空槽位）。
#[derive(Debug)]
pub struct OperationHandle<'a> {
    mgr: &'a OperationManager,
    token: Arc<AtomicBool>,
}

impl OperationHandle<'_> {
    /// 本操作是否已被取消（被新操作顶替或被 Stop/Close 终止）
    pub fn cancelled(&self) -> bool {
        self.token.load(Ordering::SeqCst)
    }
}

impl Drop for OperationHandle<'_> {
    fn drop(&mut self) {
        self.mgr.finish(&self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_and_finish() {
        let mgr = OperationManager::new();
        assert!(!mgr.op_running());
        {
            let op = mgr.begin();
            assert!(mgr.op_running());
            assert!(!op.cancelled());
        }
        assert!(!mgr.op_running());
    }

    #[test]
    fn test_new_operation_cancels_previous() {
        let mgr = OperationManager::new();
        let first = mgr.begin();
        assert!(!first.cancelled());

        let second = mgr.begin();
        assert!(first.cancelled());
        assert!(!second.cancelled());
    }

    /// 被顶替的旧句柄 drop 时不能清掉新操作的槽位
    #[test]
    fn test_superseded_drop_keeps_current() {
        let mgr = OperationManager::new();
        let first = mgr.begin();
        let second = mgr.begin();
        drop(first);
        assert!(mgr.op_running());
        assert!(!second.cancelled());
        drop(second);
        assert!(!mgr.op_running());
    }
}
