//! sessionId → 事件通道的對照表
//!
//! 用戶端先以 sessionId 訂閱 SSE，再送出比價請求（順序也可相反）；
//! 事件在兩端都到齊前暫存在通道中。執行結束且已被訂閱後移除對照。

use crate::domain::model::RunEvent;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

struct Slot {
    sender: Option<UnboundedSender<RunEvent>>,
    receiver: Option<UnboundedReceiver<RunEvent>>,
    finished: bool,
}

impl Slot {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            sender: Some(tx),
            receiver: Some(rx),
            finished: false,
        }
    }
}

#[derive(Clone, Default)]
pub struct ProgressHub {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl ProgressHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 取得執行端的 sender；同一個 sessionId 只能開始一次
    pub fn start(&self, session_id: &str) -> Option<UnboundedSender<RunEvent>> {
        let mut slots = self.slots();
        slots
            .entry(session_id.to_string())
            .or_insert_with(Slot::new)
            .sender
            .take()
    }

    /// 取得訂閱端的 receiver；同一個 sessionId 只能訂閱一次
    pub fn subscribe(&self, session_id: &str) -> Option<UnboundedReceiver<RunEvent>> {
        let mut slots = self.slots();
        let slot = slots
            .entry(session_id.to_string())
            .or_insert_with(Slot::new);
        let receiver = slot.receiver.take();
        let finished = slot.finished;

        if receiver.is_some() && finished {
            slots.remove(session_id);
        }
        receiver
    }

    /// 終止事件已送出
    pub fn finish(&self, session_id: &str) {
        let mut slots = self.slots();
        if let Some(slot) = slots.get_mut(session_id) {
            slot.finished = true;
            if slot.receiver.is_none() {
                slots.remove(session_id);
            }
        }
        tracing::debug!("🧹 Session {} finished ({} active)", session_id, slots.len());
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
