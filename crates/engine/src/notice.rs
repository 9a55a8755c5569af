use std::collections::VecDeque;

use dealboard_core::{DealId, NoticeId, Stage};

/// A dismissible, non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub deal_id: DealId,
    /// The stage the deal could not be moved to.
    pub stage: Stage,
    pub message: String,
}

/// Bounded FIFO of notices; the oldest is dropped when full.
#[derive(Debug)]
pub struct NoticeQueue {
    capacity: usize,
    items: VecDeque<Notice>,
}

impl NoticeQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, notice: Notice) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(notice);
    }

    pub fn dismiss(&mut self, id: NoticeId) -> bool {
        let before = self.items.len();
        self.items.retain(|notice| notice.id != id);
        self.items.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter()
    }

    pub fn take_all(&mut self) -> Vec<Notice> {
        self.items.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
