// Transient user-facing notices (the toast area of the TUI).

use std::collections::VecDeque;

use crate::api::ApiError;

pub const MAX_NOTICES: usize = 4;
/// Event-loop ticks a notice stays visible.
pub const NOTICE_TICKS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn from_error(err: &ApiError) -> Self {
        Self::error(err.user_message())
    }
}

#[derive(Debug)]
struct Entry {
    notice: Notice,
    ticks_left: u32,
}

/// Bounded FIFO; pushing past capacity drops the oldest notice.
#[derive(Debug)]
pub struct NoticeQueue {
    entries: VecDeque<Entry>,
    capacity: usize,
    lifetime: u32,
}

impl Default for NoticeQueue {
    fn default() -> Self {
        Self::new(MAX_NOTICES, NOTICE_TICKS)
    }
}

impl NoticeQueue {
    pub fn new(capacity: usize, lifetime: u32) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            lifetime,
        }
    }

    pub fn push(&mut self, notice: Notice) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Entry {
            notice,
            ticks_left: self.lifetime,
        });
    }

    pub fn tick(&mut self) {
        for entry in &mut self.entries {
            entry.ticks_left = entry.ticks_left.saturating_sub(1);
        }
        self.entries.retain(|e| e.ticks_left > 0);
    }

    pub fn dismiss_all(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.entries.iter().map(|e| &e.notice)
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.entries.back().map(|e| &e.notice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GENERIC_FAILURE;

    #[test]
    fn oldest_notice_is_dropped_at_capacity() {
        let mut queue = NoticeQueue::new(2, 5);
        queue.push(Notice::info("one"));
        queue.push(Notice::info("two"));
        queue.push(Notice::success("three"));
        let messages: Vec<_> = queue.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["two", "three"]);
        assert_eq!(queue.latest().map(|n| n.level), Some(NoticeLevel::Success));
    }

    #[test]
    fn notices_expire_after_their_ticks() {
        let mut queue = NoticeQueue::new(4, 2);
        queue.push(Notice::info("first"));
        queue.tick();
        queue.push(Notice::info("second"));
        queue.tick();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.latest().map(|n| n.message.as_str()), Some("second"));
        queue.tick();
        assert!(queue.is_empty());
    }

    #[test]
    fn error_notices_use_the_user_message() {
        let rejected = ApiError::Rejected {
            message: "Booking already has a shipment".to_string(),
        };
        assert_eq!(
            Notice::from_error(&rejected).message,
            "Booking already has a shipment"
        );

        let blank = ApiError::Rejected {
            message: "  ".to_string(),
        };
        let notice = Notice::from_error(&blank);
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, GENERIC_FAILURE);
    }
}
