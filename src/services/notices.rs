//! Notice board — dismissible warnings surfaced alongside fallback data.
//!
//! Bounded, newest first. When full, the oldest notice is dropped.

use std::collections::VecDeque;

use serde::Serialize;
use time::OffsetDateTime;

pub const NOTICE_CAPACITY: usize = 50;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NoticeError {
    #[error("notice not found: {0}")]
    NotFound(u64),
}

impl crate::error::ErrorCode for NoticeError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_NOTICE_NOT_FOUND",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub severity: Severity,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NoticeBoard {
    items: VecDeque<Notice>,
    capacity: usize,
    next_id: u64,
}

impl NoticeBoard {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { items: VecDeque::with_capacity(capacity), capacity: capacity.max(1), next_id: 1 }
    }

    /// Post a notice and return its id.
    pub fn push(&mut self, severity: Severity, message: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        if self.items.len() == self.capacity {
            self.items.pop_back();
        }
        self.items.push_front(Notice { id, severity, message: message.into(), at: OffsetDateTime::now_utc() });
        id
    }

    /// Newest first.
    #[must_use]
    pub fn list(&self) -> Vec<Notice> {
        self.items.iter().cloned().collect()
    }

    /// Remove a notice.
    ///
    /// # Errors
    ///
    /// Returns [`NoticeError::NotFound`] if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> Result<(), NoticeError> {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        if self.items.len() == before {
            return Err(NoticeError::NotFound(id));
        }
        Ok(())
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(NOTICE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_lists_newest_first() {
        let mut board = NoticeBoard::default();
        board.push(Severity::Info, "first");
        board.push(Severity::Warning, "second");
        let list = board.list();
        assert_eq!(list[0].message, "second");
        assert_eq!(list[1].message, "first");
    }

    #[test]
    fn push_evicts_oldest_when_full() {
        let mut board = NoticeBoard::new(2);
        board.push(Severity::Info, "a");
        board.push(Severity::Info, "b");
        board.push(Severity::Info, "c");
        let messages: Vec<_> = board.list().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["c", "b"]);
    }

    #[test]
    fn dismiss_removes_once() {
        let mut board = NoticeBoard::default();
        let id = board.push(Severity::Error, "rag down");
        assert_eq!(board.dismiss(id), Ok(()));
        assert_eq!(board.dismiss(id), Err(NoticeError::NotFound(id)));
        assert!(board.list().is_empty());
    }
}
