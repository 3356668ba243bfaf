//! Per-sheet message log
//!
//! Every distinct message is kept once for the lifetime of a sheet and
//! forwarded to the `log` facade the first time it is seen. Messages are
//! told apart by their text unless recorded under an explicit key.

use std::fmt;

use rustc_hash::FxHashSet;

/// Severity of a logged message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub level: MessageLevel,
    pub text: String,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            MessageLevel::Info => write!(f, "info: {}", self.text),
            MessageLevel::Warning => write!(f, "warning: {}", self.text),
        }
    }
}

/// Deduplicated warnings and notices collected by a [`Sheet`](crate::Sheet)
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    seen: FxHashSet<String>,
    entries: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning. Returns `false` if the same text was already logged.
    pub fn warn(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        self.push(MessageLevel::Warning, text.clone(), text)
    }

    /// Record a warning deduplicated by `key` instead of its text
    pub fn warn_keyed(&mut self, key: impl Into<String>, text: impl Into<String>) -> bool {
        self.push(MessageLevel::Warning, key.into(), text.into())
    }

    /// Record a notice. Returns `false` if the same text was already logged.
    pub fn info(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        self.push(MessageLevel::Info, text.clone(), text)
    }

    fn push(&mut self, level: MessageLevel, key: String, text: String) -> bool {
        if !self.seen.insert(key) {
            return false;
        }
        match level {
            MessageLevel::Warning => log::warn!("{text}"),
            MessageLevel::Info => log::info!("{text}"),
        }
        self.entries.push(Message { level, text });
        true
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.iter().any(|m| m.text == text)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Message> {
        self.entries
            .iter()
            .filter(|m| m.level == MessageLevel::Warning)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
        self.entries.clear();
    }
}
