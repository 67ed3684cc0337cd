//! Destinations for the human-readable lines flight instructions emit.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

/// Receives one line of text per notification, without a trailing newline.
pub trait NotificationSink {
    fn notify(&mut self, line: &str);
}

/// Writes each notification followed by a newline.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> NotificationSink for WriterSink<W> {
    fn notify(&mut self, line: &str) {
        let _ = writeln!(self.writer, "{line}");
    }
}

/// Collects notifications in memory. Clones share the same buffer, so a test
/// can keep one handle and give the other to an engine.
#[derive(Debug, Clone, Default)]
pub struct BufferedSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for BufferedSink {
    fn notify(&mut self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&mut self, _line: &str) {}
}
