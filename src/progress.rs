//! Progress reporting for the multi-phase decode/encode steps.
//! Rendering belongs to the caller; the core only reports.

use std::cell::RefCell;
use std::rc::Rc;

pub trait Progress {
    fn start(&mut self, title: &str, total_steps: usize);
    fn advance(&mut self, step: usize);
    fn label(&mut self, text: &str);
    fn done(&mut self);
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&mut self, _title: &str, _total_steps: usize) {}
    fn advance(&mut self, _step: usize) {}
    fn label(&mut self, _text: &str) {}
    fn done(&mut self) {}
}

/// Emits progress as `info` log lines.
#[derive(Debug, Default)]
pub struct TracingProgress {
    title: String,
    total: usize,
}

impl Progress for TracingProgress {
    fn start(&mut self, title: &str, total_steps: usize) {
        self.title = title.to_string();
        self.total = total_steps;
        tracing::info!(title, total_steps, "started");
    }

    fn advance(&mut self, step: usize) {
        tracing::debug!(title = %self.title, step, total = self.total, "progress");
    }

    fn label(&mut self, text: &str) {
        tracing::info!(title = %self.title, "{text}");
    }

    fn done(&mut self) {
        tracing::info!(title = %self.title, "done");
    }
}

/// Records every call; clones share the same log, so a clone can be handed to a
/// session and inspected afterwards.
#[derive(Debug, Default, Clone)]
pub struct RecordingProgress {
    events: Rc<RefCell<Vec<ProgressEvent>>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.borrow().clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Start(String, usize),
    Advance(usize),
    Label(String),
    Done,
}

impl Progress for RecordingProgress {
    fn start(&mut self, title: &str, total_steps: usize) {
        self.events
            .borrow_mut()
            .push(ProgressEvent::Start(title.to_string(), total_steps));
    }

    fn advance(&mut self, step: usize) {
        self.events.borrow_mut().push(ProgressEvent::Advance(step));
    }

    fn label(&mut self, text: &str) {
        self.events
            .borrow_mut()
            .push(ProgressEvent::Label(text.to_string()));
    }

    fn done(&mut self) {
        self.events.borrow_mut().push(ProgressEvent::Done);
    }
}
