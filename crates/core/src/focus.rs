//! Focused artifact and queued focus requests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// The single focused-artifact field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusState {
    focused: Option<String>,
}

impl FocusState {
    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Store a new value; returns false when it equals the current one
    pub fn set(&mut self, uuid: Option<String>) -> bool {
        if self.focused == uuid {
            return false;
        }
        self.focused = uuid;
        true
    }
}

/// Cloneable handle for asking the core to move focus later.
///
/// Requests made while observers are being notified are applied, in
/// order, after the notification round completes.
#[derive(Debug, Clone, Default)]
pub struct FocusRequests {
    queue: Arc<Mutex<VecDeque<Option<String>>>>,
}

impl FocusRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, uuid: Option<&str>) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(uuid.map(str::to_string));
    }

    pub(crate) fn pop(&self) -> Option<Option<String>> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}
