//! Synchronous, typed notifications emitted by the Run core
//!
//! Observers run to completion, in subscription order, before `emit`
//! returns. They receive the event only; changes they want to make (such
//! as moving focus) go through a [`crate::focus::FocusRequests`] handle and
//! are applied once the current notification round is over.

use indexmap::IndexMap;
use std::fmt;

use crate::types::ParameterKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// The focused artifact changed; `None` when focus was cleared
    FocusChanged { uuid: Option<String> },
    ArtifactRegistered { uuid: String },
    ArtifactDeregistered { uuid: String },
    /// The ordered executor list of a pair changed
    ExecutorsChanged { extension: String, context: String },
    /// A parameter set of a triple was created, updated or deleted
    ParametersChanged { key: ParameterKey, uuid: String },
    Dispatched {
        uuid: String,
        executor_id: String,
        parameters_uuid: String,
        context: String,
    },
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

type Observer = Box<dyn FnMut(&RunEvent)>;

#[derive(Default)]
pub struct EventBus {
    next_id: usize,
    observers: IndexMap<SubscriptionId, Observer>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&RunEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.insert(id, Box::new(observer));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.shift_remove(&id).is_some()
    }

    pub fn emit(&mut self, event: &RunEvent) {
        tracing::trace!("Emitting {:?} to {} observers", event, self.observers.len());
        for observer in self.observers.values_mut() {
            observer(event);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}
