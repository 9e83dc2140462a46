//! Change notifications emitted by the document model.
//!
//! Delivery is single-threaded and queued: [`EventHub::emit`] appends the
//! event to every live [`Subscription`], and the subscriber drains its queue
//! in emission order. A write into the model from inside a handler only
//! enqueues further events, so handlers are never re-entered.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::{Rc, Weak};

use crate::model::{Annotation, ChangeType, ContentNode, PropertyPath};
use crate::ops::Diff;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// A node entered the model (not yet placed in any view)
    NodeCreated(ContentNode),
    NodeDeleted(String),
    /// A property was replaced wholesale
    PropertySet { path: PropertyPath, value: String },
    /// A property was changed by a diff
    PropertyUpdated { path: PropertyPath, diff: Diff },
    /// The whole graph was replaced
    GraphReset,
    SelectionChanged,
    AnnotationChanged {
        change: ChangeType,
        annotation: Annotation,
    },
}

#[derive(Debug, Default)]
struct HubState {
    next_id: u64,
    queues: BTreeMap<u64, VecDeque<ModelEvent>>,
}

/// Fan-out point for model events
#[derive(Debug, Clone, Default)]
pub struct EventHub {
    state: Rc<RefCell<HubState>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.queues.insert(id, VecDeque::new());

        Subscription {
            id,
            state: Rc::downgrade(&self.state),
        }
    }

    pub fn emit(&self, event: ModelEvent) {
        let mut state = self.state.borrow_mut();
        for queue in state.queues.values_mut() {
            queue.push_back(event.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().queues.len()
    }
}

/// A live subscription to an [`EventHub`]; dropping it unsubscribes
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    state: Weak<RefCell<HubState>>,
}

impl Subscription {
    /// Pop the oldest pending event
    pub fn next_event(&self) -> Option<ModelEvent> {
        let state = self.state.upgrade()?;
        let mut state = state.borrow_mut();
        state.queues.get_mut(&self.id)?.pop_front()
    }

    pub fn pending(&self) -> usize {
        let Some(state) = self.state.upgrade() else {
            return 0;
        };
        let state = state.borrow();
        state.queues.get(&self.id).map_or(0, VecDeque::len)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            state.borrow_mut().queues.remove(&self.id);
        }
    }
}
