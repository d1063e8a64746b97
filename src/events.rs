//! Graph-mutation events and the broadcast bus that carries them to the view.
//!
//! Events hold only identifiers and deltas. A subscriber that needs the full node
//! reads it back from the store.

use crate::geometry::{Point, Rect};
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    AddNode {
        node_id: String,
    },
    RemoveNodes {
        node_ids: Vec<String>,
    },
    AddLink {
        link_id: String,
        from: String,
        from_port: String,
        to: String,
        to_port: String,
    },
    /// `key` is `"{node_id}-{port_id}"` for a port sweep, or the link id for a single removal.
    RemoveLinks {
        key: String,
        link_ids: Vec<String>,
    },
    Collapse {
        node_ids: Vec<String>,
        collapsed: bool,
    },
    Selection {
        node_ids: Vec<String>,
    },
    SelectionArea {
        area: Option<Rect>,
    },
    DragSelection {
        delta: Point,
    },
    ViewportOffset {
        offset: Point,
    },
    ViewportZoom {
        zoom: f64,
    },
    DrawTempLink {
        from: String,
        from_port: String,
        to: Option<Point>,
    },
}

impl GraphEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GraphEvent::AddNode { .. } => "AddNode",
            GraphEvent::RemoveNodes { .. } => "RemoveNodes",
            GraphEvent::AddLink { .. } => "AddLink",
            GraphEvent::RemoveLinks { .. } => "RemoveLinks",
            GraphEvent::Collapse { .. } => "Collapse",
            GraphEvent::Selection { .. } => "Selection",
            GraphEvent::SelectionArea { .. } => "SelectionArea",
            GraphEvent::DragSelection { .. } => "DragSelection",
            GraphEvent::ViewportOffset { .. } => "ViewportOffset",
            GraphEvent::ViewportZoom { .. } => "ViewportZoom",
            GraphEvent::DrawTempLink { .. } => "DrawTempLink",
        }
    }
}

/// One emitted event as seen by subscribers.
///
/// `handled` is advisory: a subscriber may set it so later subscribers in the same
/// dispatch pass can skip duplicate work. The bus does not enforce it.
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub sequence: u64,
    event: Rc<GraphEvent>,
    pub handled: bool,
}

impl EventEnvelope {
    pub fn event(&self) -> &GraphEvent {
        &self.event
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&mut EventEnvelope)>;

/// In-order broadcast to every current subscriber, with a bounded diagnostic history.
///
/// New subscribers do not receive past events.
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    history: VecDeque<EventEnvelope>,
    history_limit: usize,
    next_sequence: u64,
    next_subscription: u64,
}

impl EventBus {
    pub fn new(history_limit: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            history: VecDeque::with_capacity(history_limit),
            history_limit,
            next_sequence: 0,
            next_subscription: 0,
        }
    }

    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&mut EventEnvelope) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn emit(&mut self, event: GraphEvent) {
        let mut envelope = EventEnvelope {
            sequence: self.next_sequence,
            event: Rc::new(event),
            handled: false,
        };
        self.next_sequence += 1;

        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&mut envelope);
        }

        if self.history_limit == 0 {
            return;
        }
        if self.history.len() == self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(envelope);
    }

    /// The retained events, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &EventEnvelope> {
        self.history.iter()
    }

    pub fn last(&self) -> Option<&GraphEvent> {
        self.history.back().map(|e| e.event())
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("history", &self.history.len())
            .field("history_limit", &self.history_limit)
            .finish()
    }
}
