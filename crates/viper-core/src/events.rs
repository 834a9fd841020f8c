//! Typed editor events over a single in-process channel.
//!
//! Producers (the text core, background jobs, file I/O) hold an [`EventSender`] and fire events
//! without knowing who listens. The owning thread calls [`EventBus::dispatch`] to deliver pending
//! events to every subscriber, in send order.

use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::trace;

/// Something that happened in the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// The buffer changed: `removed` chars at `start` were replaced by `inserted` chars.
    TextChanged {
        /// Start character offset.
        start: usize,
        /// Removed length in characters.
        removed: usize,
        /// Inserted length in characters.
        inserted: usize,
    },
    /// Undo/redo availability flipped.
    HistoryChanged {
        /// Undo is possible.
        can_undo: bool,
        /// Redo is possible.
        can_redo: bool,
    },
    /// Highlight spans were recomputed for `window`.
    HighlightUpdated {
        /// Re-highlighted character window.
        window: Range<usize>,
    },
    /// A new document replaced the buffer.
    DocumentLoaded {
        /// Length in characters.
        len: usize,
    },
    /// The document was written to disk.
    Saved,
    /// A search finished with this many matches.
    SearchFinished {
        /// Number of matches.
        matches: usize,
    },
    /// Transient message for the user (e.g. a filesystem error).
    Notice(String),
}

/// Subscriber callback type.
pub type EventCallback = Box<dyn FnMut(&EditorEvent) + Send>;

/// Clonable, thread-safe handle for sending events.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<EditorEvent>,
}

impl EventSender {
    /// Fire `event`. Returns `false` if the bus is gone (the event is dropped).
    pub fn send(&self, event: EditorEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// The event channel plus its subscribers.
pub struct EventBus {
    tx: Sender<EditorEvent>,
    rx: Receiver<EditorEvent>,
    callbacks: Vec<EventCallback>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.callbacks.len())
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            callbacks: Vec::new(),
        }
    }

    /// A new sender for this bus.
    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// Subscribe to events.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&EditorEvent) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.callbacks.len()
    }

    /// Deliver all pending events to every subscriber. Returns the number of events delivered.
    pub fn dispatch(&mut self) -> usize {
        let mut delivered = 0;
        while let Ok(event) = self.rx.try_recv() {
            trace!(?event, "dispatch");
            for callback in &mut self.callbacks {
                callback(&event);
            }
            delivered += 1;
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[test]
    fn test_dispatch_reaches_every_subscriber_in_order() {
        let mut bus = EventBus::new();
        let seen_a = Arc::new(Mutex::new(Vec::new()));
        let seen_b = Arc::new(Mutex::new(0usize));

        let a = Arc::clone(&seen_a);
        bus.subscribe(move |event| a.lock().unwrap().push(event.clone()));
        let b = Arc::clone(&seen_b);
        bus.subscribe(move |_| *b.lock().unwrap() += 1);

        let sender = bus.sender();
        sender.send(EditorEvent::Saved);
        sender.send(EditorEvent::Notice("hi".into()));

        assert_eq!(bus.dispatch(), 2);
        assert_eq!(
            *seen_a.lock().unwrap(),
            vec![EditorEvent::Saved, EditorEvent::Notice("hi".into())]
        );
        assert_eq!(*seen_b.lock().unwrap(), 2);
        assert_eq!(bus.dispatch(), 0);
    }

    #[test]
    fn test_send_from_background_thread() {
        let mut bus = EventBus::new();
        let sender = bus.sender();
        thread::spawn(move || sender.send(EditorEvent::SearchFinished { matches: 3 }))
            .join()
            .unwrap();

        let got = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&got);
        bus.subscribe(move |event| *slot.lock().unwrap() = Some(event.clone()));
        bus.dispatch();
        assert_eq!(
            *got.lock().unwrap(),
            Some(EditorEvent::SearchFinished { matches: 3 })
        );
    }

    #[test]
    fn test_send_after_bus_dropped() {
        let bus = EventBus::new();
        let sender = bus.sender();
        drop(bus);
        assert!(!sender.send(EditorEvent::Saved));
    }
}
