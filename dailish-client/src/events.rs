//! Event callbacks for front ends.
//!
//! The sync engine emits events from wherever it runs; they are queued and
//! only handed to callbacks when the front end calls
//! [`EventDispatcher::process_events`], so callbacks never run in the middle
//! of a store operation.

use std::sync::{mpsc, Mutex};

use dailish_core::TaskId;

use crate::errors::{ClientError, ClientResult};
use crate::sync_engine::TaskSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    TasksLoaded,
    ServingCached,
    NoCacheAvailable,
    TaskCompleted,
    MutationFailed,
    ConnectionStateChanged,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A load finished and the session now holds `count` tasks.
    TasksLoaded { source: TaskSource, count: usize },
    /// The remote store was unreachable and the mirror was used instead.
    ServingCached { count: usize },
    /// The remote store was unreachable and nothing was mirrored.
    NoCacheAvailable,
    /// A task was just marked as completed.
    TaskCompleted { id: TaskId, title: String },
    MutationFailed {
        operation: &'static str,
        message: String,
    },
    ConnectionStateChanged { online: bool },
}

impl SyncEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            SyncEvent::TasksLoaded { .. } => EventType::TasksLoaded,
            SyncEvent::ServingCached { .. } => EventType::ServingCached,
            SyncEvent::NoCacheAvailable => EventType::NoCacheAvailable,
            SyncEvent::TaskCompleted { .. } => EventType::TaskCompleted,
            SyncEvent::MutationFailed { .. } => EventType::MutationFailed,
            SyncEvent::ConnectionStateChanged { .. } => EventType::ConnectionStateChanged,
        }
    }

    /// Text a front end shows for this event, if it is user-facing.
    pub fn user_notice(&self) -> Option<String> {
        match self {
            SyncEvent::ServingCached { .. } => {
                Some("Offline mode: Showing cached tasks.".to_string())
            }
            SyncEvent::NoCacheAvailable => {
                Some("Failed to load tasks and no cache available.".to_string())
            }
            SyncEvent::TaskCompleted { title, .. } => Some(format!("Completed \"{title}\"!")),
            SyncEvent::MutationFailed { message, .. } => Some(message.clone()),
            SyncEvent::TasksLoaded { .. } | SyncEvent::ConnectionStateChanged { .. } => None,
        }
    }
}

struct CallbackEntry {
    callback: Box<dyn Fn(&SyncEvent) + Send>,
    event_filter: Option<EventType>,
}

/// Events held until the next `process_events` or `drain`. Further events
/// are dropped while the queue is full.
pub const MAX_QUEUED_EVENTS: usize = 256;

pub struct EventDispatcher {
    callbacks: Mutex<Vec<CallbackEntry>>,
    event_queue: Mutex<mpsc::Receiver<SyncEvent>>,
    event_sender: mpsc::SyncSender<SyncEvent>,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::sync_channel(MAX_QUEUED_EVENTS);
        Self {
            callbacks: Mutex::new(Vec::new()),
            event_queue: Mutex::new(receiver),
            event_sender: sender,
        }
    }

    pub fn register_callback<F>(&self, callback: F) -> ClientResult<()>
    where
        F: Fn(&SyncEvent) + Send + 'static,
    {
        self.push_entry(Box::new(callback), None)
    }

    /// Registers a callback that only receives events of `event_filter`.
    pub fn register_callback_filtered<F>(
        &self,
        callback: F,
        event_filter: EventType,
    ) -> ClientResult<()>
    where
        F: Fn(&SyncEvent) + Send + 'static,
    {
        self.push_entry(Box::new(callback), Some(event_filter))
    }

    fn push_entry(
        &self,
        callback: Box<dyn Fn(&SyncEvent) + Send>,
        event_filter: Option<EventType>,
    ) -> ClientResult<()> {
        let mut callbacks = self
            .callbacks
            .lock()
            .map_err(|_| ClientError::LockError("callbacks".into()))?;
        callbacks.push(CallbackEntry {
            callback,
            event_filter,
        });
        Ok(())
    }

    /// Queues an event without blocking. Never fails; an event that finds
    /// the queue full is dropped.
    pub fn emit(&self, event: SyncEvent) {
        tracing::debug!("EVENT: {:?}", event);
        if let Err(mpsc::TrySendError::Full(event)) = self.event_sender.try_send(event) {
            tracing::warn!("EVENT: queue full, dropping {:?}", event.event_type());
        }
    }

    /// Hands every queued event to the matching callbacks and returns how
    /// many events were processed.
    pub fn process_events(&self) -> ClientResult<usize> {
        let callbacks = self
            .callbacks
            .lock()
            .map_err(|_| ClientError::LockError("callbacks".into()))?;
        let receiver = self
            .event_queue
            .lock()
            .map_err(|_| ClientError::LockError("event queue".into()))?;

        let mut processed = 0;
        while let Ok(event) = receiver.try_recv() {
            for entry in callbacks.iter() {
                if entry
                    .event_filter
                    .is_some_and(|filter| filter != event.event_type())
                {
                    continue;
                }
                (entry.callback)(&event);
            }
            processed += 1;
        }
        Ok(processed)
    }

    /// Removes and returns every queued event without running callbacks.
    pub fn drain(&self) -> ClientResult<Vec<SyncEvent>> {
        let receiver = self
            .event_queue
            .lock()
            .map_err(|_| ClientError::LockError("event queue".into()))?;
        Ok(receiver.try_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_queue_is_bounded() {
        let dispatcher = EventDispatcher::new();
        for count in 0..MAX_QUEUED_EVENTS + 10 {
            dispatcher.emit(SyncEvent::ServingCached { count });
        }

        let queued = dispatcher.drain().unwrap();
        assert_eq!(queued.len(), MAX_QUEUED_EVENTS);
        assert_eq!(queued[0], SyncEvent::ServingCached { count: 0 });

        dispatcher.emit(SyncEvent::NoCacheAvailable);
        assert_eq!(dispatcher.drain().unwrap(), vec![SyncEvent::NoCacheAvailable]);
    }

    #[test]
    fn test_filtered_callbacks() {
        let dispatcher = EventDispatcher::new();
        let all = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));

        let counter = all.clone();
        dispatcher
            .register_callback(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        let counter = completed.clone();
        dispatcher
            .register_callback_filtered(
                move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                },
                EventType::TaskCompleted,
            )
            .unwrap();

        dispatcher.emit(SyncEvent::NoCacheAvailable);
        dispatcher.emit(SyncEvent::TaskCompleted {
            id: TaskId::from("t1"),
            title: "Water plants".into(),
        });

        assert_eq!(all.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.process_events().unwrap(), 2);
        assert_eq!(all.load(Ordering::SeqCst), 2);
        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.process_events().unwrap(), 0);
    }

    #[test]
    fn test_notices() {
        assert_eq!(
            SyncEvent::ServingCached { count: 3 }.user_notice().as_deref(),
            Some("Offline mode: Showing cached tasks.")
        );
        assert_eq!(
            SyncEvent::TasksLoaded {
                source: TaskSource::Remote,
                count: 1
            }
            .user_notice(),
            None
        );
    }
}
