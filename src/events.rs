// src/events.rs

//! Per-family task event callbacks.
//!
//! Drivers trigger events at well-known points of a task's lifecycle;
//! callbacks registered for the task's family run synchronously, on the
//! triggering thread, in registration order. A failing callback is logged
//! and isolated so the remaining callbacks still run; only an explicit
//! [`EventError::Cancelled`] aborts the rest of the dispatch.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error};

use crate::errors::EventError;
use crate::task::Task;

/// Lifecycle points a driver may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskEvent {
    Start,
    Success,
    Failure,
    BrokenTask,
    DependencyDiscovered,
    DependencyMissing,
    DependencyPresent,
    ProcessingTime,
}

type Callback = Arc<dyn Fn(&dyn Task) -> Result<(), EventError> + Send + Sync>;

/// Handle returned by [`on_event`], usable to remove the callback again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackHandle(u64);

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(0);

static CALLBACKS: LazyLock<Mutex<HashMap<(String, TaskEvent), Vec<(CallbackHandle, Callback)>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Register a callback for `(family, event)`.
pub fn on_event(
    family: impl Into<String>,
    event: TaskEvent,
    callback: impl Fn(&dyn Task) -> Result<(), EventError> + Send + Sync + 'static,
) -> CallbackHandle {
    let handle = CallbackHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed));
    CALLBACKS
        .lock()
        .expect("event table lock poisoned")
        .entry((family.into(), event))
        .or_default()
        .push((handle, Arc::new(callback)));
    handle
}

/// Remove a previously registered callback. Unknown handles are ignored.
pub fn remove_event_handler(family: &str, event: TaskEvent, handle: CallbackHandle) {
    if let Some(callbacks) = CALLBACKS
        .lock()
        .expect("event table lock poisoned")
        .get_mut(&(family.to_string(), event))
    {
        callbacks.retain(|(h, _)| *h != handle);
    }
}

/// Dispatch `event` for `task` to every callback registered for its family.
///
/// Callbacks run outside the table lock, so they may register or remove
/// handlers themselves.
pub fn trigger_event(task: &dyn Task, event: TaskEvent) {
    let family = task.family();
    let callbacks: Vec<Callback> = CALLBACKS
        .lock()
        .expect("event table lock poisoned")
        .get(&(family.clone(), event))
        .map(|entries| entries.iter().map(|(_, cb)| cb.clone()).collect())
        .unwrap_or_default();

    for callback in callbacks {
        match callback(task) {
            Ok(()) => {}
            Err(EventError::Cancelled) => {
                debug!(family = %family, ?event, "event dispatch cancelled by callback");
                return;
            }
            Err(EventError::Failed(err)) => {
                error!(family = %family, ?event, error = %err, "error in event callback");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::param::{ParamKind, ParamSpec};
    use crate::task::{TaskArgs, TaskCore, TaskDef};

    struct Probe {
        core: TaskCore,
    }

    impl Task for Probe {
        fn core(&self) -> &TaskCore {
            &self.core
        }
    }

    fn probe(family: &str) -> Probe {
        let def = TaskDef::builder(family)
            .param(ParamSpec::new("n", ParamKind::Int).default_value(0))
            .build();
        Probe {
            core: def.build(TaskArgs::new()).unwrap(),
        }
    }

    #[test]
    fn callbacks_run_in_registration_order() {
        static ORDER: AtomicUsize = AtomicUsize::new(0);
        let task = probe("EventsOrder");

        on_event("EventsOrder", TaskEvent::Start, |_| {
            assert_eq!(ORDER.fetch_add(1, Ordering::SeqCst), 0);
            Ok(())
        });
        on_event("EventsOrder", TaskEvent::Start, |_| {
            assert_eq!(ORDER.fetch_add(1, Ordering::SeqCst), 1);
            Ok(())
        });

        trigger_event(&task, TaskEvent::Start);
        assert_eq!(ORDER.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failing_callback_does_not_block_the_rest() {
        static RAN: AtomicUsize = AtomicUsize::new(0);
        let task = probe("EventsIsolate");

        on_event("EventsIsolate", TaskEvent::Failure, |_| {
            Err(EventError::Failed(anyhow::anyhow!("boom")))
        });
        on_event("EventsIsolate", TaskEvent::Failure, |_| {
            RAN.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        trigger_event(&task, TaskEvent::Failure);
        assert_eq!(RAN.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancellation_stops_remaining_callbacks() {
        static RAN: AtomicUsize = AtomicUsize::new(0);
        let task = probe("EventsCancel");

        on_event("EventsCancel", TaskEvent::Success, |_| Err(EventError::Cancelled));
        on_event("EventsCancel", TaskEvent::Success, |_| {
            RAN.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        trigger_event(&task, TaskEvent::Success);
        assert_eq!(RAN.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn removed_handler_no_longer_fires() {
        static RAN: AtomicUsize = AtomicUsize::new(0);
        let task = probe("EventsRemove");

        let handle = on_event("EventsRemove", TaskEvent::Start, |_| {
            RAN.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        remove_event_handler("EventsRemove", TaskEvent::Start, handle);

        trigger_event(&task, TaskEvent::Start);
        assert_eq!(RAN.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn events_only_match_their_family() {
        static RAN: AtomicUsize = AtomicUsize::new(0);
        let task = probe("EventsOther");

        on_event("EventsNotThis", TaskEvent::Start, |_| {
            RAN.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        trigger_event(&task, TaskEvent::Start);
        assert_eq!(RAN.load(Ordering::SeqCst), 0);
    }
}
