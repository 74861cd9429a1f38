//! Hook groups: zero-argument callbacks fired together.
//!
//! [`Hooks::fire`] runs every hook on its own scoped thread and returns only
//! after all of them finished. Concurrent fires of the same group are
//! serialized, so the callbacks of two fires never interleave.
//!
//! A failing or panicking hook does not stop its siblings. Once every hook
//! has joined, `fire` reports the first failure in registration order and
//! logs the rest.

use std::any::Any;
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{trace, warn};

use crate::bus::listener::ListenerOutcome;
use crate::error::{BusError, BusResult, CallbackError, ExecutionError};

type Hook = Arc<dyn Fn() -> Result<(), CallbackError> + Send + Sync>;

/// An append-only group of hooks.
///
/// `fire` holds the group lock until every hook has returned. A hook must
/// not call back into its own group: `add`, `fire`, `len`, `is_empty` and
/// `Debug` all take that lock and would deadlock.
#[derive(Default)]
pub struct Hooks {
    funcs: Mutex<Vec<Hook>>,
}

impl Hooks {
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook. Waits for an in-flight [`Hooks::fire`] to finish.
    ///
    /// # Errors
    ///
    /// Returns `BusError::Internal` if the group lock is poisoned.
    pub fn add<F, R>(&self, hook: F) -> BusResult<()>
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: ListenerOutcome,
    {
        let mut funcs = self.lock()?;
        funcs.push(Arc::new(move || hook().into_outcome()));
        Ok(())
    }

    /// Runs every hook concurrently and waits for all of them.
    ///
    /// Must not be called from inside one of this group's hooks (see the
    /// type-level docs).
    ///
    /// # Errors
    ///
    /// Returns `ExecutionError::HookFailed` or `ExecutionError::HookPanicked`
    /// for the first hook (in registration order) that failed.
    pub fn fire(&self) -> BusResult<()> {
        let funcs = self.lock()?;
        trace!(hooks = funcs.len(), "Firing hooks");

        let outcomes: Vec<thread::Result<Result<(), CallbackError>>> = thread::scope(|scope| {
            let handles: Vec<_> = funcs
                .iter()
                .map(|hook| scope.spawn(move || hook()))
                .collect();
            handles.into_iter().map(|handle| handle.join()).collect()
        });
        drop(funcs);

        let mut first: Option<ExecutionError> = None;
        for (index, outcome) in outcomes.into_iter().enumerate() {
            let failure = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(source)) => ExecutionError::HookFailed { index, source },
                Err(payload) => ExecutionError::HookPanicked {
                    index,
                    message: panic_message(payload.as_ref()),
                },
            };
            warn!(index, error = %failure, "Hook failed");
            if first.is_none() {
                first = Some(failure);
            }
        }

        match first {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Number of hooks in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().map_or(0, |funcs| funcs.len())
    }

    /// Returns true if no hook was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> BusResult<std::sync::MutexGuard<'_, Vec<Hook>>> {
        self.funcs
            .lock()
            .map_err(|_| BusError::internal("hook group lock poisoned"))
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks").field("len", &self.len()).finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    #[test]
    fn test_fire_empty_group() {
        let hooks = Hooks::new();
        assert!(hooks.is_empty());
        hooks.fire().unwrap();
    }

    #[test]
    fn test_fire_runs_every_hook_once() {
        let hooks = Hooks::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let c = Arc::clone(&count);
            hooks
                .add(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
        assert_eq!(hooks.len(), 5);

        hooks.fire().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 5);

        hooks.fire().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_hooks_run_concurrently() {
        // Each hook waits for all the others; a sequential fire would hang.
        let hooks = Hooks::new();
        let barrier = Arc::new(Barrier::new(3));
        for _ in 0..3 {
            let b = Arc::clone(&barrier);
            hooks
                .add(move || {
                    b.wait();
                })
                .unwrap();
        }
        hooks.fire().unwrap();
    }

    #[test]
    fn test_first_failure_reported_after_all_join() {
        let hooks = Hooks::new();
        let finished = Arc::new(AtomicUsize::new(0));

        hooks.add(|| -> Result<(), String> { Err("first".into()) }).unwrap();
        let f = Arc::clone(&finished);
        hooks
            .add(move || {
                f.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        hooks.add(|| -> Result<(), String> { Err("second".into()) }).unwrap();

        let err = hooks.fire().unwrap_err();
        assert!(err.to_string().contains("Hook #0"));
        assert!(err.to_string().contains("first"));
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_hook_is_reported() {
        let hooks = Hooks::new();
        hooks.add(|| {}).unwrap();
        hooks
            .add(|| {
                let v: Vec<u8> = Vec::new();
                if v.is_empty() {
                    panic!("hook exploded");
                }
            })
            .unwrap();

        let err = hooks.fire().unwrap_err();
        match err {
            BusError::Execution(ExecutionError::HookPanicked { index, message }) => {
                assert_eq!(index, 1);
                assert_eq!(message, "hook exploded");
            }
            other => panic!("expected panic report, got {other:?}"),
        }

        // The group stays usable.
        hooks.fire().unwrap_err();
        assert_eq!(hooks.len(), 2);
    }
}
