//! Reactive bridge - Accumulator-threaded computations on spark-signals.
//!
//! [`track`] registers an explicit `update: FnMut(R) -> R` with the
//! dependency tracker. The update runs once immediately with `seed`, and
//! again on every invalidation, each time receiving its own last return
//! value. The accumulator lives in the returned [`Tracked`] handle, not in
//! captured mutable state, so it can be inspected and tested on its own.
//!
//! Every computation created here is a root: it is never a child of the
//! effect that happens to be running when it is created, so an enclosing
//! re-run does not destroy it. Its owner stops it explicitly, or the
//! effect scope it was created in does.
//!
//! # Example
//!
//! ```ignore
//! use spark_patch::reactive::track;
//! use spark_signals::signal;
//!
//! let count = signal(1);
//! let c = count.clone();
//! let sum = track(move |acc: i32| acc + c.get(), 0);
//! assert_eq!(sum.current(), 1);
//!
//! count.set(2);
//! assert_eq!(sum.current(), 3);
//! sum.stop();
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use log::warn;
use spark_signals::{batch, effect_root, effect_sync};

use crate::primitives::Cleanup;

/// Handle to a tracked computation.
///
/// Cloning shares the same computation. Dropping a handle does not stop it;
/// call [`Tracked::stop`].
pub struct Tracked<R> {
    current: Rc<RefCell<R>>,
    stop: Rc<RefCell<Option<Cleanup>>>,
    alive: Rc<Cell<bool>>,
}

impl<R> Clone for Tracked<R> {
    fn clone(&self) -> Self {
        Self {
            current: self.current.clone(),
            stop: self.stop.clone(),
            alive: self.alive.clone(),
        }
    }
}

impl<R: Clone> Tracked<R> {
    /// Latest accumulator value.
    pub fn current(&self) -> R {
        self.current.borrow().clone()
    }
}

impl<R> Tracked<R> {
    /// Stop re-running on invalidation. Idempotent.
    pub fn stop(&self) {
        let stop = self.stop.borrow_mut().take();
        if let Some(stop) = stop {
            stop();
        }
    }

    /// Whether the computation still re-runs. False once stopped here or
    /// disposed by the scope that owns it.
    pub fn is_active(&self) -> bool {
        self.alive.get() && self.stop.borrow().is_some()
    }

    /// Whether two handles share the same computation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.current, &other.current)
    }
}

impl<R> fmt::Debug for Tracked<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Flips to false when the effect holding it drops its closure, which
/// happens when the effect is destroyed.
struct AliveGuard(Rc<Cell<bool>>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Run `f` now and whenever a signal it read changes, outside the
/// ownership of any running effect. Returns the stop closure.
pub fn root_effect<F>(f: F) -> Cleanup
where
    F: FnMut() + 'static,
{
    // writes made during the first run are flushed after it returns
    let stop = batch(|| {
        effect_root(move || {
            // the root keeps the child alive; its own dispose closure is not needed
            let _ = effect_sync(f);
        })
    });
    Box::new(stop)
}

/// Run `update` now and whenever a signal it read changes, threading the
/// previous return value back in.
pub fn track<R, F>(update: F, seed: R) -> Tracked<R>
where
    R: Default + 'static,
    F: FnMut(R) -> R + 'static,
{
    let current = Rc::new(RefCell::new(seed));
    let alive = Rc::new(Cell::new(true));
    let update = RefCell::new(update);

    let acc = current.clone();
    let guard = AliveGuard(alive.clone());
    let stop = root_effect(move || {
        let _guard = &guard;
        let Ok(mut update) = update.try_borrow_mut() else {
            // invalidated by its own run
            warn!("track: re-entrant invalidation ignored");
            return;
        };
        let previous = std::mem::take(&mut *acc.borrow_mut());
        let next = update(previous);
        *acc.borrow_mut() = next;
    });

    Tracked {
        current,
        stop: Rc::new(RefCell::new(Some(stop))),
        alive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_signals::{effect_scope, signal};

    #[test]
    fn test_track_runs_immediately_with_seed() {
        let seen = Rc::new(Cell::new(None));
        let s = seen.clone();
        let tracked = track(
            move |acc: i32| {
                s.set(Some(acc));
                acc + 1
            },
            41,
        );

        assert_eq!(seen.get(), Some(41), "first run should receive the seed");
        assert_eq!(tracked.current(), 42);
        tracked.stop();
    }

    #[test]
    fn test_track_threads_accumulator() {
        let count = signal(1);
        let c = count.clone();
        let sum = track(move |acc: i32| acc + c.get(), 0);
        assert_eq!(sum.current(), 1);

        count.set(2);
        assert_eq!(sum.current(), 3, "second run should add to the first result");

        count.set(10);
        assert_eq!(sum.current(), 13);
        sum.stop();
    }

    #[test]
    fn test_stop_ends_tracking() {
        let count = signal(1);
        let c = count.clone();
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        let tracked = track(
            move |acc: i32| {
                r.set(r.get() + 1);
                acc + c.get()
            },
            0,
        );
        assert!(tracked.is_active());

        tracked.stop();
        tracked.stop();
        assert!(!tracked.is_active());

        count.set(5);
        assert_eq!(runs.get(), 1, "stopped computation should not re-run");
        assert_eq!(tracked.current(), 1);
    }

    #[test]
    fn test_inner_track_survives_outer_rerun() {
        let outer_sig = signal(0);
        let inner_sig = signal(0);
        let inner: Rc<RefCell<Option<Tracked<i32>>>> = Rc::new(RefCell::new(None));

        let o = outer_sig.clone();
        let i = inner_sig.clone();
        let slot = inner.clone();
        let outer = track(
            move |runs: i32| {
                o.get();
                if slot.borrow().is_none() {
                    let i = i.clone();
                    *slot.borrow_mut() = Some(track(move |_: i32| i.get(), 0));
                }
                runs + 1
            },
            0,
        );

        outer_sig.set(1);
        assert_eq!(outer.current(), 2);

        inner_sig.set(7);
        let inner = inner.borrow().clone().unwrap();
        assert!(inner.is_active(), "outer re-run must not dispose the inner computation");
        assert_eq!(inner.current(), 7);

        outer.stop();
        inner_sig.set(8);
        assert_eq!(inner.current(), 8, "inner is owned by its handle, not by the outer run");
        inner.stop();
    }

    #[test]
    fn test_scope_stop_deactivates_tracking() {
        let count = signal(1);
        let c = count.clone();
        let scope = effect_scope(false);
        let tracked = scope
            .run(move || track(move |_: i32| c.get(), 0))
            .unwrap();
        assert!(tracked.is_active());

        scope.stop();
        assert!(!tracked.is_active(), "disposed by its scope");
        count.set(2);
        assert_eq!(tracked.current(), 1);
        tracked.stop();
    }
}
